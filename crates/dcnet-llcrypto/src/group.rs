//! A 1024-bit Schnorr subgroup of a safe-prime multiplicative group, and
//! the ElGamal encryption and Schnorr-style signature schemes built on it.
//!
//! This is the group every keypair, shared secret and signature in this
//! workspace is computed in. It is a classical discrete-log group rather
//! than an elliptic curve: `p` is a 1024-bit safe prime, `q = (p-1)/2` is
//! the order of the subgroup generated by `g = 2`, and all arithmetic is
//! modular exponentiation over `p`.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::err::Error;

/// An element of the Schnorr subgroup (an integer mod `p`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element(BigUint);

impl Element {
    /// View this element as the `BigUint` it wraps.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

/// A scalar exponent (an integer mod `q`, the subgroup order).
///
/// Scalars are the "private" numbers in this group: long-term secret keys,
/// per-interval nym secrets, and the randomizers used while signing. They
/// are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Scalar(BigUint);

impl Scalar {
    /// View this scalar as the `BigUint` it wraps.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Construct a scalar from an arbitrary integer, reducing it modulo
    /// `group`'s subgroup order first.
    ///
    /// Unlike [`SchnorrGroup::random_secret`], this accepts values outside
    /// the usual top-half sampling range; it's meant for combining secrets
    /// that are already the result of modular arithmetic (such as a sum of
    /// several Diffie-Hellman exchanges), not for generating fresh keys.
    pub fn from_biguint_mod_order(value: BigUint, group: &SchnorrGroup) -> Self {
        Scalar(value % group.order())
    }
}

/// A Schnorr-style signature `(r, s)` produced by [`SchnorrGroup::sign`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// The commitment component.
    pub r: BigUint,
    /// The response component.
    pub s: BigUint,
}

/// A keypair in a [`SchnorrGroup`]: a secret scalar and its corresponding
/// public element `g^secret mod p`.
#[derive(Clone)]
pub struct Keypair {
    /// The secret scalar.
    pub secret: Scalar,
    /// The public element.
    pub public: Element,
}

/// A Schnorr subgroup of `(Z/pZ)*`, together with the ElGamal and
/// Schnorr-signature operations defined over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchnorrGroup {
    /// The safe prime modulus.
    p: BigUint,
    /// The generator of the order-`q` subgroup.
    g: BigUint,
    /// The order of the subgroup generated by `g`.
    q: BigUint,
}

/// The canonical 1024-bit Schnorr group used throughout this workspace.
///
/// `p` is a safe prime (`p = 2q + 1`), `g = 2` generates the order-`q`
/// subgroup.
pub fn verdict_1024() -> SchnorrGroup {
    let p = BigUint::parse_bytes(
        concat!(
            "fd8a16fc2afdaeb2ea62b66b355f73e6c2fc4349bf455179336ca1b45f75d68",
            "da0101cba63c22efd5f72e5c81dc30cf709daaef2323e950160926e11ef8cbf",
            "40a26496668749218b5620276697c2d1536b31042ad846e1e5758d79b3e4e0b",
            "5bc4c5d3a4e95da4502e9058ea3beade156d8234e35d5164783c57e6135139d",
            "b097",
        )
        .as_bytes(),
        16,
    )
    .expect("hardcoded 1024-bit safe prime must parse");
    let g = BigUint::from(2_u32);
    let q = (&p - BigUint::one()) / BigUint::from(2_u32);
    SchnorrGroup { p, g, q }
}

impl SchnorrGroup {
    /// Construct a group directly from its parameters.
    ///
    /// `g` must generate the order-`q` subgroup of `(Z/pZ)*`.
    pub fn new(p: BigUint, g: BigUint, q: BigUint) -> Self {
        SchnorrGroup { p, g, q }
    }

    /// The prime modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// The generator `g`.
    pub fn generator(&self) -> Element {
        Element(self.g.clone())
    }

    /// The subgroup order `q`.
    pub fn order(&self) -> &BigUint {
        &self.q
    }

    /// Return whether `a` is a member of the order-`q` subgroup of
    /// `(Z/pZ)*`.
    pub fn is_element(&self, a: &BigUint) -> bool {
        !a.is_zero() && a.modpow(&self.q, &self.p) == BigUint::one()
    }

    /// Sample a uniformly random scalar in `[2^(bits-1), q-1)`, where
    /// `bits` is the bit-length of `q`.
    ///
    /// Matching the reference group, secrets are sampled from the top half
    /// of `[0, q)` rather than the whole range.
    pub fn random_secret(&self, rng: &mut dyn RngCore) -> Scalar {
        let low = BigUint::one() << (self.q.bits() - 1);
        let high = &self.q - BigUint::one();
        Scalar(random_in_range(rng, &low, &high))
    }

    /// Generate a uniformly random keypair.
    pub fn random_keypair(&self, rng: &mut dyn RngCore) -> Keypair {
        let secret = self.random_secret(rng);
        let public = self.multiply(&self.generator(), secret.as_biguint());
        Keypair { secret, public }
    }

    /// Group operation: `a * b mod p`.
    pub fn add(&self, a: &Element, b: &Element) -> Element {
        Element((&a.0 * &b.0) % &self.p)
    }

    /// Scalar multiplication (written multiplicatively): `a^b mod p`.
    pub fn multiply(&self, a: &Element, b: &BigUint) -> Element {
        Element(a.0.modpow(b, &self.p))
    }

    /// The multiplicative inverse of `a` modulo `p`.
    pub fn inverse(&self, a: &Element) -> Element {
        Element(mod_inverse(&a.0, &self.p).expect("group elements are invertible mod p"))
    }

    /// Encode an arbitrary byte string as a group element.
    ///
    /// The wire format is `0xFF || data || pad || 0xFF`: a leading and
    /// trailing sentinel byte bracketing the payload, with a single tunable
    /// padding byte before the trailing sentinel. `pad` is swept from `0`
    /// to `255` until the resulting big-endian integer lands in the
    /// subgroup; this happens with overwhelming probability well before
    /// the sweep is exhausted.
    pub fn encode(&self, data: &[u8]) -> Result<Element, Error> {
        let mut buf = Vec::with_capacity(data.len() + 3);
        buf.push(0xFF);
        buf.extend_from_slice(data);
        buf.push(0x30);
        buf.push(0xFF);
        let pad_index = buf.len() - 2;

        for pad in 0_u16..256 {
            buf[pad_index] = pad as u8;
            let candidate = BigUint::from_bytes_be(&buf);
            if self.is_element(&candidate) {
                return Ok(Element(candidate));
            }
        }
        Err(Error::MessageTooLarge)
    }

    /// Decode a group element produced by [`SchnorrGroup::encode`] back
    /// into the original byte string.
    pub fn decode(&self, a: &Element) -> Result<Vec<u8>, Error> {
        let data = a.0.to_bytes_be();
        if data.len() < 3 || data[0] != 0xFF || *data.last().unwrap() != 0xFF {
            return Err(Error::BadElementEncoding);
        }
        Ok(data[1..data.len() - 2].to_vec())
    }

    /// ElGamal-encrypt `data` to the public element `key`.
    ///
    /// Returns `(c1, c2)`, the ephemeral commitment and the masked
    /// plaintext element.
    pub fn encrypt(
        &self,
        key: &Element,
        data: &[u8],
        rng: &mut dyn RngCore,
    ) -> Result<(Element, Element), Error> {
        let y = self.random_secret(rng);
        let c1 = self.multiply(&self.generator(), y.as_biguint());
        let shared = self.multiply(key, y.as_biguint());
        let encoded = self.encode(data)?;
        let c2 = self.add(&encoded, &shared);
        Ok((c1, c2))
    }

    /// ElGamal-decrypt a ciphertext produced by [`SchnorrGroup::encrypt`]
    /// with the secret scalar corresponding to `key`.
    pub fn decrypt(
        &self,
        secret: &Scalar,
        ciphertext: &(Element, Element),
    ) -> Result<Vec<u8>, Error> {
        let (c1, c2) = ciphertext;
        let shared = self.multiply(c1, secret.as_biguint());
        let encoded = self.add(c2, &self.inverse(&shared));
        self.decode(&encoded)
    }

    /// Compute `H(data) mod 2^bits`, truncated to `ceil(bits/8)` bytes of
    /// a SHA-256 digest, as a `BigUint`.
    fn hash_to_biguint(&self, data: &[u8], bits: u64) -> BigUint {
        let limit = bits.div_ceil(8) as usize;
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        BigUint::from_bytes_be(&digest[..limit.min(digest.len())])
    }

    /// Produce a Schnorr-style signature over `data` with `secret`.
    pub fn sign(&self, secret: &Scalar, data: &[u8], rng: &mut dyn RngCore) -> Signature {
        let p_minus_one = &self.p - BigUint::one();
        let k = loop {
            let low = BigUint::one() << (p_minus_one.bits() - 1);
            let candidate = random_in_range(rng, &low, &p_minus_one);
            if candidate.gcd(&p_minus_one) == BigUint::one() {
                break candidate;
            }
        };
        let r = self.generator().0.modpow(&k, &self.p);
        let k_inv = mod_inverse(&k, &p_minus_one).expect("k is coprime to p-1 by construction");
        let h = self.hash_to_biguint(data, p_minus_one.bits());

        let secret_r = (secret.as_biguint() * &r) % &p_minus_one;
        let diff = sub_mod(&h, &secret_r, &p_minus_one);
        let s = (diff * &k_inv) % &p_minus_one;
        Signature { r, s }
    }

    /// Verify a signature produced by [`SchnorrGroup::sign`] against the
    /// corresponding public element.
    pub fn verify(&self, public: &Element, data: &[u8], sig: &Signature) -> bool {
        let p_minus_one = &self.p - BigUint::one();
        if sig.r.is_zero() || sig.r >= self.p {
            return false;
        }
        if sig.s.is_zero() || sig.s >= self.p {
            return false;
        }
        let lhs = Element((public.0.modpow(&sig.r, &self.p) * sig.r.modpow(&sig.s, &self.p)) % &self.p);
        let h = self.hash_to_biguint(data, p_minus_one.bits());
        let rhs = self.generator().0.modpow(&h, &self.p);
        lhs.0 == rhs
    }
}

/// Subtract `b` from `a` modulo `m`, without going negative along the way
/// (`BigUint` has no negative values).
fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    let a = a % m;
    let b = b % m;
    if a >= b {
        a - b
    } else {
        m - (b - a)
    }
}

/// The modular multiplicative inverse of `a` modulo `m`, via the extended
/// Euclidean algorithm.
fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = a % m;
    let ext = a.to_bigint_signed().extended_gcd(&m.to_bigint_signed());
    if ext.gcd != num_bigint::BigInt::one() {
        return None;
    }
    let m_signed = m.to_bigint_signed();
    let mut x = ext.x % &m_signed;
    if x.sign() == num_bigint::Sign::Minus {
        x += &m_signed;
    }
    x.to_biguint()
}

/// Helper: treat an unsigned `BigUint` as a non-negative `BigInt`.
trait ToBigIntSigned {
    /// Convert to `BigInt`.
    fn to_bigint_signed(&self) -> num_bigint::BigInt;
}
impl ToBigIntSigned for BigUint {
    fn to_bigint_signed(&self) -> num_bigint::BigInt {
        num_bigint::BigInt::from(self.clone())
    }
}

/// Sample a uniformly random integer in `[low, high)` by rejection
/// sampling on the bit-length of `high`.
fn random_in_range(rng: &mut dyn RngCore, low: &BigUint, high: &BigUint) -> BigUint {
    debug_assert!(low < high);
    let bits = high.bits();
    let bytes = bits.div_ceil(8) as usize;
    let excess_bits = (bytes * 8) as u64 - bits;
    loop {
        let mut buf = vec![0_u8; bytes];
        rng.fill_bytes(&mut buf);
        if excess_bits > 0 {
            buf[0] &= 0xFF >> excess_bits;
        }
        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate >= low && &candidate < high {
            return candidate;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dcnet_basic_utils::test_rng::deterministic_rng;

    #[test]
    fn group_membership_of_generator() {
        let group = verdict_1024();
        assert!(group.is_element(&group.generator().0));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let group = verdict_1024();
        let element = group.encode(b"hello dcnet").unwrap();
        assert!(group.is_element(&element.0));
        let decoded = group.decode(&element).unwrap();
        assert_eq!(decoded, b"hello dcnet");
    }

    #[test]
    fn elgamal_roundtrip() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let keys = group.random_keypair(&mut rng);
        let ciphertext = group.encrypt(&keys.public, b"attack at dawn", &mut rng).unwrap();
        let plaintext = group.decrypt(&keys.secret, &ciphertext).unwrap();
        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn diffie_hellman_agrees() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let a = group.random_keypair(&mut rng);
        let b = group.random_keypair(&mut rng);
        let shared_ab = group.multiply(&b.public, a.secret.as_biguint());
        let shared_ba = group.multiply(&a.public, b.secret.as_biguint());
        assert_eq!(shared_ab, shared_ba);
    }

    #[test]
    fn sign_and_verify() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let keys = group.random_keypair(&mut rng);
        let sig = group.sign(&keys.secret, b"a message to certify", &mut rng);
        assert!(group.verify(&keys.public, b"a message to certify", &sig));
        assert!(!group.verify(&keys.public, b"a different message", &sig));
    }
}
