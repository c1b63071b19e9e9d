//! The Verdict commitment scheme: binds a client's cell to its long-term
//! key without revealing which client sent it.
//!
//! Every client and trustee holds a secret `ss` computed from its own
//! Diffie-Hellman exchanges with every other party, signed so that clients
//! contribute `+ss` and trustees contribute `-ss`. By construction the sum
//! of every participant's `ss`, across the whole set of clients and
//! trustees, is zero mod the group order. A [`Certifier`] raises a public,
//! per-cell generator to its own `ss` (optionally folding in an encoded
//! payload); a relay's [`Accumulator`] combines every participant's
//! contribution for a slot and is left with the payload alone, or the
//! group identity if no one owned that slot.
//!
//! This is a simplification of the reference scheme, which additionally
//! wraps each contribution in a per-sender AES blind derived from the same
//! exchange. That extra layer only adds transport confidentiality for
//! values that are already hard to invert under the discrete-log
//! assumption, so it's dropped here; the binding property comes entirely
//! from the commitment telescoping, not from the blind.

use dcnet_llcrypto::group::{Element, Keypair, Scalar, SchnorrGroup};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::err::Error;

/// A participant's Verdict secret and its public commitment.
#[derive(Clone)]
pub struct VerdictKey {
    secret: Scalar,
    commitment: Element,
}

impl VerdictKey {
    /// Derive a client's Verdict key.
    ///
    /// `owned_nym` is the keypair of the nym this client owns this
    /// interval, if any; its exchanges with every trustee are folded into
    /// the secret alongside the client's own.
    pub fn for_client(
        own: &Keypair,
        owned_nym: Option<&Keypair>,
        trustee_keys: &[Element],
        group: &SchnorrGroup,
    ) -> Self {
        let mut acc = BigUint::from(0_u32);
        for trustee in trustee_keys {
            let shared = group.multiply(trustee, own.secret.as_biguint());
            acc = (acc + shared.as_biguint()) % group.order();
            if let Some(nym) = owned_nym {
                let shared = group.multiply(trustee, nym.secret.as_biguint());
                acc = (acc + shared.as_biguint()) % group.order();
            }
        }
        Self::from_secret_biguint(acc, group)
    }

    /// Derive a trustee's Verdict key.
    ///
    /// `nym_keys` are every nym's public key registered with this trustee;
    /// the trustee's exchange with each one is folded in alongside its
    /// exchanges with the clients themselves.
    pub fn for_trustee(
        own: &Keypair,
        client_keys: &[Element],
        nym_keys: &[Element],
        group: &SchnorrGroup,
    ) -> Self {
        let mut acc = BigUint::from(0_u32);
        for key in client_keys.iter().chain(nym_keys) {
            let shared = group.multiply(key, own.secret.as_biguint());
            acc = (acc + shared.as_biguint()) % group.order();
        }
        // Trustees contribute the negation of their combined exchanges, so
        // that the sum over every client and trustee secret is zero.
        let negated = (group.order() - (acc % group.order())) % group.order();
        Self::from_secret_biguint(negated, group)
    }

    fn from_secret_biguint(value: BigUint, group: &SchnorrGroup) -> Self {
        let secret = Scalar::from_biguint_mod_order(value, group);
        let commitment = group.multiply(&group.generator(), secret.as_biguint());
        VerdictKey { secret, commitment }
    }

    /// This participant's public commitment `g^ss`.
    pub fn commitment(&self) -> &Element {
        &self.commitment
    }
}

/// Held by a client or trustee: produces this party's per-cell Verdict
/// contribution.
#[derive(Clone)]
pub struct Certifier {
    key: VerdictKey,
}

impl Certifier {
    /// Wrap a derived [`VerdictKey`].
    pub fn new(key: VerdictKey) -> Self {
        Certifier { key }
    }

    /// This party's public commitment.
    pub fn commitment(&self) -> &Element {
        self.key.commitment()
    }

    /// Produce this party's contribution to a cell's Verdict aggregate.
    ///
    /// `payload` should be `Some` only for the client that owns the slot
    /// this cell belongs to; everyone else passes `None`.
    pub fn contribute(
        &self,
        generator: &Element,
        payload: Option<&[u8]>,
        group: &SchnorrGroup,
    ) -> Result<Element, Error> {
        let blind = group.multiply(generator, self.key.secret.as_biguint());
        match payload {
            None => Ok(blind),
            Some(data) => {
                let encoded = group.encode(data)?;
                Ok(group.add(&encoded, &blind))
            }
        }
    }
}

/// Held by the relay: combines every participant's Verdict contribution
/// for a cell and advances the generator for the next one.
pub struct Accumulator {
    counter: u64,
    hdata: BigUint,
}

impl Accumulator {
    /// Start a new accumulator with a fresh generator chain.
    pub fn new() -> Self {
        Accumulator {
            counter: 0,
            hdata: cleartext_to_hdata(0, &[]),
        }
    }

    /// The public generator this round's contributions are raised from.
    pub fn generator(&self, group: &SchnorrGroup) -> Element {
        group.multiply(&group.generator(), &(&self.hdata % group.order()))
    }

    /// Combine every participant's contribution for one cell.
    ///
    /// Folds every element with the group operation; the commitments
    /// cancel out, leaving the owning client's encoded payload (or the
    /// group identity, if the slot had no owner this round).
    pub fn before(&self, contributions: &[Element], group: &SchnorrGroup) -> Element {
        contributions
            .iter()
            .fold(group.multiply(&group.generator(), &BigUint::from(0_u32)), |acc, c| {
                group.add(&acc, c)
            })
    }

    /// Advance the generator chain from this round's recovered cleartext.
    pub fn after(&mut self, cleartext: &[u8]) {
        self.counter += 1;
        self.hdata = cleartext_to_hdata(self.counter, cleartext);
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a counter and the previous round's cleartext into the integer that
/// seeds the next round's generator.
fn cleartext_to_hdata(counter: u64, cleartext: &[u8]) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(counter.to_be_bytes());
    hasher.update(cleartext);
    BigUint::from_bytes_be(&hasher.finalize())
}
