//! The request cell codec: a fixed-weight Bloom-filter code used for slot
//! reservation.
//!
//! Every nym derives a deterministic `R`-bit-weight code from the trap
//! secrets it shares with every trustee. Clients OR their codes into a
//! shared request cell; the relay-side decoder recovers the set of
//! requesting nyms by testing, for each known code, whether all of its
//! bits are set in the aggregate cell.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha12Rng;
use rand_core::SeedableRng;
use sha2::{Digest, Sha256};

use crate::err::Error;
use crate::request_tuning;

fn byte_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

fn get_bit(buf: &[u8], i: usize) -> bool {
    (buf[i / 8] >> (7 - i % 8)) & 1 == 1
}

fn set_bit(buf: &mut [u8], i: usize) {
    buf[i / 8] |= 1 << (7 - i % 8);
}

fn bitand(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x & y).collect()
}

fn bitor_assign(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d |= s;
    }
}

fn bitnot(a: &[u8]) -> Vec<u8> {
    a.iter().map(|x| !x).collect()
}

fn is_zero(buf: &[u8]) -> bool {
    buf.iter().all(|b| *b == 0)
}

/// The bit-length `B` and weight `R` shared by every nym's request code.
#[derive(Debug, Clone, Copy)]
pub struct RequestParams {
    /// Bits each nym sets to 1 in its code.
    pub bits_per_nym: usize,
    /// Total size of the request cell, in bits.
    pub cell_bit_length: usize,
}

impl RequestParams {
    /// Chooses parameters for `clients` nyms via the parameter tuner
    /// (§4.4.1): `trap_flip_risk` bounds the probability that an arbitrary
    /// bit is a trap bit, `hash_collision_risk` bounds the probability that
    /// two nyms are assigned the same code.
    pub fn tuned(clients: usize, trap_flip_risk: f64, hash_collision_risk: f64) -> Result<Self, Error> {
        request_tuning::find_parameters(clients, trap_flip_risk, hash_collision_risk)
            .map(|(bits_per_nym, cell_bit_length)| RequestParams {
                bits_per_nym,
                cell_bit_length,
            })
            .ok_or(Error::RequestParamsInfeasible {
                clients,
                trap_flip_risk,
                hash_collision_risk,
            })
    }

    /// The request cell's size in bytes.
    pub fn cell_byte_length(&self) -> usize {
        byte_len(self.cell_bit_length)
    }
}

/// Derives a nym's fixed request code from its trap secrets, returning the
/// code and the RNG positioned right after the sampling draw (so a caller
/// can continue drawing from the same stream for retry suppression).
fn derive_code(seeds: &[impl AsRef<[u8]>], params: &RequestParams) -> (Vec<u8>, ChaCha12Rng) {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed.as_ref());
    }
    let seed: [u8; 32] = hasher.finalize().into();
    let mut rng = ChaCha12Rng::from_seed(seed);

    let mut code = vec![0_u8; byte_len(params.cell_bit_length)];
    let positions = rand::seq::index::sample(&mut rng, params.cell_bit_length, params.bits_per_nym);
    for p in positions.iter() {
        set_bit(&mut code, p);
    }
    (code, rng)
}

/// Produces one nym's request cell, and its retries when prior requests
/// were only partially granted.
pub struct RequestEncoder {
    params: RequestParams,
    code: Vec<u8>,
    retry_rng: ChaCha12Rng,
}

impl RequestEncoder {
    /// Builds an encoder for a nym from the trap secrets it shares with
    /// every trustee.
    pub fn new(params: RequestParams, seeds: &[impl AsRef<[u8]>]) -> Self {
        let (code, retry_rng) = derive_code(seeds, &params);
        RequestEncoder { params, code, retry_rng }
    }

    /// This nym's fixed-weight code, independent of any prior grants.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Encodes a request cell. `already_granted`, if given, is the
    /// interval's accumulated request cell so far; only the bits of this
    /// nym's code not yet present there are considered, and each such bit
    /// is independently suppressed with probability 1/2 to limit repeated
    /// exposure of the same trap-free positions.
    pub fn encode(&mut self, already_granted: Option<&[u8]>) -> Vec<u8> {
        let granted = already_granted.filter(|g| !is_zero(g));
        match granted {
            None => self.code.clone(),
            Some(granted) => {
                let mut missing = vec![0_u8; self.code.len()];
                for i in 0..self.params.cell_bit_length {
                    if get_bit(&self.code, i) && !get_bit(granted, i) && self.retry_rng.random_bool(0.5) {
                        set_bit(&mut missing, i);
                    }
                }
                missing
            }
        }
    }

    /// The size, in bytes, of an encoded request cell.
    pub fn encoded_size(&self) -> usize {
        self.params.cell_byte_length()
    }
}

/// Tracks every known nym's code and recognizes them in an aggregated
/// request cell.
pub struct RequestChecker {
    params: RequestParams,
    bloom: HashMap<Vec<u8>, Vec<usize>>,
    full: Vec<u8>,
    trapmask: Vec<u8>,
}

impl RequestChecker {
    /// Builds a checker from each nym's list of trustee-shared trap
    /// secrets, in nym-index order.
    pub fn new(params: RequestParams, seedlists: &[Vec<Vec<u8>>]) -> Self {
        let mut bloom: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        let mut full = vec![0_u8; params.cell_byte_length()];
        for (i, seeds) in seedlists.iter().enumerate() {
            let (code, _rng) = derive_code(seeds, &params);
            bitor_assign(&mut full, &code);
            bloom.entry(code).or_default().push(i);
        }
        let trapmask = bitnot(&full);
        RequestChecker {
            params,
            bloom,
            full,
            trapmask,
        }
    }

    /// The OR of every known nym's code.
    pub fn full(&self) -> &[u8] {
        &self.full
    }

    /// Verifies that no trap bit in `cell` has been set: `cell & trapmask`
    /// must be all zero.
    pub fn check(&self, cell: &[u8]) -> bool {
        is_zero(&bitand(cell, &self.trapmask))
    }

    /// The request cell's size in bytes.
    pub fn cell_byte_length(&self) -> usize {
        self.params.cell_byte_length()
    }
}

/// Recovers the set of requesting nyms from an aggregated request cell.
pub struct RequestDecoder {
    checker: RequestChecker,
}

impl RequestDecoder {
    /// Builds a decoder from each nym's list of trustee-shared trap
    /// secrets, in nym-index order.
    pub fn new(params: RequestParams, seedlists: &[Vec<Vec<u8>>]) -> Self {
        RequestDecoder {
            checker: RequestChecker::new(params, seedlists),
        }
    }

    /// Verifies that no trap bit in `cell` has been set.
    pub fn check(&self, cell: &[u8]) -> bool {
        self.checker.check(cell)
    }

    /// Returns every nym index whose code is fully contained in `cell`,
    /// sorted ascending. May include extra indices beyond the true
    /// requesters with probability bounded by the tuner's collision risk.
    pub fn decode(&self, cell: &[u8]) -> Vec<usize> {
        let mut nyms = Vec::new();
        for (code, indices) in &self.checker.bloom {
            if bitand(cell, code) == *code {
                nyms.extend(indices.iter().copied());
            }
        }
        nyms.sort_unstable();
        nyms
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn params() -> RequestParams {
        RequestParams::tuned(3, 0.1, 0.01).unwrap()
    }

    #[test]
    fn code_from_seeds_is_deterministic_and_full_weight() {
        let p = params();
        let (code_a, _) = derive_code(&[b"seed".as_slice()], &p);
        let (code_b, _) = derive_code(&[b"seed".as_slice()], &p);
        assert_eq!(code_a, code_b);

        let popcount: u32 = code_a.iter().map(|b| b.count_ones()).sum();
        assert_eq!(popcount as usize, p.bits_per_nym);
    }

    #[test]
    fn bloom_decode_contains_every_requester() {
        let p = params();
        let seedlists = vec![
            vec![b"nym-0".to_vec()],
            vec![b"nym-1".to_vec()],
            vec![b"nym-2".to_vec()],
        ];
        let decoder = RequestDecoder::new(p, &seedlists);

        let mut encoders: Vec<_> = seedlists
            .iter()
            .map(|seeds| RequestEncoder::new(p, seeds))
            .collect();

        let mut aggregate = vec![0_u8; p.cell_byte_length()];
        for (i, enc) in encoders.iter_mut().enumerate() {
            if i == 1 {
                continue; // nym 1 does not request this round
            }
            bitor_assign(&mut aggregate, &enc.encode(None));
        }

        assert!(decoder.check(&aggregate));
        let decoded = decoder.decode(&aggregate);
        assert!(decoded.contains(&0));
        assert!(decoded.contains(&2));
    }

    #[test]
    fn trap_bit_set_fails_check() {
        let p = params();
        let seedlists = vec![vec![b"nym-0".to_vec()]];
        let decoder = RequestDecoder::new(p, &seedlists);
        let mut tampered = vec![0xFF_u8; p.cell_byte_length()];
        // An all-ones cell necessarily sets every trap bit unless the
        // single nym's code happens to be all ones, which it cannot be
        // since bits_per_nym < cell_bit_length.
        assert!(!decoder.check(&tampered));
        tampered.fill(0);
        assert!(decoder.check(&tampered));
    }

    #[test]
    fn retry_only_resends_ungranted_bits() {
        let p = params();
        let seeds = [b"nym-0".as_slice()];
        let mut enc = RequestEncoder::new(p, &seeds);
        let full_code = enc.code().to_vec();

        let retry = enc.encode(Some(&full_code));
        // Every bit already granted must stay clear in the retry.
        for i in 0..p.cell_bit_length {
            if get_bit(&full_code, i) {
                assert!(!get_bit(&retry, i));
            }
        }
    }
}
