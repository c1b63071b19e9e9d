//! The per-interval XOR keystream shared by every DC-net participant.
//!
//! Each pair of participants (a client and a trustee, or the two halves of
//! a nym) derives a shared secret from their Diffie-Hellman exchange. That
//! secret seeds an AES-128-CTR stream; a cell's ciphertext is the XOR of
//! every party's keystream output for that slot. Because each party
//! contributes exactly one stream of the XOR, and every client's stream is
//! also known to (and cancelled by) some trustee's stream, the plaintext
//! only emerges when all contributing streams are combined.

use cipher::{KeyIvInit, StreamCipher};
use sha2::{Digest, Sha256};

use crate::cipher::aes::Aes128Ctr;

/// The fixed size, in bytes, of one DC-net cell.
pub const CELL_LENGTH: usize = 256;

/// Derive the AES-128-CTR seed for a pairwise shared secret in a given
/// interval: the first 16 bytes of `SHA-256(secret ‖ interval)`.
///
/// Mixing the interval number into the seed is what makes each interval's
/// keystream independent even though the underlying Diffie-Hellman secret
/// (derived from long-term keys) never changes between intervals.
fn derive_seed(secret: &[u8], interval: u64) -> [u8; 16] {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(interval.to_be_bytes());
    let digest = hasher.finalize();
    let mut seed = [0_u8; 16];
    seed.copy_from_slice(&digest[..16]);
    seed
}

/// A set of independent AES-CTR keystreams, one per pairwise shared secret,
/// that together produce (or strip) one DC-net cell's ciphertext per call.
///
/// Every stream starts at counter zero and advances by one cell
/// ([`CELL_LENGTH`] bytes) each time [`XorNet::produce_ciphertext`] is
/// called, so the `n`th call consumes the `n`th cell's worth of keystream
/// from every contributing secret.
pub struct XorNet {
    streams: Vec<Aes128Ctr>,
}

impl XorNet {
    /// Build a new keystream set from a list of shared secrets, seeded for
    /// a specific `interval`.
    ///
    /// The order of `secrets` does not matter: XOR is commutative, so the
    /// resulting ciphertext is the same regardless of which stream runs
    /// first. Calling this again with a different `interval` (even for the
    /// same secrets) produces an entirely independent keystream.
    pub fn new<I, S>(secrets: I, interval: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let streams = secrets
            .into_iter()
            .map(|secret| {
                let seed = derive_seed(secret.as_ref(), interval);
                Aes128Ctr::new(&seed.into(), &[0_u8; 16].into())
            })
            .collect();
        XorNet { streams }
    }

    /// Produce this interval's next cell of output: the XOR of all
    /// contributing streams' keystreams at the current counter position.
    ///
    /// Advances every stream's counter by one cell.
    pub fn produce_ciphertext(&mut self) -> [u8; CELL_LENGTH] {
        let mut out = [0_u8; CELL_LENGTH];
        for stream in &mut self.streams {
            let mut chunk = [0_u8; CELL_LENGTH];
            stream.apply_keystream(&mut chunk);
            for (o, c) in out.iter_mut().zip(chunk.iter()) {
                *o ^= c;
            }
        }
        out
    }
}

/// Derive one cell's worth of deterministic "trap noise" from a pairwise
/// trap secret and an interval number.
///
/// A client (for its own nym) and every trustee (for that same nym) can
/// each compute this independently from the Diffie-Hellman secret they
/// share; when every party XORs its copy into the cell it contributes for
/// that slot, the contributions cancel exactly, the same way the rest of
/// [`XorNet`]'s streams do. This is what lets trap-bit checking work even
/// for slots nobody sent on: the noise pattern is present in every round,
/// not only when a payload happens to be encoded.
pub fn derive_trap_noise(secret: &[u8], interval: u64) -> [u8; CELL_LENGTH] {
    XorNet::new([secret], interval).produce_ciphertext()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_stream_matches_raw_keystream() {
        let secret = b"shared secret a";
        let mut net = XorNet::new([secret], 0);
        let cell = net.produce_ciphertext();

        let seed = derive_seed(secret, 0);
        let mut raw = Aes128Ctr::new(&seed.into(), &[0_u8; 16].into());
        let mut expected = [0_u8; CELL_LENGTH];
        raw.apply_keystream(&mut expected);

        assert_eq!(cell, expected);
    }

    #[test]
    fn two_streams_cancel_when_secrets_match() {
        // A client contributing +secret and a trustee contributing the same
        // secret produce streams that XOR away to zero, just as in the
        // real protocol a client's and its paired trustee's contributions
        // cancel when no one else is transmitting.
        let mut net = XorNet::new([b"shared secret".as_slice(), b"shared secret".as_slice()], 0);
        let cell = net.produce_ciphertext();
        assert_eq!(cell, [0_u8; CELL_LENGTH]);
    }

    #[test]
    fn successive_cells_differ() {
        let mut net = XorNet::new([b"shared secret".as_slice()], 0);
        let first = net.produce_ciphertext();
        let second = net.produce_ciphertext();
        assert_ne!(first, second);
    }

    #[test]
    fn same_secret_differs_across_intervals() {
        let mut net0 = XorNet::new([b"shared secret".as_slice()], 0);
        let mut net1 = XorNet::new([b"shared secret".as_slice()], 1);
        assert_ne!(net0.produce_ciphertext(), net1.produce_ciphertext());
    }

    #[test]
    fn trap_noise_cancels_across_parties() {
        let trap_secret = b"nym-trustee trap secret";
        let a = derive_trap_noise(trap_secret, 3);
        let b = derive_trap_noise(trap_secret, 3);
        assert_eq!(a, b);

        let mut combined = [0_u8; CELL_LENGTH];
        for (c, (x, y)) in combined.iter_mut().zip(a.iter().zip(b.iter())) {
            *c = x ^ y;
        }
        assert_eq!(combined, [0_u8; CELL_LENGTH]);
    }

    #[test]
    fn trap_noise_differs_across_intervals() {
        let trap_secret = b"nym-trustee trap secret";
        assert_ne!(
            derive_trap_noise(trap_secret, 0),
            derive_trap_noise(trap_secret, 1)
        );
    }
}
