//! Ciphers used to implement the dcnet protocols.
//!
//! The keystream layer only ever needs AES in counter mode, keyed with a
//! short digest of a pairwise Diffie-Hellman secret.

/// Counter-mode AES, as used to build the per-pair keystreams that clients,
/// trustees and the relay XOR together to produce and peel off a cell's
/// ciphertext.
///
/// These types implement the `cipher::StreamCipher` trait; use the
/// [`cipher`](https://docs.rs/cipher) crate to drive them.
pub mod aes {
    /// AES-128 in counter mode.
    pub type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
}
