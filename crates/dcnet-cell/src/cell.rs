//! A shared codec abstraction for fixed-size, single-party cell transforms.
//!
//! The upstream prototype let `Inversion`, `Null`, and `Request` codecs
//! stand in for each other by duck typing; this crate instead gives
//! same-shaped codecs (those whose `decode` recovers bytes rather than, as
//! with the request codec, a set of nym indices) one explicit trait.

/// A fixed-size cell transform: encode plaintext into a cell, decode it
/// back, and check whether a cell still carries the sender's trap pattern.
pub trait Codec {
    /// The fixed size of an encoded cell, in bytes.
    const ENCODED_SIZE: usize;
    /// The largest plaintext this codec accepts, in bytes.
    const MAX_IN_SIZE: usize;

    /// Encodes `data` (at most `MAX_IN_SIZE` bytes) into a cell.
    fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, crate::Error>;

    /// Decodes a cell back into its plaintext.
    fn decode(&self, cell: &[u8]) -> Vec<u8>;

    /// Checks whether `cell` still carries an untampered trap pattern.
    fn check(&mut self, cell: &[u8]) -> bool;
}

/// A no-op codec: encode and decode are the identity, and every cell
/// passes its check. Used for slots that carry pure keystream with no
/// trap-bit protection of their own (for instance the trustee's
/// contribution to the request slot, which relies on the request codec's
/// own trap mask instead).
pub struct NullCodec<const N: usize>;

impl<const N: usize> Codec for NullCodec<N> {
    const ENCODED_SIZE: usize = N;
    const MAX_IN_SIZE: usize = N;

    fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, crate::Error> {
        if data.len() > N {
            return Err(crate::Error::InputTooLarge {
                max: N,
                actual: data.len(),
            });
        }
        let mut out = vec![0_u8; N];
        out[..data.len()].copy_from_slice(data);
        Ok(out)
    }

    fn decode(&self, cell: &[u8]) -> Vec<u8> {
        cell.to_vec()
    }

    fn check(&mut self, _cell: &[u8]) -> bool {
        true
    }
}
