//! The inversion trap-encoding cell codec.
//!
//! Each data chunk of a cell is conditionally bit-complemented so that one
//! PRNG-chosen bit within it equals the corresponding bit of a PRNG-chosen
//! noise chunk. Whether a chunk was complemented is recorded as a flag bit;
//! the flags for every data chunk are themselves packed into header chunks
//! that go through the very same complement step, with the chunk's own
//! "was I complemented" outcome stored in a reserved guard bit. A party
//! holding the same noise source can recompute every trap position and
//! confirm that none of them drifted from the expected noise bit, which
//! catches tampering without ever learning the plaintext chunks.
//!
//! Parameters are fixed at compile time: one chunk is one byte
//! ([`CHUNK_BITS`] = 8), and a cell holds [`CHUNKS_PER_CELL`] data chunks
//! plus [`HEADER_CHUNKS`] header chunks, for [`ENCODED_SIZE`] bytes total —
//! the combination the upstream prototype's most-developed variant settled
//! on (`cell_bit_length = 24 * 8`).

use rand::Rng;
use rand_chacha::ChaCha12Rng;
use rand_core::SeedableRng;
use sha2::{Digest, Sha256};

use crate::err::Error;

/// Bits per chunk. Chosen so a chunk is exactly one byte.
pub const CHUNK_BITS: usize = 8;
/// Number of data chunks carried by one cell.
pub const CHUNKS_PER_CELL: usize = 21;
/// Number of header chunks: one flag bit per data chunk, 7 usable bits per
/// header byte (the 8th is the header chunk's own guard bit).
pub const HEADER_CHUNKS: usize = 3;
/// Total encoded cell size in bytes (header followed by data).
pub const ENCODED_SIZE: usize = HEADER_CHUNKS + CHUNKS_PER_CELL;
/// The largest plaintext, in bytes, that fits in one cell.
pub const MAX_IN_SIZE: usize = CHUNKS_PER_CELL;

const FLAGS_PER_HEADER_BYTE: usize = CHUNK_BITS - 1;

fn bit_at(byte: u8, pos: usize) -> u8 {
    (byte >> (CHUNK_BITS - 1 - pos)) & 1
}

fn domain_seed(parts: &[&[u8]], tag: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.update(tag);
    hasher.finalize().into()
}

/// Trap-bit codec for one nym's cells, keyed by the trap secrets it shares
/// with every trustee.
///
/// `encode` and `check` both consume the same deterministic sequence of
/// noise and trap-position draws; call [`InversionCodec::reset`] between an
/// `encode` and the matching `check` so the position stream realigns.
pub struct InversionCodec {
    noise_seeds: Vec<Vec<u8>>,
    noise_streams: Vec<ChaCha12Rng>,
    position_stream: ChaCha12Rng,
}

impl InversionCodec {
    /// Builds a codec from the trap secrets shared with each trustee.
    pub fn new<I, S>(trap_secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let noise_seeds = trap_secrets.into_iter().map(|s| s.as_ref().to_vec()).collect();
        let mut codec = InversionCodec {
            noise_seeds,
            noise_streams: Vec::new(),
            position_stream: ChaCha12Rng::from_seed([0; 32]),
        };
        codec.reset();
        codec
    }

    /// Reseeds the noise and position generators to their initial state.
    pub fn reset(&mut self) {
        self.noise_streams = self
            .noise_seeds
            .iter()
            .map(|seed| ChaCha12Rng::from_seed(domain_seed(&[seed], b"dcnet-inversion-noise")))
            .collect();
        let refs: Vec<&[u8]> = self.noise_seeds.iter().map(Vec::as_slice).collect();
        self.position_stream = ChaCha12Rng::from_seed(domain_seed(&refs, b"dcnet-inversion-position"));
    }

    /// Draws `count` noise bytes (the XOR of every trustee's noise stream)
    /// and `count` trap positions in `[0, CHUNK_BITS)`.
    fn draw_traps(&mut self, count: usize) -> (Vec<u8>, Vec<usize>) {
        let mut noise = vec![0_u8; count];
        for stream in &mut self.noise_streams {
            for slot in noise.iter_mut() {
                *slot ^= stream.random::<u8>();
            }
        }
        let positions = (0..count).map(|_| self.position_stream.random_range(0..CHUNK_BITS)).collect();
        (noise, positions)
    }

    /// Encodes `data` (at most [`MAX_IN_SIZE`] bytes) into one cell.
    pub fn encode(&mut self, data: &[u8]) -> Result<[u8; ENCODED_SIZE], Error> {
        if data.len() > MAX_IN_SIZE {
            return Err(Error::InputTooLarge {
                max: MAX_IN_SIZE,
                actual: data.len(),
            });
        }
        let mut chunks = [0_u8; CHUNKS_PER_CELL];
        chunks[..data.len()].copy_from_slice(data);

        let (noise, positions) = self.draw_traps(ENCODED_SIZE);
        let (header_noise, data_noise) = noise.split_at(HEADER_CHUNKS);
        let (header_pos, data_pos) = positions.split_at(HEADER_CHUNKS);

        let mut flags = [0_u8; CHUNKS_PER_CELL];
        let mut out_data = [0_u8; CHUNKS_PER_CELL];
        for i in 0..CHUNKS_PER_CELL {
            let p = data_pos[i];
            if bit_at(chunks[i], p) == bit_at(data_noise[i], p) {
                out_data[i] = chunks[i];
            } else {
                out_data[i] = !chunks[i];
                flags[i] = 1;
            }
        }

        let mut out_header = [0_u8; HEADER_CHUNKS];
        for h in 0..HEADER_CHUNKS {
            let mut raw = 0_u8;
            for b in 0..FLAGS_PER_HEADER_BYTE {
                let idx = h * FLAGS_PER_HEADER_BYTE + b;
                if idx < CHUNKS_PER_CELL && flags[idx] == 1 {
                    raw |= 1 << (FLAGS_PER_HEADER_BYTE - 1 - b);
                }
            }
            let p = header_pos[h];
            out_header[h] = if bit_at(raw, p) == bit_at(header_noise[h], p) {
                raw
            } else {
                !raw
            };
        }

        let mut out = [0_u8; ENCODED_SIZE];
        out[..HEADER_CHUNKS].copy_from_slice(&out_header);
        out[HEADER_CHUNKS..].copy_from_slice(&out_data);
        Ok(out)
    }

    /// Decodes a cell back into its [`MAX_IN_SIZE`]-byte plaintext
    /// (zero-padded for inputs shorter than a full cell). Stateless: does
    /// not touch the noise or position generators.
    pub fn decode(&self, cell: &[u8; ENCODED_SIZE]) -> [u8; MAX_IN_SIZE] {
        let header = &cell[..HEADER_CHUNKS];
        let data = &cell[HEADER_CHUNKS..];

        let mut flags = [0_u8; CHUNKS_PER_CELL];
        for h in 0..HEADER_CHUNKS {
            let guard = bit_at(header[h], 0);
            let raw = if guard == 1 { !header[h] } else { header[h] };
            for b in 0..FLAGS_PER_HEADER_BYTE {
                let idx = h * FLAGS_PER_HEADER_BYTE + b;
                if idx < CHUNKS_PER_CELL {
                    flags[idx] = (raw >> (FLAGS_PER_HEADER_BYTE - 1 - b)) & 1;
                }
            }
        }

        let mut out = [0_u8; MAX_IN_SIZE];
        for i in 0..CHUNKS_PER_CELL {
            out[i] = if flags[i] == 1 { !data[i] } else { data[i] };
        }
        out
    }

    /// Recomputes the noise and trap positions used by the most recent
    /// `encode` call (after a matching [`InversionCodec::reset`]) and
    /// confirms every chunk's trap bit still matches its noise.
    pub fn check(&mut self, cell: &[u8; ENCODED_SIZE]) -> bool {
        let (noise, positions) = self.draw_traps(ENCODED_SIZE);
        let (header_noise, data_noise) = noise.split_at(HEADER_CHUNKS);
        let (header_pos, data_pos) = positions.split_at(HEADER_CHUNKS);

        let header = &cell[..HEADER_CHUNKS];
        let data = &cell[HEADER_CHUNKS..];

        for h in 0..HEADER_CHUNKS {
            if bit_at(header[h], header_pos[h]) != bit_at(header_noise[h], header_pos[h]) {
                return false;
            }
        }
        for i in 0..CHUNKS_PER_CELL {
            if bit_at(data[i], data_pos[i]) != bit_at(data_noise[i], data_pos[i]) {
                return false;
            }
        }
        true
    }

    /// The fixed size of an encoded cell in bytes.
    pub fn encoded_size(&self) -> usize {
        ENCODED_SIZE
    }

    /// The fixed size of a decoded plaintext in bytes.
    pub fn decoded_size(&self) -> usize {
        MAX_IN_SIZE
    }
}

impl crate::cell::Codec for InversionCodec {
    const ENCODED_SIZE: usize = ENCODED_SIZE;
    const MAX_IN_SIZE: usize = MAX_IN_SIZE;

    fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        InversionCodec::encode(self, data).map(|cell| cell.to_vec())
    }

    fn decode(&self, cell: &[u8]) -> Vec<u8> {
        let mut fixed = [0_u8; ENCODED_SIZE];
        fixed.copy_from_slice(cell);
        InversionCodec::decode(self, &fixed).to_vec()
    }

    fn check(&mut self, cell: &[u8]) -> bool {
        let mut fixed = [0_u8; ENCODED_SIZE];
        fixed.copy_from_slice(cell);
        InversionCodec::check(self, &fixed)
    }
}
