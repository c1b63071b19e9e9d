//! The relay-side state machine: collects every trustee's and client's
//! per-slot ciphertext and Verdict contribution, strips the Verdict
//! blinding, and recovers each slot's cleartext; also aggregates and
//! decodes clients' request cells.

use dcnet_cell::inversion::InversionCodec;
use dcnet_cell::request::RequestDecoder;
use dcnet_llcrypto::group::{Element, SchnorrGroup};
use dcnet_llcrypto::keystream::CELL_LENGTH;

use crate::err::Error;
use crate::verdict::Accumulator;

/// The relay's interval state: accumulated trustee ciphertexts, a running
/// XOR buffer, the Verdict accumulator, and the request-cell accumulator.
pub struct Relay {
    nyms: usize,
    trustee_count: usize,
    interval: Option<u64>,
    trustee_cells: Vec<Vec<Vec<u8>>>,
    xorbuf: Option<[u8; CELL_LENGTH]>,
    verdict: Accumulator,
    request_decoder: Option<RequestDecoder>,
    request_accumulator: Vec<u8>,
    last_granted: Vec<u8>,
}

impl Relay {
    /// Construct a relay expecting ciphertext from `trustee_count`
    /// trustees.
    pub fn new(trustee_count: usize) -> Self {
        Relay {
            nyms: 0,
            trustee_count,
            interval: None,
            trustee_cells: Vec::new(),
            xorbuf: None,
            verdict: Accumulator::new(),
            request_decoder: None,
            request_accumulator: Vec::new(),
            last_granted: Vec::new(),
        }
    }

    /// Register that `count` more nyms now have reserved slots.
    pub fn add_nyms(&mut self, count: usize) {
        self.nyms += count;
    }

    /// Advance to a new interval, discarding any pending trustee
    /// ciphertext and request-cell accumulation from the last one.
    ///
    /// `request_decoder`, if given, replaces this interval's decoder for
    /// recognizing requesting nyms (it must be rebuilt whenever trap
    /// secrets change, i.e. every interval a client might request a new
    /// slot).
    pub fn sync(&mut self, interval: u64, request_decoder: Option<RequestDecoder>) {
        tracing::debug!(interval, nyms = self.nyms, "relay synced to new interval");
        self.interval = Some(interval);
        self.trustee_cells = vec![Vec::new(); self.trustee_count];
        if let Some(decoder) = request_decoder {
            self.last_granted = vec![0_u8; decoder.cell_byte_length()];
            self.request_accumulator = vec![0_u8; decoder.cell_byte_length()];
            self.request_decoder = Some(decoder);
        } else if let Some(decoder) = &self.request_decoder {
            self.request_accumulator = vec![0_u8; decoder.cell_byte_length()];
        }
    }

    /// The interval this relay last synced to, if any.
    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    /// The previous round's decoded request-cell state, handed back to
    /// clients so they know which of their requested bits are granted.
    pub fn granted_mask(&self) -> &[u8] {
        &self.last_granted
    }

    /// The public generator this round's Verdict contributions must be
    /// raised from.
    pub fn generator(&self, group: &SchnorrGroup) -> Element {
        self.verdict.generator(group)
    }

    /// Store one trustee's full set of per-nym cells for this interval.
    pub fn store_trustee_ciphertext(&mut self, trustee_index: usize, cells_for_nyms: Vec<Vec<u8>>) -> Result<(), Error> {
        let slot = self
            .trustee_cells
            .get_mut(trustee_index)
            .ok_or(Error::BadApiUsage("trustee index out of range"))?;
        *slot = cells_for_nyms;
        Ok(())
    }

    /// Fold one client's request cell into this interval's aggregate.
    pub fn ingest_request_cell(&mut self, cell: &[u8]) -> Result<(), Error> {
        if cell.is_empty() {
            return Ok(());
        }
        if cell.len() != self.request_accumulator.len() {
            return Err(Error::BadApiUsage("request cell length does not match this interval's parameters"));
        }
        for (acc, c) in self.request_accumulator.iter_mut().zip(cell) {
            *acc |= c;
        }
        Ok(())
    }

    /// Decode the nyms that successfully reserved a slot this interval
    /// from the request cells ingested so far.
    pub fn decode_requests(&mut self) -> Result<Vec<usize>, Error> {
        let decoder = self
            .request_decoder
            .as_ref()
            .ok_or(Error::BadApiUsage("decode_requests called with no request decoder installed"))?;
        self.last_granted = self.request_accumulator.clone();
        Ok(decoder.decode(&self.request_accumulator))
    }

    /// Combine every client's and trustee's ciphertext and Verdict
    /// contribution into this interval's cleartexts, one per nym slot.
    ///
    /// `client_cells[c][slot]` is client `c`'s ciphertext for `slot`;
    /// `client_verdicts[c][slot]` and `trustee_verdicts[t]` are the
    /// matching Verdict contributions (a trustee contributes the same
    /// value to every slot, since it never carries a payload).
    pub fn process_ciphertext(
        &mut self,
        client_cells: &[Vec<Vec<u8>>],
        client_verdicts: &[Vec<Element>],
        trustee_verdicts: &[Element],
        group: &SchnorrGroup,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let mut cleartexts = Vec::with_capacity(self.nyms);
        for slot in 0..self.nyms {
            self.decode_start();
            for trustee in &self.trustee_cells {
                if let Some(cell) = trustee.get(slot) {
                    self.decode_trustee(cell)?;
                }
            }
            for client in client_cells {
                if let Some(cell) = client.get(slot) {
                    self.decode_client(cell)?;
                }
            }
            let cleartext = self.decode_cell();

            let mut contributions: Vec<Element> = trustee_verdicts.to_vec();
            for verdicts in client_verdicts {
                if let Some(c) = verdicts.get(slot) {
                    contributions.push(c.clone());
                }
            }
            let combined = self.verdict.before(&contributions, group);
            if let Ok(decoded) = group.decode(&combined) {
                let prefix_len = decoded.len().min(cleartext.len());
                if decoded[..prefix_len] != cleartext[..prefix_len] {
                    tracing::warn!(slot, "verdict-certified payload disagrees with the recovered cleartext");
                }
            }

            self.verdict.after(&cleartext);
            cleartexts.push(cleartext);
        }
        Ok(cleartexts)
    }

    /// Reset the running XOR buffer before decoding one slot.
    pub fn decode_start(&mut self) {
        self.xorbuf = Some([0_u8; CELL_LENGTH]);
    }

    /// XOR in one client's cell for the slot currently being decoded.
    pub fn decode_client(&mut self, cell: &[u8]) -> Result<(), Error> {
        xor_into(
            self.xorbuf
                .as_mut()
                .ok_or(Error::BadApiUsage("decode_client called before decode_start"))?,
            cell,
        );
        Ok(())
    }

    /// XOR in one trustee's cell for the slot currently being decoded.
    pub fn decode_trustee(&mut self, cell: &[u8]) -> Result<(), Error> {
        self.decode_client(cell)
    }

    /// Return the slot's recovered cleartext.
    pub fn decode_cell(&self) -> Vec<u8> {
        self.xorbuf.unwrap_or([0_u8; CELL_LENGTH]).to_vec()
    }

    /// Check a slot's recovered cleartext against the trap-bit noise its
    /// nym's [`InversionCodec`] expects, resetting the codec first.
    ///
    /// As in [`crate::trustee::Trustee::check_interval_traps`], only the
    /// cleartext's leading [`dcnet_cell::inversion::ENCODED_SIZE`] bytes
    /// carry the inversion-coded cell.
    pub fn trap_decode_cleartext(&self, codec: &mut InversionCodec, cleartext: &[u8]) -> bool {
        let Some(prefix) = cleartext.get(..dcnet_cell::inversion::ENCODED_SIZE) else {
            return false;
        };
        let Ok(cell): Result<[u8; dcnet_cell::inversion::ENCODED_SIZE], _> = prefix.try_into() else {
            return false;
        };
        codec.reset();
        codec.check(&cell)
    }
}

fn xor_into(buf: &mut [u8; CELL_LENGTH], cell: &[u8]) {
    for (b, c) in buf.iter_mut().zip(cell.iter()) {
        *b ^= c;
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use dcnet_llcrypto::group::verdict_1024;
    use num_bigint::BigUint;

    #[test]
    fn process_ciphertext_combines_trustee_and_client_cells() {
        let group = verdict_1024();
        let mut relay = Relay::new(1);
        relay.add_nyms(1);
        relay.sync(0, None);

        let mut cell = [0_u8; CELL_LENGTH];
        cell[..5].copy_from_slice(b"hello");
        relay.store_trustee_ciphertext(0, vec![cell.to_vec()]).unwrap();

        let client_cells = vec![vec![vec![0_u8; CELL_LENGTH]]];
        let identity = group.multiply(&group.generator(), &BigUint::from(0_u32));
        let cleartexts = relay
            .process_ciphertext(&client_cells, &[vec![identity.clone()]], &[identity], &group)
            .unwrap();
        assert_eq!(&cleartexts[0][..5], b"hello");
    }

    #[test]
    fn store_trustee_ciphertext_rejects_bad_index() {
        let mut relay = Relay::new(1);
        assert!(relay.store_trustee_ciphertext(5, vec![]).is_err());
    }

    #[test]
    fn decode_client_before_start_errors() {
        let mut relay = Relay::new(1);
        assert!(relay.decode_client(&[0_u8; CELL_LENGTH]).is_err());
    }

    #[test]
    fn decode_requests_errors_without_decoder() {
        let mut relay = Relay::new(1);
        assert!(relay.decode_requests().is_err());
    }

    #[test]
    fn ingest_request_cell_rejects_mismatched_length() {
        use dcnet_cell::request::{RequestDecoder, RequestParams};
        let params = RequestParams::tuned(1, 0.1, 0.01).unwrap();
        let mut relay = Relay::new(1);
        relay.sync(0, Some(RequestDecoder::new(params, &[vec![b"nym-0".to_vec()]])));
        assert!(relay.ingest_request_cell(&vec![0_u8; params.cell_byte_length() + 1]).is_err());
    }
}
