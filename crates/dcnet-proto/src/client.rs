//! The client-side state machine: one participant sending into the
//! DC-net, one interval at a time.

use dcnet_bytes::SecretBuf;
use dcnet_cell::inversion::InversionCodec;
use dcnet_cell::request::{RequestEncoder, RequestParams};
use dcnet_llcrypto::group::{Element, Keypair, SchnorrGroup};
use dcnet_llcrypto::keystream::{derive_trap_noise, XorNet, CELL_LENGTH};

use crate::err::Error;
use crate::verdict::{Certifier, VerdictKey};

/// A client's long-term identity, interval state and pending send.
pub struct Client {
    key: Keypair,
    trustee_keys: Vec<Element>,
    owned_nym: Option<Keypair>,
    nym_keys: Vec<Element>,
    request_params: RequestParams,
    interval: Option<u64>,
    xornet: Option<XorNet>,
    certifier: Option<Certifier>,
    inversion_codec: Option<InversionCodec>,
    request_encoder: Option<RequestEncoder>,
    trap_noise: Option<[u8; CELL_LENGTH]>,
    pending_send: Option<(usize, Vec<u8>)>,
}

impl Client {
    /// Construct a client from its long-term keypair, the trustees' public
    /// keys, and the request-cell parameters every nym shares this epoch.
    pub fn new(key: Keypair, trustee_keys: Vec<Element>, request_params: RequestParams) -> Self {
        Client {
            key,
            trustee_keys,
            owned_nym: None,
            nym_keys: Vec::new(),
            request_params,
            interval: None,
            xornet: None,
            certifier: None,
            inversion_codec: None,
            request_encoder: None,
            trap_noise: None,
            pending_send: None,
        }
    }

    /// Register the nym this client owns for the upcoming interval.
    pub fn add_own_nym(&mut self, nym_key: Keypair) {
        self.owned_nym = Some(nym_key);
    }

    /// Register every nym's public key, in slot order.
    pub fn add_nyms(&mut self, nym_keys: Vec<Element>) {
        self.nym_keys = nym_keys;
    }

    /// The interval this client last synced to, if any.
    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    /// This client's slot index, if it owns a registered nym.
    fn owned_slot(&self) -> Option<usize> {
        let owned = self.owned_nym.as_ref()?;
        self.nym_keys.iter().position(|k| *k == owned.public)
    }

    /// Advance to a new interval: rederive the XOR keystream against this
    /// interval's trustee secrets, this client's Verdict contribution, and
    /// — if this client owns a nym — fresh trap secrets with every
    /// trustee, a matching [`InversionCodec`] and [`RequestEncoder`].
    pub fn sync(&mut self, interval: u64, trap_keys: &[Element], group: &SchnorrGroup) -> Result<(), Error> {
        let mut secrets = Vec::with_capacity(self.trustee_keys.len());
        for trustee in &self.trustee_keys {
            let shared = group.multiply(trustee, self.key.secret.as_biguint());
            let mut buf = SecretBuf::new();
            buf.extend_from_slice(&shared.as_biguint().to_bytes_be());
            secrets.push(buf);
        }
        self.xornet = Some(XorNet::new(secrets, interval));

        let key = VerdictKey::for_client(&self.key, self.owned_nym.as_ref(), &self.trustee_keys, group);
        self.certifier = Some(Certifier::new(key));

        match &self.owned_nym {
            Some(nym) => {
                let mut trap_secrets = Vec::with_capacity(trap_keys.len());
                let mut trap_noise = [0_u8; CELL_LENGTH];
                for trap_pub in trap_keys {
                    let shared = group.multiply(trap_pub, nym.secret.as_biguint());
                    let mut buf = SecretBuf::new();
                    buf.extend_from_slice(&shared.as_biguint().to_bytes_be());

                    let noise = derive_trap_noise(buf.as_ref(), interval);
                    for (n, b) in trap_noise.iter_mut().zip(noise.iter()) {
                        *n ^= b;
                    }
                    trap_secrets.push(buf);
                }
                self.inversion_codec = Some(InversionCodec::new(trap_secrets.clone()));
                self.request_encoder = Some(RequestEncoder::new(self.request_params, &trap_secrets));
                self.trap_noise = Some(trap_noise);
            }
            None => {
                self.inversion_codec = None;
                self.request_encoder = None;
                self.trap_noise = None;
            }
        }

        tracing::debug!(interval, trap_count = trap_keys.len(), "client synced to new interval");
        self.interval = Some(interval);
        self.pending_send = None;
        Ok(())
    }

    /// Stage a payload to be sent in the owned nym's slot this interval.
    ///
    /// `slot` must match the position of this client's own nym in the
    /// order passed to [`Client::add_nyms`]. `data` must fit within one
    /// inversion-coded cell (see [`dcnet_cell::inversion::MAX_IN_SIZE`]).
    pub fn send(&mut self, slot: usize, data: Vec<u8>) -> Result<(), Error> {
        match self.owned_slot() {
            Some(owned) if owned == slot => {
                self.pending_send = Some((slot, data));
                Ok(())
            }
            Some(_) => Err(Error::BadApiUsage("client does not own the requested slot")),
            None => Err(Error::BadApiUsage("client has no nym registered to send with")),
        }
    }

    /// This client's Verdict commitment for the current interval.
    pub fn commitment(&self) -> Option<&Element> {
        self.certifier.as_ref().map(Certifier::commitment)
    }

    /// This client's Verdict contribution for a cell: `payload` should be
    /// `Some` only when this client owns the cell's slot.
    pub fn verdict_contribute(
        &self,
        generator: &Element,
        payload: Option<&[u8]>,
        group: &SchnorrGroup,
    ) -> Result<Element, Error> {
        let certifier = self
            .certifier
            .as_ref()
            .ok_or(Error::BadApiUsage("verdict_contribute called before sync"))?;
        certifier.contribute(generator, payload, group)
    }

    /// Produce this interval's ciphertext: one [`CELL_LENGTH`]-byte cell
    /// per registered nym (the owned slot's payload trap-encoded and XORed
    /// in, if a send was staged), a matching Verdict contribution for every
    /// slot, and — if this client owns a nym — a request cell.
    ///
    /// `already_granted` is the previous round's decoded request-cell
    /// state, used to avoid resending already-granted bits.
    #[allow(clippy::type_complexity)]
    pub fn produce_ciphertexts(
        &mut self,
        generator: &Element,
        already_granted: Option<&[u8]>,
        group: &SchnorrGroup,
    ) -> Result<(Vec<Vec<u8>>, Vec<Element>, Vec<u8>), Error> {
        if self.xornet.is_none() {
            return Err(Error::BadApiUsage("produce_ciphertexts called before sync"));
        }

        let slot_count = self.nym_keys.len().max(1);
        let pending = self.pending_send.take();
        let owned_slot = self.owned_slot();

        let mut cells = Vec::with_capacity(slot_count);
        let mut verdicts = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            let mut cell = self
                .xornet
                .as_mut()
                .ok_or(Error::BadApiUsage("produce_ciphertexts called before sync"))?
                .produce_ciphertext()
                .to_vec();
            let is_owned = owned_slot == Some(slot);
            let payload = pending.as_ref().filter(|(s, _)| *s == slot).map(|(_, p)| p.as_slice());

            if is_owned {
                let codec = self
                    .inversion_codec
                    .as_mut()
                    .ok_or(Error::BadApiUsage("owned slot has no inversion codec; sync first"))?;
                let encoded = codec.encode(payload.unwrap_or(&[]))?;
                for (c, e) in cell.iter_mut().zip(encoded.iter()) {
                    *c ^= e;
                }
                if let Some(noise) = &self.trap_noise {
                    for (c, n) in cell.iter_mut().zip(noise.iter()) {
                        *c ^= n;
                    }
                }
            }

            let verdict_payload = payload.filter(|_| is_owned);
            verdicts.push(self.verdict_contribute(generator, verdict_payload, group)?);
            cells.push(cell);
        }

        let request_cell = match self.request_encoder.as_mut() {
            Some(encoder) => encoder.encode(already_granted),
            None => Vec::new(),
        };

        Ok((cells, verdicts, request_cell))
    }

    /// Process this interval's recovered cleartexts once the relay
    /// publishes them.
    pub fn process_cleartext(&mut self, cleartexts: &[Vec<u8>]) -> Result<(), Error> {
        if let Some(slot) = self.owned_slot() {
            if let Some(cell) = cleartexts.get(slot) {
                tracing::debug!(slot, bytes = cell.len(), "client observed its own slot's cleartext");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use dcnet_basic_utils::test_rng::deterministic_rng;
    use dcnet_llcrypto::group::verdict_1024;

    fn request_params() -> RequestParams {
        RequestParams::tuned(1, 0.1, 0.01).unwrap()
    }

    #[test]
    fn send_requires_owning_the_slot() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let key = group.random_keypair(&mut rng);
        let trustee = group.random_keypair(&mut rng);
        let mut client = Client::new(key, vec![trustee.public], request_params());

        let nym = group.random_keypair(&mut rng);
        client.add_own_nym(nym.clone());
        client.add_nyms(vec![nym.public]);

        assert!(client.send(0, b"hi".to_vec()).is_ok());
        assert!(client.send(1, b"hi".to_vec()).is_err());
    }

    #[test]
    fn produce_ciphertexts_errors_before_sync() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let key = group.random_keypair(&mut rng);
        let trustee = group.random_keypair(&mut rng);
        let mut client = Client::new(key, vec![trustee.public], request_params());
        let generator = group.generator();
        assert!(client.produce_ciphertexts(&generator, None, &group).is_err());
    }

    #[test]
    fn own_slot_payload_round_trips_through_matching_trustee_and_codec() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let client_key = group.random_keypair(&mut rng);
        let trustee_key = group.random_keypair(&mut rng);
        let trap_key = group.random_keypair(&mut rng);

        let mut client = Client::new(client_key.clone(), vec![trustee_key.public.clone()], request_params());
        let nym = group.random_keypair(&mut rng);
        client.add_own_nym(nym.clone());
        client.add_nyms(vec![nym.public.clone()]);
        client.sync(0, &[trap_key.public.clone()], &group).unwrap();
        client.send(0, b"hello".to_vec()).unwrap();

        let shared = group.multiply(&client_key.public, trustee_key.secret.as_biguint());
        let mut trustee_net = XorNet::new([shared.as_biguint().to_bytes_be()], 0);
        let mut trustee_cell = trustee_net.produce_ciphertext().to_vec();

        let trap_shared = group.multiply(&nym.public, trap_key.secret.as_biguint());
        let trap_noise = dcnet_llcrypto::keystream::derive_trap_noise(&trap_shared.as_biguint().to_bytes_be(), 0);
        for (c, n) in trustee_cell.iter_mut().zip(trap_noise.iter()) {
            *c ^= n;
        }

        let generator = group.generator();
        let (client_cells, _verdicts, _request) = client.produce_ciphertexts(&generator, None, &group).unwrap();
        let mut combined = client_cells[0].clone();
        for (c, t) in combined.iter_mut().zip(trustee_cell.iter()) {
            *c ^= t;
        }

        let codec = InversionCodec::new(Vec::<Vec<u8>>::new());
        let mut cell = [0_u8; dcnet_cell::inversion::ENCODED_SIZE];
        cell.copy_from_slice(&combined[..dcnet_cell::inversion::ENCODED_SIZE]);
        let decoded = codec.decode(&cell);
        assert_eq!(&decoded[..5], b"hello");
    }
}
