//! The trustee-side state machine: one of the servers that jointly
//! provides the keystream secrets and trap noise for a DC-net interval.

use dcnet_bytes::SecretBuf;
use dcnet_cell::inversion::InversionCodec;
use dcnet_llcrypto::group::{Element, Keypair, SchnorrGroup};
use dcnet_llcrypto::keystream::{derive_trap_noise, XorNet, CELL_LENGTH};
use rand_core::RngCore;

use crate::err::Error;
use crate::verdict::{Certifier, VerdictKey};

/// One trustee's long-term identity and interval state.
pub struct Trustee {
    key: Keypair,
    client_keys: Vec<Element>,
    nym_keys: Vec<Element>,
    interval: Option<u64>,
    trap_key: Option<Keypair>,
    xornet: Option<XorNet>,
    certifier: Option<Certifier>,
}

impl Trustee {
    /// Construct a trustee from its long-term keypair and every client's
    /// public key.
    pub fn new(key: Keypair, client_keys: Vec<Element>) -> Self {
        Trustee {
            key,
            client_keys,
            nym_keys: Vec::new(),
            interval: None,
            trap_key: None,
            xornet: None,
            certifier: None,
        }
    }

    /// Register every nym's public key, in slot order.
    pub fn add_nyms(&mut self, nym_keys: Vec<Element>) {
        self.nym_keys = nym_keys;
    }

    /// Advance to a new interval: draw a fresh trap keypair, rederive the
    /// XOR keystream and this trustee's Verdict contribution, and return
    /// the trap key's public half for distribution to every client.
    pub fn sync(&mut self, interval: u64, group: &SchnorrGroup, rng: &mut dyn RngCore) -> Element {
        let trap_key = group.random_keypair(rng);
        let public_trap = trap_key.public.clone();
        self.trap_key = Some(trap_key);

        let mut secrets = Vec::with_capacity(self.client_keys.len());
        for client in &self.client_keys {
            let shared = group.multiply(client, self.key.secret.as_biguint());
            let mut buf = SecretBuf::new();
            buf.extend_from_slice(&shared.as_biguint().to_bytes_be());
            secrets.push(buf);
        }
        self.xornet = Some(XorNet::new(secrets, interval));

        let key = VerdictKey::for_trustee(&self.key, &self.client_keys, &self.nym_keys, group);
        self.certifier = Some(Certifier::new(key));

        tracing::debug!(interval, "trustee synced to new interval");
        self.interval = Some(interval);
        public_trap
    }

    /// The interval this trustee last synced to, if any.
    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    /// This trustee's Verdict commitment for the current interval.
    pub fn commitment(&self) -> Option<&Element> {
        self.certifier.as_ref().map(Certifier::commitment)
    }

    /// This trustee's Verdict contribution for a cell.
    pub fn verdict_contribute(&self, generator: &Element, group: &SchnorrGroup) -> Result<Element, Error> {
        let certifier = self
            .certifier
            .as_ref()
            .ok_or(Error::BadApiUsage("verdict_contribute called before sync"))?;
        Ok(certifier.contribute(generator, None, group)?)
    }

    /// The trap secret this trustee shares with one nym this interval, as
    /// raw bytes suitable for seeding a [`dcnet_cell::request::RequestEncoder`]
    /// or [`InversionCodec`].
    fn trap_secret_with(&self, nym_public: &Element, group: &SchnorrGroup) -> Result<Vec<u8>, Error> {
        let trap_key = self
            .trap_key
            .as_ref()
            .ok_or(Error::BadApiUsage("trap_secret_with called before sync"))?;
        let shared = group.multiply(nym_public, trap_key.secret.as_biguint());
        Ok(shared.as_biguint().to_bytes_be())
    }

    /// Every registered nym's trap secret with this trustee this interval,
    /// in slot order, for building a relay-side request decoder.
    pub fn nym_trap_secrets(&self, group: &SchnorrGroup) -> Result<Vec<Vec<u8>>, Error> {
        self.nym_keys.iter().map(|nym| self.trap_secret_with(nym, group)).collect()
    }

    /// Produce this trustee's cell for one nym slot this interval: the
    /// ordinary pairwise keystream output XORed with the trap noise this
    /// trustee shares with that slot's nym.
    ///
    /// Every client owning a slot folds the same trustee's trap noise into
    /// its own cell (see [`crate::client::Client::sync`]), so the two
    /// contributions cancel in the relay's accumulation; this is what lets
    /// [`Trustee::check_interval_traps`] validate a slot's trap bits
    /// whether or not the slot's owner actually sent anything this round.
    pub fn produce_interval_ciphertext(&mut self, slot: usize, group: &SchnorrGroup) -> Result<Vec<u8>, Error> {
        let interval = self
            .interval
            .ok_or(Error::BadApiUsage("produce_interval_ciphertext called before sync"))?;
        let mut cell = self
            .xornet
            .as_mut()
            .ok_or(Error::BadApiUsage("produce_interval_ciphertext called before sync"))?
            .produce_ciphertext()
            .to_vec();

        if let Some(nym_public) = self.nym_keys.get(slot) {
            let trap_secret = self.trap_secret_with(nym_public, group)?;
            let noise = derive_trap_noise(&trap_secret, interval);
            for (c, n) in cell.iter_mut().zip(noise.iter()) {
                *c ^= n;
            }
        }
        Ok(cell)
    }

    /// The trap secrets this trustee shares with every client, in client
    /// order, suitable for publishing to other trustees so a [`RequestChecker`]
    /// or request code can be derived.
    ///
    /// [`RequestChecker`]: dcnet_cell::request::RequestChecker
    pub fn publish_trap_secrets(&self) -> Result<Vec<u8>, Error> {
        let trap_key = self
            .trap_key
            .as_ref()
            .ok_or(Error::BadApiUsage("publish_trap_secrets called before sync"))?;
        Ok(trap_key.secret.as_biguint().to_bytes_be())
    }

    /// Derive a nym's noise codec from every trustee's published trap
    /// secret for this interval, combined with that nym's public key.
    ///
    /// Each trustee reveals its trap private scalar once the interval it
    /// governs has closed, since the interval's traffic no longer needs
    /// protecting; combined with a nym's public key (which every trustee
    /// already has), that reproduces the same per-trustee shared secret
    /// the nym derived from the trustees' trap public keys while encoding.
    pub fn store_trap_secrets(
        &self,
        nym_public: &Element,
        all_trustee_trap_secrets: &[num_bigint::BigUint],
        group: &SchnorrGroup,
    ) -> InversionCodec {
        let seeds: Vec<Vec<u8>> = all_trustee_trap_secrets
            .iter()
            .map(|secret| group.multiply(nym_public, secret).as_biguint().to_bytes_be())
            .collect();
        InversionCodec::new(seeds)
    }

    /// Check whether a round's recovered cleartexts pass their trap-bit
    /// integrity check, one freshly reset codec per nym slot.
    ///
    /// Each cleartext is the full [`CELL_LENGTH`]-byte cell the relay
    /// recovered; only its leading [`dcnet_cell::inversion::ENCODED_SIZE`]
    /// bytes carry the inversion-coded header and data chunks a codec can
    /// check.
    pub fn check_interval_traps(&self, codecs: &mut [InversionCodec], cleartexts: &[Vec<u8>]) -> bool {
        let mut all_ok = true;
        for (slot, (codec, cleartext)) in codecs.iter_mut().zip(cleartexts).enumerate() {
            let prefix = cleartext.get(..dcnet_cell::inversion::ENCODED_SIZE);
            let Some(Ok(cell)): Option<Result<[u8; dcnet_cell::inversion::ENCODED_SIZE], _>> =
                prefix.map(TryInto::try_into)
            else {
                tracing::warn!(slot, "cleartext is too short to carry an inversion cell");
                all_ok = false;
                continue;
            };
            codec.reset();
            if !codec.check(&cell) {
                tracing::warn!(slot, "trap-bit mismatch detected in interval cleartext");
                all_ok = false;
            }
        }
        all_ok
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use dcnet_basic_utils::test_rng::deterministic_rng;
    use dcnet_llcrypto::group::verdict_1024;

    #[test]
    fn sync_returns_fresh_trap_key_each_interval() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let key = group.random_keypair(&mut rng);
        let mut trustee = Trustee::new(key, vec![]);

        let t0 = trustee.sync(0, &group, &mut rng);
        let t1 = trustee.sync(1, &group, &mut rng);
        assert_ne!(t0, t1);
    }

    #[test]
    fn produce_ciphertext_errors_before_sync() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let key = group.random_keypair(&mut rng);
        let mut trustee = Trustee::new(key, vec![]);
        assert!(trustee.produce_interval_ciphertext(0, &group).is_err());
    }

    #[test]
    fn cell_carries_different_trap_noise_per_nym() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let key = group.random_keypair(&mut rng);
        let mut trustee = Trustee::new(key, vec![]);
        trustee.add_nyms(vec![group.random_keypair(&mut rng).public, group.random_keypair(&mut rng).public]);
        trustee.sync(0, &group, &mut rng);

        let cell_a = trustee.produce_interval_ciphertext(0, &group).unwrap();
        let cell_b = trustee.produce_interval_ciphertext(1, &group).unwrap();
        assert_ne!(cell_a, cell_b);
    }

    #[test]
    fn check_interval_traps_flags_mismatched_cells() {
        let mut codec = InversionCodec::new([b"nym-0 trustee-secret".to_vec()]);
        let mut cell = codec.encode(b"ok").unwrap().to_vec();
        cell.resize(dcnet_llcrypto::keystream::CELL_LENGTH, 0);
        // Flip the first header bit, which should desynchronize it from
        // the noise the codec expects.
        cell[0] ^= 0x80;

        let key = verdict_1024().random_keypair(&mut deterministic_rng());
        let trustee = Trustee::new(key, vec![]);
        assert!(!trustee.check_interval_traps(&mut [codec], &[cell]));
    }

    #[test]
    fn check_interval_traps_rejects_short_cleartext() {
        let key = verdict_1024().random_keypair(&mut deterministic_rng());
        let trustee = Trustee::new(key, vec![]);
        let mut codec = InversionCodec::new([b"nym-0 trustee-secret".to_vec()]);
        assert!(!trustee.check_interval_traps(&mut [codec], &[vec![0_u8; 4]]));
    }
}
