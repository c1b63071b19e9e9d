//! End-to-end test driving a small DC-net interval through the trustee,
//! client and relay state machines, the same way `advance_interval` and a
//! streaming decode would be used in a real deployment.

use dcnet_basic_utils::test_rng::deterministic_rng;
use dcnet_cell::inversion::{InversionCodec, ENCODED_SIZE};
use dcnet_cell::request::RequestParams;
use dcnet_llcrypto::group::verdict_1024;
use dcnet_llcrypto::keystream::CELL_LENGTH;
use dcnet_proto::{advance_interval, Client, Relay, Trustee};

/// Decode a slot's recovered cleartext back to its plaintext payload.
/// Decoding needs no secret: [`InversionCodec::decode`] is stateless.
fn decode_payload(cleartext: &[u8]) -> [u8; dcnet_cell::inversion::MAX_IN_SIZE] {
    let mut cell = [0_u8; ENCODED_SIZE];
    cell.copy_from_slice(&cleartext[..ENCODED_SIZE]);
    InversionCodec::new(Vec::<Vec<u8>>::new()).decode(&cell)
}

/// Ten clients, three trustees: run one interval where only client 0 sends,
/// and confirm its slot alone carries its payload.
#[test]
fn ten_clients_three_trustees_one_sender() {
    let group = verdict_1024();
    let mut rng = deterministic_rng();

    const CLIENT_COUNT: usize = 10;
    const TRUSTEE_COUNT: usize = 3;

    let request_params = RequestParams::tuned(CLIENT_COUNT, 0.1, 0.01).unwrap();

    let client_keys: Vec<_> = (0..CLIENT_COUNT).map(|_| group.random_keypair(&mut rng)).collect();
    let nym_keys: Vec<_> = (0..CLIENT_COUNT).map(|_| group.random_keypair(&mut rng)).collect();
    let trustee_keys: Vec<_> = (0..TRUSTEE_COUNT).map(|_| group.random_keypair(&mut rng)).collect();

    let client_publics: Vec<_> = client_keys.iter().map(|k| k.public.clone()).collect();
    let trustee_publics: Vec<_> = trustee_keys.iter().map(|k| k.public.clone()).collect();
    let nym_publics: Vec<_> = nym_keys.iter().map(|k| k.public.clone()).collect();

    let mut trustees: Vec<_> = trustee_keys
        .into_iter()
        .map(|key| {
            let mut t = Trustee::new(key, client_publics.clone());
            t.add_nyms(nym_publics.clone());
            t
        })
        .collect();

    let mut clients: Vec<_> = client_keys
        .into_iter()
        .zip(nym_keys)
        .map(|(key, nym)| {
            let mut c = Client::new(key, trustee_publics.clone(), request_params);
            c.add_own_nym(nym);
            c.add_nyms(nym_publics.clone());
            c
        })
        .collect();

    let mut relay = Relay::new(TRUSTEE_COUNT);
    relay.add_nyms(CLIENT_COUNT);

    advance_interval(
        &mut trustees,
        &mut clients,
        &mut relay,
        &group,
        0,
        CLIENT_COUNT,
        request_params,
        &mut rng,
    )
    .unwrap();

    clients[0].send(0, b"hello from zero".to_vec()).unwrap();

    // `produce_interval_ciphertext` yields one keystream cell per call, one
    // per nym slot, each folding in that nym's trap noise with this
    // trustee.
    for (i, trustee) in trustees.iter_mut().enumerate() {
        let cells = (0..CLIENT_COUNT)
            .map(|slot| trustee.produce_interval_ciphertext(slot, &group).unwrap())
            .collect();
        relay.store_trustee_ciphertext(i, cells).unwrap();
    }

    let generator = relay.generator(&group);
    let mut client_cells = Vec::with_capacity(CLIENT_COUNT);
    let mut client_verdicts = Vec::with_capacity(CLIENT_COUNT);
    let mut request_cells = Vec::with_capacity(CLIENT_COUNT);
    for client in &mut clients {
        let (cells, verdicts, request) = client
            .produce_ciphertexts(&generator, Some(relay.granted_mask()), &group)
            .unwrap();
        client_cells.push(cells);
        client_verdicts.push(verdicts);
        request_cells.push(request);
    }

    for cell in &request_cells {
        relay.ingest_request_cell(cell).unwrap();
    }
    let requesters = relay.decode_requests().unwrap();
    assert!(requesters.contains(&0));

    let trustee_verdicts: Vec<_> = trustees
        .iter()
        .map(|t| t.verdict_contribute(&generator, &group).unwrap())
        .collect();

    let cleartexts = relay
        .process_ciphertext(&client_cells, &client_verdicts, &trustee_verdicts, &group)
        .unwrap();
    assert_eq!(cleartexts.len(), CLIENT_COUNT);
    assert_eq!(&decode_payload(&cleartexts[0])[..15], b"hello from zero");
    assert_eq!(&cleartexts[0][ENCODED_SIZE..], vec![0_u8; CELL_LENGTH - ENCODED_SIZE].as_slice());
    for cleartext in &cleartexts[1..] {
        assert_eq!(decode_payload(cleartext), [0_u8; dcnet_cell::inversion::MAX_IN_SIZE]);
        assert!(cleartext[ENCODED_SIZE..].iter().all(|b| *b == 0));
    }

    // Reconstruct each nym's trap-bit codec from every trustee's secret
    // with that nym (as a client derived independently while encoding),
    // and confirm the relay's recovered cleartexts still pass the check —
    // proving the trustees' trap noise and the owning clients' really
    // cancel, not just that the two sides compiled against each other.
    let all_nym_secrets: Vec<Vec<Vec<u8>>> = trustees.iter().map(|t| t.nym_trap_secrets(&group).unwrap()).collect();
    let mut codecs: Vec<_> = (0..CLIENT_COUNT)
        .map(|slot| {
            let secrets: Vec<Vec<u8>> = all_nym_secrets.iter().map(|per_trustee| per_trustee[slot].clone()).collect();
            InversionCodec::new(secrets)
        })
        .collect();
    assert!(trustees[0].check_interval_traps(&mut codecs, &cleartexts));

    for client in &mut clients {
        client.process_cleartext(&cleartexts).unwrap();
    }
}

/// A round where no client sends anything must recover a cleartext whose
/// decoded payload is all-zero in every slot.
#[test]
fn silent_round_recovers_all_zero_slots() {
    let group = verdict_1024();
    let mut rng = deterministic_rng();
    let request_params = RequestParams::tuned(1, 0.1, 0.01).unwrap();

    let client_key = group.random_keypair(&mut rng);
    let nym_key = group.random_keypair(&mut rng);
    let trustee_key = group.random_keypair(&mut rng);

    let mut trustee = Trustee::new(trustee_key.clone(), vec![client_key.public.clone()]);
    trustee.add_nyms(vec![nym_key.public.clone()]);
    let mut trustees = vec![trustee];

    let mut client = Client::new(client_key, vec![trustee_key.public], request_params);
    client.add_own_nym(nym_key.clone());
    client.add_nyms(vec![nym_key.public]);
    let mut clients = vec![client];

    let mut relay = Relay::new(1);
    relay.add_nyms(1);

    advance_interval(&mut trustees, &mut clients, &mut relay, &group, 0, 1, request_params, &mut rng).unwrap();

    let trustee_cell = trustees[0].produce_interval_ciphertext(0, &group).unwrap();
    relay.store_trustee_ciphertext(0, vec![trustee_cell]).unwrap();

    let generator = relay.generator(&group);
    let (client_cells, client_verdicts, _request) = clients[0].produce_ciphertexts(&generator, None, &group).unwrap();
    let trustee_verdicts = vec![trustees[0].verdict_contribute(&generator, &group).unwrap()];

    let cleartexts = relay
        .process_ciphertext(&[client_cells], &[client_verdicts], &trustee_verdicts, &group)
        .unwrap();
    assert_eq!(decode_payload(&cleartexts[0]), [0_u8; dcnet_cell::inversion::MAX_IN_SIZE]);
    assert!(cleartexts[0][ENCODED_SIZE..].iter().all(|b| *b == 0));
}
