// sphinx_test.rs - sphinx mix packet format tests
// Copyright (C) 2018  David Stainton.

extern crate rand;
extern crate sphinxmix;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rand::Rng;
use rand::rngs::OsRng;

use sphinxmix::constants::{DESTINATION_SIZE, MAX_HOPS};
use sphinxmix::directory::{RelayRecord, VolatileDirectory, publish_relay, relays_for_role};
use sphinxmix::node::{MixNodeState, VolatileReplayHashMap};
use sphinxmix::surb::{fetch_reply_block, publish_reply_block};
use sphinxmix::{ClientId, DestinationTag, MixScheme, Outcome, PathHop, ReplyPolicy, Sphinx,
                SphinxBuildError, SphinxParams, SphinxParseError, new_packet, new_packet_from_surb};
use sphinxmix::packet::SphinxPacket;

type Resolver = HashMap<ClientId, String>;
type Node = Sphinx<VolatileReplayHashMap, Resolver>;

const MESSAGE: &str = "We must defend our own privacy if we expect to have any. \
We must come together and create systems which allow anonymous transactions to take place.";

fn new_node<R: Rng + rand::CryptoRng>(rng: &mut R, params: SphinxParams, resolver: Resolver) -> Node {
    let state = MixNodeState::generate(rng);
    Sphinx::new(params, state, VolatileReplayHashMap::new(), resolver, ReplyPolicy::Reusable).unwrap()
}

fn new_path_vector<R: Rng + rand::CryptoRng>(rng: &mut R, params: SphinxParams) -> (Vec<Node>, Vec<PathHop>) {
    let nodes: Vec<Node> = (0..params.hops).map(|_| new_node(rng, params, Resolver::new())).collect();
    let path = nodes.iter().map(|n| n.node().path_hop()).collect();
    (nodes, path)
}

fn destination() -> DestinationTag {
    DestinationTag::request(*b"provider:alice!")
}

/// Push `packet` through `nodes`, checking each forward decision,
/// and return the final hop's outcome.
fn route_packet(nodes: &[Node], path: &[PathHop], mut packet: Vec<u8>) -> Outcome<String> {
    let size = packet.len();
    for (i, node) in nodes.iter().enumerate() {
        let outcome = node.process_inbound(&packet);
        if i == nodes.len() - 1 {
            return outcome;
        }
        match outcome {
            Outcome::Forward { next_hop, packet: next } => {
                assert_eq!(next_hop, path[i + 1].id);
                assert_eq!(next.len(), size);
                packet = next;
            }
            other => panic!("hop {} did not forward: {:?}", i, other),
        }
    }
    unreachable!()
}

#[test]
fn sphinx_forward_test() {
    let mut r = OsRng;
    for hops in 1..=5 {
        let params = SphinxParams::new(hops, 512).unwrap();
        let (nodes, path) = new_path_vector(&mut r, params);
        for &len in [0, 1, MESSAGE.len(), params.max_payload - 1, params.max_payload].iter() {
            let payload: Vec<u8> = MESSAGE.bytes().cycle().take(len).collect();
            let packet = new_packet(&mut r, &params, &path, &destination(), &payload).unwrap();
            assert_eq!(packet.len(), params.packet_size());

            match route_packet(&nodes, &path, packet) {
                Outcome::Request { destination: dest, payload: got } => {
                    assert_eq!(&dest[..], &b"provider:alice!"[..]);
                    assert_eq!(got, payload);
                }
                other => panic!("expected a request, got {:?}", other),
            }
        }
    }
}

#[test]
fn sphinx_max_hops_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(MAX_HOPS, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = new_packet(&mut r, &params, &path, &destination(), b"far away").unwrap();
    match route_packet(&nodes, &path, packet) {
        Outcome::Request { payload, .. } => assert_eq!(payload, b"far away".to_vec()),
        other => panic!("expected a request, got {:?}", other),
    }
}

#[test]
fn sphinx_alpha_unlinkable_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(3, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = new_packet(&mut r, &params, &path, &destination(), b"x").unwrap();

    let first = SphinxPacket::from_bytes(&params, &packet).unwrap();
    let second = match nodes[0].process_inbound(&packet) {
        Outcome::Forward { packet, .. } => SphinxPacket::from_bytes(&params, &packet).unwrap(),
        other => panic!("expected forward, got {:?}", other),
    };
    assert_ne!(first.alpha, second.alpha);
    assert_ne!(first.gamma, second.gamma);
    assert_ne!(first.delta, second.delta);
}

#[test]
fn sphinx_tamper_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(3, 256).unwrap();
    let beta_start = 32;
    let gamma_start = beta_start + params.beta_size();
    let delta_start = params.header_size();

    let positions = [beta_start, beta_start + 17, gamma_start - 1, gamma_start, gamma_start + 15];
    for &pos in positions.iter() {
        let (nodes, path) = new_path_vector(&mut r, params);
        let mut packet = new_packet(&mut r, &params, &path, &destination(), MESSAGE.as_bytes()).unwrap();
        packet[pos] ^= 1 << r.gen_range(0..8);
        assert_eq!(nodes[0].process_inbound(&packet), Outcome::Dropped);
    }

    // A modified payload is only noticed by the final hop.
    let (nodes, path) = new_path_vector(&mut r, params);
    let mut packet = new_packet(&mut r, &params, &path, &destination(), MESSAGE.as_bytes()).unwrap();
    packet[delta_start + 40] ^= 0x04;
    assert_eq!(route_packet(&nodes, &path, packet), Outcome::Dropped);
}

#[test]
fn sphinx_tamper_middle_hop_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(4, 128).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = new_packet(&mut r, &params, &path, &destination(), b"hello").unwrap();
    let mut next = match nodes[0].process_inbound(&packet) {
        Outcome::Forward { packet, .. } => packet,
        other => panic!("expected forward, got {:?}", other),
    };
    next[40] ^= 0x80;
    assert_eq!(nodes[1].process_inbound(&next), Outcome::Dropped);
}

#[test]
fn sphinx_replay_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(2, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = new_packet(&mut r, &params, &path, &destination(), b"once").unwrap();

    assert!(!nodes[0].process_inbound(&packet).is_dropped());
    assert_eq!(nodes[0].process_inbound(&packet), Outcome::Dropped);

    // After key rotation flushes the cache the tag is fresh again.
    sphinxmix::node::ReplayCache::flush(nodes[0].replay_cache());
    assert!(!nodes[0].process_inbound(&packet).is_dropped());
}

#[test]
fn sphinx_concurrent_replay_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(2, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = Arc::new(new_packet(&mut r, &params, &path, &destination(), b"race").unwrap());
    let node = Arc::new(nodes.into_iter().next().unwrap());

    let handles: Vec<_> = (0..8).map(|_| {
        let node = Arc::clone(&node);
        let packet = Arc::clone(&packet);
        thread::spawn(move || node.process_inbound(&packet))
    }).collect();
    let forwarded = handles.into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| !o.is_dropped())
        .count();
    assert_eq!(forwarded, 1);
}

#[test]
fn sphinx_surb_test() {
    let mut r = OsRng;
    for hops in 1..=4 {
        let params = SphinxParams::new(hops, 256).unwrap();
        let alice = new_node(&mut r, params, Resolver::new());
        let alice_id = alice.replies().client_id();

        let mut resolver = Resolver::new();
        resolver.insert(alice_id, "alice.example:1984".to_string());
        let nodes: Vec<Node> = (0..hops).map(|_| new_node(&mut r, params, resolver.clone())).collect();
        let path: Vec<PathHop> = nodes.iter().map(|n| n.node().path_hop()).collect();

        // Alice publishes a nym; Bob fetches it and replies.
        let directory = VolatileDirectory::new();
        let nym = alice.create_reply_block(&mut r, &path).unwrap();
        publish_reply_block(&directory, b"nym/alice", &nym);
        let fetched = fetch_reply_block(&directory, &params, b"nym/alice").unwrap().unwrap();
        let (first_hop, packet) = new_packet_from_surb(&params, &fetched, MESSAGE.as_bytes()).unwrap();
        assert_eq!(first_hop, path[0].id);
        assert_eq!(packet.len(), params.packet_size());

        match route_packet(&nodes, &path, packet) {
            Outcome::Reply { destination, message } => {
                assert_eq!(destination, "alice.example:1984");
                assert_eq!(message.len(), params.reply_size());
                assert_eq!(alice.decrypt_reply(&message), Some(MESSAGE.as_bytes().to_vec()));

                let mut corrupt = message.clone();
                corrupt[params.reply_size() - 1] ^= 1;
                assert_eq!(alice.decrypt_reply(&corrupt), None);

                // Someone else's client state cannot open it.
                let eve = new_node(&mut r, params, Resolver::new());
                assert_eq!(eve.decrypt_reply(&message), None);
            }
            other => panic!("expected a reply, got {:?}", other),
        }
    }
}

#[test]
fn sphinx_surb_single_use_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(2, 64).unwrap();
    let state = MixNodeState::generate(&mut r);
    let alice = Sphinx::new(params, state, VolatileReplayHashMap::new(), Resolver::new(),
                            ReplyPolicy::SingleUse).unwrap();
    let mut resolver = Resolver::new();
    resolver.insert(alice.replies().client_id(), "alice".to_string());
    let nodes: Vec<Node> = (0..2).map(|_| new_node(&mut r, params, resolver.clone())).collect();
    let path: Vec<PathHop> = nodes.iter().map(|n| n.node().path_hop()).collect();

    let nym = alice.create_reply_block(&mut r, &path).unwrap();
    let (_, packet) = new_packet_from_surb(&params, &nym, b"only once").unwrap();
    let message = match route_packet(&nodes, &path, packet) {
        Outcome::Reply { message, .. } => message,
        other => panic!("expected a reply, got {:?}", other),
    };
    assert_eq!(alice.replies().pending(), 1);
    assert_eq!(alice.decrypt_reply(&message), Some(b"only once".to_vec()));
    assert_eq!(alice.replies().pending(), 0);
    assert_eq!(alice.decrypt_reply(&message), None);
}

#[test]
fn sphinx_surb_unknown_client_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(2, 64).unwrap();
    let alice = new_node(&mut r, params, Resolver::new());
    let (nodes, path) = new_path_vector(&mut r, params);

    let nym = alice.create_reply_block(&mut r, &path).unwrap();
    let (_, packet) = new_packet_from_surb(&params, &nym, b"lost").unwrap();
    assert_eq!(route_packet(&nodes, &path, packet), Outcome::Dropped);
}

#[test]
fn sphinx_directory_route_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(3, 64).unwrap();
    let (nodes, _) = new_path_vector(&mut r, params);
    let directory = VolatileDirectory::new();
    for node in nodes.iter() {
        let record = RelayRecord { id: node.node().id, public_key: node.node().public_key() };
        publish_relay(&directory, b"mix/", &record);
    }

    // Route selection is up to the caller; here it follows the node order.
    let records = relays_for_role(&directory, b"mix/");
    assert_eq!(records.len(), 3);
    let path: Vec<PathHop> = nodes.iter()
        .map(|n| records.iter().find(|rec| rec.id == n.node().id).unwrap())
        .map(|rec| PathHop::from(*rec))
        .collect();
    let packet = new_packet(&mut r, &params, &path, &destination(), b"via directory").unwrap();
    match route_packet(&nodes, &path, packet) {
        Outcome::Request { payload, .. } => assert_eq!(payload, b"via directory".to_vec()),
        other => panic!("expected a request, got {:?}", other),
    }
}

#[test]
fn sphinx_construction_errors_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(3, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);

    assert_eq!(new_packet(&mut r, &params, &path[..2], &destination(), b"x"),
               Err(SphinxBuildError::RouteLength { expected: 3, got: 2 }));
    assert_eq!(new_packet(&mut r, &params, &path, &destination(), &[0u8; 65]),
               Err(SphinxBuildError::PayloadTooLarge { max: 64, got: 65 }));
    assert_eq!(nodes[0].create_reply_block(&mut r, &path[..1]).err(),
               Some(SphinxBuildError::RouteLength { expected: 3, got: 1 }));

    let client = DestinationTag::client(&ClientId([1u8; DESTINATION_SIZE]));
    assert_eq!(new_packet(&mut r, &params, &path, &client, b"x"), Err(SphinxBuildError::MissingSurbId));

    let size = params.packet_size();
    assert_eq!(SphinxPacket::from_bytes(&params, &vec![0u8; size + 3]),
               Err(SphinxParseError::InvalidLength { expected: size, got: size + 3 }));
    assert_eq!(nodes[0].process_inbound(&vec![0u8; size - 1]), Outcome::Dropped);
}

fn deliver_via<S: MixScheme>(relays: &[S], packet: Vec<u8>) -> Outcome<S::Address> {
    let mut packet = packet;
    for relay in relays.iter() {
        match relay.process_inbound(&packet) {
            Outcome::Forward { packet: next, .. } => packet = next,
            other => return other,
        }
    }
    Outcome::Dropped
}

#[test]
fn sphinx_scheme_trait_test() {
    let mut r = OsRng;
    let params = SphinxParams::new(3, 64).unwrap();
    let (nodes, path) = new_path_vector(&mut r, params);
    let packet = nodes[0].build_request(&mut r, &path, &destination(), b"generic").unwrap();
    match deliver_via(&nodes, packet) {
        Outcome::Request { payload, .. } => assert_eq!(payload, b"generic".to_vec()),
        other => panic!("expected a request, got {:?}", other),
    }
}
