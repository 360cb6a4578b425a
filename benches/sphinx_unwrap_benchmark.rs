// sphinx_unwrap_benchmark.rs - sphinx cryptographic packet format benchmarks
// Copyright (C) 2018  David Anthony Stainton.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

#[macro_use]
extern crate criterion;
extern crate rand;
extern crate sphinxmix;

use std::collections::HashMap;

use criterion::Criterion;
use rand::rngs::OsRng;

use sphinxmix::node::{MixNodeState, ReplayCache, ReplayTag};
use sphinxmix::{ClientId, DestinationTag, PathHop, SphinxParams, new_packet, sphinx_packet_unwrap};

/// Never reports a replay, so the same packet can be unwrapped repeatedly.
struct NoReplayCache;

impl ReplayCache for NoReplayCache {
    fn is_replay(&self, _tag: &ReplayTag) -> bool {
        false
    }

    fn flush(&self) {}
}

fn new_path_vector(r: &mut OsRng, params: &SphinxParams) -> (Vec<MixNodeState>, Vec<PathHop>) {
    let nodes: Vec<MixNodeState> = (0..params.hops).map(|_| MixNodeState::generate(r)).collect();
    let path = nodes.iter().map(|n| n.path_hop()).collect();
    (nodes, path)
}

fn payload(params: &SphinxParams) -> Vec<u8> {
    let s = "We must defend our own privacy if we expect to have any. \
             We must come together and create systems which allow anonymous transactions to take place. \
             People have been defending their own privacy for centuries with whispers, darkness, envelopes, \
             closed doors, secret handshakes, and couriers. The technologies of the past did not allow for strong \
             privacy, but electronic technologies do.";
    s.bytes().cycle().take(params.max_payload).collect()
}

fn criterion_sphinx_unwrap_benchmark(c: &mut Criterion) {
    let mut r = OsRng;
    let params = SphinxParams::default();
    let (nodes, path) = new_path_vector(&mut r, &params);
    let destination = DestinationTag::request(*b"provider:alice!");
    let packet = new_packet(&mut r, &params, &path, &destination, &payload(&params)).unwrap();
    let resolver: HashMap<ClientId, ()> = HashMap::new();

    c.bench_function("sphinx unwrap", move |b| b.iter(|| {
        sphinx_packet_unwrap(&params, &nodes[0], &NoReplayCache, &resolver, &packet)
    }));
}

fn criterion_sphinx_new_packet_benchmark(c: &mut Criterion) {
    let mut r = OsRng;
    let params = SphinxParams::default();
    let (_, path) = new_path_vector(&mut r, &params);
    let destination = DestinationTag::request(*b"provider:alice!");
    let payload = payload(&params);

    c.bench_function("sphinx new packet", move |b| b.iter(|| {
        new_packet(&mut r, &params, &path, &destination, &payload).unwrap()
    }));
}

criterion_group!(benches, criterion_sphinx_unwrap_benchmark, criterion_sphinx_new_packet_benchmark);
criterion_main!(benches);
