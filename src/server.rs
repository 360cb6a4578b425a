// server.rs - Sphinx server side function(s)
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

//! The server side of Sphinx, packet processing.
//!
//! Mix nodes process every incoming packet by deriving the hop's
//! shared secret, checking the replay tag, authenticating the header
//! and then peeling one layer of routing information and payload
//! encryption. The routing command found under that layer decides
//! whether the packet is forwarded, delivered as a request, or
//! delivered to a client as a reply.
//!
//! Every failure results in the packet being dropped with no
//! additional processing. The reason is logged locally and is never
//! reported to the network, so corrupt, replayed and hostile packets
//! look the same from the outside.

use std::fmt;

use subtle::ConstantTimeEq;
use tracing::debug;

use super::commands::{NodeId, RoutingCommand, parse_routing_command};
use super::constants::{DESTINATION_SIZE, PER_HOP_ROUTING_INFO_SIZE};
use super::directory::AddressResolver;
use super::ecdh::{PublicKey, is_degenerate};
use super::internal_crypto::{hash_blinding, hash_mac_key, hash_payload_key, hash_replay,
                             hash_stream_key, hmac, StreamCipher};
use super::lioness::pii;
use super::node::{MixNodeState, ReplayCache};
use super::packet::SphinxPacket;
use super::params::SphinxParams;
use super::payload::unpad;

/// Outcome is the result of a mix node unwrapping a Sphinx packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<A> {
    /// send `packet` on to the node `next_hop`
    Forward { next_hop: NodeId, packet: Vec<u8> },
    /// this node is the final hop of a request
    Request { destination: [u8; DESTINATION_SIZE], payload: Vec<u8> },
    /// hand `message` (SURB id then encrypted payload) to a client
    Reply { destination: A, message: Vec<u8> },
    /// the packet was discarded
    Dropped,
}

impl<A> Outcome<A> {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Outcome::Dropped)
    }
}

/// Why a packet was dropped. Only ever logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reject {
    Malformed,
    InvalidGroupElement,
    Replay,
    MacMismatch,
    UnknownCommand,
    PayloadError,
    UnknownClient,
}

impl fmt::Display for Reject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Reject::*;
        match *self {
            Malformed => write!(f, "packet has the wrong length"),
            InvalidGroupElement => write!(f, "alpha is not a valid group element"),
            Replay => write!(f, "replay tag seen before"),
            MacMismatch => write!(f, "message authentication code did not match"),
            UnknownCommand => write!(f, "unknown routing command prefix"),
            PayloadError => write!(f, "payload failed validation check"),
            UnknownClient => write!(f, "reply client could not be resolved"),
        }
    }
}

/// unwrap a layer of sphinx packet encryption
///
/// # Arguments
///
/// * `params` - the deployment parameters
/// * `state` - this node's identity and private key
/// * `replay_cache` - replay tags seen by this node
/// * `resolver` - maps reply clients to their addresses
/// * `packet` - the wire encoded packet
///
/// # Returns
///
/// * the `Outcome` for this packet; `Outcome::Dropped` on any error
///
pub fn sphinx_packet_unwrap<C, R>(params: &SphinxParams, state: &MixNodeState, replay_cache: &C,
                                  resolver: &R, packet: &[u8]) -> Outcome<R::Address>
    where C: ReplayCache + ?Sized,
          R: AddressResolver + ?Sized
{
    match unwrap(params, state, replay_cache, resolver, packet) {
        Ok(outcome) => outcome,
        Err(reason) => {
            debug!(node = ?state.id, %reason, "dropping sphinx packet");
            Outcome::Dropped
        }
    }
}

fn unwrap<C, R>(params: &SphinxParams, state: &MixNodeState, replay_cache: &C,
                resolver: &R, raw: &[u8]) -> Result<Outcome<R::Address>, Reject>
    where C: ReplayCache + ?Sized,
          R: AddressResolver + ?Sized
{
    let packet = SphinxPacket::from_bytes(params, raw).map_err(|_| Reject::Malformed)?;

    // Calculate the hop's shared secret.
    let mut group_element = PublicKey::from(packet.alpha);
    let shared_secret = state.private_key.exp(&group_element);
    if is_degenerate(&shared_secret) {
        return Err(Reject::InvalidGroupElement);
    }

    // Check and record the replay tag.
    if replay_cache.is_replay(&hash_replay(&shared_secret)) {
        return Err(Reject::Replay);
    }

    // Validate the Sphinx Packet Header, comparing the MAC in constant time.
    let mac = hmac(&hash_mac_key(&shared_secret), &packet.beta);
    if mac[..].ct_eq(&packet.gamma[..]).unwrap_u8() == 0 {
        return Err(Reject::MacMismatch);
    }

    // Append padding to preserve length invariance, decrypt the (padded)
    // routing_info block, and extract the section for the current hop.
    let mut b = packet.beta;
    b.resize(params.stream_size(), 0);
    StreamCipher::new(&hash_stream_key(&shared_secret)).xor_key_stream(&mut b);
    let cmd = parse_routing_command(array_ref![b, 0, PER_HOP_ROUTING_INFO_SIZE]);

    // Decrypt the Sphinx Packet Payload before acting on the command, so
    // an unknown prefix costs as much as a valid one.
    let mut delta = packet.delta;
    pii(&hash_payload_key(&shared_secret), &mut delta).map_err(|_| Reject::PayloadError)?;
    let cmd = cmd.ok_or(Reject::UnknownCommand)?;

    match cmd {
        RoutingCommand::NextHop { id, mac } => {
            let blinding_factor = hash_blinding(group_element.as_array(), &shared_secret);
            group_element.blind(&blinding_factor);
            let next = SphinxPacket {
                alpha: *group_element.as_array(),
                beta: b.split_off(PER_HOP_ROUTING_INFO_SIZE),
                gamma: mac,
                delta,
            };
            Ok(Outcome::Forward { next_hop: id, packet: next.to_bytes() })
        }
        RoutingCommand::Deliver { destination } => {
            let payload = unpad(&delta).ok_or(Reject::PayloadError)?;
            Ok(Outcome::Request { destination, payload })
        }
        RoutingCommand::ClientReply { client_id, surb_id } => {
            let destination = resolver.destination_for(&client_id).ok_or(Reject::UnknownClient)?;
            let mut message = Vec::with_capacity(params.reply_size());
            message.extend_from_slice(&surb_id);
            message.extend_from_slice(&delta);
            Ok(Outcome::Reply { destination, message })
        }
    }
}
