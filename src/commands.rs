// commands.rs - sphinx per hop routing commands
// Copyright (C) 2018  David Stainton.

//! The first `PER_HOP_ROUTING_INFO_SIZE` bytes of a decrypted Beta
//! carry the routing command for the current hop. The leading byte
//! is a prefix from a closed enumeration:
//!
//! * `MIX` - forward to the node named by the rest of the tag
//! * `SPECIAL_DEST` - final hop of a request, deliver locally
//! * `CLIENT` - final hop of a reply, deliver to a client
//!
//! Any other prefix is invalid.

use super::constants::{CLIENT_ID_SIZE, DESTINATION_SIZE, MAC_SIZE, NODE_ID_SIZE,
                       PER_HOP_ROUTING_INFO_SIZE, ROUTING_TAG_SIZE, SURB_ID_SIZE};
use super::error::SphinxBuildError;

/// Routing tag prefixes.
pub const MIX: u8 = 0x0;
pub const SPECIAL_DEST: u8 = 0x1;
pub const CLIENT: u8 = 0x2;

pub type SurbId = [u8; SURB_ID_SIZE];

/// The identifier of a mix node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub [u8; NODE_ID_SIZE]);

/// The identifier of a client that can receive replies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub [u8; CLIENT_ID_SIZE]);

impl NodeId {
    pub fn from_bytes(b: &[u8]) -> Option<NodeId> {
        if b.len() != NODE_ID_SIZE {
            return None;
        }
        let mut id = [0u8; NODE_ID_SIZE];
        id.copy_from_slice(b);
        Some(NodeId(id))
    }
}

/// DestinationTag names the final hop's action: a prefix byte
/// followed by an opaque identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestinationTag {
    raw: [u8; ROUTING_TAG_SIZE],
}

impl DestinationTag {
    /// a request destination, delivered by the final relay
    pub fn request(destination: [u8; DESTINATION_SIZE]) -> DestinationTag {
        let mut raw = [0u8; ROUTING_TAG_SIZE];
        raw[0] = SPECIAL_DEST;
        raw[1..].copy_from_slice(&destination);
        DestinationTag { raw }
    }

    /// a client destination, used by reply blocks
    pub fn client(client_id: &ClientId) -> DestinationTag {
        let mut raw = [0u8; ROUTING_TAG_SIZE];
        raw[0] = CLIENT;
        raw[1..].copy_from_slice(&client_id.0);
        DestinationTag { raw }
    }

    /// parse a tag, which must be exactly ROUTING_TAG_SIZE bytes
    /// and carry either the SPECIAL_DEST or the CLIENT prefix
    pub fn from_bytes(b: &[u8]) -> Result<DestinationTag, SphinxBuildError> {
        let err = SphinxBuildError::InvalidDestination { expected: ROUTING_TAG_SIZE };
        if b.len() != ROUTING_TAG_SIZE {
            return Err(err);
        }
        match b[0] {
            SPECIAL_DEST | CLIENT => {
                let mut raw = [0u8; ROUTING_TAG_SIZE];
                raw.copy_from_slice(b);
                Ok(DestinationTag { raw })
            }
            _ => Err(err),
        }
    }

    pub fn prefix(&self) -> u8 {
        self.raw[0]
    }

    pub fn as_bytes(&self) -> &[u8; ROUTING_TAG_SIZE] {
        &self.raw
    }

    fn id(&self) -> [u8; ROUTING_TAG_SIZE - 1] {
        *array_ref![self.raw, 1, ROUTING_TAG_SIZE - 1]
    }
}

/// RoutingCommand is a decoded per hop routing command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingCommand {
    /// forward to `id`, whose header MAC is `mac`
    NextHop { id: NodeId, mac: [u8; MAC_SIZE] },
    /// final hop of a request
    Deliver { destination: [u8; DESTINATION_SIZE] },
    /// final hop of a reply
    ClientReply { client_id: ClientId, surb_id: SurbId },
}

impl RoutingCommand {
    /// the final hop command addressed to `destination`
    pub fn for_destination(destination: &DestinationTag, surb_id: Option<&SurbId>) -> Result<RoutingCommand, SphinxBuildError> {
        match destination.prefix() {
            SPECIAL_DEST => Ok(RoutingCommand::Deliver { destination: destination.id() }),
            CLIENT => {
                let surb_id = surb_id.ok_or(SphinxBuildError::MissingSurbId)?;
                Ok(RoutingCommand::ClientReply {
                    client_id: ClientId(destination.id()),
                    surb_id: *surb_id,
                })
            }
            _ => Err(SphinxBuildError::InvalidDestination { expected: ROUTING_TAG_SIZE }),
        }
    }

    /// serialize; the result is at most PER_HOP_ROUTING_INFO_SIZE bytes
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PER_HOP_ROUTING_INFO_SIZE);
        match self {
            RoutingCommand::NextHop { id, mac } => {
                out.push(MIX);
                out.extend_from_slice(&id.0);
                out.extend_from_slice(mac);
            }
            RoutingCommand::Deliver { destination } => {
                out.push(SPECIAL_DEST);
                out.extend_from_slice(destination);
            }
            RoutingCommand::ClientReply { client_id, surb_id } => {
                out.push(CLIENT);
                out.extend_from_slice(&client_id.0);
                out.extend_from_slice(surb_id);
            }
        }
        out
    }
}

/// parse the routing command at the start of a decrypted routing
/// info block, returning None for an unknown prefix
pub fn parse_routing_command(b: &[u8; PER_HOP_ROUTING_INFO_SIZE]) -> Option<RoutingCommand> {
    let (tag, rest) = array_refs![b, ROUTING_TAG_SIZE, PER_HOP_ROUTING_INFO_SIZE - ROUTING_TAG_SIZE];
    let id = *array_ref![tag, 1, ROUTING_TAG_SIZE - 1];
    match tag[0] {
        MIX => Some(RoutingCommand::NextHop { id: NodeId(id), mac: *array_ref![rest, 0, MAC_SIZE] }),
        SPECIAL_DEST => Some(RoutingCommand::Deliver { destination: id }),
        CLIENT => Some(RoutingCommand::ClientReply {
            client_id: ClientId(id),
            surb_id: *array_ref![rest, 0, SURB_ID_SIZE],
        }),
        _ => None,
    }
}
