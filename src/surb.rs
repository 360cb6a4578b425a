// surb.rs - sphinx single use reply blocks
// Copyright (C) 2018  David Stainton.

//! Single Use Reply Blocks.
//!
//! A client builds a header addressed back to itself and publishes
//! it, along with the key `ktilde` a replier uses to encrypt the
//! payload, as a `Nym`. The per hop payload keys stay with the
//! client, indexed by the SURB id, so that only the client can
//! remove the layers added by the relays on the way back.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroize;

use super::client::{PathHop, SphinxHeader, create_header};
use super::commands::{ClientId, DestinationTag, NodeId, SurbId};
use super::constants::{GROUP_ELEMENT_SIZE, KEY_SIZE, MAC_SIZE, NODE_ID_SIZE, SURB_ID_SIZE};
use super::directory::Directory;
use super::error::{SphinxBuildError, SphinxParseError};
use super::lioness::{pi, pii};
use super::packet::SphinxPacket;
use super::params::SphinxParams;
use super::payload::{pad, unpad};

/// Nym is the public half of a reply block: everything a replier
/// needs to send a packet back to its creator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nym {
    /// the first hop of the reply route
    pub first_hop: NodeId,
    /// header addressed to the creator
    pub header: SphinxHeader,
    /// the key the replier encrypts the payload with
    pub key: [u8; KEY_SIZE],
}

impl Nym {
    /// encode as first_hop || alpha || beta || gamma || key
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NODE_ID_SIZE + GROUP_ELEMENT_SIZE + self.header.beta.len() + MAC_SIZE + KEY_SIZE);
        out.extend_from_slice(&self.first_hop.0);
        out.extend_from_slice(&self.header.alpha);
        out.extend_from_slice(&self.header.beta);
        out.extend_from_slice(&self.header.gamma);
        out.extend_from_slice(&self.key);
        out
    }

    pub fn from_bytes(params: &SphinxParams, b: &[u8]) -> Result<Nym, SphinxParseError> {
        if b.len() != params.nym_size() {
            return Err(SphinxParseError::InvalidLength { expected: params.nym_size(), got: b.len() });
        }
        let (first_hop, rest) = b.split_at(NODE_ID_SIZE);
        let (alpha, rest) = rest.split_at(GROUP_ELEMENT_SIZE);
        let (beta, rest) = rest.split_at(params.beta_size());
        let (gamma, key) = rest.split_at(MAC_SIZE);
        Ok(Nym {
            first_hop: NodeId(*array_ref![first_hop, 0, NODE_ID_SIZE]),
            header: SphinxHeader {
                alpha: *array_ref![alpha, 0, GROUP_ELEMENT_SIZE],
                beta: beta.to_vec(),
                gamma: *array_ref![gamma, 0, MAC_SIZE],
            },
            key: *array_ref![key, 0, KEY_SIZE],
        })
    }
}

/// What the creator of a reply block keeps to decrypt the reply.
struct ReplyData {
    key: [u8; KEY_SIZE],
    hop_keys: Vec<[u8; KEY_SIZE]>,
}

impl Drop for ReplyData {
    fn drop(&mut self) {
        self.key.zeroize();
        for k in self.hop_keys.iter_mut() {
            k.zeroize();
        }
    }
}

/// Whether a reply block survives being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyPolicy {
    /// keep the reply data after a successful decryption
    Reusable,
    /// forget the reply data once a reply decrypts; concurrent
    /// decryptions of the same SURB id are serialized
    SingleUse,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        ReplyPolicy::Reusable
    }
}

/// ReplyBlockManager creates reply blocks for one client and
/// decrypts the replies sent through them.
pub struct ReplyBlockManager {
    params: SphinxParams,
    client_id: ClientId,
    policy: ReplyPolicy,
    replies: RwLock<HashMap<SurbId, ReplyData>>,
}

impl ReplyBlockManager {
    pub fn new(params: SphinxParams, client_id: ClientId, policy: ReplyPolicy) -> ReplyBlockManager {
        ReplyBlockManager {
            params,
            client_id,
            policy,
            replies: RwLock::new(HashMap::new()),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// the number of reply blocks awaiting a reply
    pub fn pending(&self) -> usize {
        self.replies.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Create a reply block routed through `path` back to this client.
    pub fn create_reply_block<R: RngCore + CryptoRng>(&self, rng: &mut R, path: &[PathHop]) -> Result<Nym, SphinxBuildError> {
        let mut surb_id = [0u8; SURB_ID_SIZE];
        rng.fill_bytes(&mut surb_id);
        let mut key = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut key);

        let destination = DestinationTag::client(&self.client_id);
        let (header, secrets) = create_header(rng, &self.params, path, &destination, Some(&surb_id))?;
        let data = ReplyData {
            key,
            hop_keys: secrets.iter().map(|s| s.payload_key()).collect(),
        };
        self.replies.write().unwrap_or_else(PoisonError::into_inner).insert(surb_id, data);
        trace!(hops = path.len(), "created reply block");

        Ok(Nym {
            first_hop: path[0].id,
            header,
            key,
        })
    }

    /// Decrypt a reply delivered to this client: the SURB id
    /// followed by the payload. Returns None if the SURB id is
    /// unknown or the payload fails to authenticate.
    pub fn decrypt_reply(&self, message: &[u8]) -> Option<Vec<u8>> {
        if message.len() != self.params.reply_size() {
            debug!(len = message.len(), "discarding reply of the wrong size");
            return None;
        }
        let (surb_id, delta) = message.split_at(SURB_ID_SIZE);
        let surb_id = array_ref![surb_id, 0, SURB_ID_SIZE];

        match self.policy {
            ReplyPolicy::Reusable => {
                let replies = self.replies.read().unwrap_or_else(PoisonError::into_inner);
                let data = replies.get(surb_id)?;
                decrypt_with(data, delta)
            }
            ReplyPolicy::SingleUse => {
                let mut replies = self.replies.write().unwrap_or_else(PoisonError::into_inner);
                let payload = decrypt_with(replies.get(surb_id)?, delta)?;
                replies.remove(surb_id);
                Some(payload)
            }
        }
    }

    /// Forget the reply data for `surb_id`, returning true if it existed.
    pub fn forget(&self, surb_id: &SurbId) -> bool {
        self.replies.write().unwrap_or_else(PoisonError::into_inner).remove(surb_id).is_some()
    }
}

fn decrypt_with(data: &ReplyData, delta: &[u8]) -> Option<Vec<u8>> {
    let mut block = delta.to_vec();
    for hop_key in data.hop_keys.iter().rev() {
        pi(hop_key, &mut block).ok()?;
    }
    pii(&data.key, &mut block).ok()?;
    let payload = unpad(&block);
    if payload.is_none() {
        debug!("discarding reply with an invalid payload tag");
    }
    payload
}

/// Create a reply packet from a nym.
///
/// # Returns
///
/// * the first hop to send the packet to, and the wire encoded packet
///
pub fn new_packet_from_surb(params: &SphinxParams, nym: &Nym, payload: &[u8]) -> Result<(NodeId, Vec<u8>), SphinxBuildError> {
    let mut delta = pad(params, payload)?;
    pi(&nym.key, &mut delta)?;
    let packet = SphinxPacket {
        alpha: nym.header.alpha,
        beta: nym.header.beta.clone(),
        gamma: nym.header.gamma,
        delta,
    };
    Ok((nym.first_hop, packet.to_bytes()))
}

/// post `nym` to the directory under `pseudonym`
pub fn publish_reply_block<D: Directory + ?Sized>(directory: &D, pseudonym: &[u8], nym: &Nym) {
    directory.post(pseudonym, nym.to_vec());
}

/// look up the nym posted under `pseudonym`
pub fn fetch_reply_block<D: Directory + ?Sized>(directory: &D, params: &SphinxParams, pseudonym: &[u8]) -> Result<Option<Nym>, SphinxParseError> {
    match directory.get(pseudonym) {
        Some(raw) => Nym::from_bytes(params, &raw).map(Some),
        None => Ok(None),
    }
}
