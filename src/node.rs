// Copyright 2016 Jeffrey Burdges and David Stainton

//! Sphinx mix node state: key material and replay detection

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use rand_core::{CryptoRng, RngCore};

use super::client::PathHop;
use super::commands::NodeId;
use super::constants::{NODE_ID_SIZE, REPLAY_TAG_SIZE};
use super::ecdh::{PrivateKey, PublicKey};

pub type ReplayTag = [u8; REPLAY_TAG_SIZE];

/// This trait is used to detect mix packet replay attacks. A unique
/// tag for each packet is remembered and if ever seen again implies a
/// replay attack. Note that we can flush our cache upon mix node key
/// rotation, which must happen fairly often.
pub trait ReplayCache {
    /// returns true if we've seen `tag` before, otherwise records
    /// it; the check and the insert are one atomic step
    fn is_replay(&self, tag: &ReplayTag) -> bool;

    /// flush our cache of tags
    fn flush(&self);
}

/// VolatileReplayHashMap is used to detect replay attacks
/// with a volatile cache, a HashSet. No disk persistence is used here.
#[derive(Debug, Default)]
pub struct VolatileReplayHashMap {
    tags: Mutex<HashSet<ReplayTag>>,
}

impl VolatileReplayHashMap {
    /// return a new VolatileReplayHashMap struct
    pub fn new() -> VolatileReplayHashMap {
        VolatileReplayHashMap::default()
    }

    pub fn len(&self) -> usize {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayCache for VolatileReplayHashMap {
    fn is_replay(&self, tag: &ReplayTag) -> bool {
        let mut tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        !tags.insert(*tag)
    }

    fn flush(&self) {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// this struct represents the Sphinx mix node's current
/// key material state and node identification.
#[derive(Clone)]
pub struct MixNodeState {
    /// node identification
    pub id: NodeId,
    /// private key; destroyed on key rotation
    pub private_key: PrivateKey,
}

impl MixNodeState {
    /// generate a node with a random identifier and key pair
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> MixNodeState {
        let mut id = [0u8; NODE_ID_SIZE];
        rng.fill_bytes(&mut id);
        MixNodeState {
            id: NodeId(id),
            private_key: PrivateKey::generate(rng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// the route hop that addresses this node
    pub fn path_hop(&self) -> PathHop {
        PathHop {
            id: self.id,
            public_key: self.public_key(),
        }
    }
}
