// directory.rs - interfaces to the mix network directory
// Copyright (C) 2018  David Stainton.

//! The directory service publishes relay keys and reply blocks. It
//! lives outside this crate; only its key/value contract is used
//! here. `VolatileDirectory` is an in memory implementation suitable
//! for tests and single process deployments.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::client::PathHop;
use super::commands::{ClientId, NodeId};
use super::constants::NODE_ID_SIZE;
use super::ecdh::{CURVE25519_SIZE, PublicKey};
use super::error::SphinxParseError;

/// mix network directory, a key/value store shared by relays and clients
pub trait Directory {
    /// fetch the value stored under `key`
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// store `value` under `key`, replacing any previous value
    fn post(&self, key: &[u8], value: Vec<u8>);

    /// every value whose key begins with `role`
    fn get_all_for_role(&self, role: &[u8]) -> Vec<Vec<u8>>;
}

/// AddressResolver maps the client named in a reply block to
/// wherever that client can currently be reached.
pub trait AddressResolver {
    type Address;

    fn destination_for(&self, client_id: &ClientId) -> Option<Self::Address>;
}

impl<A: Clone> AddressResolver for HashMap<ClientId, A> {
    type Address = A;

    fn destination_for(&self, client_id: &ClientId) -> Option<A> {
        self.get(client_id).cloned()
    }
}

/// RelayRecord is the directory entry describing one mix node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayRecord {
    pub id: NodeId,
    pub public_key: PublicKey,
}

pub const RELAY_RECORD_SIZE: usize = NODE_ID_SIZE + CURVE25519_SIZE;

impl RelayRecord {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RELAY_RECORD_SIZE);
        out.extend_from_slice(&self.id.0);
        out.extend_from_slice(self.public_key.as_array());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<RelayRecord, SphinxParseError> {
        if b.len() != RELAY_RECORD_SIZE {
            return Err(SphinxParseError::InvalidLength { expected: RELAY_RECORD_SIZE, got: b.len() });
        }
        let (id, key) = b.split_at(NODE_ID_SIZE);
        Ok(RelayRecord {
            id: NodeId(*array_ref![id, 0, NODE_ID_SIZE]),
            public_key: PublicKey::from_bytes(key)?,
        })
    }

    /// the directory key for this relay under `role`
    pub fn key(&self, role: &[u8]) -> Vec<u8> {
        let mut key = role.to_vec();
        key.extend_from_slice(&self.id.0);
        key
    }
}

impl From<RelayRecord> for PathHop {
    fn from(record: RelayRecord) -> PathHop {
        PathHop {
            id: record.id,
            public_key: record.public_key,
        }
    }
}

/// announce a relay under `role`
pub fn publish_relay<D: Directory + ?Sized>(directory: &D, role: &[u8], record: &RelayRecord) {
    directory.post(&record.key(role), record.to_vec());
}

/// enumerate the relays published under `role`, skipping any
/// malformed records
pub fn relays_for_role<D: Directory + ?Sized>(directory: &D, role: &[u8]) -> Vec<RelayRecord> {
    directory.get_all_for_role(role).iter().filter_map(|raw| {
        match RelayRecord::from_bytes(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(%err, "skipping malformed relay record");
                None
            }
        }
    }).collect()
}

/// VolatileDirectory keeps the directory in memory.
#[derive(Debug, Default)]
pub struct VolatileDirectory {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl VolatileDirectory {
    pub fn new() -> VolatileDirectory {
        VolatileDirectory::default()
    }
}

impl Directory for VolatileDirectory {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn post(&self, key: &[u8], value: Vec<u8>) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_vec(), value);
    }

    fn get_all_for_role(&self, role: &[u8]) -> Vec<Vec<u8>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.range(role.to_vec()..)
            .take_while(|(key, _)| key.starts_with(role))
            .map(|(_, value)| value.clone())
            .collect()
    }
}
