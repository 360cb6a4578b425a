// scheme.rs - the mix packet scheme interface
// Copyright (C) 2018  David Stainton.

//! `MixScheme` is the narrow interface callers program against, so
//! an alternative header scheme can replace Sphinx without touching
//! the transport or the scheduling layer around it.

use rand_core::{CryptoRng, RngCore};

use super::client::{PathHop, new_packet};
use super::commands::{ClientId, DestinationTag};
use super::directory::AddressResolver;
use super::error::{SphinxBuildError, SphinxParamsError};
use super::node::{MixNodeState, ReplayCache};
use super::params::SphinxParams;
use super::server::{Outcome, sphinx_packet_unwrap};
use super::surb::{Nym, ReplyBlockManager, ReplyPolicy};

pub trait MixScheme {
    type Address;

    /// build a request packet through `route` to `destination`
    fn build_request<R: RngCore + CryptoRng>(&self, rng: &mut R, route: &[PathHop],
                                             destination: &DestinationTag, payload: &[u8])
                                             -> Result<Vec<u8>, SphinxBuildError>;

    /// recode one inbound packet
    fn process_inbound(&self, packet: &[u8]) -> Outcome<Self::Address>;

    /// create a reply block through `route` back to ourselves
    fn create_reply_block<R: RngCore + CryptoRng>(&self, rng: &mut R, route: &[PathHop]) -> Result<Nym, SphinxBuildError>;

    /// decrypt a reply delivered to us
    fn decrypt_reply(&self, message: &[u8]) -> Option<Vec<u8>>;
}

/// Sphinx bundles a node's key material with its replay cache,
/// address resolver and reply blocks.
pub struct Sphinx<C, A> {
    params: SphinxParams,
    node: MixNodeState,
    replay_cache: C,
    resolver: A,
    replies: ReplyBlockManager,
}

impl<C, A> Sphinx<C, A>
    where C: ReplayCache,
          A: AddressResolver
{
    /// The node's id doubles as the client id its reply blocks
    /// are addressed to.
    pub fn new(params: SphinxParams, node: MixNodeState, replay_cache: C, resolver: A,
               policy: ReplyPolicy) -> Result<Sphinx<C, A>, SphinxParamsError> {
        params.validate()?;
        let replies = ReplyBlockManager::new(params, ClientId(node.id.0), policy);
        Ok(Sphinx {
            params,
            node,
            replay_cache,
            resolver,
            replies,
        })
    }

    pub fn params(&self) -> &SphinxParams {
        &self.params
    }

    pub fn node(&self) -> &MixNodeState {
        &self.node
    }

    pub fn replay_cache(&self) -> &C {
        &self.replay_cache
    }

    pub fn replies(&self) -> &ReplyBlockManager {
        &self.replies
    }
}

impl<C, A> MixScheme for Sphinx<C, A>
    where C: ReplayCache,
          A: AddressResolver
{
    type Address = A::Address;

    fn build_request<R: RngCore + CryptoRng>(&self, rng: &mut R, route: &[PathHop],
                                             destination: &DestinationTag, payload: &[u8])
                                             -> Result<Vec<u8>, SphinxBuildError> {
        new_packet(rng, &self.params, route, destination, payload)
    }

    fn process_inbound(&self, packet: &[u8]) -> Outcome<A::Address> {
        sphinx_packet_unwrap(&self.params, &self.node, &self.replay_cache, &self.resolver, packet)
    }

    fn create_reply_block<R: RngCore + CryptoRng>(&self, rng: &mut R, route: &[PathHop]) -> Result<Nym, SphinxBuildError> {
        self.replies.create_reply_block(rng, route)
    }

    fn decrypt_reply(&self, message: &[u8]) -> Option<Vec<u8>> {
        self.replies.decrypt_reply(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use rand::thread_rng;
    use super::super::node::VolatileReplayHashMap;

    #[test]
    fn invalid_params_test() {
        let node = MixNodeState::generate(&mut thread_rng());
        let params = SphinxParams { hops: 0, max_payload: 64 };
        let resolver: HashMap<ClientId, u32> = HashMap::new();
        let result = Sphinx::new(params, node, VolatileReplayHashMap::new(), resolver, ReplyPolicy::Reusable);
        assert!(result.is_err());
    }

    #[test]
    fn client_id_test() {
        let node = MixNodeState::generate(&mut thread_rng());
        let id = node.id;
        let resolver: HashMap<ClientId, u32> = HashMap::new();
        let sphinx = Sphinx::new(SphinxParams::default(), node, VolatileReplayHashMap::new(),
                                 resolver, ReplyPolicy::Reusable).unwrap();
        assert_eq!(sphinx.replies().client_id().0, id.0);
    }
}
