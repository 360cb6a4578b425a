// packet.rs - sphinx packet wire encoding
// Copyright (C) 2018  David Stainton.

use super::constants::{GROUP_ELEMENT_SIZE, MAC_SIZE};
use super::error::SphinxParseError;
use super::params::SphinxParams;

/// SphinxPacket represents a decoded sphinx mix packet. On the wire
/// it is the plain concatenation alpha || beta || gamma || delta,
/// every field of a size fixed by the deployment parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SphinxPacket {
    /// the blinded key element
    pub alpha: [u8; GROUP_ELEMENT_SIZE],
    /// encrypted and padded routing information
    pub beta: Vec<u8>,
    /// HMAC of the routing information
    pub gamma: [u8; MAC_SIZE],
    /// message body encrypted with Lioness
    pub delta: Vec<u8>,
}

impl SphinxPacket {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(GROUP_ELEMENT_SIZE + self.beta.len() + MAC_SIZE + self.delta.len());
        out.extend_from_slice(&self.alpha);
        out.extend_from_slice(&self.beta);
        out.extend_from_slice(&self.gamma);
        out.extend_from_slice(&self.delta);
        out
    }

    pub fn from_bytes(params: &SphinxParams, b: &[u8]) -> Result<SphinxPacket, SphinxParseError> {
        if b.len() != params.packet_size() {
            return Err(SphinxParseError::InvalidLength { expected: params.packet_size(), got: b.len() });
        }
        let (alpha, rest) = b.split_at(GROUP_ELEMENT_SIZE);
        let (beta, rest) = rest.split_at(params.beta_size());
        let (gamma, delta) = rest.split_at(MAC_SIZE);
        Ok(SphinxPacket {
            alpha: *array_ref![alpha, 0, GROUP_ELEMENT_SIZE],
            beta: beta.to_vec(),
            gamma: *array_ref![gamma, 0, MAC_SIZE],
            delta: delta.to_vec(),
        })
    }
}
