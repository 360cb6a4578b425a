// client.rs - sphinx client side header and packet construction
// Copyright (C) 2018  David Stainton.

//! Sphinx mix client cryptographic operations

use rand_core::{CryptoRng, RngCore};
use tracing::trace;
use zeroize::Zeroize;

use super::commands::{DestinationTag, NodeId, RoutingCommand, SurbId};
use super::constants::{GROUP_ELEMENT_SIZE, KEY_SIZE, MAC_SIZE, PER_HOP_ROUTING_INFO_SIZE};
use super::ecdh::{CURVE25519_SIZE, PublicKey, exp, exp_g, is_degenerate, multi_exp};
use super::error::SphinxBuildError;
use super::internal_crypto::{hash_blinding, hash_mac_key, hash_payload_key, hash_stream_key, hmac, prg};
use super::packet::SphinxPacket;
use super::params::SphinxParams;
use super::payload::{encrypt_payload, pad};
use super::utils::{random_bytes, xor_assign};

/// Final hop routing info: the destination tag, the SURB id slot
/// and one more slot of noise.
const FINAL_HOP_ROUTING_INFO_SIZE: usize = PER_HOP_ROUTING_INFO_SIZE + KEY_SIZE;

/// PathHop describes a route hop that a Sphinx Packet will traverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathHop {
    pub id: NodeId,
    pub public_key: PublicKey,
}

/// this struct represents the Sphinx mix packet header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SphinxHeader {
    /// alpha is the curve25519 public key element
    pub alpha: [u8; GROUP_ELEMENT_SIZE],
    /// beta is the encrypted routing information
    pub beta: Vec<u8>,
    /// gamma is the message authenticating code
    pub gamma: [u8; MAC_SIZE],
}

/// A shared secret between the sender and one hop. Never leaves
/// the sender; wiped when dropped.
pub struct HopSecret([u8; CURVE25519_SIZE]);

impl HopSecret {
    pub fn as_array(&self) -> &[u8; CURVE25519_SIZE] {
        &self.0
    }

    /// the Lioness key used for this hop's payload layer
    pub fn payload_key(&self) -> [u8; KEY_SIZE] {
        hash_payload_key(&self.0)
    }
}

impl Drop for HopSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

// phi_i = (phi_{i-1} || 0^2k) ^ rho(hrho(s_{i-1}))[(2(r-i)+3)k..]
fn filler(params: &SphinxParams, secrets: &[HopSecret]) -> Vec<u8> {
    let stream_size = params.stream_size();
    let mut phi: Vec<u8> = Vec::new();
    for (i, secret) in secrets[..secrets.len() - 1].iter().enumerate() {
        phi.extend_from_slice(&[0u8; PER_HOP_ROUTING_INFO_SIZE]);
        let stream = prg(&hash_stream_key(secret.as_array()), stream_size);
        let start = stream_size - (i + 1) * PER_HOP_ROUTING_INFO_SIZE;
        xor_assign(&mut phi, &stream[start..]);
    }
    phi
}

/// Build a Sphinx header through `path` to `destination`.
///
/// # Arguments
///
/// * `rng` - a cryptographically secure random source
/// * `params` - the deployment parameters
/// * `path` - exactly `params.hops` hops
/// * `destination` - the final hop command's destination tag
/// * `surb_id` - required iff `destination` is a client tag
///
/// # Returns
///
/// * the header and the per hop shared secrets, in route order
///
pub fn create_header<R: RngCore + CryptoRng>(rng: &mut R, params: &SphinxParams, path: &[PathHop],
                                             destination: &DestinationTag, surb_id: Option<&SurbId>)
                                             -> Result<(SphinxHeader, Vec<HopSecret>), SphinxBuildError> {
    params.validate()?;
    if path.len() != params.hops {
        return Err(SphinxBuildError::RouteLength { expected: params.hops, got: path.len() });
    }
    let final_cmd = RoutingCommand::for_destination(destination, surb_id)?;
    let num_hops = path.len();

    // Derive the shared secrets, keeping the blinding factors
    // accumulated so far as the scalars of every exponentiation.
    let mut scalars = Vec::with_capacity(num_hops);
    let mut x = [0u8; CURVE25519_SIZE];
    rng.fill_bytes(&mut x);
    scalars.push(x);
    x.zeroize();
    let alpha0 = exp_g(&scalars[0]);
    let mut secrets = Vec::with_capacity(num_hops);
    let mut alpha = alpha0;
    for (i, hop) in path.iter().enumerate() {
        if i > 0 {
            alpha = exp(&alpha, &scalars[i]);
        }
        let secret = multi_exp(hop.public_key.as_array(), &scalars);
        if is_degenerate(&secret) {
            scalars.iter_mut().for_each(|s| s.zeroize());
            return Err(SphinxBuildError::InvalidGroupElement);
        }
        scalars.push(hash_blinding(&alpha, &secret));
        secrets.push(HopSecret(secret));
    }
    scalars.iter_mut().for_each(|s| s.zeroize());

    // The final hop's routing info, with the filler appended.
    let beta_size = params.beta_size();
    let phi = filler(params, &secrets);
    let mut routing_info = final_cmd.to_vec();
    let noise = random_bytes(rng, FINAL_HOP_ROUTING_INFO_SIZE - routing_info.len());
    routing_info.extend_from_slice(&noise);
    let last = &secrets[num_hops - 1];
    let stream = prg(&hash_stream_key(last.as_array()), params.stream_size());
    xor_assign(&mut routing_info, &stream[..FINAL_HOP_ROUTING_INFO_SIZE]);
    routing_info.extend_from_slice(&phi);
    let mut beta = routing_info;
    let mut gamma = hmac(&hash_mac_key(last.as_array()), &beta);

    // Wrap the remaining hops, innermost first.
    for i in (0..num_hops - 1).rev() {
        let next_hop = RoutingCommand::NextHop { id: path[i + 1].id, mac: gamma };
        let mut b = next_hop.to_vec();
        b.extend_from_slice(&beta[..beta_size - PER_HOP_ROUTING_INFO_SIZE]);
        let stream = prg(&hash_stream_key(secrets[i].as_array()), params.stream_size());
        xor_assign(&mut b, &stream[..beta_size]);
        gamma = hmac(&hash_mac_key(secrets[i].as_array()), &b);
        beta = b;
    }
    trace!(hops = num_hops, "created sphinx header");

    let header = SphinxHeader {
        alpha: alpha0,
        beta,
        gamma,
    };
    Ok((header, secrets))
}

/// Create a new Sphinx request packet carrying `payload` to `destination`.
///
/// # Returns
///
/// * the wire encoded packet, to be sent to `path[0]`
///
pub fn new_packet<R: RngCore + CryptoRng>(rng: &mut R, params: &SphinxParams, path: &[PathHop],
                                          destination: &DestinationTag, payload: &[u8])
                                          -> Result<Vec<u8>, SphinxBuildError> {
    let mut delta = pad(params, payload)?;
    let (header, secrets) = create_header(rng, params, path, destination, None)?;
    encrypt_payload(&secrets, &mut delta)?;
    let packet = SphinxPacket {
        alpha: header.alpha,
        beta: header.beta,
        gamma: header.gamma,
        delta,
    };
    Ok(packet.to_bytes())
}
