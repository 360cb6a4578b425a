// payload.rs - sphinx payload padding and onion encryption
// Copyright (C) 2018  David Stainton.

//! Delta, the packet payload, is always `delta_size` bytes:
//!
//! ```text
//! [ zero tag (k) | payload | 0x7f | 0xff ... ]
//! ```
//!
//! The zero tag lets the final hop detect any modification of
//! Delta along the route, since Lioness garbles the whole block.

use subtle::ConstantTimeEq;

use super::client::HopSecret;
use super::constants::{PAD_FILL, PAD_MARKER, PAYLOAD_TAG, PAYLOAD_TAG_SIZE};
use super::error::SphinxBuildError;
use super::lioness::pi;
use super::params::SphinxParams;

/// pad `payload` into a Delta sized block, zero tag included
pub fn pad(params: &SphinxParams, payload: &[u8]) -> Result<Vec<u8>, SphinxBuildError> {
    if payload.len() > params.max_payload {
        return Err(SphinxBuildError::PayloadTooLarge { max: params.max_payload, got: payload.len() });
    }
    let mut delta = Vec::with_capacity(params.delta_size());
    delta.extend_from_slice(&PAYLOAD_TAG);
    delta.extend_from_slice(payload);
    delta.push(PAD_MARKER);
    delta.resize(params.delta_size(), PAD_FILL);
    Ok(delta)
}

/// check the zero tag and strip the padding, returning None if
/// either is malformed
pub fn unpad(delta: &[u8]) -> Option<Vec<u8>> {
    if delta.len() <= PAYLOAD_TAG_SIZE {
        return None;
    }
    let (tag, body) = delta.split_at(PAYLOAD_TAG_SIZE);
    if tag.ct_eq(&PAYLOAD_TAG[..]).unwrap_u8() == 0 {
        return None;
    }
    let end = body.iter().rposition(|&b| b != PAD_FILL)?;
    if body[end] != PAD_MARKER {
        return None;
    }
    Some(body[..end].to_vec())
}

/// onion encrypt a padded Delta, the last hop's layer first
pub fn encrypt_payload(secrets: &[HopSecret], delta: &mut [u8]) -> Result<(), SphinxBuildError> {
    for secret in secrets.iter().rev() {
        pi(&secret.payload_key(), delta)?;
    }
    Ok(())
}
