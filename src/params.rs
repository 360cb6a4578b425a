// params.rs - Sphinx deployment parameters
// Copyright (C) 2018  David Stainton.

//! Deployment wide parameters.
//!
//! Every relay and client of one mix network must agree on the
//! route length and the payload size, since together they fix the
//! size of every packet on the wire.

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_HOPS, DEFAULT_MAX_PAYLOAD, GROUP_ELEMENT_SIZE, MAC_SIZE, MAX_HOPS,
                       MAX_PAYLOAD,
                       NODE_ID_SIZE, KEY_SIZE, PAYLOAD_TAG_SIZE, PER_HOP_ROUTING_INFO_SIZE,
                       SECURITY_PARAMETER, SURB_ID_SIZE};
use super::error::SphinxParamsError;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SphinxParams {
    /// the fixed number of relays every route traverses
    pub hops: usize,
    /// the largest user payload a packet can carry
    pub max_payload: usize,
}

impl Default for SphinxParams {
    fn default() -> Self {
        SphinxParams {
            hops: DEFAULT_HOPS,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl SphinxParams {
    /// return validated parameters
    pub fn new(hops: usize, max_payload: usize) -> Result<SphinxParams, SphinxParamsError> {
        let params = SphinxParams { hops, max_payload };
        params.validate()?;
        Ok(params)
    }

    /// check that these parameters describe a usable packet format
    pub fn validate(&self) -> Result<(), SphinxParamsError> {
        if self.hops == 0 || self.hops > MAX_HOPS {
            return Err(SphinxParamsError::InvalidHops { got: self.hops, max: MAX_HOPS });
        }
        // Delta must be at least two Lioness blocks wide.
        if self.max_payload < SECURITY_PARAMETER {
            return Err(SphinxParamsError::PayloadTooSmall {
                got: self.max_payload,
                min: SECURITY_PARAMETER,
            });
        }
        if self.max_payload > MAX_PAYLOAD {
            return Err(SphinxParamsError::PayloadTooLarge {
                got: self.max_payload,
                max: MAX_PAYLOAD,
            });
        }
        Ok(())
    }

    pub fn beta_size(&self) -> usize {
        SECURITY_PARAMETER + self.hops * PER_HOP_ROUTING_INFO_SIZE
    }

    /// The PRG output length: Beta plus the bytes shifted in at one hop.
    pub fn stream_size(&self) -> usize {
        self.beta_size() + PER_HOP_ROUTING_INFO_SIZE
    }

    pub fn header_size(&self) -> usize {
        GROUP_ELEMENT_SIZE + self.beta_size() + MAC_SIZE
    }

    pub fn delta_size(&self) -> usize {
        self.max_payload + 1 + PAYLOAD_TAG_SIZE
    }

    pub fn packet_size(&self) -> usize {
        self.header_size() + self.delta_size()
    }

    /// The size of an encoded nym: first hop, header and reply key.
    pub fn nym_size(&self) -> usize {
        NODE_ID_SIZE + self.header_size() + KEY_SIZE
    }

    /// The size of a reply handed to a client: SURB id then Delta.
    pub fn reply_size(&self) -> usize {
        SURB_ID_SIZE + self.delta_size()
    }
}
