// lib.rs - The Sphinx mix packet library
// Copyright (C) 2018  David Anthony Stainton.
//
// MIT License
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.


//! An implementation of the Sphinx mix packet format and the per
//! hop recoding performed by mix nodes.
//!
//! # The Sphinx Cryptographic Packet Format
//!
//! Every packet is `alpha || beta || gamma || delta`:
//!
//! * alpha - a blinded X25519 group element, re-randomized at every hop
//! * beta - encrypted routing information, padded with a filler
//!   string so its length never changes
//! * gamma - a truncated HMAC-SHA256 over beta
//! * delta - the payload, onion encrypted with the Lioness wide
//!   block cipher
//!
//! # Features of the Sphinx packet format
//!
//! * Single Use Reply Blocks
//! * per hop bitwise unlinkability
//! * indistinguishable replies
//! * hidden relay position
//! * tagging attack detection
//! * replay attack detection
//!
//! Route length and payload size are fixed per deployment by
//! `params::SphinxParams`, so every packet on the wire has the
//! same size.
//!
//! **Sphinx: A Compact and Provably Secure Mix Format**\
//! https://cypherpunks.ca/~iang/pubs/Sphinx_Oakland09.pdf

#[macro_use]
extern crate arrayref;

pub mod constants;
pub mod params;
pub mod commands;
pub mod error;
pub mod ecdh;
pub mod lioness;
pub mod payload;
pub mod packet;
pub mod client;
pub mod server;
pub mod node;
pub mod surb;
pub mod directory;
pub mod scheme;

mod internal_crypto;
mod utils;

pub use client::{PathHop, SphinxHeader, new_packet};
pub use commands::{ClientId, DestinationTag, NodeId, SurbId};
pub use error::{SphinxBuildError, SphinxParamsError, SphinxParseError};
pub use params::SphinxParams;
pub use scheme::{MixScheme, Sphinx};
pub use server::{Outcome, sphinx_packet_unwrap};
pub use surb::{Nym, ReplyBlockManager, ReplyPolicy, new_packet_from_surb};
