// error.rs - Sphinx error types
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

//! Construction time errors.
//!
//! Packet processing never returns any of these: a relay that
//! fails to unwrap a packet drops it, see `server::Outcome`.

use thiserror::Error;


/// Errors produced while validating deployment parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SphinxParamsError {
    #[error("route length must be between 1 and {max}, got {got}")]
    InvalidHops { got: usize, max: usize },

    #[error("payload size must be at least {min} bytes, got {got}")]
    PayloadTooSmall { got: usize, min: usize },

    #[error("payload size must be at most {max} bytes, got {got}")]
    PayloadTooLarge { got: usize, max: usize },
}

/// Errors produced while building headers, packets and SURBs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SphinxBuildError {
    #[error("route must contain exactly {expected} hops, got {got}")]
    RouteLength { expected: usize, got: usize },

    #[error("destination tag must be {expected} bytes with a request or client prefix")]
    InvalidDestination { expected: usize },

    #[error("a client destination requires a SURB identifier")]
    MissingSurbId,

    #[error("payload must not exceed {max} bytes, got {got}")]
    PayloadTooLarge { max: usize, got: usize },

    #[error("wide block cipher input must be at least {min} bytes, got {got}")]
    BlockTooShort { min: usize, got: usize },

    #[error("hop public key is not a valid group element")]
    InvalidGroupElement,

    #[error(transparent)]
    Params(#[from] SphinxParamsError),
}

/// Errors produced while decoding fixed layout byte strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SphinxParseError {
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid key")]
    InvalidKey,
}
