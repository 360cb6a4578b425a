// constants.rs - sphinx mix packet format constants
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

use super::ecdh::CURVE25519_SIZE;


/// The security parameter `k` in bytes. Every truncated hash,
/// MAC, stream cipher key and routing tag is this long.
pub const SECURITY_PARAMETER: usize = 16;

/// The size of the Alpha header element, a blinded group element.
pub const GROUP_ELEMENT_SIZE: usize = CURVE25519_SIZE;

/// The size of the Gamma header element, the truncated MAC over Beta.
pub const MAC_SIZE: usize = SECURITY_PARAMETER;

/// The size of a per-hop symmetric key: PRG keys, MAC keys
/// and Lioness keys alike.
pub const KEY_SIZE: usize = SECURITY_PARAMETER;

/// The size of an encoded routing tag (prefix byte and identifier).
pub const ROUTING_TAG_SIZE: usize = SECURITY_PARAMETER;

/// The mix node identifier size in bytes.
pub const NODE_ID_SIZE: usize = ROUTING_TAG_SIZE - 1;

/// The client identifier size in bytes.
pub const CLIENT_ID_SIZE: usize = ROUTING_TAG_SIZE - 1;

/// The opaque request destination size in bytes.
pub const DESTINATION_SIZE: usize = ROUTING_TAG_SIZE - 1;

/// The SURB identifier size in bytes.
pub const SURB_ID_SIZE: usize = SECURITY_PARAMETER;

/// Each hop consumes this many bytes of Beta: a routing tag
/// followed by the MAC for the next hop.
pub const PER_HOP_ROUTING_INFO_SIZE: usize = 2 * SECURITY_PARAMETER;

/// The size in bytes of the all zero payload tag.
pub const PAYLOAD_TAG_SIZE: usize = SECURITY_PARAMETER;

/// The zero payload tag checked at the final hop.
pub const PAYLOAD_TAG: [u8; PAYLOAD_TAG_SIZE] = [0u8; PAYLOAD_TAG_SIZE];

/// Marks the end of the user payload inside Delta.
pub const PAD_MARKER: u8 = 0x7f;

/// Fills Delta after the padding marker.
pub const PAD_FILL: u8 = 0xff;

/// The largest route length a deployment may configure.
pub const MAX_HOPS: usize = 16;

/// The default route length.
pub const DEFAULT_HOPS: usize = 5;

/// The largest payload size a deployment may configure.
pub const MAX_PAYLOAD: usize = 1 << 20;

/// The default usable payload size in bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

/// The size of a replay tag.
pub const REPLAY_TAG_SIZE: usize = 32;
