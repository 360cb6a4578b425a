// Copyright 2016 Jeffrey Burdges and David Stainton

//! Sphinx crypto primitives

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher as _};
use ctr::Ctr128BE;
use digest::Digest;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::constants::{KEY_SIZE, MAC_SIZE, REPLAY_TAG_SIZE};
use super::ecdh::CURVE25519_SIZE;

pub const HASH_SIZE: usize = 32;
pub const STREAM_IV_SIZE: usize = 16;

const HASH_BLINDING_PREFIX: &[u8] = b"hb:";
const HASH_STREAM_KEY_PREFIX: &[u8] = b"hrho:";
const HASH_HMAC_KEY_PREFIX: &[u8] = b"hmu:";
const HASH_PAYLOAD_KEY_PREFIX: &[u8] = b"hpi:";
const HASH_REPLAY_PREFIX: &[u8] = b"htau:";

type HmacSha256 = Hmac<Sha256>;
type Aes128Ctr = Ctr128BE<Aes128>;

/// AES-128 in counter mode with an all zero IV. A fresh key must
/// be derived for every use.
pub struct StreamCipher {
    cipher: Aes128Ctr,
}

impl StreamCipher {

    /// create a new StreamCipher struct
    pub fn new(key: &[u8; KEY_SIZE]) -> StreamCipher {
        let iv = [0u8; STREAM_IV_SIZE];
        StreamCipher {
            cipher: Aes128Ctr::new(GenericArray::from_slice(key), GenericArray::from_slice(&iv)),
        }
    }

    /// given a key return a cipher stream of length n
    pub fn generate(&mut self, n: usize) -> Vec<u8> {
        let mut output = vec![0u8; n];
        self.cipher.apply_keystream(&mut output);
        output
    }

    /// xor the key stream into `data`
    pub fn xor_key_stream(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }
}

/// SHA-256 over the concatenation of `parts`.
pub fn hash(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut h = Sha256::new();
    for part in parts {
        h.input(part);
    }
    let mut output = [0u8; HASH_SIZE];
    output.copy_from_slice(&h.result());
    output
}

fn hash_key(prefix: &[u8], secret: &[u8; CURVE25519_SIZE]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&hash(&[prefix, secret])[..KEY_SIZE]);
    key
}

/// Derive the blinding factor applied to alpha after this hop.
pub fn hash_blinding(alpha: &[u8; CURVE25519_SIZE], secret: &[u8; CURVE25519_SIZE]) -> [u8; CURVE25519_SIZE] {
    hash(&[HASH_BLINDING_PREFIX, alpha, secret])
}

/// Derive the key of the PRG that encrypts beta.
pub fn hash_stream_key(secret: &[u8; CURVE25519_SIZE]) -> [u8; KEY_SIZE] {
    hash_key(HASH_STREAM_KEY_PREFIX, secret)
}

/// Derive an HMAC key
pub fn hash_mac_key(secret: &[u8; CURVE25519_SIZE]) -> [u8; KEY_SIZE] {
    hash_key(HASH_HMAC_KEY_PREFIX, secret)
}

/// Derive the Lioness key for this hop's payload layer.
pub fn hash_payload_key(secret: &[u8; CURVE25519_SIZE]) -> [u8; KEY_SIZE] {
    hash_key(HASH_PAYLOAD_KEY_PREFIX, secret)
}

/// Produce prefixed hash output used to detect mixnet replay attacks
pub fn hash_replay(secret: &[u8; CURVE25519_SIZE]) -> [u8; REPLAY_TAG_SIZE] {
    hash(&[HASH_REPLAY_PREFIX, secret])
}

/// HMAC-SHA256 truncated to MAC_SIZE bytes.
pub fn hmac(key: &[u8; KEY_SIZE], data: &[u8]) -> [u8; MAC_SIZE] {
    let mut m = match HmacSha256::new_varkey(key) {
        Ok(m) => m,
        // HMAC accepts keys of any length.
        Err(_) => unreachable!(),
    };
    m.input(data);
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&m.result().code()[..MAC_SIZE]);
    out
}

/// The sphinx PRG: `n` bytes of key stream under `key`.
pub fn prg(key: &[u8; KEY_SIZE], n: usize) -> Vec<u8> {
    StreamCipher::new(key).generate(n)
}

#[cfg(test)]
mod tests {
    extern crate hex;
    use super::*;

    #[test]
    fn sha256_test() {
        let digest = hash(&[b"a", b"bc"]);
        assert_eq!(hex::encode(&digest[..]), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn hmac_test() {
        // RFC 4231 test case 2, truncated.
        let mut key = [0u8; KEY_SIZE];
        key[..4].copy_from_slice(b"Jefe");
        let mac = hmac(&key, b"what do ya want for nothing?");
        let full = {
            let mut m = HmacSha256::new_varkey(&key).unwrap();
            m.input(b"what do ya want for nothing?");
            m.result().code().to_vec()
        };
        assert_eq!(&mac[..], &full[..MAC_SIZE]);
    }

    #[test]
    fn stream_cipher_involution_test() {
        let key = [9u8; KEY_SIZE];
        let mut data = b"attack at dawn, attack at dawn!!".to_vec();
        StreamCipher::new(&key).xor_key_stream(&mut data);
        assert_ne!(&data[..], &b"attack at dawn, attack at dawn!!"[..]);
        StreamCipher::new(&key).xor_key_stream(&mut data);
        assert_eq!(&data[..], &b"attack at dawn, attack at dawn!!"[..]);
        assert_ne!(prg(&key, 32), prg(&[10u8; KEY_SIZE], 32));
    }

    #[test]
    fn prg_prefix_test() {
        let key = [7u8; KEY_SIZE];
        let long = prg(&key, 200);
        let short = prg(&key, 48);
        assert_eq!(&long[..48], &short[..]);

        let mut data = vec![0u8; 200];
        StreamCipher::new(&key).xor_key_stream(&mut data);
        assert_eq!(data, long);
    }

    #[test]
    fn domain_separation_test() {
        let secret = [3u8; CURVE25519_SIZE];
        let keys = [
            hash_stream_key(&secret),
            hash_mac_key(&secret),
            hash_payload_key(&secret),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(&hash_replay(&secret)[..KEY_SIZE], &keys[0][..]);
    }
}
