// ecdh.rs - wrapping library for curve25519 dh operations
// Copyright (C) 2018  David Stainton.

use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use x25519_dalek_ng::{PublicKey as DalekPublicKey, StaticSecret};
use zeroize::Zeroize;

use super::error::SphinxParseError;

pub const CURVE25519_SIZE: usize = 32;

/// exp multiplies the group element `x` by the (clamped) scalar `y`.
pub fn exp(x: &[u8; CURVE25519_SIZE], y: &[u8; CURVE25519_SIZE]) -> [u8; CURVE25519_SIZE] {
    let scalar = StaticSecret::from(*y);
    *scalar.diffie_hellman(&DalekPublicKey::from(*x)).as_bytes()
}

/// exp_g multiplies the base point by the scalar `x`.
pub fn exp_g(x: &[u8; CURVE25519_SIZE]) -> [u8; CURVE25519_SIZE] {
    let scalar = StaticSecret::from(*x);
    DalekPublicKey::from(&scalar).to_bytes()
}

/// Perform accumulating multiplication for each scalar. Clamped
/// scalar multiplications commute, so the order of `scalars` does
/// not matter to the result.
pub fn multi_exp(base: &[u8; CURVE25519_SIZE], scalars: &[[u8; CURVE25519_SIZE]]) -> [u8; CURVE25519_SIZE] {
    scalars.iter().fold(*base, |acc, x| exp(&acc, x))
}

/// returns true for the all zero output produced by small order points
pub fn is_degenerate(x: &[u8; CURVE25519_SIZE]) -> bool {
    bool::from(x[..].ct_eq(&[0u8; CURVE25519_SIZE][..]))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key: [u8; CURVE25519_SIZE],
}

impl PublicKey {
    pub fn blind(&mut self, blinding_factor: &[u8; CURVE25519_SIZE]) {
        self.key = exp(&self.key, blinding_factor)
    }

    pub fn as_array(&self) -> &[u8; CURVE25519_SIZE] {
        &self.key
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.key.to_vec()
    }

    pub fn from_bytes(b: &[u8]) -> Result<PublicKey, SphinxParseError> {
        if b.len() != CURVE25519_SIZE {
            return Err(SphinxParseError::InvalidKey)
        }
        let mut key = [0u8; CURVE25519_SIZE];
        key.copy_from_slice(b);
        Ok(PublicKey { key })
    }
}

impl From<[u8; CURVE25519_SIZE]> for PublicKey {
    fn from(key: [u8; CURVE25519_SIZE]) -> PublicKey {
        PublicKey { key }
    }
}

#[derive(Clone)]
pub struct PrivateKey {
    public_key: PublicKey,
    priv_bytes: [u8; CURVE25519_SIZE],
}

impl PrivateKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> PrivateKey {
        let mut raw_key = [0u8; CURVE25519_SIZE];
        rng.fill_bytes(&mut raw_key);
        let key = PrivateKey {
            public_key: PublicKey { key: exp_g(&raw_key) },
            priv_bytes: raw_key,
        };
        raw_key.zeroize();
        key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Exp calculates the shared secret with the provided public key.
    pub fn exp(&self, public_key: &PublicKey) -> [u8; CURVE25519_SIZE] {
        exp(&public_key.key, &self.priv_bytes)
    }

    pub fn as_array(&self) -> &[u8; CURVE25519_SIZE] {
        &self.priv_bytes
    }

    pub fn from_bytes(b: &[u8]) -> Result<PrivateKey, SphinxParseError> {
        if b.len() != CURVE25519_SIZE {
            return Err(SphinxParseError::InvalidKey)
        }
        let mut priv_bytes = [0u8; CURVE25519_SIZE];
        priv_bytes.copy_from_slice(b);
        Ok(PrivateKey {
            public_key: PublicKey { key: exp_g(&priv_bytes) },
            priv_bytes,
        })
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.priv_bytes.zeroize();
    }
}
