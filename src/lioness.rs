// lioness.rs - the Lioness wide block cipher used for sphinx payloads
// Copyright (C) 2018  David Stainton.

//! A sphinx has the body of a lion. The payload of a sphinx packet
//! is encrypted with a four round Lioness style construction built
//! from SHA-256 and AES-128-CTR. Any change to a single bit of the
//! ciphertext garbles the whole plaintext, which is what lets the
//! final hop detect tampering through the zero payload tag.

use super::constants::KEY_SIZE;
use super::error::SphinxBuildError;
use super::internal_crypto::{StreamCipher, hash};
use super::utils::xor_assign;

/// The smallest block the cipher accepts.
pub const MIN_BLOCK_SIZE: usize = 2 * KEY_SIZE;

const ROUND_ONE: &[u8] = b"1";
const ROUND_THREE: &[u8] = b"3";

fn check_len(block: &[u8]) -> Result<(), SphinxBuildError> {
    if block.len() < MIN_BLOCK_SIZE {
        return Err(SphinxBuildError::BlockTooShort { min: MIN_BLOCK_SIZE, got: block.len() });
    }
    Ok(())
}

// L ^= H(R || key || label)
fn hash_round(key: &[u8; KEY_SIZE], left: &mut [u8], right: &[u8], label: &[u8]) {
    let h = hash(&[right, key, label]);
    xor_assign(left, &h[..KEY_SIZE]);
}

// R ^= CTR(L ^ key)
fn stream_round(key: &[u8; KEY_SIZE], left: &[u8], right: &mut [u8]) {
    let mut round_key = *key;
    xor_assign(&mut round_key, left);
    StreamCipher::new(&round_key).xor_key_stream(right);
}

/// encrypt `block` in place
pub fn pi(key: &[u8; KEY_SIZE], block: &mut [u8]) -> Result<(), SphinxBuildError> {
    check_len(block)?;
    let (left, right) = block.split_at_mut(KEY_SIZE);
    hash_round(key, left, right, ROUND_ONE);
    stream_round(key, left, right);
    hash_round(key, left, right, ROUND_THREE);
    stream_round(key, left, right);
    Ok(())
}

/// decrypt `block` in place
pub fn pii(key: &[u8; KEY_SIZE], block: &mut [u8]) -> Result<(), SphinxBuildError> {
    check_len(block)?;
    let (left, right) = block.split_at_mut(KEY_SIZE);
    stream_round(key, left, right);
    hash_round(key, left, right, ROUND_THREE);
    stream_round(key, left, right);
    hash_round(key, left, right, ROUND_ONE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, RngCore};

    #[test]
    fn inverse_test() {
        let mut rng = thread_rng();
        for &size in [MIN_BLOCK_SIZE, 33, 100, 1041].iter() {
            let mut key = [0u8; KEY_SIZE];
            rng.fill_bytes(&mut key);
            let mut message = vec![0u8; size];
            rng.fill_bytes(&mut message);

            let mut block = message.clone();
            pi(&key, &mut block).unwrap();
            assert_ne!(block, message);
            pii(&key, &mut block).unwrap();
            assert_eq!(block, message);

            pii(&key, &mut block).unwrap();
            pi(&key, &mut block).unwrap();
            assert_eq!(block, message);
        }
    }

    #[test]
    fn diffusion_test() {
        let key = [1u8; KEY_SIZE];
        let mut a = vec![0u8; 256];
        let mut b = a.clone();
        b[255] ^= 1;
        pi(&key, &mut a).unwrap();
        pi(&key, &mut b).unwrap();
        // A one bit change at the end reaches the first block.
        assert_ne!(&a[..KEY_SIZE], &b[..KEY_SIZE]);

        let mut c = a.clone();
        c[200] ^= 0x80;
        pii(&key, &mut c).unwrap();
        assert_ne!(&c[..KEY_SIZE], &[0u8; KEY_SIZE][..]);
    }

    #[test]
    fn short_block_test() {
        let key = [0u8; KEY_SIZE];
        let mut block = vec![0u8; MIN_BLOCK_SIZE - 1];
        assert_eq!(pi(&key, &mut block), Err(SphinxBuildError::BlockTooShort { min: 32, got: 31 }));
        assert!(pii(&key, &mut block).is_err());
    }
}
