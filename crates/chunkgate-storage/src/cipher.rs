//! Client-side part encryption.
//!
//! Parts are encrypted with AES in CFB mode, keyed directly by the per-file key.
//! The IV is the part number, so each part decrypts on its own and no two parts of
//! one file share a keystream.

use crate::traits::{StorageError, StorageResult};
use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use chunkgate_core::EncryptionKey;

const IV_LEN: usize = 16;

fn part_iv(part_number: u32) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    iv[IV_LEN - 4..].copy_from_slice(&part_number.to_be_bytes());
    iv
}

fn invalid_length(key: &EncryptionKey) -> StorageError {
    StorageError::Encryption(format!(
        "unsupported key length {} bytes (expected 16, 24 or 32)",
        key.len()
    ))
}

/// Encrypt one part's payload
pub fn encrypt_part(
    key: &EncryptionKey,
    part_number: u32,
    payload: &[u8],
) -> StorageResult<Vec<u8>> {
    let iv = part_iv(part_number);
    let mut buf = payload.to_vec();
    let k = key.as_bytes();
    match key.len() {
        16 => cfb_mode::Encryptor::<Aes128>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .encrypt(&mut buf),
        24 => cfb_mode::Encryptor::<Aes192>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .encrypt(&mut buf),
        32 => cfb_mode::Encryptor::<Aes256>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .encrypt(&mut buf),
        _ => return Err(invalid_length(key)),
    }
    Ok(buf)
}

/// Decrypt one part's payload
pub fn decrypt_part(
    key: &EncryptionKey,
    part_number: u32,
    payload: &[u8],
) -> StorageResult<Vec<u8>> {
    let iv = part_iv(part_number);
    let mut buf = payload.to_vec();
    let k = key.as_bytes();
    match key.len() {
        16 => cfb_mode::Decryptor::<Aes128>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .decrypt(&mut buf),
        24 => cfb_mode::Decryptor::<Aes192>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .decrypt(&mut buf),
        32 => cfb_mode::Decryptor::<Aes256>::new_from_slices(k, &iv)
            .map_err(|_| invalid_length(key))?
            .decrypt(&mut buf),
        _ => return Err(invalid_length(key)),
    }
    Ok(buf)
}
