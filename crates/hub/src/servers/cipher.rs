// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symmetric sealing of server tokens: AES-256-CFB with a random IV per token.
//!
//! Tokens are `base64(iv || ciphertext)` using the standard padded alphabet,
//! which is the format existing snapshots already contain.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::Rng;

use crate::error::HubError;

type Encryptor = cfb_mode::Encryptor<Aes256>;
type Decryptor = cfb_mode::Decryptor<Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// Derive the AES key by truncating or zero-padding the passphrase bytes.
///
/// There is no stretching here. Snapshots on disk were sealed with exactly
/// this derivation, so changing it would orphan them.
pub fn derive_key(passphrase: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let bytes = passphrase.as_bytes();
    let n = bytes.len().min(KEY_LEN);
    key[..n].copy_from_slice(&bytes[..n]);
    key
}

/// Seals and opens server tokens with a single static key.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; KEY_LEN],
}

impl TokenCipher {
    pub fn new(passphrase: &str) -> Self {
        Self { key: derive_key(passphrase) }
    }

    /// Encrypt `plaintext` under a fresh IV.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill(&mut iv);
        self.encrypt_with_iv(plaintext, iv)
    }

    fn encrypt_with_iv(&self, plaintext: &str, iv: [u8; IV_LEN]) -> String {
        let mut sealed = Vec::with_capacity(IV_LEN + plaintext.len());
        sealed.extend_from_slice(&iv);
        sealed.extend_from_slice(plaintext.as_bytes());
        Encryptor::new(&self.key.into(), &iv.into()).encrypt(&mut sealed[IV_LEN..]);
        STANDARD.encode(sealed)
    }

    /// Decrypt a token produced by [`TokenCipher::encrypt`].
    pub fn decrypt(&self, token: &str) -> Result<String, HubError> {
        let mut sealed = STANDARD.decode(token)?;
        if sealed.len() < IV_LEN {
            return Err(HubError::Format);
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&sealed[..IV_LEN]);
        let data = &mut sealed[IV_LEN..];
        Decryptor::new(&self.key.into(), &iv.into()).decrypt(data);
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "cipher_tests.rs"]
mod tests;
