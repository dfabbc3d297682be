//! Per-file key material and the streaming AES-256-CBC transform.
//!
//! Files are encrypted with AES-256 in CBC mode with PKCS#7 padding. The transform is
//! incremental: callers feed arbitrary-sized chunks through [`StreamEncryptor::update`] /
//! [`StreamDecryptor::update`] and finish with `finalize`, so only one block of carry-over
//! state is held between chunks regardless of file size.

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;
/// CBC initialization vector length in bytes
pub const IV_LEN: usize = 16;
/// AES block length in bytes
pub const BLOCK_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidLength(u64),

    #[error("ciphertext padding is invalid")]
    InvalidPadding,

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

macro_rules! secret_bytes {
    ($name:ident, $len:expr, $label:literal) => {
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Fresh random value from the thread-local CSPRNG.
            pub fn generate() -> Self {
                let mut bytes = [0u8; $len];
                rand::rng().fill_bytes(&mut bytes);
                Self(bytes)
            }

            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_hex(value: &str) -> Result<Self, CipherError> {
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(value, &mut bytes).map_err(|e| {
                    CipherError::InvalidKeyMaterial(format!("{}: {}", $label, e))
                })?;
                Ok(Self(bytes))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(<redacted>)"))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Self::from_hex(&value).map_err(serde::de::Error::custom)
            }
        }
    };
}

secret_bytes!(EncryptionKey, KEY_LEN, "encryption key");
secret_bytes!(Iv, IV_LEN, "iv");

/// Incremental AES-256-CBC encryptor.
pub struct StreamEncryptor {
    cipher: Aes256CbcEnc,
    pending: Vec<u8>,
}

impl StreamEncryptor {
    pub fn new(key: &EncryptionKey, iv: &Iv) -> Result<Self, CipherError> {
        let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv.as_bytes())
            .map_err(|e| CipherError::InvalidKeyMaterial(e.to_string()))?;
        Ok(Self {
            cipher,
            pending: Vec::with_capacity(BLOCK_LEN),
        })
    }

    /// Encrypt every complete block available after appending `input`.
    ///
    /// Bytes that do not fill a block are carried to the next call.
    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(input);

        let full = data.len() - data.len() % BLOCK_LEN;
        self.pending = data.split_off(full);

        for block in data.chunks_exact_mut(BLOCK_LEN) {
            self.cipher
                .encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        data
    }

    /// Pad and encrypt the carried tail. Always yields exactly one block.
    pub fn finalize(self) -> Result<Vec<u8>, CipherError> {
        let mut block = [0u8; BLOCK_LEN];
        let len = self.pending.len();
        block[..len].copy_from_slice(&self.pending);
        let ciphertext = self
            .cipher
            .encrypt_padded_mut::<Pkcs7>(&mut block, len)
            .map_err(|_| CipherError::InvalidPadding)?;
        Ok(ciphertext.to_vec())
    }
}

/// Incremental AES-256-CBC decryptor.
///
/// The last complete block is held back until [`StreamDecryptor::finalize`] because it
/// carries the padding.
pub struct StreamDecryptor {
    cipher: Aes256CbcDec,
    pending: Vec<u8>,
    consumed: u64,
}

impl StreamDecryptor {
    pub fn new(key: &EncryptionKey, iv: &Iv) -> Result<Self, CipherError> {
        let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv.as_bytes())
            .map_err(|e| CipherError::InvalidKeyMaterial(e.to_string()))?;
        Ok(Self {
            cipher,
            pending: Vec::with_capacity(BLOCK_LEN),
            consumed: 0,
        })
    }

    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        self.consumed += input.len() as u64;

        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(input);
        if data.is_empty() {
            return data;
        }

        let mut full = data.len() - data.len() % BLOCK_LEN;
        if full == data.len() {
            full -= BLOCK_LEN;
        }
        self.pending = data.split_off(full);

        for block in data.chunks_exact_mut(BLOCK_LEN) {
            self.cipher
                .decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        data
    }

    /// Decrypt the held-back block and strip its padding.
    pub fn finalize(self) -> Result<Vec<u8>, CipherError> {
        if self.pending.len() != BLOCK_LEN {
            return Err(CipherError::InvalidLength(self.consumed));
        }
        let mut block = self.pending;
        let plaintext = self
            .cipher
            .decrypt_padded_mut::<Pkcs7>(&mut block)
            .map_err(|_| CipherError::InvalidPadding)?;
        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_in_chunks(key: &EncryptionKey, iv: &Iv, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut enc = StreamEncryptor::new(key, iv).unwrap();
        let mut out = Vec::new();
        for piece in data.chunks(chunk.max(1)) {
            out.extend(enc.update(piece));
        }
        out.extend(enc.finalize().unwrap());
        out
    }

    fn decrypt_in_chunks(key: &EncryptionKey, iv: &Iv, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut dec = StreamDecryptor::new(key, iv).unwrap();
        let mut out = Vec::new();
        for piece in data.chunks(chunk.max(1)) {
            out.extend(dec.update(piece));
        }
        out.extend(dec.finalize().unwrap());
        out
    }

    #[test]
    fn test_empty_input_round_trips_to_one_padding_block() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let ciphertext = encrypt_in_chunks(&key, &iv, b"", 16);
        assert_eq!(ciphertext.len(), BLOCK_LEN);
        assert!(decrypt_in_chunks(&key, &iv, &ciphertext, 7).is_empty());
    }

    #[test]
    fn test_round_trip_with_uneven_chunking() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let plaintext: Vec<u8> = (0..100_003u32).map(|i| (i % 251) as u8).collect();

        let ciphertext = encrypt_in_chunks(&key, &iv, &plaintext, 8191);
        assert_eq!(ciphertext.len(), (plaintext.len() / BLOCK_LEN + 1) * BLOCK_LEN);
        assert_ne!(&ciphertext[..64], &plaintext[..64]);

        assert_eq!(decrypt_in_chunks(&key, &iv, &ciphertext, 1000), plaintext);
        assert_eq!(decrypt_in_chunks(&key, &iv, &ciphertext, 16), plaintext);
    }

    #[test]
    fn test_block_aligned_input_gets_a_full_padding_block() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let plaintext = [0x42u8; 32];
        let ciphertext = encrypt_in_chunks(&key, &iv, &plaintext, 32);
        assert_eq!(ciphertext.len(), 48);
        assert_eq!(decrypt_in_chunks(&key, &iv, &ciphertext, 48), plaintext);
    }

    #[test]
    fn test_chunking_does_not_change_ciphertext() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let plaintext = b"the quick brown fox jumps over the lazy dog".repeat(20);
        assert_eq!(
            encrypt_in_chunks(&key, &iv, &plaintext, 3),
            encrypt_in_chunks(&key, &iv, &plaintext, plaintext.len())
        );
    }

    #[test]
    fn test_same_plaintext_differs_under_different_iv() {
        let key = EncryptionKey::generate();
        let a = encrypt_in_chunks(&key, &Iv::generate(), b"identical", 4);
        let b = encrypt_in_chunks(&key, &Iv::generate(), b"identical", 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncated_ciphertext_is_rejected() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let ciphertext = encrypt_in_chunks(&key, &iv, b"some secret payload", 5);

        let mut dec = StreamDecryptor::new(&key, &iv).unwrap();
        dec.update(&ciphertext[..ciphertext.len() - 3]);
        assert!(matches!(dec.finalize(), Err(CipherError::InvalidLength(_))));

        let empty = StreamDecryptor::new(&key, &iv).unwrap();
        assert!(matches!(empty.finalize(), Err(CipherError::InvalidLength(0))));
    }

    #[test]
    fn test_wrong_key_never_yields_plaintext() {
        let iv = Iv::from_bytes([7u8; IV_LEN]);
        let ciphertext = encrypt_in_chunks(
            &EncryptionKey::from_bytes([1u8; KEY_LEN]),
            &iv,
            b"short",
            5,
        );
        let mut dec =
            StreamDecryptor::new(&EncryptionKey::from_bytes([2u8; KEY_LEN]), &iv).unwrap();
        let mut out = dec.update(&ciphertext);
        match dec.finalize() {
            Ok(tail) => {
                out.extend(tail);
                assert_ne!(out, b"short");
            }
            Err(err) => assert!(matches!(err, CipherError::InvalidPadding)),
        }
    }

    #[test]
    fn test_hex_and_debug() {
        let key = EncryptionKey::from_bytes([0xab; KEY_LEN]);
        assert_eq!(key.to_hex().len(), 64);
        assert_eq!(EncryptionKey::from_hex(&key.to_hex()).unwrap(), key);
        assert!(EncryptionKey::from_hex("abcd").is_err());
        assert!(Iv::from_hex(&"zz".repeat(IV_LEN)).is_err());
        assert_eq!(format!("{:?}", key), "EncryptionKey(<redacted>)");
    }

    #[test]
    fn test_generated_material_is_distinct() {
        let keys: std::collections::HashSet<String> =
            (0..64).map(|_| EncryptionKey::generate().to_hex()).collect();
        let ivs: std::collections::HashSet<String> =
            (0..64).map(|_| Iv::generate().to_hex()).collect();
        assert_eq!(keys.len(), 64);
        assert_eq!(ivs.len(), 64);
    }
}
