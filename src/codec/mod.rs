//! Secure integer codec
//!
//! Encrypts 5-byte big-endian signed integers with AES-256-CBC and PKCS#7
//! padding. Every encryption draws a fresh IV, and the blob is sealed with an
//! HMAC-SHA256 tag over `IV || ciphertext`:
//!
//! ```text
//! ┌──────────┬────────────────┬───────────┐
//! │ IV (16)  │ ciphertext (16)│ tag (32)  │
//! └──────────┴────────────────┴───────────┘
//! ```
//!
//! Keys live for the lifetime of the codec and are wiped on drop. Plaintext
//! buffers are zeroed before they go out of scope.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::{debug, trace};
use zeroize::{Zeroize, Zeroizing};

use crate::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Width of the encoded integer
pub const VALUE_BYTES: usize = 5;
/// Smallest encodable value, -2^39
pub const MIN_VALUE: i64 = -(1 << 39);
/// Largest encodable value, 2^39 - 1
pub const MAX_VALUE: i64 = (1 << 39) - 1;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const TAG_LEN: usize = 32;

/// Total length of an encrypted blob
pub const BLOB_LEN: usize = IV_LEN + BLOCK_LEN + TAG_LEN;

/// An encrypted integer as produced by [`IntegerCodec::encrypt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedValue(Vec<u8>);

impl EncryptedValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim()).map_err(|e| Error::decode(format!("invalid hex: {e}")))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for EncryptedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for EncryptedValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub struct IntegerCodec {
    cipher_key: Zeroizing<[u8; KEY_LEN]>,
    mac_key: Zeroizing<[u8; KEY_LEN]>,
}

impl IntegerCodec {
    /// New codec with keys drawn from the OS random source
    pub fn new() -> Self {
        let mut cipher_key = Zeroizing::new([0u8; KEY_LEN]);
        let mut mac_key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(cipher_key.as_mut_slice());
        OsRng.fill_bytes(mac_key.as_mut_slice());
        debug!("generated codec keys");
        Self { cipher_key, mac_key }
    }

    pub fn from_keys(cipher_key: [u8; KEY_LEN], mac_key: [u8; KEY_LEN]) -> Self {
        Self {
            cipher_key: Zeroizing::new(cipher_key),
            mac_key: Zeroizing::new(mac_key),
        }
    }

    pub fn encrypt(&self, value: i64) -> Result<EncryptedValue> {
        if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
            return Err(Error::InputRange {
                value,
                min: MIN_VALUE,
                max: MAX_VALUE,
            });
        }

        let mut raw = value.to_be_bytes();
        let mut block = Zeroizing::new([0u8; BLOCK_LEN]);
        block[..VALUE_BYTES].copy_from_slice(&raw[raw.len() - VALUE_BYTES..]);
        raw.zeroize();

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(self.cipher_key.as_slice(), &iv)
            .map_err(|_| Error::Cipher("invalid key or IV length".to_string()))?
            .encrypt_padded_mut::<Pkcs7>(block.as_mut_slice(), VALUE_BYTES)
            .map_err(|_| Error::Cipher("padding does not fit one block".to_string()))?;

        let mut blob = Vec::with_capacity(BLOB_LEN);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(ciphertext);
        let tag = self.tag(&blob)?;
        blob.extend_from_slice(&tag);

        trace!(len = blob.len(), "encrypted value");
        Ok(EncryptedValue(blob))
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<i64> {
        if blob.len() != BLOB_LEN {
            return Err(Error::decode(format!("expected {BLOB_LEN} bytes, got {}", blob.len())));
        }

        let (sealed, tag) = blob.split_at(IV_LEN + BLOCK_LEN);
        self.mac()?
            .chain_update(sealed)
            .verify_slice(tag)
            .map_err(|_| Error::decode("authentication tag mismatch"))?;

        let (iv, ciphertext) = sealed.split_at(IV_LEN);
        let mut buffer = Zeroizing::new([0u8; BLOCK_LEN]);
        buffer.copy_from_slice(ciphertext);

        let plain = Aes256CbcDec::new_from_slices(self.cipher_key.as_slice(), iv)
            .map_err(|_| Error::Cipher("invalid key or IV length".to_string()))?
            .decrypt_padded_mut::<Pkcs7>(buffer.as_mut_slice())
            .map_err(|_| Error::decode("invalid padding"))?;

        if plain.len() != VALUE_BYTES {
            return Err(Error::decode(format!(
                "expected {VALUE_BYTES} payload bytes, got {}",
                plain.len()
            )));
        }

        // Sign-extend the 5-byte big-endian payload
        let fill = if plain[0] & 0x80 != 0 { 0xff } else { 0x00 };
        let mut wide = Zeroizing::new([fill; 8]);
        wide[8 - VALUE_BYTES..].copy_from_slice(plain);

        Ok(i64::from_be_bytes(*wide))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.mac_key.as_slice())
            .map_err(|_| Error::Cipher("invalid MAC key length".to_string()))
    }

    fn tag(&self, sealed: &[u8]) -> Result<[u8; TAG_LEN]> {
        Ok(self.mac()?.chain_update(sealed).finalize().into_bytes().into())
    }
}

impl Default for IntegerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IntegerCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegerCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::block_padding::NoPadding;
    use proptest::prelude::*;

    fn fixed_codec() -> IntegerCodec {
        IntegerCodec::from_keys([7u8; KEY_LEN], [9u8; KEY_LEN])
    }

    /// Encrypt an arbitrary 16-byte block without padding and seal it
    fn seal_raw_block(codec: &IntegerCodec, block: [u8; BLOCK_LEN]) -> Vec<u8> {
        let iv = [1u8; IV_LEN];
        let mut buffer = block;
        let ciphertext = Aes256CbcEnc::new_from_slices(codec.cipher_key.as_slice(), &iv)
            .unwrap()
            .encrypt_padded_mut::<NoPadding>(&mut buffer, BLOCK_LEN)
            .unwrap()
            .to_vec();

        let mut blob = iv.to_vec();
        blob.extend_from_slice(&ciphertext);
        let tag = codec.tag(&blob).unwrap();
        blob.extend_from_slice(&tag);
        blob
    }

    #[test]
    fn test_roundtrip_edges() {
        let codec = IntegerCodec::new();
        for value in [0, 1, -1, 42, -42, MIN_VALUE, MAX_VALUE, 20_000_000, -20_000_000] {
            let encrypted = codec.encrypt(value).unwrap();
            assert_eq!(encrypted.as_bytes().len(), BLOB_LEN);
            assert_eq!(codec.decrypt(encrypted.as_bytes()).unwrap(), value);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        let codec = IntegerCodec::new();
        for value in [1 << 40, MAX_VALUE + 1, MIN_VALUE - 1, i64::MIN, i64::MAX] {
            let err = codec.encrypt(value).unwrap_err();
            assert!(matches!(err, Error::InputRange { value: v, .. } if v == value));
        }
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let codec = IntegerCodec::new();
        let first = codec.encrypt(1234).unwrap();
        let second = codec.encrypt(1234).unwrap();
        assert_ne!(first, second);
        assert_ne!(first.as_bytes()[..IV_LEN], second.as_bytes()[..IV_LEN]);
    }

    #[test]
    fn test_every_flipped_byte_is_rejected() {
        let codec = fixed_codec();
        let blob = codec.encrypt(-987_654_321).unwrap().into_bytes();

        for index in 0..blob.len() {
            let mut corrupted = blob.clone();
            corrupted[index] ^= 0x01;
            let err = codec.decrypt(&corrupted).unwrap_err();
            assert!(matches!(err, Error::Decode(_)), "byte {index} accepted");
        }
    }

    #[test]
    fn test_truncated_and_extended_blobs_rejected() {
        let codec = IntegerCodec::new();
        let blob = codec.encrypt(5).unwrap().into_bytes();

        assert!(matches!(codec.decrypt(&blob[..blob.len() - 1]), Err(Error::Decode(_))));
        assert!(matches!(codec.decrypt(&blob[..IV_LEN]), Err(Error::Decode(_))));
        assert!(matches!(codec.decrypt(&[]), Err(Error::Decode(_))));

        let mut extended = blob.clone();
        extended.push(0);
        assert!(matches!(codec.decrypt(&extended), Err(Error::Decode(_))));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let blob = IntegerCodec::new().encrypt(77).unwrap();
        let err = IntegerCodec::new().decrypt(blob.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("authentication tag mismatch"));
    }

    #[test]
    fn test_bad_padding_rejected() {
        let codec = fixed_codec();
        let blob = seal_raw_block(&codec, [0u8; BLOCK_LEN]);
        let err = codec.decrypt(&blob).unwrap_err();
        assert!(err.to_string().contains("invalid padding"));
    }

    #[test]
    fn test_wrong_payload_length_rejected() {
        let codec = fixed_codec();
        // Valid PKCS#7 padding around a 6-byte payload
        let mut block = [10u8; BLOCK_LEN];
        block[..6].copy_from_slice(&[0, 0, 0, 0, 0, 1]);
        let blob = seal_raw_block(&codec, block);
        let err = codec.decrypt(&blob).unwrap_err();
        assert!(err.to_string().contains("payload bytes"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let codec = IntegerCodec::new();
        let encrypted = codec.encrypt(-31).unwrap();
        let hex = encrypted.to_string();
        assert_eq!(hex.len(), BLOB_LEN * 2);

        let parsed = EncryptedValue::from_hex(&hex).unwrap();
        assert_eq!(codec.decrypt(parsed.as_ref()).unwrap(), -31);

        assert!(matches!(EncryptedValue::from_hex("zz"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", fixed_codec());
        assert_eq!(rendered, "IntegerCodec { .. }");
    }

    proptest! {
        #[test]
        fn prop_roundtrip_full_range(value in MIN_VALUE..=MAX_VALUE) {
            let codec = fixed_codec();
            let encrypted = codec.encrypt(value).unwrap();
            prop_assert_eq!(codec.decrypt(encrypted.as_bytes()).unwrap(), value);
        }

        #[test]
        fn prop_outside_range_rejected(value in prop_oneof![i64::MIN..MIN_VALUE, (MAX_VALUE + 1)..=i64::MAX]) {
            let codec = fixed_codec();
            let is_range_error = matches!(codec.encrypt(value), Err(Error::InputRange { .. }));
            prop_assert!(is_range_error);
        }
    }
}
