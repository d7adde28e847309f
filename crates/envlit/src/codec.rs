//! The obfuscation codec: AES-256-CBC envelopes for literal embedding.
//!
//! `encrypt` runs at generation time and produces `base64(iv || ciphertext)`;
//! `decrypt` runs inside the compiled program against the same envelope. The
//! key comes from [`crate::surface::derive_key`] on both sides. A cipher
//! context is constructed per call; an IV is never reused across two
//! encryptions under the same key.
//!
//! This is deterrence against casual inspection of emitted literals, not a
//! security boundary: anyone holding the compiled artifact can recompute the
//! key from its public surface.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::Error;
use crate::surface::DerivedKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Length of the initialization vector prefix inside an envelope.
const IV_LEN: usize = 16;

/// Encrypts a plaintext value into a base64 envelope.
///
/// With a seed, the IV comes from a seeded generator so that repeated runs
/// against an unchanged value and surface produce byte-identical ciphertext
/// (diff-friendly generated output). Without one, the IV is drawn from a
/// non-reproducible generator.
#[must_use]
pub fn encrypt(plaintext: &str, key: &DerivedKey, seed: Option<u64>) -> String {
    let mut iv = [0u8; IV_LEN];
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed).fill_bytes(&mut iv),
        None => rand::thread_rng().fill_bytes(&mut iv),
    }

    let cipher = Aes256CbcEnc::new(key.as_bytes().into(), &iv.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    tracing::trace!(len = plaintext.len(), seeded = seed.is_some(), "encrypted value");

    let mut envelope = Vec::with_capacity(IV_LEN + ciphertext.len());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext);
    BASE64.encode(envelope)
}

/// Decrypts a base64 envelope back to the plaintext value.
///
/// # Errors
///
/// Any failure — invalid base64, an envelope shorter than the IV, bad
/// padding from a wrong key, or non-UTF-8 plaintext — is a fatal
/// [`Error::DecryptionFailure`]. There is no partial-success mode.
pub fn decrypt(envelope: &str, key: &DerivedKey) -> Result<String, Error> {
    let bytes = BASE64
        .decode(envelope)
        .map_err(|e| Error::decryption(format!("invalid base64: {e}")))?;

    if bytes.len() <= IV_LEN {
        return Err(Error::decryption("envelope shorter than the IV"));
    }
    let (iv, ciphertext) = bytes.split_at(IV_LEN);

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| Error::decryption(format!("invalid key or IV length: {e}")))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::decryption("bad padding (wrong key or corrupted ciphertext)"))?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::decryption("decrypted bytes are not valid UTF-8"))
}
