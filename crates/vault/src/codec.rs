//! TZPW file codec.
//!
//! ```text
//! [MAGIC "TZPW"(4)][VERSION u32(4)][WRAPPED_KEY(32)][IV(16)]
//! [B u16(2)][BACKUP(B)][N u32(4)][BODY(N)][TAG(32)]
//! ```
//!
//! Integers are big-endian. `BODY` is the AES-256-CBC encryption of the postcard-serialized
//! group list and `TAG` is HMAC-SHA256 over every byte before it, from `MAGIC` to the end of
//! `BODY`. Both keys are expanded from the 32-byte outer key that sits wrapped by the device
//! in `WRAPPED_KEY`. `BACKUP` is the postcard form of the [`BackupKeyMaterial`], or empty.
//! A swapped backup slot or a flipped IV bit is an integrity failure like a modified body.
//!
//! Decoding parses and bounds-checks the whole layout before asking the device for anything,
//! and verifies the tag before decrypting.

use crate::backup::BackupKeyMaterial;
use crate::error::{VaultError, VaultErrorExt};
use crate::model::{PasswordGroup, Vault};
use tracing::{debug, warn};
use tzpass_crypto::{
    IV_LEN, KEY_LEN, OuterKey, SessionKeys, TAG_LEN, decrypt, encrypt, random_array, tag,
};
use tzpass_oracle::{KeyWrapOracle, WrapContext};
use zeroize::Zeroizing;

pub const MAGIC: [u8; 4] = *b"TZPW";
pub const VERSION: u32 = 1;

/// Size of the device-wrapped outer key.
pub const WRAPPED_KEY_LEN: usize = KEY_LEN;

/// Smallest possible file: every fixed field, empty backup slot, empty body.
pub const MIN_LEN: usize = 4 + 4 + WRAPPED_KEY_LEN + IV_LEN + 2 + 4 + TAG_LEN;

/// Serializes and encrypts `vault` under a fresh outer key and IV.
///
/// # Errors
/// * [`VaultError::Device`] if wrapping the outer key fails.
/// * [`VaultError::Format`] if the device returns a wrapped key of the wrong size or a
///   section outgrows its length field.
pub fn encode<O>(vault: &Vault, oracle: &O) -> Result<Vec<u8>, VaultError>
where
    O: KeyWrapOracle + ?Sized,
{
    let keys = SessionKeys::generate()?;
    let iv = random_array::<IV_LEN>()?;

    let wrapped_key = oracle
        .wrap(&WrapContext::outer_key(), keys.outer().as_bytes())
        .context("Wrapping outer key")?;
    if wrapped_key.len() != WRAPPED_KEY_LEN {
        return Err(VaultError::Format {
            message: format!(
                "device returned a {} byte wrapped key, expected {WRAPPED_KEY_LEN}",
                wrapped_key.len()
            )
            .into(),
            context: Some("Wrapping outer key".into()),
        });
    }

    let backup = match &vault.backup {
        Some(material) => postcard::to_stdvec(material).context("Serializing backup material")?,
        None => Vec::new(),
    };
    let backup_len = u16::try_from(backup.len())
        .map_err(|_| VaultError::format(format!("backup material is {} bytes", backup.len())))?;

    let groups: Vec<&PasswordGroup> = vault.groups.values().collect();
    let plaintext = Zeroizing::new(postcard::to_stdvec(&groups).context("Serializing groups")?);
    let body = encrypt(&plaintext, &iv, keys.encryption_key())?;
    let body_len = u32::try_from(body.len())
        .map_err(|_| VaultError::format(format!("vault body is {} bytes", body.len())))?;

    let mut out = Vec::with_capacity(MIN_LEN + backup.len() + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&wrapped_key);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&backup_len.to_be_bytes());
    out.extend_from_slice(&backup);
    out.extend_from_slice(&body_len.to_be_bytes());
    out.extend_from_slice(&body);
    let file_tag = tag::compute(keys.authentication_key(), &out)?;
    out.extend_from_slice(&file_tag);

    debug!(groups = groups.len(), body = body.len(), backup = backup.len(), "Vault encoded");
    Ok(out)
}

/// Parses, authenticates and decrypts a vault file.
///
/// # Errors
/// * [`VaultError::Format`] on a bad magic, a short read, trailing bytes or a malformed body.
/// * [`VaultError::UnsupportedVersion`] before the device is contacted.
/// * [`VaultError::Device`] if unwrapping the outer key fails.
/// * [`VaultError::Integrity`] if the tag does not match; nothing is decrypted then.
pub fn decode<O>(bytes: &[u8], oracle: &O) -> Result<Vault, VaultError>
where
    O: KeyWrapOracle + ?Sized,
{
    let file = RawFile::parse(bytes)?;

    let unwrapped = oracle
        .unwrap(&WrapContext::outer_key(), file.wrapped_key)
        .context("Unwrapping outer key")?;
    let outer = OuterKey::from_slice(&unwrapped).map_err(|e| VaultError::Format {
        message: e.to_string().into(),
        context: Some("Unwrapping outer key".into()),
    })?;
    let keys = SessionKeys::derive(outer)?;

    if !tag::verify(keys.authentication_key(), file.authenticated, file.tag)? {
        warn!(len = file.authenticated.len(), "Vault integrity check failed");
        return Err(VaultError::Integrity {
            message: "tag does not match the file contents".into(),
            context: Some("wrong device or modified file".into()),
        });
    }

    let plaintext = decrypt(file.body, file.iv, keys.encryption_key()).map_err(|e| {
        VaultError::Format { message: e.to_string().into(), context: Some("Decrypting body".into()) }
    })?;
    let groups: Vec<PasswordGroup> =
        postcard::from_bytes(&plaintext).context("Deserializing groups")?;

    let backup = if file.backup.is_empty() {
        None
    } else {
        Some(postcard::from_bytes(file.backup).context("Deserializing backup material")?)
    };

    debug!(groups = groups.len(), body = file.body.len(), "Vault decoded");
    Vault::from_parts(groups, backup)
}

/// Borrowed view of every field of a file.
struct RawFile<'a> {
    /// Everything the tag covers.
    authenticated: &'a [u8],
    wrapped_key: &'a [u8],
    iv: &'a [u8],
    backup: &'a [u8],
    body: &'a [u8],
    tag: &'a [u8],
}

impl<'a> RawFile<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, VaultError> {
        let mut reader = Reader { buf: bytes, pos: 0 };

        if reader.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(VaultError::format("not a TZPW vault file"));
        }
        let version = reader.u32("version")?;
        if version != VERSION {
            return Err(VaultError::UnsupportedVersion {
                found: version,
                supported: VERSION,
                context: None,
            });
        }

        let wrapped_key = reader.take(WRAPPED_KEY_LEN, "wrapped key")?;
        let iv = reader.take(IV_LEN, "IV")?;
        let backup_len = usize::from(reader.u16("backup length")?);
        let backup = reader.take(backup_len, "backup material")?;
        let body_len = usize::try_from(reader.u32("body length")?)
            .map_err(|_| VaultError::format("body length does not fit in memory"))?;
        let body = reader.take(body_len, "body")?;
        let authenticated = &bytes[..reader.pos];
        let tag = reader.take(TAG_LEN, "tag")?;
        reader.finish()?;

        Ok(Self { authenticated, wrapped_key, iv, backup, body, tag })
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], VaultError> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.buf.len()).ok_or_else(|| {
            VaultError::Format {
                message: format!(
                    "truncated file: {field} needs {len} bytes at offset {}, {} left",
                    self.pos,
                    self.buf.len() - self.pos
                )
                .into(),
                context: None,
            }
        })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, VaultError> {
        let bytes = self.take(2, field)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, VaultError> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn finish(self) -> Result<(), VaultError> {
        let rest = self.buf.len() - self.pos;
        if rest == 0 {
            Ok(())
        } else {
            Err(VaultError::format(format!("{rest} trailing bytes after the tag")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzpass_oracle::SoftOracle;

    fn device() -> SoftOracle {
        SoftOracle::new([0x5C; 32])
    }

    #[test]
    fn test_empty_vault_has_minimum_size() {
        let bytes = encode(&Vault::new(), &device()).unwrap();
        // The body of an empty list is one serialized byte padded to one block.
        assert_eq!(bytes.len(), MIN_LEN + 16);
        assert_eq!(&bytes[..4], b"TZPW");
        assert_eq!(&bytes[4..8], &[0, 0, 0, 1]);
        assert_eq!(&bytes[56..58], &[0, 0]);
    }

    #[test]
    fn test_layout_offsets() {
        let mut vault = Vault::new();
        vault.add_group("g").unwrap().add_pair("k", vec![7; 32]);
        let bytes = encode(&vault, &device()).unwrap();

        let body_len = u32::from_be_bytes(bytes[58..62].try_into().unwrap()) as usize;
        assert_eq!(body_len % 16, 0);
        assert_eq!(bytes.len(), 62 + body_len + TAG_LEN);
    }

    #[test]
    fn test_fresh_key_and_iv_per_encode() {
        let vault = Vault::new();
        let a = encode(&vault, &device()).unwrap();
        let b = encode(&vault, &device()).unwrap();
        assert_ne!(a[8..40], b[8..40]);
        assert_ne!(a[40..56], b[40..56]);
    }

    #[test]
    fn test_reader_rejects_overflowing_length() {
        let mut reader = Reader { buf: &[0; 4], pos: 2 };
        assert!(matches!(reader.take(usize::MAX, "x"), Err(VaultError::Format { .. })));
        assert!(reader.take(2, "x").is_ok());
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_tag_covers_everything_before_it() {
        let bytes = encode(&Vault::new(), &device()).unwrap();
        let file = RawFile::parse(&bytes).unwrap();
        assert_eq!(file.authenticated.len(), bytes.len() - TAG_LEN);
        assert_eq!(file.tag, &bytes[bytes.len() - TAG_LEN..]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&Vault::new(), &device()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes, &device()), Err(VaultError::Format { .. })));
    }
}
