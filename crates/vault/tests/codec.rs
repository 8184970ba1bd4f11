mod fixtures;

use fixtures::*;
use tzpass_vault::codec::{MIN_LEN, VERSION};
use tzpass_vault::prelude::*;

#[test]
fn test_roundtrip_preserves_groups_and_ciphertexts() {
    let vault = sample_vault();
    let bytes = codec::encode(&vault, &device()).unwrap();
    let restored = codec::decode(&bytes, &device()).unwrap();

    assert_eq!(restored, vault);
    let names: Vec<&str> = restored.groups().map(PasswordGroup::name).collect();
    assert_eq!(names, ["bank", "mail"]);
    assert_eq!(restored.group("mail").unwrap().pair(1).unwrap().key(), "bob@example.com");
    assert_eq!(restored.reveal(&device(), "bank", 0).unwrap().as_str(), "pin: 0000");
}

#[test]
fn test_any_body_or_tag_byte_flip_is_integrity_error() {
    let bytes = codec::encode(&sample_vault(), &device()).unwrap();
    let (body, tag) = body_range(&bytes);

    for i in body.chain(tag) {
        let mut tampered = bytes.clone();
        tampered[i] ^= 0x01;
        let err = codec::decode(&tampered, &device()).unwrap_err();
        assert!(matches!(err, VaultError::Integrity { .. }), "byte {i}: {err}");
    }
}

#[test]
fn test_wrapped_key_flip_is_integrity_error() {
    let mut bytes = codec::encode(&sample_vault(), &device()).unwrap();
    bytes[8] ^= 0x80;
    assert!(matches!(codec::decode(&bytes, &device()), Err(VaultError::Integrity { .. })));
}

#[test]
fn test_every_truncation_is_format_error() {
    let bytes = codec::encode(&sample_vault(), &device()).unwrap();
    for len in 0..bytes.len() {
        let err = codec::decode(&bytes[..len], &device()).unwrap_err();
        assert!(matches!(err, VaultError::Format { .. }), "len {len}: {err}");
    }
}

#[test]
fn test_short_file_never_reaches_device() {
    let oracle = CountingOracle::new(device());
    let err = codec::decode(&[0u8; MIN_LEN - 1], &oracle).unwrap_err();
    assert!(matches!(err, VaultError::Format { .. }));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn test_trailing_bytes_are_format_error() {
    let mut bytes = codec::encode(&Vault::new(), &device()).unwrap();
    bytes.push(0);
    assert!(matches!(codec::decode(&bytes, &device()), Err(VaultError::Format { .. })));
}

#[test]
fn test_unknown_version_fails_before_any_device_call() {
    let mut bytes = codec::encode(&sample_vault(), &device()).unwrap();
    bytes[4..8].copy_from_slice(&(VERSION + 1).to_be_bytes());

    let oracle = CountingOracle::new(device());
    let err = codec::decode(&bytes, &oracle).unwrap_err();

    assert!(matches!(err, VaultError::UnsupportedVersion { found: 2, supported: 1, .. }));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn test_other_device_is_integrity_error() {
    let bytes = codec::encode(&sample_vault(), &device()).unwrap();
    let err = codec::decode(&bytes, &other_device()).unwrap_err();
    assert!(matches!(err, VaultError::Integrity { .. }));
}

#[test]
fn test_rejected_unwrap_aborts_load() {
    let bytes = codec::encode(&sample_vault(), &device()).unwrap();
    let err = codec::decode(&bytes, &device().rejecting()).unwrap_err();
    assert!(err.is_user_rejection());
}

#[test]
fn test_encode_uses_exactly_one_device_call() {
    let oracle = CountingOracle::new(device());
    let bytes = codec::encode(&sample_vault(), &oracle).unwrap();
    assert_eq!(oracle.calls(), 1);

    codec::decode(&bytes, &oracle).unwrap();
    assert_eq!(oracle.calls(), 2);
}

#[test]
fn test_iv_flip_is_integrity_error() {
    let bytes = codec::encode(&sample_vault(), &device()).unwrap();
    for i in 40..56 {
        let mut tampered = bytes.clone();
        tampered[i] ^= 0x01;
        let err = codec::decode(&tampered, &device()).unwrap_err();
        assert!(matches!(err, VaultError::Integrity { .. }), "byte {i}: {err}");
    }
}

/// `[..56]` header, `[56..58 + B]` backup section, the rest.
fn split_backup_section(bytes: &[u8]) -> (&[u8], &[u8], &[u8]) {
    let end = 58 + usize::from(u16::from_be_bytes([bytes[56], bytes[57]]));
    (&bytes[..56], &bytes[56..end], &bytes[end..])
}

#[test]
fn test_spliced_backup_slot_is_integrity_error() {
    let mut victim = sample_vault();
    victim.init_backup(&device()).unwrap();
    let mut attacker = Vault::new();
    attacker.init_backup(&other_device()).unwrap();

    let attacker_bytes = codec::encode(&attacker, &other_device()).unwrap();
    let (_, foreign_slot, _) = split_backup_section(&attacker_bytes);

    let with_backup = codec::encode(&victim, &device()).unwrap();
    let without_backup = codec::encode(&sample_vault(), &device()).unwrap();

    for original in [&with_backup, &without_backup] {
        let (header, _, rest) = split_backup_section(original);
        let spliced = [header, foreign_slot, rest].concat();
        let err = codec::decode(&spliced, &device()).unwrap_err();
        assert!(matches!(err, VaultError::Integrity { .. }), "{err}");
    }
}

#[test]
fn test_dropped_backup_slot_is_integrity_error() {
    let mut vault = sample_vault();
    vault.init_backup(&device()).unwrap();
    let bytes = codec::encode(&vault, &device()).unwrap();

    let (header, _, rest) = split_backup_section(&bytes);
    let stripped = [header, &[0, 0][..], rest].concat();
    let err = codec::decode(&stripped, &device()).unwrap_err();
    assert!(matches!(err, VaultError::Integrity { .. }), "{err}");
}
