mod fixtures;

use fixtures::*;
use proptest::prelude::*;
use tzpass_vault::prelude::*;

fn groups() -> impl Strategy<Value = Vec<(String, Vec<(String, Vec<u8>)>)>> {
    proptest::collection::vec(
        (
            "[a-z]{1,12}",
            proptest::collection::vec(
                ("[ -~]{0,24}", proptest::collection::vec(any::<u8>(), 0..64)),
                0..4,
            ),
        ),
        0..5,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn codec_roundtrips_arbitrary_vaults(groups in groups()) {
        let mut vault = Vault::new();
        for (name, pairs) in groups {
            let Ok(group) = vault.add_group(&name) else { continue };
            for (key, value) in pairs {
                group.add_pair(key, value);
            }
        }

        let bytes = codec::encode(&vault, &device()).unwrap();
        let restored = codec::decode(&bytes, &device()).unwrap();
        prop_assert_eq!(restored, vault);
    }

    #[test]
    fn passwords_roundtrip_and_never_repeat(password in "[ -~]{0,64}", group in "[a-z]{1,8}") {
        let oracle = device();
        let a = encrypt_password(&oracle, password.as_bytes(), &group).unwrap();
        let b = encrypt_password(&oracle, password.as_bytes(), &group).unwrap();

        prop_assert_ne!(&a, &b);
        let plain_a = decrypt_password(&oracle, &a, &group).unwrap();
        let plain_b = decrypt_password(&oracle, &b, &group).unwrap();
        prop_assert_eq!(plain_a.as_slice(), password.as_bytes());
        prop_assert_eq!(plain_b.as_slice(), password.as_bytes());
    }
}
