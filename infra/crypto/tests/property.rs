mod fixtures;

use fixtures::{iv, key};
use proptest::prelude::*;
use tzpass_crypto::{BLOCK_SIZE, decrypt, encrypt, pad, tag, unpad};

proptest! {
    #[test]
    fn padding_is_reversible(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let padded = pad(&data);
        prop_assert_eq!(padded.len() % BLOCK_SIZE, 0);
        prop_assert!(padded.len() > data.len());
        prop_assert_eq!(unpad(&padded).unwrap(), data.as_slice());
    }

    #[test]
    fn envelope_roundtrips_arbitrary_bytes(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        k in any::<u8>(),
        v in any::<u8>(),
    ) {
        let ciphertext = encrypt(&data, &iv(v), &key(k)).unwrap();
        prop_assert_eq!(ciphertext.len(), (data.len() / BLOCK_SIZE + 1) * BLOCK_SIZE);
        let plaintext = decrypt(&ciphertext, &iv(v), &key(k)).unwrap();
        prop_assert_eq!(plaintext.as_slice(), data.as_slice());
    }

    #[test]
    fn any_ciphertext_flip_breaks_the_tag(
        data in proptest::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mac_key = key(0x5A);
        let computed = tag::compute(&mac_key, &data).unwrap();

        let mut tampered = data.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 1 << bit;

        prop_assert!(!tag::verify(&mac_key, &tampered, &computed).unwrap());
    }
}
