use hex_literal::hex;

/// NIST SP 800-38A F.2.5 (CBC-AES256.Encrypt), first two blocks.
pub const NIST_KEY: [u8; 32] =
    hex!("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4");
pub const NIST_IV: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
pub const NIST_PLAINTEXT: [u8; 32] = hex!(
    "6bc1bee22e409f96e93d7e117393172a"
    "ae2d8a571e03ac9c9eb76fac45af8e51"
);
pub const NIST_CIPHERTEXT: [u8; 32] = hex!(
    "f58c4c04d6e5f1ba779eabfb5f7bfbd6"
    "9cfc4e967edb808d679f777bc6702c7d"
);

/// RFC 4231 test case 2.
pub const RFC4231_KEY: &[u8] = b"Jefe";
pub const RFC4231_DATA: &[u8] = b"what do ya want for nothing?";
pub const RFC4231_TAG: [u8; 32] =
    hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");

#[must_use]
pub const fn key(byte: u8) -> [u8; 32] {
    [byte; 32]
}

#[must_use]
pub const fn iv(byte: u8) -> [u8; 16] {
    [byte; 16]
}
