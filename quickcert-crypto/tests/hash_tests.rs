use quickcert_crypto::{CryptoError, HashAlgorithm, SaltLength};

// ── HashAlgorithm ────────────────────────────────────────────────

#[test]
fn parses_every_supported_name() {
    let cases = [
        ("SHA-256", HashAlgorithm::Sha256),
        ("SHA-384", HashAlgorithm::Sha384),
        ("SHA-512", HashAlgorithm::Sha512),
        ("SHA3-256", HashAlgorithm::Sha3_256),
        ("SHA3-384", HashAlgorithm::Sha3_384),
        ("SHA3-512", HashAlgorithm::Sha3_512),
    ];
    for (name, expected) in cases {
        assert_eq!(name.parse::<HashAlgorithm>().unwrap(), expected);
        assert_eq!(expected.name(), name);
    }
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!("sha3-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha3_512);
}

#[test]
fn unknown_name_is_an_error_not_a_fallback() {
    let err = "MD5".parse::<HashAlgorithm>().unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedHash(ref s) if s == "MD5"));
}

#[test]
fn digest_lengths_match_output_len() {
    for alg in [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
    ] {
        assert_eq!(alg.digest(b"abc").len(), alg.output_len(), "{alg}");
    }
}

#[test]
fn sha256_known_digest() {
    let digest = HashAlgorithm::Sha256.digest(b"abc");
    assert_eq!(
        digest[..4],
        [0xba, 0x78, 0x16, 0xbf],
    );
}

#[test]
fn default_is_sha256() {
    assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
}

#[test]
fn deserializes_from_config_string() {
    let alg: HashAlgorithm = serde_json::from_str("\"SHA3-256\"").unwrap();
    assert_eq!(alg, HashAlgorithm::Sha3_256);
    let bad: Result<HashAlgorithm, _> = serde_json::from_str("\"WHIRLPOOL\"");
    assert!(bad.is_err());
}

// ── SaltLength ───────────────────────────────────────────────────

#[test]
fn salt_modes_parse() {
    assert_eq!("hash-length".parse::<SaltLength>().unwrap(), SaltLength::HashLength);
    assert_eq!("AUTO".parse::<SaltLength>().unwrap(), SaltLength::Auto);
    assert!("random".parse::<SaltLength>().is_err());
}

#[test]
fn hash_length_salt_equals_digest_size() {
    assert_eq!(SaltLength::HashLength.resolve(HashAlgorithm::Sha384, 2048), 48);
}

#[test]
fn auto_salt_fills_the_encoded_message() {
    // emLen = ceil(2047 / 8) = 256; 256 - 32 - 2
    assert_eq!(SaltLength::Auto.resolve(HashAlgorithm::Sha256, 2048), 222);
    assert_eq!(SaltLength::Auto.resolve(HashAlgorithm::Sha3_512, 2048), 190);
}
