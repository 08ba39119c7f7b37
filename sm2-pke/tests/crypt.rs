//! Encryption and decryption against recorded reference vectors.
//!
//! The curve, key and ciphertexts are the GB/T 32918 appendix A worked
//! example (the draft-standard test curve, not the final SM2 curve); the
//! ephemeral randomness is replayed byte-for-byte to reproduce the published
//! ciphertexts exactly.

use hex_literal::hex;
use proptest::prelude::*;
use rand_core::OsRng;
use sha2::Sha256;
use sm2_pke::{
    Curve, Error,
    pke::DecryptingKey,
    rng::ReplayRng,
};

const MSG: &[u8] = b"encryption standard";

const PRIVATE: [u8; 32] =
    hex!("1649AB77A00637BD5E2EFE283FBF353534AA7F7CB89463F208DDBC2920BB0DA0");

/// Bytes the rejection sampler consumes to arrive at the fixed ephemeral
/// scalar k = 4C62...7B4F (33 bytes, one draw).
const K_BYTES: [u8; 33] =
    hex!("004C62EEFD6ECFC2B95B92FD6C3D9575148AFA17425546D49018E5388D49DD7B4F");

const CTEXT_SM3: [u8; 125] = hex!(
    "307B0220245C26FB68B1DDDDB12C4B6BF9F2B6D5FE60A383B0D18D1C4144ABF17F6252E7"
    "022076CB9264C2A7E88E52B19903FDC47378F605E36811F5C07423A24B84400F01B8"
    "04209C3D7360C30156FAB7C80A0276712DA9D8094A634B766D3A285E07480653426D"
    "0413650053A89B41C418B0C3AAD00D886C00286467"
);

const CTEXT_SHA256: [u8; 125] = hex!(
    "307B0220245C26FB68B1DDDDB12C4B6BF9F2B6D5FE60A383B0D18D1C4144ABF17F6252E7"
    "022076CB9264C2A7E88E52B19903FDC47378F605E36811F5C07423A24B84400F01B8"
    "0420BE89139D07853100EFA763F60CBE30099EA3DF7F8F364F9D10A5E988E3C5AAFC"
    "0413229E6C9AEE2BB92CAD649FE2C035689785DA33"
);

fn test_curve() -> Curve {
    Curve::new(
        &hex!("8542D69E4C044F18E8B92435BF6FF7DE457283915C45517D722EDB8B08F1DFC3"),
        &hex!("787968B4FA32C3FD2417842E73BBFEFF2F3C848B6831D7E0EC65228B3937E498"),
        &hex!("63E4C6D3B23B0C849CF84241484BFE48F61D59A5B16BA06E6E12D1DA27C5249A"),
        &hex!("421DEBD61B62EAB6746434EBC3CC315E32220B3BADD50BDC4C4E6C147FEDD43D"),
        &hex!("0680512BCBB42C07D47349D2153B70C4E5D7FDFCBFA36EA1A85841B9E46E09A2"),
        &hex!("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7"),
        1,
    )
    .expect("valid parameters")
}

fn decrypting_key() -> DecryptingKey {
    DecryptingKey::new(test_curve(), &PRIVATE).expect("valid key")
}

#[test]
fn encrypt_sm3_matches_reference_ciphertext() {
    let key = decrypting_key();
    let mut rng = ReplayRng::new(K_BYTES.to_vec());
    let ciphertext = key
        .encrypting_key()
        .encrypt(&mut rng, MSG)
        .expect("encrypt");
    assert_eq!(ciphertext, CTEXT_SM3);
    assert_eq!(rng.remaining(), 0);
}

#[test]
fn encrypt_sha256_matches_reference_ciphertext() {
    let key = decrypting_key();
    let mut rng = ReplayRng::new(K_BYTES.to_vec());
    let ciphertext = key
        .encrypting_key()
        .encrypt_digest::<_, Sha256>(&mut rng, MSG)
        .expect("encrypt");
    assert_eq!(ciphertext, CTEXT_SHA256);
}

#[test]
fn decrypt_reference_ciphertexts() {
    let key = decrypting_key();
    assert_eq!(key.decrypt(&CTEXT_SM3).expect("decrypt"), MSG);
    assert_eq!(
        key.decrypt_digest::<Sha256>(&CTEXT_SHA256).expect("decrypt"),
        MSG
    );
}

#[test]
fn decrypting_with_the_wrong_digest_fails() {
    let key = decrypting_key();
    assert_eq!(
        key.decrypt_digest::<Sha256>(&CTEXT_SM3).map(|_| ()),
        Err(Error::AuthenticationFailed)
    );
}

#[test]
fn any_flipped_tag_bit_fails() {
    let key = decrypting_key();
    // tag value bytes of the record
    for index in 72..104 {
        let mut tampered = CTEXT_SM3;
        tampered[index] ^= 0x01;
        assert_eq!(
            key.decrypt(&tampered).map(|_| ()),
            Err(Error::AuthenticationFailed),
            "tag byte {index}"
        );
    }
}

#[test]
fn any_flipped_body_bit_fails() {
    let key = decrypting_key();
    // body value bytes of the record
    for index in 106..125 {
        let mut tampered = CTEXT_SM3;
        tampered[index] ^= 0x80;
        assert_eq!(
            key.decrypt(&tampered).map(|_| ()),
            Err(Error::AuthenticationFailed),
            "body byte {index}"
        );
    }
}

#[test]
fn tampered_ephemeral_point_fails_like_a_bad_tag() {
    let key = decrypting_key();
    let mut tampered = CTEXT_SM3;
    // last byte of the x1 coordinate
    tampered[35] ^= 0x01;
    assert_eq!(
        key.decrypt(&tampered).map(|_| ()),
        Err(Error::AuthenticationFailed)
    );
}

#[test]
fn truncated_ciphertext_is_malformed() {
    let key = decrypting_key();
    assert_eq!(
        key.decrypt(&CTEXT_SM3[..CTEXT_SM3.len() - 1]).map(|_| ()),
        Err(Error::InvalidEncoding)
    );
}

#[test]
fn ciphertext_len_bounds_the_actual_encoding() {
    let key = decrypting_key();
    let bound = key
        .encrypting_key()
        .ciphertext_len::<sm3::Sm3>(MSG.len())
        .expect("bound");
    assert!(bound >= CTEXT_SM3.len());
}

#[test]
fn encrypt_into_writes_the_reference_ciphertext() {
    let key = decrypting_key();
    let mut rng = ReplayRng::new(K_BYTES.to_vec());
    let bound = key
        .encrypting_key()
        .ciphertext_len::<sm3::Sm3>(MSG.len())
        .expect("bound");
    let mut out = vec![0u8; bound];
    let written = key
        .encrypting_key()
        .encrypt_into(&mut rng, MSG, &mut out)
        .expect("encrypt");
    assert_eq!(&out[..written], CTEXT_SM3);
}

#[test]
fn encrypt_into_rejects_short_buffers() {
    let key = decrypting_key();
    let mut rng = ReplayRng::new(K_BYTES.to_vec());
    let mut out = vec![0u8; CTEXT_SM3.len() - 1];
    assert_eq!(
        key.encrypting_key()
            .encrypt_into(&mut rng, MSG, &mut out)
            .map(|_| ()),
        Err(Error::BufferTooSmall)
    );
    // the size check happens before any randomness is drawn
    assert_eq!(rng.remaining(), K_BYTES.len());
}

#[test]
fn decrypt_into_recovers_the_message() {
    let key = decrypting_key();
    let len = key.plaintext_len(&CTEXT_SM3).expect("length");
    assert_eq!(len, MSG.len());
    let mut out = vec![0u8; len];
    let written = key.decrypt_into(&CTEXT_SM3, &mut out).expect("decrypt");
    assert_eq!(&out[..written], MSG);
}

#[test]
fn decrypt_into_rejects_short_buffers() {
    let key = decrypting_key();
    let mut out = vec![0u8; MSG.len() - 1];
    assert_eq!(
        key.decrypt_into(&CTEXT_SM3, &mut out).map(|_| ()),
        Err(Error::BufferTooSmall)
    );
}

#[test]
fn empty_message_round_trips() {
    let key = decrypting_key();
    let ciphertext = key
        .encrypting_key()
        .encrypt(&mut OsRng, b"")
        .expect("encrypt");
    assert_eq!(key.decrypt(&ciphertext).expect("decrypt"), b"");
}

#[test]
fn multi_block_kdf_message_round_trips() {
    let key = decrypting_key();
    let msg = vec![0xA5u8; 100];
    let ciphertext = key
        .encrypting_key()
        .encrypt(&mut OsRng, &msg)
        .expect("encrypt");
    assert_eq!(key.decrypt(&ciphertext).expect("decrypt"), msg);
}

#[test]
fn fresh_randomness_gives_distinct_ciphertexts() {
    let key = decrypting_key();
    let a = key.encrypting_key().encrypt(&mut OsRng, MSG).expect("encrypt");
    let b = key.encrypting_key().encrypt(&mut OsRng, MSG).expect("encrypt");
    assert_ne!(a, b);
}

#[test]
fn wrong_key_fails_to_decrypt() {
    let key = decrypting_key();
    let other = DecryptingKey::new(
        test_curve(),
        &hex!("1649AB77A00637BD5E2EFE283FBF353534AA7F7CB89463F208DDBC2920BB0DA1"),
    )
    .expect("valid key");
    let ciphertext = key
        .encrypting_key()
        .encrypt(&mut OsRng, MSG)
        .expect("encrypt");
    assert_eq!(
        other.decrypt(&ciphertext).map(|_| ()),
        Err(Error::AuthenticationFailed)
    );
}

#[test]
fn exhausted_randomness_is_reported() {
    let key = decrypting_key();
    let mut rng = ReplayRng::new(vec![0u8; 16]);
    assert_eq!(
        key.encrypting_key().encrypt(&mut rng, MSG).map(|_| ()),
        Err(Error::RandomnessExhausted)
    );
}

#[test]
fn out_of_range_secret_scalars_are_rejected() {
    let zero = [0u8; 32];
    assert_eq!(
        DecryptingKey::new(test_curve(), &zero).map(|_| ()),
        Err(Error::InvalidScalar)
    );
    let order = hex!("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7");
    assert_eq!(
        DecryptingKey::new(test_curve(), &order).map(|_| ()),
        Err(Error::InvalidScalar)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn round_trips_arbitrary_messages(msg in proptest::collection::vec(any::<u8>(), 0..256)) {
        let key = decrypting_key();
        let ciphertext = key
            .encrypting_key()
            .encrypt(&mut OsRng, &msg)
            .expect("encrypt");
        prop_assert_eq!(key.decrypt(&ciphertext).expect("decrypt"), msg);
    }

    #[test]
    fn ciphertext_len_bounds_hold_for_any_length(len in 0usize..512) {
        let key = decrypting_key();
        let msg = vec![0u8; len];
        let bound = key
            .encrypting_key()
            .ciphertext_len::<sm3::Sm3>(len)
            .expect("bound");
        let ciphertext = key
            .encrypting_key()
            .encrypt(&mut OsRng, &msg)
            .expect("encrypt");
        prop_assert!(ciphertext.len() <= bound);
        prop_assert_eq!(key.plaintext_len(&ciphertext).expect("length"), len);
    }
}
