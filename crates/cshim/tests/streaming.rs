#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use cshim::{Cipher, Direction, ErrorKind, Hash, Mac, State, Validity};
use proptest::prelude::*;
use test_log::test;

const KEY: [u8; 32] = [0x42; 32];
const NONCE: [u8; 12] = [0x24; 12];

fn cipher(name: &core::ffi::CStr, dir: Direction, ad: &[u8]) -> Cipher {
    let mut c = Cipher::new(name, dir).unwrap();
    c.set_key(&KEY).unwrap();
    c.set_associated_data(ad).unwrap();
    c.start(&NONCE).unwrap();
    c
}

#[test]
fn test_hello_world() {
    let ct = cipher(c"ChaCha20Poly1305", Direction::Encrypt, b"")
        .process(b"hello world")
        .unwrap();
    assert_eq!(ct.len(), 11 + 16);

    let pt = cipher(c"ChaCha20Poly1305", Direction::Decrypt, b"")
        .process(&ct)
        .unwrap();
    assert_eq!(pt, b"hello world");

    let mut bad = ct.clone();
    *bad.last_mut().unwrap() ^= 0x01;
    let mut dec = cipher(c"ChaCha20Poly1305", Direction::Decrypt, b"");
    let err = dec.process(&bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert_eq!(dec.state(), State::Finished);

    dec.reset().unwrap();
    dec.start(&NONCE).unwrap();
    assert_eq!(dec.process(&ct).unwrap(), b"hello world");
}

#[test]
fn test_associated_data_is_bound() {
    let ct = cipher(c"AES-256/GCM", Direction::Encrypt, b"header")
        .process(b"payload")
        .unwrap();
    let err = cipher(c"AES-256/GCM", Direction::Decrypt, b"Header")
        .process(&ct)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    let pt = cipher(c"AES-256/GCM", Direction::Decrypt, b"header")
        .process(&ct)
        .unwrap();
    assert_eq!(pt, b"payload");
}

#[test]
fn test_cbc_padding_shrinks_output() {
    let mut enc = Cipher::new(c"AES-256/CBC/PKCS7", Direction::Encrypt).unwrap();
    enc.set_key(&KEY).unwrap();
    enc.start(&[0; 16]).unwrap();
    let ct = enc.process(&[1; 33]).unwrap();
    assert_eq!(ct.len(), 48);

    let mut dec = Cipher::new(c"AES-256/CBC/PKCS7", Direction::Decrypt).unwrap();
    dec.set_key(&KEY).unwrap();
    dec.start(&[0; 16]).unwrap();
    let bound = dec.output_length(ct.len()).unwrap();
    let mut out = vec![0u8; bound];
    let n = dec.finish(&mut out, &ct).unwrap();
    assert!(n < bound);
    assert_eq!(out[..n], [1; 33]);
}

#[test]
fn test_out_of_order() {
    let mut h = Hash::new(c"SHA-384").unwrap();
    h.finish().unwrap();
    assert_eq!(h.update(b"x").unwrap_err().kind(), ErrorKind::BadState);

    let mut m = Mac::new(c"HMAC(SHA-256)").unwrap();
    assert_eq!(m.update(b"x").unwrap_err().kind(), ErrorKind::BadState);

    let mut c = Cipher::new(c"AES-128/GCM", Direction::Encrypt).unwrap();
    assert_eq!(c.start(&NONCE).unwrap_err().kind(), ErrorKind::BadState);
    assert_eq!(
        c.finish(&mut [0; 16], &[]).unwrap_err().kind(),
        ErrorKind::BadState
    );
    assert_eq!(c.state(), State::Fresh);
}

#[test]
fn test_bcrypt_consistency() {
    let mut rng = cshim::Rng::new(cshim::RngKind::System).unwrap();
    let hash = cshim::generate(b"opensesame", &mut rng, cshim::BCRYPT_MIN_WORK_FACTOR).unwrap();
    assert_eq!(
        cshim::is_valid(b"opensesame", hash.as_bytes()).unwrap(),
        Validity::Valid
    );
    assert_eq!(
        cshim::is_valid(b"opensesam", hash.as_bytes()).unwrap(),
        Validity::Invalid
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn update_consumes_what_it_writes(chunks in prop::collection::vec(1usize..4, 1..6)) {
        let mut c = cipher(c"ChaCha20Poly1305", Direction::Encrypt, b"");
        let g = c.update_granularity().unwrap();
        let mut total = 0;
        for k in chunks {
            let input = vec![0xa5; k * g];
            let mut out = vec![0u8; k * g + 7];
            let n = c.update(&mut out, &input).unwrap();
            prop_assert_eq!(n, input.len());
            total += n;
        }
        let need = c.output_length(0).unwrap();
        let mut out = vec![0u8; need];
        let n = c.finish(&mut out, &[]).unwrap();
        prop_assert!(n <= need);
        prop_assert!(total > 0);
    }

    #[test]
    fn tamper_is_detected(
        msg in prop::collection::vec(any::<u8>(), 0..200),
        idx in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut enc = Cipher::new(c"ChaCha20Poly1305", Direction::Encrypt).unwrap();
        enc.set_key(&KEY).unwrap();
        enc.start(&NONCE).unwrap();
        let mut ct = enc.process(&msg).unwrap();
        let i = idx.index(ct.len());
        ct[i] ^= 1 << bit;

        let mut dec = Cipher::new(c"ChaCha20Poly1305", Direction::Decrypt).unwrap();
        dec.set_key(&KEY).unwrap();
        dec.start(&NONCE).unwrap();
        let err = dec.process(&ct).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }
}
