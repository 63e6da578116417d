#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_wrap,
    clippy::indexing_slicing
)]

use core::{
    ffi::{CStr, c_int},
    ptr,
};

use cshim_capi::*;
use proptest::prelude::*;
use test_log::test;

const OUT_OF_RANGE: isize = CshimStatus::OutOfRange as isize;

fn len(buf: &[u8]) -> isize {
    buf.len() as isize
}

fn status(code: c_int) -> CshimStatus {
    CshimStatus::try_from_repr(code).unwrap()
}

struct Owned<T> {
    ptr: *mut T,
    destroy: unsafe extern "C" fn(*mut T) -> c_int,
}

impl<T> Drop for Owned<T> {
    fn drop(&mut self) {
        // SAFETY: FFI call, `ptr` came from the matching init.
        assert_eq!(unsafe { (self.destroy)(self.ptr) }, 0);
    }
}

fn rng() -> Owned<CshimRng> {
    let mut h = ptr::null_mut();
    // SAFETY: FFI call, no invariants.
    assert_eq!(unsafe { cshim_rng_init(&mut h, CSHIM_RNG_SYSTEM) }, 0);
    Owned {
        ptr: h,
        destroy: cshim_rng_destroy,
    }
}

fn cipher(name: &CStr, flags: u32, key: &[u8], nonce: &[u8]) -> Owned<CshimCipher> {
    let mut h = ptr::null_mut();
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_cipher_init(&mut h, name.as_ptr(), flags), 0);
        assert_eq!(cshim_cipher_set_key(h, key.as_ptr(), key.len(), 0, len(key)), 0);
        assert_eq!(cshim_cipher_start(h, nonce.as_ptr(), nonce.len(), 0, len(nonce)), 0);
    }
    Owned {
        ptr: h,
        destroy: cshim_cipher_destroy,
    }
}

/// Runs a whole message through `finish`.
fn seal_or_open(c: &Owned<CshimCipher>, input: &[u8]) -> Result<Vec<u8>, CshimStatus> {
    // SAFETY: FFI call, no invariants.
    let need = unsafe { cshim_cipher_output_length(c.ptr, input.len()) };
    assert!(need >= 0);
    let mut out = vec![0u8; need as usize];
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_cipher_finish(
            c.ptr,
            out.as_mut_ptr(),
            out.len(),
            0,
            len(&out),
            input.as_ptr(),
            input.len(),
            0,
            len(input),
        )
    };
    if n < 0 {
        return Err(status(n as c_int));
    }
    out.truncate(n as usize);
    Ok(out)
}

#[test]
fn test_hello_world() {
    let key = [0x42u8; 32];
    let nonce = [0x24u8; 12];

    let enc = cipher(c"ChaCha20Poly1305", CSHIM_CIPHER_ENCRYPT, &key, &nonce);
    let ct = seal_or_open(&enc, b"hello world").unwrap();
    assert_eq!(ct.len(), 27);

    let dec = cipher(c"ChaCha20Poly1305", CSHIM_CIPHER_DECRYPT, &key, &nonce);
    assert_eq!(seal_or_open(&dec, &ct).unwrap(), b"hello world");

    let mut bad = ct.clone();
    bad[26] ^= 0x80;
    let dec = cipher(c"ChaCha20Poly1305", CSHIM_CIPHER_DECRYPT, &key, &nonce);
    assert_eq!(
        seal_or_open(&dec, &bad).unwrap_err(),
        CshimStatus::AuthenticationFailed
    );
}

#[test]
fn test_views_at_offsets() {
    let key = [7u8; 16];
    let nonce = [9u8; 12];
    let enc = cipher(c"AES-128/GCM", CSHIM_CIPHER_ENCRYPT, &key, &nonce);

    // SAFETY: FFI call, no invariants.
    let g = unsafe { cshim_cipher_update_granularity(enc.ptr) };
    assert_eq!(g, 16);
    let mut input = vec![0xee; 3];
    input.extend_from_slice(&[0x11; 64]);
    let mut out = vec![0u8; 10 + 64];
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_cipher_update(
            enc.ptr,
            out.as_mut_ptr(),
            out.len(),
            10,
            64,
            input.as_ptr(),
            input.len(),
            3,
            64,
        )
    };
    assert_eq!(n, 64);
    assert_eq!(out[..10], [0u8; 10]);

    // Non-granular input.
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_cipher_update(
            enc.ptr,
            out.as_mut_ptr(),
            out.len(),
            0,
            len(&out),
            input.as_ptr(),
            input.len(),
            0,
            10,
        )
    };
    assert_eq!(n, CshimStatus::BufferTooSmall as isize);
}

#[test]
fn test_out_of_range() {
    let input = [0u8; 8];
    let mut out = [0u8; 32];
    for (off, n) in [(-1isize, 1isize), (0, -1), (4, 5), (isize::MAX, 1), (9, 0)] {
        // SAFETY: FFI call, no invariants.
        let got = unsafe {
            cshim_hex_encode(
                input.as_ptr(),
                input.len(),
                off,
                n,
                out.as_mut_ptr(),
                out.len(),
                0,
                len(&out),
                CSHIM_HEX_FLAG_LOWER,
            )
        };
        assert_eq!(got, OUT_OF_RANGE, "off={off} len={n}");
    }
    // SAFETY: FFI call, no invariants.
    let got = unsafe {
        cshim_hex_encode(ptr::null(), 4, 0, 0, out.as_mut_ptr(), out.len(), 0, 0, 0)
    };
    assert_eq!(got, OUT_OF_RANGE);
    // SAFETY: FFI call, no invariants.
    let got = unsafe { cshim_hex_encode(ptr::null(), 0, 0, 0, ptr::null_mut(), 0, 0, 0, 0) };
    assert_eq!(got, 0);
}

#[test]
fn test_hex() {
    let input = *b"xx\x01\xab\xffyy";
    let mut out = [b'.'; 10];
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_hex_encode(
            input.as_ptr(),
            input.len(),
            2,
            3,
            out.as_mut_ptr(),
            out.len(),
            2,
            6,
            CSHIM_HEX_FLAG_UPPER,
        )
    };
    assert_eq!(n, 6);
    assert_eq!(&out, b"..01ABFF..");

    let mut back = [0u8; 3];
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_hex_decode(
            out.as_ptr(),
            out.len(),
            2,
            6,
            back.as_mut_ptr(),
            back.len(),
            0,
            3,
        )
    };
    assert_eq!(n, 3);
    assert_eq!(back, [0x01, 0xab, 0xff]);

    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_hex_decode(
            out.as_ptr(),
            out.len(),
            2,
            5,
            back.as_mut_ptr(),
            back.len(),
            0,
            3,
        )
    };
    assert_eq!(n, CshimStatus::InvalidEncoding as isize);

    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_hex_encode(input.as_ptr(), input.len(), 0, 1, out.as_mut_ptr(), out.len(), 0, 2, 9)
    };
    assert_eq!(n, CshimStatus::InvalidArgument as isize);
}

#[test]
fn test_null_handles() {
    let data = [0u8; 4];
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(
            status(cshim_hash_update(ptr::null_mut(), data.as_ptr(), 4, 0, 4)),
            CshimStatus::InvalidArgument
        );
        assert_eq!(
            status(cshim_hash_init(ptr::null_mut(), c"SHA-256".as_ptr())),
            CshimStatus::InvalidArgument
        );
        let mut h = ptr::null_mut();
        assert_eq!(
            status(cshim_hash_init(&mut h, ptr::null())),
            CshimStatus::InvalidArgument
        );
        assert!(h.is_null());
        assert_eq!(cshim_hash_destroy(ptr::null_mut()), 0);
    }
}

#[test]
fn test_unknown_names() {
    let mut c = ptr::null_mut();
    let mut m = ptr::null_mut();
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(
            status(cshim_cipher_init(&mut c, c"Serpent/XTS".as_ptr(), 0)),
            CshimStatus::UnknownAlgorithm
        );
        assert_eq!(
            status(cshim_mac_init(&mut m, c"CMAC(AES-128)".as_ptr())),
            CshimStatus::UnknownAlgorithm
        );
        assert_eq!(
            status(cshim_cipher_init(&mut c, c"AES-128/GCM".as_ptr(), 7)),
            CshimStatus::InvalidArgument
        );
    }
}

#[test]
fn test_hash_and_mac() {
    let mut h = ptr::null_mut();
    let mut digest = [0u8; 32];
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_hash_init(&mut h, c"SHA-256".as_ptr()), 0);
        assert_eq!(cshim_hash_output_length(h), 32);
        assert_eq!(cshim_hash_update(h, b"xabcx".as_ptr(), 5, 1, 3), 0);
        assert_eq!(cshim_hash_final(h, digest.as_mut_ptr(), 32, 0, 32), 32);
        assert_eq!(
            status(cshim_hash_update(h, b"abc".as_ptr(), 3, 0, 3)),
            CshimStatus::BadState
        );
        assert_eq!(cshim_hash_destroy(h), 0);
    }
    assert_eq!(digest[..4], [0xba, 0x78, 0x16, 0xbf]);

    let mut m = ptr::null_mut();
    let mut tag = [0u8; 40];
    let mut name = [0u8; 32];
    let (mut min, mut max, mut modulo) = (0, 0, 0);
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_mac_init(&mut m, c"HMAC(SHA-256)".as_ptr()), 0);
        assert_eq!(
            status(cshim_mac_update(m, b"x".as_ptr(), 1, 0, 1)),
            CshimStatus::BadState
        );
        assert_eq!(cshim_mac_set_key(m, b"Jefe".as_ptr(), 4, 0, 4), 0);
        let msg = b"what do ya want for nothing?";
        assert_eq!(cshim_mac_update(m, msg.as_ptr(), msg.len(), 0, len(msg)), 0);
        assert_eq!(
            cshim_mac_final(m, tag.as_mut_ptr(), tag.len(), 0, 31),
            CshimStatus::BufferTooSmall as isize
        );
        assert_eq!(cshim_mac_final(m, tag.as_mut_ptr(), tag.len(), 8, 32), 32);
        assert_eq!(cshim_mac_name(m, name.as_mut_ptr(), name.len(), 0, 32), 13);
        assert_eq!(cshim_mac_get_keyspec(m, &mut min, &mut max, &mut modulo), 0);
        assert_eq!(cshim_mac_destroy(m), 0);
    }
    assert_eq!(tag[8..12], [0x5b, 0xdc, 0xc1, 0x46]);
    assert_eq!(&name[..14], b"HMAC(SHA-256)\0");
    assert_eq!(modulo, 1);
    assert!(min <= 4 && 4 <= max);
}

#[test]
fn test_bcrypt() {
    let rng = rng();
    let mut out = [0u8; 64];
    // SAFETY: FFI call, no invariants.
    let n = unsafe {
        cshim_bcrypt_generate(out.as_mut_ptr(), 64, 0, 64, b"pw".as_ptr(), 2, 0, 2, rng.ptr, 4)
    };
    assert_eq!(n, 61);
    let hash = &out[..60];
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_bcrypt_is_valid(b"pw".as_ptr(), 2, 0, 2, hash.as_ptr(), 60, 0, 60), 0);
        assert_eq!(cshim_bcrypt_is_valid(b"pX".as_ptr(), 2, 0, 2, hash.as_ptr(), 60, 0, 60), 1);
        assert_eq!(
            status(cshim_bcrypt_is_valid(b"pw".as_ptr(), 2, 0, 2, b"$2".as_ptr(), 2, 0, 2)),
            CshimStatus::InvalidEncoding
        );
    }
}

#[test]
fn test_sign_verify() {
    let rng = rng();
    let mut sk = ptr::null_mut();
    let mut pk = ptr::null_mut();
    let mut s = ptr::null_mut();
    let mut v = ptr::null_mut();
    let mut sig = [0u8; 64];
    let msg = b"attack at dawn";
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(
            cshim_privkey_generate(&mut sk, c"Ed25519".as_ptr(), c"".as_ptr(), rng.ptr),
            0
        );
        assert_eq!(cshim_privkey_export_pubkey(&mut pk, sk), 0);
        assert_eq!(cshim_sign_init(&mut s, sk, c"Pure".as_ptr()), 0);
        assert_eq!(cshim_sign_output_length(s), 64);
        assert_eq!(cshim_sign_update(s, msg.as_ptr(), msg.len(), 0, len(msg)), 0);
        assert_eq!(cshim_sign_finish(s, rng.ptr, sig.as_mut_ptr(), 64, 0, 64), 64);

        assert_eq!(cshim_verify_init(&mut v, pk, c"Pure".as_ptr()), 0);
        assert_eq!(cshim_verify_update(v, msg.as_ptr(), msg.len(), 0, len(msg)), 0);
        assert_eq!(cshim_verify_finish(v, sig.as_ptr(), 64, 0, 64), 0);
        assert_eq!(cshim_verify_destroy(v), 0);

        assert_eq!(cshim_verify_init(&mut v, pk, c"Pure".as_ptr()), 0);
        assert_eq!(cshim_verify_update(v, msg.as_ptr(), msg.len(), 1, 3), 0);
        assert_eq!(cshim_verify_finish(v, sig.as_ptr(), 64, 0, 64), 1);
        assert_eq!(cshim_verify_destroy(v), 0);

        assert_eq!(cshim_verify_init(&mut v, pk, c"Pure".as_ptr()), 0);
        assert_eq!(
            status(cshim_verify_finish(v, sig.as_ptr(), 64, 0, 63)),
            CshimStatus::InvalidEncoding
        );
        assert_eq!(cshim_verify_destroy(v), 0);

        assert_eq!(cshim_sign_destroy(s), 0);
        assert_eq!(cshim_pubkey_destroy(pk), 0);
        assert_eq!(cshim_privkey_destroy(sk), 0);
    }
}

#[test]
fn test_mp() {
    let mut a = ptr::null_mut();
    let mut b = ptr::null_mut();
    let mut hex = [0u8; 16];
    let mut dec = [0u8; 16];
    let mut cmp = 0;
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_mp_init(&mut a), 0);
        assert_eq!(cshim_mp_init(&mut b), 0);
        assert_eq!(cshim_mp_set_from_dec(a, b"65535".as_ptr(), 5, 0, 5), 0);
        assert_eq!(cshim_mp_from_bin(b, [0xff, 0xff].as_ptr(), 2, 0, 2), 0);
        assert_eq!(cshim_mp_equal(a, b), 1);
        assert_eq!(cshim_mp_hex_len(a), 4);
        assert_eq!(cshim_mp_to_hex(a, hex.as_mut_ptr(), 16, 0, 16), 4);
        assert_eq!(cshim_mp_dec_len(a), 5);
        assert_eq!(cshim_mp_to_dec(a, dec.as_mut_ptr(), 16, 2, 14), 5);
        assert_eq!(
            status(cshim_mp_set_from_hex(b, b"12G".as_ptr(), 3, 0, 3)),
            CshimStatus::InvalidEncoding
        );
        assert_eq!(cshim_mp_set_from_hex(b, b"10000".as_ptr(), 5, 0, 5), 0);
        assert_eq!(cshim_mp_cmp(&mut cmp, a, b), 0);
        assert_eq!(cshim_mp_bit_len(b), 17);
        assert_eq!(cshim_mp_destroy(a), 0);
        assert_eq!(cshim_mp_destroy(b), 0);
    }
    assert_eq!(&hex[..4], b"FFFF");
    assert_eq!(&dec[2..7], b"65535");
    assert_eq!(cmp, -1);
}

#[test]
fn test_block_cipher() {
    // FIPS-197, appendix C.1.
    let key: Vec<u8> = (0u8..16).collect();
    let mut input = vec![0xaa; 5];
    input.extend((0u8..16).map(|i| i * 0x11));
    let mut out = [0u8; 16];
    let mut bc = ptr::null_mut();
    // SAFETY: FFI call, no invariants.
    unsafe {
        assert_eq!(cshim_block_cipher_init(&mut bc, c"AES-128".as_ptr()), 0);
        assert_eq!(
            cshim_block_cipher_encrypt_blocks(
                bc,
                input.as_ptr(),
                input.len(),
                5,
                out.as_mut_ptr(),
                16,
                0,
                16,
                1
            ),
            CshimStatus::BadState as isize
        );
        assert_eq!(cshim_block_cipher_set_key(bc, key.as_ptr(), 16, 0, 16), 0);
        assert_eq!(cshim_block_cipher_block_size(bc), 16);
        assert_eq!(
            cshim_block_cipher_encrypt_blocks(
                bc,
                input.as_ptr(),
                input.len(),
                5,
                out.as_mut_ptr(),
                16,
                0,
                16,
                1
            ),
            16
        );
        assert_eq!(
            cshim_block_cipher_encrypt_blocks(
                bc,
                input.as_ptr(),
                input.len(),
                6,
                out.as_mut_ptr(),
                16,
                0,
                16,
                1
            ),
            OUT_OF_RANGE
        );
        assert_eq!(cshim_block_cipher_destroy(bc), 0);
    }
    assert_eq!(out[..4], [0x69, 0xc4, 0xe0, 0xd8]);
}

#[test]
fn test_kdf() {
    let mut okm = [0u8; 42];
    let ikm = [0x0bu8; 22];
    let salt: Vec<u8> = (0u8..13).collect();
    let info: Vec<u8> = (0xf0u8..=0xf9).collect();
    // SAFETY: FFI call, no invariants.
    let code = unsafe {
        cshim_kdf(
            c"HKDF(SHA-256)".as_ptr(),
            okm.as_mut_ptr(),
            42,
            0,
            42,
            ikm.as_ptr(),
            22,
            0,
            22,
            salt.as_ptr(),
            13,
            0,
            13,
            info.as_ptr(),
            10,
            0,
            10,
        )
    };
    assert_eq!(code, 0);
    assert_eq!(okm[..4], [0x3c, 0xb2, 0x5f, 0x25]);

    let (mut p1, mut p2, mut p3) = (0, 0, 0);
    let mut out = [0u8; 16];
    // SAFETY: FFI call, no invariants.
    let code = unsafe {
        cshim_pwdhash_timed(
            c"PBKDF2(SHA-256)".as_ptr(),
            5,
            &mut p1,
            &mut p2,
            &mut p3,
            out.as_mut_ptr(),
            16,
            0,
            16,
            b"pw".as_ptr(),
            2,
            0,
            2,
            b"saltsalt".as_ptr(),
            8,
            0,
            8,
        )
    };
    assert_eq!(code, 0);
    assert!(p1 > 0);
}

#[test]
fn test_describe() {
    for code in [0, 1, -1, -6, -8, -99, 12345] {
        let p = cshim_status_describe(code);
        assert!(!p.is_null());
        // SAFETY: descriptions are static NUL-terminated strings.
        let s = unsafe { CStr::from_ptr(p) };
        assert!(!s.is_empty());
    }
    // SAFETY: descriptions are static NUL-terminated strings.
    let s = unsafe { CStr::from_ptr(cshim_status_describe(12345)) };
    assert_eq!(s, c"unknown error");
}

proptest! {
    #[test]
    fn views_accept_exactly_in_range(cap in 0usize..32, off in -4isize..40, n in -4isize..40) {
        let input = vec![0u8; cap];
        let mut out = vec![0u8; 128];
        // SAFETY: FFI call, no invariants.
        let got = unsafe {
            cshim_hex_encode(
                input.as_ptr(),
                cap,
                off,
                n,
                out.as_mut_ptr(),
                out.len(),
                0,
                len(&out),
                CSHIM_HEX_FLAG_LOWER,
            )
        };
        let ok = off >= 0 && n >= 0 && (off + n) as usize <= cap;
        if ok {
            prop_assert_eq!(got, 2 * n);
        } else {
            prop_assert_eq!(got, OUT_OF_RANGE);
        }
    }
}
