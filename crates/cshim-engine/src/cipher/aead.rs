//! Streaming AEAD modes built from a stream cipher and a
//! universal hash.
//!
//! Both GCM and ChaCha20Poly1305 have the same shape: the
//! associated data and the ciphertext are each absorbed with
//! zero padding to the hash's block size, followed by a block of
//! lengths. Only the keystream, the hash, the length encoding and
//! the final tag mask differ.

use aes::{Aes128, Aes192, Aes256, Block};
use chacha20::{
    ChaCha20,
    cipher::{InnerIvInit, KeyIvInit, StreamCipher},
};
use ctr::{Ctr32BE, CtrCore};
use ghash::GHash;
use poly1305::{
    Poly1305,
    universal_hash::{KeyInit, UniversalHash},
};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{Direction, Mode};
use crate::{block::Aes, rc::Failure};

/// The tag size for every supported AEAD.
pub(crate) const TAG_LEN: usize = 16;

/// How the final length block is encoded.
#[derive(Copy, Clone, Debug)]
enum Lengths {
    /// Bit lengths, big endian (GCM).
    BitsBe,
    /// Byte lengths, little endian (ChaCha20Poly1305).
    BytesLe,
}

pub(crate) struct AeadStream<S, U> {
    dir: Direction,
    stream: S,
    mac: U,
    mask: [u8; TAG_LEN],
    lengths: Lengths,
    ad_len: u64,
    text_len: u64,
}

impl<S, U> AeadStream<S, U>
where
    S: StreamCipher,
    U: UniversalHash,
{
    fn new(
        dir: Direction,
        stream: S,
        mut mac: U,
        mask: [u8; TAG_LEN],
        lengths: Lengths,
        ad: &[u8],
    ) -> Result<Self, Failure> {
        mac.update_padded(ad);
        Ok(Self {
            dir,
            stream,
            mac,
            mask,
            lengths,
            ad_len: len64(ad.len())?,
            text_len: 0,
        })
    }

    fn count(&mut self, n: usize) -> Result<(), Failure> {
        self.text_len = self
            .text_len
            .checked_add(len64(n)?)
            .ok_or(Failure::InvalidInput("message too long"))?;
        Ok(())
    }

    fn keystream(stream: &mut S, data: &mut [u8]) -> Result<(), Failure> {
        stream
            .try_apply_keystream(data)
            .map_err(|_| Failure::InvalidInput("keystream exhausted"))
    }

    /// Absorbs and transforms `data`, which must be a multiple of
    /// the hash's block size unless it is the last piece.
    fn absorb(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        self.count(data.len())?;
        match self.dir {
            Direction::Encrypt => {
                Self::keystream(&mut self.stream, data)?;
                self.mac.update_padded(data);
            }
            Direction::Decrypt => {
                self.mac.update_padded(data);
                Self::keystream(&mut self.stream, data)?;
            }
        }
        Ok(())
    }

    fn tag(
        mut mac: U,
        lengths: Lengths,
        ad_len: u64,
        text_len: u64,
        mask: &[u8; TAG_LEN],
    ) -> [u8; TAG_LEN] {
        let mut block = [0u8; TAG_LEN];
        let (a, c) = block.split_at_mut(8);
        match lengths {
            Lengths::BitsBe => {
                a.copy_from_slice(&ad_len.wrapping_mul(8).to_be_bytes());
                c.copy_from_slice(&text_len.wrapping_mul(8).to_be_bytes());
            }
            Lengths::BytesLe => {
                a.copy_from_slice(&ad_len.to_le_bytes());
                c.copy_from_slice(&text_len.to_le_bytes());
            }
        }
        mac.update_padded(&block);
        let mut tag = [0u8; TAG_LEN];
        for ((t, h), m) in tag.iter_mut().zip(mac.finalize()).zip(mask) {
            *t = h ^ m;
        }
        tag
    }
}

impl<S, U> Mode for AeadStream<S, U>
where
    S: StreamCipher + Send,
    U: UniversalHash + Send,
{
    fn update(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        self.absorb(data)
    }

    fn finish(mut self: Box<Self>, mut data: Vec<u8>) -> Result<Vec<u8>, Failure> {
        match self.dir {
            Direction::Encrypt => {
                self.absorb(&mut data)?;
                let Self {
                    mac,
                    lengths,
                    ad_len,
                    text_len,
                    mask,
                    ..
                } = *self;
                data.extend_from_slice(&Self::tag(mac, lengths, ad_len, text_len, &mask));
                Ok(data)
            }
            Direction::Decrypt => {
                let split = data
                    .len()
                    .checked_sub(TAG_LEN)
                    .ok_or(Failure::InvalidInput("ciphertext shorter than the tag"))?;
                let got = data.split_off(split);
                self.count(data.len())?;
                self.mac.update_padded(&data);
                let Self {
                    mut stream,
                    mac,
                    lengths,
                    ad_len,
                    text_len,
                    mask,
                    ..
                } = *self;
                let want = Self::tag(mac, lengths, ad_len, text_len, &mask);
                if !bool::from(want.as_slice().ct_eq(got.as_slice())) {
                    return Err(Failure::BadMac);
                }
                Self::keystream(&mut stream, &mut data)?;
                Ok(data)
            }
        }
    }
}

fn len64(n: usize) -> Result<u64, Failure> {
    u64::try_from(n).map_err(|_| Failure::InvalidInput("message too long"))
}

/// Starts AES-GCM with a 96-bit nonce.
pub(crate) fn aes_gcm(
    dir: Direction,
    key: &[u8],
    nonce: &[u8],
    ad: &[u8],
) -> Result<Box<dyn Mode>, Failure> {
    let aes = Aes::new(key)?;

    let mut h = Block::default();
    aes.encrypt_block(&mut h);

    // J0 = nonce || 1, and the keystream starts at nonce || 2.
    let mut j0 = [0u8; 16];
    let (n, ctr) = j0.split_at_mut(12);
    if nonce.len() != n.len() {
        return Err(Failure::BadParameter("invalid nonce length"));
    }
    n.copy_from_slice(nonce);
    ctr.copy_from_slice(&1u32.to_be_bytes());
    let mut iv = Block::from(j0);
    let (_, ctr) = iv.split_at_mut(12);
    ctr.copy_from_slice(&2u32.to_be_bytes());

    let mut mask = Block::from(j0);
    aes.encrypt_block(&mut mask);
    let mask: [u8; TAG_LEN] = mask.into();

    let mac = GHash::new(&h);
    let mode: Box<dyn Mode> = match aes {
        Aes::Aes128(c) => Box::new(AeadStream::new(
            dir,
            Ctr32BE::<Aes128>::from_core(CtrCore::inner_iv_init(c, &iv)),
            mac,
            mask,
            Lengths::BitsBe,
            ad,
        )?),
        Aes::Aes192(c) => Box::new(AeadStream::new(
            dir,
            Ctr32BE::<Aes192>::from_core(CtrCore::inner_iv_init(c, &iv)),
            mac,
            mask,
            Lengths::BitsBe,
            ad,
        )?),
        Aes::Aes256(c) => Box::new(AeadStream::new(
            dir,
            Ctr32BE::<Aes256>::from_core(CtrCore::inner_iv_init(c, &iv)),
            mac,
            mask,
            Lengths::BitsBe,
            ad,
        )?),
    };
    Ok(mode)
}

/// Starts ChaCha20Poly1305 (RFC 8439) with a 96-bit nonce.
pub(crate) fn chacha20poly1305(
    dir: Direction,
    key: &[u8],
    nonce: &[u8],
    ad: &[u8],
) -> Result<Box<dyn Mode>, Failure> {
    if nonce.len() != 12 {
        return Err(Failure::BadParameter("invalid nonce length"));
    }
    let mut stream = ChaCha20::new_from_slices(key, nonce)
        .map_err(|_| Failure::InvalidKeyLength(key.len()))?;

    // Block 0 keys Poly1305, the message starts at block 1.
    let mut block0 = Zeroizing::new([0u8; 64]);
    stream.apply_keystream(&mut block0[..]);
    let (poly_key, _) = block0.split_at(32);
    let mac =
        Poly1305::new_from_slice(poly_key).map_err(|_| Failure::Internal("poly1305 key size"))?;

    Ok(Box::new(AeadStream::new(
        dir,
        stream,
        mac,
        [0u8; TAG_LEN],
        Lengths::BytesLe,
        ad,
    )?))
}
