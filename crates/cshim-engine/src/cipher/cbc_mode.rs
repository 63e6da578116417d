//! AES-CBC with optional PKCS#7 padding.

use aes::{
    Aes128, Aes192, Aes256, Block,
    cipher::{BlockDecryptMut, BlockEncryptMut, BlockSizeUser, KeyIvInit, consts::U16},
};

use super::{Direction, Mode};
use crate::rc::Failure;

pub(crate) const BLOCK_LEN: usize = 16;

struct CbcEncrypt<E> {
    inner: E,
    padding: bool,
}

impl<E> CbcEncrypt<E>
where
    E: BlockEncryptMut + BlockSizeUser<BlockSize = U16>,
{
    fn blocks(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(Failure::InvalidInput("not a multiple of the block size"));
        }
        for chunk in data.chunks_exact_mut(BLOCK_LEN) {
            self.inner.encrypt_block_mut(Block::from_mut_slice(chunk));
        }
        Ok(())
    }
}

impl<E> Mode for CbcEncrypt<E>
where
    E: BlockEncryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn update(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        self.blocks(data)
    }

    fn finish(mut self: Box<Self>, mut data: Vec<u8>) -> Result<Vec<u8>, Failure> {
        if self.padding {
            let pad = BLOCK_LEN.wrapping_sub(data.len() % BLOCK_LEN);
            let byte = u8::try_from(pad).map_err(|_| Failure::Internal("padding overflow"))?;
            data.resize(data.len().saturating_add(pad), byte);
        }
        self.blocks(&mut data)?;
        Ok(data)
    }
}

struct CbcDecrypt<D> {
    inner: D,
    padding: bool,
}

impl<D> CbcDecrypt<D>
where
    D: BlockDecryptMut + BlockSizeUser<BlockSize = U16>,
{
    fn blocks(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(Failure::InvalidInput("not a multiple of the block size"));
        }
        for chunk in data.chunks_exact_mut(BLOCK_LEN) {
            self.inner.decrypt_block_mut(Block::from_mut_slice(chunk));
        }
        Ok(())
    }
}

impl<D> Mode for CbcDecrypt<D>
where
    D: BlockDecryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn update(&mut self, data: &mut [u8]) -> Result<(), Failure> {
        self.blocks(data)
    }

    fn finish(mut self: Box<Self>, mut data: Vec<u8>) -> Result<Vec<u8>, Failure> {
        self.blocks(&mut data)?;
        if self.padding {
            let n = usize::from(*data.last().ok_or(Failure::InvalidInput("missing padding"))?);
            let start = data
                .len()
                .checked_sub(n)
                .filter(|_| (1..=BLOCK_LEN).contains(&n))
                .ok_or(Failure::InvalidInput("invalid padding"))?;
            let valid = data
                .get(start..)
                .is_some_and(|pad| pad.iter().all(|&b| usize::from(b) == n));
            if !valid {
                return Err(Failure::InvalidInput("invalid padding"));
            }
            data.truncate(start);
        }
        Ok(data)
    }
}

/// Starts AES-CBC. The key length selects AES-128, -192 or -256.
pub(crate) fn aes_cbc(
    dir: Direction,
    key: &[u8],
    iv: &[u8],
    padding: bool,
) -> Result<Box<dyn Mode>, Failure> {
    if iv.len() != BLOCK_LEN {
        return Err(Failure::BadParameter("invalid nonce length"));
    }
    let err = |_| Failure::InvalidKeyLength(key.len());
    let mode: Box<dyn Mode> = match (dir, key.len()) {
        (Direction::Encrypt, 16) => Box::new(CbcEncrypt {
            inner: cbc::Encryptor::<Aes128>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (Direction::Encrypt, 24) => Box::new(CbcEncrypt {
            inner: cbc::Encryptor::<Aes192>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (Direction::Encrypt, 32) => Box::new(CbcEncrypt {
            inner: cbc::Encryptor::<Aes256>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (Direction::Decrypt, 16) => Box::new(CbcDecrypt {
            inner: cbc::Decryptor::<Aes128>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (Direction::Decrypt, 24) => Box::new(CbcDecrypt {
            inner: cbc::Decryptor::<Aes192>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (Direction::Decrypt, 32) => Box::new(CbcDecrypt {
            inner: cbc::Decryptor::<Aes256>::new_from_slices(key, iv).map_err(err)?,
            padding,
        }),
        (_, n) => return Err(Failure::InvalidKeyLength(n)),
    };
    Ok(mode)
}
