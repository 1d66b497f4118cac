// RxArgon, Argon2d memory filling for RandomX-style caches
// Copyright (C) 2025 A. Russon
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::ops::{
    BitXor, BitXorAssign
};
use zeroize::Zeroize;

use super::{
    Error,
    Result
};

/// A 1024-byte Argon2 memory block, seen as 128 64-bit words.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize)]
pub struct Block([u64; 128]);

impl BitXorAssign<&Block> for Block {
    fn bitxor_assign(&mut self, rhs: &Self) {
        for (dst, src) in self.0.iter_mut().zip(rhs.0.iter()) {
            *dst ^= src;
        }
    }
}

impl BitXor<&Block> for &Block {
    type Output = Block;
    fn bitxor(self, rhs: &Block) -> Self::Output {
        let mut block = self.clone();
        block ^= rhs;
        block
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[u64; 128]> for Block {
    fn from(value: [u64; 128]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Block {
    type Error = Error;
    fn try_from(value: &[u8]) -> Result<Self> {
        Self::from_bytes(value)
    }
}

impl Block {
    pub const SIZE: usize = 1024;
    pub const WORDS: usize = 128;
    pub const ZERO: Block = Block([0; Self::WORDS]);

    pub fn words(&self) -> &[u64; Self::WORDS] {
        &self.0
    }

    pub fn words_mut(&mut self) -> &mut [u64; Self::WORDS] {
        &mut self.0
    }

    pub fn zero(&mut self) {
        self.0 = [0; Self::WORDS];
    }

    pub fn copy_from(&mut self, other: &Block) {
        self.0 = other.0;
    }

    pub fn xor_with(&mut self, other: &Block) {
        *self ^= other;
    }

    /// Loads a block from exactly 1024 bytes, words in little-endian order.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let data: &[u8; Self::SIZE] = data.try_into().map_err(|_| Error::InvalidBlockSize {
            actual: data.len(),
            expected: Self::SIZE
        })?;
        let mut block = Self::ZERO;
        block.load(data);
        Ok(block)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (dst, src) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            dst.copy_from_slice(&src.to_le_bytes());
        }
        out
    }

    pub(crate) fn load(&mut self, input: &[u8; Self::SIZE]) {
        for (dst, src) in self.0.iter_mut().zip(input.chunks_exact(8)) {
            // cannot panic, chunks are 8 bytes long
            *dst = u64::from_le_bytes(src.try_into().unwrap());
        }
    }

    /// Compression function G of Argon2: `P(prev ^ reference) ^ prev ^ reference`.
    pub fn compress(prev: &Self, reference: &Self) -> Self {
        let mut r = prev ^ reference;
        let mut out = r.clone();
        r.permute();
        out ^= &r;
        r.zeroize();
        out
    }

    /// Writes `G(prev, reference)` into `dest`, XORed with the previous content of
    /// `dest` when `accumulate` is set (every pass but the first one).
    pub fn fill(prev: &Self, reference: &Self, dest: &mut Self, accumulate: bool) {
        let result = Self::compress(prev, reference);
        if accumulate {
            *dest ^= &result;
        }
        else {
            *dest = result;
        }
    }

    // The 128 words are an 8x8 matrix of 16-byte registers (pairs of words).
    // P is applied to each row, then to each column.
    fn permute(&mut self) {
        const TRUNC: u64 = 0xFFFF_FFFF;

        // fBlaMka: x + y + 2 * lo32(x) * lo32(y)
        macro_rules! gb {
            ($a:expr, $b:expr, $c:expr, $d:expr) => {
                $a = $a.wrapping_add($b).wrapping_add((($a & TRUNC) * ($b & TRUNC)).wrapping_mul(2));
                $d = ($d ^ $a).rotate_right(32);
                $c = $c.wrapping_add($d).wrapping_add((($c & TRUNC) * ($d & TRUNC)).wrapping_mul(2));
                $b = ($b ^ $c).rotate_right(24);
                $a = $a.wrapping_add($b).wrapping_add((($a & TRUNC) * ($b & TRUNC)).wrapping_mul(2));
                $d = ($d ^ $a).rotate_right(16);
                $c = $c.wrapping_add($d).wrapping_add((($c & TRUNC) * ($d & TRUNC)).wrapping_mul(2));
                $b = ($b ^ $c).rotate_right(63);
            };
        }

        macro_rules! permutation {
            (
                $v0:expr,  $v1:expr,  $v2:expr,  $v3:expr,
                $v4:expr,  $v5:expr,  $v6:expr,  $v7:expr,
                $v8:expr,  $v9:expr,  $v10:expr, $v11:expr,
                $v12:expr, $v13:expr, $v14:expr, $v15:expr
            ) => {
                // columns
                gb!($v0, $v4, $v8,  $v12);
                gb!($v1, $v5, $v9,  $v13);
                gb!($v2, $v6, $v10, $v14);
                gb!($v3, $v7, $v11, $v15);
                // diagonals
                gb!($v0, $v5, $v10, $v15);
                gb!($v1, $v6, $v11, $v12);
                gb!($v2, $v7, $v8,  $v13);
                gb!($v3, $v4, $v9,  $v14);
            };
        }

        let w = &mut self.0;

        for row in w.chunks_exact_mut(16) {
            permutation!(
                row[0],  row[1],  row[2],  row[3],
                row[4],  row[5],  row[6],  row[7],
                row[8],  row[9],  row[10], row[11],
                row[12], row[13], row[14], row[15]
            );
        }

        for i in (0..16).step_by(2) {
            permutation!(
                w[i],       w[i + 1],
                w[i + 16],  w[i + 17],
                w[i + 32],  w[i + 33],
                w[i + 48],  w[i + 49],
                w[i + 64],  w[i + 65],
                w[i + 80],  w[i + 81],
                w[i + 96],  w[i + 97],
                w[i + 112], w[i + 113]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{
        Rng,
        SeedableRng,
        rngs::SmallRng
    };
    use super::Block;
    use crate::argon2::Error;

    fn random_block(rng: &mut SmallRng) -> Block {
        let mut block = Block::ZERO;
        rng.fill(&mut block.words_mut()[..]);
        block
    }

    #[test]
    fn test_block_bytes() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..16 {
            let block = random_block(&mut rng);
            let bytes = block.to_bytes();
            assert_eq!(bytes.len(), Block::SIZE);
            assert_eq!(Block::from_bytes(&bytes).unwrap(), block);
        }

        // words are little-endian
        let mut bytes = [0u8; Block::SIZE];
        bytes[0] = 0x01;
        bytes[15] = 0x80;
        let block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.words()[0], 1);
        assert_eq!(block.words()[1], 0x8000_0000_0000_0000);
    }

    #[test]
    fn test_block_invalid_size() {
        for len in [0, 8, 1023, 1025, 2048] {
            let data = vec![0u8; len];
            match Block::from_bytes(&data) {
                Err(Error::InvalidBlockSize { actual, expected }) => {
                    assert_eq!(actual, len);
                    assert_eq!(expected, 1024);
                },
                _ => panic!("{len} bytes accepted as a block")
            }
        }
        assert!(Block::try_from(&[0u8; 1024][..]).is_ok());
    }

    #[test]
    fn test_block_primitives() {
        let mut rng = SmallRng::seed_from_u64(2);
        let a = random_block(&mut rng);
        let b = random_block(&mut rng);

        let mut c = a.clone();
        c.xor_with(&b);
        for i in 0..Block::WORDS {
            assert_eq!(c.words()[i], a.words()[i] ^ b.words()[i]);
        }
        assert_eq!(&a ^ &b, c);

        c.xor_with(&b);
        assert_eq!(c, a);

        c.copy_from(&b);
        assert_eq!(c, b);

        c.zero();
        assert_eq!(c, Block::ZERO);
    }

    #[test]
    fn test_compress_zero() {
        // P(0) = 0 since fBlaMka(0, 0) = 0
        assert_eq!(Block::compress(&Block::ZERO, &Block::ZERO), Block::ZERO);

        // a single set bit spreads over the whole block
        let mut prev = Block::ZERO;
        prev.words_mut()[0] = 1;
        let out = Block::compress(&prev, &Block::ZERO);
        let changed = out.words().iter().filter(|&&w| w != 0).count();
        assert!(changed > Block::WORDS / 2);
    }

    #[test]
    fn test_compress_avalanche() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..32 {
            let prev = random_block(&mut rng);
            let reference = random_block(&mut rng);
            let out = Block::compress(&prev, &reference);

            let mut flipped = prev.clone();
            let bit = rng.random_range(0..Block::SIZE * 8);
            flipped.words_mut()[bit / 64] ^= 1u64 << (bit % 64);
            let out_flipped = Block::compress(&flipped, &reference);

            let changed = out.words()
                .iter()
                .zip(out_flipped.words().iter())
                .filter(|(x, y)| x != y)
                .count();
            assert!(4 * changed >= Block::WORDS, "only {changed} words changed");
        }
    }

    #[test]
    fn test_compress_symmetric_inputs() {
        // only prev ^ reference enters G
        let mut rng = SmallRng::seed_from_u64(4);
        let a = random_block(&mut rng);
        let b = random_block(&mut rng);
        assert_eq!(Block::compress(&a, &b), Block::compress(&b, &a));
    }

    #[test]
    fn test_fill_accumulate() {
        let mut rng = SmallRng::seed_from_u64(5);
        let prev = random_block(&mut rng);
        let reference = random_block(&mut rng);
        let old = random_block(&mut rng);
        let g = Block::compress(&prev, &reference);

        let mut dest = old.clone();
        Block::fill(&prev, &reference, &mut dest, false);
        assert_eq!(dest, g);

        let mut dest = old.clone();
        Block::fill(&prev, &reference, &mut dest, true);
        assert_eq!(dest, &g ^ &old);
    }
}
