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

// Blake2b as described in RFC 7693, unkeyed only.

use zeroize::{
    Zeroize,
    ZeroizeOnDrop
};

const BLOCK_LEN: usize = 128;

#[derive(Zeroize, ZeroizeOnDrop)]
struct Blake2bCore {
    b: [u8; BLOCK_LEN],
    h: [u64; 8],
    t: [u64; 2],
    c: usize,
}

pub(crate) struct Blake2b<const SIZE: usize>(Blake2bCore);
pub(crate) type Blake2b512 = Blake2b<64>;
#[cfg(test)]
pub(crate) type Blake2b256 = Blake2b<32>;

// Blake2b with an output length only known at runtime (1 to 64 bytes)
pub(crate) struct Blake2bVar {
    core: Blake2bCore,
    out_len: usize,
}

const BLAKE2B_IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179
];

const SIGMA: [[usize; 16]; 12] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3]
];

impl Blake2bCore {
    fn new(out_len: usize) -> Self {
        debug_assert!((1..=64).contains(&out_len));
        let mut core = Self {
            b: [0u8; BLOCK_LEN],
            h: BLAKE2B_IV,
            t: [0u64; 2],
            c: 0,
        };
        // parameter block: digest length, no key, fanout = depth = 1
        core.h[0] ^= 0x01010000 ^ out_len as u64;
        core
    }

    fn increment_counter(&mut self, n: u64) {
        self.t[0] = self.t[0].wrapping_add(n);
        if self.t[0] < n {
            self.t[1] = self.t[1].wrapping_add(1);
        }
    }

    fn update(&mut self, mut input: &[u8]) {
        // the last block is kept in the buffer until finalization
        // since it must be compressed with the final flag
        while !input.is_empty() {
            if self.c == BLOCK_LEN {
                self.increment_counter(BLOCK_LEN as u64);
                self.compress(false);
                self.c = 0;
            }
            let take = (BLOCK_LEN - self.c).min(input.len());
            self.b[self.c..self.c + take].copy_from_slice(&input[..take]);
            self.c += take;
            input = &input[take..];
        }
    }

    fn compress(&mut self, last: bool) {
        let mut v = [0u64; 16];
        v[0..8].copy_from_slice(&self.h);
        v[8..16].copy_from_slice(&BLAKE2B_IV);
        v[12] ^= self.t[0];
        v[13] ^= self.t[1];
        if last {
            v[14] = !v[14];
        }

        let mut m = [0u64; 16];
        for (dst, src) in m.iter_mut().zip(self.b.chunks_exact(8)) {
            // cannot panic, chunks are 8 bytes long
            *dst = u64::from_le_bytes(src.try_into().unwrap());
        }

        macro_rules! quarter_round {
            ($a:expr, $b:expr, $c:expr, $d:expr, $x:expr, $y:expr) => {
                v[$a] = v[$a].wrapping_add(v[$b]).wrapping_add($x);
                v[$d] = (v[$d] ^ v[$a]).rotate_right(32);
                v[$c] = v[$c].wrapping_add(v[$d]);
                v[$b] = (v[$b] ^ v[$c]).rotate_right(24);

                v[$a] = v[$a].wrapping_add(v[$b]).wrapping_add($y);
                v[$d] = (v[$d] ^ v[$a]).rotate_right(16);
                v[$c] = v[$c].wrapping_add(v[$d]);
                v[$b] = (v[$b] ^ v[$c]).rotate_right(63);
            };
        }

        for s in SIGMA.iter() {
            quarter_round!(0, 4,  8, 12, m[s[ 0]], m[s[ 1]]);
            quarter_round!(1, 5,  9, 13, m[s[ 2]], m[s[ 3]]);
            quarter_round!(2, 6, 10, 14, m[s[ 4]], m[s[ 5]]);
            quarter_round!(3, 7, 11, 15, m[s[ 6]], m[s[ 7]]);
            quarter_round!(0, 5, 10, 15, m[s[ 8]], m[s[ 9]]);
            quarter_round!(1, 6, 11, 12, m[s[10]], m[s[11]]);
            quarter_round!(2, 7,  8, 13, m[s[12]], m[s[13]]);
            quarter_round!(3, 4,  9, 14, m[s[14]], m[s[15]]);
        }

        for (i, h) in self.h.iter_mut().enumerate() {
            *h ^= v[i] ^ v[i + 8];
        }

        v.zeroize();
        m.zeroize();
    }

    fn finalize(&mut self, out: &mut [u8]) {
        self.increment_counter(self.c as u64);
        self.b[self.c..].fill(0);
        self.compress(true);

        for (i, byte) in out.iter_mut().enumerate() {
            *byte = (self.h[i >> 3] >> (8 * (i & 7))) as u8;
        }
    }
}

impl<const SIZE: usize> Blake2b<SIZE> {
    pub(crate) fn init() -> Self {
        Self(Blake2bCore::new(SIZE))
    }

    pub(crate) fn update(&mut self, input: &[u8]) {
        self.0.update(input)
    }

    pub(crate) fn finalize(&mut self) -> [u8; SIZE] {
        let mut out = [0u8; SIZE];
        self.0.finalize(&mut out);
        out
    }

    pub(crate) fn hash(input: &[u8]) -> [u8; SIZE] {
        let mut blake = Self::init();
        blake.update(input);
        blake.finalize()
    }
}

impl Blake2bVar {
    pub(crate) const MAX_OUTPUT_LEN: usize = 64;

    pub(crate) fn init(out_len: usize) -> Self {
        Self {
            core: Blake2bCore::new(out_len),
            out_len
        }
    }

    pub(crate) fn update(&mut self, input: &[u8]) {
        self.core.update(input)
    }

    // out must be exactly as long as the length given to init
    pub(crate) fn finalize_into(&mut self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.out_len);
        self.core.finalize(out);
    }
}
