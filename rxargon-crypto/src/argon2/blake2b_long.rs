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

// Variable-length hash function H' (RFC 9106, section 3.3)

use zeroize::Zeroize;

use crate::hashes::blake2::{
    Blake2b512,
    Blake2bVar
};

/// Blake2bLong: hashes `input` into exactly `out_len` bytes.
///
/// An empty vector is returned when `out_len` is 0.
pub fn extendable_hash(input: &[u8], out_len: u32) -> Vec<u8> {
    let mut out = vec![0u8; out_len as usize];
    blake2b_long(input, &mut out);
    out
}

// output length must fit on 32 bits
pub(crate) fn blake2b_long(input: &[u8], output: &mut [u8]) {
    if output.is_empty() {
        return;
    }
    let prefix = (output.len() as u32).to_le_bytes();

    // H'^T(A) = H^T(LE32(T)||A) if T <= 64
    if output.len() <= Blake2bVar::MAX_OUTPUT_LEN {
        let mut blake = Blake2bVar::init(output.len());
        blake.update(&prefix);
        blake.update(input);
        blake.finalize_into(output);
        return;
    }

    let r = output.len().div_ceil(32) - 2;

    // V_1 = H^(64)(LE32(T)||A)
    let mut blake = Blake2b512::init();
    blake.update(&prefix);
    blake.update(input);
    let mut block = blake.finalize();
    output[..32].copy_from_slice(&block[..32]);

    // V_2 = H^(64)(V_1)
    // ...
    // V_r = H^(64)(V_{r-1})
    for chunk in output[32..32 * r].chunks_exact_mut(32) {
        block = Blake2b512::hash(&block);
        chunk.copy_from_slice(&block[..32]);
    }

    // V_{r+1} = H^(T-32*r)(V_{r}), between 33 and 64 bytes
    let last = &mut output[32 * r..];
    let mut blake = Blake2bVar::init(last.len());
    blake.update(&block);
    blake.finalize_into(last);

    block.zeroize();
}

#[cfg(test)]
mod tests {
    use super::extendable_hash;
    use crate::hashes::blake2::Blake2b512;

    #[test]
    fn test_lengths() {
        let input = b"length invariants";
        for len in [0u32, 1, 31, 32, 33, 63, 64, 65, 95, 96, 97, 128, 129, 1000, 1024, 4097] {
            assert_eq!(extendable_hash(input, len).len(), len as usize);
        }
        assert!(extendable_hash(b"", 0).is_empty());
    }

    #[test]
    fn test_deterministic() {
        for len in [16, 64, 72, 1024] {
            assert_eq!(
                extendable_hash(b"deterministic", len),
                extendable_hash(b"deterministic", len)
            );
        }
        assert_ne!(extendable_hash(b"input 1", 1024), extendable_hash(b"input 2", 1024));
    }

    #[test]
    fn test_length_prefix() {
        // the output length is hashed in both branches
        let input = b"boundary";
        assert_ne!(extendable_hash(input, 64)[..32], extendable_hash(input, 65)[..32]);
        assert_ne!(extendable_hash(input, 32)[..], extendable_hash(input, 64)[..32]);
        assert_ne!(extendable_hash(input, 1024)[..64], extendable_hash(input, 2048)[..64]);

        let mut prefixed = 64u32.to_le_bytes().to_vec();
        prefixed.extend_from_slice(input);
        assert_eq!(extendable_hash(input, 64), Blake2b512::hash(&prefixed));
    }

    #[test]
    fn test_long_output_chain() {
        // V_1 || ... : 32-byte halves of chained 64-byte digests
        let input = b"chain";
        let out = extendable_hash(input, 1024);

        let mut prefixed = 1024u32.to_le_bytes().to_vec();
        prefixed.extend_from_slice(input);
        let v1 = Blake2b512::hash(&prefixed);
        let v2 = Blake2b512::hash(&v1);
        assert_eq!(out[..32], v1[..32]);
        assert_eq!(out[32..64], v2[..32]);

        // 1024 = 32 * 30 + 64, so the last digest is a full 64-byte one
        let mut v = v2;
        for _ in 3..=30 {
            v = Blake2b512::hash(&v);
        }
        assert_eq!(out[32 * 29..32 * 30], v[..32]);
        assert_eq!(out[32 * 30..], Blake2b512::hash(&v));
    }

    #[test]
    fn test_short_last_chunk() {
        // 72 = 32 + 40: V_2 is a 40-byte digest of V_1
        let out = extendable_hash(b"short", 72);
        let mut prefixed = 72u32.to_le_bytes().to_vec();
        prefixed.extend_from_slice(b"short");
        let v1 = Blake2b512::hash(&prefixed);
        assert_eq!(out[..32], v1[..32]);
        assert_ne!(out[32..], Blake2b512::hash(&v1)[..40]);
    }
}
