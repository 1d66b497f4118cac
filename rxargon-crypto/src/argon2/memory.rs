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

use std::io::Write;
use zeroize::{
    Zeroize,
    ZeroizeOnDrop
};

use super::{
    Argon2,
    Error,
    Result,
    SYNC_POINTS
};
use super::blake2b_long::blake2b_long;
use super::block::Block;
use super::index::{
    Position,
    index_alpha,
    reference_lane
};

/// Argon2 memory: `lanes` lanes of `lane_length` blocks, stored lane after lane.
///
/// Blocks are wiped when the memory is dropped.
pub struct Memory {
    blocks: Vec<Block>,
    lanes: u32,
    lane_length: u32,
    segment_length: u32,
}

impl Drop for Memory {
    fn drop(&mut self) {
        for block in self.blocks.iter_mut() {
            block.zeroize();
        }
    }
}

impl ZeroizeOnDrop for Memory {}

impl Memory {
    /// Allocates `memory_kib` zeroed blocks split into `lanes` lanes.
    ///
    /// The number of blocks must be a multiple of `4 * lanes`, with at least
    /// two blocks per segment.
    pub fn new(memory_kib: u32, lanes: u32) -> Result<Self> {
        if lanes < Argon2::MIN_LANES {
            return Err(Error::InvalidParameters("number of lanes must be positive"));
        }
        if lanes > Argon2::MAX_LANES {
            return Err(Error::InvalidParameters("too many lanes"));
        }
        let lanes_blocks = lanes as u64 * SYNC_POINTS as u64;
        if (memory_kib as u64) < 2 * lanes_blocks {
            return Err(Error::InvalidParameters("memory cost below 8 blocks per lane"));
        }
        if memory_kib as u64 % lanes_blocks != 0 {
            return Err(Error::InvalidParameters("memory cost not a multiple of 4 blocks per lane"));
        }

        let lane_length = memory_kib / lanes;
        Ok(Self {
            blocks: vec![Block::ZERO; memory_kib as usize],
            lanes,
            lane_length,
            segment_length: lane_length / SYNC_POINTS,
        })
    }

    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    pub fn lane_length(&self) -> u32 {
        self.lane_length
    }

    pub fn segment_length(&self) -> u32 {
        self.segment_length
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks of one lane, `None` if `lane` is not below the number of lanes.
    pub fn lane(&self, lane: u32) -> Option<&[Block]> {
        if lane >= self.lanes {
            return None;
        }
        let start = lane as usize * self.lane_length as usize;
        self.blocks.get(start..start + self.lane_length as usize)
    }

    /// First 64-bit word of the memory, as read by RandomX from its cache.
    pub fn first_word(&self) -> u64 {
        self.blocks[0].words()[0]
    }

    /// Size of the memory in bytes.
    pub fn byte_len(&self) -> usize {
        self.blocks.len() * Block::SIZE
    }

    /// Writes the raw memory, blocks in order, words in little-endian order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for block in self.blocks.iter() {
            let mut bytes = block.to_bytes();
            writer.write_all(&bytes)?;
            bytes.zeroize();
        }
        Ok(())
    }

    /// Computes the first two blocks of every lane from the pre-hashing digest.
    /// Other blocks are left untouched.
    pub fn initialize(&mut self, h0: &[u8; 64]) {
        // B[i][0] = H'^(1024)(H_0 || LE32(0) || LE32(i))
        // B[i][1] = H'^(1024)(H_0 || LE32(1) || LE32(i))
        let mut blockhash = [0u8; 72];
        blockhash[..64].copy_from_slice(h0);

        let mut output = [0u8; Block::SIZE];
        for (i, lane) in self.blocks.chunks_exact_mut(self.lane_length as usize).enumerate() {
            blockhash[68..].copy_from_slice(&(i as u32).to_le_bytes());
            for (j, block) in lane.iter_mut().take(2).enumerate() {
                blockhash[64..68].copy_from_slice(&(j as u32).to_le_bytes());
                blake2b_long(&blockhash, &mut output);
                block.load(&output);
            }
        }

        blockhash.zeroize();
        output.zeroize();
    }

    /// Runs `passes` passes over the memory.
    ///
    /// Slices are synchronization points: a slice is computed for every lane
    /// before moving to the next one.
    pub fn fill(&mut self, passes: u32) {
        for pass in 0..passes {
            for slice in 0..SYNC_POINTS {
                for lane in 0..self.lanes {
                    self.fill_segment(pass, lane, slice);
                }
            }
        }
    }

    fn fill_segment(&mut self, pass: u32, lane: u32, slice: u32) {
        let lane_length = self.lane_length as usize;
        let lane_start = lane as usize * lane_length;

        // B[i][0] and B[i][1] come from H_0 on the first pass
        let starting_index = if pass == 0 && slice == 0 { 2 } else { 0 };

        for index in starting_index..self.segment_length {
            let position = Position::new(pass, lane, slice, index);
            let offset = position.offset(self.segment_length) as usize;
            let curr_offset = lane_start + offset;
            let prev_offset = match offset {
                0 => lane_start + lane_length - 1,
                _ => curr_offset - 1
            };

            // Argon2d: J_1||J_2 is the first word of the previous block
            let pseudo_rand = self.blocks[prev_offset].words()[0];
            let ref_lane = reference_lane(&position, pseudo_rand, self.lanes);
            let ref_index = index_alpha(
                &position,
                pseudo_rand,
                self.segment_length,
                self.lane_length,
                ref_lane == lane
            );
            let ref_offset = ref_lane as usize * lane_length + ref_index as usize;

            // version 0x13: blocks are XORed with their old value after the first pass
            self.fill_block(prev_offset, ref_offset, curr_offset, pass != 0);
        }
    }

    // dest is never one of the inputs
    fn fill_block(&mut self, prev: usize, reference: usize, dest: usize, accumulate: bool) {
        debug_assert!(dest != prev && dest != reference);
        let (head, rest) = self.blocks.split_at_mut(dest);
        let (dest_block, tail) = rest.split_at_mut(1);
        Block::fill(
            around(head, tail, dest, prev),
            around(head, tail, dest, reference),
            &mut dest_block[0],
            accumulate
        );
    }

    /// Computes the tag from the last block of every lane.
    pub fn finalize(&self, tag_length: u32) -> Vec<u8> {
        let mut out = vec![0u8; tag_length as usize];
        self.finalize_into(&mut out);
        out
    }

    // out.len() must fit on 32 bits
    pub(crate) fn finalize_into(&self, out: &mut [u8]) {
        // C = B[0][q-1] XOR B[1][q-1] XOR ... XOR B[p-1][q-1]
        let lane_length = self.lane_length as usize;
        let mut final_block = self.blocks[lane_length - 1].clone();
        for block in self.blocks.iter().skip(2 * lane_length - 1).step_by(lane_length) {
            final_block ^= block;
        }

        // Tag = H'^T(C)
        let mut bytes = final_block.to_bytes();
        blake2b_long(&bytes, out);

        bytes.zeroize();
        final_block.zeroize();
    }
}

// block at index i of a slice split around index split
fn around<'a>(head: &'a [Block], tail: &'a [Block], split: usize, i: usize) -> &'a Block {
    if i < split {
        &head[i]
    }
    else {
        &tail[i - split - 1]
    }
}
