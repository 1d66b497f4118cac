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

// Computing the index of the reference block (RFC 9106, section 3.4.2)

use super::SYNC_POINTS;

/// Coordinates of the block being computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub pass: u32,
    pub lane: u32,
    pub slice: u32,
    pub index: u32
}

impl Position {
    pub fn new(pass: u32, lane: u32, slice: u32, index: u32) -> Self {
        Self {
            pass,
            lane,
            slice,
            index
        }
    }

    /// Offset of the block in its lane.
    pub fn offset(&self, segment_length: u32) -> u32 {
        self.slice * segment_length + self.index
    }
}

/// Lane of the reference block: the upper 32 bits of J_1||J_2 select it,
/// except for the first slice of the first pass which stays in its own lane.
pub fn reference_lane(position: &Position, pseudo_rand: u64, lanes: u32) -> u32 {
    if position.pass == 0 && position.slice == 0 {
        position.lane
    }
    else {
        ((pseudo_rand >> 32) % lanes as u64) as u32
    }
}

/// Index, inside the lane, of the block referenced from `position` when the
/// reference lies in the same lane (the only case with one lane).
pub fn reference_index(
    position: &Position,
    pseudo_rand: u64,
    segment_length: u32,
    lane_length: u32
) -> u32 {
    index_alpha(position, pseudo_rand, segment_length, lane_length, true)
}

/// Index, inside the reference lane, of the block referenced from `position`.
/// The window holds at least one block, an empty lane gives index 0.
pub fn index_alpha(
    position: &Position,
    pseudo_rand: u64,
    segment_length: u32,
    lane_length: u32,
    same_lane: bool
) -> u32 {
    let segment_length = segment_length as u64;
    let lane_length = lane_length as u64;
    let slice = position.slice as u64;
    let index = position.index as u64;

    // The block just before the current one is already an input of G,
    // it is removed from the window when the reference is in the same lane.
    // Blocks of the current segment in other lanes are never referenced.
    let reference_area_size = if position.pass == 0 {
        if position.slice == 0 {
            index.saturating_sub(1)
        }
        else if same_lane {
            (slice * segment_length + index).saturating_sub(1)
        }
        else if index == 0 {
            (slice * segment_length).saturating_sub(1)
        }
        else {
            slice * segment_length
        }
    }
    else if same_lane {
        (lane_length.saturating_sub(segment_length) + index).saturating_sub(1)
    }
    else if index == 0 {
        lane_length.saturating_sub(segment_length).saturating_sub(1)
    }
    else {
        lane_length.saturating_sub(segment_length)
    };
    let reference_area_size = reference_area_size.max(1);

    // x = J_1^2 / 2^32
    // y = (|W| * x) / 2^32
    // zz = |W| - 1 - y
    let j1 = pseudo_rand & 0xFFFF_FFFF;
    let x = (j1 * j1) >> 32;
    let y = (reference_area_size * x) >> 32;
    let relative_position = reference_area_size - 1 - y;

    // after the first pass, the window starts right after the current segment
    let start_position = match position.pass {
        0 => 0,
        _ => match position.slice {
            s if s == SYNC_POINTS - 1 => 0,
            _ => (slice + 1) * segment_length
        }
    };

    ((start_position + relative_position) % lane_length.max(1)) as u32
}

#[cfg(test)]
mod tests {
    use rand::{
        Rng,
        SeedableRng,
        rngs::SmallRng
    };
    use super::*;

    #[test]
    fn test_most_recent_and_oldest() {
        let segment_length = 16;
        let lane_length = 64;

        // J_1 = 0 picks the most recent block of the window
        let position = Position::new(0, 0, 0, 5);
        assert_eq!(reference_index(&position, 0, segment_length, lane_length), 3);
        let position = Position::new(0, 0, 2, 5);
        assert_eq!(reference_index(&position, 0, segment_length, lane_length), 2 * 16 + 3);
        let position = Position::new(1, 0, 1, 5);
        assert_eq!(reference_index(&position, 0, segment_length, lane_length), 16 + 3);
        let position = Position::new(1, 0, 1, 0);
        assert_eq!(reference_index(&position, 0, segment_length, lane_length), 14);

        // J_1 = 2^32 - 1 picks the oldest one
        let j1 = 0xFFFF_FFFF;
        let position = Position::new(0, 0, 0, 5);
        assert_eq!(reference_index(&position, j1, segment_length, lane_length), 0);
        let position = Position::new(0, 0, 3, 7);
        assert_eq!(reference_index(&position, j1, segment_length, lane_length), 0);
        let position = Position::new(1, 0, 1, 5);
        assert_eq!(reference_index(&position, j1, segment_length, lane_length), 2 * 16);
        let position = Position::new(2, 0, 3, 5);
        assert_eq!(reference_index(&position, j1, segment_length, lane_length), 0);

        // upper half does not take part in the index
        let position = Position::new(1, 0, 2, 9);
        assert_eq!(
            reference_index(&position, 0x1234_5678_0000_0000, segment_length, lane_length),
            reference_index(&position, 0, segment_length, lane_length)
        );
    }

    #[test]
    fn test_no_self_reference() {
        let mut rng = SmallRng::seed_from_u64(11);
        for segment_length in [2u32, 3, 16, 257] {
            let lane_length = segment_length * SYNC_POINTS;
            for pass in 0..3 {
                for slice in 0..SYNC_POINTS {
                    let first = if pass == 0 && slice == 0 { 2 } else { 0 };
                    for index in first..segment_length {
                        let position = Position::new(pass, 0, slice, index);
                        let current = position.offset(segment_length);
                        let prev = (current + lane_length - 1) % lane_length;
                        for _ in 0..64 {
                            let pseudo_rand = rng.random::<u64>();
                            let z = reference_index(
                                &position, pseudo_rand, segment_length, lane_length
                            );
                            assert!(z < lane_length);
                            assert_ne!(z, current);
                            assert_ne!(z, prev);
                            if pass == 0 {
                                // only blocks already computed
                                assert!(z < current);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_other_lane_window() {
        let mut rng = SmallRng::seed_from_u64(12);
        let segment_length = 8;
        let lane_length = 32;
        for pass in 0..2 {
            for slice in 0..SYNC_POINTS {
                if pass == 0 && slice == 0 {
                    continue;
                }
                for index in 0..segment_length {
                    let position = Position::new(pass, 0, slice, index);
                    for _ in 0..64 {
                        let z = index_alpha(
                            &position, rng.random(), segment_length, lane_length, false
                        );
                        // never the segment being computed
                        assert_ne!(z / segment_length, slice);
                        // the last block of the previous segment is still being
                        // computed in the other lanes at index 0
                        if index == 0 {
                            let last = (slice * segment_length + lane_length - 1) % lane_length;
                            assert_ne!(z, last);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_quadratic_bias() {
        let mut rng = SmallRng::seed_from_u64(13);
        let segment_length = 1024;
        let lane_length = 4 * segment_length;

        for position in [Position::new(0, 0, 3, 600), Position::new(2, 0, 1, 300)] {
            let window = if position.pass == 0 {
                position.offset(segment_length) - 1
            } else {
                lane_length - segment_length + position.index - 1
            };
            let start = if position.pass == 0 {
                0
            } else {
                (position.slice + 1) * segment_length
            };

            let mut oldest = 0;
            let mut recent = 0;
            for _ in 0..30000 {
                let z = reference_index(&position, rng.random(), segment_length, lane_length);
                let relative = (z + lane_length - start) % lane_length;
                assert!(relative < window);
                if relative < window / 3 {
                    oldest += 1;
                }
                else if relative >= 2 * window / 3 {
                    recent += 1;
                }
            }
            assert!(recent > 2 * oldest, "recent {recent}, oldest {oldest}");
        }
    }

    #[test]
    fn test_degenerate_lengths() {
        let mut rng = SmallRng::seed_from_u64(14);
        for _ in 0..100 {
            let pseudo_rand: u64 = rng.random();
            for pass in 0..2 {
                for slice in 0..SYNC_POINTS {
                    for index in 0..3 {
                        let position = Position::new(pass, 0, slice, index);
                        assert_eq!(reference_index(&position, pseudo_rand, 0, 0), 0);
                        assert_eq!(index_alpha(&position, pseudo_rand, 0, 0, false), 0);
                        assert!(reference_index(&position, pseudo_rand, 0, 4) < 4);
                        assert!(index_alpha(&position, pseudo_rand, 0, 4, false) < 4);
                    }
                }
            }
        }
        assert_eq!(reference_index(&Position::new(0, 0, 1, 0), 7, 0, 0), 0);
    }

    #[test]
    fn test_reference_lane() {
        let position = Position::new(0, 3, 0, 7);
        assert_eq!(reference_lane(&position, 0xFFFF_FFFF_FFFF_FFFF, 4), 3);

        let position = Position::new(0, 3, 1, 7);
        assert_eq!(reference_lane(&position, 0x0000_0006_0000_0000, 4), 2);
        assert_eq!(reference_lane(&position, 0x0000_0006_0000_0000, 1), 0);

        let position = Position::new(1, 0, 0, 0);
        assert_eq!(reference_lane(&position, 0x0000_0001_FFFF_FFFF, 4), 1);
    }
}
