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

//! Argon2d (data-dependent addressing), version 0x13, as specified in RFC 9106.
//!
//! Argon2d is not meant to resist side-channel attacks: memory accesses
//! depend on the content of the memory.

mod blake2b_long;
mod block;
mod index;
mod memory;

use secrecy::{
    ExposeSecret,
    SecretSlice
};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::hashes::blake2::Blake2b512;

pub use blake2b_long::extendable_hash;
pub use block::Block;
pub use index::{
    Position,
    index_alpha,
    reference_index,
    reference_lane
};
pub use memory::Memory;

/// Number of slices in a pass.
pub const SYNC_POINTS: u32 = 4;

pub const VERSION: u32 = 0x13;

/// Type field of the pre-hashing digest (0 is Argon2d).
pub const ARGON2D_TYPE: u32 = 0;

// ----- Argon2 errors -----

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    InvalidBlockSize {
        actual: usize,
        expected: usize
    },
    InvalidParameters(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBlockSize { actual, expected } => write!(
                f,
                "Argon2: invalid block size ({actual} bytes instead of {expected})."
            ),
            Self::InvalidParameters(s) => write!(f, "Argon2: invalid parameters ({s})."),
        }
    }
}

impl std::error::Error for Error {}

// ----- Argon2 parameters -----

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argon2Params {
    cost_m: u32,
    cost_p: u32,
    cost_t: u32,
    tag_length: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            cost_m: Self::DEFAULT_COST_M,
            cost_p: Self::DEFAULT_COST_P,
            cost_t: Self::DEFAULT_COST_T,
            tag_length: Self::DEFAULT_TAG_LENGTH,
        }
    }
}

impl Argon2Params {
    pub const DEFAULT_COST_M: u32 = 256 * 1024; // 256 MiB
    pub const DEFAULT_COST_P: u32 = 1;
    pub const DEFAULT_COST_T: u32 = 3;
    pub const DEFAULT_TAG_LENGTH: u32 = 32;

    pub fn new(
        cost_m: u32,
        cost_p: u32,
        cost_t: u32,
    ) -> Self {
        Self {
            cost_m,
            cost_p,
            cost_t,
            ..Default::default()
        }
    }

    pub fn with_tag_length(mut self, tag_length: u32) -> Self {
        self.tag_length = tag_length;
        self
    }

    /// Checks the costs. A tag length of 0 is only valid when the tag is
    /// not computed (raw memory).
    pub fn validate(&self, tag_required: bool) -> Result<()> {
        if tag_required && self.tag_length == 0 {
            Err(Error::InvalidParameters("output length must be positive"))
        }
        else if self.cost_t < Argon2::MIN_TIME {
            Err(Error::InvalidParameters("time cost must be positive"))
        }
        else if self.cost_p < Argon2::MIN_LANES {
            Err(Error::InvalidParameters("number of lanes must be positive"))
        }
        else if self.cost_p > Argon2::MAX_LANES {
            Err(Error::InvalidParameters("too many lanes"))
        }
        else if (self.cost_m as u64) < 2 * SYNC_POINTS as u64 * self.cost_p as u64 {
            Err(Error::InvalidParameters("memory cost below 8 blocks per lane"))
        }
        else if self.cost_m as u64 % (SYNC_POINTS as u64 * self.cost_p as u64) != 0 {
            Err(Error::InvalidParameters("memory cost not a multiple of 4 blocks per lane"))
        }
        else {
            Ok(())
        }
    }

    pub fn cost_m(&self) -> u32 {
        self.cost_m
    }

    pub fn cost_p(&self) -> u32 {
        self.cost_p
    }

    pub fn cost_t(&self) -> u32 {
        self.cost_t
    }

    pub fn tag_length(&self) -> u32 {
        self.tag_length
    }
}

impl std::fmt::Display for Argon2Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Argon2d (memory: {} KiB, lanes: {}, passes: {})",
            self.cost_m,
            self.cost_p,
            self.cost_t
        )
    }
}

// ----- Argon2 -----

pub struct Argon2;

impl Argon2 {
    // Minimum and maximum number of lanes (degree of parallelism)
    pub const MIN_LANES: u32 = 1;
    pub const MAX_LANES: u32 = 0xFF_FFFF;

    // Minimum number of passes
    pub const MIN_TIME: u32 = 1;

    /// Computes the tag into `out`, whose length must be the tag length of `params`.
    pub fn hash_into(
        password: &SecretSlice<u8>,
        salt: &[u8],
        secret: &[u8],
        additional_data: &[u8],
        params: &Argon2Params,
        out: &mut [u8]
    ) -> Result<()> {
        hash_into(password.expose_secret(), salt, secret, additional_data, params, out)
    }

    pub fn hash(
        password: &SecretSlice<u8>,
        salt: &[u8],
        secret: &[u8],
        additional_data: &[u8],
        params: &Argon2Params
    ) -> Result<Vec<u8>> {
        let mut out = vec![0u8; params.tag_length as usize];
        Self::hash_into(password, salt, secret, additional_data, params, &mut out)?;
        Ok(out)
    }

    /// Fills the memory without computing the tag. The tag length of `params`
    /// is only used in the pre-hashing digest and may be 0.
    pub fn fill_memory(
        password: &SecretSlice<u8>,
        salt: &[u8],
        secret: &[u8],
        additional_data: &[u8],
        params: &Argon2Params
    ) -> Result<Memory> {
        fill_memory(password.expose_secret(), salt, secret, additional_data, params)
    }

    /// Recomputes the tag and compares it with `expected` in constant time.
    pub fn verify(
        password: &SecretSlice<u8>,
        salt: &[u8],
        secret: &[u8],
        additional_data: &[u8],
        params: &Argon2Params,
        expected: &[u8]
    ) -> Result<bool> {
        let mut tag = Self::hash(password, salt, secret, additional_data, params)?;
        let ok: bool = tag.ct_eq(expected).into();
        tag.zeroize();
        Ok(ok)
    }
}

/// Argon2d with no secret and no associated data.
pub fn argon2d(
    password: &[u8],
    salt: &[u8],
    time_cost: u32,
    memory_kib: u32,
    lanes: u32,
    tag_length: u32
) -> Result<Vec<u8>> {
    let params = Argon2Params::new(memory_kib, lanes, time_cost).with_tag_length(tag_length);
    let mut out = vec![0u8; tag_length as usize];
    hash_into(password, salt, &[], &[], &params, &mut out)?;
    Ok(out)
}

/// Pre-hashing digest H_0. Lengths of the inputs must fit on 32 bits.
pub fn h0(
    params: &Argon2Params,
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    additional_data: &[u8]
) -> [u8; 64] {
    // H_0 = H^(64)(LE32(p) || LE32(T) || LE32(m) || LE32(t) ||
    //       LE32(v) || LE32(y) || LE32(length(P)) || P ||
    //       LE32(length(S)) || S || LE32(length(K)) || K ||
    //       LE32(length(X)) || X)
    let mut digest = Blake2b512::init();
    digest.update(&params.cost_p.to_le_bytes());
    digest.update(&params.tag_length.to_le_bytes());
    digest.update(&params.cost_m.to_le_bytes());
    digest.update(&params.cost_t.to_le_bytes());
    digest.update(&VERSION.to_le_bytes());
    digest.update(&ARGON2D_TYPE.to_le_bytes());
    for input in [password, salt, secret, additional_data] {
        digest.update(&(input.len() as u32).to_le_bytes());
        digest.update(input);
    }
    digest.finalize()
}

fn hash_into(
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    additional_data: &[u8],
    params: &Argon2Params,
    out: &mut [u8]
) -> Result<()> {
    params.validate(true)?;
    if out.len() != params.tag_length as usize {
        return Err(Error::InvalidParameters("output buffer length differs from tag length"));
    }

    let memory = fill_memory(password, salt, secret, additional_data, params)?;

    // After t steps have been iterated, the output tag is computed
    // from the XOR of the last column.
    memory.finalize_into(out);
    Ok(())
}

fn fill_memory(
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    additional_data: &[u8],
    params: &Argon2Params
) -> Result<Memory> {
    params.validate(false)?;
    validate_inputs(password, salt, secret, additional_data)?;

    // Allocate the memory as m 1024-byte blocks.
    let mut memory = Memory::new(params.cost_m, params.cost_p)?;

    let mut h0 = h0(params, password, salt, secret, additional_data);
    memory.initialize(&h0);
    h0.zeroize();

    memory.fill(params.cost_t);
    Ok(memory)
}

fn validate_inputs(
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    additional_data: &[u8],
) -> Result<()> {
    const MAX_LENGTH: usize = u32::MAX as usize;

    if password.len() > MAX_LENGTH {
        Err(Error::InvalidParameters("password too long"))
    }
    else if salt.len() > MAX_LENGTH {
        Err(Error::InvalidParameters("salt too long"))
    }
    else if secret.len() > MAX_LENGTH {
        Err(Error::InvalidParameters("secret too long"))
    }
    else if additional_data.len() > MAX_LENGTH {
        Err(Error::InvalidParameters("additional data too long"))
    }
    else {
        Ok(())
    }
}
