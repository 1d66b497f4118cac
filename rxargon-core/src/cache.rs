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

use secrecy::{
    ExposeSecret,
    SecretSlice
};
use rxargon_crypto::argon2::{
    Argon2,
    Argon2Params,
    Memory
};

use crate::errors::{
    Error,
    Result
};

/// Salt used to build the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheSalt {
    /// The key is both the password and the salt.
    Key,
    Fixed(Vec<u8>),
}

/// Argon2d parameters of a cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheParams {
    pub time_cost: u32,
    pub memory_kib: u32,
    pub lanes: u32,
    /// Length of the digest in cache-summary mode.
    pub digest_length: u32,
    pub salt: CacheSalt,
    /// Tag length written in H_0 for the raw cache (defaults to `digest_length`).
    pub h0_tag_length: Option<u32>,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            time_cost: Self::DEFAULT_TIME_COST,
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            lanes: Self::DEFAULT_LANES,
            digest_length: Self::DEFAULT_DIGEST_LENGTH,
            salt: CacheSalt::Key,
            h0_tag_length: None,
        }
    }
}

impl CacheParams {
    pub const DEFAULT_TIME_COST: u32 = 3;
    pub const DEFAULT_MEMORY_KIB: u32 = 262144; // 256 MiB
    pub const DEFAULT_LANES: u32 = 1;
    pub const DEFAULT_DIGEST_LENGTH: u32 = 262144; // 256 KiB

    pub const RANDOMX_SALT: &[u8] = b"RandomX\x03";

    /// Parameters of the RandomX cache: fixed salt and no tag.
    pub fn randomx() -> Self {
        Self {
            salt: CacheSalt::Fixed(Self::RANDOMX_SALT.to_vec()),
            h0_tag_length: Some(0),
            ..Default::default()
        }
    }

    fn argon2_params(&self, tag_length: u32) -> Argon2Params {
        Argon2Params::new(self.memory_kib, self.lanes, self.time_cost)
            .with_tag_length(tag_length)
    }

    fn salt<'a>(&'a self, key: &'a [u8]) -> &'a [u8] {
        match &self.salt {
            CacheSalt::Key => key,
            CacheSalt::Fixed(salt) => salt
        }
    }
}

impl std::fmt::Display for CacheParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: Argon2d (memory: {} KiB, lanes: {}, passes: {}, salt: {})",
            self.memory_kib,
            self.lanes,
            self.time_cost,
            match &self.salt {
                CacheSalt::Key => "key".to_string(),
                CacheSalt::Fixed(salt) => hex::encode(salt),
            }
        )
    }
}

/// Cache-summary mode: the finalized Argon2d digest of `digest_length` bytes.
pub fn cache_digest(key: &SecretSlice<u8>, params: &CacheParams) -> Result<Vec<u8>> {
    let key_bytes = check_key(key)?;
    let argon2_params = params.argon2_params(params.digest_length);
    let digest = Argon2::hash(key, params.salt(key_bytes), &[], &[], &argon2_params)?;
    Ok(digest)
}

/// Raw-cache mode: the whole Argon2d memory after the last pass, not finalized.
pub fn raw_cache(key: &SecretSlice<u8>, params: &CacheParams) -> Result<Memory> {
    let key_bytes = check_key(key)?;
    let tag_length = params.h0_tag_length.unwrap_or(params.digest_length);
    let argon2_params = params.argon2_params(tag_length);
    let memory = Argon2::fill_memory(key, params.salt(key_bytes), &[], &[], &argon2_params)?;
    Ok(memory)
}

fn check_key(key: &SecretSlice<u8>) -> Result<&[u8]> {
    let key = key.expose_secret();
    match key.is_empty() {
        true => Err(Error::EmptyKey),
        false => Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use rxargon_crypto::argon2::{
        self,
        argon2d
    };
    use super::*;

    fn small_params() -> CacheParams {
        CacheParams {
            time_cost: 2,
            memory_kib: 64,
            digest_length: 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_key_as_salt() {
        let key = SecretSlice::from(b"test key 000".to_vec());
        let params = small_params();

        let digest = cache_digest(&key, &params).unwrap();
        assert_eq!(digest.len(), 1024);
        assert_eq!(
            digest,
            argon2d(b"test key 000", b"test key 000", 2, 64, 1, 1024).unwrap()
        );

        // the digest is the finalization of the raw cache
        let memory = raw_cache(&key, &params).unwrap();
        assert_eq!(memory.len(), 64);
        assert_eq!(memory.finalize(1024), digest);
    }

    #[test]
    fn test_fixed_salt() {
        let key = SecretSlice::from(b"test key 000".to_vec());
        let params = CacheParams {
            salt: CacheSalt::Fixed(b"somesalt".to_vec()),
            ..small_params()
        };
        assert_eq!(
            cache_digest(&key, &params).unwrap(),
            argon2d(b"test key 000", b"somesalt", 2, 64, 1, 1024).unwrap()
        );
        assert_ne!(
            cache_digest(&key, &params).unwrap(),
            cache_digest(&key, &small_params()).unwrap()
        );
    }

    #[test]
    fn test_h0_tag_length() {
        let key = SecretSlice::from(b"test key 001".to_vec());
        let params = small_params();
        let default = raw_cache(&key, &params).unwrap();
        let no_tag = raw_cache(&key, &CacheParams { h0_tag_length: Some(0), ..small_params() })
            .unwrap();
        assert_ne!(default.first_word(), no_tag.first_word());
    }

    #[test]
    fn test_invalid() {
        let key = SecretSlice::from(Vec::<u8>::new());
        assert!(matches!(cache_digest(&key, &small_params()), Err(Error::EmptyKey)));
        assert!(matches!(raw_cache(&key, &small_params()), Err(Error::EmptyKey)));

        let key = SecretSlice::from(b"key".to_vec());
        let params = CacheParams { memory_kib: 30, ..small_params() };
        assert!(matches!(
            raw_cache(&key, &params),
            Err(Error::Argon2(argon2::Error::InvalidParameters(_)))
        ));
        let params = CacheParams { digest_length: 0, ..small_params() };
        assert!(matches!(
            cache_digest(&key, &params),
            Err(Error::Argon2(argon2::Error::InvalidParameters(_)))
        ));
        assert!(raw_cache(&key, &params).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CacheParams::randomx().to_string(),
            "Cache: Argon2d (memory: 262144 KiB, lanes: 1, passes: 3, salt: 52616e646f6d5803)"
        );
        assert_eq!(
            CacheParams::default().to_string(),
            "Cache: Argon2d (memory: 262144 KiB, lanes: 1, passes: 3, salt: key)"
        );
    }

    #[test]
    #[ignore = "fills 256 MiB three times, run in release mode"]
    fn test_randomx_raw_cache() {
        let key = SecretSlice::from(b"test key 000".to_vec());
        let memory = raw_cache(&key, &CacheParams::randomx()).unwrap();
        assert_eq!(memory.byte_len(), 256 * 1024 * 1024);
        assert_eq!(memory.first_word(), 0x191e0e1d23c02186);
    }
}
