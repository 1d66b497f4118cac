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

mod cache;
mod config;
pub mod errors;

pub use cache::{
    CacheParams,
    CacheSalt,
    cache_digest,
    raw_cache
};

pub use config::Config;

#[cfg(target_family="unix")]
const CONFIGURATION_FILE: &str = ".rxargon/rxargon.conf";
#[cfg(target_family="windows")]
const CONFIGURATION_FILE: &str = "Documents/rxargon/rxargon.conf";
