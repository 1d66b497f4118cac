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

use std::path::{
    Path,
    PathBuf
};
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::cache::{
    CacheParams,
    CacheSalt
};
use crate::errors::{Error, Result};
use crate::CONFIGURATION_FILE;

fn get_configuration_file() -> Result<PathBuf> {
    match dirs::home_dir() {
        Some(home_path) => Ok(home_path.join(CONFIGURATION_FILE)),
        None => Err(Error::CannotGetHomeDir)
    }
}

fn parse_u32(value: &str, err: &'static str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| Error::Config(err))
}

// removes quotes around the value if any
fn unquote(s: &str) -> &str {
    s.strip_prefix("\"")
        .and_then(|s| s.strip_suffix("\""))
        .unwrap_or(s)
}

pub struct Config {
    time_cost: u32,
    memory_cost: u32,
    lanes: u32,
    digest_length: u32,
    salt: Option<Vec<u8>>,
    h0_tag_length: Option<u32>
}

impl Config {
    const TIME_COST: &str = "time-cost";
    const MEMORY_COST: &str = "memory-cost";
    const LANES: &str = "lanes";
    const DIGEST_LENGTH: &str = "digest-length";
    const SALT: &str = "salt";
    const H0_TAG_LENGTH: &str = "h0-tag-length";

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            time_cost: CacheParams::DEFAULT_TIME_COST,
            memory_cost: CacheParams::DEFAULT_MEMORY_KIB,
            lanes: CacheParams::DEFAULT_LANES,
            digest_length: CacheParams::DEFAULT_DIGEST_LENGTH,
            salt: None,
            h0_tag_length: None
        }
    }

    /// Loads the configuration file of the home directory, if it exists.
    pub fn load_config_file() -> Result<Self> {
        let path = get_configuration_file()?;
        match path.is_file() {
            true => Self::load_from(&path),
            false => Ok(Self::new())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::new();
        let lines = BufReader::new(File::open(path)?).lines();
        for line in lines {
            let line = line?;
            config.parse_config_line(&line)?;
        }
        Ok(config)
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn set_time_cost(&mut self, time_cost: u32) {
        self.time_cost = time_cost;
    }

    pub fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    pub fn set_memory_cost(&mut self, memory_cost: u32) {
        self.memory_cost = memory_cost;
    }

    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    pub fn set_lanes(&mut self, lanes: u32) {
        self.lanes = lanes;
    }

    pub fn digest_length(&self) -> u32 {
        self.digest_length
    }

    pub fn set_digest_length(&mut self, digest_length: u32) {
        self.digest_length = digest_length;
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    pub fn set_salt(&mut self, salt: Option<Vec<u8>>) {
        self.salt = salt;
    }

    pub fn h0_tag_length(&self) -> Option<u32> {
        self.h0_tag_length
    }

    pub fn set_h0_tag_length(&mut self, h0_tag_length: Option<u32>) {
        self.h0_tag_length = h0_tag_length;
    }

    pub fn cache_params(&self) -> CacheParams {
        CacheParams {
            time_cost: self.time_cost,
            memory_kib: self.memory_cost,
            lanes: self.lanes,
            digest_length: self.digest_length,
            salt: match &self.salt {
                Some(salt) => CacheSalt::Fixed(salt.clone()),
                None => CacheSalt::Key
            },
            h0_tag_length: self.h0_tag_length
        }
    }

    fn parse_config_line(&mut self, line: &str) -> Result<()> {
        // comment or empty line
        let line = line.trim();
        if line.is_empty() || line.starts_with("#") {
            return Ok(())
        }

        // key = value
        let Some((key, value)) = line.split_once("=") else {
            return Err(Error::Config("bad configuration line"));
        };

        let key = key.trim();
        let value = unquote(value.trim());
        if key == Self::TIME_COST {
            match parse_u32(value, "time cost is not an integer")? {
                0 => return Err(Error::Config("time cost must be positive")),
                t => self.time_cost = t
            }
        }
        else if key == Self::MEMORY_COST {
            self.memory_cost = parse_u32(value, "memory cost is not an integer")?;
        }
        else if key == Self::LANES {
            match parse_u32(value, "number of lanes is not an integer")? {
                0 => return Err(Error::Config("number of lanes must be positive")),
                p => self.lanes = p
            }
        }
        else if key == Self::DIGEST_LENGTH {
            self.digest_length = parse_u32(value, "digest length is not an integer")?;
        }
        else if key == Self::SALT {
            self.salt = Some(hex::decode(value)?);
        }
        else if key == Self::H0_TAG_LENGTH {
            self.h0_tag_length = Some(parse_u32(value, "H0 tag length is not an integer")?);
        }
        else {
            return Err(Error::Config("bad configuration line"))
        }

        Ok(())
    }
}
