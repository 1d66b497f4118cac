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

use rxargon_crypto::argon2;

#[derive(Debug)]
pub enum Error {
    // common errors
    Io(std::io::Error),
    CannotGetHomeDir,

    // crypto errors
    Argon2(argon2::Error),

    // cache
    EmptyKey,

    // configuration
    Hex(hex::FromHexError),
    Config(&'static str),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<argon2::Error> for Error {
    fn from(value: argon2::Error) -> Self {
        Self::Argon2(value)
    }
}

impl From<hex::FromHexError> for Error {
    fn from(value: hex::FromHexError) -> Self {
        Self::Hex(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::CannotGetHomeDir => write!(f, "Cannot retrieve home path."),

            Self::Argon2(err) => write!(f, "{err}"),

            Self::EmptyKey => write!(f, "Cache: the key is empty."),

            Self::Hex(err) => write!(f, "Configuration: {err}."),
            Self::Config(s) => write!(f, "Configuration: {s}."),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
