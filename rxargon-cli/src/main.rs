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
use std::io::{
    BufWriter,
    Write
};

use rxargon_core::{
    CacheParams,
    Config
};

use rxargon_crypto::argon2::{
    Argon2,
    Argon2Params,
    extendable_hash
};

use rpassword::prompt_password;
use secrecy::SecretSlice;

use clap::{
    Arg,
    ArgAction,
    ArgGroup,
    ArgMatches,
    Command,
    value_parser,
};

const RXARGON_VERSION: &str = env!("CARGO_PKG_VERSION");

enum RxArgonError {
    Io(std::io::Error),
    CoreError(rxargon_core::errors::Error),
    CliError(&'static str),
    FileAlreadyExists(PathBuf),
}

impl From<std::io::Error> for RxArgonError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rxargon_core::errors::Error> for RxArgonError {
    fn from(value: rxargon_core::errors::Error) -> Self {
        Self::CoreError(value)
    }
}

impl From<rxargon_crypto::argon2::Error> for RxArgonError {
    fn from(value: rxargon_crypto::argon2::Error) -> Self {
        Self::CoreError(value.into())
    }
}

impl std::fmt::Display for RxArgonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::CliError(s) => write!(f, "{s}"),
            Self::CoreError(e) => write!(f, "{e}"),
            Self::FileAlreadyExists(p) => write!(
                f, "File \"{}\" already exists.", p.display()
            ),
        }
    }
}

type Result<T> = core::result::Result<T, RxArgonError>;

fn output_arg() -> Arg {
    Arg::new("output")
        .help("Output file path")
        .long("output")
        .short('o')
        .value_parser(value_parser!(PathBuf))
}

fn argon2_params_arg() -> [Arg; 4] {
    [
        Arg::new("cost_m")
            .help(format!(
                "Memory usage in KiB (default: {})",
                Argon2Params::DEFAULT_COST_M
            ))
            .short('m')
            .value_parser(value_parser!(u32)),
        Arg::new("cost_p")
            .help(format!(
                "Number of lanes (default: {})",
                Argon2Params::DEFAULT_COST_P
            ))
            .short('p')
            .value_parser(value_parser!(u32)),
        Arg::new("cost_t")
            .help(format!(
                "Number of passes (default: {})",
                Argon2Params::DEFAULT_COST_T
            ))
            .short('t')
            .value_parser(value_parser!(u32)),
        Arg::new("tag_length")
            .help(format!(
                "Output length in bytes (default: {})",
                Argon2Params::DEFAULT_TAG_LENGTH
            ))
            .short('l')
            .value_parser(value_parser!(u32))
    ]
}

fn main() {
    let mut cmd = Command::new("rxargon")
        .version(RXARGON_VERSION)
        .about(format!(
            "RxArgon: Argon2d hashes and RandomX-style caches (version {RXARGON_VERSION})\n\
            Copyright (C) 2025 A. Russon"))
        .subcommand(
            Command::new("hash")
                .about("Hash a password with Argon2d")
                .args(argon2_params_arg())
                .arg(
                    Arg::new("salt")
                        .help("Salt (text)")
                        .long("salt")
                        .short('s')
                )
                .arg(
                    Arg::new("salt hex")
                        .help("Salt (hexadecimal)")
                        .long("salt-hex")
                )
                .group(
                    ArgGroup::new("salt input")
                        .args(["salt", "salt hex"])
                        .required(true)
                        .multiple(false)
                )
                .arg(
                    Arg::new("password")
                        .help("Password (prompted if absent)")
                        .long("password")
                )
                .arg(
                    Arg::new("verify")
                        .help("Expected hash (hexadecimal), checked instead of printed")
                        .long("verify")
                )
        )
        .subcommand(
            Command::new("long-hash")
                .about("Variable-length Blake2b hash (H')")
                .arg(
                    Arg::new("length")
                        .help("Output length in bytes")
                        .long("length")
                        .short('l')
                        .value_parser(value_parser!(u32))
                        .required(true)
                )
                .arg(
                    Arg::new("text")
                        .help("Input text")
                )
                .arg(
                    Arg::new("hex")
                        .help("Input (hexadecimal)")
                        .long("hex")
                )
                .group(
                    ArgGroup::new("input")
                        .args(["text", "hex"])
                        .required(true)
                        .multiple(false)
                )
        )
        .subcommand(
            Command::new("cache")
                .about("Build a cache from a key")
                .arg(
                    Arg::new("key")
                        .help("Key (used as password and, by default, as salt)")
                        .required(true)
                )
                .arg(
                    Arg::new("raw")
                        .help("Keep the whole memory instead of the finalized digest")
                        .long("raw")
                        .short('r')
                        .action(ArgAction::SetTrue)
                )
                .arg(
                    Arg::new("randomx")
                        .help("Use RandomX salt and H0 tag length")
                        .long("randomx")
                        .action(ArgAction::SetTrue)
                )
                .arg(
                    Arg::new("config")
                        .help("Configuration file")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                )
                .arg(output_arg())
                .args(argon2_params_arg())
        );

    let help = cmd.render_long_help();
    let mut matches = cmd.get_matches();

    if let Some((cmd_name, mut matches)) = matches.remove_subcommand() {
        let res = if cmd_name.eq("hash") {
            hash(&mut matches)
        }
        else if cmd_name.eq("long-hash") {
            long_hash(&mut matches)
        }
        else {
            // only "cache" remains
            cache(&mut matches)
        };

        if let Err(err) = res {
            eprintln!("[!] {err}");
            std::process::exit(1);
        }
    }
    else {
        eprintln!("{}", &help.ansi());
    }
}

fn get_password(matches: &mut ArgMatches) -> Result<SecretSlice<u8>> {
    let password = match matches.remove_one::<String>("password") {
        Some(password) => password,
        None => prompt_password("Enter password: ")?
    };
    Ok(SecretSlice::from(password.into_bytes()))
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|_| RxArgonError::CliError("invalid hexadecimal string"))
}

fn hash(matches: &mut ArgMatches) -> Result<()> {
    let salt = match matches.remove_one::<String>("salt") {
        Some(salt) => salt.into_bytes(),
        // the group makes one of the two arguments required
        None => decode_hex(&matches.remove_one::<String>("salt hex").unwrap_or_default())?
    };

    let params = Argon2Params::new(
        *matches.get_one::<u32>("cost_m").unwrap_or(&Argon2Params::DEFAULT_COST_M),
        *matches.get_one::<u32>("cost_p").unwrap_or(&Argon2Params::DEFAULT_COST_P),
        *matches.get_one::<u32>("cost_t").unwrap_or(&Argon2Params::DEFAULT_COST_T),
    ).with_tag_length(
        *matches.get_one::<u32>("tag_length").unwrap_or(&Argon2Params::DEFAULT_TAG_LENGTH)
    );
    params.validate(true)?;

    let password = get_password(matches)?;
    eprintln!("{params}");

    match matches.remove_one::<String>("verify") {
        Some(expected) => {
            let expected = decode_hex(&expected)?;
            match Argon2::verify(&password, &salt, &[], &[], &params, &expected)? {
                true => println!("OK"),
                false => return Err(RxArgonError::CliError("hash does not match"))
            }
        },
        None => {
            let tag = Argon2::hash(&password, &salt, &[], &[], &params)?;
            println!("{}", hex::encode(tag));
        }
    }
    Ok(())
}

fn long_hash(matches: &mut ArgMatches) -> Result<()> {
    // required argument, cannot panic
    let length = *matches.get_one::<u32>("length").unwrap();
    let input = match matches.remove_one::<String>("text") {
        Some(text) => text.into_bytes(),
        None => decode_hex(&matches.remove_one::<String>("hex").unwrap_or_default())?
    };

    println!("{}", hex::encode(extendable_hash(&input, length)));
    Ok(())
}

// An explicit configuration file must be valid, only the default one
// falls back to the built-in parameters.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from(path)?),
        None => match Config::load_config_file() {
            Ok(config) => Ok(config),
            Err(err) => {
                eprintln!("[!] {err} (using default parameters)");
                Ok(Config::new())
            }
        }
    }
}

fn cache_params(matches: &mut ArgMatches) -> Result<CacheParams> {
    let path = matches.remove_one::<PathBuf>("config");
    let mut config = load_config(path.as_deref())?;

    // command-line arguments take precedence
    if let Some(cost_m) = matches.get_one::<u32>("cost_m") {
        config.set_memory_cost(*cost_m);
    }
    if let Some(cost_p) = matches.get_one::<u32>("cost_p") {
        config.set_lanes(*cost_p);
    }
    if let Some(cost_t) = matches.get_one::<u32>("cost_t") {
        config.set_time_cost(*cost_t);
    }
    if let Some(tag_length) = matches.get_one::<u32>("tag_length") {
        config.set_digest_length(*tag_length);
    }
    if matches.get_flag("randomx") {
        let randomx = CacheParams::randomx();
        config.set_salt(Some(CacheParams::RANDOMX_SALT.to_vec()));
        config.set_h0_tag_length(randomx.h0_tag_length);
    }

    Ok(config.cache_params())
}

fn output_path(matches: &mut ArgMatches) -> Result<Option<PathBuf>> {
    match matches.remove_one::<PathBuf>("output") {
        Some(output) if output.exists() => Err(RxArgonError::FileAlreadyExists(output)),
        output => Ok(output)
    }
}

fn cache(matches: &mut ArgMatches) -> Result<()> {
    // required argument, cannot panic
    let key = SecretSlice::from(matches.remove_one::<String>("key").unwrap().into_bytes());
    let params = cache_params(matches)?;
    let output = output_path(matches)?;

    eprintln!("{params}");
    if matches.get_flag("raw") {
        let memory = rxargon_core::raw_cache(&key, &params)?;
        println!("0x{:016x}", memory.first_word());
        if let Some(path) = output {
            let mut writer = BufWriter::new(File::create(&path)?);
            memory.write_to(&mut writer)?;
            writer.flush()?;
            eprintln!("Raw cache ({} bytes) written to {}", memory.byte_len(), path.display());
        }
    }
    else {
        let digest = rxargon_core::cache_digest(&key, &params)?;
        match digest.get(..8) {
            Some(first) => {
                // cannot panic, 8 bytes
                let word = u64::from_le_bytes(first.try_into().unwrap());
                println!("0x{word:016x}");
            },
            None => println!("{}", hex::encode(&digest))
        }
        if let Some(path) = output {
            let mut writer = BufWriter::new(File::create(&path)?);
            writer.write_all(&digest)?;
            writer.flush()?;
            eprintln!("Cache digest ({} bytes) written to {}", digest.len(), path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.conf");
        assert!(matches!(
            load_config(Some(missing.as_path())),
            Err(RxArgonError::CoreError(rxargon_core::errors::Error::Io(_)))
        ));

        let malformed = dir.path().join("malformed.conf");
        std::fs::write(&malformed, "lanes = two\n").unwrap();
        assert!(matches!(
            load_config(Some(malformed.as_path())),
            Err(RxArgonError::CoreError(rxargon_core::errors::Error::Config(_)))
        ));

        let valid = dir.path().join("valid.conf");
        std::fs::write(&valid, "memory-cost = 64\nlanes = 2\n").unwrap();
        let Ok(config) = load_config(Some(valid.as_path())) else {
            panic!("valid configuration rejected");
        };
        assert_eq!(config.memory_cost(), 64);
        assert_eq!(config.lanes(), 2);
    }
}
