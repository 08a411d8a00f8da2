//! Command line interface for `signstar-pkey`.

use std::{
    fs::{read, read_to_string, write},
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use log::info;
use rand::rngs::OsRng;
use rsa::BigUint;

use crate::{
    DhKey,
    DsaKey,
    DsaKeySize,
    KeyMaterial,
    KeySignature,
    MessageDigest,
    PKey,
    RsaKey,
    config::Config,
};

/// An error that may occur when running a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key error.
    #[error("Key error: {0}")]
    Key(#[from] crate::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::Error),

    /// An I/O error occurred for a file.
    #[error("I/O error for file {path} while {context}: {source}")]
    IoPath {
        /// The path to the file for which the error occurred.
        path: PathBuf,
        /// The context in which the error occurs.
        ///
        /// This is meant to complete the sentence "I/O error for file {path} while ".
        context: &'static str,
        /// The error source.
        source: std::io::Error,
    },

    /// An I/O error occurred while writing to the output.
    #[error("I/O error while writing output: {0}")]
    Output(#[source] std::io::Error),

    /// A hexadecimal string can not be decoded.
    #[error("Invalid hexadecimal {context}: {source}")]
    Hex {
        /// The value which is decoded.
        context: &'static str,
        /// The error source.
        source: hex::FromHexError,
    },

    /// A signature does not match the data.
    #[error("The signature in {path} does not match the data")]
    SignatureMismatch {
        /// The path to the signature file.
        path: PathBuf,
    },
}

/// Command line arguments of `signstar-pkey`.
#[derive(Debug, Parser)]
#[command(
    about = "Create, inspect and use RSA, DSA and Diffie-Hellman keys.",
    version
)]
pub struct Cli {
    /// Global processing log verbosity.
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// The path to a configuration file.
    ///
    /// If unset, the configuration in the default per-user location is used.
    #[arg(env = "SIGNSTAR_PKEY_CONFIG", global = true, long)]
    pub config: Option<PathBuf>,

    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The commands of `signstar-pkey`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a private key and write it as PEM.
    #[command(subcommand)]
    Generate(GenerateCommand),

    /// Write the public key of a key as PEM.
    Public(PublicCommand),

    /// Sign a file.
    Sign(SignCommand),

    /// Verify the signature of a file.
    Verify(VerifyCommand),

    /// Print the components of a key.
    Text(TextCommand),
}

/// The key types that can be generated.
#[derive(Debug, Subcommand)]
pub enum GenerateCommand {
    /// Generate an RSA key.
    Rsa {
        /// The bit length of the modulus (defaults to the configured value).
        #[arg(long)]
        bits: Option<usize>,

        /// The file to write the key to (defaults to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate DSA domain parameters and a key.
    Dsa {
        /// The size of the key, e.g. "2048-256" (defaults to the configured value).
        #[arg(long)]
        size: Option<DsaKeySize>,

        /// The file to write the key to (defaults to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create Diffie-Hellman parameters.
    Dh {
        /// The prime as hexadecimal string.
        #[arg(long)]
        prime: String,

        /// The generator.
        #[arg(default_value_t = 2, long)]
        generator: u32,

        /// The file to write the parameters to (defaults to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Public key export input parameters.
#[derive(Debug, Parser)]
pub struct PublicCommand {
    /// The PEM encoded key.
    #[arg(long)]
    pub key: PathBuf,

    /// The file to write the public key to (defaults to stdout).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Signing input parameters.
#[derive(Debug, Parser)]
pub struct SignCommand {
    /// The PEM encoded private key.
    #[arg(long)]
    pub key: PathBuf,

    /// The message digest (defaults to the configured value).
    #[arg(long)]
    pub digest: Option<MessageDigest>,

    /// The file to sign.
    #[arg(long)]
    pub input: PathBuf,

    /// The file to write the signature to.
    #[arg(long)]
    pub output: PathBuf,
}

/// Verification input parameters.
#[derive(Debug, Parser)]
pub struct VerifyCommand {
    /// The PEM encoded key.
    #[arg(long)]
    pub key: PathBuf,

    /// The message digest (defaults to the configured value).
    #[arg(long)]
    pub digest: Option<MessageDigest>,

    /// The file containing the signature.
    #[arg(long)]
    pub signature: PathBuf,

    /// The signed file.
    #[arg(long)]
    pub input: PathBuf,
}

/// Key dump input parameters.
#[derive(Debug, Parser)]
pub struct TextCommand {
    /// The PEM encoded key.
    #[arg(long)]
    pub key: PathBuf,
}

fn read_file(path: &Path, context: &'static str) -> Result<Vec<u8>, Error> {
    read(path).map_err(|source| Error::IoPath {
        path: path.to_path_buf(),
        context,
        source,
    })
}

fn read_key(path: &Path) -> Result<PKey, Error> {
    let pem = read_to_string(path).map_err(|source| Error::IoPath {
        path: path.to_path_buf(),
        context: "reading a key",
        source,
    })?;
    Ok(PKey::from_pem(&pem)?)
}

/// Writes `data` to the file at `path` or to `out` if `path` is [`None`].
fn write_output(path: Option<&Path>, data: &[u8], out: &mut impl Write) -> Result<(), Error> {
    if let Some(path) = path {
        write(path, data).map_err(|source| Error::IoPath {
            path: path.to_path_buf(),
            context: "writing output",
            source,
        })
    } else {
        out.write_all(data).map_err(Error::Output)
    }
}

fn generate(command: GenerateCommand, config: &Config, out: &mut impl Write) -> Result<(), Error> {
    let (key, output) = match command {
        GenerateCommand::Rsa { bits, output } => {
            let bits = bits.unwrap_or(config.rsa_bits);
            info!("Generating an RSA key of {bits} bits");
            (PKey::from(RsaKey::generate(&mut OsRng, bits)?), output)
        }
        GenerateCommand::Dsa { size, output } => {
            let size = size.unwrap_or(config.dsa_key_size);
            info!("Generating a DSA key of size {size}");
            (PKey::from(DsaKey::generate(&mut OsRng, size)), output)
        }
        GenerateCommand::Dh {
            prime,
            generator,
            output,
        } => {
            let prime = hex::decode(prime.trim_start_matches("0x")).map_err(|source| {
                Error::Hex {
                    context: "prime",
                    source,
                }
            })?;
            let params = DhKey::new(BigUint::from_bytes_be(&prime), BigUint::from(generator))?;
            (PKey::from(params), output)
        }
    };

    write_output(output.as_deref(), key.to_pem()?.as_bytes(), out)
}

/// Runs `command` and writes its results to `out`.
///
/// Values that are not provided by the command are taken from `config`.
///
/// # Errors
///
/// Returns an error if
/// - reading a key, signature or input file fails,
/// - a key can not be created or decoded,
/// - signing or verification fails,
/// - a signature does not match the data,
/// - or writing the output fails.
pub fn run_command(command: Command, config: &Config, out: &mut impl Write) -> Result<(), Error> {
    match command {
        Command::Generate(command) => generate(command, config, out),
        Command::Public(command) => {
            let key = read_key(&command.key)?.public_key();
            write_output(command.output.as_deref(), key.to_pem()?.as_bytes(), out)
        }
        Command::Sign(command) => {
            let key = read_key(&command.key)?;
            let digest = command.digest.unwrap_or(config.digest);
            let data = read_file(&command.input, "reading the input")?;
            let signature = key.sign(digest, &data)?;
            write(&command.output, signature).map_err(|source| Error::IoPath {
                path: command.output.clone(),
                context: "writing the signature",
                source,
            })
        }
        Command::Verify(command) => {
            let key = read_key(&command.key)?;
            let digest = command.digest.unwrap_or(config.digest);
            let signature = read_file(&command.signature, "reading the signature")?;
            let data = read_file(&command.input, "reading the input")?;
            if !key.verify(digest, &signature, &data)? {
                return Err(Error::SignatureMismatch {
                    path: command.signature,
                });
            }
            info!("Signature in {:?} is valid", command.signature);
            Ok(())
        }
        Command::Text(command) => {
            let key = read_key(&command.key)?;
            write_output(None, key.to_text().as_bytes(), out)
        }
    }
}

impl Cli {
    /// Loads the configuration and runs the command, writing its results to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration can not be loaded or [`run_command`] fails.
    pub fn run(self, out: &mut impl Write) -> Result<(), Error> {
        let config = Config::load(self.config.as_deref())?;
        run_command(self.command, &config, out)
    }
}
