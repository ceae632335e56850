//! Command-line interface definitions.
//!
//! The binary is the development-host stand-in for the paired mobile
//! device: it feeds the same six requests over the controller's API that
//! the device would send over the serial link, with binary arguments and
//! outputs rendered in the human-safe base-32 alphabet.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level argument parser.
#[derive(Debug, Parser)]
#[command(
    name = "keyward",
    version,
    about = "HSM-style custodian for a single paired signing key"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file path (default: ~/.keyward/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The request to perform.
    #[command(subcommand)]
    pub command: Commands,
}

/// The available requests.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },

    /// Show the controller's state and configuration.
    Status,

    /// Generate the first key pair under a device mask.
    Generate {
        /// The 32-byte device mask, base-32 encoded (52 characters).
        #[arg(long)]
        mask: String,
    },

    /// Rotate the key pair, retaining the previous one for chain signing.
    Rotate {
        /// The existing device mask, base-32 encoded.
        #[arg(long)]
        existing: String,
        /// The fresh device mask for the new pair, base-32 encoded.
        #[arg(long)]
        fresh: String,
    },

    /// Erase all key material, in RAM and on disk.
    Erase,

    /// Digest a message with SHA-512.
    Digest {
        /// The message text.
        message: String,
    },

    /// Sign a message with the custodied key.
    Sign {
        /// The device mask, base-32 encoded.
        #[arg(long)]
        mask: String,
        /// The message text.
        message: String,
    },

    /// Verify a signature against a public key.
    Verify {
        /// The public key, base-32 encoded.
        #[arg(long)]
        key: String,
        /// The signature, base-32 encoded.
        #[arg(long)]
        signature: String,
        /// The message text.
        message: String,
    },

    /// Notarize a component as a sealed document.
    Notarize {
        /// The device mask, base-32 encoded.
        #[arg(long)]
        mask: String,
        /// Citation of the certificate whose key seals the document.
        #[arg(long)]
        citation: String,
        /// Account identifier recorded on issued artifacts.
        #[arg(long, default_value = "local")]
        account: String,
        /// The component text to notarize.
        component: String,
    },
}
