//! # keyward
//!
//! HSM-style custodian for a single paired signing key.
//!
//! ## Usage
//!
//! ```bash
//! # Write the default configuration
//! keyward init
//!
//! # Show controller state
//! keyward status
//!
//! # Pair: generate the first key pair under a device mask
//! keyward generate --mask <base32-mask>
//!
//! # Sign and verify
//! keyward sign --mask <base32-mask> "message"
//! keyward verify --key <base32-key> --signature <base32-sig> "message"
//!
//! # Rotate, then complete the rotation: the previous mask signs the new
//! # certificate one last time
//! keyward rotate --existing <base32-mask> --fresh <base32-mask>
//! keyward sign --mask <previous-base32-mask> "certificate text"
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use clap::Parser;

use keyward::cli::commands::{self, EXIT_ERROR};
use keyward::cli::{Cli, Commands};
use keyward::logging::{init_logging, verbosity_to_level, LogConfig};
use keyward_core::config::Config;

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: verbosity_to_level(cli.verbose),
        ..LogConfig::default()
    };
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let result = match &cli.command {
        Commands::Init { force } => commands::run_init(*force),
        Commands::Status => commands::run_status(&config),
        Commands::Generate { mask } => commands::run_generate(&config, mask),
        Commands::Rotate { existing, fresh } => commands::run_rotate(&config, existing, fresh),
        Commands::Erase => commands::run_erase(&config),
        Commands::Digest { message } => commands::run_digest(&config, message),
        Commands::Sign { mask, message } => commands::run_sign(&config, mask, message),
        Commands::Verify {
            key,
            signature,
            message,
        } => commands::run_verify(&config, key, signature, message),
        Commands::Notarize {
            mask,
            citation,
            account,
            component,
        } => commands::run_notarize(&config, mask, citation, account, component),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Load the configuration named on the command line, or the default.
fn load_config(cli: &Cli) -> Result<Config, keyward_core::error::ConfigError> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}
