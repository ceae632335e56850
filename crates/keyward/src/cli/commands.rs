//! Command handlers.
//!
//! Each handler owns one subcommand: it parses the base-32 arguments,
//! opens the controller, performs the request, and prints the result to
//! stdout in base-32. Refusals map to their own exit code so scripts can
//! distinguish "the controller said no" from "something broke".

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use keyward_core::config::{ButtonMode, Config, ConsentConfig};
use keyward_core::error::HsmError;
use keyward_crypto::{PublicKey, SecretBytes, Signature};
use keyward_hsm::consent::{ConsentGate, ConsentTiming, UnwiredButton};
use keyward_hsm::store::StateStore;
use keyward_hsm::HsmController;
use keyward_notary::DigitalNotary;

/// Exit code for a request the controller refused.
pub const EXIT_REJECTED: i32 = 1;

/// Exit code for every other failure.
pub const EXIT_ERROR: i32 = 2;

/// A command failure, carrying its exit code.
#[derive(Debug)]
pub enum CommandError {
    /// The controller refused the request.
    Rejected,
    /// Anything else: bad arguments, I/O, configuration.
    Other(String),
}

impl CommandError {
    /// The process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected => EXIT_REJECTED,
            Self::Other(_) => EXIT_ERROR,
        }
    }

    fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "request rejected"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl From<HsmError> for CommandError {
    fn from(error: HsmError) -> Self {
        match error {
            HsmError::Rejected => Self::Rejected,
            HsmError::Store(e) => Self::Other(e.to_string()),
        }
    }
}

type CommandResult = Result<(), CommandError>;

// ============================================================================
// Handlers
// ============================================================================

/// Write the default configuration file.
///
/// # Errors
///
/// Fails if the file exists (without `force`) or cannot be written.
pub fn run_init(force: bool) -> CommandResult {
    let path = Config::default_path();
    if path.exists() && !force {
        return Err(CommandError::other(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CommandError::other(format!("{}: {e}", parent.display())))?;
    }
    std::fs::write(&path, Config::default_toml())
        .map_err(|e| CommandError::other(format!("{}: {e}", path.display())))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Show the controller's state and configuration.
///
/// # Errors
///
/// Fails if the configuration or state blob cannot be read.
pub fn run_status(config: &Config) -> CommandResult {
    let hsm = open_controller(config)?;
    println!("state:    {}", hsm.state());
    println!("consent:  {}", if hsm.consent_enabled() { "button" } else { "disabled" });
    println!("blob:     {}", config.state_path().display());
    if let Some(public) = hsm.current_public() {
        println!("public:   {}", keyward_codec::encode(public.as_bytes()));
    }
    Ok(())
}

/// Generate the first key pair.
///
/// # Errors
///
/// Fails on a malformed mask or a controller refusal.
pub fn run_generate(config: &Config, mask: &str) -> CommandResult {
    let mask = parse_mask(mask)?;
    let mut hsm = open_controller(config)?;
    let public = hsm.generate_keys(mask)?;
    println!("{}", keyward_codec::encode(public.as_bytes()));
    Ok(())
}

/// Rotate the key pair.
///
/// # Errors
///
/// Fails on malformed masks or a controller refusal.
pub fn run_rotate(config: &Config, existing: &str, fresh: &str) -> CommandResult {
    let existing = parse_mask(existing)?;
    let fresh = parse_mask(fresh)?;
    let mut hsm = open_controller(config)?;
    let public = hsm.rotate_keys(existing, fresh)?;
    println!("{}", keyward_codec::encode(public.as_bytes()));
    Ok(())
}

/// Erase all key material.
///
/// # Errors
///
/// Fails if the zeroed blob cannot be persisted.
pub fn run_erase(config: &Config) -> CommandResult {
    let mut hsm = open_controller(config)?;
    hsm.erase_keys()?;
    println!("erased");
    Ok(())
}

/// Digest a message.
///
/// # Errors
///
/// Fails on a controller refusal (rotation pending).
pub fn run_digest(config: &Config, message: &str) -> CommandResult {
    let hsm = open_controller(config)?;
    let digest = hsm.digest_bytes(message.as_bytes())?;
    println!("{}", keyward_codec::encode(digest.as_bytes()));
    Ok(())
}

/// Sign a message.
///
/// # Errors
///
/// Fails on a malformed mask or a controller refusal.
pub fn run_sign(config: &Config, mask: &str, message: &str) -> CommandResult {
    let mask = parse_mask(mask)?;
    let mut hsm = open_controller(config)?;
    let signature = hsm.sign_bytes(mask, message.as_bytes())?;
    println!("{}", keyward_codec::encode(signature.as_bytes()));
    Ok(())
}

/// Verify a signature.
///
/// # Errors
///
/// Fails on malformed arguments, a controller refusal, or an invalid
/// signature (so the exit code reports validity).
pub fn run_verify(config: &Config, key: &str, signature: &str, message: &str) -> CommandResult {
    let public = parse_public_key(key)?;
    let signature = parse_signature(signature)?;
    let hsm = open_controller(config)?;

    if hsm.valid_signature(&public, &signature, message.as_bytes())? {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        Err(CommandError::Rejected)
    }
}

/// Notarize a component as a sealed document.
///
/// # Errors
///
/// Fails on a malformed mask or a controller refusal.
pub fn run_notarize(
    config: &Config,
    mask: &str,
    citation: &str,
    account: &str,
    component: &str,
) -> CommandResult {
    let mask = parse_mask(mask)?;
    let hsm = open_controller(config)?;
    let mut notary = DigitalNotary::new(hsm, account);
    let document = notary.notarize(component, &timestamp(), citation, mask)?;
    println!("{document}");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Open the controller described by the configuration.
fn open_controller(config: &Config) -> Result<HsmController, CommandError> {
    let store = StateStore::new(config.state_path());
    Ok(HsmController::open(store, consent_gate(&config.consent))?)
}

/// Build the consent gate from configuration.
///
/// `probe` runs the real probe protocol with the configured timing. The
/// host binary has no GPIO driver, so its button line is [`UnwiredButton`]
/// and the probe observes silence and disables the gate — after waiting
/// out the configured window, exactly as a board without a button does.
/// Firmware builds substitute their GPIO-backed [`keyward_hsm::consent::Button`].
fn consent_gate(consent: &ConsentConfig) -> ConsentGate {
    let timing = ConsentTiming::from_millis(consent.timeout_ms, consent.poll_ms);
    match consent.button {
        ButtonMode::Probe => {
            debug!(
                timeout_ms = consent.timeout_ms,
                poll_ms = consent.poll_ms,
                "probing for a consent button"
            );
            ConsentGate::probe(Box::new(UnwiredButton), timing)
        }
        ButtonMode::Disabled => ConsentGate::disabled(),
    }
}

fn parse_mask(text: &str) -> Result<SecretBytes, CommandError> {
    let bytes = keyward_codec::decode(text)
        .map_err(|e| CommandError::other(format!("invalid mask: {e}")))?;
    SecretBytes::from_slice(&bytes)
        .ok_or_else(|| CommandError::other("invalid mask: expected 32 bytes"))
}

fn parse_public_key(text: &str) -> Result<PublicKey, CommandError> {
    let bytes = keyward_codec::decode(text)
        .map_err(|e| CommandError::other(format!("invalid public key: {e}")))?;
    PublicKey::from_slice(&bytes)
        .ok_or_else(|| CommandError::other("invalid public key: expected 32 bytes"))
}

fn parse_signature(text: &str) -> Result<Signature, CommandError> {
    let bytes = keyward_codec::decode(text)
        .map_err(|e| CommandError::other(format!("invalid signature: {e}")))?;
    Signature::from_slice(&bytes)
        .ok_or_else(|| CommandError::other("invalid signature: expected 64 bytes"))
}

/// Seconds since the epoch, as the device's stand-in timestamp. The board
/// has no trusted clock; consumers that need real timestamps supply their
/// own when they assemble artifacts.
fn timestamp() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{seconds}")
}
