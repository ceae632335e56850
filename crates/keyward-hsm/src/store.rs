//! Persistent state-blob storage.
//!
//! The controller owns exactly one persistent record: a fixed 129-byte blob
//! holding the key count and the current and previous (public, masked) key
//! pairs. This module provides:
//!
//! - [`StateBlob`] - the in-memory form with bit-exact encode/decode
//! - [`StateStore`] - atomic replace-on-write persistence to a single file
//!
//! # Blob layout
//!
//! | Offset | Length | Meaning |
//! |---|---|---|
//! | 0 | 1 | key count, 0..=2 |
//! | 1 | 32 | current public key (zeros if count == 0) |
//! | 33 | 32 | current masked key |
//! | 65 | 32 | previous public key (zeros if count < 2) |
//! | 97 | 32 | previous masked key |
//!
//! A plaintext private key never appears in the blob: the masked halves are
//! `mask ⊕ privateKey`, and the mask never leaves the paired device.
//!
//! # Crash safety
//!
//! `store` writes a side file, fsyncs it, and renames it over the live
//! blob, so after power loss the next boot sees either the whole old record
//! or the whole new one. `load` treats an absent or malformed blob as the
//! all-zero record, which boots the controller into `NoKeyPairs`.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use keyward_core::error::StoreResult;
use keyward_crypto::KEY_LEN;

/// Total length of the persisted blob in bytes.
pub const STATE_BLOB_LEN: usize = 4 * KEY_LEN + 1;

// ============================================================================
// StateBlob
// ============================================================================

/// One persisted (public, masked) key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredPair {
    /// The public key bytes.
    pub public: [u8; KEY_LEN],
    /// The masked private key bytes (`mask ⊕ privateKey`).
    pub masked: [u8; KEY_LEN],
}

impl std::fmt::Debug for StoredPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The masked half is ciphertext, but keep it out of logs anyway.
        f.debug_struct("StoredPair")
            .field("public", &hex_prefix(&self.public))
            .finish_non_exhaustive()
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    format!("{}…", hex::encode(&bytes[..4]))
}

/// The decoded persistent record.
///
/// `previous` is `Some` exactly when a rotation is pending (key count 2),
/// and `previous.is_some()` implies `current.is_some()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateBlob {
    /// The current key pair, if any.
    pub current: Option<StoredPair>,
    /// The previous key pair, retained only while a rotation is pending.
    pub previous: Option<StoredPair>,
}

impl StateBlob {
    /// The key count this record implies (the blob's first byte).
    #[must_use]
    pub fn key_count(&self) -> u8 {
        match (&self.current, &self.previous) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
        }
    }

    /// Encode to the fixed 129-byte wire form. Absent pairs encode as
    /// zeros.
    #[must_use]
    pub fn encode(&self) -> [u8; STATE_BLOB_LEN] {
        let mut bytes = [0u8; STATE_BLOB_LEN];
        bytes[0] = self.key_count();
        if let Some(current) = &self.current {
            bytes[1..1 + KEY_LEN].copy_from_slice(&current.public);
            bytes[1 + KEY_LEN..1 + 2 * KEY_LEN].copy_from_slice(&current.masked);
        }
        if let Some(previous) = &self.previous {
            bytes[1 + 2 * KEY_LEN..1 + 3 * KEY_LEN].copy_from_slice(&previous.public);
            bytes[1 + 3 * KEY_LEN..1 + 4 * KEY_LEN].copy_from_slice(&previous.masked);
        }
        bytes
    }

    /// Decode from raw bytes.
    ///
    /// Lenient by design: anything that is not a well-formed blob (wrong
    /// length, key count outside `0..=2`) decodes to the empty record, so a
    /// corrupt flash sector demotes the device to `NoKeyPairs` instead of
    /// bricking it.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        if bytes.len() != STATE_BLOB_LEN {
            return Self::default();
        }
        let count = bytes[0];
        if count > 2 {
            return Self::default();
        }

        let pair_at = |offset: usize| -> StoredPair {
            let mut public = [0u8; KEY_LEN];
            let mut masked = [0u8; KEY_LEN];
            public.copy_from_slice(&bytes[offset..offset + KEY_LEN]);
            masked.copy_from_slice(&bytes[offset + KEY_LEN..offset + 2 * KEY_LEN]);
            StoredPair { public, masked }
        };

        Self {
            current: (count >= 1).then(|| pair_at(1)),
            previous: (count == 2).then(|| pair_at(1 + 2 * KEY_LEN)),
        }
    }
}

// ============================================================================
// StateStore
// ============================================================================

/// Single-blob persistence on a flash-backed filesystem.
///
/// The controller is the sole writer. Writes are atomic in the face of
/// power loss; reads never fail on content (only on I/O).
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given path.
    ///
    /// Nothing is touched on disk until the first [`Self::store`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// An absent file or a malformed blob yields the empty record.
    ///
    /// # Errors
    ///
    /// Returns an error only for a file that exists but cannot be read.
    pub fn load(&self) -> StoreResult<StateBlob> {
        if !self.path.exists() {
            return Ok(StateBlob::default());
        }

        let mut file = File::open(&self.path)?;
        let mut bytes = Vec::with_capacity(STATE_BLOB_LEN);
        file.read_to_end(&mut bytes)?;

        Ok(StateBlob::decode(&bytes))
    }

    /// Persist the record, replacing the previous blob atomically.
    ///
    /// Writes to a side file, syncs it, restricts its permissions to the
    /// owner, then renames it over the live blob.
    ///
    /// # Errors
    ///
    /// Returns an error if any filesystem step fails; the live blob is
    /// untouched in that case.
    pub fn store(&self, blob: &StateBlob) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    let mut perms = fs::metadata(parent)?.permissions();
                    perms.set_mode(0o700);
                    fs::set_permissions(parent, perms)?;
                }
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&blob.encode())?;
            file.sync_all()?;
        }

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms)?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "state".to_string(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("path", &self.path).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
