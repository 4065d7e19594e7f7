//! Persistent machine identity.
//!
//! The host announces a stable `machineId` so the relay can recognise it
//! across restarts.  On first run the id is derived from a fingerprint of the
//! machine plus a random salt, then stored in a `machine-id` file next to
//! `config.toml`.  Later runs read the file back; a missing or corrupt file
//! is regenerated.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Length of a machine id in hex characters (16 digest bytes).
pub const MACHINE_ID_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("I/O error accessing machine id at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The machine's hostname, used as the default `computerName`.
///
/// Tries `COMPUTERNAME` (Windows), then `HOSTNAME`, then `/etc/hostname`,
/// and falls back to `"deskrelay-host"`.
pub fn hostname() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "deskrelay-host".to_string())
}

/// Hardware/OS fingerprint: host, user, OS, architecture, and the systemd
/// machine id when readable.
pub fn fingerprint() -> String {
    let user = std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    let system_id = std::fs::read_to_string("/etc/machine-id")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    format!(
        "{}:{}:{}:{}:{}",
        hostname(),
        user,
        std::env::consts::OS,
        std::env::consts::ARCH,
        system_id
    )
}

/// `hex(sha256(fingerprint ":" salt)[..16])`.
pub fn derive_machine_id(fingerprint: &str, salt: Uuid) -> String {
    let raw = format!("{fingerprint}:{salt}");
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(&digest[..MACHINE_ID_LEN / 2])
}

pub fn is_well_formed(id: &str) -> bool {
    id.len() == MACHINE_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Reads the machine id stored at `path`, generating and storing a new one
/// when the file is missing or does not hold a well-formed id.
///
/// # Errors
///
/// [`IdentityError::Io`] if the file cannot be read (other than "not
/// found") or written.
pub fn load_or_create(path: &Path) -> Result<String, IdentityError> {
    let io_err = |source| IdentityError::Io {
        path: path.to_path_buf(),
        source,
    };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let id = content.trim();
            if is_well_formed(id) {
                return Ok(id.to_ascii_lowercase());
            }
            warn!(path = %path.display(), "machine id file is corrupt; regenerating");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    let id = derive_machine_id(&fingerprint(), Uuid::new_v4());
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    std::fs::write(path, format!("{id}\n")).map_err(io_err)?;
    info!(path = %path.display(), "generated new machine id");
    Ok(id)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("deskrelay_id_{}", Uuid::new_v4()));
        let file = dir.join("machine-id");
        (dir, file)
    }

    #[test]
    fn test_derived_id_is_32_hex_chars() {
        let id = derive_machine_id("host:user:linux:x86_64:", Uuid::new_v4());
        assert!(is_well_formed(&id), "got {id}");
    }

    #[test]
    fn test_derivation_is_deterministic_for_same_salt() {
        let salt = Uuid::new_v4();
        assert_eq!(derive_machine_id("fp", salt), derive_machine_id("fp", salt));
        assert_ne!(derive_machine_id("fp", salt), derive_machine_id("fp", Uuid::new_v4()));
    }

    #[test]
    fn test_well_formed_rejects_bad_ids() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("xyz"));
        assert!(!is_well_formed(&"g".repeat(MACHINE_ID_LEN)));
        assert!(is_well_formed(&"a".repeat(MACHINE_ID_LEN)));
    }

    #[test]
    fn test_first_run_creates_file_and_later_runs_reuse_it() {
        // Arrange
        let (dir, file) = temp_file();

        // Act
        let first = load_or_create(&file).unwrap();
        let second = load_or_create(&file).unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&file).unwrap().trim(), first);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_is_regenerated() {
        let (dir, file) = temp_file();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&file, "not-an-id").unwrap();

        let id = load_or_create(&file).unwrap();

        assert!(is_well_formed(&id));
        assert_eq!(std::fs::read_to_string(&file).unwrap().trim(), id);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
