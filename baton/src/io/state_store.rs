//! Persistent storage for the simulation state.
//!
//! The state is a single on-disk slot holding whatever the simulation last
//! wrote to stdout. The harness never parses it. Invocations are expected to
//! run strictly one after another: nothing here locks or versions the slot,
//! so two harness processes sharing a slot race undetected.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Handle to the single persistent state slot.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the currently persisted state.
    ///
    /// A missing slot is a valid empty state (the first-ever turn), not an
    /// error. Repeated reads without an intervening [`commit`](Self::commit)
    /// return identical bytes.
    pub fn read_current(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!(path = %self.path.display(), len = bytes.len(), "state read");
                Ok(bytes)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state slot yet");
                Ok(Vec::new())
            }
            Err(err) => Err(err).with_context(|| format!("read state {}", self.path.display())),
        }
    }

    /// Atomically replace the persisted state (temp file + rename).
    ///
    /// The previous state is unrecoverable once this returns. Errors are
    /// surfaced, not retried; a failed commit leaves the old slot intact.
    pub fn commit(&self, new_state: &[u8]) -> Result<()> {
        debug!(path = %self.path.display(), len = new_state.len(), "committing state");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, new_state)
            .with_context(|| format!("write temp state {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replace state {}", self.path.display()))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        // Append to the whole file name; the slot name is user-configured.
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_slot_returns_empty_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));

        let state = store.read_current().expect("read");
        assert!(state.is_empty());
    }

    #[test]
    fn commit_then_read_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));

        store.commit(b"WORLD#0").expect("commit");
        assert_eq!(store.read_current().expect("read"), b"WORLD#0");
    }

    #[test]
    fn read_is_idempotent_between_commits() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));
        store.commit(b"WORLD#3").expect("commit");

        let first = store.read_current().expect("first read");
        let second = store.read_current().expect("second read");
        assert_eq!(first, second);
    }

    #[test]
    fn commit_overwrites_previous_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));

        store.commit(b"WORLD#0").expect("first commit");
        store.commit(b"WORLD#1").expect("second commit");
        assert_eq!(store.read_current().expect("read"), b"WORLD#1");
    }

    #[test]
    fn commit_preserves_non_utf8_bytes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));
        let opaque = [0x00, 0xff, 0x9c, 0x0a, 0x80];

        store.commit(&opaque).expect("commit");
        assert_eq!(store.read_current().expect("read"), opaque);
    }

    /// Verifies the temp file does not outlive a successful commit.
    ///
    /// The slot's directory must contain exactly the slot afterwards.
    #[test]
    fn commit_leaves_no_temp_file_behind() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("sim.state"));

        store.commit(b"WORLD#0").expect("commit");

        let entries: Vec<_> = fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("sim.state")]);
    }

    #[test]
    fn commit_creates_missing_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(temp.path().join("saves/sim.state"));

        store.commit(b"WORLD#0").expect("commit");
        assert_eq!(store.read_current().expect("read"), b"WORLD#0");
    }

    #[test]
    fn commit_under_a_non_directory_parent_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file").expect("write blocker");
        let store = StateStore::new(blocker.join("sim.state"));

        let err = store.commit(b"WORLD#0").unwrap_err();
        assert!(err.to_string().contains("blocker"));
    }
}
