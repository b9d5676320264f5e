//! Durable known-host persistence.
//!
//! One newline-delimited file of host addresses, append-only, shared by
//! every monitored network. The in-memory set and the file are mutated as
//! one unit under a single mutex, so concurrent scan tasks cannot interleave
//! writes or let memory and disk drift apart.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use netvigil_core::HostAddr;

/// Errors from loading or appending the known-host file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read known-host file {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to append to known-host file {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The set of every host address this monitor has ever reported, backed by
/// an append-only text file. Hosts are added and never removed.
pub struct FileHostStore {
    path: PathBuf,
    known: Mutex<HashSet<HostAddr>>,
}

impl FileHostStore {
    /// Opens the store, loading all previously recorded hosts.
    ///
    /// A missing file is the first-run case and yields an empty set. An
    /// unreadable file is an error: silently forgetting the known set would
    /// re-alert on the entire network, so startup fails fast instead.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let known = match std::fs::read_to_string(&path) {
            // Duplicate lines collapse into the set.
            Ok(contents) => contents
                .lines()
                .filter(|line| !line.is_empty())
                .map(HostAddr::from)
                .collect(),
            Err(err) if err.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(source) => return Err(StoreError::Load { path, source }),
        };

        Ok(Self {
            path,
            known: Mutex::new(known),
        })
    }

    /// Number of hosts currently known.
    pub fn len(&self) -> usize {
        self.known.lock().expect("known-host lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The subset of `observed` that has never been seen before.
    pub fn diff(&self, observed: &HashSet<HostAddr>) -> Vec<HostAddr> {
        let known = self.known.lock().expect("known-host lock poisoned");
        observed
            .iter()
            .filter(|host| !known.contains(*host))
            .cloned()
            .collect()
    }

    /// Records `host` as known, durably.
    ///
    /// Returns `Ok(false)` without touching the file when the host is
    /// already known — two networks observing the same address in one tick
    /// race here, and only the winner notifies. On `Ok(true)` the appended
    /// line has been synced to disk, so a restart cannot re-report the host.
    pub fn record(&self, host: &HostAddr) -> Result<bool, StoreError> {
        let mut known = self.known.lock().expect("known-host lock poisoned");
        if known.contains(host) {
            return Ok(false);
        }

        self.append_line(host)?;
        known.insert(host.clone());
        Ok(true)
    }

    fn append_line(&self, host: &HostAddr) -> Result<(), StoreError> {
        let map_err = |source| StoreError::Append {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_err)?;
        writeln!(file, "{host}").map_err(map_err)?;
        file.sync_all().map_err(map_err)
    }
}
