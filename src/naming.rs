//! The naming server: namespace operations, hierarchical locking with its
//! replication hooks, and storage-server registration.
//!
//! All mutable state lives in one long-lived value constructed at startup
//! and shared across connection tasks. The namespace, registry, and read
//! counters sit behind a single monitor that is only ever held for quick
//! map work; every storage RPC happens with the monitor released, and the
//! monitor is re-taken afterwards just to record the outcome.

use std::sync::{Arc, Mutex};

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::lock::{hold, LockManager};
use crate::namespace::Namespace;
use crate::path::{FsPath, PathError};
use crate::proto;
use crate::registry::Registry;
use crate::replica::ReplicationPolicy;
use crate::storage::{ControlPlane, StorageError, StorageNode};

/// Result alias for naming operations.
pub type NamingResult<T> = std::result::Result<T, NamingError>;

/// Errors surfaced by naming operations.
#[derive(Debug)]
pub enum NamingError {
    /// The path, or a parent it requires, is not in the namespace.
    NotFound,
    /// A directory was required.
    NotADirectory,
    /// A file was required.
    NotAFile,
    /// Unlock of a lock that is not held (or held in the other mode), or
    /// re-registration of a known storage server.
    InvalidState,
    /// No storage server is registered to place a file on.
    NoStorageAvailable,
    /// The supplied path string or component was malformed.
    Path(PathError),
    /// A storage-server call failed. Any namespace mutation the operation
    /// performs has already completed.
    Storage(StorageError),
    /// The naming RPC itself failed; reported by client stubs only.
    Remote(proto::Error),
}

impl From<PathError> for NamingError {
    fn from(err: PathError) -> Self {
        NamingError::Path(err)
    }
}

impl From<StorageError> for NamingError {
    fn from(err: StorageError) -> Self {
        NamingError::Storage(err)
    }
}

struct State {
    namespace: Namespace,
    registry: Registry,
    replication: ReplicationPolicy,
}

/// The coordination plane of the filesystem.
pub struct NamingServer {
    state: Mutex<State>,
    locks: LockManager,
    control: Arc<dyn ControlPlane>,
}

impl NamingServer {
    /// Creates the coordinator with the given replication threshold and
    /// control-plane transport.
    pub fn new(replication_threshold: u32, control: Arc<dyn ControlPlane>) -> Self {
        Self {
            state: Mutex::new(State {
                namespace: Namespace::new(),
                registry: Registry::new(),
                replication: ReplicationPolicy::new(replication_threshold),
            }),
            locks: LockManager::new(),
            control,
        }
    }

    /// True for a directory, false for a file.
    pub fn is_directory(&self, path: &FsPath) -> NamingResult<bool> {
        hold(&self.state).namespace.is_directory(path)
    }

    /// Child component names of a directory.
    pub fn list(&self, dir: &FsPath) -> NamingResult<Vec<String>> {
        hold(&self.state).namespace.list_children(dir)
    }

    /// Creates an empty file hosted on one randomly chosen storage server.
    /// Returns `false` when the path already exists.
    pub async fn create_file(&self, path: &FsPath) -> NamingResult<bool> {
        let Some(parent) = path.parent() else {
            return Ok(false);
        };
        let placement = {
            let state = hold(&self.state);
            if !state.namespace.is_known_directory(&parent) {
                return Err(NamingError::NotFound);
            }
            if state.registry.is_empty() {
                return Err(NamingError::NoStorageAvailable);
            }
            if state.namespace.has_path(path) {
                return Ok(false);
            }
            match state.registry.pick() {
                Some(node) => node,
                None => return Err(NamingError::NoStorageAvailable),
            }
        };
        match self.control.create(&placement, path).await {
            Ok(true) => {
                let mut state = hold(&self.state);
                // The parent may have been deleted while the call was in
                // flight; the namespace stays authoritative either way.
                if !state.namespace.has_path(path)
                    && state.namespace.is_known_directory(&parent)
                {
                    state.namespace.insert_file(path.clone(), placement);
                }
                Ok(true)
            }
            // The storage server already had such a file. The namespace
            // does not record it, but the logical create succeeds.
            Ok(false) => Ok(true),
            Err(err) => Err(NamingError::Storage(err)),
        }
    }

    /// Creates a directory, purely in memory. Returns `false` when the path
    /// already exists.
    pub fn create_directory(&self, path: &FsPath) -> NamingResult<bool> {
        let Some(parent) = path.parent() else {
            return Ok(false);
        };
        let mut state = hold(&self.state);
        if !state.namespace.is_known_directory(&parent) {
            return Err(NamingError::NotFound);
        }
        if state.namespace.has_path(path) {
            return Ok(false);
        }
        state.namespace.insert_directory(path.clone());
        Ok(true)
    }

    /// Removes a file or a directory subtree, then tells every storage
    /// server that hosted any of it to delete its local copy. The first
    /// transport failure is surfaced once the namespace mutation is
    /// complete. Returns `false` on root.
    pub async fn delete(&self, path: &FsPath) -> NamingResult<bool> {
        let victims = {
            let mut state = hold(&self.state);
            if !state.namespace.has_path(path) {
                return Err(NamingError::NotFound);
            }
            if path.is_root() {
                return Ok(false);
            }
            state.replication.forget_subtree(path);
            state.namespace.remove_subtree(path)
        };
        let mut first_failure = None;
        for node in victims {
            if let Err(err) = self.control.delete(&node, path).await {
                warn!(%node, %path, ?err, "storage delete failed");
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        match first_failure {
            Some(err) => Err(NamingError::Storage(err)),
            None => Ok(true),
        }
    }

    /// One host of the file, chosen at random. Clients talk to its data
    /// endpoint directly.
    pub fn get_storage(&self, path: &FsPath) -> NamingResult<StorageNode> {
        let state = hold(&self.state);
        let hosts = state.namespace.hosts(path).ok_or(NamingError::NotFound)?;
        hosts.choose(&mut rand::thread_rng()).copied().ok_or(NamingError::NotFound)
    }

    /// Takes the hierarchical lock on `path`, then runs the replication
    /// hook for file paths: invalidate extra replicas on write intent,
    /// count the read and maybe order a copy on read intent.
    pub async fn lock(&self, path: &FsPath, exclusive: bool) -> NamingResult<()> {
        if !hold(&self.state).namespace.has_path(path) {
            return Err(NamingError::NotFound);
        }
        self.locks.acquire(path, exclusive).await;
        if exclusive {
            self.invalidate_replicas(path).await;
        } else {
            self.replicate_if_hot(path).await;
        }
        Ok(())
    }

    /// Releases the hierarchical lock on `path`.
    pub fn unlock(&self, path: &FsPath, exclusive: bool) -> NamingResult<()> {
        self.locks.release(path, exclusive)
    }

    /// Registers a storage server and reconciles its advertised paths,
    /// returning the ones it must delete locally.
    pub fn register(&self, node: StorageNode, paths: Vec<FsPath>) -> NamingResult<Vec<FsPath>> {
        let mut state = hold(&self.state);
        if !state.registry.insert(node) {
            return Err(NamingError::InvalidState);
        }
        let mut to_delete = Vec::new();
        for path in paths {
            if path.is_root() {
                continue;
            }
            if state.namespace.has_path(&path) {
                to_delete.push(path);
            } else {
                state.namespace.graft_file(path, node);
            }
        }
        Ok(to_delete)
    }

    /// Write intent on a file: keep one replica, drop the rest from the
    /// host set, and tell the dropped nodes to delete their copy. Failures
    /// are logged and swallowed; the file is known to live on the retained
    /// node.
    async fn invalidate_replicas(&self, path: &FsPath) {
        let doomed = {
            let mut state = hold(&self.state);
            match state.namespace.hosts_mut(path) {
                Some(hosts) if hosts.len() > 1 => hosts.split_off(1),
                _ => return,
            }
        };
        for node in doomed {
            if let Err(err) = self.control.delete(&node, path).await {
                warn!(%node, %path, ?err, "replica invalidation failed");
            }
        }
    }

    /// Read intent on a file: count the acquire, and once the file turns
    /// hot order a copy to a node that does not host it yet. Best-effort:
    /// on any failure the counter stays reset and the host set untouched.
    async fn replicate_if_hot(&self, path: &FsPath) {
        let order = {
            let mut state = hold(&self.state);
            let hosts: Vec<StorageNode> = match state.namespace.hosts(path) {
                Some(hosts) => hosts.to_vec(),
                None => return,
            };
            if !state.replication.note_read(path) {
                return;
            }
            let Some(&source) = hosts.first() else {
                return;
            };
            let Some(target) = state.registry.pick_excluding(&hosts) else {
                return;
            };
            (source, target)
        };
        let (source, target) = order;
        match self.control.copy(&target, path, source.data).await {
            Ok(true) => {
                let mut state = hold(&self.state);
                if let Some(hosts) = state.namespace.hosts_mut(path) {
                    if !hosts.contains(&target) {
                        hosts.push(target);
                    }
                }
            }
            Ok(false) => debug!(%path, node = %target, "copy refused"),
            Err(err) => debug!(%path, node = %target, ?err, "copy failed"),
        }
    }

    #[cfg(test)]
    pub(crate) fn host_count(&self, path: &FsPath) -> usize {
        hold(&self.state).namespace.hosts(path).map_or(0, <[StorageNode]>::len)
    }

    #[cfg(test)]
    pub(crate) fn read_count(&self, path: &FsPath) -> u32 {
        hold(&self.state).replication.count(path)
    }
}
