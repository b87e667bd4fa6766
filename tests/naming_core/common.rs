use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dfs_naming::naming::NamingServer;
use dfs_naming::path::FsPath;
use dfs_naming::proto;
use dfs_naming::storage::{ControlPlane, StorageError, StorageNode, StorageResult};

/// One control-plane call as the fake observed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCall {
    Create { node: StorageNode, path: FsPath },
    Delete { node: StorageNode, path: FsPath },
    Copy { node: StorageNode, path: FsPath, source: SocketAddr },
}

/// In-process control plane: answers calls successfully and records them.
#[derive(Debug, Default)]
pub struct ScriptedControl {
    calls: Mutex<Vec<ControlCall>>,
    /// `create` answers `false` for these paths.
    preexisting: Mutex<Vec<FsPath>>,
    /// Calls touching these nodes fail with a transport error.
    unreachable: Mutex<Vec<StorageNode>>,
}

impl ScriptedControl {
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn mark_preexisting(&self, path: FsPath) {
        self.preexisting.lock().expect("preexisting lock").push(path);
    }

    pub fn mark_unreachable(&self, node: StorageNode) {
        self.unreachable.lock().expect("unreachable lock").push(node);
    }

    fn check_reachable(&self, node: &StorageNode) -> StorageResult<()> {
        if self.unreachable.lock().expect("unreachable lock").contains(node) {
            Err(StorageError::Transport(proto::Error::PeerFailure))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: ControlCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl ControlPlane for ScriptedControl {
    async fn create(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool> {
        self.check_reachable(node)?;
        self.record(ControlCall::Create { node: *node, path: path.clone() });
        Ok(!self.preexisting.lock().expect("preexisting lock").contains(path))
    }

    async fn delete(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool> {
        self.check_reachable(node)?;
        self.record(ControlCall::Delete { node: *node, path: path.clone() });
        Ok(true)
    }

    async fn copy(
        &self,
        node: &StorageNode,
        path: &FsPath,
        source: SocketAddr,
    ) -> StorageResult<bool> {
        self.check_reachable(node)?;
        self.record(ControlCall::Copy { node: *node, path: path.clone(), source });
        Ok(true)
    }
}

pub struct Fixture {
    pub naming: Arc<NamingServer>,
    pub control: Arc<ScriptedControl>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_threshold(20)
    }

    pub fn with_threshold(threshold: u32) -> Self {
        let control = Arc::new(ScriptedControl::default());
        let naming = Arc::new(NamingServer::new(threshold, control.clone()));
        Self { naming, control }
    }
}

pub fn path(s: &str) -> FsPath {
    FsPath::parse(s).expect("parse path")
}

pub fn node(index: u16) -> StorageNode {
    StorageNode::new(
        ([127, 0, 0, 1], 7000 + index).into(),
        ([127, 0, 0, 1], 8000 + index).into(),
    )
}
