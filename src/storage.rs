//! Storage-server capability model.
//!
//! The naming server identifies a storage server by its endpoint pair and
//! reaches it through the capability traits below. The node itself stays a
//! plain value with structural identity, which is what the namespace maps
//! key on; the traits carry the RPC effects and are swapped for in-process
//! fakes in tests.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;

use crate::path::FsPath;
use crate::proto;

/// Result alias for storage-plane calls.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Bytes moved per read when a storage server streams a `copy`.
pub const COPY_CHUNK_LEN: usize = 1024;

/// Errors surfaced by storage-plane calls.
#[derive(Debug)]
pub enum StorageError {
    /// The storage server does not host the file.
    NotFound,
    /// A read range extends past the end of the file.
    IndexOutOfBounds,
    /// The call itself failed: connection, framing, or decoding.
    Transport(proto::Error),
}

/// One storage server as the naming server records it: the client-facing
/// data endpoint and the naming-facing control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageNode {
    pub data: SocketAddr,
    pub control: SocketAddr,
}

impl StorageNode {
    pub fn new(data: SocketAddr, control: SocketAddr) -> Self {
        Self { data, control }
    }
}

impl fmt::Display for StorageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage(data={}, control={})", self.data, self.control)
    }
}

/// Control interface of a storage server, consumed by the naming server.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Creates an empty file; `false` when it already existed.
    async fn create(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool>;

    /// Deletes a file or directory tree; `false` when nothing was deleted.
    async fn delete(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool>;

    /// Tells `node` to fetch `path` from the data endpoint `source`,
    /// replacing any local content.
    async fn copy(
        &self,
        node: &StorageNode,
        path: &FsPath,
        source: SocketAddr,
    ) -> StorageResult<bool>;
}

/// Data interface of a storage server, consumed by filesystem clients. The
/// endpoint is the address handed out by `get_storage`.
#[async_trait]
pub trait DataPlane: Send + Sync {
    async fn size(&self, addr: SocketAddr, path: &FsPath) -> StorageResult<u64>;

    /// Reads `count` bytes at `offset`; the range must lie within the file.
    async fn read(
        &self,
        addr: SocketAddr,
        path: &FsPath,
        offset: u64,
        count: u32,
    ) -> StorageResult<Vec<u8>>;

    /// Writes at `offset`, extending the file as needed.
    async fn write(
        &self,
        addr: SocketAddr,
        path: &FsPath,
        offset: u64,
        data: &[u8],
    ) -> StorageResult<()>;
}
