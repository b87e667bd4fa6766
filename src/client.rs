//! Per-call TCP stubs for the naming and storage interfaces.
//!
//! Each call opens a connection, sends one framed request, and reads one
//! framed reply.

use std::io::Cursor;
use std::net::SocketAddr;

use async_trait::async_trait;

use crate::naming::{NamingError, NamingResult};
use crate::path::{FsPath, PathError};
use crate::proto::{self, registration, service, storage, Status};
use crate::storage::{ControlPlane, DataPlane, StorageError, StorageNode, StorageResult};

async fn call(addr: SocketAddr, body: &[u8]) -> proto::Result<Vec<u8>> {
    let mut socket = tokio::net::TcpStream::connect(addr).await.map_err(proto::Error::IO)?;
    proto::write_frame(&mut socket, body).await?;
    proto::read_frame(&mut socket).await
}

/// Maps a wire status back onto the naming error vocabulary.
fn error_of(status: Status) -> NamingError {
    match status {
        Status::Ok => NamingError::Remote(proto::Error::ReplyMismatch),
        Status::NotFound => NamingError::NotFound,
        Status::NotADirectory => NamingError::NotADirectory,
        Status::NotAFile => NamingError::NotAFile,
        Status::InvalidState => NamingError::InvalidState,
        Status::NoStorageAvailable => NamingError::NoStorageAvailable,
        Status::InvalidPath => NamingError::Path(PathError::InvalidPath),
        Status::InvalidComponent => NamingError::Path(PathError::InvalidComponent),
        Status::IndexOutOfBounds => {
            NamingError::Storage(StorageError::IndexOutOfBounds)
        }
        Status::RemoteFailure => NamingError::Remote(proto::Error::PeerFailure),
    }
}

/// Client stub for the Service port.
pub struct ServiceClient {
    addr: SocketAddr,
}

impl ServiceClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    async fn roundtrip(&self, request: &service::Request) -> NamingResult<service::Reply> {
        let mut body = Vec::new();
        request.write(&mut body).map_err(NamingError::Remote)?;
        let reply = call(self.addr, &body).await.map_err(NamingError::Remote)?;
        let reply = service::Reply::parse(&mut Cursor::new(reply.as_slice()), request.proc())
            .map_err(NamingError::Remote)?;
        match reply {
            service::Reply::Err(status) => Err(error_of(status)),
            other => Ok(other),
        }
    }

    pub async fn lock(&self, path: &FsPath, exclusive: bool) -> NamingResult<()> {
        self.roundtrip(&service::Request::Lock { path: path.clone(), exclusive }).await?;
        Ok(())
    }

    pub async fn unlock(&self, path: &FsPath, exclusive: bool) -> NamingResult<()> {
        self.roundtrip(&service::Request::Unlock { path: path.clone(), exclusive }).await?;
        Ok(())
    }

    pub async fn is_directory(&self, path: &FsPath) -> NamingResult<bool> {
        match self.roundtrip(&service::Request::IsDirectory { path: path.clone() }).await? {
            service::Reply::Flag(value) => Ok(value),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }

    pub async fn list(&self, path: &FsPath) -> NamingResult<Vec<String>> {
        match self.roundtrip(&service::Request::List { path: path.clone() }).await? {
            service::Reply::Names(names) => Ok(names),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }

    pub async fn create_file(&self, path: &FsPath) -> NamingResult<bool> {
        match self.roundtrip(&service::Request::CreateFile { path: path.clone() }).await? {
            service::Reply::Flag(value) => Ok(value),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }

    pub async fn create_directory(&self, path: &FsPath) -> NamingResult<bool> {
        match self
            .roundtrip(&service::Request::CreateDirectory { path: path.clone() })
            .await?
        {
            service::Reply::Flag(value) => Ok(value),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }

    pub async fn delete(&self, path: &FsPath) -> NamingResult<bool> {
        match self.roundtrip(&service::Request::Delete { path: path.clone() }).await? {
            service::Reply::Flag(value) => Ok(value),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }

    /// The data endpoint of one storage server hosting the file.
    pub async fn get_storage(&self, path: &FsPath) -> NamingResult<SocketAddr> {
        match self.roundtrip(&service::Request::GetStorage { path: path.clone() }).await? {
            service::Reply::Storage(addr) => Ok(addr),
            _ => Err(NamingError::Remote(proto::Error::ReplyMismatch)),
        }
    }
}

/// Client stub for the Registration port.
pub struct RegistrationClient {
    addr: SocketAddr,
}

impl RegistrationClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Announces a storage server; returns the paths it must delete
    /// locally.
    pub async fn register(
        &self,
        data: SocketAddr,
        control: SocketAddr,
        paths: &[FsPath],
    ) -> NamingResult<Vec<FsPath>> {
        let request = registration::Request { data, control, paths: paths.to_vec() };
        let mut body = Vec::new();
        request.write(&mut body).map_err(NamingError::Remote)?;
        let reply = call(self.addr, &body).await.map_err(NamingError::Remote)?;
        match registration::Reply::parse(&mut Cursor::new(reply.as_slice()))
            .map_err(NamingError::Remote)?
        {
            registration::Reply::Paths(paths) => Ok(paths),
            registration::Reply::Err(status) => Err(error_of(status)),
        }
    }
}

/// TCP transport behind the storage capability traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteStorage;

impl RemoteStorage {
    async fn roundtrip(
        addr: SocketAddr,
        request: &storage::Request,
    ) -> StorageResult<storage::Reply> {
        let mut body = Vec::new();
        request.write(&mut body).map_err(StorageError::Transport)?;
        let reply = call(addr, &body).await.map_err(StorageError::Transport)?;
        let reply = storage::Reply::parse(&mut Cursor::new(reply.as_slice()), request.proc())
            .map_err(StorageError::Transport)?;
        match reply {
            storage::Reply::Err(Status::NotFound) => Err(StorageError::NotFound),
            storage::Reply::Err(Status::IndexOutOfBounds) => {
                Err(StorageError::IndexOutOfBounds)
            }
            storage::Reply::Err(_) => Err(StorageError::Transport(proto::Error::PeerFailure)),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl ControlPlane for RemoteStorage {
    async fn create(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool> {
        match Self::roundtrip(node.control, &storage::Request::Create { path: path.clone() })
            .await?
        {
            storage::Reply::Flag(value) => Ok(value),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }

    async fn delete(&self, node: &StorageNode, path: &FsPath) -> StorageResult<bool> {
        match Self::roundtrip(node.control, &storage::Request::Delete { path: path.clone() })
            .await?
        {
            storage::Reply::Flag(value) => Ok(value),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }

    async fn copy(
        &self,
        node: &StorageNode,
        path: &FsPath,
        source: SocketAddr,
    ) -> StorageResult<bool> {
        let request = storage::Request::Copy { path: path.clone(), source };
        match Self::roundtrip(node.control, &request).await? {
            storage::Reply::Flag(value) => Ok(value),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }
}

#[async_trait]
impl DataPlane for RemoteStorage {
    async fn size(&self, addr: SocketAddr, path: &FsPath) -> StorageResult<u64> {
        match Self::roundtrip(addr, &storage::Request::Size { path: path.clone() }).await? {
            storage::Reply::Size(size) => Ok(size),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }

    async fn read(
        &self,
        addr: SocketAddr,
        path: &FsPath,
        offset: u64,
        count: u32,
    ) -> StorageResult<Vec<u8>> {
        let request = storage::Request::Read { path: path.clone(), offset, count };
        match Self::roundtrip(addr, &request).await? {
            storage::Reply::Data(data) => Ok(data),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }

    async fn write(
        &self,
        addr: SocketAddr,
        path: &FsPath,
        offset: u64,
        data: &[u8],
    ) -> StorageResult<()> {
        let request =
            storage::Request::Write { path: path.clone(), offset, data: data.to_vec() };
        match Self::roundtrip(addr, &request).await? {
            storage::Reply::Written => Ok(()),
            _ => Err(StorageError::Transport(proto::Error::ReplyMismatch)),
        }
    }
}
