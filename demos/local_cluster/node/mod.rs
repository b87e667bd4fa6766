//! An in-memory storage server speaking the storage wire protocol.
//!
//! Bytes live in a path-keyed map behind an async mutex; two listeners
//! serve the data and control interfaces on ephemeral localhost ports.
//! Registration advertises the local files and honours the returned
//! deletion list.

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use dfs_naming::client::{RegistrationClient, RemoteStorage};
use dfs_naming::path::FsPath;
use dfs_naming::proto::{self, storage, Status};
use dfs_naming::storage::{DataPlane, StorageError, COPY_CHUNK_LEN};
use dfs_naming::NamingError;

pub struct MemStorage {
    files: Mutex<HashMap<FsPath, Vec<u8>>>,
    data_addr: SocketAddr,
    control_addr: SocketAddr,
}

impl MemStorage {
    /// Binds both interfaces on ephemeral localhost ports and starts
    /// serving.
    pub async fn spawn() -> std::io::Result<Arc<Self>> {
        let data = TcpListener::bind("127.0.0.1:0").await?;
        let control = TcpListener::bind("127.0.0.1:0").await?;
        let node = Arc::new(Self {
            files: Mutex::new(HashMap::new()),
            data_addr: data.local_addr()?,
            control_addr: control.local_addr()?,
        });
        tokio::spawn(Self::serve(node.clone(), data));
        tokio::spawn(Self::serve(node.clone(), control));
        Ok(node)
    }

    pub fn data_addr(&self) -> SocketAddr {
        self.data_addr
    }

    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    /// Seeds a local file before registration.
    pub async fn seed(&self, path: FsPath, bytes: Vec<u8>) {
        self.files.lock().await.insert(path, bytes);
    }

    pub async fn contains(&self, path: &FsPath) -> bool {
        self.files.lock().await.contains_key(path)
    }

    /// Registers with the naming server, advertising the local files and
    /// deleting whatever the namespace declares redundant.
    pub async fn register(&self, registration: SocketAddr) -> Result<(), NamingError> {
        let paths: Vec<FsPath> = self.files.lock().await.keys().cloned().collect();
        let stub = RegistrationClient::new(registration);
        let to_delete = stub.register(self.data_addr, self.control_addr, &paths).await?;
        let mut files = self.files.lock().await;
        for path in to_delete {
            files.remove(&path);
        }
        Ok(())
    }

    async fn serve(node: Arc<Self>, listener: TcpListener) {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let node = node.clone();
            tokio::spawn(async move {
                let _ = node.connection(socket).await;
            });
        }
    }

    async fn connection(&self, mut socket: TcpStream) -> proto::Result<()> {
        loop {
            let frame = match proto::read_frame(&mut socket).await {
                Ok(frame) => frame,
                Err(proto::Error::IO(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            let reply = match storage::Request::parse(&mut Cursor::new(frame.as_slice())) {
                Ok(request) => self.dispatch(request).await,
                Err(_) => storage::Reply::Err(Status::RemoteFailure),
            };
            let mut body = Vec::new();
            reply.write(&mut body)?;
            proto::write_frame(&mut socket, &body).await?;
        }
    }

    async fn dispatch(&self, request: storage::Request) -> storage::Reply {
        match request {
            storage::Request::Size { path } => match self.files.lock().await.get(&path) {
                Some(bytes) => storage::Reply::Size(bytes.len() as u64),
                None => storage::Reply::Err(Status::NotFound),
            },
            storage::Request::Read { path, offset, count } => {
                let files = self.files.lock().await;
                let Some(bytes) = files.get(&path) else {
                    return storage::Reply::Err(Status::NotFound);
                };
                match offset.checked_add(u64::from(count)) {
                    Some(end) if end <= bytes.len() as u64 => {
                        storage::Reply::Data(bytes[offset as usize..end as usize].to_vec())
                    }
                    _ => storage::Reply::Err(Status::IndexOutOfBounds),
                }
            }
            storage::Request::Write { path, offset, data } => {
                let mut files = self.files.lock().await;
                let Some(bytes) = files.get_mut(&path) else {
                    return storage::Reply::Err(Status::NotFound);
                };
                let start = offset as usize;
                let end = start + data.len();
                if bytes.len() < end {
                    bytes.resize(end, 0);
                }
                bytes[start..end].copy_from_slice(&data);
                storage::Reply::Written
            }
            storage::Request::Create { path } => {
                let mut files = self.files.lock().await;
                if files.contains_key(&path) {
                    storage::Reply::Flag(false)
                } else {
                    files.insert(path, Vec::new());
                    storage::Reply::Flag(true)
                }
            }
            storage::Request::Delete { path } => {
                let mut files = self.files.lock().await;
                let before = files.len();
                files.retain(|local, _| !local.is_subpath_of(&path));
                storage::Reply::Flag(files.len() != before)
            }
            storage::Request::Copy { path, source } => match self.pull(&path, source).await {
                Ok(()) => storage::Reply::Flag(true),
                Err(StorageError::NotFound) => storage::Reply::Err(Status::NotFound),
                Err(StorageError::IndexOutOfBounds) => {
                    storage::Reply::Err(Status::IndexOutOfBounds)
                }
                Err(StorageError::Transport(_)) => storage::Reply::Err(Status::RemoteFailure),
            },
        }
    }

    /// Streams `path` from the source data endpoint in fixed-size chunks,
    /// replacing any local content.
    async fn pull(&self, path: &FsPath, source: SocketAddr) -> Result<(), StorageError> {
        let remote = RemoteStorage;
        let total = remote.size(source, path).await?;
        let mut bytes = Vec::with_capacity(total as usize);
        let mut offset = 0u64;
        while offset < total {
            let count = (total - offset).min(COPY_CHUNK_LEN as u64) as u32;
            let chunk = remote.read(source, path, offset, count).await?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as u64;
            bytes.extend_from_slice(&chunk);
        }
        self.files.lock().await.insert(path.clone(), bytes);
        Ok(())
    }
}
