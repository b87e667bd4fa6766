//! TCP surface of the naming server.
//!
//! One accept loop per port, one task per connection. Naming traffic is
//! strictly request/response with small replies, so each connection task
//! loops: read frame, decode, dispatch to the coordinator, encode, write
//! frame.

use std::io::Cursor;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::naming::{NamingError, NamingServer};
use crate::path::PathError;
use crate::proto::{self, registration, service, Status};
use crate::storage::{StorageError, StorageNode};

/// Accepts Service-port clients forever.
pub async fn serve_service(
    listener: TcpListener,
    naming: Arc<NamingServer>,
) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        let naming = naming.clone();
        tokio::spawn(async move {
            debug!(%peer, "service client connected");
            if let Err(err) = service_conn(socket, naming).await {
                debug!(%peer, ?err, "service connection closed");
            }
        });
    }
}

/// Accepts Registration-port clients forever.
pub async fn serve_registration(
    listener: TcpListener,
    naming: Arc<NamingServer>,
) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        let naming = naming.clone();
        tokio::spawn(async move {
            debug!(%peer, "registration client connected");
            if let Err(err) = registration_conn(socket, naming).await {
                debug!(%peer, ?err, "registration connection closed");
            }
        });
    }
}

async fn service_conn(mut socket: TcpStream, naming: Arc<NamingServer>) -> proto::Result<()> {
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
        let reply = match service::Request::parse(&mut Cursor::new(frame.as_slice())) {
            Ok(request) => dispatch_service(&naming, request).await,
            Err(err) => {
                debug!(?err, "malformed service request");
                service::Reply::Err(Status::RemoteFailure)
            }
        };
        let mut body = Vec::new();
        reply.write(&mut body)?;
        proto::write_frame(&mut socket, &body).await?;
    }
}

async fn registration_conn(
    mut socket: TcpStream,
    naming: Arc<NamingServer>,
) -> proto::Result<()> {
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
        let reply = match registration::Request::parse(&mut Cursor::new(frame.as_slice())) {
            Ok(request) => {
                let node = StorageNode::new(request.data, request.control);
                match naming.register(node, request.paths) {
                    Ok(paths) => {
                        info!(%node, "storage server registered");
                        registration::Reply::Paths(paths)
                    }
                    Err(err) => registration::Reply::Err(status_of(&err)),
                }
            }
            Err(err) => {
                debug!(?err, "malformed registration request");
                registration::Reply::Err(Status::RemoteFailure)
            }
        };
        let mut body = Vec::new();
        reply.write(&mut body)?;
        proto::write_frame(&mut socket, &body).await?;
    }
}

async fn dispatch_service(naming: &NamingServer, request: service::Request) -> service::Reply {
    use service::Request::*;

    let result = match request {
        Lock { path, exclusive } => {
            naming.lock(&path, exclusive).await.map(|()| service::Reply::Done)
        }
        Unlock { path, exclusive } => {
            naming.unlock(&path, exclusive).map(|()| service::Reply::Done)
        }
        IsDirectory { path } => naming.is_directory(&path).map(service::Reply::Flag),
        List { path } => naming.list(&path).map(service::Reply::Names),
        CreateFile { path } => naming.create_file(&path).await.map(service::Reply::Flag),
        CreateDirectory { path } => naming.create_directory(&path).map(service::Reply::Flag),
        Delete { path } => naming.delete(&path).await.map(service::Reply::Flag),
        GetStorage { path } => {
            naming.get_storage(&path).map(|node| service::Reply::Storage(node.data))
        }
    };
    result.unwrap_or_else(|err| service::Reply::Err(status_of(&err)))
}

/// Maps a naming error onto its wire status.
fn status_of(err: &NamingError) -> Status {
    match err {
        NamingError::NotFound => Status::NotFound,
        NamingError::NotADirectory => Status::NotADirectory,
        NamingError::NotAFile => Status::NotAFile,
        NamingError::InvalidState => Status::InvalidState,
        NamingError::NoStorageAvailable => Status::NoStorageAvailable,
        NamingError::Path(PathError::InvalidPath) => Status::InvalidPath,
        NamingError::Path(PathError::InvalidComponent) => Status::InvalidComponent,
        NamingError::Storage(StorageError::NotFound) => Status::NotFound,
        NamingError::Storage(StorageError::IndexOutOfBounds) => Status::IndexOutOfBounds,
        NamingError::Storage(StorageError::Transport(_)) | NamingError::Remote(_) => {
            Status::RemoteFailure
        }
    }
}
