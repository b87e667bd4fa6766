//! Wire protocol for the naming and storage interfaces.
//!
//! Every message travels as one frame: a big-endian `u32` length prefix
//! followed by the body. Request bodies open with a `u32` procedure
//! discriminant, reply bodies with a `u32` status code; the rest is encoded
//! with the primitives in [`primitive`]. Bodies are parsed from an
//! `io::Read` source and emitted into an `io::Write` sink, so both sides of
//! a call share the same per-message code.

pub mod primitive;
pub mod registration;
pub mod service;
pub mod storage;


use std::io;

use num_derive::{FromPrimitive, ToPrimitive};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::path::PathError;

/// Result of wire encode/decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Largest frame either side accepts. Also bounds write payloads.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Wire protocol errors.
#[derive(Debug)]
pub enum Error {
    /// The underlying socket or buffer failed.
    IO(io::Error),
    /// A frame advertised a length over [`MAX_FRAME_LEN`].
    FrameTooLarge(usize),
    /// A procedure, status, or boolean discriminant was not recognised.
    EnumDiscMismatch(u32),
    /// A length field exceeded its limit.
    MaxElemLimit,
    /// A string field was not valid UTF-8.
    BadUtf8,
    /// A string field did not parse as a path.
    BadPath(PathError),
    /// A string field did not parse as a socket address.
    BadAddress,
    /// A reply payload did not match the procedure it answers.
    ReplyMismatch,
    /// The peer reported a failure it could not express as a logical error.
    PeerFailure,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IO(err)
    }
}

/// Status codes carried at the head of every reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    NotFound = 1,
    NotADirectory = 2,
    NotAFile = 3,
    InvalidState = 4,
    NoStorageAvailable = 5,
    InvalidPath = 6,
    InvalidComponent = 7,
    IndexOutOfBounds = 8,
    RemoteFailure = 9,
}

/// Reads one length-prefixed frame.
pub async fn read_frame<R: AsyncRead + Unpin>(src: &mut R) -> Result<Vec<u8>> {
    let len = src.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len];
    src.read_exact(&mut body).await?;
    Ok(body)
}

/// Writes one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(dst: &mut W, body: &[u8]) -> Result<()> {
    debug_assert!(body.len() <= MAX_FRAME_LEN);
    dst.write_u32(body.len() as u32).await?;
    dst.write_all(body).await?;
    dst.flush().await?;
    Ok(())
}
