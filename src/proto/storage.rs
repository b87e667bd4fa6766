//! Request and reply bodies for the storage-server interfaces.
//!
//! One procedure space covers both listeners of a storage server: the data
//! interface (`Size`, `Read`, `Write`) consumed by filesystem clients, and
//! the control interface (`Create`, `Delete`, `Copy`) consumed by the
//! naming server.

use std::io::{Read, Write};
use std::net::SocketAddr;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

use super::primitive;
use super::{Error, Result, Status};
use crate::path::FsPath;

/// Procedure discriminants for the storage ports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum Proc {
    Size = 1,
    Read = 2,
    Write = 3,
    Create = 4,
    Delete = 5,
    Copy = 6,
}

/// A decoded storage request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Size { path: FsPath },
    Read { path: FsPath, offset: u64, count: u32 },
    Write { path: FsPath, offset: u64, data: Vec<u8> },
    Create { path: FsPath },
    Delete { path: FsPath },
    /// Fetch `path` from the storage server behind `source` (a data
    /// endpoint), replacing any local content.
    Copy { path: FsPath, source: SocketAddr },
}

impl Request {
    /// The procedure this request invokes.
    pub fn proc(&self) -> Proc {
        match self {
            Request::Size { .. } => Proc::Size,
            Request::Read { .. } => Proc::Read,
            Request::Write { .. } => Proc::Write,
            Request::Create { .. } => Proc::Create,
            Request::Delete { .. } => Proc::Delete,
            Request::Copy { .. } => Proc::Copy,
        }
    }

    pub fn parse(src: &mut impl Read) -> Result<Self> {
        let disc = primitive::read_u32(src)?;
        let proc = Proc::from_u32(disc).ok_or(Error::EnumDiscMismatch(disc))?;
        let path = primitive::read_path(src)?;
        Ok(match proc {
            Proc::Size => Request::Size { path },
            Proc::Read => Request::Read {
                path,
                offset: primitive::read_u64(src)?,
                count: primitive::read_u32(src)?,
            },
            Proc::Write => Request::Write {
                path,
                offset: primitive::read_u64(src)?,
                data: primitive::read_bytes(src)?,
            },
            Proc::Create => Request::Create { path },
            Proc::Delete => Request::Delete { path },
            Proc::Copy => Request::Copy { path, source: primitive::read_addr(src)? },
        })
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        primitive::write_u32(dst, self.proc() as u32)?;
        match self {
            Request::Size { path } | Request::Create { path } | Request::Delete { path } => {
                primitive::write_path(dst, path)
            }
            Request::Read { path, offset, count } => {
                primitive::write_path(dst, path)?;
                primitive::write_u64(dst, *offset)?;
                primitive::write_u32(dst, *count)
            }
            Request::Write { path, offset, data } => {
                primitive::write_path(dst, path)?;
                primitive::write_u64(dst, *offset)?;
                primitive::write_bytes(dst, data)
            }
            Request::Copy { path, source } => {
                primitive::write_path(dst, path)?;
                primitive::write_addr(dst, *source)
            }
        }
    }
}

/// A storage reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Size.
    Size(u64),
    /// Read.
    Data(Vec<u8>),
    /// Write.
    Written,
    /// Create, Delete, Copy.
    Flag(bool),
    /// Any procedure.
    Err(Status),
}

impl Reply {
    /// Parses a reply to the given procedure.
    pub fn parse(src: &mut impl Read, proc: Proc) -> Result<Self> {
        let code = primitive::read_u32(src)?;
        let status = Status::from_u32(code).ok_or(Error::EnumDiscMismatch(code))?;
        if status != Status::Ok {
            return Ok(Reply::Err(status));
        }
        Ok(match proc {
            Proc::Size => Reply::Size(primitive::read_u64(src)?),
            Proc::Read => Reply::Data(primitive::read_bytes(src)?),
            Proc::Write => Reply::Written,
            Proc::Create | Proc::Delete | Proc::Copy => Reply::Flag(primitive::read_bool(src)?),
        })
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        match self {
            Reply::Err(status) => primitive::write_u32(dst, *status as u32),
            Reply::Size(size) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_u64(dst, *size)
            }
            Reply::Data(data) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_bytes(dst, data)
            }
            Reply::Written => primitive::write_u32(dst, Status::Ok as u32),
            Reply::Flag(value) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_bool(dst, *value)
            }
        }
    }
}
