//! Request and reply bodies for the Service (client-facing) port.

use std::io::{Read, Write};
use std::net::SocketAddr;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

use super::primitive;
use super::{Error, Result, Status};
use crate::path::FsPath;

/// Procedure discriminants for the Service port.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum Proc {
    Lock = 1,
    Unlock = 2,
    IsDirectory = 3,
    List = 4,
    CreateFile = 5,
    CreateDirectory = 6,
    Delete = 7,
    GetStorage = 8,
}

/// A decoded Service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Lock { path: FsPath, exclusive: bool },
    Unlock { path: FsPath, exclusive: bool },
    IsDirectory { path: FsPath },
    List { path: FsPath },
    CreateFile { path: FsPath },
    CreateDirectory { path: FsPath },
    Delete { path: FsPath },
    GetStorage { path: FsPath },
}

impl Request {
    /// The procedure this request invokes.
    pub fn proc(&self) -> Proc {
        match self {
            Request::Lock { .. } => Proc::Lock,
            Request::Unlock { .. } => Proc::Unlock,
            Request::IsDirectory { .. } => Proc::IsDirectory,
            Request::List { .. } => Proc::List,
            Request::CreateFile { .. } => Proc::CreateFile,
            Request::CreateDirectory { .. } => Proc::CreateDirectory,
            Request::Delete { .. } => Proc::Delete,
            Request::GetStorage { .. } => Proc::GetStorage,
        }
    }

    pub fn parse(src: &mut impl Read) -> Result<Self> {
        let disc = primitive::read_u32(src)?;
        let proc = Proc::from_u32(disc).ok_or(Error::EnumDiscMismatch(disc))?;
        let path = primitive::read_path(src)?;
        Ok(match proc {
            Proc::Lock => Request::Lock { path, exclusive: primitive::read_bool(src)? },
            Proc::Unlock => Request::Unlock { path, exclusive: primitive::read_bool(src)? },
            Proc::IsDirectory => Request::IsDirectory { path },
            Proc::List => Request::List { path },
            Proc::CreateFile => Request::CreateFile { path },
            Proc::CreateDirectory => Request::CreateDirectory { path },
            Proc::Delete => Request::Delete { path },
            Proc::GetStorage => Request::GetStorage { path },
        })
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        primitive::write_u32(dst, self.proc() as u32)?;
        match self {
            Request::Lock { path, exclusive } | Request::Unlock { path, exclusive } => {
                primitive::write_path(dst, path)?;
                primitive::write_bool(dst, *exclusive)
            }
            Request::IsDirectory { path }
            | Request::List { path }
            | Request::CreateFile { path }
            | Request::CreateDirectory { path }
            | Request::Delete { path }
            | Request::GetStorage { path } => primitive::write_path(dst, path),
        }
    }
}

/// A Service reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Lock and Unlock carry no payload.
    Done,
    /// IsDirectory, CreateFile, CreateDirectory, Delete.
    Flag(bool),
    /// List: child component names.
    Names(Vec<String>),
    /// GetStorage: the chosen storage server's data endpoint.
    Storage(SocketAddr),
    /// Any procedure: a logical or transport error.
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
            Proc::Lock | Proc::Unlock => Reply::Done,
            Proc::IsDirectory | Proc::CreateFile | Proc::CreateDirectory | Proc::Delete => {
                Reply::Flag(primitive::read_bool(src)?)
            }
            Proc::List => Reply::Names(primitive::read_strings(src)?),
            Proc::GetStorage => Reply::Storage(primitive::read_addr(src)?),
        })
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        match self {
            Reply::Err(status) => primitive::write_u32(dst, *status as u32),
            Reply::Done => primitive::write_u32(dst, Status::Ok as u32),
            Reply::Flag(value) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_bool(dst, *value)
            }
            Reply::Names(names) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_strings(dst, names)
            }
            Reply::Storage(addr) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_addr(dst, *addr)
            }
        }
    }
}
