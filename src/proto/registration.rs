//! Request and reply bodies for the Registration (storage-facing) port.

use std::io::{Read, Write};
use std::net::SocketAddr;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

use super::primitive;
use super::{Error, Result, Status};
use crate::path::FsPath;

/// Procedure discriminants for the Registration port.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum Proc {
    Register = 1,
}

/// A storage server announcing itself: its two endpoints and the files it
/// already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub data: SocketAddr,
    pub control: SocketAddr,
    pub paths: Vec<FsPath>,
}

impl Request {
    pub fn parse(src: &mut impl Read) -> Result<Self> {
        let disc = primitive::read_u32(src)?;
        if Proc::from_u32(disc) != Some(Proc::Register) {
            return Err(Error::EnumDiscMismatch(disc));
        }
        Ok(Request {
            data: primitive::read_addr(src)?,
            control: primitive::read_addr(src)?,
            paths: primitive::read_paths(src)?,
        })
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        primitive::write_u32(dst, Proc::Register as u32)?;
        primitive::write_addr(dst, self.data)?;
        primitive::write_addr(dst, self.control)?;
        primitive::write_paths(dst, &self.paths)
    }
}

/// A Registration reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Paths the registering server must delete locally.
    Paths(Vec<FsPath>),
    Err(Status),
}

impl Reply {
    pub fn parse(src: &mut impl Read) -> Result<Self> {
        let code = primitive::read_u32(src)?;
        let status = Status::from_u32(code).ok_or(Error::EnumDiscMismatch(code))?;
        if status != Status::Ok {
            return Ok(Reply::Err(status));
        }
        Ok(Reply::Paths(primitive::read_paths(src)?))
    }

    pub fn write(&self, dst: &mut impl Write) -> Result<()> {
        match self {
            Reply::Err(status) => primitive::write_u32(dst, *status as u32),
            Reply::Paths(paths) => {
                primitive::write_u32(dst, Status::Ok as u32)?;
                primitive::write_paths(dst, paths)
            }
        }
    }
}
