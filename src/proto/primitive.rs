//! Primitive wire data types.
//!
//! Integers are big-endian. Booleans are a `u32` 0 or 1. Strings are a
//! `u32` length followed by UTF-8 bytes; paths and socket addresses travel
//! as strings, byte buffers as a `u32` length followed by raw bytes.

use std::io::{Read, Write};
use std::net::SocketAddr;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{Error, Result, MAX_FRAME_LEN};
use crate::path::FsPath;

/// Longest string any field may carry.
pub const MAX_STRING_LEN: usize = 64 * 1024;

/// Most elements any list field may carry.
pub const MAX_LIST_LEN: usize = 64 * 1024;

pub fn read_u32(src: &mut impl Read) -> Result<u32> {
    src.read_u32::<BigEndian>().map_err(Error::IO)
}

pub fn read_u64(src: &mut impl Read) -> Result<u64> {
    src.read_u64::<BigEndian>().map_err(Error::IO)
}

pub fn read_bool(src: &mut impl Read) -> Result<bool> {
    match read_u32(src)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::EnumDiscMismatch(other)),
    }
}

pub fn read_bytes(src: &mut impl Read) -> Result<Vec<u8>> {
    let len = read_u32(src)? as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::MaxElemLimit);
    }
    let mut buf = vec![0u8; len];
    src.read_exact(&mut buf).map_err(Error::IO)?;
    Ok(buf)
}

pub fn read_string(src: &mut impl Read) -> Result<String> {
    let len = read_u32(src)? as usize;
    if len > MAX_STRING_LEN {
        return Err(Error::MaxElemLimit);
    }
    let mut buf = vec![0u8; len];
    src.read_exact(&mut buf).map_err(Error::IO)?;
    String::from_utf8(buf).map_err(|_| Error::BadUtf8)
}

pub fn read_path(src: &mut impl Read) -> Result<FsPath> {
    FsPath::parse(&read_string(src)?).map_err(Error::BadPath)
}

pub fn read_addr(src: &mut impl Read) -> Result<SocketAddr> {
    read_string(src)?.parse().map_err(|_| Error::BadAddress)
}

pub fn read_paths(src: &mut impl Read) -> Result<Vec<FsPath>> {
    let count = read_u32(src)? as usize;
    if count > MAX_LIST_LEN {
        return Err(Error::MaxElemLimit);
    }
    let mut paths = Vec::with_capacity(count);
    for _ in 0..count {
        paths.push(read_path(src)?);
    }
    Ok(paths)
}

pub fn read_strings(src: &mut impl Read) -> Result<Vec<String>> {
    let count = read_u32(src)? as usize;
    if count > MAX_LIST_LEN {
        return Err(Error::MaxElemLimit);
    }
    let mut strings = Vec::with_capacity(count);
    for _ in 0..count {
        strings.push(read_string(src)?);
    }
    Ok(strings)
}

pub fn write_u32(dst: &mut impl Write, value: u32) -> Result<()> {
    dst.write_u32::<BigEndian>(value).map_err(Error::IO)
}

pub fn write_u64(dst: &mut impl Write, value: u64) -> Result<()> {
    dst.write_u64::<BigEndian>(value).map_err(Error::IO)
}

pub fn write_bool(dst: &mut impl Write, value: bool) -> Result<()> {
    write_u32(dst, u32::from(value))
}

pub fn write_bytes(dst: &mut impl Write, bytes: &[u8]) -> Result<()> {
    write_u32(dst, bytes.len() as u32)?;
    dst.write_all(bytes).map_err(Error::IO)
}

pub fn write_string(dst: &mut impl Write, s: &str) -> Result<()> {
    write_bytes(dst, s.as_bytes())
}

pub fn write_path(dst: &mut impl Write, path: &FsPath) -> Result<()> {
    write_string(dst, &path.to_string())
}

pub fn write_addr(dst: &mut impl Write, addr: SocketAddr) -> Result<()> {
    write_string(dst, &addr.to_string())
}

pub fn write_paths(dst: &mut impl Write, paths: &[FsPath]) -> Result<()> {
    write_u32(dst, paths.len() as u32)?;
    for path in paths {
        write_path(dst, path)?;
    }
    Ok(())
}

pub fn write_strings(dst: &mut impl Write, strings: &[String]) -> Result<()> {
    write_u32(dst, strings.len() as u32)?;
    for s in strings {
        write_string(dst, s)?;
    }
    Ok(())
}
