//! The 8-byte trailer after the payload.
//!
//! Meant to carry a CRC-64 of the payload. Nothing computes one: writers store
//! [`PLACEHOLDER_TRAILER`] and readers surface the value without checking it.

use std::io::{Read, Write};

use byteorder::{ByteOrder, WriteBytesExt};

use super::{DumpEndian, read_section};
use crate::error::Result;

pub const TRAILER_SIZE: usize = std::mem::size_of::<u64>();

/// Value written in place of a checksum.
pub const PLACEHOLDER_TRAILER: u64 = 0;

pub fn decode_trailer<R: Read>(reader: &mut R) -> Result<u64> {
    let bytes = read_section(reader, TRAILER_SIZE, "trailer")?;
    Ok(DumpEndian::read_u64(&bytes))
}

pub fn encode_trailer<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_u64::<DumpEndian>(value)?;
    Ok(())
}
