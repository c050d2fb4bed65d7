//! File header and Block Allocation Table (component E).
//!
//! Parses a fixed preamble, then builds a name → descriptor map before
//! handing control to the caller, mirroring the Python reference
//! implementation's `_sqw.py::_read_header` for the exact non-fatal-warning
//! conditions.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, Write};

use crate::error::Result;
use crate::io::{SqwReader, SqwWriter};

/// `prog_name`/`prog_version` this crate writes and expects on read.
pub const EXPECTED_PROG_NAME: &str = "horace";
pub const EXPECTED_PROG_VERSION: f64 = 4.0;

/// Whether a file holds a full SQW dataset or only a DND (density) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqwFileType {
    Dnd,
    Sqw,
}

impl SqwFileType {
    #[must_use]
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Dnd),
            1 => Some(Self::Sqw),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Dnd => 0,
            Self::Sqw => 1,
        }
    }
}

/// The fixed preamble at the start of every SQW file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub prog_name: String,
    pub prog_version: f64,
    pub sqw_type: SqwFileType,
    pub n_dims: u32,
}

/// A block's location and byte type as recorded in the BAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Regular,
    Pix,
    Dnd,
}

impl BlockType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "data_block",
            Self::Pix => "pix_data_block",
            Self::Dnd => "dnd_data_block",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "data_block" => Some(Self::Regular),
            "pix_data_block" => Some(Self::Pix),
            "dnd_data_block" => Some(Self::Dnd),
            _ => None,
        }
    }
}

/// A two-level block key: `(level1, level2)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockName(pub String, pub String);

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"{}\", \"{}\")", self.0, self.1)
    }
}

impl From<(String, String)> for BlockName {
    fn from((a, b): (String, String)) -> Self {
        Self(a, b)
    }
}

impl From<(&str, &str)> for BlockName {
    fn from((a, b): (&str, &str)) -> Self {
        Self(a.to_string(), b.to_string())
    }
}

impl From<&BlockName> for BlockName {
    fn from(name: &BlockName) -> Self {
        name.clone()
    }
}

/// Any shape other than the two-string form is a misuse of the naming
/// convention, not a different way to spell a valid name.
impl TryFrom<&str> for BlockName {
    type Error = ();

    fn try_from(_: &str) -> std::result::Result<Self, Self::Error> {
        Err(())
    }
}

impl TryFrom<(&str, &str, &str)> for BlockName {
    type Error = ();

    fn try_from(_: (&str, &str, &str)) -> std::result::Result<Self, Self::Error> {
        Err(())
    }
}

/// One entry in the Block Allocation Table.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDescriptor {
    pub block_type: BlockType,
    pub name: BlockName,
    pub position: u64,
    pub size: u32,
    pub locked: bool,
}

/// The parsed Block Allocation Table, indexed by name for O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct Bat {
    pub entries: Vec<BlockDescriptor>,
    by_name: HashMap<BlockName, usize>,
}

impl Bat {
    #[must_use]
    pub fn new(entries: Vec<BlockDescriptor>) -> Self {
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        Self { entries, by_name }
    }

    #[must_use]
    pub fn get(&self, name: &BlockName) -> Option<&BlockDescriptor> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &BlockName> {
        self.entries.iter().map(|d| &d.name)
    }
}

pub fn write_file_header<W: Write + Seek>(io: &mut SqwWriter<W>, header: &FileHeader) -> Result<()> {
    io.write_char_array(&header.prog_name)?;
    io.write_f64(header.prog_version)?;
    io.write_u32(header.sqw_type.as_u32())?;
    io.write_u32(header.n_dims)?;
    Ok(())
}

/// Read the file header, logging a warning for any of the conditions the
/// original Horace reader tolerates but flags: an unrecognized `prog_name`,
/// an unexpected `prog_version`, or a non-SQW `sqw_type`.
pub fn read_file_header<R: Read + Seek>(io: &mut SqwReader<R>) -> Result<FileHeader> {
    let prog_name = io.read_char_array()?;
    let prog_version = io.read_f64()?;
    if prog_name != EXPECTED_PROG_NAME || prog_version != EXPECTED_PROG_VERSION {
        log::warn!(
            "SQW program not supported: '{prog_name}' version {prog_version} \
             (expected '{EXPECTED_PROG_NAME}' with version {EXPECTED_PROG_VERSION})"
        );
    }

    let sqw_type_raw = io.read_u32()?;
    let sqw_type = SqwFileType::from_u32(sqw_type_raw).unwrap_or_else(|| {
        log::warn!("unrecognized sqw_type value {sqw_type_raw}, treating as DND");
        SqwFileType::Dnd
    });
    if sqw_type != SqwFileType::Sqw {
        log::warn!("file is not an SQW-type file (sqw_type = {sqw_type_raw})");
    }

    let n_dims = io.read_u32()?;
    Ok(FileHeader {
        prog_name,
        prog_version,
        sqw_type,
        n_dims,
    })
}

pub fn read_block_descriptor<R: Read + Seek>(io: &mut SqwReader<R>) -> Result<BlockDescriptor> {
    let block_type_str = io.read_char_array()?;
    let block_type = BlockType::from_str(&block_type_str)
        .unwrap_or(BlockType::Regular);
    let level1 = io.read_char_array()?;
    let level2 = io.read_char_array()?;
    let position = io.read_u64()?;
    let size = io.read_u32()?;
    let locked = io.read_u32()? != 0;
    Ok(BlockDescriptor {
        block_type,
        name: BlockName(level1, level2),
        position,
        size,
        locked,
    })
}

/// Returns the stream offset at which `position` was written, so the
/// builder can patch it later.
pub fn write_block_descriptor<W: Write + Seek>(
    io: &mut SqwWriter<W>,
    descriptor: &BlockDescriptor,
) -> Result<u64> {
    io.write_char_array(descriptor.block_type.as_str())?;
    io.write_char_array(&descriptor.name.0)?;
    io.write_char_array(&descriptor.name.1)?;
    let position_offset = io.position()?;
    io.write_u64(descriptor.position)?;
    io.write_u32(descriptor.size)?;
    io.write_u32(u32::from(descriptor.locked))?;
    Ok(position_offset)
}

/// Parse `bat_size` (discarded), `n_blocks`, and that many descriptors.
pub fn read_bat<R: Read + Seek>(io: &mut SqwReader<R>) -> Result<Bat> {
    let _bat_size = io.read_u32()?;
    let n_blocks = io.read_u32()? as usize;
    let mut entries = Vec::with_capacity(n_blocks);
    for _ in 0..n_blocks {
        entries.push(read_block_descriptor(io)?);
    }
    Ok(Bat::new(entries))
}
