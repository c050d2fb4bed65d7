use std::{error, fmt, io};

use crate::header::BlockName;

/// Errors produced while reading or writing an SQW file.
#[derive(Debug)]
pub enum Error {
    /// The stream ended before the expected number of bytes could be read.
    Truncated {
        path: String,
        position: u64,
        needed: usize,
    },
    /// A character array did not contain valid UTF-8.
    Encoding { path: String, position: u64 },
    /// No handler is registered for this type tag.
    UnsupportedTag { tag: u8, position: u64 },
    /// The block descriptor names a block type this crate does not parse.
    UnsupportedBlockType { block_type: String },
    /// `read_data_block` was called with a name absent from the BAT.
    NotFound(BlockName),
    /// A block name was supplied in an unsupported form.
    InvalidName,
    /// A single-shot builder mutator was called a second time.
    AlreadyRegistered,
    /// Lower-level I/O failure not covered by the variants above.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                path,
                position,
                needed,
            } => write!(
                f,
                "{path}: truncated read at byte {position}: needed {needed} more bytes"
            ),
            Self::Encoding { path, position } => {
                write!(f, "{path}: invalid UTF-8 in character array at byte {position}")
            }
            Self::UnsupportedTag { tag, position } => {
                write!(f, "no handler for type tag {tag} at byte {position}")
            }
            Self::UnsupportedBlockType { block_type } => {
                write!(f, "unsupported block type `{block_type}`")
            }
            Self::NotFound(name) => write!(f, "no such data block: {name}"),
            Self::InvalidName => write!(f, "invalid block name"),
            Self::AlreadyRegistered => write!(f, "pixel data already registered"),
            Self::Io(err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Internal-only signal raised while attempting to raise IR into a typed
/// schema object. Never escapes [`crate::reader::Reader::read_data_block`]:
/// it is caught there, logged as a warning, and the raw IR is returned
/// instead.
#[derive(Debug, Clone)]
pub(crate) struct SchemaAbort(pub(crate) String);

impl SchemaAbort {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl fmt::Display for SchemaAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
