//! Reader and writer for Horace SQW v4 binary data files.

pub mod builder;
pub mod codec;
pub mod error;
pub mod header;
pub mod io;
pub mod ir;
pub mod reader;
pub mod schema;

pub use self::builder::{Builder, Sqw, WrittenFile};
pub use self::error::{Error, Result};
pub use self::header::{BlockName, BlockType, FileHeader, SqwFileType};
pub use self::io::Byteorder;
pub use self::reader::Reader;
pub use self::schema::BlockValue;
