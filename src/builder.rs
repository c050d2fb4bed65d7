//! File builder (component G): a fluent accumulator that writes a complete
//! SQW file in one pass.
//!
//! The two-pass placeholder-then-patch layout algorithm is grounded on
//! `original_source/_build.py::SqwBuilder._serialize_block_allocation_table`
//! (write the BAT with zeroed positions, remember each position field's
//! offset, then seek back and patch once the real layout is known). The
//! `W: Write + Seek` generic bound and the seek-and-patch idiom itself come
//! from `implib-rs`'s `ar::GnuBuilder`, the closest writer-side precedent
//! available for a format with no writer of its own.

use std::io::{Cursor, Seek, Write};

use chrono::Utc;

use crate::codec::write_object_array;
use crate::error::{Error, Result};
use crate::header::{self, BlockDescriptor, BlockName, BlockType, FileHeader, SqwFileType};
use crate::io::{Byteorder, SqwWriter};
use crate::ir::ObjectArray;
use crate::schema::{
    containers::{UniqueObjectsContainer, UniqueReferencesContainer},
    dnd::DndMetadata,
    experiment::IxExperiment,
    instrument::{IxNullInstrument, IxSample},
    main_header::MainHeader,
    pix::{PixMetadata, DEFAULT_PIX_ROW_COUNT},
};

/// Entry point mirroring `original_source/_sqw.py`'s `SQW.open`/`create` pair:
/// `Sqw::build` starts a [`Builder`], `Reader::open` (see `crate::reader`)
/// reads one back.
pub struct Sqw;

impl Sqw {
    pub fn build<W: Write + Seek>(sink: W, title: impl Into<String>, byteorder: Byteorder) -> Builder<W> {
        Builder::new(sink, title, byteorder)
    }
}

enum PendingBlock {
    Regular(ObjectArray),
    /// A bulk pixel table: only the preamble (`n_rows`, `n_pixels`) is
    /// actually written; the table itself is reserved space for the caller
    /// to fill in afterwards.
    Pix { n_rows: u32, n_pixels: u64 },
}

/// Fluent SQW file builder. Consumed by [`Builder::create`].
pub struct Builder<W> {
    sink: W,
    byteorder: Byteorder,
    title: String,
    pix_registered: bool,
    experiments: Vec<IxExperiment>,
    n_dims: u32,
    n_pixel_rows: usize,
    blocks: Vec<(BlockName, PendingBlock)>,
}

impl<W: Write + Seek> Builder<W> {
    pub fn new(sink: W, title: impl Into<String>, byteorder: Byteorder) -> Self {
        Self {
            sink,
            byteorder,
            title: title.into(),
            pix_registered: false,
            experiments: Vec::new(),
            n_dims: 0,
            n_pixel_rows: DEFAULT_PIX_ROW_COUNT,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Register the pixel data preamble and the experiment metadata that
    /// goes with it. May only be called once.
    pub fn register_pixel_data(mut self, n_pixels: u64, n_dims: u32, experiments: Vec<IxExperiment>) -> Result<Self> {
        if self.pix_registered {
            return Err(Error::AlreadyRegistered);
        }
        self.pix_registered = true;
        self.n_dims = n_dims;

        let pix_metadata = PixMetadata::with_unset_range(String::new(), n_pixels, self.n_pixel_rows);
        self.blocks.push((
            BlockName("pix".to_string(), "metadata".to_string()),
            PendingBlock::Regular(pix_metadata.lower()),
        ));

        let experiments_array = lower_experiments(&experiments);
        self.blocks.push((
            BlockName("experiment_info".to_string(), "expdata".to_string()),
            PendingBlock::Regular(experiments_array),
        ));

        let references = UniqueReferencesContainer {
            global_indices: vec![0; experiments.len()],
        };
        self.blocks.push((
            BlockName("experiment_info".to_string(), "unique_references".to_string()),
            PendingBlock::Regular(references.lower()),
        ));

        self.experiments = experiments;

        // The bulk pixel table is always the final block: its payload is
        // reserved, not written, so nothing may come after it.
        self.blocks.push((
            BlockName("pix".to_string(), "data".to_string()),
            PendingBlock::Pix { n_rows: self.n_pixel_rows as u32, n_pixels },
        ));

        Ok(self)
    }

    #[must_use]
    pub fn add_dnd_metadata(mut self, metadata: &DndMetadata) -> Self {
        self.insert_before_pix(
            BlockName("data".to_string(), "metadata".to_string()),
            PendingBlock::Regular(metadata.lower()),
        );
        self
    }

    /// Alias for [`Builder::add_dnd_metadata`]: Horace distinguishes an
    /// "empty" DND block only by its contents, not its wire shape.
    #[must_use]
    pub fn add_empty_dnd_data(self, metadata: &DndMetadata) -> Self {
        self.add_dnd_metadata(metadata)
    }

    #[must_use]
    pub fn add_default_instrument(mut self, instrument: &IxNullInstrument) -> Self {
        let objects = UniqueObjectsContainer {
            objects: vec![instrument.lower()],
        };
        self.insert_before_pix(
            BlockName("instrument".to_string(), "unique_objects".to_string()),
            PendingBlock::Regular(objects.lower()),
        );
        self
    }

    #[must_use]
    pub fn add_default_sample(mut self, sample: &IxSample) -> Self {
        let objects = UniqueObjectsContainer {
            objects: vec![sample.lower()],
        };
        self.insert_before_pix(
            BlockName("sample".to_string(), "unique_objects".to_string()),
            PendingBlock::Regular(objects.lower()),
        );
        self
    }

    /// Insert `block` immediately before the trailing pixel-data block, if
    /// one has already been registered, so the bulk table always stays last.
    fn insert_before_pix(&mut self, name: BlockName, block: PendingBlock) {
        let insert_at = self
            .blocks
            .iter()
            .position(|(_, b)| matches!(b, PendingBlock::Pix { .. }))
            .unwrap_or(self.blocks.len());
        self.blocks.insert(insert_at, (name, block));
    }

    /// Serialize the file header, BAT, and every registered block, using the
    /// two-pass placeholder-then-patch layout.
    pub fn create(mut self) -> Result<WrittenFile<W>> {
        let main_header = MainHeader {
            full_filename: String::new(),
            title: self.title.clone(),
            nfiles: self.experiments.len() as u32,
            creation_date: Utc::now(),
            creation_date_defined_privately: false,
        };
        self.blocks.insert(
            0,
            (
                BlockName(String::new(), "main_header".to_string()),
                PendingBlock::Regular(main_header.lower()),
            ),
        );

        let file_header = FileHeader {
            prog_name: header::EXPECTED_PROG_NAME.to_string(),
            prog_version: header::EXPECTED_PROG_VERSION,
            sqw_type: SqwFileType::Sqw,
            n_dims: self.n_dims,
        };

        let mut writer = SqwWriter::new(&mut self.sink, self.byteorder);
        header::write_file_header(&mut writer, &file_header)?;

        let mut buffers = Vec::with_capacity(self.blocks.len());
        let mut descriptors = Vec::with_capacity(self.blocks.len());
        for (name, block) in &self.blocks {
            match block {
                PendingBlock::Regular(array) => {
                    let mut buf = Cursor::new(Vec::new());
                    {
                        let mut block_writer = SqwWriter::new(&mut buf, self.byteorder);
                        write_object_array(&mut block_writer, array)?;
                    }
                    let bytes = buf.into_inner();
                    descriptors.push(BlockDescriptor {
                        block_type: BlockType::Regular,
                        name: name.clone(),
                        position: 0,
                        size: bytes.len() as u32,
                        locked: false,
                    });
                    buffers.push(bytes);
                }
                PendingBlock::Pix { n_rows, n_pixels } => {
                    let mut buf = Cursor::new(Vec::new());
                    {
                        let mut block_writer = SqwWriter::new(&mut buf, self.byteorder);
                        block_writer.write_u32(*n_rows)?;
                        block_writer.write_u64(*n_pixels)?;
                    }
                    let preamble = buf.into_inner();
                    let table_size = *n_rows as u64 * *n_pixels * 4;
                    let total_size = preamble.len() as u64 + table_size;
                    descriptors.push(BlockDescriptor {
                        block_type: BlockType::Pix,
                        name: name.clone(),
                        position: 0,
                        size: total_size as u32,
                        locked: false,
                    });
                    buffers.push(preamble);
                }
            }
        }

        // Pass 1: write a provisional BAT with zeroed positions, remembering
        // each descriptor's position-field offset.
        let mut bat_buf = Cursor::new(Vec::new());
        let position_offsets: Vec<u64>;
        {
            let mut bat_writer = SqwWriter::new(&mut bat_buf, self.byteorder);
            bat_writer.write_u32(0)?; // bat_size placeholder
            bat_writer.write_u32(descriptors.len() as u32)?;
            position_offsets = descriptors
                .iter()
                .map(|d| header::write_block_descriptor(&mut bat_writer, d))
                .collect::<Result<_>>()?;
        }
        let bat_bytes_after_header = bat_buf.get_ref().len() as u64;

        // Pass 2: compute real positions and patch both the positions and
        // the leading bat_size.
        let bat_offset = writer.position()?;
        let mut position = bat_offset + bat_bytes_after_header;
        for (descriptor, offset) in descriptors.iter_mut().zip(&position_offsets) {
            descriptor.position = position;
            position += u64::from(descriptor.size);

            let mut patch_writer = SqwWriter::new(&mut bat_buf, self.byteorder);
            patch_writer.seek(*offset)?;
            patch_writer.write_u64(descriptor.position)?;
        }
        {
            let mut patch_writer = SqwWriter::new(&mut bat_buf, self.byteorder);
            patch_writer.seek(0)?;
            patch_writer.write_u32((bat_bytes_after_header - 8) as u32)?;
        }

        writer.write_raw(&bat_buf.into_inner())?;
        for buffer in &buffers {
            writer.write_raw(buffer)?;
        }

        Ok(WrittenFile {
            writer: SqwWriter::new(self.sink, self.byteorder),
        })
    }
}

fn lower_experiments(experiments: &[IxExperiment]) -> ObjectArray {
    use crate::ir::{ArrayData, Tag};

    ObjectArray {
        ty: Tag::Cell,
        shape: vec![experiments.len() as u32, 1],
        data: ArrayData::Cell(experiments.iter().map(IxExperiment::lower).collect()),
    }
}

/// A completed SQW file, positioned after the last eagerly-written payload.
pub struct WrittenFile<W> {
    writer: SqwWriter<W>,
}

impl<W: Write + Seek> WrittenFile<W> {
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }

    pub fn position(&mut self) -> Result<u64> {
        self.writer.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::read_bat;
    use crate::io::SqwReader;
    use std::io::Cursor;

    #[test]
    fn minimal_file_has_one_block() {
        let mut buf = Cursor::new(Vec::new());
        Builder::new(&mut buf, "my experiment", Byteorder::Little)
            .create()
            .unwrap();

        buf.set_position(0);
        let mut reader = SqwReader::new(&mut buf, Some(Byteorder::Little), "<mem>").unwrap();
        let header = header::read_file_header(&mut reader).unwrap();
        assert_eq!(header.prog_name, "horace");
        assert_eq!(header.n_dims, 0);

        let bat = read_bat(&mut reader).unwrap();
        assert_eq!(bat.entries.len(), 1);
        assert_eq!(bat.entries[0].name, BlockName(String::new(), "main_header".to_string()));
    }

    #[test]
    fn registering_pixel_data_twice_fails() {
        let buf = Cursor::new(Vec::new());
        let builder = Builder::new(buf, "t", Byteorder::Little)
            .register_pixel_data(1, 4, vec![])
            .unwrap();
        let err = builder.register_pixel_data(1, 4, vec![]).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered));
    }

    #[test]
    fn pix_block_reserves_space_without_writing_it() {
        let mut buf = Cursor::new(Vec::new());
        let written = Builder::new(&mut buf, "t", Byteorder::Little)
            .register_pixel_data(3, 4, vec![])
            .unwrap()
            .create()
            .unwrap();
        drop(written);

        buf.set_position(0);
        let mut reader = SqwReader::new(&mut buf, Some(Byteorder::Little), "<mem>").unwrap();
        header::read_file_header(&mut reader).unwrap();
        let bat = read_bat(&mut reader).unwrap();

        let pix_data = bat.get(&BlockName("pix".to_string(), "data".to_string())).unwrap();
        // 9 rows * 3 pixels * 4 bytes, plus the 12-byte preamble.
        assert_eq!(pix_data.size, 9 * 3 * 4 + 12);
    }
}
