//! Memory-mapped container readers.
//!

use crate::{Error, Result};
use fibertrace_lif::{parse_container, parse_metadata, ContainerLayout, LifMetadata, SeriesInfo};
use memmap2::Mmap;
use ndarray::Array2;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire
/// file into memory. The mapping is owned by the reader and released
/// when it drops, on every exit path.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Returns the path the reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A LIF container reader with memory-mapped I/O.
///
/// Parses the block directory and metadata at open time, then decodes
/// individual (z, t, c) planes on demand.
pub struct LifFileReader {
    reader: MappedFileReader,
    layout: ContainerLayout,
    metadata: LifMetadata,
}

impl LifFileReader {
    /// Opens a LIF container and validates its payload directory.
    ///
    /// Every series must name an existing memory block large enough for
    /// its declared dimensions, so plane reads cannot run past a block.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped, the
    /// block structure or metadata is malformed, or a series' payload
    /// is missing or truncated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        let layout = parse_container(reader.as_bytes())?;
        let metadata = parse_metadata(&layout.xml)?;

        for series in &metadata.series {
            let block = layout.block(&series.memory_block_id).ok_or_else(|| {
                fibertrace_lif::Error::Metadata(format!(
                    "series '{}' references missing memory block '{}'",
                    series.name, series.memory_block_id
                ))
            })?;
            if block.size < series.expected_payload() {
                return Err(fibertrace_lif::Error::Truncated {
                    offset: block.offset,
                    needed: series.expected_payload(),
                }
                .into());
            }
        }

        Ok(Self {
            reader,
            layout,
            metadata,
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Returns the path the container was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Container format version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.metadata.version
    }

    /// Number of series in the container.
    #[must_use]
    pub fn series_count(&self) -> usize {
        self.metadata.series.len()
    }

    /// Metadata for every series, in document order.
    #[must_use]
    pub fn series_infos(&self) -> &[SeriesInfo] {
        &self.metadata.series
    }

    /// Selects one series for plane access.
    ///
    /// # Errors
    /// Returns [`Error::SeriesIndex`] if `index` is out of range.
    pub fn series(&self, index: usize) -> Result<SeriesReader<'_>> {
        let count = self.series_count();
        let info = self
            .metadata
            .series
            .get(index)
            .ok_or(Error::SeriesIndex { index, count })?;
        let block = self
            .layout
            .block(&info.memory_block_id)
            .expect("block presence validated at open");
        Ok(SeriesReader {
            data: self.reader.as_bytes(),
            info,
            offset: block.offset,
        })
    }
}

/// Plane access into one series of an open container.
#[derive(Debug)]
pub struct SeriesReader<'a> {
    data: &'a [u8],
    info: &'a SeriesInfo,
    offset: usize,
}

impl SeriesReader<'_> {
    /// Metadata of the selected series.
    #[must_use]
    pub fn info(&self) -> &SeriesInfo {
        self.info
    }

    /// Number of z slices (at fixed t, c).
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.info.z_count
    }

    /// Decodes the (z, t, c) intensity plane to `f32`.
    ///
    /// # Errors
    /// Returns [`Error::PlaneIndex`] for an out-of-range z, t, or c.
    pub fn plane(&self, z: usize, t: usize, c: usize) -> Result<Array2<f32>> {
        self.check_axis("z", z, self.info.z_count)?;
        self.check_axis("t", t, self.info.t_count)?;
        self.check_axis("c", c, self.info.channel_count)?;

        let plane_bytes = self.info.plane_bytes();
        let start = self.offset + self.info.plane_index(z, t, c) * plane_bytes;
        let bytes = &self.data[start..start + plane_bytes];

        let (height, width) = (self.info.height, self.info.width);
        let plane = if self.info.bytes_per_sample() == 1 {
            Array2::from_shape_fn((height, width), |(y, x)| f32::from(bytes[y * width + x]))
        } else {
            Array2::from_shape_fn((height, width), |(y, x)| {
                let i = (y * width + x) * 2;
                f32::from(u16::from_le_bytes([bytes[i], bytes[i + 1]]))
            })
        };
        Ok(plane)
    }

    /// Reads the full z stack at t=0, c=0, in ascending z order.
    ///
    /// # Errors
    /// Propagates plane decoding errors.
    pub fn z_stack(&self) -> Result<Vec<Array2<f32>>> {
        (0..self.plane_count()).map(|z| self.plane(z, 0, 0)).collect()
    }

    fn check_axis(&self, axis: &'static str, index: usize, count: usize) -> Result<()> {
        if index >= count {
            return Err(Error::PlaneIndex { axis, index, count });
        }
        Ok(())
    }
}
