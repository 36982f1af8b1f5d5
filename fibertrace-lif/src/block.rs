//! LIF binary block structure.
//!
//! A LIF container is a sequence of length-prefixed blocks, each opened
//! by a `u32` magic value and a one-byte test mark. The first block
//! carries the metadata XML as UTF-16LE; every following block is a
//! memory block holding raw pixel payload for one image, identified by a
//! UTF-16LE description string such as `MemBlock_13`.
//!
//! Layout (little-endian):
//!
//! - Header block: `u32` magic `0x70`, `u32` block length, `u8` `0x2A`,
//!   `u32` character count, XML as UTF-16LE code units.
//! - Memory block: `u32` magic `0x70`, `u32` block length, `u8` `0x2A`,
//!   memory size (`u32` in version 1, `u64` in version 2), `u8` `0x2A`,
//!   `u32` description character count, description as UTF-16LE, then
//!   the raw payload of exactly the stated memory size.

use crate::metadata;
use crate::{Error, Result};

/// Block magic value opening every block.
pub const BLOCK_MAGIC: u32 = 0x70;

/// Test mark separating block fields.
pub const TEST_MARK: u8 = 0x2A;

/// One memory block's identity and payload location within the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Block identifier from the description field (e.g. `MemBlock_13`).
    pub id: String,
    /// Byte offset of the payload within the container.
    pub offset: usize,
    /// Payload size in bytes.
    pub size: usize,
}

/// Parsed container layout: the metadata XML and the payload directory.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    /// Format version declared by the metadata root element.
    pub version: u32,
    /// Decoded metadata XML.
    pub xml: String,
    /// Memory blocks in file order.
    pub blocks: Vec<MemoryBlock>,
}

impl ContainerLayout {
    /// Looks up a memory block by identifier.
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&MemoryBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

/// Byte cursor over the container with bounds-checked reads.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::Truncated {
            offset: self.pos,
            needed: len,
        })?;
        if end > self.data.len() {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: len,
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    fn expect_magic(&mut self) -> Result<()> {
        let offset = self.pos;
        let magic = self.read_u32()?;
        if magic != BLOCK_MAGIC {
            return Err(Error::InvalidFormat(format!(
                "bad block magic {magic:#x} at offset {offset}, expected {BLOCK_MAGIC:#x}"
            )));
        }
        Ok(())
    }

    fn expect_mark(&mut self) -> Result<()> {
        let offset = self.pos;
        let mark = self.read_u8()?;
        if mark != TEST_MARK {
            return Err(Error::InvalidFormat(format!(
                "bad test mark {mark:#x} at offset {offset}, expected {TEST_MARK:#x}"
            )));
        }
        Ok(())
    }

    /// Reads `chars` UTF-16LE code units and decodes them.
    fn read_utf16(&mut self, chars: usize) -> Result<String> {
        let offset = self.pos;
        let bytes = self.take(chars * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes(pair.try_into().expect("2-byte slice")))
            .collect();
        String::from_utf16(&units)
            .map_err(|_| Error::InvalidFormat(format!("invalid UTF-16 text at offset {offset}")))
    }
}

/// Parses the container's block structure without touching pixel data.
///
/// # Errors
/// Returns an error on bad magic values or test marks, truncated
/// fields or payloads, undecodable UTF-16, or an unsupported version.
pub fn parse_container(data: &[u8]) -> Result<ContainerLayout> {
    let mut cursor = Cursor::new(data);

    // Header block: metadata XML.
    cursor.expect_magic()?;
    let _block_len = cursor.read_u32()?;
    cursor.expect_mark()?;
    let chars = cursor.read_u32()? as usize;
    let xml = cursor.read_utf16(chars)?;

    let version = metadata::format_version(&xml)?;
    if !(1..=2).contains(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    // Memory blocks to end of file.
    let mut blocks = Vec::new();
    while !cursor.at_end() {
        cursor.expect_magic()?;
        let _block_len = cursor.read_u32()?;
        cursor.expect_mark()?;
        let size = if version == 1 {
            cursor.read_u32()? as usize
        } else {
            let size = cursor.read_u64()?;
            usize::try_from(size).map_err(|_| {
                Error::InvalidFormat(format!("memory block size {size} exceeds address space"))
            })?
        };
        cursor.expect_mark()?;
        let desc_chars = cursor.read_u32()? as usize;
        let id = cursor.read_utf16(desc_chars)?;
        let offset = cursor.pos;
        cursor.take(size)?;
        if size > 0 {
            blocks.push(MemoryBlock { id, offset, size });
        }
    }

    Ok(ContainerLayout {
        version,
        xml,
        blocks,
    })
}
