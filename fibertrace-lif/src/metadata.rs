//! Container metadata model and XML-subset scanner.
//!
//! The metadata XML describes the acquired series: image dimensions,
//! channel layout, bit depth, and which memory block carries the pixel
//! payload. Only the attributes the pipeline needs are read; the scanner
//! walks tags directly rather than building a document tree, the same
//! way the binary layer walks blocks without materializing them.
//!
//! Recognized structure:
//!
//! - root element with a `Version` attribute;
//! - `Element` tags with a `Name` attribute, each describing one series;
//! - `DimensionDescription` tags with `DimID` (1 = X, 2 = Y, 3 = Z,
//!   4 = T) and `NumberOfElements`;
//! - `ChannelDescription` tags with `Resolution` (bits per sample);
//! - a `Memory` tag with `MemoryBlockID` closing out the series.

use crate::{Error, Result};

/// Dimension identifier for the X axis.
const DIM_X: u32 = 1;
/// Dimension identifier for the Y axis.
const DIM_Y: u32 = 2;
/// Dimension identifier for the Z axis.
const DIM_Z: u32 = 3;
/// Dimension identifier for the T axis.
const DIM_T: u32 = 4;

/// One acquired series: dimensions, channels, and payload identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInfo {
    /// Series name from the element's `Name` attribute.
    pub name: String,
    /// Identifier of the memory block holding the pixel payload.
    pub memory_block_id: String,
    /// Plane width in pixels (X).
    pub width: usize,
    /// Plane height in pixels (Y).
    pub height: usize,
    /// Number of z slices.
    pub z_count: usize,
    /// Number of time points.
    pub t_count: usize,
    /// Number of channels.
    pub channel_count: usize,
    /// Bits per sample (8 or 16).
    pub bits_per_pixel: u32,
}

impl SeriesInfo {
    /// Bytes per sample for the series' bit depth.
    #[must_use]
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_per_pixel <= 8 {
            1
        } else {
            2
        }
    }

    /// Size of one (y, x) plane in bytes.
    #[must_use]
    pub fn plane_bytes(&self) -> usize {
        self.width * self.height * self.bytes_per_sample()
    }

    /// Number of planes in the payload across z, t, and channels.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.z_count * self.t_count * self.channel_count
    }

    /// Ordinal of the (z, t, c) plane within the payload.
    ///
    /// Planes are stored channel-fastest: `((t * z_count + z) *
    /// channel_count + c)`.
    #[must_use]
    pub fn plane_index(&self, z: usize, t: usize, c: usize) -> usize {
        (t * self.z_count + z) * self.channel_count + c
    }

    /// Total payload size the memory block must provide.
    #[must_use]
    pub fn expected_payload(&self) -> usize {
        self.plane_count() * self.plane_bytes()
    }
}

/// Parsed container metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifMetadata {
    /// Format version from the root element.
    pub version: u32,
    /// Series in document order.
    pub series: Vec<SeriesInfo>,
}

/// Extracts the format version from the metadata XML root element.
///
/// # Errors
/// Returns [`Error::Metadata`] if no `Version` attribute is present or
/// it is not an integer.
pub fn format_version(xml: &str) -> Result<u32> {
    let tag = tags(xml)
        .next()
        .ok_or_else(|| Error::Metadata("empty metadata document".to_string()))?;
    let value = attr(tag, "Version")
        .ok_or_else(|| Error::Metadata("root element has no Version attribute".to_string()))?;
    value
        .parse()
        .map_err(|_| Error::Metadata(format!("invalid Version attribute '{value}'")))
}

/// Partial series state while scanning one `Element`.
#[derive(Default)]
struct SeriesDraft {
    name: String,
    width: usize,
    height: usize,
    z_count: usize,
    t_count: usize,
    channel_count: usize,
    bits_per_pixel: u32,
}

impl SeriesDraft {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn finish(self, memory_block_id: String) -> Result<SeriesInfo> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Metadata(format!(
                "series '{}' is missing X/Y dimensions",
                self.name
            )));
        }
        let bits = if self.bits_per_pixel == 0 {
            8
        } else {
            self.bits_per_pixel
        };
        if bits != 8 && bits != 16 {
            return Err(Error::Metadata(format!(
                "series '{}' has unsupported bit depth {bits}",
                self.name
            )));
        }
        Ok(SeriesInfo {
            name: self.name,
            memory_block_id,
            width: self.width,
            height: self.height,
            z_count: self.z_count.max(1),
            t_count: self.t_count.max(1),
            channel_count: self.channel_count.max(1),
            bits_per_pixel: bits,
        })
    }
}

/// Parses the metadata XML into the series list.
///
/// # Errors
/// Returns [`Error::Metadata`] on missing or malformed attributes.
pub fn parse_metadata(xml: &str) -> Result<LifMetadata> {
    let version = format_version(xml)?;
    let mut series = Vec::new();
    let mut draft: Option<SeriesDraft> = None;

    for tag in tags(xml) {
        match tag_name(tag) {
            "Element" => {
                if let Some(name) = attr(tag, "Name") {
                    draft = Some(SeriesDraft::new(name.to_string()));
                }
            }
            "DimensionDescription" => {
                if let Some(draft) = draft.as_mut() {
                    let dim: u32 = required_attr(tag, "DimID")?;
                    let count: usize = required_attr(tag, "NumberOfElements")?;
                    match dim {
                        DIM_X => draft.width = count,
                        DIM_Y => draft.height = count,
                        DIM_Z => draft.z_count = count,
                        DIM_T => draft.t_count = count,
                        _ => {}
                    }
                }
            }
            "ChannelDescription" => {
                if let Some(draft) = draft.as_mut() {
                    draft.channel_count += 1;
                    draft.bits_per_pixel = required_attr(tag, "Resolution")?;
                }
            }
            "Memory" => {
                if let Some(draft) = draft.take() {
                    let id = attr(tag, "MemoryBlockID").ok_or_else(|| {
                        Error::Metadata(format!(
                            "series '{}' Memory tag has no MemoryBlockID",
                            draft.name
                        ))
                    })?;
                    series.push(draft.finish(id.to_string())?);
                }
            }
            _ => {}
        }
    }

    Ok(LifMetadata { version, series })
}

/// Iterates over opening tag bodies, skipping closers and declarations.
fn tags(xml: &str) -> impl Iterator<Item = &str> {
    xml.split('<').skip(1).filter_map(|segment| {
        let body = segment.split('>').next()?;
        let body = body.trim_end_matches('/').trim();
        if body.is_empty() || body.starts_with('/') || body.starts_with('?') || body.starts_with('!')
        {
            None
        } else {
            Some(body)
        }
    })
}

/// Returns the element name of a tag body.
fn tag_name(tag: &str) -> &str {
    tag.split_whitespace().next().unwrap_or("")
}

/// Extracts a quoted attribute value from a tag body.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(" {name}=\"");
    let start = tag.find(&pattern)? + pattern.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Extracts and parses a required attribute.
fn required_attr<T: std::str::FromStr>(tag: &str, name: &str) -> Result<T> {
    let value = attr(tag, name).ok_or_else(|| {
        Error::Metadata(format!(
            "tag '{}' has no {name} attribute",
            tag_name(tag)
        ))
    })?;
    value.parse().map_err(|_| {
        Error::Metadata(format!(
            "tag '{}' has invalid {name} attribute '{value}'",
            tag_name(tag)
        ))
    })
}
