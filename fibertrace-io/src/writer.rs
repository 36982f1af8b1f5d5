//! File writers for extracted fiber records.

use crate::Result;
use fibertrace_core::{FiberRecord, TraceSummary};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for fiber extraction results.
///
/// Writes fiber records to files in CSV or JSON form.
pub struct FiberFileWriter {
    writer: BufWriter<File>,
}

impl FiberFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes fiber records as CSV.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_records_csv(&mut self, records: &[FiberRecord]) -> Result<()> {
        writeln!(
            self.writer,
            "fiber,start_z,start_y,start_x,end_z,end_y,end_x,length,mean_intensity"
        )?;
        for (i, record) in records.iter().enumerate() {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{}",
                i + 1,
                record.start.z,
                record.start.y,
                record.start.x,
                record.end.z,
                record.end.y,
                record.end.x,
                record.length,
                record.mean_intensity
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a full trace summary as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error on serialization or write failure.
    pub fn write_summary_json(&mut self, summary: &TraceSummary) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error on flush failure.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibertrace_core::Voxel;
    use tempfile::NamedTempFile;

    fn sample_records() -> Vec<FiberRecord> {
        vec![
            FiberRecord {
                start: Voxel::new(1, 0, 0),
                end: Voxel::new(1, 0, 9),
                length: 9.0,
                mean_intensity: 210.5,
                component: 0,
            },
            FiberRecord {
                start: Voxel::new(2, 4, 4),
                end: Voxel::new(2, 8, 8),
                length: 5.656_854_249_492_381,
                mean_intensity: 190.0,
                component: 1,
            },
        ]
    }

    #[test]
    fn test_write_records_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = FiberFileWriter::create(file.path()).unwrap();
        writer.write_records_csv(&sample_records()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content
            .starts_with("fiber,start_z,start_y,start_x,end_z,end_y,end_x,length,mean_intensity"));
        assert!(content.contains("1,1,0,0,1,0,9,9,210.5"));
        assert!(content.contains("2,2,4,4,2,8,8,"));
    }

    #[test]
    fn test_write_summary_json_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let summary = TraceSummary {
            fibers: sample_records(),
            component_count: 2,
            skeleton_voxels: 15,
        };
        let mut writer = FiberFileWriter::create(file.path()).unwrap();
        writer.write_summary_json(&summary).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let back: TraceSummary = serde_json::from_str(&content).unwrap();
        assert_eq!(back, summary);
    }
}
