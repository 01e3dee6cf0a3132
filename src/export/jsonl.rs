use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::export::ExportError;
use crate::sink::{FrameRecord, RenderSink};

/// Writes one JSON object per frame, one frame per line
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self, ExportError> {
        log::info!("Dumping frame records to {}", path.display());
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl RenderSink for JsonlSink {
    fn push_frame(&mut self, record: &FrameRecord) -> Result<(), ExportError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}
