use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::error::WarpError;
use crate::export::raster::PlotRaster;
use crate::export::ExportError;
use crate::sink::{FrameRecord, RenderSink};

/// NeuQuant sampling factor: 1 is best quality, 30 fastest
const QUANTIZE_SPEED: i32 = 10;

/// Writer that keeps the first I/O failure it sees.
///
/// The GIF trailer and the final buffer flush happen inside `Drop` impls,
/// which discard errors; the latch lets `finish` report them anyway.
struct LatchedWriter<W> {
    inner: W,
    failure: Rc<RefCell<Option<io::Error>>>,
}

impl<W: Write> LatchedWriter<W> {
    fn latch(&self, err: io::Error) -> io::Error {
        if err.kind() == io::ErrorKind::Interrupted {
            // Retried by write_all
            return err;
        }
        let copy = io::Error::new(err.kind(), err.to_string());
        self.failure.borrow_mut().get_or_insert(err);
        copy
    }
}

impl<W: Write> Write for LatchedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.latch(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.latch(e))
    }
}

type GifWriter = BufWriter<LatchedWriter<File>>;

/// Encodes frame records into a looping animated GIF
pub struct GifSink {
    path: PathBuf,
    encoder: Option<GifEncoder<GifWriter>>,
    failure: Rc<RefCell<Option<io::Error>>>,
    raster: PlotRaster,
    delay: Delay,
    frames_written: usize,
}

impl GifSink {
    pub fn create(path: &Path, width: u32, height: u32, fps: u32) -> Result<Self, ExportError> {
        if fps == 0 {
            return Err(WarpError::invalid("export_fps", "frame rate must be positive").into());
        }

        let failure = Rc::new(RefCell::new(None));
        let writer = LatchedWriter {
            inner: File::create(path)?,
            failure: Rc::clone(&failure),
        };
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(writer), QUANTIZE_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;

        log::info!(
            "Exporting {}x{} GIF at {} fps to {}",
            width,
            height,
            fps,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            encoder: Some(encoder),
            failure,
            raster: PlotRaster::new(width, height),
            delay: Delay::from_numer_denom_ms(1000, fps),
            frames_written: 0,
        })
    }

    #[cfg(test)]
    fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl RenderSink for GifSink {
    fn push_frame(&mut self, record: &FrameRecord) -> Result<(), ExportError> {
        let encoder = self.encoder.as_mut().ok_or(ExportError::Finished)?;
        let img = self.raster.render(record);
        encoder.encode_frame(Frame::from_parts(img, 0, 0, self.delay))?;
        self.frames_written += 1;
        log::debug!("Encoded frame {} (center {:.3})", record.index, record.center);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        // Dropping the encoder writes the GIF trailer and flushes the buffer
        if let Some(encoder) = self.encoder.take() {
            drop(encoder);
            if let Some(err) = self.failure.borrow_mut().take() {
                return Err(ExportError::Io(err));
            }
            log::info!(
                "Wrote {} frames to {}",
                self.frames_written,
                self.path.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::sink::{drive_sinks, YAxis};
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;
    use std::io::BufReader;

    #[test]
    fn test_gif_has_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warp.gif");
        let settings = Settings {
            num_frames: 5,
            resolution: 120,
            width: 80,
            height: 48,
            ..Settings::default()
        };
        let seq = settings.build_sequencer().unwrap();

        let sink = GifSink::create(&path, settings.width, settings.height, 10).unwrap();
        let mut sinks: Vec<Box<dyn RenderSink>> = vec![Box::new(sink)];
        drive_sinks(&seq, YAxis::Fixed { min: -3.0, max: 3.0 }, &mut sinks).unwrap();

        let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].buffer().dimensions(), (80, 48));
    }

    #[test]
    fn test_push_after_finish_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.gif");
        let seq = Settings {
            num_frames: 1,
            resolution: 10,
            ..Settings::default()
        }
        .build_sequencer()
        .unwrap();
        let record = FrameRecord::from_frame(seq.frame_at(0).unwrap(), YAxis::Dynamic);

        let mut sink = GifSink::create(&path, 40, 30, 20).unwrap();
        sink.push_frame(&record).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frames_written(), 1);
        assert!(matches!(
            sink.push_frame(&record),
            Err(ExportError::Finished)
        ));
    }

    #[test]
    fn test_zero_fps_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = GifSink::create(&dir.path().join("still.gif"), 40, 30, 0);
        assert!(matches!(
            result,
            Err(ExportError::Model(WarpError::InvalidParameter {
                name: "export_fps",
                ..
            }))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_surfaces_from_finish() {
        let seq = Settings {
            num_frames: 1,
            resolution: 10,
            ..Settings::default()
        }
        .build_sequencer()
        .unwrap();
        let record = FrameRecord::from_frame(seq.frame_at(0).unwrap(), YAxis::Dynamic);

        // Opening /dev/full succeeds; every write fails with ENOSPC
        let mut sink = GifSink::create(Path::new("/dev/full"), 40, 30, 20).unwrap();
        let result = sink.push_frame(&record).and_then(|_| sink.finish());
        assert!(
            matches!(result, Err(ExportError::Io(_)) | Err(ExportError::Image(_))),
            "export to a full device must fail, got {:?}",
            result
        );
    }
}
