use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EXPORT_BATCH;
use crate::export::ExportError;
use crate::simulation::{suggested_y_range, Frame, FrameSequencer};

/// How a sink should scale the y-axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YAxis {
    Fixed { min: f64, max: f64 },
    /// Follow each frame's field extent
    Dynamic,
}

impl YAxis {
    pub fn range_for(self, field: &[f64]) -> (f64, f64) {
        match self {
            YAxis::Fixed { min, max } => (min, max),
            YAxis::Dynamic => suggested_y_range(field),
        }
    }

    pub fn toggled(self, fixed: (f64, f64)) -> Self {
        match self {
            YAxis::Fixed { .. } => YAxis::Dynamic,
            YAxis::Dynamic => YAxis::Fixed {
                min: fixed.0,
                max: fixed.1,
            },
        }
    }
}

/// Everything a renderer needs to draw one frame: two curves over the same
/// x samples, the spacecraft marker and the y-axis range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub index: usize,
    pub center: f64,
    pub x: Vec<f64>,
    pub field: Vec<f64>,
    pub ray: Vec<f64>,
    pub marker: (f64, f64),
    pub y_range: (f64, f64),
}

impl FrameRecord {
    pub fn from_frame(frame: Frame<'_>, y_axis: YAxis) -> Self {
        let y_range = y_axis.range_for(&frame.field);
        Self {
            index: frame.index,
            center: frame.center,
            x: frame.grid.samples().to_vec(),
            field: frame.field,
            ray: frame.ray,
            marker: (frame.center, 0.0),
            y_range,
        }
    }
}

/// Consumer of frame records, fed strictly in index order
pub trait RenderSink {
    fn push_frame(&mut self, record: &FrameRecord) -> Result<(), ExportError>;

    /// Called once after the last frame
    fn finish(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Realize every frame in order and hand each one to all sinks.
///
/// Frames are computed in parallel batches; delivery order is always 0..count.
pub fn drive_sinks(
    sequencer: &FrameSequencer,
    y_axis: YAxis,
    sinks: &mut [Box<dyn RenderSink>],
) -> Result<usize, ExportError> {
    let count = sequencer.frame_count();
    let mut start = 0;

    while start < count {
        let end = (start + EXPORT_BATCH).min(count);
        let batch = (start..end)
            .into_par_iter()
            .map(|index| {
                sequencer
                    .frame_at(index)
                    .map(|frame| FrameRecord::from_frame(frame, y_axis))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for record in &batch {
            for sink in sinks.iter_mut() {
                sink.push_frame(record)?;
            }
        }
        log::info!("Delivered frames {}..{} of {}", start, end, count);
        start = end;
    }

    for sink in sinks.iter_mut() {
        sink.finish()?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    /// Keeps everything it is given
    #[derive(Default)]
    struct Recorder {
        frames: std::sync::Arc<std::sync::Mutex<Vec<FrameRecord>>>,
        finished: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl RenderSink for Recorder {
        fn push_frame(&mut self, record: &FrameRecord) -> Result<(), ExportError> {
            self.frames.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), ExportError> {
            self.finished
                .store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_drive_delivers_in_order() {
        let settings = Settings {
            num_frames: 37,
            resolution: 200,
            ..Settings::default()
        };
        let seq = settings.build_sequencer().unwrap();
        let recorder = Recorder::default();
        let frames = recorder.frames.clone();
        let finished = recorder.finished.clone();

        let mut sinks: Vec<Box<dyn RenderSink>> = vec![Box::new(recorder)];
        let delivered = drive_sinks(&seq, YAxis::Dynamic, &mut sinks).unwrap();
        assert_eq!(delivered, 37);
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 37);
        for (i, record) in frames.iter().enumerate() {
            assert_eq!(record.index, i);
            let direct = seq.frame_at(i).unwrap();
            assert_eq!(record.field, direct.field);
            assert_eq!(record.ray, direct.ray);
            assert_eq!(record.marker, (direct.center, 0.0));
        }
    }

    #[test]
    fn test_y_axis_ranges() {
        let field = [-2.0, 1.0];
        assert_eq!(
            YAxis::Fixed { min: -3.0, max: 3.0 }.range_for(&field),
            (-3.0, 3.0)
        );
        assert_eq!(YAxis::Dynamic.range_for(&field), (-2.5, 1.5));
        assert_eq!(
            YAxis::Dynamic.toggled((-3.0, 3.0)),
            YAxis::Fixed { min: -3.0, max: 3.0 }
        );
    }
}
