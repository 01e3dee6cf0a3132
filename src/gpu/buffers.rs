use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::config::{GRID_STEP_X, GRID_STEP_Y, LINE_WIDTH, MARKER_RADIUS};
use crate::sink::FrameRecord;

/// One grid sample as seen by the plot shader (16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSample {
    pub x: f32,
    pub field: f32,
    pub ray: f32,
    pub _padding: f32,
}

/// Plot parameters passed to the fragment shader (64 bytes, aligned to 16).
/// Note: padding is three scalars, not a vec3, to keep the WGSL layout flat.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlotParams {
    // Surface (16 bytes)
    pub surface_width: f32,
    pub surface_height: f32,
    pub sample_count: u32,
    pub line_width: f32,

    // Data-space axes (16 bytes)
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,

    // Marker and grid (16 bytes)
    pub marker_x: f32,
    pub marker_y: f32,
    pub marker_radius: f32,
    pub grid_step_x: f32,

    // (16 bytes)
    pub grid_step_y: f32,
    pub _padding: [f32; 3],
}

impl PlotParams {
    pub fn for_record(record: &FrameRecord, surface: (u32, u32)) -> Self {
        let x_min = record.x.first().copied().unwrap_or(-1.0);
        let x_max = record.x.last().copied().unwrap_or(1.0);
        let (x_min, x_max) = if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 1.0, x_min + 1.0)
        };

        Self {
            surface_width: surface.0.max(1) as f32,
            surface_height: surface.1.max(1) as f32,
            sample_count: record.x.len() as u32,
            line_width: LINE_WIDTH,
            x_min: x_min as f32,
            x_max: x_max as f32,
            y_min: record.y_range.0 as f32,
            y_max: record.y_range.1 as f32,
            marker_x: record.marker.0 as f32,
            marker_y: record.marker.1 as f32,
            marker_radius: MARKER_RADIUS,
            grid_step_x: GRID_STEP_X as f32,
            grid_step_y: GRID_STEP_Y as f32,
            _padding: [0.0; 3],
        }
    }
}

/// Pack a record's curves for upload
pub fn pack_samples(record: &FrameRecord) -> Vec<GpuSample> {
    record
        .x
        .iter()
        .zip(&record.field)
        .zip(&record.ray)
        .map(|((&x, &field), &ray)| GpuSample {
            x: x as f32,
            field: field as f32,
            ray: ray as f32,
            _padding: 0.0,
        })
        .collect()
}

/// Storage buffer for the current frame's samples plus the plot uniform
pub struct PlotBuffers {
    pub samples_buffer: Buffer,
    pub params_buffer: Buffer,
    /// Grid length; fixed for the whole run
    pub sample_count: usize,
}

impl PlotBuffers {
    pub fn new(device: &Device, sample_count: usize) -> Self {
        let samples_size = (sample_count.max(1) * std::mem::size_of::<GpuSample>()) as u64;

        let samples_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plot-samples-buffer"),
            size: samples_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plot-params-buffer"),
            size: std::mem::size_of::<PlotParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            samples_buffer,
            params_buffer,
            sample_count,
        }
    }

    /// Upload one frame and the plot parameters for the current surface size
    pub fn upload(&self, queue: &Queue, record: &FrameRecord, surface: (u32, u32)) {
        let samples = pack_samples(record);
        debug_assert_eq!(samples.len(), self.sample_count, "Frame size changed mid-run");
        queue.write_buffer(&self.samples_buffer, 0, bytemuck::cast_slice(&samples));

        let params = PlotParams::for_record(record, surface);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::sink::YAxis;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(std::mem::size_of::<GpuSample>(), 16);
        assert_eq!(std::mem::size_of::<PlotParams>(), 64);
    }

    #[test]
    fn test_pack_samples() {
        let seq = Settings {
            resolution: 64,
            ..Settings::default()
        }
        .build_sequencer()
        .unwrap();
        let record = FrameRecord::from_frame(seq.frame_at(3).unwrap(), YAxis::Dynamic);
        let packed = pack_samples(&record);
        assert_eq!(packed.len(), 64);
        assert_eq!(packed[10].x, record.x[10] as f32);
        assert_eq!(packed[10].field, record.field[10] as f32);
        assert_eq!(packed[10].ray, record.ray[10] as f32);

        let params = PlotParams::for_record(&record, (800, 0));
        assert_eq!(params.sample_count, 64);
        assert_eq!(params.surface_height, 1.0);
        assert_eq!(params.marker_x, record.center as f32);
        assert_eq!(params.y_min, record.y_range.0 as f32);
    }
}
