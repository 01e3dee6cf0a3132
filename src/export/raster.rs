use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::config::{GRID_STEP_X, GRID_STEP_Y, LINE_WIDTH, MARKER_RADIUS};
use crate::sink::FrameRecord;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRID_COLOR: Rgba<u8> = Rgba([225, 225, 225, 255]);
const AXIS_COLOR: Rgba<u8> = Rgba([150, 150, 150, 255]);
const FIELD_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const RAY_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const MARKER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Maps data coordinates onto a pixel canvas
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Viewport {
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let px = (x - x0) / (x1 - x0) * (self.width - 1) as f64;
        let py = (y1 - y) / (y1 - y0) * (self.height - 1) as f64;
        (px as f32, py as f32)
    }
}

/// CPU rasterizer for frame records, used by the GIF exporter
pub struct PlotRaster {
    width: u32,
    height: u32,
}

impl PlotRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn viewport(&self, record: &FrameRecord) -> Viewport {
        let x_min = record.x.first().copied().unwrap_or(-1.0);
        let x_max = record.x.last().copied().unwrap_or(1.0);
        // Single-sample grids still need a non-degenerate span
        let x_range = if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 1.0, x_min + 1.0)
        };
        Viewport {
            width: self.width,
            height: self.height,
            x_range,
            y_range: record.y_range,
        }
    }

    pub fn render(&self, record: &FrameRecord) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        let view = self.viewport(record);

        self.draw_grid(&mut img, &view);
        draw_curve(&mut img, &view, &record.x, &record.field, FIELD_COLOR);
        draw_curve(&mut img, &view, &record.x, &record.ray, RAY_COLOR);

        let (mx, my) = view.to_pixel(record.marker.0, record.marker.1);
        if mx.is_finite() && my.is_finite() {
            draw_filled_circle_mut(
                &mut img,
                (mx.round() as i32, my.round() as i32),
                MARKER_RADIUS as i32,
                MARKER_COLOR,
            );
        }

        img
    }

    fn draw_grid(&self, img: &mut RgbaImage, view: &Viewport) {
        let right = (self.width - 1) as f32;
        let bottom = (self.height - 1) as f32;

        for x in grid_lines(view.x_range, GRID_STEP_X) {
            let (px, _) = view.to_pixel(x, 0.0);
            let color = if x == 0.0 { AXIS_COLOR } else { GRID_COLOR };
            draw_line_segment_mut(img, (px, 0.0), (px, bottom), color);
        }
        for y in grid_lines(view.y_range, GRID_STEP_Y) {
            let (_, py) = view.to_pixel(0.0, y);
            let color = if y == 0.0 { AXIS_COLOR } else { GRID_COLOR };
            draw_line_segment_mut(img, (0.0, py), (right, py), color);
        }
    }
}

/// Multiples of `step` inside `range`
fn grid_lines(range: (f64, f64), step: f64) -> impl Iterator<Item = f64> {
    let first = (range.0 / step).ceil() as i64;
    let last = (range.1 / step).floor() as i64;
    (first..=last).map(move |k| k as f64 * step)
}

fn draw_curve(img: &mut RgbaImage, view: &Viewport, xs: &[f64], ys: &[f64], color: Rgba<u8>) {
    let height = view.height as f32;
    let thickness = LINE_WIDTH.max(1.0) as i32;

    let points: Vec<(f32, f32)> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| view.to_pixel(x, y))
        .collect();

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        // Both ends on the same side off-canvas: nothing to draw
        if (a.1 < 0.0 && b.1 < 0.0) || (a.1 >= height && b.1 >= height) {
            continue;
        }
        for offset in 0..thickness {
            let dy = offset as f32 - (thickness - 1) as f32 / 2.0;
            draw_line_segment_mut(img, (a.0, a.1 + dy), (b.0, b.1 + dy), color);
        }
    }
}
