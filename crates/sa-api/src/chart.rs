//! Chart rendering to PNG.
//!
//! Charts are drawn with plotters onto an in-memory RGB buffer and encoded
//! as PNG with the `image` crate. Only shapes are drawn (bars, points, axis
//! lines), so no font backend is needed.

use std::io::Cursor;
use std::ops::Range;

use base64::Engine as _;
use plotters::prelude::*;
use thiserror::Error;

/// Canvas size in pixels.
pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 600;

const MAX_BINS: usize = 1000;

const FILL: RGBColor = RGBColor(76, 114, 176);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("pixel buffer does not match canvas size")]
    Buffer,

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// What to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// Contiguous bins; `edges.len() == counts.len() + 1`.
    Histogram { edges: Vec<f64>, counts: Vec<f64> },
    /// One bar per category, in the given order.
    Bars(Vec<f64>),
    Scatter(Vec<(f64, f64)>),
}

impl Chart {
    /// Histogram of `values` with automatically chosen bins.
    pub fn histogram(values: &[f64]) -> Self {
        let (edges, counts) = histogram_bins(values);
        Chart::Histogram { edges, counts }
    }

    fn bounds(&self) -> (Range<f64>, Range<f64>) {
        match self {
            Chart::Histogram { edges, counts } => {
                let lo = edges.first().copied().unwrap_or(0.0);
                let hi = edges.last().copied().unwrap_or(1.0);
                (lo..hi, 0.0..y_top(counts))
            }
            Chart::Bars(heights) => {
                let n = heights.len().max(1) as f64;
                (-0.5..n - 0.5, 0.0..y_top(heights))
            }
            Chart::Scatter(points) => {
                let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
                let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
                (padded(&xs), padded(&ys))
            }
        }
    }
}

fn y_top(heights: &[f64]) -> f64 {
    heights.iter().copied().fold(1.0, f64::max) * 1.05
}

fn padded(values: &[f64]) -> Range<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi - lo <= 0.0 {
        return lo - 0.5..hi + 0.5;
    }
    let pad = (hi - lo) * 0.05;
    lo - pad..hi + pad
}

/// Linear-interpolated percentile of sorted data, `q` in `[0, 1]`.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Equal-width bins over the data range.
///
/// The bin width is the smaller of the Sturges and Freedman–Diaconis
/// widths (i.e. the larger bin count); Sturges alone when the
/// interquartile range is zero. A constant sample gets a single unit-wide
/// bin centred on the value.
pub fn histogram_bins(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (vec![0.0, 1.0], vec![0.0]);
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    let bins = if hi > lo {
        let range = hi - lo;
        let sturges = range / (n.log2() + 1.0);
        let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
        let fd = 2.0 * iqr / n.cbrt();
        let width = if fd > 0.0 { fd.min(sturges) } else { sturges };
        ((range / width).ceil() as usize).clamp(1, MAX_BINS)
    } else {
        lo -= 0.5;
        hi += 0.5;
        1
    };

    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + step * i as f64).collect();
    edges.push(hi);

    let mut counts = vec![0.0; bins];
    for v in &sorted {
        let idx = (((v - lo) / step).floor() as usize).min(bins - 1);
        counts[idx] += 1.0;
    }
    (edges, counts)
}

fn draw(buf: &mut [u8], chart: &Chart) -> Result<(), ChartError> {
    let root = BitMapBackend::with_buffer(buf, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (x_range, y_range) = chart.bounds();
    let mut ctx = ChartBuilder::on(&root)
        .margin(40)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_err)?;

    let origin = (x_range.start, y_range.start);
    ctx.draw_series([
        PathElement::new(vec![origin, (x_range.end, y_range.start)], BLACK.stroke_width(1)),
        PathElement::new(vec![origin, (x_range.start, y_range.end)], BLACK.stroke_width(1)),
    ])
    .map_err(draw_err)?;

    match chart {
        Chart::Histogram { edges, counts } => {
            ctx.draw_series(edges.windows(2).zip(counts).map(|(w, &c)| {
                Rectangle::new([(w[0], 0.0), (w[1], c)], FILL.filled())
            }))
            .map_err(draw_err)?;
        }
        Chart::Bars(heights) => {
            ctx.draw_series(heights.iter().enumerate().map(|(i, &h)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, h)], FILL.filled())
            }))
            .map_err(draw_err)?;
        }
        Chart::Scatter(points) => {
            ctx.draw_series(points.iter().map(|&p| Circle::new(p, 3, FILL.filled())))
                .map_err(draw_err)?;
        }
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Render to PNG bytes.
pub fn render_png(chart: &Chart) -> Result<Vec<u8>, ChartError> {
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    draw(&mut buf, chart)?;

    let img = image::RgbImage::from_raw(WIDTH, HEIGHT, buf).ok_or(ChartError::Buffer)?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}

/// Render to base64-encoded PNG.
pub fn render_base64(chart: &Chart) -> Result<String, ChartError> {
    let png = render_png(chart)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}
