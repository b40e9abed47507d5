//! Plotters-powered forecast chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! Predicted series are drawn as lines; actual series as dotted pixel runs,
//! since the backend has no dashed stroke.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartSeries, ChartSeriesSet, SeriesColor};

/// Sub-steps per month segment when dotting an actual series.
const DOT_STEPS: usize = 8;

/// One prepared series: points in chart coordinates plus styling.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub points: Vec<(f64, f64)>,
    pub color: SeriesColor,
    pub dotted: bool,
}

impl PlotLine {
    pub fn from_series(series: &ChartSeries) -> Self {
        let vertices: Vec<(f64, f64)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
        let points = if series.dashed {
            dotted_points(&vertices)
        } else {
            vertices
        };
        Self {
            points,
            color: series.color,
            dotted: series.dashed,
        }
    }
}

/// Every other interpolated point along the polyline, endpoints included.
pub fn dotted_points(vertices: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    for pair in vertices.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        for k in (0..DOT_STEPS).step_by(2) {
            let u = k as f64 / DOT_STEPS as f64;
            out.push((x0 + u * (x1 - x0), y0 + u * (y1 - y0)));
        }
    }
    if let Some(&last) = vertices.last() {
        out.push(last);
    }
    out
}

/// Padded y-bounds for a series set, `[0, 1]` when empty or flat at zero.
pub fn y_bounds(set: &ChartSeriesSet) -> [f64; 2] {
    let (lo, hi) = match set.value_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((v, _)) if v != 0.0 => (v - v.abs() * 0.5, v + v.abs() * 0.5),
        _ => (0.0, 1.0),
    };
    let pad = ((hi - lo).abs() * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct ForecastChart<'a> {
    pub lines: &'a [PlotLine],
    /// X bounds in month-slot units (`0.0` = Month 1).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for ForecastChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 0)
                .set_label_area_size(LabelAreaPosition::Bottom, 0)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Tick labels are drawn by the caller as Ratatui text.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .axis_style(&WHITE)
                .draw()?;

            for line in self.lines {
                let color = RGBColor(line.color.r, line.color.g, line.color.b);
                if line.dotted {
                    chart.draw_series(line.points.iter().map(|&p| Pixel::new(p, color)))?;
                } else {
                    chart.draw_series(LineSeries::new(line.points.iter().copied(), &color))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
