//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - predicted series: one glyph each, in series order (`*`, `+`, `x`, ...)
//! - actual series: `.`

use crate::chart::{ChartSeriesSet, SeriesKind};

const PREDICTED_GLYPHS: [char; 8] = ['*', '+', 'x', 'o', '#', '@', '%', '='];
const ACTUAL_GLYPH: char = '.';

/// Glyph for each series in `set`, in series order.
pub fn series_glyphs(set: &ChartSeriesSet) -> Vec<char> {
    let mut predicted = 0;
    set.series
        .iter()
        .map(|s| match s.kind {
            SeriesKind::Actual => ACTUAL_GLYPH,
            SeriesKind::Predicted => {
                let g = PREDICTED_GLYPHS[predicted % PREDICTED_GLYPHS.len()];
                predicted += 1;
                g
            }
        })
        .collect()
}

/// Render every series in `set` on one grid, followed by a legend.
pub fn render_series_plot(set: &ChartSeriesSet, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let last_x = (set.labels.len().max(2) - 1) as f64;

    let (y_min, y_max) = match set.value_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let glyphs = series_glyphs(set);

    for (series, &glyph) in set.series.iter().zip(glyphs.iter()) {
        let points: Vec<(usize, usize)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (map_x(i as f64, 0.0, last_x, width), map_y(v, y_min, y_max, height)))
            .collect();
        for pair in points.windows(2) {
            draw_line(&mut grid, pair[0], pair[1], glyph);
        }
        // Vertices win over line segments drawn earlier.
        for &(x, y) in &points {
            grid[y][x] = glyph;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | months=[1, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        set.title,
        set.labels.len()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (series, glyph) in set.series.iter().zip(glyphs) {
        out.push_str(&format!("{glyph} {}\n", series.label));
    }

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = if y.is_finite() {
        ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartSeries, color_for_index};

    fn series(label: &str, kind: SeriesKind, values: [f64; 6]) -> ChartSeries {
        ChartSeries {
            label: label.to_string(),
            product: label.to_string(),
            kind,
            color: color_for_index(0),
            dashed: kind == SeriesKind::Actual,
            values,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let mut set = ChartSeriesSet::empty();
        set.series
            .push(series("Widget A", SeriesKind::Predicted, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]));

        let txt = render_series_plot(&set, 11, 6);
        let expected = concat!(
            "Plot: Sales Forecast | months=[1, 6] | y=[-0.25, 5.25]\n",
            "         **\n",
            "       **  \n",
            "     **    \n",
            "   **      \n",
            " **        \n",
            "*          \n",
            "* Widget A\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn actual_series_use_dots_and_predicted_glyphs_advance() {
        let mut set = ChartSeriesSet::empty();
        set.series.push(series("A", SeriesKind::Predicted, [1.0; 6]));
        set.series.push(series("A (actual)", SeriesKind::Actual, [0.0; 6]));
        set.series.push(series("B", SeriesKind::Predicted, [2.0; 6]));

        assert_eq!(series_glyphs(&set), vec!['*', '.', '+']);
        let txt = render_series_plot(&set, 20, 8);
        assert!(txt.ends_with("* A\n. A (actual)\n+ B\n"));
    }

    #[test]
    fn empty_set_renders_blank_grid() {
        let txt = render_series_plot(&ChartSeriesSet::empty(), 10, 5);
        assert_eq!(txt.lines().count(), 6);
        assert!(txt.lines().skip(1).all(|l| l.trim().is_empty()));
    }
}
