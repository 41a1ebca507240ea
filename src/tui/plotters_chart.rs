//! Plotters-powered price chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Color wheel shared by the chart lines and the legend panel.
///
/// High-contrast colors that stay readable on dark terminal backgrounds.
pub const SERIES_COLORS: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 215, 0),
    (0, 255, 0),
    (255, 105, 180),
    (135, 206, 250),
    (255, 165, 0),
    (186, 85, 211),
    (240, 240, 240),
];

pub fn series_color(idx: usize) -> (u8, u8, u8) {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are
/// computed outside the render call. This keeps `render()` focused on
/// drawing and makes it easy to test the data prep separately.
pub struct PriceSeriesChart<'a> {
    /// One line per category: (label, points as (day offset, value)).
    pub series: &'a [(String, Vec<(f64, f64)>)],
    /// X bounds (days since `x_base`).
    pub x_bounds: [f64; 2],
    /// Y bounds (avg price or baseline index, depending on the value mode).
    pub y_bounds: [f64; 2],
    /// The date at x = 0; tick labels are rendered as dates relative to it.
    pub x_base: NaiveDate,
    pub y_label: String,
}

impl Widget for PriceSeriesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a
        // chart. In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let x_base = self.x_base;

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in
            // low-resolution terminal rendering; axes + labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("day")
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_day(x_base, *v))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // One line per category, colors from the shared wheel so the
            // legend panel can match them.
            for (idx, (_, points)) in self.series.iter().enumerate() {
                let (r, g, b) = series_color(idx);
                chart.draw_series(LineSeries::new(
                    points.iter().copied(),
                    &RGBColor(r, g, b),
                ))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn fmt_day(base: NaiveDate, offset: f64) -> String {
    let day = base
        .checked_add_signed(Duration::days(offset.round() as i64))
        .unwrap_or(base);
    day.format("%m-%d").to_string()
}
