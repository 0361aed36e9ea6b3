use std::sync::OnceLock;

use base64::Engine;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};

use crate::data::datetime::TICK_FORMAT;
use crate::data::table::LogTable;

pub const WIDTH: u32 = 1600;
pub const HEIGHT: u32 = 400;
pub const TITLE: &str = "Line Graph";
pub const TICK_COUNT: usize = 10;

/// Line colour by request position: first red, second blue, third green.
pub const SERIES_COLORS: [RGBColor; 3] = [RED, BLUE, GREEN];

const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
static FONT: OnceLock<Result<(), String>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to plot: the table has no rows")]
    NoRows,
    #[error("font setup failed: {0}")]
    Font(String),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("bitmap buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// A rendered chart, PNG encoded, plus what ended up on it.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub png: Vec<u8>,
    /// Legend entries in drawing order.
    pub legend: Vec<String>,
    /// Requested names that are not columns of the table.
    pub skipped: Vec<String>,
}

impl RenderedChart {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

/// `count` evenly spaced instants from `min` to `max`, both ends included.
pub fn tick_positions(min: NaiveDateTime, max: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    match count {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let span = (max - min).num_milliseconds();
            let steps = (count - 1) as i64;
            let mut ticks: Vec<NaiveDateTime> = (0..steps)
                .map(|i| min + Duration::milliseconds(span * i / steps))
                .collect();
            ticks.push(max);
            ticks
        }
    }
}

fn ensure_font() -> Result<(), RenderError> {
    FONT.get_or_init(|| {
        register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
            .map_err(|_| "embedded font is not valid TrueType data".to_string())
    })
    .clone()
    .map_err(RenderError::Font)
}

/// Draw up to three `columns` of `table` against time as one overlay line chart.
///
/// Names missing from the table are skipped and listed in `skipped`. The x axis
/// spans the table's own earliest and latest timestamps.
pub fn render(table: &LogTable, columns: &[&str]) -> Result<RenderedChart, RenderError> {
    let (min, max) = table.time_bounds().ok_or(RenderError::NoRows)?;
    ensure_font()?;

    let mut series: Vec<(String, Vec<f64>)> = Vec::new();
    let mut skipped = Vec::new();
    for name in columns.iter().take(SERIES_COLORS.len()) {
        match table.series(name) {
            Some(values) => series.push((name.to_string(), values)),
            None => {
                tracing::warn!("column {name:?} not in table, not plotted");
                skipped.push(name.to_string());
            }
        }
    }

    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    let times = table.times();
    draw(&mut buf, &times, &series, min, max).map_err(|e| RenderError::Draw(e.to_string()))?;

    let img = image::RgbImage::from_raw(WIDTH, HEIGHT, buf).ok_or(RenderError::Buffer(WIDTH, HEIGHT))?;
    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
    tracing::debug!("rendered {} series into {} png bytes", series.len(), png.len());

    Ok(RenderedChart {
        png,
        legend: series.into_iter().map(|(name, _)| name).collect(),
        skipped,
    })
}

fn draw(
    buf: &mut [u8],
    times: &[NaiveDateTime],
    series: &[(String, Vec<f64>)],
    min: NaiveDateTime,
    max: NaiveDateTime,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ymin, ymax) = y_bounds(series);
    let (xmin, xmax) = if min == max {
        (min - Duration::minutes(1), max + Duration::minutes(1))
    } else {
        (min, max)
    };

    let root = BitMapBackend::with_buffer(buf, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, (FONT_FAMILY, 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(xmin.and_utc()..xmax.and_utc(), ymin..ymax)?;

    // x labels and vertical grid come from our own fixed ticks below
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|_: &DateTime<Utc>| String::new())
        .set_tick_mark_size(LabelAreaPosition::Bottom, 0)
        .light_line_style(TRANSPARENT)
        .bold_line_style(RGBColor(200, 200, 200))
        .label_style((FONT_FAMILY, 14))
        .draw()?;

    let ticks = tick_positions(min, max, TICK_COUNT);
    let grid = RGBColor(200, 200, 200);
    chart.draw_series(ticks.iter().map(|t| {
        PathElement::new(vec![(t.and_utc(), ymin), (t.and_utc(), ymax)], grid)
    }))?;

    let label_style = TextStyle::from((FONT_FAMILY, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for t in &ticks {
        let (x, y) = chart.backend_coord(&(t.and_utc(), ymin));
        root.draw(&PathElement::new(vec![(x, y), (x, y + 5)], BLACK))?;
        root.draw(&Text::new(t.format(TICK_FORMAT).to_string(), (x, y + 8), label_style.clone()))?;
    }

    for ((name, values), color) in series.iter().zip(SERIES_COLORS) {
        let style = color.stroke_width(2);
        let runs = numeric_runs(times, values);

        // first draw carries the legend entry, even when the column has no numbers
        let first = runs.first().cloned().unwrap_or_default();
        chart
            .draw_series(LineSeries::new(first, style))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

        for run in runs.iter().skip(1) {
            chart.draw_series(LineSeries::new(run.iter().copied(), style))?;
        }
        chart.draw_series(
            runs.iter()
                .filter(|run| run.len() == 1)
                .map(|run| Circle::new(run[0], 2, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Split a series at non-finite values so gaps are not bridged by a line.
fn numeric_runs(times: &[NaiveDateTime], values: &[f64]) -> Vec<Vec<(DateTime<Utc>, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (t, v) in times.iter().zip(values) {
        if v.is_finite() {
            current.push((t.and_utc(), *v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn y_bounds(series: &[(String, Vec<f64>)]) -> (f64, f64) {
    let finite = series.iter().flat_map(|(_, v)| v.iter().copied()).filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.1 };
    (lo - pad, hi + pad)
}
