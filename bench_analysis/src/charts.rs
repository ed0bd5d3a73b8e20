/*****************
 * Chart drawing *
 *****************/

/**
Comparison charts drawn with plotters into PNG files.

A chart is made of one or more panels side by side, each panel being a set of
categories on the x axis and named series of optional values. Colors are
taken from fixed palettes by series index, so that the same data always gives
the same picture. Panels without any finite value are degenerate: a chart
whose panels are all degenerate is skipped and no file is written.
*/
use bench_results::config::ChartsConfig;
use bench_results::{AggregateSummary, PivotTable};
use itertools::Itertools;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("drawing failed: {0}")]
    Backend(String),
}

fn backend_error(e: impl std::fmt::Display) -> ChartError {
    ChartError::Backend(e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Written(PathBuf),
    Skipped(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Magma,
    Deep,
    Blues,
}

const VIRIDIS: [(u8, u8, u8); 6] = [
    (0x44, 0x01, 0x54),
    (0x41, 0x44, 0x87),
    (0x2a, 0x78, 0x8e),
    (0x22, 0xa8, 0x84),
    (0x7a, 0xd1, 0x51),
    (0xfd, 0xe7, 0x25),
];

const MAGMA: [(u8, u8, u8); 6] = [
    (0x1c, 0x10, 0x44),
    (0x4f, 0x12, 0x7b),
    (0x81, 0x25, 0x81),
    (0xb5, 0x36, 0x7a),
    (0xe5, 0x50, 0x64),
    (0xfb, 0x87, 0x61),
];

const DEEP: [(u8, u8, u8); 10] = [
    (0x4c, 0x72, 0xb0),
    (0xdd, 0x84, 0x52),
    (0x55, 0xa8, 0x68),
    (0xc4, 0x4e, 0x52),
    (0x81, 0x72, 0xb3),
    (0x93, 0x78, 0x60),
    (0xda, 0x8b, 0xc3),
    (0x8c, 0x8c, 0x8c),
    (0xcc, 0xb9, 0x74),
    (0x64, 0xb5, 0xcd),
];

const BLUES: [(u8, u8, u8); 6] = [
    (0x08, 0x30, 0x6b),
    (0x08, 0x51, 0x9c),
    (0x21, 0x71, 0xb5),
    (0x42, 0x92, 0xc6),
    (0x6b, 0xae, 0xd6),
    (0x9e, 0xca, 0xe1),
];

impl Palette {
    /// Color of item `index` out of `count`. Sequential palettes are sampled
    /// evenly over their range, the qualitative one cycles.
    pub fn color(self, index: usize, count: usize) -> RGBColor {
        let (r, g, b) = match self {
            Palette::Deep => DEEP[index % DEEP.len()],
            Palette::Viridis | Palette::Magma | Palette::Blues => {
                let colors: &[(u8, u8, u8)] = match self {
                    Palette::Viridis => &VIRIDIS,
                    Palette::Magma => &MAGMA,
                    _ => &BLUES,
                };
                let last = colors.len() - 1;
                let i = if count <= 1 {
                    0
                } else if count > colors.len() {
                    index % colors.len()
                } else {
                    index.min(count - 1) * last / (count - 1)
                };
                colors[i]
            }
        };
        RGBColor(r, g, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One bar per category, colored by category. Only the first series is drawn.
    Bar,
    /// One bar per series within each category.
    GroupedBar,
    LineWithMarkers,
    /// Means as markers, joined by thin lines.
    Points,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Prefix of the series names in the legend.
    pub legend_title: Option<String>,
    pub palette: Palette,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, palette: Palette) -> Self {
        ChartSpec {
            kind,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            legend_title: None,
            palette,
        }
    }

    pub fn labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn legend(mut self, title: impl Into<String>) -> Self {
        self.legend_title = Some(title.into());
        self
    }

    fn series_label(&self, name: &str) -> String {
        match &self.legend_title {
            Some(t) => format!("{}: {}", t, name),
            None => name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// One value per category, `None` where there is no data.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Pivot rows become categories and pivot columns become series.
    pub fn from_pivot(pivot: &PivotTable) -> Self {
        ChartData {
            categories: pivot.rows.iter().map(ToString::to_string).collect(),
            series: pivot
                .columns
                .iter()
                .enumerate()
                .map(|(c, key)| Series {
                    name: key.to_string(),
                    values: pivot.cells.iter().map(|row| row[c]).collect(),
                })
                .collect(),
        }
    }

    /// Groups become categories of a single series of means.
    pub fn from_summary(summary: &AggregateSummary) -> Self {
        let (categories, values) = summary
            .iter()
            .map(|(key, stats)| (key.iter().join(" / "), Some(stats.mean)))
            .unzip();
        ChartData {
            categories,
            series: vec![Series {
                name: summary.target().to_owned(),
                values,
            }],
        }
    }

    fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series
            .iter()
            .flat_map(|s| s.values.iter())
            .filter_map(|v| v.filter(|v| v.is_finite()))
    }

    pub fn is_degenerate(&self) -> bool {
        self.categories.is_empty() || self.finite_values().next().is_none()
    }

    /// Value range of the y axis: always includes 0, with headroom on top.
    fn y_range(&self) -> (f64, f64) {
        let (min, max) = self
            .finite_values()
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let max = if max <= 0.0 { 1.0 } else { max * 1.15 };
        let min = if min < 0.0 { min * 1.15 } else { 0.0 };
        (min, max)
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Category `i` is centered on `x = i`. Ticks between centers get no label.
fn category_label(categories: &[String], x: f64) -> String {
    let center = x.round();
    if (x - center).abs() > 1e-6 || center < 0.0 {
        return String::new();
    }
    categories.get(center as usize).cloned().unwrap_or_default()
}

fn draw_panel(area: &Area<'_>, spec: &ChartSpec, data: &ChartData) -> Result<(), ChartError> {
    if data.is_degenerate() {
        area.draw(&Text::new(
            format!("{}: no data", spec.title),
            (20, 20),
            ("sans-serif", 18).into_font(),
        ))
        .map_err(backend_error)?;
        return Ok(());
    }

    let n = data.categories.len();
    let (y_min, y_max) = data.y_range();
    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..n as f64 - 0.5, y_min..y_max)
        .map_err(backend_error)?;

    let categories = &data.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(n)
        .x_label_formatter(&|x| category_label(categories, *x))
        .draw()
        .map_err(backend_error)?;

    let k = data.series.len();
    match spec.kind {
        ChartKind::Bar => {
            if let Some(series) = data.series.first() {
                chart
                    .draw_series(series.values.iter().enumerate().filter_map(|(i, v)| {
                        let v = v.filter(|v| v.is_finite())?;
                        let color = spec.palette.color(i, n);
                        Some(Rectangle::new(
                            [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, v)],
                            color.filled(),
                        ))
                    }))
                    .map_err(backend_error)?;
            }
            return Ok(());
        }
        ChartKind::GroupedBar => {
            let width = 0.8 / k as f64;
            for (s, series) in data.series.iter().enumerate() {
                let color = spec.palette.color(s, k);
                chart
                    .draw_series(series.values.iter().enumerate().filter_map(|(i, v)| {
                        let v = v.filter(|v| v.is_finite())?;
                        let x0 = i as f64 - 0.4 + s as f64 * width;
                        Some(Rectangle::new([(x0, 0.0), (x0 + width, v)], color.filled()))
                    }))
                    .map_err(backend_error)?
                    .label(spec.series_label(&series.name))
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }
        }
        ChartKind::LineWithMarkers | ChartKind::Points => {
            for (s, series) in data.series.iter().enumerate() {
                let color = spec.palette.color(s, k);
                let points: Vec<(f64, f64)> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| {
                        v.filter(|v| v.is_finite()).map(|v| (i as f64, v))
                    })
                    .collect();
                let stroke = if spec.kind == ChartKind::Points { 1 } else { 2 };
                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(stroke)))
                    .map_err(backend_error)?
                    .label(spec.series_label(&series.name))
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2))
                    });
                // Marker shape varies by series.
                match (spec.kind, s % 3) {
                    (ChartKind::Points, _) | (_, 0) => chart
                        .draw_series(points.iter().map(|p| Circle::new(*p, 5, color.filled())))
                        .map_err(backend_error)?,
                    (_, 1) => chart
                        .draw_series(
                            points
                                .iter()
                                .map(|p| TriangleMarker::new(*p, 6, color.filled())),
                        )
                        .map_err(backend_error)?,
                    _ => chart
                        .draw_series(points.iter().map(|p| Cross::new(*p, 5, color.stroke_width(2))))
                        .map_err(backend_error)?,
                };
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(backend_error)?;
    Ok(())
}

/// Writes charts into one output directory.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(output_dir: impl AsRef<Path>, config: &ChartsConfig) -> Self {
        ChartRenderer {
            output_dir: output_dir.as_ref().to_path_buf(),
            width: config.width,
            height: config.height,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render(
        &self,
        file_name: &str,
        spec: &ChartSpec,
        data: &ChartData,
    ) -> Result<RenderOutcome, ChartError> {
        self.render_panels(file_name, None, &[(spec, data)])
    }

    /// Draws the panels side by side, under an optional common title.
    pub fn render_panels(
        &self,
        file_name: &str,
        title: Option<&str>,
        panels: &[(&ChartSpec, &ChartData)],
    ) -> Result<RenderOutcome, ChartError> {
        if panels.iter().all(|(_, data)| data.is_degenerate()) {
            return Ok(RenderOutcome::Skipped(format!("no data to plot in {}", file_name)));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ChartError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name);
        let panel_width = if panels.len() == 1 {
            self.width
        } else {
            self.height
        };
        let size = (panel_width * panels.len() as u32, self.height);
        {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;
            let body = match title {
                Some(t) => root
                    .titled(t, ("sans-serif", 26).into_font())
                    .map_err(backend_error)?,
                None => root.clone(),
            };
            let areas = body.split_evenly((1, panels.len()));
            for (area, (spec, data)) in areas.iter().zip(panels) {
                draw_panel(area, spec, data)?;
            }
            root.present().map_err(backend_error)?;
        }
        Ok(RenderOutcome::Written(path))
    }
}
