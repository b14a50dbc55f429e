use super::{min_and_max, Error, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::Path;
use svg2pdf::usvg;

/// Extension of the charts written when no output path is given.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Resolution used to turn points (font size, line width) into pixels.
pub const DPI: f64 = 300.0;

/// Figure size in inches, width and height.
pub const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);

/// Categorical colors for the per-node series, cycled when there are more nodes.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub fn series_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

pub fn canvas_size() -> (u32, u32) {
    (
        (FIGURE_INCHES.0 * DPI).round() as u32,
        (FIGURE_INCHES.1 * DPI).round() as u32,
    )
}

/// Font size and line width, both in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub font_size: f64,
    pub linewidth: f64,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            font_size: 10.0,
            linewidth: 1.5,
        }
    }
}

impl Style {
    pub fn font_px(&self) -> f64 {
        self.font_size * DPI / 72.0
    }

    /// never thinner than one pixel
    pub fn stroke_px(&self) -> u32 {
        (self.linewidth * DPI / 72.0).round().max(1.0) as u32
    }

    fn font(&self) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.font_px(), FontStyle::Normal)
    }
}

/// The file formats the drawing backends can write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    Pdf,
    Svg,
    Bitmap,
}

impl ImageFormat {
    /// Picks the format from the extension of the output path.
    pub fn from_path(fout: &Path) -> Result<ImageFormat> {
        let ext = fout
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Ok(ImageFormat::Pdf),
            Some("svg") => Ok(ImageFormat::Svg),
            Some("png") | Some("bmp") | Some("jpg") | Some("jpeg") | Some("gif") | Some("tif")
            | Some("tiff") => Ok(ImageFormat::Bitmap),
            _ => Err(Error::UnsupportedFormat(fout.to_path_buf())),
        }
    }
}

/// Scale of the y axis. Log panels are drawn on a linear axis holding log10(y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YScale {
    Linear,
    Log,
}

impl YScale {
    /// Position of `y` on the axis, None when it cannot be shown.
    pub fn project(self, y: f64) -> Option<f64> {
        match self {
            YScale::Linear if y.is_finite() => Some(y),
            YScale::Log if y.is_finite() && y > 0.0 => Some(y.log10()),
            _ => None,
        }
    }

    pub fn unproject(self, v: f64) -> f64 {
        match self {
            YScale::Linear => v,
            YScale::Log => 10f64.powf(v),
        }
    }

    pub fn format_tick(self, v: f64) -> String {
        format_number(self.unproject(v))
    }
}

/// Compact tick label: integers without decimals, large and tiny values in
/// scientific notation.
pub fn format_number(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && (a >= 1e5 || a < 1e-3) {
        format!("{:.1e}", v)
    } else if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').to_string()
    }
}

/// Turns two columns into the points of a line:
/// drops the rows with a NAN on either side, averages the y values
/// of repeated x values and sorts by x.
pub fn line_points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    let mut rows: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
    let mut i = 0;
    while i < rows.len() {
        let x = rows[i].0;
        let mut j = i;
        let mut sum = 0.;
        while j < rows.len() && rows[j].0 == x {
            sum += rows[j].1;
            j += 1;
        }
        points.push((x, sum / (j - i) as f64));
        i = j;
    }
    points
}

/// Range with `frac` of the span added on both sides;
/// a single value gets a unit-wide range around it.
pub fn padded_range(min: f64, max: f64, frac: f64) -> Range<f64> {
    let span = max - min;
    if span <= 0.0 {
        return (min - 0.5)..(max + 0.5);
    }
    (min - span * frac)..(max + span * frac)
}

/// One line of a panel.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: Option<String>,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// One chart: a set of lines sharing the same axes.
#[derive(Debug, Clone)]
pub struct Panel {
    pub y_desc: String,
    /// None hides the x axis
    pub x_desc: Option<String>,
    pub scale: YScale,
    /// keep zero as the lower bound of a linear y axis
    pub y_from_zero: bool,
    pub legend_title: Option<String>,
    pub series: Vec<Series>,
}

impl Panel {
    fn projected(&self) -> Vec<Vec<(f64, f64)>> {
        self.series
            .iter()
            .map(|s| {
                s.points
                    .iter()
                    .filter_map(|&(x, y)| self.scale.project(y).map(|py| (x, py)))
                    .collect()
            })
            .collect()
    }

    /// Axis ranges, in axis coordinates, covering every shown point.
    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let projected = self.projected();
        let xs: Vec<f64> = projected.iter().flatten().map(|p| p.0).collect();
        let ys: Vec<f64> = projected.iter().flatten().map(|p| p.1).collect();
        let x_range = match min_and_max(&xs[..]) {
            Some((min, max)) if min < max => min..max,
            Some((min, max)) => padded_range(min, max, 0.0),
            None => 0.0..1.0,
        };
        let y_range = match (min_and_max(&ys[..]), self.scale) {
            (Some((min, max)), YScale::Linear) if self.y_from_zero => {
                let top = padded_range(min.min(0.0), max, 0.05).end;
                0.0..if top > 0.0 { top } else { 1.0 }
            }
            (Some((min, max)), _) => padded_range(min, max, 0.05),
            (None, _) => 0.0..1.0,
        };
        (x_range, y_range)
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        style: &Style,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let (x_range, y_range) = self.ranges();
        let font_px = style.font_px();
        let label_area = (font_px * 4.0).round() as u32;

        let mut builder = ChartBuilder::on(area);
        builder
            .margin((font_px / 2.0).round() as u32)
            .y_label_area_size(label_area);
        if self.x_desc.is_some() {
            builder.x_label_area_size((font_px * 3.0).round() as u32);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_error)?;

        let scale = self.scale;
        let y_fmt = move |v: &f64| scale.format_tick(*v);
        let x_fmt = |v: &f64| format_number(*v);
        {
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(&TRANSPARENT)
                .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
                .set_all_tick_mark_size(2)
                .label_style(style.font())
                .axis_desc_style(style.font())
                .y_desc(self.y_desc.as_str())
                .y_label_formatter(&y_fmt)
                .x_label_formatter(&x_fmt);
            match &self.x_desc {
                Some(desc) => {
                    mesh.x_desc(desc.as_str());
                }
                None => {
                    mesh.disable_x_axis();
                }
            }
            mesh.draw().map_err(render_error)?;
        }

        let labelled = self.series.iter().any(|s| s.label.is_some());
        if let (Some(title), true) = (&self.legend_title, labelled) {
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
                .map_err(render_error)?
                .label(title.as_str())
                .legend(|(x, y)| EmptyElement::at((x, y)));
        }

        let stroke = style.stroke_px();
        for (series, points) in self.series.iter().zip(self.projected()) {
            let color = series.color;
            let anno = chart
                .draw_series(LineSeries::new(points, color.stroke_width(stroke)))
                .map_err(render_error)?;
            if let Some(label) = &series.label {
                anno.label(label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke))
                });
            }
        }

        if labelled {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK.mix(0.3))
                .label_font(style.font())
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(render_error)?;
        }
        Ok(())
    }
}

/// A complete picture, drawn onto whatever backend the output format needs.
pub trait Figure {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static;
}

/// Panels stacked vertically, all with the same style.
#[derive(Debug, Clone)]
pub struct PanelStack {
    pub panels: Vec<Panel>,
    pub style: Style,
}

impl Figure for PanelStack {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        if self.panels.is_empty() {
            return Ok(());
        }
        let areas = root.split_evenly((self.panels.len(), 1));
        for (panel, area) in self.panels.iter().zip(areas.iter()) {
            panel.draw(area, &self.style)?;
        }
        Ok(())
    }
}

/// Draws the figure and writes it to `fout`, in the format of its extension.
pub fn save<F: Figure>(figure: &F, fout: &Path) -> Result<()> {
    let size = canvas_size();
    match ImageFormat::from_path(fout)? {
        ImageFormat::Pdf => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_on(figure, &root)?;
            }
            let pdf = svg_to_pdf(&svg)?;
            fs::write(fout, pdf).map_err(|source| Error::Io {
                path: fout.to_path_buf(),
                source,
            })
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(fout, size).into_drawing_area();
            draw_on(figure, &root)
        }
        ImageFormat::Bitmap => {
            let root = BitMapBackend::new(fout, size).into_drawing_area();
            draw_on(figure, &root)
        }
    }
}

fn draw_on<F: Figure, DB: DrawingBackend>(
    figure: &F,
    root: &DrawingArea<DB, Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_error)?;
    figure.draw(root)?;
    root.present().map_err(render_error)
}

/// Converts a rendered svg document into a single-page pdf.
/// System fonts are loaded so that the text of the chart is kept.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| Error::Render(format!("invalid svg: {}", e)))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| Error::Render(format!("pdf conversion failed: {:?}", e)))
}

pub(crate) fn render_error<E: std::error::Error + Send + Sync>(
    err: DrawingAreaErrorKind<E>,
) -> Error {
    Error::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn panel(scale: YScale, points: Vec<(f64, f64)>) -> Panel {
        Panel {
            y_desc: String::from("y"),
            x_desc: Some(String::from("x")),
            scale,
            y_from_zero: true,
            legend_title: None,
            series: vec![Series {
                label: None,
                color: series_color(0),
                points,
            }],
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("a/b.svg")).unwrap(),
            ImageFormat::Svg
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("b.PNG")).unwrap(),
            ImageFormat::Bitmap
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("run.pdf")).unwrap(),
            ImageFormat::Pdf
        );
        for p in &["b.txt", "b", "b.csv"] {
            match ImageFormat::from_path(Path::new(p)) {
                Err(Error::UnsupportedFormat(path)) => assert_eq!(path, PathBuf::from(p)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn line_points_average_sort_and_skip_nan() {
        let xs = [2.0, 0.0, 2.0, 1.0, f64::NAN];
        let ys = [4.0, 1.0, 6.0, f64::NAN, 3.0];
        assert_eq!(line_points(&xs, &ys), vec![(0.0, 1.0), (2.0, 5.0)]);
        assert!(line_points(&[], &[]).is_empty());
    }

    #[test]
    fn log_scale_drops_non_positive_values() {
        assert_eq!(YScale::Log.project(100.0), Some(2.0));
        assert_eq!(YScale::Log.project(0.0), None);
        assert_eq!(YScale::Log.project(-3.0), None);
        assert_eq!(YScale::Linear.project(-3.0), Some(-3.0));
        assert_eq!(YScale::Linear.project(f64::NAN), None);
        assert_eq!(YScale::Log.format_tick(3.0), "1000");
    }

    #[test]
    fn linear_range_starts_at_zero() {
        let (x, y) = panel(YScale::Linear, vec![(0.0, 10.0), (2.0, 20.0)]).ranges();
        assert_eq!(x, 0.0..2.0);
        assert_eq!(y.start, 0.0);
        assert!(y.end > 20.0);
    }

    #[test]
    fn log_range_covers_the_positive_values() {
        let (_, y) = panel(YScale::Log, vec![(0.0, 0.0), (1.0, 10.0), (2.0, 1000.0)]).ranges();
        assert!(y.start < 1.0 && y.start > 0.0);
        assert!(y.end > 3.0);
    }

    #[test]
    fn empty_panel_gets_a_unit_range() {
        let (x, y) = panel(YScale::Linear, vec![]).ranges();
        assert_eq!(x, 0.0..1.0);
        assert_eq!(y, 0.0..1.0);
    }

    #[test]
    fn numbers_for_ticks() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(250000.0), "2.5e5");
    }

    #[test]
    fn style_in_pixels() {
        let s = Style {
            font_size: 4.0,
            linewidth: 0.5,
        };
        assert_eq!(s.stroke_px(), 2);
        assert!((s.font_px() - 16.666).abs() < 0.01);
        let thin = Style {
            font_size: 4.0,
            linewidth: 0.0,
        };
        assert_eq!(thin.stroke_px(), 1);
        assert_eq!(canvas_size(), (1920, 1440));
    }

    #[test]
    fn svg_becomes_a_pdf_document() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="white"/><line x1="0" y1="0" x2="40" y2="20" stroke="black"/></svg>"#;
        let pdf = svg_to_pdf(svg).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(matches!(svg_to_pdf("not svg"), Err(Error::Render(_))));
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
    }
}
