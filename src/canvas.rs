use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::element::Pie;
use plotters::prelude::*;

/// Fixed color cycle for multi-segment charts.
pub const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

pub fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// A filled polygon in unit coordinates (0..1 on both axes), used by the
/// sunburst and sankey renderers.
#[derive(Debug, Clone)]
pub struct PolygonShape {
    pub points: Vec<(f64, f64)>,
    pub color_index: usize,
    pub alpha: f64,
    pub label: Option<(String, (f64, f64))>,
}

/// Fixed-size RGB canvas that renders one chart and encodes it as PNG.
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    title: String,
}

impl Canvas {
    pub fn new(width: u32, height: u32, title: &str) -> Self {
        Canvas {
            buffer: vec![0u8; (width * height * 3) as usize],
            width,
            height,
            title: title.to_string(),
        }
    }

    /// Line chart over numeric x/y pairs, drawn in x order.
    pub fn draw_line_chart(
        &mut self,
        x_label: &str,
        y_label: &str,
        points: Vec<(f64, f64)>,
    ) -> Result<()> {
        let (x_range, y_range) = numeric_ranges(&points)?;
        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)
            .context("Failed to build chart")?;
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .context("Failed to draw mesh")?;

        // Points connect in row order, matching the source data.
        chart
            .draw_series(LineSeries::new(points, palette_color(0).stroke_width(2)))
            .context("Failed to draw line series")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Scatter-family chart; `radii` carries one pixel radius per point so
    /// the same routine serves scatter, dot, and bubble charts.
    pub fn draw_scatter(
        &mut self,
        x_label: &str,
        y_label: &str,
        points: Vec<(f64, f64)>,
        radii: Vec<i32>,
    ) -> Result<()> {
        anyhow::ensure!(
            points.len() == radii.len(),
            "Points and radii must have the same length (points: {}, radii: {})",
            points.len(),
            radii.len()
        );
        let (x_range, y_range) = numeric_ranges(&points)?;
        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)
            .context("Failed to build chart")?;
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .context("Failed to draw mesh")?;

        let color = palette_color(0);
        chart
            .draw_series(
                points
                    .iter()
                    .zip(radii.iter())
                    .map(|(&(x, y), &r)| Circle::new((x, y), r, color.mix(0.7).filled())),
            )
            .context("Failed to draw point series")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Vertical bar chart with a categorical x-axis.
    pub fn draw_bar_chart(
        &mut self,
        x_label: &str,
        y_label: &str,
        categories: Vec<String>,
        values: Vec<f64>,
    ) -> Result<()> {
        anyhow::ensure!(
            categories.len() == values.len(),
            "Categories and values must have the same length"
        );
        anyhow::ensure!(!categories.is_empty(), "Cannot draw a bar chart with no data");

        let y_range = value_range(&values);
        let num_categories = categories.len();
        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..num_categories as f64, y_range)
            .context("Failed to build chart")?;

        let labels = categories.clone();
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .x_labels(num_categories)
            .x_label_formatter(&|x| {
                let idx = *x as usize;
                if idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .draw()
            .context("Failed to draw mesh")?;

        let color = palette_color(0);
        for (idx, &value) in values.iter().enumerate() {
            let x_center = idx as f64 + 0.5;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x_center - 0.4, 0.0), (x_center + 0.4, value)],
                    color.filled(),
                )))
                .context("Failed to draw bar")?;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Horizontal bar chart: categories on the y-axis, values along x.
    pub fn draw_horizontal_bar_chart(
        &mut self,
        x_label: &str,
        y_label: &str,
        categories: Vec<String>,
        values: Vec<f64>,
    ) -> Result<()> {
        anyhow::ensure!(
            categories.len() == values.len(),
            "Categories and values must have the same length"
        );
        anyhow::ensure!(!categories.is_empty(), "Cannot draw a bar chart with no data");

        let x_range = value_range(&values);
        let num_categories = categories.len();
        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_range, 0.0..num_categories as f64)
            .context("Failed to build chart")?;

        let labels = categories.clone();
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .y_labels(num_categories)
            .y_label_formatter(&|y| {
                let idx = *y as usize;
                if idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .draw()
            .context("Failed to draw mesh")?;

        let color = palette_color(0);
        for (idx, &value) in values.iter().enumerate() {
            let y_center = idx as f64 + 0.5;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(0.0, y_center - 0.4), (value, y_center + 0.4)],
                    color.filled(),
                )))
                .context("Failed to draw bar")?;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Pie chart over pre-aggregated slice values.
    pub fn draw_pie(&mut self, labels: Vec<String>, values: Vec<f64>) -> Result<()> {
        anyhow::ensure!(
            labels.len() == values.len(),
            "Labels and values must have the same length"
        );
        anyhow::ensure!(!values.is_empty(), "Cannot draw a pie chart with no data");

        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;
        let root = root
            .titled(&title, ("sans-serif", 20))
            .context("Failed to draw title")?;

        let (area_w, area_h) = root.dim_in_pixel();
        let center = (area_w as i32 / 2, area_h as i32 / 2);
        let radius = (area_w.min(area_h) as f64) * 0.35;
        let colors: Vec<RGBColor> = (0..values.len()).map(palette_color).collect();

        let mut pie = Pie::new(&center, &radius, &values, &colors, &labels);
        pie.label_style(("sans-serif", 14).into_font());
        root.draw(&pie).context("Failed to draw pie")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Filled polygons in unit coordinates, for custom geometry (sunburst
    /// rings, sankey nodes and flow bands).
    pub fn draw_polygons(&mut self, shapes: Vec<PolygonShape>) -> Result<()> {
        let (width, height, title) = (self.width, self.height, self.title.clone());
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&title, ("sans-serif", 20))
            .build_cartesian_2d(0.0..1.0, 0.0..1.0)
            .context("Failed to build chart")?;

        for shape in &shapes {
            let color = palette_color(shape.color_index).mix(shape.alpha);
            chart
                .draw_series(std::iter::once(Polygon::new(
                    shape.points.clone(),
                    color.filled(),
                )))
                .context("Failed to draw polygon")?;
        }
        // Labels go last so bands cannot paint over them.
        for shape in &shapes {
            if let Some((text, pos)) = &shape.label {
                chart
                    .draw_series(std::iter::once(Text::new(
                        text.clone(),
                        *pos,
                        ("sans-serif", 13).into_font().color(&BLACK),
                    )))
                    .context("Failed to draw label")?;
            }
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG.
    pub fn into_png(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&self.buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }
        Ok(png_bytes)
    }
}

fn numeric_ranges(points: &[(f64, f64)]) -> Result<(std::ops::Range<f64>, std::ops::Range<f64>)> {
    anyhow::ensure!(!points.is_empty(), "Cannot draw a chart with no data points");
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    Ok((padded_range(&xs), padded_range(&ys)))
}

fn padded_range(data: &[f64]) -> std::ops::Range<f64> {
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Range for bar values: always includes the zero baseline.
fn value_range(values: &[f64]) -> std::ops::Range<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min).min(0.0);
    let max = values
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .max(0.0);
    if min == max {
        -1.0..1.0
    } else {
        let padding = (max - min) * 0.05;
        (if min < 0.0 { min - padding } else { 0.0 })..(max + padding)
    }
}
