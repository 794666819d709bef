//! Chart rendering: one dispatch over the chart type, positionally
//! consuming the resolved roles of a validated [`ChartRequest`].

use std::fmt;

use anyhow::{anyhow, Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use crate::canvas::Canvas;
use crate::data::Dataset;
use crate::resolver::{ChartRequest, RoleBinding};
use crate::schema::{ChartType, RoleName};
use crate::RenderOptions;
use crate::{sankey, sunburst};

/// What a single generated chart produces: PNG bytes for every chart type
/// except Table, which yields a column projection of the dataset.
#[derive(Debug, Clone)]
pub enum RenderedOutput {
    Figure(Vec<u8>),
    Table(TableView),
}

/// Tabular projection of the dataset, restricted to the requested columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(&self.headers);
        for row in &self.rows {
            table.add_row(row);
        }
        write!(f, "{}", table)
    }
}

/// Render one validated chart request against the dataset. Recomputed on
/// every generate pass; nothing is cached between runs.
pub fn render_chart(
    request: &ChartRequest,
    dataset: &Dataset,
    options: &RenderOptions,
) -> Result<RenderedOutput> {
    let title = request.chart_type().display_name();
    let mut canvas = Canvas::new(options.width, options.height, title);

    match request.chart_type() {
        ChartType::Bar => {
            let x = required_column(request, RoleName::X)?;
            let y = required_column(request, RoleName::Y)?;
            canvas.draw_bar_chart(x, y, text_column(dataset, x)?, numeric_column(dataset, y)?)?;
        }
        ChartType::HorizontalBar => {
            let x = required_column(request, RoleName::X)?;
            let y = required_column(request, RoleName::Y)?;
            canvas.draw_horizontal_bar_chart(
                y,
                x,
                text_column(dataset, x)?,
                numeric_column(dataset, y)?,
            )?;
        }
        ChartType::Line => {
            let x = required_column(request, RoleName::X)?;
            let y = required_column(request, RoleName::Y)?;
            let points = paired_points(dataset, x, y)?;
            canvas.draw_line_chart(x, y, points)?;
        }
        ChartType::Scatter | ChartType::Dot | ChartType::Bubble => {
            let x = required_column(request, RoleName::X)?;
            let y = required_column(request, RoleName::Y)?;
            let points = paired_points(dataset, x, y)?;
            let base_radius = match request.chart_type() {
                ChartType::Dot => 2,
                ChartType::Bubble => 6,
                _ => 3,
            };
            let radii = match request.binding(RoleName::Size) {
                Some(RoleBinding::Column(size_col)) => {
                    scaled_radii(&numeric_column(dataset, size_col)?)
                }
                _ => vec![base_radius; points.len()],
            };
            canvas.draw_scatter(x, y, points, radii)?;
        }
        ChartType::Pie => {
            let category = required_column(request, RoleName::Category)?;
            let (labels, counts) = category_counts(dataset, category)?;
            canvas.draw_pie(labels, counts)?;
        }
        ChartType::Sunburst => {
            let path = request.columns(RoleName::HierarchyPath);
            let values = required_column(request, RoleName::Values)?;
            sunburst::render(dataset, &path, values, &mut canvas)?;
        }
        ChartType::Sankey => {
            let source = required_column(request, RoleName::Source)?;
            let target = required_column(request, RoleName::Target)?;
            let value = required_column(request, RoleName::Value)?;
            sankey::render(dataset, source, target, value, &mut canvas)?;
        }
        ChartType::Table => {
            let a = required_column(request, RoleName::ColumnA)?;
            let b = required_column(request, RoleName::ColumnB)?;
            // A none third column projects exactly A then B.
            let names: Vec<&str> = match request.binding(RoleName::ColumnC) {
                Some(RoleBinding::Column(c)) => vec![a, b, c.as_str()],
                _ => vec![a, b],
            };
            let projection = dataset.project(&names)?;
            return Ok(RenderedOutput::Table(table_view(&projection)));
        }
    }

    Ok(RenderedOutput::Figure(canvas.into_png()?))
}

fn required_column(request: &ChartRequest, role: RoleName) -> Result<&str> {
    request
        .column(role)
        .ok_or_else(|| anyhow!("Chart request has no column for role '{}'", role.keyword()))
}

fn text_column(dataset: &Dataset, name: &str) -> Result<Vec<String>> {
    let column = dataset
        .column(name)
        .ok_or_else(|| anyhow!("Column '{}' not found", name))?;
    Ok(column.values.iter().map(|v| v.display()).collect())
}

fn numeric_column(dataset: &Dataset, name: &str) -> Result<Vec<f64>> {
    let column = dataset
        .column(name)
        .ok_or_else(|| anyhow!("Column '{}' not found", name))?;
    column
        .values
        .iter()
        .enumerate()
        .map(|(row_idx, value)| {
            value.as_number().ok_or_else(|| {
                anyhow!(
                    "Column '{}' contains a non-numeric value at row {}",
                    name,
                    row_idx + 1
                )
            })
        })
        .collect()
}

fn paired_points(dataset: &Dataset, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
    let xs = numeric_column(dataset, x).context("Failed to extract x column")?;
    let ys = numeric_column(dataset, y).context("Failed to extract y column")?;
    Ok(xs.into_iter().zip(ys).collect())
}

/// Occurrence count per distinct category value, in first-appearance order.
fn category_counts(dataset: &Dataset, name: &str) -> Result<(Vec<String>, Vec<f64>)> {
    let labels_raw = text_column(dataset, name)?;
    let mut labels: Vec<String> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for label in labels_raw {
        if label.is_empty() {
            continue;
        }
        match labels.iter().position(|l| *l == label) {
            Some(idx) => counts[idx] += 1.0,
            None => {
                labels.push(label);
                counts.push(1.0);
            }
        }
    }
    anyhow::ensure!(!labels.is_empty(), "No usable rows for pie chart");
    Ok((labels, counts))
}

/// Per-point pixel radii scaled from a numeric size column.
fn scaled_radii(sizes: &[f64]) -> Vec<i32> {
    const MIN_RADIUS: f64 = 3.0;
    const MAX_RADIUS: f64 = 20.0;
    let min = sizes.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = sizes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    sizes
        .iter()
        .map(|&v| {
            let t = if max > min { (v - min) / (max - min) } else { 0.5 };
            // Area-proportional feel: scale the radius by sqrt.
            (MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * t.sqrt()).round() as i32
        })
        .collect()
}

fn table_view(projection: &Dataset) -> TableView {
    TableView {
        headers: projection
            .column_names()
            .iter()
            .map(|n| n.to_string())
            .collect(),
        rows: (0..projection.row_count())
            .map(|row_idx| {
                projection
                    .columns()
                    .iter()
                    .map(|col| col.values[row_idx].display())
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{validate_and_build, ColumnSelection};

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["region".into(), "sales".into(), "units".into()],
            vec![
                vec!["north".into(), "10".into(), "1".into()],
                vec!["south".into(), "20".into(), "2".into()],
                vec!["north".into(), "15".into(), "3".into()],
            ],
        )
        .unwrap()
    }

    fn options() -> RenderOptions {
        RenderOptions {
            width: 200,
            height: 150,
        }
    }

    fn build(chart: ChartType, selection: ColumnSelection) -> ChartRequest {
        validate_and_build(chart, &selection, &dataset()).unwrap()
    }

    #[test]
    fn test_bar_chart_renders_png() {
        let request = build(
            ChartType::Bar,
            ColumnSelection::new()
                .column(RoleName::X, "region")
                .column(RoleName::Y, "sales"),
        );
        let output = render_chart(&request, &dataset(), &options()).unwrap();
        match output {
            RenderedOutput::Figure(png) => assert_eq!(&png[0..8], &PNG_MAGIC),
            _ => panic!("expected a figure"),
        }
    }

    #[test]
    fn test_bubble_without_size_uses_base_radius() {
        let request = build(
            ChartType::Bubble,
            ColumnSelection::new()
                .column(RoleName::X, "sales")
                .column(RoleName::Y, "units")
                .none(RoleName::Size),
        );
        let output = render_chart(&request, &dataset(), &options()).unwrap();
        assert!(matches!(output, RenderedOutput::Figure(_)));
    }

    #[test]
    fn test_non_numeric_y_is_render_error() {
        let request = build(
            ChartType::Line,
            ColumnSelection::new()
                .column(RoleName::X, "units")
                .column(RoleName::Y, "region"),
        );
        let err = render_chart(&request, &dataset(), &options()).unwrap_err();
        assert!(format!("{:#}", err).contains("region"));
    }

    #[test]
    fn test_table_projection_without_third_column() {
        let request = build(
            ChartType::Table,
            ColumnSelection::new()
                .column(RoleName::ColumnA, "region")
                .column(RoleName::ColumnB, "sales")
                .none(RoleName::ColumnC),
        );
        let output = render_chart(&request, &dataset(), &options()).unwrap();
        match output {
            RenderedOutput::Table(view) => {
                assert_eq!(view.headers, vec!["region", "sales"]);
                assert_eq!(view.rows.len(), 3);
                assert_eq!(view.rows[0], vec!["north", "10"]);
            }
            _ => panic!("expected a table"),
        }
    }

    #[test]
    fn test_table_projection_with_third_column() {
        let request = build(
            ChartType::Table,
            ColumnSelection::new()
                .column(RoleName::ColumnA, "region")
                .column(RoleName::ColumnB, "sales")
                .column(RoleName::ColumnC, "units"),
        );
        let output = render_chart(&request, &dataset(), &options()).unwrap();
        match output {
            RenderedOutput::Table(view) => {
                assert_eq!(view.headers, vec!["region", "sales", "units"]);
            }
            _ => panic!("expected a table"),
        }
    }

    #[test]
    fn test_pie_counts_occurrences() {
        let (labels, counts) = category_counts(&dataset(), "region").unwrap();
        assert_eq!(labels, vec!["north", "south"]);
        assert_eq!(counts, vec![2.0, 1.0]);
    }

    #[test]
    fn test_scaled_radii_monotonic() {
        let radii = scaled_radii(&[1.0, 4.0, 9.0]);
        assert!(radii[0] < radii[1] && radii[1] < radii[2]);
        assert_eq!(radii[0], 3);
        assert_eq!(radii[2], 20);
    }

    #[test]
    fn test_scaled_radii_constant_sizes() {
        let radii = scaled_radii(&[5.0, 5.0]);
        assert_eq!(radii[0], radii[1]);
    }

    #[test]
    fn test_table_view_display_contains_cells() {
        let view = TableView {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        };
        let rendered = view.to_string();
        assert!(rendered.contains('a') && rendered.contains('1'));
    }
}
