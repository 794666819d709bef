//! Sunburst layout: hierarchical aggregation of rows along a path of
//! columns, with each node given an angular span proportional to its value
//! inside its parent's span. Depth maps to ring index.

use std::collections::HashMap;
use std::f64::consts::PI;

use anyhow::{anyhow, Result};

use crate::canvas::{Canvas, PolygonShape};
use crate::data::Dataset;

/// One annular sector of the sunburst, in polar terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub depth: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub label: String,
    pub value: f64,
}

struct Node {
    label: String,
    value: f64,
    children: Vec<Node>,
}

/// Compute the ring sectors for a hierarchy path and a values column.
/// Rows whose value cell is null, non-numeric, or negative are skipped.
pub fn layout(dataset: &Dataset, path: &[&str], values: &str) -> Result<Vec<Sector>> {
    anyhow::ensure!(!path.is_empty(), "Sunburst needs at least one hierarchy column");

    let path_columns: Vec<_> = path
        .iter()
        .map(|name| {
            dataset
                .column(name)
                .ok_or_else(|| anyhow!("Column '{}' not found", name))
        })
        .collect::<Result<_>>()?;
    let value_column = dataset
        .column(values)
        .ok_or_else(|| anyhow!("Column '{}' not found", values))?;

    let mut rows: Vec<(Vec<String>, f64)> = Vec::new();
    for row_idx in 0..dataset.row_count() {
        let value = match value_column.values[row_idx].as_number() {
            Some(v) if v >= 0.0 => v,
            _ => continue,
        };
        let labels: Vec<String> = path_columns
            .iter()
            .map(|col| col.values[row_idx].display())
            .collect();
        if labels.iter().any(|l| l.is_empty()) {
            continue;
        }
        rows.push((labels, value));
    }
    anyhow::ensure!(!rows.is_empty(), "No usable rows for sunburst chart");

    let roots = build_nodes(&rows, 0, path.len());
    let total: f64 = roots.iter().map(|n| n.value).sum();
    anyhow::ensure!(total > 0.0, "Sunburst values sum to zero");

    let mut sectors = Vec::new();
    assign_angles(&roots, 0, 0.0, 2.0 * PI, total, &mut sectors);
    Ok(sectors)
}

/// Group rows by the label at `depth`, preserving first-appearance order.
fn build_nodes(rows: &[(Vec<String>, f64)], depth: usize, max_depth: usize) -> Vec<Node> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<(Vec<String>, f64)>> = HashMap::new();
    for (labels, value) in rows {
        let key = labels[depth].clone();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups
            .entry(key)
            .or_default()
            .push((labels.clone(), *value));
    }

    order
        .into_iter()
        .map(|label| {
            let group = &groups[&label];
            let value = group.iter().map(|(_, v)| v).sum();
            let children = if depth + 1 < max_depth {
                build_nodes(group, depth + 1, max_depth)
            } else {
                Vec::new()
            };
            Node {
                label,
                value,
                children,
            }
        })
        .collect()
}

fn assign_angles(
    nodes: &[Node],
    depth: usize,
    start: f64,
    end: f64,
    parent_value: f64,
    out: &mut Vec<Sector>,
) {
    let mut cursor = start;
    for node in nodes {
        let span = (end - start) * (node.value / parent_value);
        out.push(Sector {
            depth,
            start_angle: cursor,
            end_angle: cursor + span,
            label: node.label.clone(),
            value: node.value,
        });
        if !node.children.is_empty() {
            assign_angles(&node.children, depth + 1, cursor, cursor + span, node.value, out);
        }
        cursor += span;
    }
}

/// Render the sectors as annular polygons onto a canvas.
pub fn render(dataset: &Dataset, path: &[&str], values: &str, canvas: &mut Canvas) -> Result<()> {
    let sectors = layout(dataset, path, values)?;
    let levels = path.len();
    let ring_width = 0.42 / levels as f64;

    let mut top_level_index = 0usize;
    let mut shapes = Vec::with_capacity(sectors.len());
    for sector in &sectors {
        // Color sunburst wedges by their top-level branch.
        if sector.depth == 0 {
            top_level_index += 1;
        }
        let inner = 0.03 + sector.depth as f64 * ring_width;
        let outer = inner + ring_width * 0.95;
        let label = if sector.end_angle - sector.start_angle > 0.25 {
            let mid_angle = (sector.start_angle + sector.end_angle) / 2.0;
            let mid_radius = (inner + outer) / 2.0;
            Some((
                sector.label.clone(),
                (
                    0.5 + mid_radius * mid_angle.cos(),
                    0.5 + mid_radius * mid_angle.sin(),
                ),
            ))
        } else {
            None
        };
        shapes.push(PolygonShape {
            points: annular_sector(inner, outer, sector.start_angle, sector.end_angle),
            color_index: top_level_index.saturating_sub(1),
            alpha: 1.0 - 0.18 * sector.depth as f64,
            label,
        });
    }
    canvas.draw_polygons(shapes)
}

/// Polygon approximation of an annular sector centered at (0.5, 0.5).
fn annular_sector(inner: f64, outer: f64, start: f64, end: f64) -> Vec<(f64, f64)> {
    let steps = ((end - start).abs() * 24.0).ceil().max(2.0) as usize;
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        let angle = start + (end - start) * (i as f64 / steps as f64);
        points.push((0.5 + outer * angle.cos(), 0.5 + outer * angle.sin()));
    }
    for i in (0..=steps).rev() {
        let angle = start + (end - start) * (i as f64 / steps as f64);
        points.push((0.5 + inner * angle.cos(), 0.5 + inner * angle.sin()));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["region".into(), "city".into(), "pop".into()],
            vec![
                vec!["west".into(), "sf".into(), "10".into()],
                vec!["west".into(), "la".into(), "30".into()],
                vec!["east".into(), "ny".into(), "60".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_single_level_layout() {
        let sectors = layout(&dataset(), &["region"], "pop").unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].label, "west");
        assert_eq!(sectors[0].value, 40.0);
        assert_eq!(sectors[1].label, "east");
        assert_eq!(sectors[1].value, 60.0);
        // Spans are proportional to values and tile the full circle.
        let total_span: f64 = sectors
            .iter()
            .map(|s| s.end_angle - s.start_angle)
            .sum();
        assert!((total_span - 2.0 * PI).abs() < 1e-9);
        let west_span = sectors[0].end_angle - sectors[0].start_angle;
        assert!((west_span - 0.4 * 2.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_two_level_layout_children_tile_parent() {
        let sectors = layout(&dataset(), &["region", "city"], "pop").unwrap();
        let west = sectors.iter().find(|s| s.label == "west").unwrap().clone();
        let children: Vec<_> = sectors
            .iter()
            .filter(|s| s.depth == 1 && (s.label == "sf" || s.label == "la"))
            .collect();
        assert_eq!(children.len(), 2);
        let child_span: f64 = children.iter().map(|s| s.end_angle - s.start_angle).sum();
        assert!((child_span - (west.end_angle - west.start_angle)).abs() < 1e-9);
    }

    #[test]
    fn test_bad_value_rows_skipped() {
        let ds = Dataset::from_rows(
            vec!["k".into(), "v".into()],
            vec![
                vec!["a".into(), "10".into()],
                vec!["b".into(), "oops".into()],
                vec!["c".into(), "".into()],
            ],
        )
        .unwrap();
        let sectors = layout(&ds, &["k"], "v").unwrap();
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].label, "a");
    }

    #[test]
    fn test_all_rows_unusable() {
        let ds = Dataset::from_rows(
            vec!["k".into(), "v".into()],
            vec![vec!["a".into(), "x".into()]],
        )
        .unwrap();
        assert!(layout(&ds, &["k"], "v").is_err());
    }

    #[test]
    fn test_unknown_column() {
        assert!(layout(&dataset(), &["nope"], "pop").is_err());
    }
}
