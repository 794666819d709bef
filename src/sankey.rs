//! Sankey layout: flows aggregated per (source, target) pair, nodes laid
//! out in columns by depth, links drawn as bands between node rectangles.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::canvas::{Canvas, PolygonShape};
use crate::data::Dataset;

const NODE_WIDTH: f64 = 0.03;
const NODE_GAP: f64 = 0.02;

/// A node rectangle in unit coordinates.
#[derive(Debug, Clone)]
pub struct NodeRect {
    pub label: String,
    pub depth: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// A flow band between two nodes.
#[derive(Debug, Clone)]
pub struct LinkBand {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    /// Vertical extent on the source's right edge.
    pub source_span: (f64, f64),
    /// Vertical extent on the target's left edge.
    pub target_span: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct SankeyLayout {
    pub nodes: Vec<NodeRect>,
    pub links: Vec<LinkBand>,
}

/// The combined node label set: the union of the source and target
/// columns' distinct values, in first-appearance order.
pub fn node_labels(dataset: &Dataset, source: &str, target: &str) -> Result<Vec<String>> {
    let source_col = dataset
        .column(source)
        .ok_or_else(|| anyhow!("Column '{}' not found", source))?;
    let target_col = dataset
        .column(target)
        .ok_or_else(|| anyhow!("Column '{}' not found", target))?;

    let mut labels = Vec::new();
    for row_idx in 0..dataset.row_count() {
        for cell in [&source_col.values[row_idx], &target_col.values[row_idx]] {
            let label = cell.display();
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    Ok(labels)
}

/// Compute node rectangles and link bands. Rows whose value cell is null,
/// non-numeric, or not positive are skipped.
pub fn layout(dataset: &Dataset, source: &str, target: &str, value: &str) -> Result<SankeyLayout> {
    let labels = node_labels(dataset, source, target)?;
    anyhow::ensure!(!labels.is_empty(), "No usable rows for sankey diagram");

    let source_col = dataset
        .column(source)
        .ok_or_else(|| anyhow!("Column '{}' not found", source))?;
    let target_col = dataset
        .column(target)
        .ok_or_else(|| anyhow!("Column '{}' not found", target))?;
    let value_col = dataset
        .column(value)
        .ok_or_else(|| anyhow!("Column '{}' not found", value))?;

    let index_of: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    // Aggregate flows per (source, target) pair, preserving first order.
    let mut flow_order: Vec<(usize, usize)> = Vec::new();
    let mut flows: HashMap<(usize, usize), f64> = HashMap::new();
    for row_idx in 0..dataset.row_count() {
        let amount = match value_col.values[row_idx].as_number() {
            Some(v) if v > 0.0 => v,
            _ => continue,
        };
        let src_label = source_col.values[row_idx].display();
        let tgt_label = target_col.values[row_idx].display();
        let (Some(&src), Some(&tgt)) = (
            index_of.get(src_label.as_str()),
            index_of.get(tgt_label.as_str()),
        ) else {
            continue;
        };
        let key = (src, tgt);
        if !flows.contains_key(&key) {
            flow_order.push(key);
        }
        *flows.entry(key).or_insert(0.0) += amount;
    }
    anyhow::ensure!(!flow_order.is_empty(), "No usable rows for sankey diagram");

    // Node depth: bounded relaxation so cycles terminate at the cap.
    let n = labels.len();
    let mut depth = vec![0usize; n];
    for _ in 0..n {
        let mut changed = false;
        for &(src, tgt) in &flow_order {
            let candidate = depth[src] + 1;
            if candidate > depth[tgt] && candidate < n {
                depth[tgt] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    let max_depth = depth.iter().copied().max().unwrap_or(0);

    // Node weight: the larger of total in-flow and total out-flow.
    let mut in_flow = vec![0.0f64; n];
    let mut out_flow = vec![0.0f64; n];
    for (&(src, tgt), &amount) in &flows {
        out_flow[src] += amount;
        in_flow[tgt] += amount;
    }
    let weight: Vec<f64> = (0..n).map(|i| in_flow[i].max(out_flow[i])).collect();

    // One common value-to-height scale so band widths line up across columns.
    let mut scale = f64::INFINITY;
    for d in 0..=max_depth {
        let members: Vec<usize> = (0..n).filter(|&i| depth[i] == d).collect();
        let total: f64 = members.iter().map(|&i| weight[i]).sum();
        let gaps = NODE_GAP * members.len().saturating_sub(1) as f64;
        if total > 0.0 {
            scale = scale.min((0.92 - gaps) / total);
        }
    }
    anyhow::ensure!(scale.is_finite() && scale > 0.0, "Sankey flows sum to zero");

    let column_step = if max_depth == 0 {
        0.0
    } else {
        (1.0 - NODE_WIDTH) / max_depth as f64
    };

    let mut nodes = Vec::with_capacity(n);
    for (i, label) in labels.iter().enumerate() {
        nodes.push(NodeRect {
            label: label.clone(),
            depth: depth[i],
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
        });
    }
    for d in 0..=max_depth {
        let x0 = d as f64 * column_step;
        let mut cursor = 0.96;
        for i in 0..n {
            if depth[i] != d {
                continue;
            }
            let height = weight[i] * scale;
            nodes[i].x0 = x0;
            nodes[i].x1 = x0 + NODE_WIDTH;
            nodes[i].y1 = cursor;
            nodes[i].y0 = cursor - height;
            cursor -= height + NODE_GAP;
        }
    }

    // Slot the bands along each node's edge, in flow order.
    let mut out_cursor: Vec<f64> = nodes.iter().map(|nd| nd.y1).collect();
    let mut in_cursor: Vec<f64> = nodes.iter().map(|nd| nd.y1).collect();
    let mut links = Vec::with_capacity(flow_order.len());
    for &(src, tgt) in &flow_order {
        let amount = flows[&(src, tgt)];
        let thickness = amount * scale;
        let source_span = (out_cursor[src] - thickness, out_cursor[src]);
        let target_span = (in_cursor[tgt] - thickness, in_cursor[tgt]);
        out_cursor[src] -= thickness;
        in_cursor[tgt] -= thickness;
        links.push(LinkBand {
            source: src,
            target: tgt,
            value: amount,
            source_span,
            target_span,
        });
    }

    Ok(SankeyLayout { nodes, links })
}

/// Render the layout onto a canvas: link bands first, node rectangles and
/// labels on top.
pub fn render(
    dataset: &Dataset,
    source: &str,
    target: &str,
    value: &str,
    canvas: &mut Canvas,
) -> Result<()> {
    let layout = layout(dataset, source, target, value)?;

    let mut shapes = Vec::new();
    for link in &layout.links {
        let src = &layout.nodes[link.source];
        let tgt = &layout.nodes[link.target];
        shapes.push(PolygonShape {
            points: vec![
                (src.x1, link.source_span.0),
                (src.x1, link.source_span.1),
                (tgt.x0, link.target_span.1),
                (tgt.x0, link.target_span.0),
            ],
            color_index: link.source,
            alpha: 0.35,
            label: None,
        });
    }
    for (i, node) in layout.nodes.iter().enumerate() {
        let label_x = if node.depth == 0 {
            node.x1 + 0.01
        } else {
            (node.x0 - 0.12).max(0.0)
        };
        shapes.push(PolygonShape {
            points: vec![
                (node.x0, node.y0),
                (node.x0, node.y1),
                (node.x1, node.y1),
                (node.x1, node.y0),
            ],
            color_index: i,
            alpha: 1.0,
            label: Some((node.label.clone(), (label_x, (node.y0 + node.y1) / 2.0))),
        });
    }
    canvas.draw_polygons(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["from".into(), "to".into(), "amount".into()],
            vec![
                vec!["coal".into(), "power".into(), "30".into()],
                vec!["gas".into(), "power".into(), "20".into()],
                vec!["power".into(), "homes".into(), "35".into()],
                vec!["power".into(), "industry".into(), "15".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_node_labels_are_union_of_both_columns() {
        let labels = node_labels(&dataset(), "from", "to").unwrap();
        assert_eq!(labels, vec!["coal", "power", "gas", "homes", "industry"]);
    }

    #[test]
    fn test_depth_assignment() {
        let layout = layout(&dataset(), "from", "to", "amount").unwrap();
        let depth_of = |label: &str| {
            layout
                .nodes
                .iter()
                .find(|nd| nd.label == label)
                .unwrap()
                .depth
        };
        assert_eq!(depth_of("coal"), 0);
        assert_eq!(depth_of("gas"), 0);
        assert_eq!(depth_of("power"), 1);
        assert_eq!(depth_of("homes"), 2);
        assert_eq!(depth_of("industry"), 2);
    }

    #[test]
    fn test_flows_aggregate_duplicates() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into(), "v".into()],
            vec![
                vec!["x".into(), "y".into(), "1".into()],
                vec!["x".into(), "y".into(), "2".into()],
            ],
        )
        .unwrap();
        let layout = layout(&ds, "a", "b", "v").unwrap();
        assert_eq!(layout.links.len(), 1);
        assert_eq!(layout.links[0].value, 3.0);
    }

    #[test]
    fn test_band_thickness_proportional() {
        let layout = layout(&dataset(), "from", "to", "amount").unwrap();
        let coal = &layout.links[0];
        let gas = &layout.links[1];
        let coal_h = coal.source_span.1 - coal.source_span.0;
        let gas_h = gas.source_span.1 - gas.source_span.0;
        assert!((coal_h / gas_h - 30.0 / 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_terminates() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into(), "v".into()],
            vec![
                vec!["x".into(), "y".into(), "1".into()],
                vec!["y".into(), "x".into(), "1".into()],
            ],
        )
        .unwrap();
        let layout = layout(&ds, "a", "b", "v").unwrap();
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.links.len(), 2);
    }

    #[test]
    fn test_non_numeric_values_skipped() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into(), "v".into()],
            vec![
                vec!["x".into(), "y".into(), "oops".into()],
                vec!["x".into(), "z".into(), "5".into()],
            ],
        )
        .unwrap();
        let layout = layout(&ds, "a", "b", "v").unwrap();
        assert_eq!(layout.links.len(), 1);
    }
}
