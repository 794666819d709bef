//! Dashboard controller: holds the loaded dataset and the ordered chart
//! selections, and drives one synchronous generate pass over all of them.

use thiserror::Error;

use crate::data::Dataset;
use crate::render::{render_chart, RenderedOutput};
use crate::resolver::{validate_and_build, ColumnSelection, ValidationError};
use crate::schema::ChartType;
use crate::RenderOptions;

/// Why one chart of a batch failed. The rest of the batch still renders.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error("Failed to render {chart}: {detail}")]
    Render { chart: &'static str, detail: String },
}

/// Result of generating one chart of the batch.
#[derive(Debug)]
pub struct ChartOutcome {
    pub chart: ChartType,
    /// Heading shown above the output, e.g. "Sankey Diagram".
    pub label: &'static str,
    pub result: Result<RenderedOutput, GenerateError>,
}

/// One dataset plus the user's chart selections, in selection order.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    dataset: Option<Dataset>,
    charts: Vec<(ChartType, ColumnSelection)>,
}

impl Dashboard {
    pub fn new(dataset: Dataset) -> Self {
        Dashboard {
            dataset: Some(dataset),
            charts: Vec::new(),
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Swap in a newly loaded dataset. The old one is discarded wholesale;
    /// selections are kept and re-validated on the next generate pass.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
    }

    /// Add or update the selection for a chart type. Each type appears at
    /// most once: selecting it again overwrites the previous columns but
    /// keeps the original position in the batch (last write wins).
    pub fn select(&mut self, chart: ChartType, selection: ColumnSelection) {
        if let Some(slot) = self.charts.iter_mut().find(|(c, _)| *c == chart) {
            slot.1 = selection;
        } else {
            self.charts.push((chart, selection));
        }
    }

    pub fn charts(&self) -> &[(ChartType, ColumnSelection)] {
        &self.charts
    }

    /// Validate and render every selected chart, in selection order.
    ///
    /// A validation or render failure is recorded in that chart's outcome
    /// and the remaining charts still render. Everything is recomputed from
    /// the selections on each call; no state carries over between passes.
    pub fn generate(&self, options: &RenderOptions) -> Vec<ChartOutcome> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };

        self.charts
            .iter()
            .map(|(chart, selection)| {
                let result = validate_and_build(*chart, selection, dataset)
                    .map_err(GenerateError::Validation)
                    .and_then(|request| {
                        render_chart(&request, dataset, options).map_err(|e| {
                            GenerateError::Render {
                                chart: chart.display_name(),
                                detail: format!("{:#}", e),
                            }
                        })
                    });
                ChartOutcome {
                    chart: *chart,
                    label: chart.display_name(),
                    result,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RoleName;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["region".into(), "sales".into(), "units".into()],
            vec![
                vec!["north".into(), "10".into(), "1".into()],
                vec!["south".into(), "20".into(), "2".into()],
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

    #[test]
    fn test_partial_failure_keeps_other_charts() {
        let mut dashboard = Dashboard::new(dataset());
        // Sankey is missing its value column; the bar chart is fine.
        dashboard.select(
            ChartType::Sankey,
            ColumnSelection::new()
                .column(RoleName::Source, "region")
                .column(RoleName::Target, "region"),
        );
        dashboard.select(
            ChartType::Bar,
            ColumnSelection::new()
                .column(RoleName::X, "region")
                .column(RoleName::Y, "sales"),
        );

        let outcomes = dashboard.generate(&options());
        assert_eq!(outcomes.len(), 2);
        let sankey_err = outcomes[0].result.as_ref().unwrap_err();
        assert!(sankey_err.to_string().contains("value"));
        assert!(outcomes[1].result.is_ok());
    }

    #[test]
    fn test_outcomes_follow_selection_order_with_labels() {
        let mut dashboard = Dashboard::new(dataset());
        dashboard.select(
            ChartType::Line,
            ColumnSelection::new()
                .column(RoleName::X, "units")
                .column(RoleName::Y, "sales"),
        );
        dashboard.select(
            ChartType::Pie,
            ColumnSelection::new().column(RoleName::Category, "region"),
        );

        let outcomes = dashboard.generate(&options());
        let labels: Vec<&str> = outcomes.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["Line Chart", "Pie Chart"]);
    }

    #[test]
    fn test_reselect_overwrites_in_place() {
        let mut dashboard = Dashboard::new(dataset());
        dashboard.select(
            ChartType::Bar,
            ColumnSelection::new()
                .column(RoleName::X, "region")
                .column(RoleName::Y, "sales"),
        );
        dashboard.select(
            ChartType::Pie,
            ColumnSelection::new().column(RoleName::Category, "region"),
        );
        dashboard.select(
            ChartType::Bar,
            ColumnSelection::new()
                .column(RoleName::X, "region")
                .column(RoleName::Y, "units"),
        );

        assert_eq!(dashboard.charts().len(), 2);
        let (chart, selection) = &dashboard.charts()[0];
        assert_eq!(*chart, ChartType::Bar);
        assert_eq!(
            selection.get(RoleName::Y),
            Some(&crate::resolver::RoleBinding::Column("units".into()))
        );
    }

    #[test]
    fn test_replace_dataset_revalidates() {
        let mut dashboard = Dashboard::new(dataset());
        dashboard.select(
            ChartType::Bar,
            ColumnSelection::new()
                .column(RoleName::X, "region")
                .column(RoleName::Y, "sales"),
        );
        assert!(dashboard.generate(&options())[0].result.is_ok());

        let other = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()]],
        )
        .unwrap();
        dashboard.replace_dataset(other);
        let outcome = &dashboard.generate(&options())[0];
        assert!(matches!(
            outcome.result,
            Err(GenerateError::Validation(
                ValidationError::UnknownColumn { .. }
            ))
        ));
    }

    #[test]
    fn test_empty_dashboard_generates_nothing() {
        let dashboard = Dashboard::default();
        assert!(dashboard.generate(&options()).is_empty());
    }
}
