//! Chart spec resolution: turn a user's loose column picks into a
//! validated, renderer-ready [`ChartRequest`], or explain what is missing.

use thiserror::Error;

use crate::data::Dataset;
use crate::schema::{ChartType, RoleName};

/// What a role is bound to: a single column, an ordered column list (the
/// sunburst hierarchy path), or an explicit none for optional roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleBinding {
    Column(String),
    Columns(Vec<String>),
    None,
}

impl RoleBinding {
    fn is_unset(&self) -> bool {
        match self {
            RoleBinding::None => true,
            RoleBinding::Columns(cols) => cols.is_empty(),
            RoleBinding::Column(_) => false,
        }
    }

    fn column_names(&self) -> Vec<&str> {
        match self {
            RoleBinding::Column(c) => vec![c.as_str()],
            RoleBinding::Columns(cols) => cols.iter().map(|c| c.as_str()).collect(),
            RoleBinding::None => Vec::new(),
        }
    }
}

/// The columns a user picked for one chart, keyed by role.
///
/// `set` overwrites an existing binding for the same role: last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    bindings: Vec<(RoleName, RoleBinding)>,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, role: RoleName, binding: RoleBinding) {
        if let Some(slot) = self.bindings.iter_mut().find(|(r, _)| *r == role) {
            slot.1 = binding;
        } else {
            self.bindings.push((role, binding));
        }
    }

    pub fn column(mut self, role: RoleName, name: &str) -> Self {
        self.set(role, RoleBinding::Column(name.to_string()));
        self
    }

    pub fn columns(mut self, role: RoleName, names: &[&str]) -> Self {
        self.set(
            role,
            RoleBinding::Columns(names.iter().map(|n| n.to_string()).collect()),
        );
        self
    }

    pub fn none(mut self, role: RoleName) -> Self {
        self.set(role, RoleBinding::None);
        self
    }

    pub fn get(&self, role: RoleName) -> Option<&RoleBinding> {
        self.bindings
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, b)| b)
    }
}

/// A validated chart request: chart type plus bindings resolved in the
/// schema's declared role order. Only constructible through
/// [`validate_and_build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    chart: ChartType,
    roles: Vec<(RoleName, RoleBinding)>,
}

impl ChartRequest {
    pub fn chart_type(&self) -> ChartType {
        self.chart
    }

    pub fn bindings(&self) -> &[(RoleName, RoleBinding)] {
        &self.roles
    }

    pub fn binding(&self, role: RoleName) -> Option<&RoleBinding> {
        self.roles.iter().find(|(r, _)| *r == role).map(|(_, b)| b)
    }

    /// Single column bound to the role, if any.
    pub fn column(&self, role: RoleName) -> Option<&str> {
        match self.binding(role) {
            Some(RoleBinding::Column(c)) => Some(c.as_str()),
            _ => None,
        }
    }

    /// All columns bound to the role, in order.
    pub fn columns(&self, role: RoleName) -> Vec<&str> {
        self.binding(role)
            .map(|b| b.column_names())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", missing_column_message(*chart, roles))]
    MissingRequiredColumn {
        chart: ChartType,
        roles: Vec<RoleName>,
    },
    #[error("Unknown column '{column}' for the {}", chart.display_name())]
    UnknownColumn { chart: ChartType, column: String },
}

fn missing_column_message(chart: ChartType, roles: &[RoleName]) -> String {
    if chart == ChartType::Sunburst {
        return "Please select a valid hierarchical column and a value column for the \
                Sunburst Chart"
            .to_string();
    }
    let words: Vec<&str> = roles.iter().map(|r| role_word(*r)).collect();
    let list = match words.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    };
    let noun = if words.len() == 1 { "column" } else { "columns" };
    format!(
        "Please select {} {} for the {}",
        list,
        noun,
        chart.display_name()
    )
}

fn role_word(role: RoleName) -> &'static str {
    match role {
        RoleName::X => "x-axis",
        RoleName::Y => "y-axis",
        RoleName::Size => "size",
        RoleName::Category => "category",
        RoleName::HierarchyPath => "hierarchical",
        RoleName::Values => "values",
        RoleName::Source => "source",
        RoleName::Target => "target",
        RoleName::Value => "value",
        RoleName::ColumnA => "first",
        RoleName::ColumnB => "second",
        RoleName::ColumnC => "third",
    }
}

/// Validate a selection against the chart type's schema and the dataset.
///
/// Pure function: same inputs, same `ChartRequest` or same error. Required
/// roles left unset are collected together into one
/// [`ValidationError::MissingRequiredColumn`]; column existence is checked
/// afterwards, even though the CLI only offers real columns, so the
/// resolver stays safe to reuse standalone.
pub fn validate_and_build(
    chart: ChartType,
    selection: &ColumnSelection,
    dataset: &Dataset,
) -> Result<ChartRequest, ValidationError> {
    let mut resolved = Vec::with_capacity(chart.roles().len());
    let mut missing = Vec::new();

    for descriptor in chart.roles() {
        let binding = selection
            .get(descriptor.name)
            .cloned()
            .unwrap_or(RoleBinding::None);
        if descriptor.required && binding.is_unset() {
            missing.push(descriptor.name);
        }
        // Optional roles keep their explicit none marker verbatim.
        resolved.push((descriptor.name, binding));
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingRequiredColumn {
            chart,
            roles: missing,
        });
    }

    for (_, binding) in &resolved {
        for name in binding.column_names() {
            if !dataset.has_column(name) {
                return Err(ValidationError::UnknownColumn {
                    chart,
                    column: name.to_string(),
                });
            }
        }
    }

    Ok(ChartRequest {
        chart,
        roles: resolved,
    })
}
