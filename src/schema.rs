//! Static chart-type schemas: which column roles each chart type needs.
//!
//! Both the selection parser and the resolver consult this one table, so
//! "what columns must I ask for" and "what columns must be present to
//! render" can never drift apart.

/// The ten supported chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Pie,
    Bubble,
    Dot,
    HorizontalBar,
    Sunburst,
    Sankey,
    Table,
}

impl ChartType {
    pub const ALL: [ChartType; 10] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Pie,
        ChartType::Bubble,
        ChartType::Dot,
        ChartType::HorizontalBar,
        ChartType::Sunburst,
        ChartType::Sankey,
        ChartType::Table,
    ];

    /// Keyword used in the selection syntax.
    pub fn keyword(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Bubble => "bubble",
            ChartType::Dot => "dot",
            ChartType::HorizontalBar => "hbar",
            ChartType::Sunburst => "sunburst",
            ChartType::Sankey => "sankey",
            ChartType::Table => "table",
        }
    }

    pub fn from_keyword(s: &str) -> Option<ChartType> {
        ChartType::ALL.iter().copied().find(|t| t.keyword() == s)
    }

    /// Label shown above each rendered output.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar Chart",
            ChartType::Line => "Line Chart",
            ChartType::Scatter => "Scatter Plot",
            ChartType::Pie => "Pie Chart",
            ChartType::Bubble => "Bubble Chart",
            ChartType::Dot => "Dot Chart",
            ChartType::HorizontalBar => "Horizontal Bar Chart",
            ChartType::Sunburst => "Sunburst Chart",
            ChartType::Sankey => "Sankey Diagram",
            ChartType::Table => "Table",
        }
    }

    /// The ordered role list for this chart type. Total over the enum;
    /// the renderer consumes the resolved roles positionally in this order.
    pub fn roles(&self) -> &'static [RoleDescriptor] {
        match self {
            ChartType::Bar | ChartType::Line | ChartType::HorizontalBar => XY_ROLES,
            ChartType::Scatter | ChartType::Bubble | ChartType::Dot => XY_SIZE_ROLES,
            ChartType::Pie => PIE_ROLES,
            ChartType::Sunburst => SUNBURST_ROLES,
            ChartType::Sankey => SANKEY_ROLES,
            ChartType::Table => TABLE_ROLES,
        }
    }
}

const XY_ROLES: &[RoleDescriptor] = &[
    RoleDescriptor::required(RoleName::X),
    RoleDescriptor::required(RoleName::Y),
];

const XY_SIZE_ROLES: &[RoleDescriptor] = &[
    RoleDescriptor::required(RoleName::X),
    RoleDescriptor::required(RoleName::Y),
    RoleDescriptor::optional(RoleName::Size),
];

const PIE_ROLES: &[RoleDescriptor] = &[RoleDescriptor::required(RoleName::Category)];

const SUNBURST_ROLES: &[RoleDescriptor] = &[
    RoleDescriptor {
        name: RoleName::HierarchyPath,
        required: true,
        cardinality: Cardinality::OneOrMore,
    },
    RoleDescriptor::required(RoleName::Values),
];

const SANKEY_ROLES: &[RoleDescriptor] = &[
    RoleDescriptor::required(RoleName::Source),
    RoleDescriptor::required(RoleName::Target),
    RoleDescriptor::required(RoleName::Value),
];

const TABLE_ROLES: &[RoleDescriptor] = &[
    RoleDescriptor::required(RoleName::ColumnA),
    RoleDescriptor::required(RoleName::ColumnB),
    RoleDescriptor::optional(RoleName::ColumnC),
];

/// A named slot in a chart type's schema that binds to a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleName {
    X,
    Y,
    Size,
    Category,
    HierarchyPath,
    Values,
    Source,
    Target,
    Value,
    ColumnA,
    ColumnB,
    ColumnC,
}

impl RoleName {
    /// Keyword used in the selection syntax.
    pub fn keyword(&self) -> &'static str {
        match self {
            RoleName::X => "x",
            RoleName::Y => "y",
            RoleName::Size => "size",
            RoleName::Category => "category",
            RoleName::HierarchyPath => "path",
            RoleName::Values => "values",
            RoleName::Source => "source",
            RoleName::Target => "target",
            RoleName::Value => "value",
            RoleName::ColumnA => "a",
            RoleName::ColumnB => "b",
            RoleName::ColumnC => "c",
        }
    }

    pub fn from_keyword(s: &str) -> Option<RoleName> {
        const ALL: [RoleName; 12] = [
            RoleName::X,
            RoleName::Y,
            RoleName::Size,
            RoleName::Category,
            RoleName::HierarchyPath,
            RoleName::Values,
            RoleName::Source,
            RoleName::Target,
            RoleName::Value,
            RoleName::ColumnA,
            RoleName::ColumnB,
            RoleName::ColumnC,
        ];
        ALL.iter().copied().find(|r| r.keyword() == s)
    }
}

/// How many columns a role binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    /// Only the sunburst hierarchy path uses this.
    OneOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDescriptor {
    pub name: RoleName,
    pub required: bool,
    pub cardinality: Cardinality,
}

impl RoleDescriptor {
    const fn required(name: RoleName) -> RoleDescriptor {
        RoleDescriptor {
            name,
            required: true,
            cardinality: Cardinality::One,
        }
    }

    const fn optional(name: RoleName) -> RoleDescriptor {
        RoleDescriptor {
            name,
            required: false,
            cardinality: Cardinality::One,
        }
    }
}
