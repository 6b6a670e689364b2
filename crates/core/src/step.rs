#![forbid(unsafe_code)]

use crate::schema::{ColumnDef, IndexDef, TableDef};

/// A catalog fact whose presence means a raw statement has already run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaProbe {
    Table(&'static str),
    Column {
        table: &'static str,
        column: &'static str,
    },
    Index(&'static str),
}

impl SchemaProbe {
    pub fn describe(&self) -> String {
        match self {
            Self::Table(table) => format!("table {table}"),
            Self::Column { table, column } => format!("column {table}.{column}"),
            Self::Index(index) => format!("index {index}"),
        }
    }
}

/// Where a shadow-table column takes its value from when it is not a same-named copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnSource {
    /// Copy verbatim from a differently named source column.
    Column(&'static str),
    /// Any SQL expression over the source row, e.g. `COALESCE(note, '')` or a literal.
    Expr(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnMapping {
    pub column: &'static str,
    pub source: ColumnSource,
}

impl ColumnMapping {
    pub const fn expr(column: &'static str, expr: &'static str) -> Self {
        Self {
            column,
            source: ColumnSource::Expr(expr),
        }
    }

    pub const fn renamed(column: &'static str, from: &'static str) -> Self {
        Self {
            column,
            source: ColumnSource::Column(from),
        }
    }
}

/// Explicit evidence that a rebuild already reached its target shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionMarker {
    /// A named row in the engine's marker table, written in the rebuild's transaction.
    Flag(&'static str),
    /// A column that only exists once the rebuild has run.
    ColumnPresent(&'static str),
}

impl CompletionMarker {
    pub fn describe(&self) -> String {
        match self {
            Self::Flag(name) => format!("flag {name}"),
            Self::ColumnPresent(column) => format!("column {column}"),
        }
    }
}

/// Shadow-table rebuild of one table into `table`'s shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebuildPlan {
    pub table: TableDef,
    pub sources: &'static [ColumnMapping],
    /// Source columns the rebuild discards on purpose.
    pub dropped: &'static [&'static str],
    pub indexes: &'static [IndexDef],
    pub marker: CompletionMarker,
}

impl RebuildPlan {
    pub const fn new(table: TableDef, marker: CompletionMarker) -> Self {
        Self {
            table,
            sources: &[],
            dropped: &[],
            indexes: &[],
            marker,
        }
    }

    pub const fn with_sources(mut self, sources: &'static [ColumnMapping]) -> Self {
        self.sources = sources;
        self
    }

    pub const fn with_dropped(mut self, dropped: &'static [&'static str]) -> Self {
        self.dropped = dropped;
        self
    }

    pub const fn with_indexes(mut self, indexes: &'static [IndexDef]) -> Self {
        self.indexes = indexes;
        self
    }

    pub fn shadow_name(&self) -> String {
        format!("{}_new", self.table.name)
    }

    pub fn source_for(&self, column: &str) -> Option<ColumnSource> {
        self.sources
            .iter()
            .find(|mapping| mapping.column == column)
            .map(|mapping| mapping.source)
    }

    pub fn drops(&self, column: &str) -> bool {
        self.dropped
            .iter()
            .any(|dropped| dropped.eq_ignore_ascii_case(column))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationStep {
    CreateTable(TableDef),
    CreateIndex(IndexDef),
    AddColumn {
        table: &'static str,
        column: ColumnDef,
    },
    RebuildWithConstraint(RebuildPlan),
    RawStatement {
        sql: &'static str,
        skip_if: Option<SchemaProbe>,
    },
}

impl MigrationStep {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create_table",
            Self::CreateIndex(_) => "create_index",
            Self::AddColumn { .. } => "add_column",
            Self::RebuildWithConstraint(_) => "rebuild",
            Self::RawStatement { .. } => "raw",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable(table) => {
                format!("create table {} ({} columns)", table.name, table.columns.len())
            }
            Self::CreateIndex(index) => {
                format!("create index {} on {}", index.name, index.table)
            }
            Self::AddColumn { table, column } => {
                format!("add column {table}.{} {}", column.name, column.decl)
            }
            Self::RebuildWithConstraint(plan) => format!(
                "rebuild {} via {} (marker: {}, {} indexes)",
                plan.table.name,
                plan.shadow_name(),
                plan.marker.describe(),
                plan.indexes.len()
            ),
            Self::RawStatement { sql, skip_if } => {
                let head = first_line(sql);
                match skip_if {
                    Some(probe) => format!("raw `{head}` unless {} exists", probe.describe()),
                    None => format!("raw `{head}`"),
                }
            }
        }
    }

    /// Every name this step will interpolate into SQL.
    pub fn identifiers(&self) -> Vec<&'static str> {
        match self {
            Self::CreateTable(table) => table_identifiers(table),
            Self::CreateIndex(index) => index_identifiers(index),
            Self::AddColumn { table, column } => vec![*table, column.name],
            Self::RebuildWithConstraint(plan) => {
                let mut out = table_identifiers(&plan.table);
                out.extend(plan.sources.iter().map(|mapping| mapping.column));
                out.extend(plan.sources.iter().filter_map(|mapping| match mapping.source {
                    ColumnSource::Column(from) => Some(from),
                    ColumnSource::Expr(_) => None,
                }));
                out.extend(plan.dropped.iter().copied());
                for index in plan.indexes {
                    out.extend(index_identifiers(index));
                }
                if let CompletionMarker::ColumnPresent(column) = plan.marker {
                    out.push(column);
                }
                out
            }
            Self::RawStatement { skip_if, .. } => match skip_if {
                Some(SchemaProbe::Table(table)) => vec![*table],
                Some(SchemaProbe::Column { table, column }) => vec![*table, *column],
                Some(SchemaProbe::Index(index)) => vec![*index],
                None => Vec::new(),
            },
        }
    }
}

fn table_identifiers(table: &TableDef) -> Vec<&'static str> {
    let mut out = vec![table.name];
    out.extend(table.columns.iter().map(|column| column.name));
    out
}

fn index_identifiers(index: &IndexDef) -> Vec<&'static str> {
    let mut out = vec![index.name, index.table];
    out.extend(index.column_names());
    out
}

fn first_line(sql: &str) -> String {
    let line = sql
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    if line.chars().count() > 72 {
        let mut out = line.chars().take(69).collect::<String>();
        out.push_str("...");
        out
    } else {
        line.to_string()
    }
}
