#![forbid(unsafe_code)]

/// One column of a table definition. `decl` is everything after the name:
/// type, NOT NULL, DEFAULT, CHECK, REFERENCES.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub decl: &'static str,
}

impl ColumnDef {
    pub const fn new(name: &'static str, decl: &'static str) -> Self {
        Self { name, decl }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.name, self.decl)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Table-level constraints (composite keys, multi-column CHECKs, UNIQUE groups).
    pub constraints: &'static [&'static str],
}

impl TableDef {
    pub const fn new(name: &'static str, columns: &'static [ColumnDef]) -> Self {
        Self {
            name,
            columns,
            constraints: &[],
        }
    }

    pub const fn with_constraints(mut self, constraints: &'static [&'static str]) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn create_sql(&self) -> String {
        self.create_sql_as(self.name, true)
    }

    /// Renders the definition under another table name (the rebuild shadow table).
    pub fn create_sql_as(&self, table: &str, if_not_exists: bool) -> String {
        let mut body = self
            .columns
            .iter()
            .map(|column| format!("  {}", column.render()))
            .collect::<Vec<_>>();
        body.extend(self.constraints.iter().map(|c| format!("  {c}")));

        let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
        format!("CREATE TABLE {guard}{table} (\n{}\n)", body.join(",\n"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub table: &'static str,
    /// Indexed terms; may carry a collation or `DESC`.
    pub columns: &'static [&'static str],
    pub unique: bool,
    pub where_clause: Option<&'static str>,
}

impl IndexDef {
    pub const fn new(
        name: &'static str,
        table: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            table,
            columns,
            unique: false,
            where_clause: None,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn partial(mut self, where_clause: &'static str) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    pub fn create_sql(&self) -> String {
        let unique = if self.unique { "UNIQUE " } else { "" };
        let mut sql = format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {}({})",
            self.name,
            self.table,
            self.columns.join(", ")
        );
        if let Some(predicate) = self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        sql
    }

    /// Bare column names, with ordering and collation suffixes stripped.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter_map(|term| term.split_whitespace().next())
            .collect()
    }
}
