use super::{Column, ForeignKey, Index, PrimaryKey};

/// A table descriptor, as read from the connection's metadata.
///
/// Identity is the qualified name. Descriptors are immutable once loaded;
/// re-reading the schema produces a new descriptor which replaces the old
/// one in its [`TableHandle`](crate::TableHandle).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub catalog: Option<String>,

    pub schema: Option<String>,

    /// Name of the table
    pub name: String,

    /// `catalog.schema.name`, omitting absent parts
    pub qualified_name: String,

    /// Table type as reported by the database (`TABLE`, `VIEW`, ...)
    pub kind: String,

    pub remarks: Option<String>,

    /// The table's columns, in declaration order
    pub columns: Vec<Column>,

    pub primary_key: Option<PrimaryKey>,

    /// Keys on this table that point at other tables
    pub foreign_keys: Vec<ForeignKey>,

    /// Keys on other tables that point at this one
    pub referencing_keys: Vec<ForeignKey>,

    pub indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self::qualified(None, None, name)
    }

    pub fn qualified(catalog: Option<String>, schema: Option<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let qualified_name = catalog
            .iter()
            .chain(schema.iter())
            .chain(std::iter::once(&name))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".");

        Self {
            catalog,
            schema,
            name,
            qualified_name,
            kind: "TABLE".to_string(),
            remarks: None,
            columns: vec![],
            primary_key: None,
            foreign_keys: vec![],
            referencing_keys: vec![],
            indexes: vec![],
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn with_referencing_key(mut self, referencing_key: ForeignKey) -> Self {
        self.referencing_keys.push(referencing_key);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Position of the column with this name, ignoring ASCII case.
    pub fn column_index_ignore_case(&self, name: &str) -> Option<usize> {
        self.column_index(name).or_else(|| {
            self.columns
                .iter()
                .position(|column| column.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn column_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Returns `true` if `name` refers to this table, either by qualified
    /// name or by bare name, ignoring ASCII case.
    pub fn is_named(&self, name: &str) -> bool {
        self.qualified_name.eq_ignore_ascii_case(name) || self.name.eq_ignore_ascii_case(name)
    }
}
