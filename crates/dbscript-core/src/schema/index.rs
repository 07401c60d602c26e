#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Index name
    pub name: String,

    /// When `true`, indexed entries are unique
    pub unique: bool,

    /// Names of the indexed columns, in index order
    pub columns: Vec<String>,
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, unique: bool, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            unique,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}
