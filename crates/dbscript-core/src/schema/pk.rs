#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    /// Constraint name, when the database reports one
    pub name: Option<String>,

    /// Names of the columns composing the key, in key order
    pub columns: Vec<String>,
}

impl PrimaryKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
