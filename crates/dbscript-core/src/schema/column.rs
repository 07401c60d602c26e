use crate::stmt::SqlType;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The name of the column in the database.
    pub name: String,

    /// The type as declared in the table definition.
    pub db_type: String,

    /// The standard type code the declared type maps onto.
    pub sql_type: SqlType,

    /// Declared size (length or precision), when reported.
    pub size: Option<u32>,

    /// Declared scale, when reported.
    pub scale: Option<u32>,

    /// Whether or not the column is nullable
    pub nullable: bool,
}

impl Column {
    /// Creates a nullable column whose type code is derived from the declared type.
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        let db_type = db_type.into();
        Self {
            name: name.into(),
            sql_type: SqlType::from_declared(&db_type),
            db_type,
            size: None,
            scale: None,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn size(mut self, size: u32, scale: Option<u32>) -> Self {
        self.size = Some(size);
        self.scale = scale;
        self
    }
}
