use std::fmt;

/// A foreign key, stored both on the table that owns the key columns
/// (`Table::foreign_keys`) and on the table it points at
/// (`Table::referencing_keys`).
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Constraint name, when the database reports one
    pub name: Option<String>,

    /// Qualified name of the table holding the key columns
    pub source_table: String,

    /// Qualified name of the table the key points at
    pub target_table: String,

    /// Column pairs, in declared key sequence
    pub fields: Vec<ForeignKeyField>,

    pub update_rule: KeyRule,

    pub delete_rule: KeyRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyField {
    /// The column on the source table that is acting as the foreign key
    pub source: String,

    /// The column on the target table that this FK column maps to.
    pub target: String,
}

/// Referential action taken when the referenced row changes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeyRule {
    Cascade,
    #[default]
    NoAction,
    Restrict,
    SetDefault,
    SetNull,
}

impl ForeignKey {
    pub fn new(source_table: impl Into<String>, target_table: impl Into<String>) -> Self {
        Self {
            name: None,
            source_table: source_table.into(),
            target_table: target_table.into(),
            fields: vec![],
            update_rule: KeyRule::default(),
            delete_rule: KeyRule::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a column pair to the key sequence.
    pub fn field(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.fields.push(ForeignKeyField {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    pub fn rules(mut self, update_rule: KeyRule, delete_rule: KeyRule) -> Self {
        self.update_rule = update_rule;
        self.delete_rule = delete_rule;
        self
    }

    /// Name used when listing keys: the constraint name, or a description
    /// built from the column pairs.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let source: Vec<_> = self.fields.iter().map(|f| f.source.as_str()).collect();
                let target: Vec<_> = self.fields.iter().map(|f| f.target.as_str()).collect();
                format!(
                    "{}({}) -> {}({})",
                    self.source_table,
                    source.join(", "),
                    self.target_table,
                    target.join(", ")
                )
            }
        }
    }
}

impl KeyRule {
    /// Parses a rule as reported by database metadata (`"CASCADE"`, `"SET NULL"`, ...).
    pub fn parse(rule: &str) -> KeyRule {
        match rule.trim().to_ascii_uppercase().as_str() {
            "CASCADE" => KeyRule::Cascade,
            "RESTRICT" => KeyRule::Restrict,
            "SET DEFAULT" => KeyRule::SetDefault,
            "SET NULL" => KeyRule::SetNull,
            _ => KeyRule::NoAction,
        }
    }
}

impl fmt::Display for KeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyRule::Cascade => "CASCADE",
            KeyRule::NoAction => "NO ACTION",
            KeyRule::Restrict => "RESTRICT",
            KeyRule::SetDefault => "SET DEFAULT",
            KeyRule::SetNull => "SET NULL",
        })
    }
}
