use super::{contains, Args, HostObject, StatementKind, StatementObject, TableObject, ValueArray};
use crate::script::Dynamic;
use dbscript_core::{Catalog, Result};

use std::sync::Arc;

/// The `db` global: statement factories and tables by name.
#[derive(Debug)]
pub struct ConnectionObject {
    catalog: Arc<Catalog>,
}

impl ConnectionObject {
    const PROPERTIES: &'static [&'static str] = &["tables", "url"];

    const METHODS: &'static [&'static str] = &[
        "createStatement",
        "prepareCall",
        "prepareStatement",
        "table",
    ];

    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    fn table(&self, name: &str) -> Result<Option<Dynamic>> {
        Ok(self
            .catalog
            .find_table(name)?
            .map(|handle| Dynamic::host(TableObject::new(handle, self.catalog.clone()))))
    }
}

impl HostObject for ConnectionObject {
    fn class_name(&self) -> &'static str {
        "Connection"
    }

    fn properties(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }

    fn methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        match name {
            "tables" => Ok(Some(Dynamic::host(ValueArray::from_strings(
                self.catalog.table_names()?,
            )))),
            "url" => Ok(Some(Dynamic::from(self.catalog.connection().url().into_owned()))),
            _ => self.table(name),
        }
    }

    fn has(&self, name: &str) -> bool {
        contains(Self::PROPERTIES, name)
            || contains(Self::METHODS, name)
            || matches!(self.catalog.find_table(name), Ok(Some(_)))
    }

    fn names(&self) -> Result<Vec<String>> {
        self.catalog.table_names()
    }

    fn invoke(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic> {
        let connection = self.catalog.connection().clone();

        match method {
            "createStatement" => {
                Args::new("createStatement()", args).expect_len(0, 0)?;
                Ok(Dynamic::host(StatementObject::new(
                    connection,
                    StatementKind::Plain,
                    None,
                )))
            }
            "prepareStatement" => {
                let args = Args::new("prepareStatement(sql)", args);
                args.expect_len(1, 1)?;
                Ok(Dynamic::host(StatementObject::new(
                    connection,
                    StatementKind::Prepared,
                    Some(args.string(0)?.to_string()),
                )))
            }
            "prepareCall" => {
                let args = Args::new("prepareCall(sql)", args);
                args.expect_len(1, 1)?;
                Ok(Dynamic::host(StatementObject::new(
                    connection,
                    StatementKind::Callable,
                    Some(args.string(0)?.to_string()),
                )))
            }
            "table" => {
                let args = Args::new("table(name)", args);
                args.expect_len(1, 1)?;
                Ok(self.table(args.string(0)?)?.unwrap_or(Dynamic::Null))
            }
            _ => Err(Args::new("db", args).error(format!("no method `{method}`"))),
        }
    }

    fn to_display_string(&self) -> String {
        format!("Connection({})", self.catalog.connection().url())
    }
}
