use super::{contains, Args, HostObject, ValueArray};
use crate::script::Dynamic;
use dbscript_core::{
    driver::{Cursor, ResultColumn},
    Error, Result,
};

use std::{cell::RefCell, collections::HashMap};

/// A forward-only result set.
///
/// Columns are addressed by zero-based index or case-insensitive name. The
/// column map built from the result metadata decides whether a column
/// exists; only then is the value fetched, so a fetch failure is never
/// reported as a missing column.
#[derive(Debug)]
pub struct ResultSetObject {
    cursor: RefCell<Box<dyn Cursor>>,
    columns: Vec<ResultColumn>,
    by_name: HashMap<String, usize>,
}

impl ResultSetObject {
    const PROPERTIES: &'static [&'static str] = &[
        "closed",
        "columns",
        "dbtypes",
        "length",
        "sqltypes",
        "valuetypes",
    ];

    const METHODS: &'static [&'static str] = &["close", "next"];

    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        let columns = cursor.columns().to_vec();

        // The first of several same-named columns wins.
        let mut by_name = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            by_name.entry(column.name.to_lowercase()).or_insert(i);
        }

        Self {
            cursor: RefCell::new(cursor),
            columns,
            by_name,
        }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    fn fetch(&self, index: usize) -> Result<Dynamic> {
        Ok(Dynamic::from(self.cursor.borrow().get(index)?))
    }

    fn describe<'a>(&'a self, f: impl Fn(&'a ResultColumn) -> String) -> Dynamic {
        Dynamic::host(ValueArray::from_strings(self.columns.iter().map(f)))
    }
}

impl HostObject for ResultSetObject {
    fn class_name(&self) -> &'static str {
        "ResultSet"
    }

    fn properties(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }

    fn methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        let value = match name {
            "closed" => Dynamic::Bool(self.cursor.borrow().is_closed()),
            "columns" => self.describe(|column| column.name.clone()),
            "dbtypes" => self.describe(|column| column.db_type.clone()),
            "length" => Dynamic::from(self.columns.len()),
            "sqltypes" => Dynamic::host(ValueArray::new(
                self.columns
                    .iter()
                    .map(|column| Dynamic::Int(column.sql_type.code().into()))
                    .collect(),
            )),
            "valuetypes" => self.describe(|column| column.value_type.clone()),
            _ => match self.column_index(name) {
                Some(index) => self.fetch(index)?,
                None => return Ok(None),
            },
        };
        Ok(Some(value))
    }

    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        if !self.has_index(index) {
            return Ok(None);
        }
        self.fetch(index as usize).map(Some)
    }

    fn has(&self, name: &str) -> bool {
        contains(Self::PROPERTIES, name)
            || contains(Self::METHODS, name)
            || self.column_index(name).is_some()
    }

    fn has_index(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.columns.len())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.columns.iter().map(|column| column.name.clone()).collect())
    }

    fn invoke(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic> {
        match method {
            "next" => {
                Args::new("next()", args).expect_len(0, 0)?;
                Ok(Dynamic::Bool(self.cursor.borrow_mut().next()?))
            }
            "close" => {
                Args::new("close()", args).expect_len(0, 0)?;
                self.cursor.borrow_mut().close()?;
                Ok(Dynamic::Undefined)
            }
            _ => Err(Error::unsupported(format!("ResultSet has no method `{method}`"))),
        }
    }

    fn to_display_string(&self) -> String {
        let names: Vec<_> = self.columns.iter().map(|column| column.name.as_str()).collect();
        format!("ResultSet({})", names.join(", "))
    }
}
