use crate::{
    stmt::{SqlType, Value},
    Error, Result,
};

use std::fmt::Debug;

/// Describes one column of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: String,

    /// Type name as the database reports it
    pub db_type: String,

    pub sql_type: SqlType,

    /// Name of the runtime representation of this column's values
    pub value_type: String,
}

/// A forward-only cursor over the rows of a result set.
pub trait Cursor: Debug + Send {
    fn columns(&self) -> &[ResultColumn];

    /// Advances to the next row. Returns `false` once the rows are exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Reads column `index` (zero-based) of the current row.
    fn get(&self, index: usize) -> Result<Value>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        let db_type = db_type.into();
        let sql_type = SqlType::from_declared(&db_type);
        Self {
            name: name.into(),
            value_type: value_type_of(sql_type).to_string(),
            db_type,
            sql_type,
        }
    }
}

fn value_type_of(ty: SqlType) -> &'static str {
    use SqlType::*;

    match ty {
        BigInt | Integer | SmallInt | TinyInt => "I64",
        Double | Float | Real | Decimal | Numeric => "F64",
        Bit | Boolean => "Bool",
        Binary | VarBinary | LongVarBinary | Blob => "Bytes",
        Null => "Null",
        _ => "String",
    }
}

/// A cursor over rows that have already been materialized.
#[derive(Debug)]
pub struct MemoryCursor {
    columns: Vec<ResultColumn>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(columns: Vec<ResultColumn>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::driver_operation_failed(std::io::Error::new(
                std::io::ErrorKind::Other,
                "result set is closed",
            )))
        } else {
            Ok(())
        }
    }
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;

        let next = self.position.map_or(0, |pos| pos + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn get(&self, index: usize) -> Result<Value> {
        self.check_open()?;

        let row = self
            .position
            .and_then(|pos| self.rows.get(pos))
            .ok_or_else(|| {
                Error::driver_operation_failed(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "result set is not positioned on a row",
                ))
            })?;

        row.get(index).cloned().ok_or_else(|| {
            Error::driver_operation_failed(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("column index {index} out of range"),
            ))
        })
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor() -> MemoryCursor {
        MemoryCursor::new(
            vec![ResultColumn::new("ID", "INTEGER"), ResultColumn::new("NAME", "TEXT")],
            vec![vec![Value::from(1), Value::from("Alice")]],
        )
    }

    #[test]
    fn next_then_exhausted() {
        let mut cursor = cursor();
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.get(0).unwrap(), Value::from(1));
        assert_eq!(cursor.get(1).unwrap(), Value::from("Alice"));
        assert!(!cursor.next().unwrap());
        assert!(!cursor.next().unwrap());
    }

    #[test]
    fn get_before_next_fails() {
        assert!(cursor().get(0).unwrap_err().is_driver_operation_failed());
    }

    #[test]
    fn closed_cursor_fails() {
        let mut cursor = cursor();
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(cursor.next().is_err());
    }

    #[test]
    fn value_types_follow_sql_types() {
        let cursor = cursor();
        let types: Vec<_> = cursor.columns().iter().map(|c| c.value_type.as_str()).collect();
        assert_eq!(types, ["I64", "String"]);
    }
}
