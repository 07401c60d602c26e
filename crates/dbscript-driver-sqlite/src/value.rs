use dbscript_core::{
    stmt::{self, SqlType},
    Error, Result,
};
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

#[derive(Debug)]
pub struct Value(stmt::Value);

impl From<stmt::Value> for Value {
    fn from(value: stmt::Value) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this SQLite driver value into the core value.
    pub fn into_inner(self) -> stmt::Value {
        self.0
    }

    /// Reads column `index` of `row`. Integers in boolean columns become
    /// booleans; everything else keeps SQLite's storage class.
    pub fn from_sql(row: &Row<'_>, index: usize, ty: SqlType) -> Result<Self> {
        let value = row
            .get_ref(index)
            .map_err(Error::driver_operation_failed)?;

        let core_value = match value {
            ValueRef::Null => stmt::Value::Null,
            ValueRef::Integer(value) => match ty {
                SqlType::Boolean | SqlType::Bit => stmt::Value::Bool(value != 0),
                _ => stmt::Value::I64(value),
            },
            ValueRef::Real(value) => stmt::Value::F64(value),
            ValueRef::Text(value) => stmt::Value::String(String::from_utf8_lossy(value).into_owned()),
            ValueRef::Blob(value) => stmt::Value::Bytes(value.to_vec()),
        };

        Ok(Value(core_value))
    }

    /// Converts a bound parameter to the type the caller asked for.
    pub fn coerce(value: stmt::Value, ty: SqlType) -> Result<Self> {
        use SqlType::*;

        let converted = match (ty, value) {
            (_, stmt::Value::Null) | (Null, _) => stmt::Value::Null,
            (BigInt | Integer | SmallInt | TinyInt, value) => match value {
                stmt::Value::I64(v) => stmt::Value::I64(v),
                stmt::Value::Bool(v) => stmt::Value::I64(v.into()),
                stmt::Value::F64(v) if v.fract() == 0.0 => stmt::Value::I64(v as i64),
                stmt::Value::String(v) => v
                    .trim()
                    .parse()
                    .map(stmt::Value::I64)
                    .map_err(|_| mismatch(&v, ty))?,
                other => return Err(mismatch(&other, ty)),
            },
            (Double | Float | Real | Decimal | Numeric, value) => match value {
                stmt::Value::I64(v) => stmt::Value::F64(v as f64),
                stmt::Value::F64(v) => stmt::Value::F64(v),
                stmt::Value::String(v) => v
                    .trim()
                    .parse()
                    .map(stmt::Value::F64)
                    .map_err(|_| mismatch(&v, ty))?,
                other => return Err(mismatch(&other, ty)),
            },
            (Bit | Boolean, value) => match value {
                stmt::Value::Bool(v) => stmt::Value::Bool(v),
                stmt::Value::I64(v) => stmt::Value::Bool(v != 0),
                other => return Err(mismatch(&other, ty)),
            },
            (Char | VarChar | LongVarChar | Clob, value) => match value {
                stmt::Value::String(v) => stmt::Value::String(v),
                stmt::Value::Bytes(v) => return Err(mismatch(&stmt::Value::Bytes(v), ty)),
                other => stmt::Value::String(other.to_string()),
            },
            (_, value) => value,
        };

        Ok(Value(converted))
    }
}

fn mismatch(value: &dyn std::fmt::Display, ty: SqlType) -> Error {
    Error::invalid_argument(
        "parameter binding",
        format!("cannot convert `{value}` to {ty}"),
    )
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use stmt::Value;

        match &self.0 {
            Value::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            Value::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            Value::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            Value::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            Value::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
        }
    }
}
