use std::fmt;

/// Standard SQL/CLI data type codes.
///
/// The numeric codes are the ones reported by database metadata and
/// accepted when binding statement parameters. Scripts may name a type
/// either by code or by its canonical name (`"VARCHAR"`, `"INTEGER"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Array,
    BigInt,
    Binary,
    Bit,
    Blob,
    Boolean,
    Char,
    Clob,
    Datalink,
    Date,
    Decimal,
    Distinct,
    Double,
    Float,
    Integer,
    JavaObject,
    LongVarBinary,
    LongVarChar,
    Null,
    Numeric,
    Other,
    Real,
    Ref,
    SmallInt,
    Struct,
    Time,
    Timestamp,
    TinyInt,
    VarBinary,
    VarChar,
}

/// Canonical name table, sorted by name for binary search.
const BY_NAME: &[(&str, SqlType)] = &[
    ("ARRAY", SqlType::Array),
    ("BIGINT", SqlType::BigInt),
    ("BINARY", SqlType::Binary),
    ("BIT", SqlType::Bit),
    ("BLOB", SqlType::Blob),
    ("BOOLEAN", SqlType::Boolean),
    ("CHAR", SqlType::Char),
    ("CLOB", SqlType::Clob),
    ("DATALINK", SqlType::Datalink),
    ("DATE", SqlType::Date),
    ("DECIMAL", SqlType::Decimal),
    ("DISTINCT", SqlType::Distinct),
    ("DOUBLE", SqlType::Double),
    ("FLOAT", SqlType::Float),
    ("INTEGER", SqlType::Integer),
    ("JAVA_OBJECT", SqlType::JavaObject),
    ("LONGVARBINARY", SqlType::LongVarBinary),
    ("LONGVARCHAR", SqlType::LongVarChar),
    ("NULL", SqlType::Null),
    ("NUMERIC", SqlType::Numeric),
    ("OTHER", SqlType::Other),
    ("REAL", SqlType::Real),
    ("REF", SqlType::Ref),
    ("SMALLINT", SqlType::SmallInt),
    ("STRUCT", SqlType::Struct),
    ("TIME", SqlType::Time),
    ("TIMESTAMP", SqlType::Timestamp),
    ("TINYINT", SqlType::TinyInt),
    ("VARBINARY", SqlType::VarBinary),
    ("VARCHAR", SqlType::VarChar),
];

impl SqlType {
    /// Every type, in name order.
    pub fn all() -> impl ExactSizeIterator<Item = SqlType> {
        BY_NAME.iter().map(|(_, ty)| *ty)
    }

    pub const fn code(self) -> i32 {
        match self {
            SqlType::Array => 2003,
            SqlType::BigInt => -5,
            SqlType::Binary => -2,
            SqlType::Bit => -7,
            SqlType::Blob => 2004,
            SqlType::Boolean => 16,
            SqlType::Char => 1,
            SqlType::Clob => 2005,
            SqlType::Datalink => 70,
            SqlType::Date => 91,
            SqlType::Decimal => 3,
            SqlType::Distinct => 2001,
            SqlType::Double => 8,
            SqlType::Float => 6,
            SqlType::Integer => 4,
            SqlType::JavaObject => 2000,
            SqlType::LongVarBinary => -4,
            SqlType::LongVarChar => -1,
            SqlType::Null => 0,
            SqlType::Numeric => 2,
            SqlType::Other => 1111,
            SqlType::Real => 7,
            SqlType::Ref => 2006,
            SqlType::SmallInt => 5,
            SqlType::Struct => 2002,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::TinyInt => -6,
            SqlType::VarBinary => -3,
            SqlType::VarChar => 12,
        }
    }

    pub fn name(self) -> &'static str {
        BY_NAME
            .iter()
            .find(|(_, ty)| *ty == self)
            .map(|(name, _)| *name)
            .unwrap_or("OTHER")
    }

    pub fn from_code(code: i32) -> Option<SqlType> {
        SqlType::all().find(|ty| ty.code() == code)
    }

    /// Looks up a canonical type name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<SqlType> {
        let upper = name.trim().to_ascii_uppercase();
        BY_NAME
            .binary_search_by(|(candidate, _)| (*candidate).cmp(upper.as_str()))
            .ok()
            .map(|i| BY_NAME[i].1)
    }

    /// Best-effort mapping of a declared column type (`"VARCHAR(40)"`,
    /// `"int"`, ...) onto a type code, following SQLite's affinity rules for
    /// names that are not canonical.
    pub fn from_declared(declared: &str) -> SqlType {
        let base = declared
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();

        if let Some(ty) = SqlType::from_name(&base) {
            return ty;
        }

        match base.as_str() {
            "" => SqlType::Other,
            "INT" | "MEDIUMINT" => SqlType::Integer,
            "INT8" | "UNSIGNED BIG INT" => SqlType::BigInt,
            "INT2" => SqlType::SmallInt,
            "TEXT" | "CHARACTER VARYING" | "NVARCHAR" | "VARYING CHARACTER" => SqlType::VarChar,
            "CHARACTER" | "NCHAR" | "NATIVE CHARACTER" => SqlType::Char,
            "DOUBLE PRECISION" => SqlType::Double,
            "DATETIME" => SqlType::Timestamp,
            "BOOL" => SqlType::Boolean,
            other if other.contains("INT") => SqlType::Integer,
            other if other.contains("CHAR") || other.contains("TEXT") => SqlType::VarChar,
            other if other.contains("BLOB") => SqlType::Blob,
            other if other.contains("REAL") || other.contains("FLOA") || other.contains("DOUB") => {
                SqlType::Double
            }
            _ => SqlType::Numeric,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
