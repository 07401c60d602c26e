use crate::stmt::{SqlType, Value};

use std::fmt;

/// Identifies a statement parameter: a 1-based position or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamTarget {
    Index(usize),
    Name(String),
}

/// A bound input parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub target: ParamTarget,
    pub value: Value,

    /// Type the value should be bound as, when the caller named one.
    pub ty: Option<SqlType>,

    /// Scale for decimal types.
    pub scale: Option<u32>,
}

/// A registered output parameter of a callable statement.
#[derive(Debug, Clone, PartialEq)]
pub struct OutParam {
    pub target: ParamTarget,
    pub ty: SqlType,
    pub scale: Option<u32>,
}

impl Param {
    pub fn new(target: ParamTarget, value: impl Into<Value>) -> Self {
        Self {
            target,
            value: value.into(),
            ty: None,
            scale: None,
        }
    }

    pub fn typed(mut self, ty: SqlType, scale: Option<u32>) -> Self {
        self.ty = Some(ty);
        self.scale = scale;
        self
    }
}

impl From<usize> for ParamTarget {
    fn from(index: usize) -> Self {
        ParamTarget::Index(index)
    }
}

impl From<&str> for ParamTarget {
    fn from(name: &str) -> Self {
        ParamTarget::Name(name.to_string())
    }
}

impl fmt::Display for ParamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamTarget::Index(index) => write!(f, "{index}"),
            ParamTarget::Name(name) => f.write_str(name),
        }
    }
}
