use super::{ast::FunctionDef, scope::Scope, Flow, Interpreter};
use crate::host::HostObject;
use dbscript_core::{stmt::Value, Error, Result};

use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc};

/// A script value.
///
/// Composite values are reference counted and shared, as in JavaScript:
/// assigning an array to a second variable aliases it.
#[derive(Clone, Default)]
pub enum Dynamic {
    /// "Not found" or "no result"
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    Array(Rc<RefCell<Vec<Dynamic>>>),
    Object(Rc<RefCell<IndexMap<String, Dynamic>>>),
    Function(Rc<Closure>),
    Native(Rc<NativeFunction>),
    Host(Rc<dyn HostObject>),

    /// A host object method read as a property, callable later
    Method(Rc<dyn HostObject>, &'static str),
}

/// A script function together with the scope it was created in.
pub struct Closure {
    pub(crate) def: Rc<FunctionDef>,
    pub(crate) scope: Rc<Scope>,
}

/// A function implemented by the interpreter, such as `println`.
pub struct NativeFunction {
    pub(crate) name: &'static str,
    pub(crate) func: fn(&mut Interpreter, &[Dynamic]) -> Flow<Dynamic>,
}

impl Dynamic {
    pub fn string(s: impl AsRef<str>) -> Dynamic {
        Dynamic::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Dynamic>) -> Dynamic {
        Dynamic::Array(Rc::new(RefCell::new(items)))
    }

    pub fn host(object: impl HostObject + 'static) -> Dynamic {
        Dynamic::Host(Rc::new(object))
    }

    pub(crate) fn native(
        name: &'static str,
        func: fn(&mut Interpreter, &[Dynamic]) -> Flow<Dynamic>,
    ) -> Dynamic {
        Dynamic::Native(Rc::new(NativeFunction { name, func }))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Dynamic::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Dynamic::Undefined | Dynamic::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Dynamic::Function(_) | Dynamic::Native(_) | Dynamic::Method(..)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integral value of a number, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Dynamic::Int(v) => Some(v),
            Dynamic::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&Rc<dyn HostObject>> {
        match self {
            Dynamic::Host(object) => Some(object),
            _ => None,
        }
    }

    /// The name reported by `typeof`.
    pub fn type_of(&self) -> &'static str {
        match self {
            Dynamic::Undefined => "undefined",
            Dynamic::Bool(_) => "boolean",
            Dynamic::Int(_) | Dynamic::Float(_) => "number",
            Dynamic::Str(_) => "string",
            Dynamic::Function(_) | Dynamic::Native(_) | Dynamic::Method(..) => "function",
            Dynamic::Null
            | Dynamic::Bytes(_)
            | Dynamic::Array(_)
            | Dynamic::Object(_)
            | Dynamic::Host(_) => "object",
        }
    }

    /// A short description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Dynamic::Host(object) => object.class_name().to_string(),
            Dynamic::Array(_) => "array".to_string(),
            Dynamic::Null => "null".to_string(),
            Dynamic::Bytes(_) => "bytes".to_string(),
            other => other.type_of().to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Dynamic::Undefined | Dynamic::Null => false,
            Dynamic::Bool(v) => *v,
            Dynamic::Int(v) => *v != 0,
            Dynamic::Float(v) => *v != 0.0 && !v.is_nan(),
            Dynamic::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Numeric conversion with JavaScript's rules; `NaN` when there is no
    /// sensible number.
    pub fn to_number(&self) -> f64 {
        match self {
            Dynamic::Null => 0.0,
            Dynamic::Bool(v) => f64::from(u8::from(*v)),
            Dynamic::Int(v) => *v as f64,
            Dynamic::Float(v) => *v,
            Dynamic::Str(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// Like [`to_number`](Self::to_number) but keeps integers integral.
    pub(crate) fn to_numeric(&self) -> Dynamic {
        match self {
            Dynamic::Int(v) => Dynamic::Int(*v),
            Dynamic::Bool(v) => Dynamic::Int(i64::from(*v)),
            Dynamic::Null => Dynamic::Int(0),
            Dynamic::Str(s) => match s.trim().parse::<i64>() {
                Ok(v) => Dynamic::Int(v),
                Err(_) => Dynamic::Float(self.to_number()),
            },
            other => Dynamic::Float(other.to_number()),
        }
    }

    /// Converts to a column value, for binding parameters and editing rows.
    pub fn to_value(&self) -> Result<Value> {
        Ok(match self {
            Dynamic::Undefined | Dynamic::Null => Value::Null,
            Dynamic::Bool(v) => Value::Bool(*v),
            Dynamic::Int(v) => Value::I64(*v),
            Dynamic::Float(v) => Value::F64(*v),
            Dynamic::Str(s) => Value::String(s.to_string()),
            Dynamic::Bytes(b) => Value::Bytes(b.to_vec()),
            other => {
                return Err(Error::evaluation(format!(
                    "a {} cannot be used as a column value",
                    other.describe()
                )))
            }
        })
    }

    /// Strict equality (`===`): no conversions, composites by identity.
    pub fn strict_eq(&self, other: &Dynamic) -> bool {
        use Dynamic::*;

        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Int(_) | Float(_), Int(_) | Float(_)) => self.to_number() == other.to_number(),
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Array(a), Array(b)) => Rc::ptr_eq(a, b),
            (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Native(a), Native(b)) => Rc::ptr_eq(a, b),
            (Host(a), Host(b)) => same_object(a, b),
            (Method(a, m), Method(b, n)) => same_object(a, b) && m == n,
            _ => false,
        }
    }

    /// Loose equality (`==`): `null == undefined`, numbers compare with
    /// strings and booleans numerically.
    pub fn loose_eq(&self, other: &Dynamic) -> bool {
        use Dynamic::*;

        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Int(_) | Float(_) | Bool(_), Str(_) | Bool(_))
            | (Str(_) | Bool(_), Int(_) | Float(_) | Bool(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_eq(other),
        }
    }
}

fn same_object(a: &Rc<dyn HostObject>, b: &Rc<dyn HostObject>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Formats a float the way JavaScript prints numbers.
fn fmt_float(v: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else if v.fract() == 0.0 && v.abs() < 1e21 {
        write!(f, "{v:.0}")
    } else {
        write!(f, "{v}")
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Undefined => f.write_str("undefined"),
            Dynamic::Null => f.write_str("null"),
            Dynamic::Bool(v) => write!(f, "{v}"),
            Dynamic::Int(v) => write!(f, "{v}"),
            Dynamic::Float(v) => fmt_float(*v, f),
            Dynamic::Str(s) => f.write_str(s),
            Dynamic::Bytes(b) => write!(f, "{}", Value::Bytes(b.to_vec())),
            Dynamic::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Dynamic::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Dynamic::Function(closure) => match &closure.def.name {
                Some(name) => write!(f, "[function {name}]"),
                None => f.write_str("[function]"),
            },
            Dynamic::Native(native) => write!(f, "[native function {}]", native.name),
            Dynamic::Host(object) => f.write_str(&object.to_display_string()),
            Dynamic::Method(object, name) => write!(f, "[method {}.{name}]", object.class_name()),
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Str(s) => write!(f, "{s:?}"),
            Dynamic::Host(object) => fmt::Debug::fmt(&**object, f),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Dynamic {
        match value {
            Value::Null => Dynamic::Null,
            Value::Bool(v) => Dynamic::Bool(v),
            Value::I64(v) => Dynamic::Int(v),
            Value::F64(v) => Dynamic::Float(v),
            Value::String(s) => Dynamic::Str(s.into()),
            Value::Bytes(b) => Dynamic::Bytes(b.into()),
        }
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Dynamic {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Dynamic {
        Dynamic::Int(value)
    }
}

impl From<usize> for Dynamic {
    fn from(value: usize) -> Dynamic {
        i64::try_from(value).map_or(Dynamic::Float(value as f64), Dynamic::Int)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Dynamic {
        Dynamic::Float(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Dynamic {
        Dynamic::string(value)
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Dynamic {
        Dynamic::Str(value.into())
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(value: Option<T>) -> Dynamic {
        value.map_or(Dynamic::Undefined, Into::into)
    }
}
