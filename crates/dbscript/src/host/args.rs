use crate::script::Dynamic;
use dbscript_core::{
    driver::ParamTarget,
    stmt::{SqlType, Value},
    Error, Result,
};

/// Checked access to a host method's arguments.
///
/// Every failure is an invalid-argument error naming `signature`.
pub(crate) struct Args<'a> {
    signature: &'static str,
    args: &'a [Dynamic],
}

impl<'a> Args<'a> {
    pub(crate) fn new(signature: &'static str, args: &'a [Dynamic]) -> Self {
        Self { signature, args }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        Error::invalid_argument(self.signature, message)
    }

    pub(crate) fn len(&self) -> usize {
        self.args.len()
    }

    pub(crate) fn expect_len(&self, min: usize, max: usize) -> Result<()> {
        let len = self.args.len();
        if (min..=max).contains(&len) {
            return Ok(());
        }
        Err(self.error(match (min == max, min) {
            (true, 0) => format!("takes no arguments, got {len}"),
            (true, 1) => format!("expected 1 argument, got {len}"),
            (true, _) => format!("expected {min} arguments, got {len}"),
            (false, _) => format!("expected {min} to {max} arguments, got {len}"),
        }))
    }

    pub(crate) fn get(&self, position: usize) -> Result<&'a Dynamic> {
        self.args
            .get(position)
            .ok_or_else(|| self.error(format!("missing argument {}", position + 1)))
    }

    pub(crate) fn rest(&self, from: usize) -> &'a [Dynamic] {
        self.args.get(from..).unwrap_or_default()
    }

    pub(crate) fn int(&self, position: usize) -> Result<i64> {
        let arg = self.get(position)?;
        arg.as_i64().ok_or_else(|| {
            self.error(format!(
                "argument {} must be an integer, got {}",
                position + 1,
                arg.describe()
            ))
        })
    }

    /// A non-negative integer.
    pub(crate) fn index(&self, position: usize) -> Result<usize> {
        let int = self.int(position)?;
        usize::try_from(int).map_err(|_| {
            self.error(format!(
                "argument {} must not be negative, got {int}",
                position + 1
            ))
        })
    }

    pub(crate) fn string(&self, position: usize) -> Result<&'a str> {
        let arg = self.get(position)?;
        arg.as_str().ok_or_else(|| {
            self.error(format!(
                "argument {} must be a string, got {}",
                position + 1,
                arg.describe()
            ))
        })
    }

    pub(crate) fn optional_bool(&self, position: usize, default: bool) -> bool {
        match self.args.get(position) {
            None | Some(Dynamic::Undefined) => default,
            Some(arg) => arg.is_truthy(),
        }
    }

    pub(crate) fn value(&self, position: usize) -> Result<Value> {
        self.get(position)?
            .to_value()
            .map_err(|err| self.error(format!("argument {}: {err}", position + 1)))
    }

    /// A statement parameter specifier: a 1-based position or a name.
    pub(crate) fn param_target(&self, position: usize) -> Result<ParamTarget> {
        match self.get(position)? {
            Dynamic::Str(name) => Ok(ParamTarget::Name(name.to_string())),
            arg => match arg.as_i64() {
                Some(index) if index >= 1 => Ok(ParamTarget::Index(index as usize)),
                _ => Err(self.error(format!(
                    "argument {} must be a parameter position (1-based) or name, got {arg}",
                    position + 1
                ))),
            },
        }
    }

    /// A type given as a numeric code or a canonical name.
    pub(crate) fn sql_type(&self, position: usize) -> Result<SqlType> {
        let arg = self.get(position)?;
        let ty = match arg {
            Dynamic::Str(name) => SqlType::from_name(name),
            other => other.as_i64().and_then(|code| i32::try_from(code).ok()).and_then(SqlType::from_code),
        };
        ty.ok_or_else(|| self.error(format!("unknown SQL type `{arg}`")))
    }

    /// An optional non-negative scale.
    pub(crate) fn optional_scale(&self, position: usize) -> Result<Option<u32>> {
        match self.args.get(position) {
            None | Some(Dynamic::Undefined | Dynamic::Null) => Ok(None),
            Some(_) => {
                let scale = self.index(position)?;
                u32::try_from(scale)
                    .map(Some)
                    .map_err(|_| self.error(format!("scale {scale} is too large")))
            }
        }
    }

    /// The key components starting at `from`: one value per argument, or a
    /// single array or array-like host object holding the components.
    pub(crate) fn key(&self, from: usize) -> Result<Vec<Value>> {
        let rest = self.rest(from);
        let components: Vec<Dynamic> = match rest {
            [Dynamic::Array(items)] => items.borrow().clone(),
            [Dynamic::Host(object)] if object.has("length") => {
                let len = object
                    .get("length")?
                    .and_then(|len| len.as_i64())
                    .unwrap_or_default();
                (0..len)
                    .map(|i| object.get_index(i).map(Option::unwrap_or_default))
                    .collect::<Result<_>>()?
            }
            _ => rest.to_vec(),
        };

        if components.is_empty() {
            return Err(self.error("missing key components"));
        }

        components
            .iter()
            .map(|component| {
                component
                    .to_value()
                    .map_err(|err| self.error(format!("key component: {err}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ValueArray;
    use pretty_assertions::assert_eq;

    #[test]
    fn arity_messages_name_signature() {
        let args = [Dynamic::Int(1)];
        let err = Args::new("row2pk(row)", &args).expect_len(0, 0).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument: row2pk(row): takes no arguments, got 1");
    }

    #[test]
    fn key_forms() {
        let single = [Dynamic::Int(7)];
        assert_eq!(Args::new("pk2row(key)", &single).key(0).unwrap(), vec![Value::I64(7)]);

        let spread = [Dynamic::Int(0), Dynamic::Int(1), Dynamic::from("a")];
        assert_eq!(
            Args::new("fk2rows(fk, key)", &spread).key(1).unwrap(),
            vec![Value::I64(1), Value::from("a")]
        );

        let array = [Dynamic::array(vec![Dynamic::Int(1), Dynamic::Null])];
        assert_eq!(
            Args::new("pk2row(key)", &array).key(0).unwrap(),
            vec![Value::I64(1), Value::Null]
        );

        let host = [Dynamic::host(ValueArray::from_values(vec![Value::I64(3)]))];
        assert_eq!(Args::new("pk2row(key)", &host).key(0).unwrap(), vec![Value::I64(3)]);

        assert!(Args::new("pk2row(key)", &[]).key(0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn parameter_specifiers() {
        let args = [Dynamic::Int(2), Dynamic::from("name"), Dynamic::Int(0)];
        let args = Args::new("setObject(parameter, value)", &args);
        assert_eq!(args.param_target(0).unwrap(), ParamTarget::Index(2));
        assert_eq!(args.param_target(1).unwrap(), ParamTarget::Name("name".into()));
        assert!(args.param_target(2).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn type_specifiers() {
        let args = [Dynamic::from("varchar"), Dynamic::Int(4), Dynamic::from("NOPE"), Dynamic::Int(12345)];
        let args = Args::new("registerOutParameter(parameter, type)", &args);
        assert_eq!(args.sql_type(0).unwrap(), SqlType::VarChar);
        assert_eq!(args.sql_type(1).unwrap(), SqlType::Integer);
        assert!(args.sql_type(2).is_err());
        assert!(args.sql_type(3).is_err());
    }
}
