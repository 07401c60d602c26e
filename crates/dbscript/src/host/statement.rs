use super::{Args, HostObject, ResultSetObject};
use crate::script::Dynamic;
use dbscript_core::{
    driver::{OutParam, Param, ParamTarget, Response},
    stmt::Value,
    Connection, Error, Result,
};

use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};
use tracing::debug;

/// Which statement flavour a [`StatementObject`] presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SQL is passed to `execute(sql)`
    Plain,

    /// SQL fixed at creation, with bound input parameters
    Prepared,

    /// Prepared, plus registered output parameters
    Callable,
}

/// A statement created through `db.createStatement()`, `db.prepareStatement()`
/// or `db.prepareCall()`.
#[derive(Debug)]
pub struct StatementObject {
    connection: Arc<dyn Connection>,
    kind: StatementKind,
    sql: Option<String>,
    params: RefCell<Vec<Param>>,
    out_params: RefCell<Vec<OutParam>>,
    out_values: RefCell<Vec<(ParamTarget, Value)>>,
    closed: Cell<bool>,
}

const PROPERTIES: &[&str] = &["closed", "sql"];

const PLAIN_METHODS: &[&str] = &["close", "execute"];

const PREPARED_METHODS: &[&str] = &["clearParameters", "close", "execute", "setObject"];

const CALLABLE_METHODS: &[&str] = &[
    "clearParameters",
    "close",
    "execute",
    "getObject",
    "registerOutParameter",
    "setObject",
];

impl StatementObject {
    pub fn new(connection: Arc<dyn Connection>, kind: StatementKind, sql: Option<String>) -> Self {
        Self {
            connection,
            kind,
            sql,
            params: RefCell::default(),
            out_params: RefCell::default(),
            out_values: RefCell::default(),
            closed: Cell::new(false),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    fn check_open(&self, signature: &'static str) -> Result<()> {
        if self.closed.get() {
            return Err(Error::invalid_argument(signature, "statement is closed"));
        }
        Ok(())
    }

    fn execute(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let response = match self.kind {
            StatementKind::Plain => {
                let args = Args::new("execute(sql)", args);
                args.expect_len(1, 1)?;
                self.check_open("execute(sql)")?;
                let sql = args.string(0)?;
                debug!(sql, "executing statement");
                self.connection.execute(sql, &[])?
            }
            StatementKind::Prepared => {
                Args::new("execute()", args).expect_len(0, 0)?;
                self.check_open("execute()")?;
                let sql = self.sql.as_deref().unwrap_or_default();
                let params = self.params.borrow();
                debug!(sql, params = params.len(), "executing prepared statement");
                self.connection.execute(sql, &params)?
            }
            StatementKind::Callable => {
                Args::new("execute()", args).expect_len(0, 0)?;
                self.check_open("execute()")?;
                let sql = self.sql.as_deref().unwrap_or_default();
                debug!(sql, "executing callable statement");
                let call = self
                    .connection
                    .call(sql, &self.params.borrow(), &self.out_params.borrow())?;
                *self.out_values.borrow_mut() = call.out_values;
                call.response
            }
        };

        Ok(match response {
            Response::Count(count) => Dynamic::Int(i64::try_from(count).unwrap_or(i64::MAX)),
            Response::Cursor(cursor) => Dynamic::host(ResultSetObject::new(cursor)),
        })
    }

    fn set_object(&self, args: &[Dynamic]) -> Result<()> {
        let args = Args::new("setObject(parameter, value[, type[, scale]])", args);
        args.expect_len(2, 4)?;

        let mut param = Param::new(args.param_target(0)?, args.value(1)?);
        if args.len() > 2 {
            param = param.typed(args.sql_type(2)?, args.optional_scale(3)?);
        }

        let mut params = self.params.borrow_mut();
        match params.iter_mut().find(|bound| bound.target == param.target) {
            Some(bound) => *bound = param,
            None => params.push(param),
        }
        Ok(())
    }

    fn register_out_parameter(&self, args: &[Dynamic]) -> Result<()> {
        let args = Args::new("registerOutParameter(parameter, type[, scale])", args);
        args.expect_len(2, 3)?;

        let out = OutParam {
            target: args.param_target(0)?,
            ty: args.sql_type(1)?,
            scale: args.optional_scale(2)?,
        };

        let mut out_params = self.out_params.borrow_mut();
        match out_params.iter_mut().find(|registered| registered.target == out.target) {
            Some(registered) => *registered = out,
            None => out_params.push(out),
        }
        Ok(())
    }

    fn out_value(&self, target: &ParamTarget) -> Option<Dynamic> {
        self.out_values
            .borrow()
            .iter()
            .find(|(registered, _)| match (registered, target) {
                (ParamTarget::Name(a), ParamTarget::Name(b)) => a.eq_ignore_ascii_case(b),
                (a, b) => a == b,
            })
            .map(|(_, value)| Dynamic::from(value.clone()))
    }
}

impl HostObject for StatementObject {
    fn class_name(&self) -> &'static str {
        match self.kind {
            StatementKind::Plain => "Statement",
            StatementKind::Prepared => "PreparedStatement",
            StatementKind::Callable => "CallableStatement",
        }
    }

    fn properties(&self) -> &'static [&'static str] {
        PROPERTIES
    }

    fn methods(&self) -> &'static [&'static str] {
        match self.kind {
            StatementKind::Plain => PLAIN_METHODS,
            StatementKind::Prepared => PREPARED_METHODS,
            StatementKind::Callable => CALLABLE_METHODS,
        }
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        Ok(match name {
            "closed" => Some(Dynamic::Bool(self.closed.get())),
            "sql" => Some(self.sql.as_deref().map_or(Dynamic::Null, Dynamic::from)),
            _ if self.kind == StatementKind::Callable => self.out_value(&ParamTarget::Name(name.to_string())),
            _ => None,
        })
    }

    /// Output parameters by 1-based position, after `execute()`.
    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        Ok(match usize::try_from(index) {
            Ok(index) if self.kind == StatementKind::Callable => self.out_value(&ParamTarget::Index(index)),
            _ => None,
        })
    }

    fn has_index(&self, index: i64) -> bool {
        matches!(self.get_index(index), Ok(Some(_)))
    }

    fn invoke(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic> {
        match method {
            "execute" => self.execute(args),
            "close" => {
                Args::new("close()", args).expect_len(0, 0)?;
                self.closed.set(true);
                Ok(Dynamic::Undefined)
            }
            "setObject" => {
                self.set_object(args)?;
                Ok(Dynamic::Undefined)
            }
            "clearParameters" => {
                Args::new("clearParameters()", args).expect_len(0, 0)?;
                self.params.borrow_mut().clear();
                Ok(Dynamic::Undefined)
            }
            "registerOutParameter" => {
                self.register_out_parameter(args)?;
                Ok(Dynamic::Undefined)
            }
            "getObject" => {
                let args = Args::new("getObject(parameter)", args);
                args.expect_len(1, 1)?;
                Ok(self.out_value(&args.param_target(0)?).unwrap_or_default())
            }
            _ => Err(Error::unsupported(format!(
                "{} has no method `{method}`",
                self.class_name()
            ))),
        }
    }

    fn to_display_string(&self) -> String {
        match &self.sql {
            Some(sql) => format!("{}({sql})", self.class_name()),
            None => self.class_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::assert_sorted;
    use dbscript_core::{
        driver::{CallResponse, MemoryCursor, ResultColumn, RowEdit},
        schema::Table,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    #[derive(Debug, Default)]
    struct Recorder {
        executed: Mutex<Vec<(String, Vec<Param>)>>,
    }

    impl Connection for Recorder {
        fn url(&self) -> Cow<'_, str> {
            Cow::Borrowed("recorder:")
        }

        fn table_names(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        fn table_metadata(&self, name: &str) -> Result<Table> {
            Ok(Table::new(name))
        }

        fn execute(&self, sql: &str, params: &[Param]) -> Result<Response> {
            self.executed.lock().push((sql.to_string(), params.to_vec()));
            if sql.starts_with("SELECT") {
                Ok(Response::cursor(MemoryCursor::new(
                    vec![ResultColumn::new("ID", "INTEGER")],
                    vec![vec![Value::I64(1)]],
                )))
            } else {
                Ok(Response::count(3))
            }
        }

        fn call(&self, _sql: &str, _params: &[Param], out: &[OutParam]) -> Result<CallResponse> {
            Ok(CallResponse {
                response: Response::count(0),
                out_values: out
                    .iter()
                    .map(|out| (out.target.clone(), Value::from("out")))
                    .collect(),
            })
        }

        fn load_rows(&self, _table: &Table) -> Result<Vec<Vec<Value>>> {
            Ok(vec![])
        }

        fn apply_edits(&self, _table: &Table, _key: &[usize], _edits: &[RowEdit]) -> Result<()> {
            Ok(())
        }
    }

    fn statement(kind: StatementKind, sql: Option<&str>) -> (StatementObject, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let statement = StatementObject::new(recorder.clone(), kind, sql.map(str::to_string));
        (statement, recorder)
    }

    #[test]
    fn plain_execute_returns_count_or_result_set() {
        let (statement, _) = statement(StatementKind::Plain, None);

        let count = statement.invoke("execute", &[Dynamic::from("DELETE FROM t")]).unwrap();
        assert_eq!(count, Dynamic::Int(3));

        let rs = statement.invoke("execute", &[Dynamic::from("SELECT ID FROM t")]).unwrap();
        assert_eq!(rs.as_host().map(|rs| rs.class_name()), Some("ResultSet"));

        let err = statement.invoke("execute", &[]).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: execute(sql): expected 1 argument, got 0");
    }

    #[test]
    fn prepared_parameters() {
        let (statement, recorder) = statement(StatementKind::Prepared, Some("UPDATE t SET a = ? WHERE b = ?"));

        statement.invoke("setObject", &[Dynamic::Int(1), Dynamic::from("x")]).unwrap();
        statement
            .invoke("setObject", &[Dynamic::Int(2), Dynamic::Int(5), Dynamic::from("BIGINT")])
            .unwrap();
        statement.invoke("setObject", &[Dynamic::Int(1), Dynamic::from("y")]).unwrap();
        statement.invoke("execute", &[]).unwrap();

        let executed = recorder.executed.lock();
        assert_eq!(
            executed[0].1,
            vec![
                Param::new(ParamTarget::Index(1), "y"),
                Param::new(ParamTarget::Index(2), 5i64).typed(dbscript_core::stmt::SqlType::BigInt, None),
            ]
        );
        drop(executed);

        statement.invoke("clearParameters", &[]).unwrap();
        statement.invoke("execute", &[]).unwrap();
        assert!(recorder.executed.lock()[1].1.is_empty());
    }

    #[test]
    fn bad_arguments_are_reported() {
        let (statement, _) = statement(StatementKind::Prepared, Some("SELECT 1"));
        let err = statement.invoke("setObject", &[Dynamic::Int(0), Dynamic::Int(1)]).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = statement
            .invoke("setObject", &[Dynamic::Int(1), Dynamic::Int(1), Dynamic::from("WIDGET")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: setObject(parameter, value[, type[, scale]]): unknown SQL type `WIDGET`"
        );
    }

    #[test]
    fn callable_out_parameters() {
        let (statement, _) = statement(StatementKind::Callable, Some("{call p(?, ?)}"));
        statement
            .invoke("registerOutParameter", &[Dynamic::Int(2), Dynamic::Int(12)])
            .unwrap();
        statement
            .invoke("registerOutParameter", &[Dynamic::from("total"), Dynamic::from("INTEGER")])
            .unwrap();

        assert!(!statement.has_index(2));
        statement.invoke("execute", &[]).unwrap();

        assert_eq!(statement.get_index(2).unwrap(), Some(Dynamic::from("out")));
        assert_eq!(statement.get("TOTAL").unwrap(), Some(Dynamic::from("out")));
        assert_eq!(statement.invoke("getObject", &[Dynamic::Int(2)]).unwrap(), Dynamic::from("out"));
        assert!(statement.get_index(1).unwrap().is_none());
    }

    #[test]
    fn closed_statements_refuse_to_execute() {
        let (statement, _) = statement(StatementKind::Prepared, Some("SELECT 1"));
        statement.invoke("close", &[]).unwrap();
        assert_eq!(statement.get("closed").unwrap(), Some(Dynamic::Bool(true)));
        assert!(statement.invoke("execute", &[]).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn name_tables_are_sorted() {
        assert_sorted(PROPERTIES);
        assert_sorted(PLAIN_METHODS);
        assert_sorted(PREPARED_METHODS);
        assert_sorted(CALLABLE_METHODS);
    }
}
