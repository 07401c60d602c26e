use super::{Cursor, ParamTarget};
use crate::stmt::Value;

/// The two possible outcomes of executing a statement.
#[derive(Debug)]
pub enum Response {
    /// Number of rows impacted by the statement
    Count(u64),

    /// The statement produced a result set
    Cursor(Box<dyn Cursor>),
}

/// Outcome of a callable statement: the statement's own response plus the
/// values of its registered output parameters.
#[derive(Debug)]
pub struct CallResponse {
    pub response: Response,
    pub out_values: Vec<(ParamTarget, Value)>,
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self::Count(count)
    }

    pub fn cursor(cursor: impl Cursor + 'static) -> Self {
        Self::Cursor(Box::new(cursor))
    }

    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::Cursor(_))
    }

    #[track_caller]
    pub fn into_count(self) -> u64 {
        match self {
            Response::Count(count) => count,
            _ => todo!("response={self:#?}"),
        }
    }

    #[track_caller]
    pub fn into_cursor(self) -> Box<dyn Cursor> {
        match self {
            Response::Cursor(cursor) => cursor,
            _ => todo!("response={self:#?}"),
        }
    }
}
