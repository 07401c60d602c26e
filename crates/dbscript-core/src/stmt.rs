mod sql_type;
pub use sql_type::SqlType;

mod value;
pub use value::Value;

mod value_cmp;
pub(crate) use value_cmp::key_matches;
