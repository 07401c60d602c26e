pub mod data;
pub use data::{Catalog, Related, RowModel, TableHandle};

pub mod driver;
pub use driver::Connection;

mod error;
pub use error::{Error, IntoError};

pub mod key;

pub mod schema;
pub use schema::Table;

pub mod stmt;

/// A Result type alias that uses dbscript's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
