mod column;
pub use column::Column;

mod fk;
pub use fk::{ForeignKey, ForeignKeyField, KeyRule};

mod index;
pub use index::Index;

mod pk;
pub use pk::PrimaryKey;

mod table;
pub use table::Table;
