mod catalog;
pub use catalog::{Catalog, Related};

mod row_model;
pub use row_model::{CellEdit, RowModel, RowState};

mod table_handle;
pub use table_handle::TableHandle;
