//! Relational objects presented to scripts as dynamic objects.
//!
//! Every wrapper implements [`HostObject`]: properties by name or index,
//! `in`-style membership, assignment, deletion, enumeration and a display
//! form. Wrappers own no data beyond what they capture; tables and rows go
//! through the shared [`TableHandle`](dbscript_core::TableHandle).

mod args;
pub(crate) use args::Args;

mod array;
pub use array::ValueArray;

mod connection;
pub use connection::ConnectionObject;

#[cfg(test)]
mod fixture;

mod result_set;
pub use result_set::ResultSetObject;

mod row;
pub use row::RowObject;

mod statement;
pub use statement::{StatementKind, StatementObject};

mod table;
pub use table::TableObject;

use crate::script::Dynamic;
use dbscript_core::{Error, Result};

use std::fmt;

/// The dynamic-property contract shared by every host object.
///
/// Property and method names are kept in static, sorted tables so `has` and
/// enumeration are binary searches and slice copies.
pub trait HostObject: fmt::Debug {
    /// Name used in diagnostics.
    fn class_name(&self) -> &'static str;

    /// Sorted names of the fixed, non-method properties.
    fn properties(&self) -> &'static [&'static str] {
        &[]
    }

    /// Sorted method names.
    fn methods(&self) -> &'static [&'static str] {
        &[]
    }

    /// Reads a named property. `Ok(None)` means "not found", which scripts
    /// observe as `undefined`; `Err` is a failure to produce the value.
    fn get(&self, name: &str) -> Result<Option<Dynamic>>;

    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        let _ = index;
        Ok(None)
    }

    fn has(&self, name: &str) -> bool {
        contains(self.properties(), name) || contains(self.methods(), name)
    }

    fn has_index(&self, index: i64) -> bool {
        let _ = index;
        false
    }

    fn put(&self, name: &str, value: Dynamic) -> Result<()> {
        let _ = value;
        Err(Error::unsupported(format!(
            "cannot assign property `{name}` of {}",
            self.class_name()
        )))
    }

    fn put_index(&self, index: i64, value: Dynamic) -> Result<()> {
        let _ = value;
        Err(Error::unsupported(format!(
            "cannot assign index {index} of {}",
            self.class_name()
        )))
    }

    /// Removes a property. Returns whether something was removed.
    fn delete(&self, name: &str) -> Result<bool> {
        let _ = name;
        Ok(false)
    }

    /// Names visited by `for (name in object)`, in order.
    fn names(&self) -> Result<Vec<String>> {
        Ok(self.properties().iter().map(|name| name.to_string()).collect())
    }

    fn invoke(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic> {
        let _ = args;
        Err(Error::unsupported(format!(
            "{} has no method `{method}`",
            self.class_name()
        )))
    }

    fn to_display_string(&self) -> String {
        format!("[{}]", self.class_name())
    }
}

/// Whether `name` is in a sorted name table.
pub(crate) fn contains(table: &[&str], name: &str) -> bool {
    table.binary_search(&name).is_ok()
}

/// Whether `object` has a method called `name`.
pub fn has_method(object: &dyn HostObject, name: &str) -> bool {
    contains(object.methods(), name)
}

/// Index enumeration shared by the array-like objects.
pub(crate) fn index_names(len: usize) -> Vec<String> {
    (0..len).map(|i| i.to_string()).collect()
}

#[cfg(test)]
pub(crate) fn assert_sorted(table: &[&str]) {
    let mut sorted = table.to_vec();
    sorted.sort_unstable();
    assert_eq!(table, &sorted[..], "name table must be sorted");
}
