use super::{index_names, HostObject};
use crate::script::Dynamic;
use dbscript_core::{stmt::Value, Error, Result};

use std::rc::Rc;

/// A fixed-size, read-only sequence.
///
/// Indexing past the end yields "not found" rather than an error, so
/// scripts can check with `a[i] === undefined` or `i in a`.
#[derive(Debug, Clone, Default)]
pub struct ValueArray {
    items: Rc<[Dynamic]>,
}

impl ValueArray {
    const PROPERTIES: &'static [&'static str] = &["length"];

    pub fn new(items: Vec<Dynamic>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(values.into_iter().map(Dynamic::from).collect())
    }

    pub fn from_strings<S: AsRef<str>>(strings: impl IntoIterator<Item = S>) -> Self {
        Self::new(strings.into_iter().map(|s| Dynamic::string(s)).collect())
    }

    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new(indices.into_iter().map(Dynamic::from).collect())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: i64) -> Option<&Dynamic> {
        usize::try_from(index).ok().and_then(|index| self.items.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dynamic> {
        self.items.iter()
    }
}

impl HostObject for ValueArray {
    fn class_name(&self) -> &'static str {
        "ValueArray"
    }

    fn properties(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        Ok(match name {
            "length" => Some(Dynamic::from(self.len())),
            _ => None,
        })
    }

    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        Ok(self.item(index).cloned())
    }

    fn has_index(&self, index: i64) -> bool {
        self.item(index).is_some()
    }

    fn put_index(&self, index: i64, _value: Dynamic) -> Result<()> {
        Err(Error::unsupported(format!(
            "cannot assign index {index}: ValueArray is read-only"
        )))
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(index_names(self.len()))
    }

    fn to_display_string(&self) -> String {
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::assert_sorted;
    use pretty_assertions::assert_eq;

    #[test]
    fn has_iff_in_range() {
        let array = ValueArray::from_values([Value::I64(1), Value::from("a")]);
        assert_eq!(array.len(), 2);

        assert!(!array.has_index(-1));
        assert!(array.has_index(0));
        assert!(array.has_index(1));
        assert!(!array.has_index(2));
        assert_eq!(array.item(0), Some(&Dynamic::Int(1)));
        assert_eq!(array.item(2), None);

        assert!(array.get_index(2).unwrap().is_none());
        assert!(array.get_index(-1).unwrap().is_none());
        assert_eq!(array.get_index(1).unwrap(), Some(Dynamic::from("a")));
    }

    #[test]
    fn length_and_names() {
        let array = ValueArray::from_indices([4, 9]);
        assert_eq!(array.get("length").unwrap(), Some(Dynamic::Int(2)));
        assert!(array.has("length"));
        assert!(array.get("size").unwrap().is_none());
        assert_eq!(array.names().unwrap(), vec!["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn read_only() {
        let array = ValueArray::from_strings(["x"]);
        assert!(array.put_index(0, Dynamic::Null).unwrap_err().is_unsupported());
        assert!(array.put("length", Dynamic::Int(3)).unwrap_err().is_unsupported());
    }

    #[test]
    fn display_form() {
        assert_eq!(ValueArray::from_values([Value::I64(7)]).to_display_string(), "[7]");
        assert_eq!(ValueArray::default().to_display_string(), "[]");
        assert_sorted(ValueArray::PROPERTIES);
    }
}
