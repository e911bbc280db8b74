//! Collection - Ordered, keyed container over model instances
//!
//! Used both as the return type of to-many relations and as the dictionary
//! source for the eager-load matching algorithm.

use std::collections::HashMap;

use crate::backends::DatabaseValue;
use crate::model::Model;

/// Ordered container of model instances
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    models: Vec<Model>,
}

impl Collection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Number of contained instances
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when the collection holds no instances
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Append an instance
    pub fn push(&mut self, model: Model) {
        self.models.push(model);
    }

    /// First instance, if any
    pub fn first(&self) -> Option<&Model> {
        self.models.first()
    }

    /// Instance at position `index`
    pub fn get(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    /// Iterate over contained instances
    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    /// Iterate mutably over contained instances
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Model> {
        self.models.iter_mut()
    }

    /// Take ownership of the contained instances
    pub fn take(&mut self) -> Vec<Model> {
        std::mem::take(&mut self.models)
    }

    /// Consume into the underlying vector
    pub fn into_inner(self) -> Vec<Model> {
        self.models
    }

    /// Project one column across all instances, in order.
    ///
    /// Instances missing the column contribute `Null`.
    pub fn pluck(&self, column: &str) -> Vec<DatabaseValue> {
        self.models
            .iter()
            .map(|m| m.attribute(column).cloned().unwrap_or(DatabaseValue::Null))
            .collect()
    }

    /// Project one column as stable string keys, skipping null and missing
    /// values
    pub fn pluck_string(&self, column: &str) -> Vec<String> {
        self.models
            .iter()
            .filter_map(|m| m.key_value(column).map(|v| v.as_key()))
            .collect()
    }

    /// True when any instance carries `value` in `column`
    pub fn contains_key(&self, column: &str, value: &DatabaseValue) -> bool {
        let key = value.as_key();
        self.models
            .iter()
            .any(|m| m.key_value(column).map(|v| v.as_key()) == Some(key.clone()))
    }

    /// Distinct, non-null values of one column, preserving first-seen order
    pub fn distinct_keys(&self, column: &str) -> Vec<DatabaseValue> {
        let mut seen = std::collections::HashSet::new();
        let mut keys = Vec::new();
        for model in &self.models {
            if let Some(value) = model.key_value(column) {
                if seen.insert(value.as_key()) {
                    keys.push(value.clone());
                }
            }
        }
        keys
    }

    /// Group instances into sub-collections keyed by one column's value.
    ///
    /// Keys are the stable string form of the column value so numeric widths
    /// group together. Instances with a missing or null key are dropped.
    pub fn dictionary(self, key_column: &str) -> HashMap<String, Collection> {
        let mut dictionary: HashMap<String, Collection> = HashMap::new();
        for model in self.models {
            if let Some(key) = model.key_value(key_column).map(|v| v.as_key()) {
                dictionary.entry(key).or_default().push(model);
            }
        }
        dictionary
    }
}

impl From<Vec<Model>> for Collection {
    fn from(models: Vec<Model>) -> Self {
        Self { models }
    }
}

impl FromIterator<Model> for Collection {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Collection {
    type Item = Model;
    type IntoIter = std::vec::IntoIter<Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Model;
    type IntoIter = std::slice::Iter<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

impl<'a> IntoIterator for &'a mut Collection {
    type Item = &'a mut Model;
    type IntoIter = std::slice::IterMut<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter_mut()
    }
}
