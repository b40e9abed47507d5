//! Product name → model index mapping.

use std::collections::HashMap;

/// Bijection from product name to `0..N-1`, assigned in first-seen order.
///
/// The same mapping is used to encode training inputs and to enumerate
/// products during prediction, so index `i` names the same product for the
/// whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductIndex {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl ProductIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from names in order; duplicates keep their first index.
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::new();
        for name in names {
            index.insert(name);
        }
        index
    }

    /// Return the index for `name`, assigning the next one if unseen.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.lookup.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(index, name)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
