//! Process -> category lookup shared by the policies

use crate::types::CategoryMap;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Classifies processes into named categories
pub trait CategoryOperator: Send + Sync {
    /// Categories the process belongs to; empty when unknown
    fn categories_of(&self, process: &str) -> Vec<String>;

    /// Replace the whole lookup with a new category -> processes mapping
    fn set_categories(&self, mapping: &CategoryMap);
}

/// Inverse index guarded by a reader/writer lock
///
/// Every `set_categories` call builds a fresh table and swaps it in, so
/// readers never observe a mix of old and new mappings.
#[derive(Debug, Default)]
pub struct CategoryIndex {
    by_process: RwLock<HashMap<String, Vec<String>>>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(mapping: &CategoryMap) -> Self {
        let index = Self::new();
        index.set_categories(mapping);
        index
    }

    fn invert(mapping: &CategoryMap) -> HashMap<String, Vec<String>> {
        let mut by_process: HashMap<String, Vec<String>> = HashMap::new();

        for (category, processes) in mapping {
            for process in processes {
                let categories = by_process.entry(process.clone()).or_default();
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
        }

        by_process
    }
}

impl CategoryOperator for CategoryIndex {
    fn categories_of(&self, process: &str) -> Vec<String> {
        let table = self.by_process.read().unwrap_or_else(PoisonError::into_inner);
        table.get(process).cloned().unwrap_or_default()
    }

    fn set_categories(&self, mapping: &CategoryMap) {
        let table = Self::invert(mapping);
        debug!(
            categories = mapping.len(),
            processes = table.len(),
            "Category index rebuilt"
        );
        *self.by_process.write().unwrap_or_else(PoisonError::into_inner) = table;
    }
}

/// Lookup used when no categories are configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCategories;

impl CategoryOperator for NoCategories {
    fn categories_of(&self, _process: &str) -> Vec<String> {
        Vec::new()
    }

    fn set_categories(&self, _mapping: &CategoryMap) {}
}
