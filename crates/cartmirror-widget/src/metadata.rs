//! Product display metadata that outlives individual refresh passes.

use std::collections::HashMap;

use cartmirror_core::ProductMetadata;
use cartmirror_extract::normalize_title;

/// Product metadata keyed by product ID, with a secondary index on the
/// normalized product name.
#[derive(Debug, Clone, Default)]
pub struct ProductMetadataCache {
    by_id: HashMap<String, ProductMetadata>,
    by_name: HashMap<String, String>,
}

impl ProductMetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `meta.product_id`. Entries without a
    /// product ID are ignored.
    pub fn insert(&mut self, meta: ProductMetadata) {
        if meta.product_id.is_empty() {
            return;
        }
        if let Some(previous) = self.by_id.get(&meta.product_id) {
            let old_key = normalize_title(&previous.name);
            if self.by_name.get(&old_key) == Some(&meta.product_id) {
                self.by_name.remove(&old_key);
            }
        }
        let name_key = normalize_title(&meta.name);
        if !name_key.is_empty() {
            self.by_name.insert(name_key, meta.product_id.clone());
        }
        self.by_id.insert(meta.product_id.clone(), meta);
    }

    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&ProductMetadata> {
        self.by_id.get(product_id)
    }

    /// Exact match on the normalized name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ProductMetadata> {
        let key = normalize_title(name);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).and_then(|id| self.by_id.get(id))
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.by_id.contains_key(product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<ProductMetadata> for ProductMetadataCache {
    fn from_iter<I: IntoIterator<Item = ProductMetadata>>(iter: I) -> Self {
        let mut cache = Self::new();
        for meta in iter {
            cache.insert(meta);
        }
        cache
    }
}
