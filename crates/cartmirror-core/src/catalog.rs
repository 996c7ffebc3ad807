use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One known product page slug and the canonical catalog ID it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub slug: String,
    pub product_id: String,
    /// Optional display name, used only for logging and documentation.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<CatalogEntry>,
}

/// Static slug → product-ID table.
///
/// Unknown slugs resolve to themselves, so a storefront whose product URLs
/// already end in the numeric ID needs no table at all.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    by_slug: HashMap<String, String>,
}

impl ProductCatalog {
    /// Builds a catalog from already-validated entries.
    #[must_use]
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let by_slug = entries
            .iter()
            .map(|e| (e.slug.to_lowercase(), e.product_id.clone()))
            .collect();
        Self { by_slug }
    }

    /// Resolves a slug to its canonical product ID, passing unknown slugs
    /// through unchanged.
    #[must_use]
    pub fn resolve(&self, slug: &str) -> String {
        self.by_slug
            .get(&slug.to_lowercase())
            .cloned()
            .unwrap_or_else(|| slug.to_string())
    }

    /// Resolves the product ID for a product page link, or `None` when the
    /// link has no usable path segment.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> Option<String> {
        slug_from_url(url).map(|slug| self.resolve(&slug))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

/// Returns the final non-empty path segment of a product link.
///
/// Query strings and fragments are ignored, and `#` or `javascript:` links
/// yield `None`. Percent-encoded segments are returned as-is.
#[must_use]
pub fn slug_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("javascript:") {
        return None;
    }

    let without_fragment = trimmed.split('#').next().unwrap_or("");
    let without_query = without_fragment.split('?').next().unwrap_or("");
    let path = match without_query.find("://") {
        Some(idx) => {
            let after_scheme = &without_query[idx + 3..];
            after_scheme.find('/').map_or("", |p| &after_scheme[p..])
        }
        None => without_query,
    };

    path.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Load and validate the product catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<ProductCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

/// Parse and validate catalog YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_catalog(content: &str) -> Result<ProductCatalog, ConfigError> {
    let file: CatalogFile = serde_yaml::from_str(content).map_err(ConfigError::CatalogFileParse)?;
    validate_catalog(&file)?;
    Ok(ProductCatalog::from_entries(&file.products))
}

fn validate_catalog(file: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for entry in &file.products {
        if entry.slug.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog slug must be non-empty".to_string(),
            ));
        }

        if entry.product_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "catalog entry '{}' has an empty product_id",
                entry.slug
            )));
        }

        if entry.slug.contains('/') {
            return Err(ConfigError::Validation(format!(
                "catalog slug '{}' must be a single path segment",
                entry.slug
            )));
        }

        if !seen_slugs.insert(entry.slug.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate catalog slug: '{}'",
                entry.slug
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
