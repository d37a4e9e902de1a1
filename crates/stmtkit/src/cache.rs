//! Template entry-set cache.
//!
//! One canonical [`EntrySet`] per shape is built from metadata on first use and is
//! read-only afterwards. Every statement build [`checkout`](TemplateCache::checkout)s an
//! owned clone, so concurrent builds never share mutable state.

use crate::entry_set::EntrySet;
use crate::error::{StmtError, StmtResult};
use crate::schema::MetadataSource;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub struct TemplateCache {
    source: Arc<dyn MetadataSource>,
    strict: bool,
    templates: RwLock<HashMap<String, Arc<EntrySet>>>,
}

impl TemplateCache {
    /// Create an empty cache over `source`.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            strict: false,
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Templates created from now on use strict name resolution.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The canonical template for `shape`, created on first use.
    pub fn template(&self, shape: &str) -> StmtResult<Arc<EntrySet>> {
        if shape.is_empty() {
            return Err(StmtError::precondition("shape name cannot be empty"));
        }
        let key = shape.to_lowercase();

        if let Some(template) = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(template));
        }

        let schema = self.source.shape(shape)?;
        let built = Arc::new(EntrySet::from_schema(&schema)?.with_strict(self.strict));

        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let template = templates.entry(key).or_insert_with(|| {
            tracing::debug!(
                target: "stmtkit.build",
                shape = %built.shape(),
                entries = built.len(),
                "template created"
            );
            Arc::clone(&built)
        });
        Ok(Arc::clone(template))
    }

    /// An owned clone of the template for `shape`, ready for one statement build.
    pub fn checkout(&self, shape: &str) -> StmtResult<EntrySet> {
        Ok(EntrySet::clone(&*self.template(shape)?))
    }

    /// Drop the template for `shape` so it is rebuilt from metadata on next use.
    pub fn invalidate(&self, shape: &str) -> bool {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&shape.to_lowercase())
            .is_some()
    }

    /// Drop every template.
    pub fn clear(&self) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("strict", &self.strict)
            .field("templates", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, SchemaRegistry, ShapeSchema};

    fn cache() -> TemplateCache {
        let registry = SchemaRegistry::new().with_shape(
            ShapeSchema::new("Customer")
                .column(ColumnDescriptor::new("Id").primary_key().identity())
                .column(ColumnDescriptor::new("Name")),
        );
        TemplateCache::new(Arc::new(registry))
    }

    #[test]
    fn template_is_created_once() {
        let cache = cache();
        let a = cache.template("Customer").unwrap();
        let b = cache.template("customer").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn checkout_does_not_touch_template() {
        let cache = cache();
        let mut build = cache.checkout("Customer").unwrap();
        build.set_value("Name", "Ann").unwrap();
        assert!(!cache.template("Customer").unwrap().get("Name").unwrap().has_value());
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let cache = cache();
        let a = cache.template("Customer").unwrap();
        assert!(cache.invalidate("CUSTOMER"));
        let b = cache.template("Customer").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_shape_is_precondition_error() {
        assert!(cache().checkout("Order").unwrap_err().is_precondition());
        assert!(cache().template("").unwrap_err().is_precondition());
    }

    #[test]
    fn strict_flag_reaches_templates() {
        let cache = cache().with_strict(true);
        assert!(cache.checkout("Customer").unwrap().is_strict());
    }

    #[test]
    fn concurrent_checkouts_are_isolated() {
        let cache = Arc::new(cache());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let mut build = cache.checkout("Customer").unwrap();
                    build.set_value("Name", format!("user-{n}")).unwrap();
                    build.get("Name").unwrap().value.clone()
                })
            })
            .collect();
        for (n, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), Some(serde_json::Value::from(format!("user-{n}"))));
        }
        assert!(!cache.template("Customer").unwrap().get("Name").unwrap().has_value());
    }
}
