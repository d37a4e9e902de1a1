//! Schema metadata consumed by the statement builder.
//!
//! A [`ColumnDescriptor`] describes one column or formal parameter. Descriptors are
//! shared as `Arc<ColumnDescriptor>` between a cached template and every clone made
//! from it, so they are never copied per statement.

use crate::error::{StmtError, StmtResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable description of one column or formal parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Host-facing name (struct field / property name).
    pub host_name: String,
    /// Wire-facing name (database column or parameter name).
    pub wire_name: String,
    /// Wire-facing variable name used to build named placeholders.
    pub variable_name: String,
    /// Declared database type, as reported by the metadata source.
    pub db_type: String,
    pub is_primary_key: bool,
    pub is_computed: bool,
    pub is_identity: bool,
    pub is_nullable: bool,
}

impl ColumnDescriptor {
    /// Create a descriptor whose host, wire and variable names are all `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            host_name: name.clone(),
            variable_name: name.clone(),
            wire_name: name,
            db_type: String::new(),
            is_primary_key: false,
            is_computed: false,
            is_identity: false,
            is_nullable: true,
        }
    }

    /// Override the host-facing name.
    pub fn host_name(mut self, name: impl Into<String>) -> Self {
        self.host_name = name.into();
        self
    }

    /// Override the placeholder variable name.
    pub fn variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = name.into();
        self
    }

    /// Set the declared database type.
    pub fn db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = db_type.into();
        self
    }

    /// Mark as (part of) the primary key. Primary key columns are not nullable.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    /// Mark as an identity / auto-generated column.
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    /// Mark as a computed column.
    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    /// Mark as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Case-insensitive match against the wire or host name.
    pub fn matches(&self, name: &str) -> bool {
        self.wire_name.eq_ignore_ascii_case(name) || self.host_name.eq_ignore_ascii_case(name)
    }

    /// Share this descriptor.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Columns and formal parameters of one table, view or procedure.
#[derive(Debug, Clone)]
pub struct ShapeSchema {
    pub name: String,
    pub columns: Vec<Arc<ColumnDescriptor>>,
    pub parameters: Vec<Arc<ColumnDescriptor>>,
}

impl ShapeSchema {
    /// Create an empty shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(Arc::new(column));
        self
    }

    /// Add a formal parameter (procedure / table-function shapes).
    pub fn parameter(mut self, parameter: ColumnDescriptor) -> Self {
        self.parameters.push(Arc::new(parameter));
        self
    }

    /// Check if this shape has a column with the given wire or host name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.matches(name))
    }
}

/// Supplies column metadata keyed by shape name.
pub trait MetadataSource: Send + Sync {
    fn shape(&self, name: &str) -> StmtResult<ShapeSchema>;
}

/// In-memory metadata source.
///
/// Shape names are looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    shapes: HashMap<String, ShapeSchema>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a shape.
    pub fn register(&mut self, shape: ShapeSchema) {
        self.shapes.insert(shape.name.to_lowercase(), shape);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_shape(mut self, shape: ShapeSchema) -> Self {
        self.register(shape);
        self
    }

    /// Get a shape by name.
    pub fn get(&self, name: &str) -> Option<&ShapeSchema> {
        self.shapes.get(&name.to_lowercase())
    }

    /// Get the number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl MetadataSource for SchemaRegistry {
    fn shape(&self, name: &str) -> StmtResult<ShapeSchema> {
        self.get(name)
            .cloned()
            .ok_or_else(|| StmtError::precondition(format!("unknown shape '{name}'")))
    }
}
