//! The statement-building engine.
//!
//! An [`EntrySet`] is a mutable projection over the columns (and formal parameters) of
//! one shape. A statement build runs one linear pipeline over a private clone:
//!
//! 1. bind arguments / filters ([`apply_argument_value`](EntrySet::apply_argument_value),
//!    [`apply_filter_value`](EntrySet::apply_filter_value)), which also applies rules;
//! 2. emit clauses (`emit_*`), which render SQL text *and* mark the projected entries
//!    as needing a parameter;
//! 3. extract parameters ([`extract_parameters`](EntrySet::extract_parameters)).
//!
//! The order is part of the contract: extraction only sees entries an emitter has
//! marked, so extracting before emitting yields nothing.
//!
//! # Example
//! ```ignore
//! use stmtkit::{Argument, ClauseFrame, Dialect, EntrySet, NoRules, OperationKind,
//!     ParameterOrder, StatementContext, UserContext};
//!
//! let mut set = template.clone();
//! let user = UserContext::anonymous();
//! let ctx = StatementContext::new(&NoRules, &user);
//! set.apply_argument_value(Argument::from_json(&args)?, OperationKind::Insert, false, false, &ctx)?;
//!
//! let dialect = Dialect::new();
//! let mut sql = String::from("INSERT INTO Customer");
//! set.emit_insert_columns(&mut sql, ClauseFrame::new(" (", ")"), &dialect);
//! set.emit_insert_values(&mut sql, ClauseFrame::new(" VALUES (", ")"), &dialect);
//! let params = set.extract_parameters(ParameterOrder::Natural);
//! ```

mod binding;
mod columns;
mod emit;
mod filter;
mod params;


pub use columns::DesiredColumns;
pub use emit::{ClauseFrame, SortSpec};
pub use filter::FilterOptions;
pub use params::{Parameter, ParameterDirection, ParameterSlot, SECOND_SLOT_SUFFIX};

use crate::config::ParameterOrder;
use crate::entry::{RoleFlags, StatementEntry};
use crate::error::{StmtError, StmtResult};
use crate::rules::{RuleProvider, UserContext};
use crate::schema::{ColumnDescriptor, ShapeSchema};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Rules and user identity a build runs under.
#[derive(Clone, Copy)]
pub struct StatementContext<'a> {
    pub rules: &'a dyn RuleProvider,
    pub user: &'a UserContext,
}

impl<'a> StatementContext<'a> {
    pub fn new(rules: &'a dyn RuleProvider, user: &'a UserContext) -> Self {
        Self { rules, user }
    }
}

/// Ordered entries for one table / procedure shape.
///
/// `Clone` is the template-to-build copy: entries are copied element-wise while
/// descriptors stay shared.
///
/// Emitters that write placeholders lay their items out in the set's
/// [`ParameterOrder`], so positional placeholders line up with
/// [`extract_parameters`](EntrySet::extract_parameters) called with the same order.
#[derive(Debug, Clone)]
pub struct EntrySet {
    shape: String,
    strict: bool,
    parameter_order: ParameterOrder,
    entries: Vec<StatementEntry>,
}

impl EntrySet {
    /// Build from table columns.
    pub fn new(shape: impl Into<String>, columns: &[Arc<ColumnDescriptor>]) -> StmtResult<Self> {
        Self::for_procedure(shape, columns, &[])
    }

    /// Build from result columns plus formal parameters (procedure / table-function shapes).
    pub fn for_procedure(
        shape: impl Into<String>,
        columns: &[Arc<ColumnDescriptor>],
        parameters: &[Arc<ColumnDescriptor>],
    ) -> StmtResult<Self> {
        let shape = shape.into();
        if shape.is_empty() {
            return Err(StmtError::precondition("shape name cannot be empty"));
        }
        if columns.is_empty() && parameters.is_empty() {
            return Err(StmtError::precondition(format!(
                "shape '{shape}' has no columns or parameters"
            )));
        }

        let mut seen = HashSet::with_capacity(columns.len() + parameters.len());
        for d in columns.iter().chain(parameters) {
            if !seen.insert(d.wire_name.to_lowercase()) {
                return Err(StmtError::precondition(format!(
                    "duplicate wire name '{}' in shape '{shape}'",
                    d.wire_name
                )));
            }
        }

        let mut entries = Vec::with_capacity(columns.len() + parameters.len());
        entries.extend(columns.iter().cloned().map(StatementEntry::column));
        entries.extend(parameters.iter().cloned().map(StatementEntry::formal_parameter));

        Ok(Self {
            shape,
            strict: false,
            parameter_order: ParameterOrder::Natural,
            entries,
        })
    }

    /// Build from a [`ShapeSchema`].
    pub fn from_schema(schema: &ShapeSchema) -> StmtResult<Self> {
        Self::for_procedure(&schema.name, &schema.columns, &schema.parameters)
    }

    /// Builder-style strict mode toggle.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Builder-style parameter order toggle.
    pub fn with_parameter_order(mut self, order: ParameterOrder) -> Self {
        self.parameter_order = order;
        self
    }

    pub fn set_parameter_order(&mut self, order: ParameterOrder) {
        self.parameter_order = order;
    }

    pub fn parameter_order(&self) -> ParameterOrder {
        self.parameter_order
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn entries(&self) -> &[StatementEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry named `name`. Wire names win over host names.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.wire_name().eq_ignore_ascii_case(name))
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|e| e.host_name().eq_ignore_ascii_case(name))
            })
    }

    /// Entry named `name` (wire or host name, case-insensitive).
    pub fn get(&self, name: &str) -> Option<&StatementEntry> {
        self.position(name).map(|i| &self.entries[i])
    }

    /// True if any entry is a key.
    pub fn has_keys(&self) -> bool {
        self.entries.iter().any(StatementEntry::is_key)
    }

    /// Bind a single value by name.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> StmtResult<()> {
        let i = self.require(name)?;
        let entry = &mut self.entries[i];
        entry.bind(value.into());
        if entry.is_formal_parameter() {
            entry.flags.insert(RoleFlags::USE_PARAMETER);
        }
        Ok(())
    }

    /// Let a table-valued / bulk parameter supply `name` instead of a scalar value.
    pub fn set_override_column(
        &mut self,
        name: &str,
        column: Arc<ColumnDescriptor>,
    ) -> StmtResult<()> {
        let i = self.require(name)?;
        self.entries[i].override_column = Some(column);
        Ok(())
    }

    /// Clear `UseForUpdate` everywhere, so that only rule-driven columns are written.
    pub fn clear_update_flags(&mut self) {
        for entry in &mut self.entries {
            entry.flags.remove(RoleFlags::USE_FOR_UPDATE);
        }
    }

    /// Clear `UseForUpdate` on key entries; a by-key UPDATE never rewrites its key.
    pub fn clear_key_update_flags(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.is_key()) {
            entry.flags.remove(RoleFlags::USE_FOR_UPDATE);
        }
    }

    /// Alias selected columns by host name where it differs from the wire name.
    pub fn use_host_names_as_aliases(&mut self) {
        for entry in &mut self.entries {
            let differs = entry.host_name() != entry.wire_name();
            entry.flags.set(RoleFlags::USE_CLR_NAME_AS_ALIAS, differs);
        }
    }

    fn require(&self, name: &str) -> StmtResult<usize> {
        if name.is_empty() {
            return Err(StmtError::precondition("column name cannot be empty"));
        }
        self.position(name)
            .ok_or_else(|| self.mapping_error(format!("no column named '{name}'")))
    }

    fn mapping_error(&self, message: impl Into<String>) -> StmtError {
        StmtError::mapping(&self.shape, message)
    }
}
