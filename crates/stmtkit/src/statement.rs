//! Complete statements assembled from entry sets.
//!
//! [`Statements`] runs the fixed pipeline for each build: checkout a template clone,
//! bind, apply rules, emit clauses, extract parameters. It follows the same safe
//! defaults as hand-written SQL should: UPDATE requires a SET list and DELETE / UPDATE
//! by filter require a predicate.
//!
//! # Example
//! ```ignore
//! use stmtkit::{Argument, BuilderConfig, RuleSet, SchemaRegistry, Statements, UserContext};
//!
//! let statements = Statements::new(Arc::new(registry), BuilderConfig::new())
//!     .with_rules(Arc::new(RuleSet::new().soft_delete("IsDeleted", true)));
//!
//! let stmt = statements.insert("Customer", Argument::from_json(&body)?, &user)?;
//! // stmt.sql == "INSERT INTO Customer (Name, Email) VALUES (@Name, @Email)"
//! ```

use crate::cache::TemplateCache;
use crate::config::BuilderConfig;
use crate::entry_set::{
    ClauseFrame, DesiredColumns, EntrySet, FilterOptions, Parameter, ParameterSlot, SortSpec,
    StatementContext,
};
use crate::error::{StmtError, StmtResult};
use crate::reflect::Argument;
use crate::rules::{NoRules, OperationKind, RuleProvider, UserContext};
use crate::schema::MetadataSource;
use std::sync::Arc;

/// Kind of an assembled statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// SQL text plus its parameters, ready for the execution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStatement {
    pub kind: StatementKind,
    pub shape: String,
    pub sql: String,
    pub parameters: Vec<Parameter>,
    /// Generated-key parameters to read back (inserts into identity-keyed shapes).
    pub key_parameters: Option<Vec<Parameter>>,
}

/// Options for INSERT / UPDATE / DELETE argument binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub use_object_defined_keys: bool,
    pub changed_only: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the key properties declared by the object instead of the schema keys.
    pub fn object_keys(mut self) -> Self {
        self.use_object_defined_keys = true;
        self
    }

    /// Only write properties the object reports as changed.
    pub fn changed_only(mut self) -> Self {
        self.changed_only = true;
        self
    }
}

/// What a SELECT returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectSpec {
    pub columns: DesiredColumns,
    pub sort: Vec<SortSpec>,
    /// Skip the soft-delete predicate.
    pub include_deleted: bool,
}

impl Default for SelectSpec {
    fn default() -> Self {
        Self {
            columns: DesiredColumns::All,
            sort: Vec::new(),
            include_deleted: false,
        }
    }
}

impl SelectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: DesiredColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn order_by(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Statement factory over cached templates.
pub struct Statements {
    cache: TemplateCache,
    config: BuilderConfig,
    rules: Arc<dyn RuleProvider>,
}

impl Statements {
    /// Create a factory with no rules.
    pub fn new(source: Arc<dyn MetadataSource>, config: BuilderConfig) -> Self {
        Self {
            cache: TemplateCache::new(source).with_strict(config.strict),
            config,
            rules: Arc::new(NoRules),
        }
    }

    /// Use `rules` for value rules, restrictions and soft delete.
    pub fn with_rules(mut self, rules: Arc<dyn RuleProvider>) -> Self {
        self.rules = rules;
        self
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// `INSERT INTO t (cols) VALUES (vals)`.
    pub fn insert(
        &self,
        shape: &str,
        argument: Argument<'_>,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        set.apply_argument_value(argument, OperationKind::Insert, false, false, &ctx)?;

        let dialect = &self.config.dialect;
        let mut sql = String::from("INSERT INTO ");
        dialect.write_ident(&mut sql, set.shape());
        if !set.emit_insert_columns(&mut sql, ClauseFrame::new(" (", ")"), dialect) {
            return Err(StmtError::mapping(set.shape(), "no column to insert"));
        }
        set.emit_insert_values(&mut sql, ClauseFrame::new(" VALUES (", ")"), dialect);

        let key_parameters = set.extract_identity_key_parameters();
        Ok(self.finish(StatementKind::Insert, &set, sql, key_parameters))
    }

    /// `UPDATE t SET ... WHERE key = ...`. Key columns are never written; key
    /// parameters are bound in the second slot, after the SET parameters.
    pub fn update_by_key(
        &self,
        shape: &str,
        argument: Argument<'_>,
        options: WriteOptions,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        set.apply_argument_value(
            argument,
            OperationKind::Update,
            options.use_object_defined_keys,
            options.changed_only,
            &ctx,
        )?;
        set.clear_key_update_flags();

        let mut sql = self.update_header(&mut set)?;
        let dialect = &self.config.dialect;
        set.emit_where_by_key(
            &mut sql,
            ClauseFrame::new(" WHERE ", ""),
            dialect,
            ParameterSlot::Second,
        )?;
        Ok(self.finish(StatementKind::Update, &set, sql, None))
    }

    /// `UPDATE t SET ... WHERE <filter>`. Filter parameters follow the SET parameters.
    pub fn update_by_filter(
        &self,
        shape: &str,
        values: Argument<'_>,
        filter: Argument<'_>,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        set.apply_argument_value(values, OperationKind::Update, false, false, &ctx)?;

        let mut sql = self.update_header(&mut set)?;
        self.push_second_slot_filter(&mut set, &mut sql, filter)?;
        Ok(self.finish(StatementKind::Update, &set, sql, None))
    }

    /// Delete by key. Soft delete (an UPDATE writing the sentinel) when a soft-delete
    /// rule targets a column of the shape.
    pub fn delete_by_key(
        &self,
        shape: &str,
        argument: Argument<'_>,
        options: WriteOptions,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        let soft = self.is_soft_delete(&set);
        if soft {
            set.clear_update_flags();
        }
        set.apply_argument_value(
            argument,
            OperationKind::Delete,
            options.use_object_defined_keys,
            false,
            &ctx,
        )?;

        let dialect = &self.config.dialect;
        let (kind, mut sql, slot) = if soft {
            set.clear_key_update_flags();
            let sql = self.update_header(&mut set)?;
            (StatementKind::Update, sql, ParameterSlot::Second)
        } else {
            (StatementKind::Delete, self.delete_header(&set), ParameterSlot::First)
        };
        set.emit_where_by_key(&mut sql, ClauseFrame::new(" WHERE ", ""), dialect, slot)?;
        Ok(self.finish(kind, &set, sql, None))
    }

    /// Delete by filter, soft when a soft-delete rule targets a column of the shape.
    pub fn delete_by_filter(
        &self,
        shape: &str,
        filter: Argument<'_>,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);

        if self.is_soft_delete(&set) {
            set.clear_update_flags();
            set.apply_rules(OperationKind::Delete, Some(filter), &ctx)?;
            let mut sql = self.update_header(&mut set)?;
            self.push_second_slot_filter(&mut set, &mut sql, filter)?;
            return Ok(self.finish(StatementKind::Update, &set, sql, None));
        }

        set.apply_rules(OperationKind::Delete, Some(filter), &ctx)?;
        let mut sql = self.delete_header(&set);
        let fragment = self.first_slot_filter(&mut set, filter)?;
        push_required_predicate(&mut sql, &fragment)?;
        Ok(self.finish(StatementKind::Delete, &set, sql, None))
    }

    /// `SELECT ... FROM t WHERE key = ...`.
    pub fn select_by_key(
        &self,
        shape: &str,
        argument: Argument<'_>,
        spec: &SelectSpec,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        set.apply_argument_value(argument, OperationKind::Read, false, false, &ctx)?;

        let mut sql = self.select_header(&mut set, &spec.columns)?;
        let dialect = &self.config.dialect;
        set.emit_where_by_key(
            &mut sql,
            ClauseFrame::new(" WHERE ", ""),
            dialect,
            ParameterSlot::First,
        )?;
        self.push_select_tail(&mut set, &mut sql, spec, true)?;
        Ok(self.finish(StatementKind::Select, &set, sql, None))
    }

    /// `SELECT ... FROM t [WHERE <filter>] [ORDER BY ...]`.
    pub fn select_by_filter(
        &self,
        shape: &str,
        filter: Option<Argument<'_>>,
        spec: &SelectSpec,
        user: &UserContext,
    ) -> StmtResult<BuiltStatement> {
        let mut set = self.checkout(shape)?;
        let ctx = StatementContext::new(self.rules.as_ref(), user);
        set.apply_rules(OperationKind::Read, filter, &ctx)?;

        let mut sql = self.select_header(&mut set, &spec.columns)?;
        let mut has_where = false;
        if let Some(filter) = filter {
            let fragment = self.first_slot_filter(&mut set, filter)?;
            if !fragment.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&fragment);
                has_where = true;
            }
        }
        self.push_select_tail(&mut set, &mut sql, spec, has_where)?;
        Ok(self.finish(StatementKind::Select, &set, sql, None))
    }

    fn checkout(&self, shape: &str) -> StmtResult<EntrySet> {
        let set = self.cache.checkout(shape)?;
        Ok(set.with_parameter_order(self.config.parameter_order))
    }

    fn is_soft_delete(&self, set: &EntrySet) -> bool {
        self.rules
            .soft_delete_rules()
            .iter()
            .any(|r| set.position(&r.column).is_some())
    }

    fn update_header(&self, set: &mut EntrySet) -> StmtResult<String> {
        let dialect = &self.config.dialect;
        let mut sql = String::from("UPDATE ");
        dialect.write_ident(&mut sql, set.shape());
        if !set.emit_set_list(&mut sql, ClauseFrame::new(" SET ", ""), dialect) {
            return Err(StmtError::mapping(set.shape(), "no column to update"));
        }
        Ok(sql)
    }

    fn delete_header(&self, set: &EntrySet) -> String {
        let mut sql = String::from("DELETE FROM ");
        self.config.dialect.write_ident(&mut sql, set.shape());
        sql
    }

    fn select_header(&self, set: &mut EntrySet, columns: &DesiredColumns) -> StmtResult<String> {
        let dialect = &self.config.dialect;
        set.apply_desired_columns(columns)?;
        set.use_host_names_as_aliases();

        let mut sql = String::new();
        if !set.emit_select_list(&mut sql, ClauseFrame::new("SELECT ", ""), dialect) {
            return Err(StmtError::mapping(set.shape(), "no readable column selected"));
        }
        sql.push_str(" FROM ");
        dialect.write_ident(&mut sql, set.shape());
        Ok(sql)
    }

    fn push_select_tail(
        &self,
        set: &mut EntrySet,
        sql: &mut String,
        spec: &SelectSpec,
        has_where: bool,
    ) -> StmtResult<()> {
        let dialect = &self.config.dialect;
        if !spec.include_deleted {
            let header = if has_where { " AND " } else { " WHERE " };
            set.emit_soft_delete_predicate(
                sql,
                ClauseFrame::new(header, ""),
                dialect,
                self.rules.soft_delete_rules(),
            );
        }
        set.emit_order_by(sql, ClauseFrame::new(" ORDER BY ", ""), dialect, &spec.sort)?;
        Ok(())
    }

    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            ignore_null_properties: self.config.ignore_null_filter_properties,
        }
    }

    fn first_slot_filter(&self, set: &mut EntrySet, filter: Argument<'_>) -> StmtResult<String> {
        let dialect = &self.config.dialect;
        if dialect.placeholder.is_positional() {
            set.apply_anonymous_filter_value(filter, self.filter_options(), false, dialect)
        } else {
            set.apply_filter_value(filter, self.filter_options(), dialect)
        }
    }

    fn push_second_slot_filter(
        &self,
        set: &mut EntrySet,
        sql: &mut String,
        filter: Argument<'_>,
    ) -> StmtResult<()> {
        let dialect = &self.config.dialect;
        let fragment = if dialect.placeholder.is_positional() {
            set.apply_anonymous_filter_value(filter, self.filter_options(), true, dialect)?
        } else {
            set.apply_filter_value_to_slot(
                filter,
                self.filter_options(),
                ParameterSlot::Second,
                dialect,
            )?
        };
        push_required_predicate(sql, &fragment)
    }

    fn finish(
        &self,
        kind: StatementKind,
        set: &EntrySet,
        sql: String,
        key_parameters: Option<Vec<Parameter>>,
    ) -> BuiltStatement {
        let parameters = set.extract_parameters(self.config.parameter_order);
        tracing::debug!(
            target: "stmtkit.build",
            ?kind,
            shape = %set.shape(),
            param_count = parameters.len(),
            sql = %sql,
            "statement built"
        );
        BuiltStatement {
            kind,
            shape: set.shape().to_string(),
            sql,
            parameters,
            key_parameters,
        }
    }
}

fn push_required_predicate(sql: &mut String, fragment: &str) -> StmtResult<()> {
    if fragment.is_empty() {
        return Err(StmtError::precondition(
            "filter produced no predicate; refusing to write every row",
        ));
    }
    sql.push_str(" WHERE ");
    sql.push_str(fragment);
    Ok(())
}

impl std::fmt::Debug for Statements {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statements")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
