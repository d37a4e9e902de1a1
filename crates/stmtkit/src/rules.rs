//! Value rules and column restrictions.
//!
//! Value rules inject computed values (audit columns, soft-delete sentinels) right after
//! user-supplied values are bound. Restrictions are a hard ceiling: a restricted column
//! never reaches the corresponding clause, whatever its other flags say.

use crate::error::StmtResult;
use crate::reflect::Argument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The kind of statement being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Insert,
    Update,
    /// Delete, including delete-as-update (soft delete).
    Delete,
    Upsert,
}

impl OperationKind {
    /// Rules firing for this operation force `UseForInsert`.
    pub fn writes_insert(self) -> bool {
        matches!(self, Self::Insert | Self::Upsert)
    }

    /// Rules firing for this operation force `UseForUpdate`.
    pub fn writes_update(self) -> bool {
        matches!(self, Self::Update | Self::Delete | Self::Upsert)
    }
}

/// The user on whose behalf a statement is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl UserContext {
    /// Anonymous context with no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a user id.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Add a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Inputs available to a value rule.
pub struct RuleInput<'a> {
    pub argument: Option<Argument<'a>>,
    pub user: &'a UserContext,
    pub current: Option<&'a Value>,
    pub operation: OperationKind,
}

type ComputeFn = Arc<dyn Fn(&RuleInput<'_>) -> StmtResult<Value> + Send + Sync>;

/// Computes a column value for a set of operations.
#[derive(Clone)]
pub struct ValueRule {
    column: String,
    operations: Vec<OperationKind>,
    compute: ComputeFn,
}

impl ValueRule {
    /// Rule for `column` (wire or host name) firing on `operations`.
    pub fn new<F>(column: impl Into<String>, operations: &[OperationKind], compute: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> StmtResult<Value> + Send + Sync + 'static,
    {
        Self {
            column: column.into(),
            operations: operations.to_vec(),
            compute: Arc::new(compute),
        }
    }

    /// Always writes `value`.
    pub fn constant(
        column: impl Into<String>,
        operations: &[OperationKind],
        value: impl Into<Value>,
    ) -> Self {
        let value = value.into();
        Self::new(column, operations, move |_| Ok(value.clone()))
    }

    /// Writes the current UTC time as an RFC 3339 string.
    pub fn audit_timestamp(column: impl Into<String>, operations: &[OperationKind]) -> Self {
        Self::new(column, operations, |_| {
            Ok(Value::String(chrono::Utc::now().to_rfc3339()))
        })
    }

    /// Writes the current user id, or null for anonymous contexts.
    pub fn audit_user(column: impl Into<String>, operations: &[OperationKind]) -> Self {
        Self::new(column, operations, |input| {
            Ok(input
                .user
                .user_id
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null))
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// True if the rule targets this column and fires for `operation`.
    pub fn applies_to(&self, wire_name: &str, host_name: &str, operation: OperationKind) -> bool {
        (self.column.eq_ignore_ascii_case(wire_name) || self.column.eq_ignore_ascii_case(host_name))
            && self.operations.contains(&operation)
    }

    pub fn compute(&self, input: &RuleInput<'_>) -> StmtResult<Value> {
        (self.compute)(input)
    }
}

impl fmt::Debug for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRule")
            .field("column", &self.column)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

/// Which clauses a restriction suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestrictionKinds {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub insert: bool,
    #[serde(default)]
    pub update: bool,
}

impl RestrictionKinds {
    pub const READ: Self = Self {
        read: true,
        insert: false,
        update: false,
    };
    pub const INSERT: Self = Self {
        read: false,
        insert: true,
        update: false,
    };
    pub const UPDATE: Self = Self {
        read: false,
        insert: false,
        update: true,
    };
    pub const WRITE: Self = Self {
        read: false,
        insert: true,
        update: true,
    };
    pub const ALL: Self = Self {
        read: true,
        insert: true,
        update: true,
    };
}

type ExceptionFn = Arc<dyn Fn(&UserContext) -> bool + Send + Sync>;

/// Suppresses a column from some clauses unless the exception predicate matches.
#[derive(Clone)]
pub struct Restriction {
    shape: Option<String>,
    column: String,
    kinds: RestrictionKinds,
    exception: Option<ExceptionFn>,
}

impl Restriction {
    /// Restrict `column` (wire or host name) on every shape.
    pub fn new(column: impl Into<String>, kinds: RestrictionKinds) -> Self {
        Self {
            shape: None,
            column: column.into(),
            kinds,
            exception: None,
        }
    }

    /// Limit the restriction to one shape.
    pub fn on_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    /// Users matching `predicate` are not restricted.
    pub fn except<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&UserContext) -> bool + Send + Sync + 'static,
    {
        self.exception = Some(Arc::new(predicate));
        self
    }

    /// Users with `role` are not restricted.
    pub fn except_role(self, role: impl Into<String>) -> Self {
        let role = role.into();
        self.except(move |user| user.has_role(&role))
    }

    pub fn kinds(&self) -> RestrictionKinds {
        self.kinds
    }

    pub fn applies_to(&self, shape: &str, wire_name: &str, host_name: &str) -> bool {
        let shape_ok = self
            .shape
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case(shape));
        shape_ok
            && (self.column.eq_ignore_ascii_case(wire_name)
                || self.column.eq_ignore_ascii_case(host_name))
    }

    pub fn is_excepted(&self, user: &UserContext) -> bool {
        self.exception.as_ref().is_some_and(|f| f(user))
    }
}

impl fmt::Debug for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restriction")
            .field("shape", &self.shape)
            .field("column", &self.column)
            .field("kinds", &self.kinds)
            .field("has_exception", &self.exception.is_some())
            .finish()
    }
}

/// Marks rows as deleted by writing a sentinel instead of removing them.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDeleteRule {
    /// Wire or host name of the flag column.
    pub column: String,
    /// Value meaning "deleted".
    pub deleted_value: Value,
}

/// Source of value rules, restrictions and soft-delete rules.
pub trait RuleProvider: Send + Sync {
    fn rules_for_column(
        &self,
        wire_name: &str,
        host_name: &str,
        operation: OperationKind,
    ) -> Vec<&ValueRule>;

    fn restrictions_for_column(
        &self,
        shape: &str,
        wire_name: &str,
        host_name: &str,
    ) -> Vec<&Restriction>;

    fn soft_delete_rules(&self) -> &[SoftDeleteRule] {
        &[]
    }
}

/// A provider with no rules at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl RuleProvider for NoRules {
    fn rules_for_column(&self, _: &str, _: &str, _: OperationKind) -> Vec<&ValueRule> {
        Vec::new()
    }

    fn restrictions_for_column(&self, _: &str, _: &str, _: &str) -> Vec<&Restriction> {
        Vec::new()
    }
}

/// In-memory rule provider.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ValueRule>,
    restrictions: Vec<Restriction>,
    soft_deletes: Vec<SoftDeleteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value rule.
    pub fn rule(mut self, rule: ValueRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a restriction.
    pub fn restriction(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    /// Add a soft-delete rule. Deleting writes `deleted_value` into `column`, and reads
    /// exclude rows where `column` holds it.
    pub fn soft_delete(mut self, column: impl Into<String>, deleted_value: impl Into<Value>) -> Self {
        let column = column.into();
        let deleted_value = deleted_value.into();
        self.rules.push(ValueRule::constant(
            column.clone(),
            &[OperationKind::Delete],
            deleted_value.clone(),
        ));
        self.soft_deletes.push(SoftDeleteRule {
            column,
            deleted_value,
        });
        self
    }
}

impl RuleProvider for RuleSet {
    fn rules_for_column(
        &self,
        wire_name: &str,
        host_name: &str,
        operation: OperationKind,
    ) -> Vec<&ValueRule> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(wire_name, host_name, operation))
            .collect()
    }

    fn restrictions_for_column(
        &self,
        shape: &str,
        wire_name: &str,
        host_name: &str,
    ) -> Vec<&Restriction> {
        self.restrictions
            .iter()
            .filter(|r| r.applies_to(shape, wire_name, host_name))
            .collect()
    }

    fn soft_delete_rules(&self) -> &[SoftDeleteRule] {
        &self.soft_deletes
    }
}
