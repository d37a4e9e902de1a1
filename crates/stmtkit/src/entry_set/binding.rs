//! Argument binding and rule application.

use super::{EntrySet, StatementContext};
use crate::entry::RoleFlags;
use crate::error::{StmtError, StmtResult};
use crate::reflect::{Argument, DynRecord};
use crate::rules::{OperationKind, RuleInput};
use serde_json::{Map, Value};
use std::sync::Arc;

impl EntrySet {
    /// Bind a runtime argument to entries by name, then apply rules for `operation`.
    ///
    /// - `use_object_defined_keys`: replace the schema keys with the properties the
    ///   object itself marks as keys (objects only).
    /// - `changed_only`: only properties reported as changed stay eligible for UPDATE.
    ///   The argument must track changes and report at least one change.
    ///
    /// Rules always run last, so computed / audit values cannot be overwritten by an
    /// explicit user value.
    pub fn apply_argument_value(
        &mut self,
        argument: Argument<'_>,
        operation: OperationKind,
        use_object_defined_keys: bool,
        changed_only: bool,
        ctx: &StatementContext<'_>,
    ) -> StmtResult<()> {
        match argument {
            Argument::Map(map) => {
                if changed_only {
                    return Err(StmtError::capability(
                        "changed-only binding requires an argument that tracks changes",
                    ));
                }
                self.bind_map(map)?;
            }
            Argument::Object(record) => {
                self.bind_object(record, use_object_defined_keys, changed_only)?;
            }
        }
        self.apply_rules(operation, Some(argument), ctx)
    }

    /// Apply value rules and restrictions for `operation`.
    ///
    /// Called by [`apply_argument_value`](Self::apply_argument_value); call it directly on
    /// paths that bind nothing (reads, filter-only statements).
    pub fn apply_rules(
        &mut self,
        operation: OperationKind,
        argument: Option<Argument<'_>>,
        ctx: &StatementContext<'_>,
    ) -> StmtResult<()> {
        for entry in self.entries.iter_mut() {
            let descriptor = Arc::clone(&entry.descriptor);

            for rule in ctx
                .rules
                .rules_for_column(&descriptor.wire_name, &descriptor.host_name, operation)
            {
                let value = rule
                    .compute(&RuleInput {
                        argument,
                        user: ctx.user,
                        current: entry.value.as_ref(),
                        operation,
                    })
                    .map_err(|e| match e {
                        StmtError::Rule { .. } => e,
                        other => StmtError::rule(&descriptor.wire_name, other.to_string()),
                    })?;
                entry.value = Some(value);
                if operation.writes_insert() {
                    entry.flags.insert(RoleFlags::USE_FOR_INSERT);
                }
                if operation.writes_update() {
                    entry.flags.insert(RoleFlags::USE_FOR_UPDATE);
                }
                tracing::trace!(
                    target: "stmtkit.build",
                    shape = %self.shape,
                    column = %descriptor.wire_name,
                    ?operation,
                    flags = ?entry.flags,
                    "value rule applied"
                );
            }

            for restriction in ctx.rules.restrictions_for_column(
                &self.shape,
                &descriptor.wire_name,
                &descriptor.host_name,
            ) {
                if restriction.is_excepted(ctx.user) {
                    continue;
                }
                let kinds = restriction.kinds();
                if kinds.read {
                    entry.flags.insert(RoleFlags::RESTRICTED_READ);
                }
                if kinds.insert {
                    entry.flags.insert(RoleFlags::RESTRICTED_INSERT);
                }
                if kinds.update {
                    entry.flags.insert(RoleFlags::RESTRICTED_UPDATE);
                }
                tracing::trace!(
                    target: "stmtkit.build",
                    shape = %self.shape,
                    column = %descriptor.wire_name,
                    flags = ?entry.flags,
                    "restriction applied"
                );
            }
        }
        Ok(())
    }

    fn bind_map(&mut self, map: &Map<String, Value>) -> StmtResult<()> {
        if map.is_empty() {
            return Err(StmtError::precondition("argument map is empty"));
        }

        let mut matched = 0usize;
        for (key, value) in map {
            let Some(i) = self.position(key) else {
                if self.strict {
                    return Err(self.mapping_error(format!("key '{key}' does not match any column")));
                }
                continue;
            };
            let entry = &mut self.entries[i];
            entry.bind(value.clone());
            if entry.is_formal_parameter() {
                entry.flags.insert(RoleFlags::USE_PARAMETER);
            }
            matched += 1;
        }

        if matched == 0 {
            return Err(self.mapping_error("no key of the argument matched a column"));
        }
        Ok(())
    }

    fn bind_object(
        &mut self,
        record: &dyn DynRecord,
        use_object_defined_keys: bool,
        changed_only: bool,
    ) -> StmtResult<()> {
        let changed = if changed_only {
            let changed = record.changed().ok_or_else(|| {
                StmtError::capability("changed-only binding requires an argument that tracks changes")
            })?;
            if changed.is_empty() {
                return Err(StmtError::capability("argument reports no changed properties"));
            }
            Some(changed)
        } else {
            None
        };

        if use_object_defined_keys {
            for entry in self.entries.iter_mut() {
                entry.flags.remove(RoleFlags::IS_KEY);
            }
        }

        let mut matched = 0usize;
        for prop in record.describe() {
            let Some(column) = prop.column else {
                continue;
            };
            if !prop.can_read {
                continue;
            }
            let Some(i) = self.position(column) else {
                if self.strict {
                    return Err(self.mapping_error(format!(
                        "property '{}' maps to unknown column '{column}'",
                        prop.name
                    )));
                }
                continue;
            };
            matched += 1;

            let value = record.value_of(prop.name)?.unwrap_or(Value::Null);
            let entry = &mut self.entries[i];
            entry.bind(value);
            if entry.is_formal_parameter() {
                entry.flags.insert(RoleFlags::USE_PARAMETER);
            }
            if let Some(changed) = &changed {
                if !changed.iter().any(|c| c.eq_ignore_ascii_case(prop.name)) {
                    entry.flags.remove(RoleFlags::USE_FOR_UPDATE);
                }
            }
            if use_object_defined_keys && prop.is_key {
                entry.flags.insert(RoleFlags::IS_KEY);
            }
            if prop.ignore_on_insert {
                entry.flags.remove(RoleFlags::USE_FOR_INSERT);
            }
            if prop.ignore_on_update {
                entry.flags.remove(RoleFlags::USE_FOR_UPDATE);
            }
        }

        if matched == 0 {
            return Err(self.mapping_error("no property of the argument matched a column"));
        }
        Ok(())
    }
}
