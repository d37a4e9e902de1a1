//! Clause emitters.
//!
//! Each emitter appends `header`, the joined fragments and `footer` to a caller-owned
//! buffer, and only if at least one entry projects. Emitters that render placeholders
//! also mark the projected entries with `UseParameter` / `UseParameter2`: a column
//! appearing in the clause and a column needing a bound parameter are the same fact.

use super::params::ParameterSlot;
use super::EntrySet;
use crate::config::{Dialect, ParameterOrder};
use crate::entry::{RoleFlags, StatementEntry};
use crate::error::{StmtError, StmtResult};
use crate::rules::SoftDeleteRule;

/// Caller-supplied text around an emitted list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClauseFrame<'a> {
    pub header: &'a str,
    /// Written before every column identifier, e.g. a table alias `c.`.
    pub prefix: &'a str,
    pub footer: &'a str,
}

impl<'a> ClauseFrame<'a> {
    pub fn new(header: &'a str, footer: &'a str) -> Self {
        Self {
            header,
            prefix: "",
            footer,
        }
    }

    pub fn prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = prefix;
        self
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Host or wire name.
    pub name: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: true,
        }
    }

    /// Parse `"Name"`, `"Name ASC"` or `"Name DESC"` (direction case-insensitive).
    pub fn parse(spec: &str) -> StmtResult<Self> {
        let mut parts = spec.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(StmtError::precondition("sort expression is empty"));
        };
        let descending = match parts.next() {
            None => false,
            Some(d) if d.eq_ignore_ascii_case("asc") => false,
            Some(d) if d.eq_ignore_ascii_case("desc") => true,
            Some(d) => {
                return Err(StmtError::precondition(format!(
                    "invalid sort direction '{d}' in '{spec}'"
                )));
            }
        };
        if parts.next().is_some() {
            return Err(StmtError::precondition(format!(
                "unexpected trailing input in sort expression '{spec}'"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            descending,
        })
    }
}

impl EntrySet {
    /// INSERT column list.
    pub fn emit_insert_columns(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
    ) -> bool {
        let picked = self.pick_for_parameters(StatementEntry::projects_for_insert);
        self.write_list(out, frame, ", ", &picked, |out, entry| {
            entry.flags.insert(RoleFlags::USE_PARAMETER);
            out.push_str(frame.prefix);
            dialect.write_ident(out, entry.wire_name());
        })
    }

    /// INSERT VALUES list. Overridden entries use the override column's placeholder.
    pub fn emit_insert_values(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
    ) -> bool {
        let picked = self.pick_for_parameters(StatementEntry::projects_for_insert);
        self.write_list(out, frame, ", ", &picked, |out, entry| {
            entry.flags.insert(RoleFlags::USE_PARAMETER);
            dialect.write_placeholder(out, &ParameterSlot::First.variable_name(entry));
        })
    }

    /// UPDATE SET list: `col = @var, ...`.
    pub fn emit_set_list(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
    ) -> bool {
        let picked = self.pick_for_parameters(StatementEntry::projects_for_update);
        self.write_list(out, frame, ", ", &picked, |out, entry| {
            entry.flags.insert(RoleFlags::USE_PARAMETER);
            out.push_str(frame.prefix);
            dialect.write_ident(out, entry.wire_name());
            out.push_str(" = ");
            dialect.write_placeholder(out, &ParameterSlot::First.variable_name(entry));
        })
    }

    /// SELECT list. Entries flagged `UseClrNameAsAlias` are aliased to their host name.
    pub fn emit_select_list(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
    ) -> bool {
        let picked = self.pick(StatementEntry::projects_for_read);
        self.write_list(out, frame, ", ", &picked, |out, entry| {
            out.push_str(frame.prefix);
            dialect.write_ident(out, entry.wire_name());
            if entry.has(RoleFlags::USE_CLR_NAME_AS_ALIAS) {
                out.push_str(" AS ");
                dialect.write_ident(out, entry.host_name());
            }
        })
    }

    /// WHERE-by-key list: `key = @var AND ...`.
    ///
    /// Use [`ParameterSlot::Second`] when the keys are emitted a second time in the same
    /// statement. Fails if the shape has no key or a key has no bound value.
    pub fn emit_where_by_key(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
        slot: ParameterSlot,
    ) -> StmtResult<bool> {
        let picked = self.pick(StatementEntry::is_key);
        if picked.is_empty() {
            return Err(self.mapping_error("no key columns for a by-key operation"));
        }
        if let Some(&i) = picked.iter().find(|&&i| self.entries[i].value.is_none()) {
            return Err(self.mapping_error(format!(
                "key column '{}' has no bound value",
                self.entries[i].wire_name()
            )));
        }
        Ok(self.write_list(out, frame, " AND ", &picked, |out, entry| {
            entry.flags.insert(slot.flag());
            out.push_str(frame.prefix);
            dialect.write_ident(out, entry.wire_name());
            out.push_str(" = ");
            dialect.write_placeholder(out, &slot.variable_name(entry));
        }))
    }

    /// ORDER BY list. Every sort item must resolve to an entry; nothing is written otherwise.
    pub fn emit_order_by(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
        specs: &[SortSpec],
    ) -> StmtResult<bool> {
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let i = self.position(&spec.name).ok_or_else(|| {
                self.mapping_error(format!(
                    "sort column '{}' does not match any column",
                    spec.name
                ))
            })?;
            resolved.push((i, spec.descending));
        }
        if resolved.is_empty() {
            return Ok(false);
        }

        out.push_str(frame.header);
        for (n, (i, descending)) in resolved.into_iter().enumerate() {
            if n > 0 {
                out.push_str(", ");
            }
            out.push_str(frame.prefix);
            dialect.write_ident(out, self.entries[i].wire_name());
            if descending {
                out.push_str(" DESC");
            }
        }
        out.push_str(frame.footer);
        Ok(true)
    }

    /// Soft-delete predicate: `flag <> @var_2 AND ...`, bound to each rule's sentinel in
    /// the second slot. Rules hitting the same column are folded into one comparison.
    pub fn emit_soft_delete_predicate(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
        rules: &[SoftDeleteRule],
    ) -> bool {
        let mut picked: Vec<usize> = Vec::new();
        for rule in rules {
            let Some(i) = self.position(&rule.column) else {
                continue;
            };
            if picked.contains(&i) {
                continue;
            }
            self.entries[i].second_value = Some(rule.deleted_value.clone());
            picked.push(i);
        }
        self.order_for_parameters(&mut picked);
        self.write_list(out, frame, " AND ", &picked, |out, entry| {
            entry.flags.insert(RoleFlags::USE_PARAMETER2);
            out.push_str(frame.prefix);
            dialect.write_ident(out, entry.wire_name());
            out.push_str(" <> ");
            dialect.write_placeholder(out, &ParameterSlot::Second.variable_name(entry));
        })
    }

    /// Argument list of a procedure call: placeholders of every bound formal parameter.
    pub fn emit_call_arguments(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        dialect: &Dialect,
    ) -> bool {
        let picked = self.pick_for_parameters(|e| e.is_formal_parameter() && e.has_value());
        self.write_list(out, frame, ", ", &picked, |out, entry| {
            entry.flags.insert(RoleFlags::USE_PARAMETER);
            dialect.write_placeholder(out, &ParameterSlot::First.variable_name(entry));
        })
    }

    pub(super) fn pick(&self, pred: impl Fn(&StatementEntry) -> bool) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| pred(*e))
            .map(|(i, _)| i)
            .collect()
    }

    /// Like [`pick`](Self::pick), laid out the way extraction will read them back.
    fn pick_for_parameters(&self, pred: impl Fn(&StatementEntry) -> bool) -> Vec<usize> {
        let mut picked = self.pick(pred);
        self.order_for_parameters(&mut picked);
        picked
    }

    /// Reorder entry indices into extraction order.
    pub(super) fn order_for_parameters(&self, picked: &mut [usize]) {
        picked.sort_by_key(|&i| self.parameter_rank(i));
    }

    /// Sort key of entry `i` within one extraction pass: entry order, with keys
    /// behind non-keys under [`ParameterOrder::KeysLast`].
    pub(super) fn parameter_rank(&self, i: usize) -> (bool, usize) {
        let key_last = self.parameter_order == ParameterOrder::KeysLast && self.entries[i].is_key();
        (key_last, i)
    }

    fn write_list(
        &mut self,
        out: &mut String,
        frame: ClauseFrame<'_>,
        separator: &str,
        picked: &[usize],
        mut render: impl FnMut(&mut String, &mut StatementEntry),
    ) -> bool {
        if picked.is_empty() {
            return false;
        }
        out.push_str(frame.header);
        for (n, &i) in picked.iter().enumerate() {
            if n > 0 {
                out.push_str(separator);
            }
            render(out, &mut self.entries[i]);
        }
        out.push_str(frame.footer);
        true
    }
}
