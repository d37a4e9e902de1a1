//! Filter binding: filter objects / maps to WHERE fragments.

use super::params::ParameterSlot;
use super::EntrySet;
use crate::config::Dialect;
use crate::entry::RoleFlags;
use crate::error::{StmtError, StmtResult};
use crate::reflect::Argument;
use serde_json::Value;

/// Options for filter binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Skip null filter values instead of emitting `IS NULL`.
    pub ignore_null_properties: bool,
}

impl FilterOptions {
    pub fn ignore_nulls() -> Self {
        Self {
            ignore_null_properties: true,
        }
    }
}

#[derive(Clone, Copy)]
enum PlaceholderForm {
    Named,
    Anonymous,
}

impl EntrySet {
    /// Match a filter to columns and return `col = @var AND ...`, using the dialect's
    /// placeholder syntax with each descriptor's variable name. Values go to slot 1.
    ///
    /// Fragments are written in the set's parameter order whatever order the filter
    /// lists its properties in. A filter naming the same column twice (e.g. `name` and
    /// `Name`) is a mapping error.
    pub fn apply_filter_value(
        &mut self,
        filter: Argument<'_>,
        options: FilterOptions,
        dialect: &Dialect,
    ) -> StmtResult<String> {
        self.apply_filter_value_to_slot(filter, options, ParameterSlot::First, dialect)
    }

    /// Named-placeholder filter bound into `slot`. Second-slot placeholders carry the
    /// `_2` suffix so they never collide with a SET list over the same columns.
    pub fn apply_filter_value_to_slot(
        &mut self,
        filter: Argument<'_>,
        options: FilterOptions,
        slot: ParameterSlot,
        dialect: &Dialect,
    ) -> StmtResult<String> {
        self.bind_filter(filter, options, dialect, PlaceholderForm::Named, slot)
    }

    /// Like [`apply_filter_value`](Self::apply_filter_value) with positional placeholders.
    ///
    /// `use_second_slot` binds into the second parameter slot, for statements that
    /// apply the same filter twice or need the filter's parameters after slot-1 ones.
    pub fn apply_anonymous_filter_value(
        &mut self,
        filter: Argument<'_>,
        options: FilterOptions,
        use_second_slot: bool,
        dialect: &Dialect,
    ) -> StmtResult<String> {
        let slot = if use_second_slot {
            ParameterSlot::Second
        } else {
            ParameterSlot::First
        };
        self.bind_filter(filter, options, dialect, PlaceholderForm::Anonymous, slot)
    }

    fn bind_filter(
        &mut self,
        filter: Argument<'_>,
        options: FilterOptions,
        dialect: &Dialect,
        form: PlaceholderForm,
        slot: ParameterSlot,
    ) -> StmtResult<String> {
        let pairs = filter_pairs(filter)?;
        if pairs.is_empty() {
            return Err(StmtError::precondition("filter has no properties"));
        }

        let mut fragments: Vec<(usize, String)> = Vec::with_capacity(pairs.len());
        let mut matched: Vec<usize> = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            let Some(i) = self.position(&name) else {
                if self.strict {
                    return Err(
                        self.mapping_error(format!("filter property '{name}' does not match any column"))
                    );
                }
                continue;
            };
            if matched.contains(&i) {
                return Err(self.mapping_error(format!(
                    "filter names column '{}' more than once",
                    self.entries[i].wire_name()
                )));
            }
            matched.push(i);

            let entry = &mut self.entries[i];
            let mut fragment = String::new();
            dialect.write_ident(&mut fragment, entry.wire_name());

            if value.is_null() {
                if options.ignore_null_properties {
                    continue;
                }
                fragment.push_str(" IS NULL");
                fragments.push((i, fragment));
                continue;
            }

            fragment.push_str(" = ");
            match form {
                PlaceholderForm::Named => {
                    dialect.write_placeholder(&mut fragment, &slot.variable_name(entry))
                }
                PlaceholderForm::Anonymous => dialect.write_positional(&mut fragment),
            }
            match slot {
                ParameterSlot::First => {
                    entry.value = Some(value);
                    entry.flags.insert(RoleFlags::USE_PARAMETER);
                }
                ParameterSlot::Second => {
                    entry.second_value = Some(value);
                    entry.flags.insert(RoleFlags::USE_PARAMETER2);
                }
            }
            fragments.push((i, fragment));
        }

        if matched.is_empty() {
            return Err(self.mapping_error("no filter property matched a column"));
        }

        // Fragments follow entry order, not the caller's, so positional markers line
        // up with extraction.
        fragments.sort_by_key(|(i, _)| self.parameter_rank(*i));

        let fragments: Vec<String> = fragments.into_iter().map(|(_, f)| f).collect();
        Ok(fragments.join(" AND "))
    }
}

fn filter_pairs(filter: Argument<'_>) -> StmtResult<Vec<(String, Value)>> {
    match filter {
        Argument::Map(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Argument::Object(record) => {
            let mut pairs = Vec::new();
            for prop in record.describe() {
                let Some(column) = prop.column else {
                    continue;
                };
                if !prop.can_read {
                    continue;
                }
                let value = record.value_of(prop.name)?.unwrap_or(Value::Null);
                pairs.push((column.to_string(), value));
            }
            Ok(pairs)
        }
    }
}
