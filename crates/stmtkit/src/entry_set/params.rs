//! Parameter extraction.
//!
//! Both orders scan in two passes, slot 1 first, then slot 2, matching the order
//! placeholders were emitted in.

use super::EntrySet;
use crate::config::ParameterOrder;
use crate::entry::{RoleFlags, StatementEntry};
use serde_json::Value;

/// Appended to the variable name of second-slot parameters.
pub const SECOND_SLOT_SUFFIX: &str = "_2";

/// Which parameter slot an entry is bound through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSlot {
    First,
    Second,
}

impl ParameterSlot {
    /// The flag marking an entry as bound through this slot.
    pub fn flag(self) -> RoleFlags {
        match self {
            Self::First => RoleFlags::USE_PARAMETER,
            Self::Second => RoleFlags::USE_PARAMETER2,
        }
    }

    /// Placeholder variable name of `entry` in this slot.
    pub fn variable_name(self, entry: &StatementEntry) -> String {
        let base = match (self, &entry.override_column) {
            (Self::First, Some(column)) => &column.variable_name,
            _ => &entry.descriptor.variable_name,
        };
        match self {
            Self::First => base.clone(),
            Self::Second => format!("{base}{SECOND_SLOT_SUFFIX}"),
        }
    }

    fn bound_value(self, entry: &StatementEntry) -> Option<Value> {
        match self {
            Self::First => match (&entry.value, &entry.override_column) {
                (Some(v), _) => Some(v.clone()),
                (None, Some(_)) => Some(Value::Null),
                (None, None) => None,
            },
            Self::Second => entry.slot2_value().cloned(),
        }
    }
}

/// Direction of a driver parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterDirection {
    Input,
    /// Read back after execution (generated keys).
    Output,
}

/// A concrete parameter handed to the execution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Placeholder variable name (slot-2 names carry [`SECOND_SLOT_SUFFIX`]).
    pub name: String,
    /// Wire name of the column the parameter belongs to.
    pub column: String,
    pub db_type: String,
    pub value: Value,
    pub slot: ParameterSlot,
    pub direction: ParameterDirection,
}

impl Parameter {
    fn input(entry: &StatementEntry, slot: ParameterSlot, value: Value) -> Self {
        let db_type = match (slot, &entry.override_column) {
            (ParameterSlot::First, Some(column)) => column.db_type.clone(),
            _ => entry.descriptor.db_type.clone(),
        };
        Self {
            name: slot.variable_name(entry),
            column: entry.wire_name().to_string(),
            db_type,
            value,
            slot,
            direction: ParameterDirection::Input,
        }
    }
}

impl EntrySet {
    /// Parameters for every entry an emitter marked, in `order`.
    ///
    /// Entries without a bound value are skipped.
    pub fn extract_parameters(&self, order: ParameterOrder) -> Vec<Parameter> {
        let mut out = Vec::new();
        for slot in [ParameterSlot::First, ParameterSlot::Second] {
            match order {
                ParameterOrder::Natural => self.extract_pass(slot, |_| true, &mut out),
                ParameterOrder::KeysLast => {
                    self.extract_pass(slot, |e| !e.is_key(), &mut out);
                    self.extract_pass(slot, StatementEntry::is_key, &mut out);
                }
            }
        }
        out
    }

    /// Key parameters to read back when the primary key is generated by the database.
    ///
    /// Returns `None` unless some key column is an identity column.
    pub fn extract_identity_key_parameters(&self) -> Option<Vec<Parameter>> {
        let keys: Vec<&StatementEntry> = self.entries.iter().filter(|e| e.is_key()).collect();
        if !keys.iter().any(|e| e.descriptor.is_identity) {
            return None;
        }
        Some(
            keys.into_iter()
                .map(|e| Parameter {
                    direction: ParameterDirection::Output,
                    ..Parameter::input(
                        e,
                        ParameterSlot::First,
                        e.value.clone().unwrap_or(Value::Null),
                    )
                })
                .collect(),
        )
    }

    fn extract_pass(
        &self,
        slot: ParameterSlot,
        include: impl Fn(&StatementEntry) -> bool,
        out: &mut Vec<Parameter>,
    ) {
        for entry in &self.entries {
            if !entry.has(slot.flag()) || !include(entry) {
                continue;
            }
            if let Some(value) = slot.bound_value(entry) {
                out.push(Parameter::input(entry, slot, value));
            }
        }
    }
}
