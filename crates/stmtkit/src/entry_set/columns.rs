//! Desired-column selection for SELECT lists.

use super::EntrySet;
use crate::entry::{RoleFlags, StatementEntry};
use crate::error::{StmtError, StmtResult};

/// Which columns a read should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredColumns {
    /// Explicit names (host or wire, case-insensitive).
    Names(Vec<String>),
    /// Enough to re-fetch the row after a write: the keys, else the identity columns.
    Auto,
    /// Every column.
    All,
}

impl DesiredColumns {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }
}

impl EntrySet {
    /// Mark entries as `UseForRead` according to `selector`.
    pub fn apply_desired_columns(&mut self, selector: &DesiredColumns) -> StmtResult<()> {
        match selector {
            DesiredColumns::Names(names) => {
                if names.is_empty() {
                    return Err(StmtError::precondition("desired column list is empty"));
                }
                let mut matched = 0usize;
                for name in names {
                    match self.position(name) {
                        Some(i) => {
                            self.entries[i].flags.insert(RoleFlags::USE_FOR_READ);
                            matched += 1;
                        }
                        None if self.strict => {
                            return Err(self.mapping_error(format!(
                                "desired column '{name}' does not match any column"
                            )));
                        }
                        None => {}
                    }
                }
                if matched == 0 {
                    return Err(self.mapping_error("no desired column matched"));
                }
            }
            DesiredColumns::Auto => {
                let mut picked: Vec<usize> = self.pick(StatementEntry::is_key);
                if picked.is_empty() {
                    picked = self.pick(|e| e.descriptor.is_identity);
                }
                if picked.is_empty() {
                    return Err(
                        self.mapping_error("no key or identity column to select the row by")
                    );
                }
                for i in picked {
                    self.entries[i].flags.insert(RoleFlags::USE_FOR_READ);
                }
            }
            DesiredColumns::All => {
                for entry in self.entries.iter_mut() {
                    if !entry.wire_name().is_empty() && !entry.is_formal_parameter() {
                        entry.flags.insert(RoleFlags::USE_FOR_READ);
                    }
                }
            }
        }
        Ok(())
    }
}
