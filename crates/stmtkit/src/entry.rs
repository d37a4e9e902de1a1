//! Per-column statement state.
//!
//! A [`StatementEntry`] is a plain record: a shared descriptor, a small [`RoleFlags`]
//! bitset and the bound value(s). Entry sets keep them in a contiguous `Vec` so that
//! cloning a template is a single element-wise copy.

use crate::schema::ColumnDescriptor;
use serde_json::Value;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Role flags carried by a [`StatementEntry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleFlags(u16);

impl RoleFlags {
    pub const NONE: Self = Self(0);
    pub const IS_FORMAL_PARAMETER: Self = Self(1 << 0);
    pub const USE_FOR_INSERT: Self = Self(1 << 1);
    pub const USE_FOR_UPDATE: Self = Self(1 << 2);
    pub const USE_FOR_READ: Self = Self(1 << 3);
    pub const IS_KEY: Self = Self(1 << 4);
    pub const USE_PARAMETER: Self = Self(1 << 5);
    pub const USE_PARAMETER2: Self = Self(1 << 6);
    pub const RESTRICTED_READ: Self = Self(1 << 7);
    pub const RESTRICTED_INSERT: Self = Self(1 << 8);
    pub const RESTRICTED_UPDATE: Self = Self(1 << 9);
    pub const USE_CLR_NAME_AS_ALIAS: Self = Self(1 << 10);

    const NAMES: [(Self, &'static str); 11] = [
        (Self::IS_FORMAL_PARAMETER, "IsFormalParameter"),
        (Self::USE_FOR_INSERT, "UseForInsert"),
        (Self::USE_FOR_UPDATE, "UseForUpdate"),
        (Self::USE_FOR_READ, "UseForRead"),
        (Self::IS_KEY, "IsKey"),
        (Self::USE_PARAMETER, "UseParameter"),
        (Self::USE_PARAMETER2, "UseParameter2"),
        (Self::RESTRICTED_READ, "RestrictedRead"),
        (Self::RESTRICTED_INSERT, "RestrictedInsert"),
        (Self::RESTRICTED_UPDATE, "RestrictedUpdate"),
        (Self::USE_CLR_NAME_AS_ALIAS, "UseClrNameAsAlias"),
    ];

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set or clear `other` depending on `on`.
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for RoleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RoleFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for RoleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// One column or formal parameter within a statement build.
#[derive(Debug, Clone)]
pub struct StatementEntry {
    pub descriptor: Arc<ColumnDescriptor>,
    pub flags: RoleFlags,
    /// Slot-1 value. `None` is unset, `Some(Value::Null)` is an explicit null.
    pub value: Option<Value>,
    /// Slot-2 value, written by second-slot filter binding. Falls back to `value`.
    pub second_value: Option<Value>,
    /// Column supplied by a table-valued / bulk parameter instead of a scalar value.
    pub override_column: Option<Arc<ColumnDescriptor>>,
}

impl StatementEntry {
    /// Entry for a table column: key from the primary key flag, insert/update
    /// eligibility unless computed or identity.
    pub fn column(descriptor: Arc<ColumnDescriptor>) -> Self {
        let mut flags = RoleFlags::NONE;
        flags.set(RoleFlags::IS_KEY, descriptor.is_primary_key);
        let writable = !(descriptor.is_computed || descriptor.is_identity);
        flags.set(RoleFlags::USE_FOR_INSERT | RoleFlags::USE_FOR_UPDATE, writable);
        Self::with_flags(descriptor, flags)
    }

    /// Entry for a formal parameter of a procedure / table function.
    pub fn formal_parameter(descriptor: Arc<ColumnDescriptor>) -> Self {
        Self::with_flags(descriptor, RoleFlags::IS_FORMAL_PARAMETER)
    }

    fn with_flags(descriptor: Arc<ColumnDescriptor>, flags: RoleFlags) -> Self {
        Self {
            descriptor,
            flags,
            value: None,
            second_value: None,
            override_column: None,
        }
    }

    pub fn wire_name(&self) -> &str {
        &self.descriptor.wire_name
    }

    pub fn host_name(&self) -> &str {
        &self.descriptor.host_name
    }

    /// Case-insensitive match against the wire or host name.
    pub fn matches(&self, name: &str) -> bool {
        self.descriptor.matches(name)
    }

    pub fn has(&self, flag: RoleFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_key(&self) -> bool {
        self.has(RoleFlags::IS_KEY)
    }

    pub fn is_formal_parameter(&self) -> bool {
        self.has(RoleFlags::IS_FORMAL_PARAMETER)
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Bind a slot-1 value.
    pub fn bind(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Value to bind for the second parameter slot.
    pub fn slot2_value(&self) -> Option<&Value> {
        self.second_value.as_ref().or(self.value.as_ref())
    }

    /// Eligible for the INSERT column / VALUES lists.
    pub fn projects_for_insert(&self) -> bool {
        !self.has(RoleFlags::RESTRICTED_INSERT)
            && self.has(RoleFlags::USE_FOR_INSERT)
            && (self.value.is_some() || self.override_column.is_some())
    }

    /// Eligible for the UPDATE SET list.
    pub fn projects_for_update(&self) -> bool {
        !self.has(RoleFlags::RESTRICTED_UPDATE)
            && self.has(RoleFlags::USE_FOR_UPDATE)
            && self.value.is_some()
    }

    /// Eligible for the SELECT list.
    pub fn projects_for_read(&self) -> bool {
        !self.has(RoleFlags::RESTRICTED_READ) && self.has(RoleFlags::USE_FOR_READ)
    }
}
