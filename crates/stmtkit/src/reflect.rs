//! Host object reflection.
//!
//! The builder never inspects host types directly. It only needs, per type, the list of
//! [`PropertyInfo`] and a getter. `#[derive(Record)]` generates both; hand-written
//! implementations work the same way.
//!
//! # Example
//! ```ignore
//! use stmtkit::Record;
//!
//! #[derive(serde::Serialize, Record)]
//! #[orm(rename_all = "PascalCase")]
//! struct Customer {
//!     #[orm(key)]
//!     id: i64,
//!     name: String,
//!     #[orm(column = "Email")]
//!     email_address: Option<String>,
//! }
//! ```

use crate::error::{StmtError, StmtResult};
use serde_json::{Map, Value};

/// Reflection data for one host property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Host property name.
    pub name: &'static str,
    /// Column the property maps to. `None` means the property is not mapped.
    pub column: Option<&'static str>,
    pub can_read: bool,
    pub ignore_on_insert: bool,
    pub ignore_on_update: bool,
    pub is_key: bool,
}

impl PropertyInfo {
    /// A readable property mapped to `column`.
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column: Some(column),
            can_read: true,
            ignore_on_insert: false,
            ignore_on_update: false,
            is_key: false,
        }
    }

    /// A property with no mapped column.
    pub const fn unmapped(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            can_read: true,
            ignore_on_insert: false,
            ignore_on_update: false,
            is_key: false,
        }
    }

    pub const fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub const fn ignore_on_insert(mut self) -> Self {
        self.ignore_on_insert = true;
        self
    }

    pub const fn ignore_on_update(mut self) -> Self {
        self.ignore_on_update = true;
        self
    }

    pub const fn write_only(mut self) -> Self {
        self.can_read = false;
        self
    }
}

/// A host type the builder can bind from.
pub trait Record {
    /// Reflection data for every property, in declaration order.
    fn properties() -> &'static [PropertyInfo]
    where
        Self: Sized;

    /// Current value of the named property, `None` if there is no such property.
    fn property_value(&self, name: &str) -> StmtResult<Option<Value>>;

    /// Names of properties changed since the object was loaded.
    ///
    /// `None` means the type does not track changes.
    fn changed_properties(&self) -> Option<Vec<String>> {
        None
    }
}

/// Object-safe view of a [`Record`], used at the [`Argument`] boundary.
pub trait DynRecord {
    fn describe(&self) -> &'static [PropertyInfo];
    fn value_of(&self, name: &str) -> StmtResult<Option<Value>>;
    fn changed(&self) -> Option<Vec<String>>;
}

impl<T: Record> DynRecord for T {
    fn describe(&self) -> &'static [PropertyInfo] {
        T::properties()
    }

    fn value_of(&self, name: &str) -> StmtResult<Option<Value>> {
        self.property_value(name)
    }

    fn changed(&self) -> Option<Vec<String>> {
        self.changed_properties()
    }
}

/// A runtime argument: a host object or a string-keyed map.
#[derive(Clone, Copy)]
pub enum Argument<'a> {
    Object(&'a dyn DynRecord),
    Map(&'a Map<String, Value>),
}

impl<'a> Argument<'a> {
    /// Bind from a host object.
    pub fn object<T: Record>(record: &'a T) -> Self {
        Argument::Object(record)
    }

    /// Bind from a string-keyed map.
    pub fn map(map: &'a Map<String, Value>) -> Self {
        Argument::Map(map)
    }

    /// Bind from a JSON object value.
    pub fn from_json(value: &'a Value) -> StmtResult<Self> {
        value
            .as_object()
            .map(Argument::Map)
            .ok_or_else(|| StmtError::precondition("argument must be a JSON object"))
    }

    /// Look up a value by property name (objects) or key (maps, case-insensitive).
    pub fn get(&self, name: &str) -> StmtResult<Option<Value>> {
        match self {
            Argument::Object(record) => record.value_of(name),
            Argument::Map(map) => Ok(map
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())),
        }
    }
}

impl std::fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Object(record) => f
                .debug_tuple("Object")
                .field(&record.describe().iter().map(|p| p.name).collect::<Vec<_>>())
                .finish(),
            Argument::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

/// Adds change tracking to any [`Record`].
///
/// ```ignore
/// let mut customer = Tracked::new(loaded);
/// customer.get_mut().name = "Ann".into();
/// customer.mark_changed("name");
/// ```
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    changed: Vec<String>,
}

impl<T> Tracked<T> {
    /// Start tracking with no changes recorded.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            changed: Vec::new(),
        }
    }

    /// Record that `property` changed. Repeated marks are folded.
    pub fn mark_changed(&mut self, property: &str) {
        if !self.changed.iter().any(|p| p == property) {
            self.changed.push(property.to_string());
        }
    }

    /// Builder-style [`mark_changed`](Self::mark_changed).
    pub fn changed(mut self, property: &str) -> Self {
        self.mark_changed(property);
        self
    }

    /// Forget all recorded changes.
    pub fn reset(&mut self) {
        self.changed.clear();
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Record> Record for Tracked<T> {
    fn properties() -> &'static [PropertyInfo] {
        T::properties()
    }

    fn property_value(&self, name: &str) -> StmtResult<Option<Value>> {
        self.inner.property_value(name)
    }

    fn changed_properties(&self) -> Option<Vec<String>> {
        Some(self.changed.clone())
    }
}
