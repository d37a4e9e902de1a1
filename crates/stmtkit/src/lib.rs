//! # stmtkit
//!
//! A provider-agnostic SQL statement builder driven by schema metadata and runtime
//! arguments.
//!
//! ## Features
//!
//! - **Metadata driven**: one cached template per shape, built from column descriptors
//! - **Argument binding**: host objects (`#[derive(Record)]`) or JSON maps, matched by name
//! - **Rules**: computed / audit values, per-user column restrictions, soft delete
//! - **Two parameter slots**: the same column can appear twice with different values
//! - **Dialect injection**: identifier quoting and placeholder syntax are configuration
//! - **Safe defaults**: UPDATE requires SET, filter-driven writes require a predicate
//!
//! ## Statements
//!
//! ```ignore
//! use stmtkit::{Argument, BuilderConfig, SchemaRegistry, Statements, UserContext};
//!
//! let statements = Statements::new(Arc::new(registry), BuilderConfig::new());
//! let user = UserContext::user("u-1");
//!
//! // INSERT
//! let stmt = statements.insert("Customer", Argument::object(&customer), &user)?;
//!
//! // UPDATE only what changed
//! let stmt = statements.update_by_key(
//!     "Customer",
//!     Argument::object(&tracked),
//!     WriteOptions::new().changed_only(),
//!     &user,
//! )?;
//!
//! // SELECT with a filter map
//! let stmt = statements.select_by_filter(
//!     "Customer",
//!     Some(Argument::from_json(&filter)?),
//!     &SelectSpec::new().order_by(SortSpec::parse("Name DESC")?),
//!     &user,
//! )?;
//! ```
//!
//! The lower-level [`EntrySet`] pipeline is public for statements the façade does not
//! cover.

pub mod cache;
pub mod config;
pub mod entry;
pub mod entry_set;
pub mod error;
pub mod reflect;
pub mod rules;
pub mod schema;
pub mod statement;

pub use cache::TemplateCache;
pub use config::{BuilderConfig, Dialect, ParameterOrder, Placeholder};
pub use entry::{RoleFlags, StatementEntry};
pub use entry_set::{
    ClauseFrame, DesiredColumns, EntrySet, FilterOptions, Parameter, ParameterDirection,
    ParameterSlot, SECOND_SLOT_SUFFIX, SortSpec, StatementContext,
};
pub use error::{StmtError, StmtResult};
pub use reflect::{Argument, DynRecord, PropertyInfo, Record, Tracked};
pub use rules::{
    NoRules, OperationKind, Restriction, RestrictionKinds, RuleInput, RuleProvider, RuleSet,
    SoftDeleteRule, UserContext, ValueRule,
};
pub use schema::{ColumnDescriptor, MetadataSource, SchemaRegistry, ShapeSchema};
pub use statement::{BuiltStatement, SelectSpec, StatementKind, Statements, WriteOptions};

#[cfg(feature = "derive")]
pub use stmtkit_derive::Record;

// Re-export serde_json for use by derive macros
#[doc(hidden)]
pub use serde_json;
