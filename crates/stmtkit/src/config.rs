//! Builder configuration.
//!
//! Dialect details (identifier quoting, placeholder syntax) are injected here instead
//! of being hard-coded in the clause emitters.

use serde::Deserialize;

/// Placeholder syntax.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Placeholder {
    /// `prefix` + the descriptor's variable name, e.g. `@Name` or `:Name`.
    Named { prefix: String },
    /// The same marker for every parameter, e.g. `?`.
    Positional { marker: String },
}

impl Placeholder {
    pub fn named(prefix: impl Into<String>) -> Self {
        Self::Named {
            prefix: prefix.into(),
        }
    }

    pub fn positional(marker: impl Into<String>) -> Self {
        Self::Positional {
            marker: marker.into(),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Positional { .. })
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::named("@")
    }
}

/// Identifier quoting and placeholder syntax of the target database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub open_quote: String,
    pub close_quote: String,
    pub placeholder: Placeholder,
}

impl Dialect {
    /// No quoting, `@name` placeholders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set identifier quote characters.
    pub fn quote(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open_quote = open.into();
        self.close_quote = close.into();
        self
    }

    /// Set placeholder syntax.
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Append a quoted identifier.
    pub fn write_ident(&self, out: &mut String, ident: &str) {
        out.push_str(&self.open_quote);
        out.push_str(ident);
        out.push_str(&self.close_quote);
    }

    /// Append a placeholder for `variable_name`.
    pub fn write_placeholder(&self, out: &mut String, variable_name: &str) {
        match &self.placeholder {
            Placeholder::Named { prefix } => {
                out.push_str(prefix);
                out.push_str(variable_name);
            }
            Placeholder::Positional { marker } => out.push_str(marker),
        }
    }

    /// Append the positional marker regardless of the configured style.
    pub fn write_positional(&self, out: &mut String) {
        match &self.placeholder {
            Placeholder::Positional { marker } => out.push_str(marker),
            Placeholder::Named { .. } => out.push('?'),
        }
    }
}

/// Order in which extracted parameters are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterOrder {
    /// Entry order within each slot pass.
    #[default]
    Natural,
    /// Non-key entries first, then key entries, within each slot pass.
    KeysLast,
}

/// Configuration for statement building.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Require every supplied name to resolve to a column.
    pub strict: bool,
    pub parameter_order: ParameterOrder,
    pub dialect: Dialect,
    /// Skip null filter values instead of emitting `IS NULL`.
    pub ignore_null_filter_properties: bool,
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable strict name resolution.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Set the parameter order.
    pub fn parameter_order(mut self, order: ParameterOrder) -> Self {
        self.parameter_order = order;
        self
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Skip null filter values.
    pub fn ignore_null_filter_properties(mut self) -> Self {
        self.ignore_null_filter_properties = true;
        self
    }
}
