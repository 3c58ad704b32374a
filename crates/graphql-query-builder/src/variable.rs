//! Typed operation variables and the registry that declares them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::arguments::Arguments;
use crate::error::{QueryBuilderError, Result};
use crate::value::{Value, VARIABLE_MARKER};

/// A `$name: Type` variable declaration.
///
/// Variables are value objects ordered by name, then type. Inside argument
/// lists they render as a bare `$name` reference; the type only appears in
/// the operation's variable list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    name: String,
    type_name: String,
}

impl Variable {
    /// Creates a variable, validating that the name is `$`-prefixed and the
    /// type is not empty.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        let type_name = type_name.into().trim().to_string();

        if name.len() < 2 || !name.starts_with('$') {
            return Err(QueryBuilderError::InvalidVariableName { name });
        }
        if type_name.is_empty() {
            return Err(QueryBuilderError::InvalidVariableType { name });
        }

        Ok(Self { name, type_name })
    }

    /// The `$`-prefixed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The declaration form, `$name:Type`.
    #[must_use]
    pub fn declaration(&self) -> String {
        format!("{}:{}", self.name, self.type_name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(VARIABLE_MARKER, &self.declaration())
    }
}

/// Ordered, deduplicated set of variable declarations.
///
/// The set is authoritative: every registered variable is declared in the
/// rendered document whether or not an argument references it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeSet<Variable>);

impl VariableSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable. Returns `false` if the exact declaration was
    /// already present.
    pub fn add(&mut self, variable: Variable) -> bool {
        self.0.insert(variable)
    }

    /// Adds every variable of `other` to this set.
    pub fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Registers every variable found anywhere inside `value`.
    pub fn extract_from_value(&mut self, value: &Value) {
        value.for_each_variable(&mut |variable| {
            if !self.0.contains(variable) {
                self.0.insert(variable.clone());
            }
        });
    }

    /// Registers every variable referenced by an argument list.
    pub fn extract_from_arguments(&mut self, arguments: &Arguments) {
        for value in arguments.values() {
            self.extract_from_value(value);
        }
    }

    #[must_use]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.0.contains(variable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.0.iter()
    }

    /// Renders the `($a:T, $b:U)` variable-list clause, or an empty string
    /// when no variable is registered.
    #[must_use]
    pub fn to_declaration_list(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        let declarations: Vec<String> = self.0.iter().map(Variable::declaration).collect();
        format!("({})", declarations.join(", "))
    }
}

impl<'a> IntoIterator for &'a VariableSet {
    type Item = &'a Variable;
    type IntoIter = std::collections::btree_set::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Variable> for VariableSet {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
