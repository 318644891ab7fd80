//! Model handle abstraction.
//!
//! The session layers never talk to a numerical engine directly. They are written
//! against [`CycleModel`], the capability set a cycle simulation has to offer:
//! listing variables, reading and writing them, running, and computing total
//! derivatives. The in-memory [`crate::table::TableModel`] is one implementation;
//! engine adapters are another.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata reported for one model variable.
///
/// Every field is optional because engines differ in what they track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Canonical top-level name. `None` means the listed name is already canonical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_name: Option<String>,
    /// Current value of the variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

impl VariableMeta {
    /// Whether `name` is the variable's promoted (top-level) name.
    pub fn is_promoted(&self, name: &str) -> bool {
        self.promoted_name.as_deref().map_or(true, |p| p == name)
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_promoted_name(mut self, promoted: impl Into<String>) -> Self {
        self.promoted_name = Some(promoted.into());
        self
    }

    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Ordered `(name, metadata)` listing, in the engine's own order.
pub type VariableList = Vec<(String, VariableMeta)>;

/// Total derivatives keyed by `(of, wrt)`.
pub type Totals = HashMap<(String, String), Value>;

/// Failures raised by a model handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A variable name the model does not know.
    Lookup { name: String },
    /// A write that the model refused.
    Assignment { name: String, reason: String },
    /// Solver failure or non-convergence.
    Run { message: String },
    /// Total derivative computation failed.
    Derivative { message: String },
    /// The model could not be constructed.
    Build { message: String },
}

impl ModelError {
    pub fn lookup(name: impl Into<String>) -> Self {
        ModelError::Lookup { name: name.into() }
    }

    pub fn assignment(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Assignment {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn run(message: impl Into<String>) -> Self {
        ModelError::Run {
            message: message.into(),
        }
    }

    pub fn derivative(message: impl Into<String>) -> Self {
        ModelError::Derivative {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        ModelError::Build {
            message: message.into(),
        }
    }

    /// Class-name tag reported in error envelopes.
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelError::Lookup { .. } => "LookupError",
            ModelError::Assignment { .. } => "AssignmentError",
            ModelError::Run { .. } => "RunError",
            ModelError::Derivative { .. } => "DerivativeError",
            ModelError::Build { .. } => "BuildError",
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Lookup { name } => write!(f, "Unknown variable: {}", name),
            ModelError::Assignment { name, reason } => {
                write!(f, "Cannot set '{}': {}", name, reason)
            }
            ModelError::Run { message } => write!(f, "{}", message),
            ModelError::Derivative { message } => write!(f, "{}", message),
            ModelError::Build { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ModelError {}

/// Capability set of a cycle simulation model.
///
/// A handle is owned by exactly one session and is never mutated concurrently;
/// the session store serializes access through a per-session lock.
pub trait CycleModel: Send {
    /// Model name reported in summaries.
    fn name(&self) -> &str;

    fn list_inputs(&self) -> VariableList;

    fn list_outputs(&self) -> VariableList;

    /// Read a variable. Fails with [`ModelError::Lookup`] for unknown names.
    fn get(&self, name: &str) -> Result<Value, ModelError>;

    /// Write a variable. Fails with [`ModelError::Assignment`] for unknown names
    /// or incompatible values.
    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError>;

    /// Run the model directly, or through its driver when `use_driver` is set.
    fn run(&mut self, use_driver: bool) -> Result<(), ModelError>;

    /// Total derivatives of every `of` with respect to every `wrt`.
    fn compute_totals(&mut self, of: &[String], wrt: &[String]) -> Result<Totals, ModelError>;

    /// Finalize the model after construction-time settings are applied.
    fn setup(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Apply mode-specific defaults (e.g. "design" or "off-design").
    fn set_default_mode(&mut self, _mode: &str) -> Result<(), ModelError> {
        Ok(())
    }

    /// Solver iterations performed so far, if tracked.
    fn iteration_count(&self) -> Option<u64> {
        None
    }

    /// Convergence status of the last run, if known.
    fn converged(&self) -> Option<bool> {
        None
    }

    /// Residual norm after the last run, if known.
    fn residual_norm(&self) -> Option<f64> {
        None
    }
}
