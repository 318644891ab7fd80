//! Table-backed model handle.
//!
//! `TableModel` keeps its variables in ordered tables and has no solver of its own.
//! A run hook can be attached to compute outputs from inputs (or to fail), which is
//! how tests and lightweight analytic models plug in. Seeded derivatives answer
//! `compute_totals`.
//!
//! A [`CycleDefinition`] is the on-disk (JSON) form of a table model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use crate::model::{CycleModel, ModelError, Totals, VariableList, VariableMeta};

/// Hook invoked on every run with the live variable values and the driver flag.
pub type RunHook = Box<dyn FnMut(&mut TableValues, bool) -> Result<(), String> + Send>;

/// Mutable view of a table model's values handed to a [`RunHook`].
#[derive(Debug, Default)]
pub struct TableValues {
    values: Map<String, Value>,
    residual_norm: Option<f64>,
}

impl TableValues {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Numeric value of a scalar (or single-element array) variable.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(scalar_f64)
    }

    /// Overwrite a value. Unknown names are ignored so hooks cannot grow the table.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
    }

    pub fn set_f64(&mut self, name: &str, value: f64) {
        self.set(name, Value::from(value));
    }

    pub fn set_residual_norm(&mut self, norm: f64) {
        self.residual_norm = Some(norm);
    }
}

/// In-memory model handle.
pub struct TableModel {
    name: String,
    mode: Option<String>,
    inputs: Vec<(String, VariableMeta)>,
    outputs: Vec<(String, VariableMeta)>,
    state: TableValues,
    totals: HashMap<(String, String), Value>,
    run_hook: Option<RunHook>,
    iterations: u64,
    converged: Option<bool>,
}

impl std::fmt::Debug for TableModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableModel")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            state: TableValues::default(),
            totals: HashMap::new(),
            run_hook: None,
            iterations: 0,
            converged: None,
        }
    }

    /// Add an input variable. Its initial value comes from `meta.value` (default `0.0`).
    pub fn with_input(mut self, name: impl Into<String>, meta: VariableMeta) -> Self {
        let name = name.into();
        self.insert_value(&name, &meta);
        self.inputs.push((name, meta));
        self
    }

    /// Add an output variable. Its initial value comes from `meta.value` (default `0.0`).
    pub fn with_output(mut self, name: impl Into<String>, meta: VariableMeta) -> Self {
        let name = name.into();
        self.insert_value(&name, &meta);
        self.outputs.push((name, meta));
        self
    }

    /// Seed the total derivative d`of`/d`wrt`.
    pub fn with_total(
        mut self,
        of: impl Into<String>,
        wrt: impl Into<String>,
        value: Value,
    ) -> Self {
        self.totals.insert((of.into(), wrt.into()), value);
        self
    }

    /// Attach a hook that runs on every `run` call.
    pub fn with_run_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut TableValues, bool) -> Result<(), String> + Send + 'static,
    {
        self.run_hook = Some(Box::new(hook));
        self
    }

    /// Mode applied at construction, if any.
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    fn insert_value(&mut self, name: &str, meta: &VariableMeta) {
        let initial = meta.value.clone().unwrap_or_else(|| Value::from(0.0));
        self.state.values.insert(name.to_string(), initial);
    }

    fn meta(&self, name: &str) -> Option<&VariableMeta> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    fn is_known(&self, name: &str) -> bool {
        self.state.values.contains_key(name)
    }

    fn snapshot(&self, table: &[(String, VariableMeta)]) -> VariableList {
        table
            .iter()
            .map(|(name, meta)| {
                let mut meta = meta.clone();
                meta.value = self.state.values.get(name).cloned();
                (name.clone(), meta)
            })
            .collect()
    }
}

impl CycleModel for TableModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_inputs(&self) -> VariableList {
        self.snapshot(&self.inputs)
    }

    fn list_outputs(&self) -> VariableList {
        self.snapshot(&self.outputs)
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        self.state
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::lookup(name))
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let Some(meta) = self.meta(name) else {
            return Err(ModelError::assignment(name, "no such variable"));
        };
        let Some(count) = numeric_len(&value) else {
            return Err(ModelError::assignment(name, "expected a numeric value"));
        };
        let expected: usize = meta
            .shape
            .as_ref()
            .map(|dims| dims.iter().product())
            .unwrap_or(1);
        if count != expected {
            return Err(ModelError::assignment(
                name,
                format!("expected {} element(s), got {}", expected, count),
            ));
        }
        self.state.values.insert(name.to_string(), value);
        Ok(())
    }

    fn run(&mut self, use_driver: bool) -> Result<(), ModelError> {
        self.iterations += 1;
        if let Some(hook) = self.run_hook.as_mut() {
            if let Err(message) = hook(&mut self.state, use_driver) {
                self.converged = Some(false);
                return Err(ModelError::run(message));
            }
        }
        self.converged = Some(true);
        Ok(())
    }

    fn compute_totals(&mut self, of: &[String], wrt: &[String]) -> Result<Totals, ModelError> {
        let mut totals = Totals::new();
        for o in of {
            if !self.is_known(o) {
                return Err(ModelError::derivative(format!("Unknown 'of' variable: {}", o)));
            }
            for w in wrt {
                if !self.is_known(w) {
                    return Err(ModelError::derivative(format!(
                        "Unknown 'wrt' variable: {}",
                        w
                    )));
                }
                let key = (o.clone(), w.clone());
                let value = self
                    .totals
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| Value::from(0.0));
                totals.insert(key, value);
            }
        }
        Ok(totals)
    }

    fn set_default_mode(&mut self, mode: &str) -> Result<(), ModelError> {
        self.mode = Some(mode.to_string());
        Ok(())
    }

    fn iteration_count(&self) -> Option<u64> {
        Some(self.iterations)
    }

    fn converged(&self) -> Option<bool> {
        self.converged
    }

    fn residual_norm(&self) -> Option<f64> {
        self.state.residual_norm
    }
}

/// Number of numeric leaves in a value, or `None` if any leaf is not a number.
fn numeric_len(value: &Value) -> Option<usize> {
    match value {
        Value::Number(_) => Some(1),
        Value::Array(items) => items.iter().map(numeric_len).sum(),
        _ => None,
    }
}

fn scalar_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) if items.len() == 1 => scalar_f64(&items[0]),
        _ => None,
    }
}

/// One variable entry in a [`CycleDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(flatten)]
    pub meta: VariableMeta,
}

/// One seeded derivative in a [`CycleDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalDefinition {
    pub of: String,
    pub wrt: String,
    pub value: Value,
}

/// Serializable description of a [`TableModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleDefinition {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<VariableDefinition>,
    #[serde(default)]
    pub outputs: Vec<VariableDefinition>,
    #[serde(default)]
    pub totals: Vec<TotalDefinition>,
}

impl CycleDefinition {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid cycle definition")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cycle definition: {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse cycle definition: {}", path.display()))
    }

    pub fn to_model(&self) -> TableModel {
        let mut model = TableModel::new(self.name.clone());
        for var in &self.inputs {
            model = model.with_input(var.name.clone(), var.meta.clone());
        }
        for var in &self.outputs {
            model = model.with_output(var.name.clone(), var.meta.clone());
        }
        for total in &self.totals {
            model = model.with_total(total.of.clone(), total.wrt.clone(), total.value.clone());
        }
        model
    }
}
