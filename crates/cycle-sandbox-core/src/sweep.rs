//! Parametric sweeps over the Cartesian product of input values.
//!
//! Combinations are enumerated in nested-loop order: the first axis varies
//! slowest and the last axis fastest. Each combination is applied with `set`
//! in axis order and then run through [`run_model`]. When two axes share a
//! name both writes happen, so the later axis wins.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{require_session_id, ToolError};
use crate::execution::{outputs_or_default, run_model};
use crate::model::{CycleModel, ModelError};
use crate::session::SessionStore;

/// One sweep axis: a variable and the values it takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepAxis {
    pub name: String,
    pub values: Vec<Value>,
}

/// Outcome of one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub inputs: Map<String, Value>,
    pub success: bool,
    pub outputs: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepOutput {
    pub results: Vec<SweepEntry>,
}

/// Options shared by every combination of a sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub outputs_of_interest: Vec<String>,
    pub use_driver: bool,
    pub skip_on_failure: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            outputs_of_interest: Vec::new(),
            use_driver: false,
            skip_on_failure: true,
        }
    }
}

/// Lazy Cartesian product over borrowed axes, last axis fastest.
///
/// Yields nothing when there are no axes or any axis is empty.
pub struct CartesianProduct<'a> {
    axes: Vec<&'a [Value]>,
    indices: Vec<usize>,
    done: bool,
}

impl<'a> CartesianProduct<'a> {
    pub fn new(axes: Vec<&'a [Value]>) -> Self {
        let done = axes.is_empty() || axes.iter().any(|axis| axis.is_empty());
        Self {
            indices: vec![0; axes.len()],
            axes,
            done,
        }
    }

    /// Number of combinations the product yields in total, saturating at `usize::MAX`.
    pub fn total(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes
            .iter()
            .fold(1usize, |acc, axis| acc.saturating_mul(axis.len()))
    }

    fn advance(&mut self) {
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.axes[pos].len() {
                return;
            }
            self.indices[pos] = 0;
        }
        self.done = true;
    }
}

impl<'a> Iterator for CartesianProduct<'a> {
    type Item = Vec<&'a Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combo = self
            .indices
            .iter()
            .zip(&self.axes)
            .map(|(&i, axis)| &axis[i])
            .collect();
        self.advance();
        Some(combo)
    }
}

/// Run every combination of `axes` against a session's model.
///
/// A failed run marks its combination as failed and the sweep moves on. A
/// failed assignment is recorded the same way under `skip_on_failure`;
/// without it the sweep aborts and collected results are dropped.
pub fn sweep_inputs(
    store: &SessionStore,
    session_id: &str,
    axes: &[SweepAxis],
    options: &SweepOptions,
) -> Result<SweepOutput, ToolError> {
    require_session_id(session_id)?;
    if axes.is_empty() {
        return Err(ToolError::validation("sweep must include at least one variable"));
    }

    let session = store.get(session_id)?;
    let outputs = outputs_or_default(&options.outputs_of_interest);
    let product = CartesianProduct::new(axes.iter().map(|a| a.values.as_slice()).collect());
    tracing::debug!(session_id, combinations = product.total(), "sweep started");

    let mut model = session.model();
    let mut results = Vec::new();

    for (index, combo) in product.enumerate() {
        tracing::debug!(session_id, combination = index, "sweep combination");
        let mut inputs = Map::new();
        for (axis, value) in axes.iter().zip(&combo) {
            inputs.insert(axis.name.clone(), (*value).clone());
        }

        if let Err(e) = apply_combination(&mut **model, axes, &combo) {
            if !options.skip_on_failure {
                let details = json!({ "combination": index, "inputs": inputs });
                return Err(ToolError::from(e).with_details(details));
            }
            tracing::warn!(
                session_id,
                combination = index,
                error = %e,
                "sweep combination could not be applied"
            );
            results.push(failed_entry(inputs, &e));
            continue;
        }

        match run_model(&mut **model, &outputs, options.use_driver) {
            Ok(run) => results.push(SweepEntry {
                inputs,
                success: run.success,
                outputs: run.outputs,
                error_message: None,
            }),
            Err(e) => {
                tracing::warn!(
                    session_id,
                    combination = index,
                    error = %e,
                    "sweep combination failed"
                );
                results.push(failed_entry(inputs, &e));
            }
        }
    }

    Ok(SweepOutput { results })
}

fn apply_combination(
    model: &mut dyn CycleModel,
    axes: &[SweepAxis],
    combo: &[&Value],
) -> Result<(), ModelError> {
    for (axis, value) in axes.iter().zip(combo) {
        model.set(&axis.name, (*value).clone())?;
    }
    Ok(())
}

fn failed_entry(inputs: Map<String, Value>, error: &ModelError) -> SweepEntry {
    SweepEntry {
        inputs,
        success: false,
        outputs: Map::new(),
        error_message: Some(error.to_string()),
    }
}
