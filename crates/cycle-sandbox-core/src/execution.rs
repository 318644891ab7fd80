//! Running a model and harvesting outputs.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{require_session_id, ToolError};
use crate::model::{CycleModel, ModelError};
use crate::session::SessionStore;

/// Outputs read after a run when the caller names none.
pub const DEFAULT_OUTPUTS: &[&str] = &["Fn", "Fnet", "TSFC", "eff", "power"];

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    /// Requested outputs; unreadable ones are `null`.
    pub outputs: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_norm: Option<f64>,
    pub messages: Vec<String>,
}

/// Requested output names, or [`DEFAULT_OUTPUTS`] when none are given.
pub fn outputs_or_default(outputs_of_interest: &[String]) -> Vec<String> {
    if outputs_of_interest.is_empty() {
        DEFAULT_OUTPUTS.iter().map(|s| s.to_string()).collect()
    } else {
        outputs_of_interest.to_vec()
    }
}

/// Run an already-locked model and read `outputs`.
///
/// A run failure is returned as-is. Output read failures are recorded in
/// `messages` and leave a `null` in `outputs`.
pub fn run_model(
    model: &mut dyn CycleModel,
    outputs: &[String],
    use_driver: bool,
) -> Result<RunOutput, ModelError> {
    let mut messages = vec![if use_driver { "Ran driver" } else { "Ran model" }.to_string()];
    model.run(use_driver)?;

    let mut values = Map::new();
    for name in outputs {
        match model.get(name) {
            Ok(value) => {
                values.insert(name.clone(), value);
            }
            Err(e) => {
                values.insert(name.clone(), Value::Null);
                messages.push(format!("Missing output {}: {}", name, e));
            }
        }
    }

    Ok(RunOutput {
        success: true,
        converged: model.converged(),
        iterations: model.iteration_count(),
        outputs: values,
        residual_norm: model.residual_norm(),
        messages,
    })
}

/// Run a session's model directly or through its driver.
pub fn run_cycle(
    store: &SessionStore,
    session_id: &str,
    outputs_of_interest: &[String],
    use_driver: bool,
) -> Result<RunOutput, ToolError> {
    require_session_id(session_id)?;
    let session = store.get(session_id)?;
    let outputs = outputs_or_default(outputs_of_interest);

    let mut model = session.model();
    let result = run_model(&mut **model, &outputs, use_driver);
    match &result {
        Ok(out) => tracing::debug!(session_id, iterations = ?out.iterations, "run finished"),
        Err(e) => tracing::warn!(session_id, error = %e, "run failed"),
    }
    result.map_err(ToolError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariableMeta;
    use crate::session::SessionMeta;
    use crate::table::TableModel;
    use serde_json::json;

    fn store_with(model: TableModel) -> (SessionStore, String) {
        let store = SessionStore::default();
        let id = store
            .create(Box::new(model), SessionMeta::new("custom", "design"))
            .unwrap();
        (store, id)
    }

    fn thrust_model() -> TableModel {
        TableModel::new("probe")
            .with_input("Mach", VariableMeta::default())
            .with_output("Fn", VariableMeta::default())
            .with_output("TSFC", VariableMeta::default().with_value(json!(0.55)))
            .with_run_hook(|values, _| {
                let mach = values.get_f64("Mach").unwrap_or(0.0);
                values.set_f64("Fn", 1000.0 + mach);
                Ok(())
            })
    }

    #[test]
    fn default_outputs_tolerate_missing_names() {
        let (store, id) = store_with(thrust_model());
        let out = run_cycle(&store, &id, &[], false).unwrap();

        assert!(out.success);
        assert_eq!(out.converged, Some(true));
        assert_eq!(out.iterations, Some(1));
        let keys: Vec<&String> = out.outputs.keys().collect();
        assert_eq!(keys, vec!["Fn", "Fnet", "TSFC", "eff", "power"]);
        assert_eq!(out.outputs["Fn"], json!(1000.0));
        assert_eq!(out.outputs["Fnet"], Value::Null);
        assert_eq!(out.messages[0], "Ran model");
        assert_eq!(out.messages.len(), 4);
        assert!(out.messages[1].starts_with("Missing output Fnet:"));
    }

    #[test]
    fn driver_runs_are_labelled() {
        let (store, id) = store_with(thrust_model());
        let out = run_cycle(&store, &id, &["TSFC".to_string()], true).unwrap();
        assert_eq!(out.messages, vec!["Ran driver"]);
        assert_eq!(out.outputs["TSFC"], json!(0.55));
    }

    #[test]
    fn run_failure_is_fatal() {
        let model = TableModel::new("stuck").with_run_hook(|_, _| Err("Newton diverged".into()));
        let (store, id) = store_with(model);
        let err = run_cycle(&store, &id, &[], false).unwrap_err();
        assert_eq!(err.type_name(), "RunError");
        assert_eq!(err.message, "Newton diverged");
    }

    #[test]
    fn run_on_closed_session_fails() {
        let (store, id) = store_with(thrust_model());
        store.close(&id);
        let err = run_cycle(&store, &id, &[], false).unwrap_err();
        assert_eq!(err.type_name(), "SessionNotFound");
    }
}
