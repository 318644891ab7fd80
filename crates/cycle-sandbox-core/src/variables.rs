//! Variable access: listing, setting inputs and reading outputs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{require_session_id, ErrorKind, ToolError};
use crate::model::VariableMeta;
use crate::session::SessionStore;

/// Default cap on `list_variables` results.
pub const DEFAULT_MAX_VARIABLES: usize = 200;

/// Which side of the model `list_variables` reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Inputs,
    Outputs,
    #[default]
    Both,
}

impl VariableKind {
    fn includes_inputs(self) -> bool {
        matches!(self, VariableKind::Inputs | VariableKind::Both)
    }

    fn includes_outputs(self) -> bool {
        matches!(self, VariableKind::Outputs | VariableKind::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Io {
    Input,
    Output,
}

/// A variable as rendered in tool responses. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io: Option<Io>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
}

impl NamedVariable {
    /// Full descriptor used by `list_variables`.
    pub fn descriptor(name: &str, meta: &VariableMeta, io: Io) -> Self {
        Self {
            name: name.to_string(),
            io: Some(io),
            promoted: Some(meta.is_promoted(name)),
            units: meta.units.clone(),
            shape: meta.shape.clone(),
            desc: meta.desc.clone(),
            value: meta.value.clone(),
            current_value: None,
        }
    }

    /// `{name, units, desc}` entry.
    pub fn brief(name: &str, meta: &VariableMeta) -> Self {
        Self {
            name: name.to_string(),
            units: meta.units.clone(),
            desc: meta.desc.clone(),
            ..Self::default()
        }
    }

    /// `{name, units, desc, current_value}` entry.
    pub fn with_current_value(name: &str, meta: &VariableMeta) -> Self {
        Self {
            current_value: meta.value.clone(),
            ..Self::brief(name, meta)
        }
    }
}

/// Filter applied by [`list_variables`].
#[derive(Debug, Clone)]
pub struct VariableFilter {
    pub kind: VariableKind,
    pub promoted_only: bool,
    pub name_filter: Option<String>,
    pub max_results: usize,
}

impl Default for VariableFilter {
    fn default() -> Self {
        Self {
            kind: VariableKind::Both,
            promoted_only: true,
            name_filter: None,
            max_results: DEFAULT_MAX_VARIABLES,
        }
    }
}

impl VariableFilter {
    fn accepts(&self, name: &str, meta: &VariableMeta) -> bool {
        if self.promoted_only && !meta.is_promoted(name) {
            return false;
        }
        match &self.name_filter {
            Some(needle) if !needle.is_empty() => {
                name.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListVariablesOutput {
    pub variables: Vec<NamedVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInput {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetInputsOutput {
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedInput>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetOutputsOutput {
    pub values: Map<String, Value>,
    pub missing: Vec<String>,
}

/// List a session's variables, inputs before outputs, filtered and truncated.
pub fn list_variables(
    store: &SessionStore,
    session_id: &str,
    filter: &VariableFilter,
) -> Result<ListVariablesOutput, ToolError> {
    let session = store.get(session_id)?;
    let model = session.model();

    let mut variables = Vec::new();
    if filter.kind.includes_inputs() {
        for (name, meta) in model.list_inputs() {
            if filter.accepts(&name, &meta) {
                variables.push(NamedVariable::descriptor(&name, &meta, Io::Input));
            }
        }
    }
    if filter.kind.includes_outputs() {
        for (name, meta) in model.list_outputs() {
            if filter.accepts(&name, &meta) {
                variables.push(NamedVariable::descriptor(&name, &meta, Io::Output));
            }
        }
    }
    variables.truncate(filter.max_results);

    Ok(ListVariablesOutput { variables })
}

/// Set inputs in the order given.
///
/// Without `allow_missing` the first failure aborts the call. Earlier writes stay
/// applied and are listed under `details.updated` of the error.
pub fn set_inputs(
    store: &SessionStore,
    session_id: &str,
    values: &Map<String, Value>,
    allow_missing: bool,
) -> Result<SetInputsOutput, ToolError> {
    require_session_id(session_id)?;
    if values.is_empty() {
        return Err(ToolError::validation("values must contain at least one entry"));
    }

    let session = store.get(session_id)?;
    let mut model = session.model();
    let mut output = SetInputsOutput::default();

    for (name, value) in values {
        match model.set(name, value.clone()) {
            Ok(()) => output.updated.push(name.clone()),
            Err(e) if allow_missing => {
                tracing::warn!(session_id, name = %name, error = %e, "input skipped");
                output.skipped.push(SkippedInput {
                    name: name.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                let details = json!({ "updated": output.updated });
                return Err(ToolError::from(e).with_details(details));
            }
        }
    }

    Ok(output)
}

/// Read outputs by name. Single-element arrays collapse to their scalar.
pub fn get_outputs(
    store: &SessionStore,
    session_id: &str,
    names: &[String],
    allow_missing: bool,
) -> Result<GetOutputsOutput, ToolError> {
    require_session_id(session_id)?;
    if names.is_empty() {
        return Err(ToolError::validation("names must contain at least one entry"));
    }

    let session = store.get(session_id)?;
    let model = session.model();
    let mut output = GetOutputsOutput::default();

    for name in names {
        match model.get(name) {
            Ok(value) => {
                output.values.insert(name.clone(), collapse_scalar(value));
            }
            Err(_) if allow_missing => output.missing.push(name.clone()),
            Err(_) => {
                return Err(ToolError::new(
                    ErrorKind::Model("LookupError"),
                    format!("Unknown output: {}", name),
                ));
            }
        }
    }

    Ok(output)
}

/// Unwrap arrays holding exactly one element, at any depth.
pub fn collapse_scalar(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => collapse_scalar(items.remove(0)),
        other => other,
    }
}
