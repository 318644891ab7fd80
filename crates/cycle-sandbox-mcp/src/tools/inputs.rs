//! Input structs for MCP tool handlers.
//!
//! Every request rejects unknown fields. `_meta` is stripped by the dispatcher
//! before these are deserialized.

use serde::Deserialize;
use serde_json::{Map, Value};

use cycle_sandbox_core::derivatives::ReturnFormat;
use cycle_sandbox_core::sweep::SweepAxis;
use cycle_sandbox_core::variables::{VariableKind, DEFAULT_MAX_VARIABLES};

fn default_true() -> bool {
    true
}

fn default_max_variables() -> usize {
    DEFAULT_MAX_VARIABLES
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCycleModelInput {
    pub cycle_type: String,
    pub mode: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub cycle_module_path: Option<String>,
}

/// Input of tools that only name a session.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionInput {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListVariablesInput {
    pub session_id: String,
    #[serde(default)]
    pub kind: VariableKind,
    #[serde(default = "default_true")]
    pub promoted_only: bool,
    #[serde(default)]
    pub name_filter: Option<String>,
    #[serde(default = "default_max_variables")]
    pub max_variables: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetInputsInput {
    pub session_id: String,
    pub values: Map<String, Value>,
    #[serde(default)]
    pub allow_missing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetOutputsInput {
    pub session_id: String,
    pub names: Vec<String>,
    #[serde(default)]
    pub allow_missing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunCycleInput {
    pub session_id: String,
    #[serde(default)]
    pub outputs_of_interest: Vec<String>,
    #[serde(default)]
    pub use_driver: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepInputsInput {
    pub session_id: String,
    pub sweep: Vec<SweepAxis>,
    #[serde(default)]
    pub outputs_of_interest: Vec<String>,
    #[serde(default)]
    pub use_driver: bool,
    #[serde(default = "default_true")]
    pub skip_on_failure: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeTotalsInput {
    pub session_id: String,
    pub of: Vec<String>,
    pub wrt: Vec<String>,
    #[serde(default)]
    pub return_format: ReturnFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PingInput {
    #[serde(default)]
    pub message: Option<String>,
}
