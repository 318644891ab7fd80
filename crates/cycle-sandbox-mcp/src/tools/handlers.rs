//! MCP tool handler implementations.

use crate::state::{ToolDispatcher, ToolResponse};
use serde::Serialize;
use serde_json::Value;

use cycle_sandbox_core::cycle::{self, CycleRequest};
use cycle_sandbox_core::shared::extract_input;
use cycle_sandbox_core::sweep::{self, SweepOptions};
use cycle_sandbox_core::variables::{self, VariableFilter};
use cycle_sandbox_core::{derivatives, execution};

use super::inputs::{
    ComputeTotalsInput, CreateCycleModelInput, GetOutputsInput, ListVariablesInput, PingInput,
    RunCycleInput, SessionInput, SetInputsInput, SweepInputsInput,
};

/// Server identifier reported by `ping`.
pub const SERVER_NAME: &str = "cycle-sandbox";

#[derive(Debug, Serialize)]
struct PingOutput {
    server: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ToolDispatcher {
    pub async fn create_cycle_model(&self, input: Value) -> ToolResponse {
        let parsed: CreateCycleModelInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let request = CycleRequest {
            cycle_type: parsed.cycle_type,
            mode: parsed.mode,
            options: parsed.options,
            cycle_module_path: parsed.cycle_module_path,
        };
        self.blocking(move |store, builders| cycle::create_cycle_model(store, builders, request))
            .await
    }

    pub async fn close_cycle_model(&self, input: Value) -> ToolResponse {
        let parsed: SessionInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        cycle::close_cycle_model(self.sessions(), &parsed.session_id).into()
    }

    pub async fn get_cycle_summary(&self, input: Value) -> ToolResponse {
        let parsed: SessionInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.blocking(move |store, _| cycle::get_cycle_summary(store, &parsed.session_id))
            .await
    }

    pub async fn list_variables(&self, input: Value) -> ToolResponse {
        let parsed: ListVariablesInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let filter = VariableFilter {
            kind: parsed.kind,
            promoted_only: parsed.promoted_only,
            name_filter: parsed.name_filter,
            max_results: parsed.max_variables,
        };
        self.blocking(move |store, _| {
            variables::list_variables(store, &parsed.session_id, &filter)
        })
        .await
    }

    pub async fn set_inputs(&self, input: Value) -> ToolResponse {
        let parsed: SetInputsInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.blocking(move |store, _| {
            variables::set_inputs(store, &parsed.session_id, &parsed.values, parsed.allow_missing)
        })
        .await
    }

    pub async fn get_outputs(&self, input: Value) -> ToolResponse {
        let parsed: GetOutputsInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.blocking(move |store, _| {
            variables::get_outputs(store, &parsed.session_id, &parsed.names, parsed.allow_missing)
        })
        .await
    }

    pub async fn run_cycle(&self, input: Value) -> ToolResponse {
        let parsed: RunCycleInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.blocking(move |store, _| {
            execution::run_cycle(
                store,
                &parsed.session_id,
                &parsed.outputs_of_interest,
                parsed.use_driver,
            )
        })
        .await
    }

    pub async fn sweep_inputs(&self, input: Value) -> ToolResponse {
        let parsed: SweepInputsInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let options = SweepOptions {
            outputs_of_interest: parsed.outputs_of_interest,
            use_driver: parsed.use_driver,
            skip_on_failure: parsed.skip_on_failure,
        };
        let session_id = parsed.session_id;
        let axes = parsed.sweep;
        self.blocking(move |store, _| sweep::sweep_inputs(store, &session_id, &axes, &options))
            .await
    }

    pub async fn compute_totals(&self, input: Value) -> ToolResponse {
        let parsed: ComputeTotalsInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.blocking(move |store, _| {
            derivatives::compute_totals(
                store,
                &parsed.session_id,
                &parsed.of,
                &parsed.wrt,
                parsed.return_format,
            )
        })
        .await
    }

    pub async fn ping(&self, input: Value) -> ToolResponse {
        let parsed: PingInput = match extract_input(input) {
            Ok(v) => v,
            Err(e) => return e,
        };
        ToolResponse::ok(&PingOutput {
            server: SERVER_NAME,
            status: "ok",
            message: parsed.message,
        })
    }
}
