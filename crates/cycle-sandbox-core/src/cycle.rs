//! Session lifecycle: creating, summarizing and closing cycle models.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::builder::BuilderRegistry;
use crate::error::{require_session_id, ToolError};
use crate::model::VariableList;
use crate::session::{SessionMeta, SessionStore};
use crate::variables::NamedVariable;

/// Name fragments that mark an input as worth surfacing on creation.
pub const INTERESTING_INPUT_KEYWORDS: &[&str] = &["mach", "alt", "pr", "turbine", "throttle"];

/// Name fragments that mark an output as worth surfacing on creation.
pub const INTERESTING_OUTPUT_KEYWORDS: &[&str] = &["fn", "fnet", "thrust", "tsfc", "power", "eff"];

/// Arguments of [`create_cycle_model`].
#[derive(Debug, Clone, Default)]
pub struct CycleRequest {
    pub cycle_type: String,
    pub mode: String,
    pub options: Map<String, Value>,
    pub cycle_module_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCycleOutput {
    pub session_id: String,
    pub model_name: String,
    pub top_promoted_inputs: Vec<NamedVariable>,
    pub top_promoted_outputs: Vec<NamedVariable>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseCycleOutput {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub model_name: String,
    pub mode: String,
    pub options: Map<String, Value>,
    pub key_inputs: Vec<NamedVariable>,
    pub key_outputs: Vec<NamedVariable>,
}

/// Build a model, apply `mode` and `options`, set it up and open a session on it.
pub fn create_cycle_model(
    store: &SessionStore,
    builders: &BuilderRegistry,
    request: CycleRequest,
) -> Result<CreateCycleOutput, ToolError> {
    if request.cycle_type.trim().is_empty() || request.mode.trim().is_empty() {
        return Err(ToolError::validation("cycle_type and mode are required"));
    }

    let builder = builders.resolve(&request.cycle_type, request.cycle_module_path.as_deref())?;
    let mut model = builder.build(&request.mode)?;
    model.set_default_mode(&request.mode)?;
    for (name, value) in &request.options {
        model.set(name, value.clone())?;
    }
    model.setup()?;

    let model_name = model.name().to_string();
    let top_promoted_inputs =
        select_interesting(&model.list_inputs(), INTERESTING_INPUT_KEYWORDS);
    let top_promoted_outputs =
        select_interesting(&model.list_outputs(), INTERESTING_OUTPUT_KEYWORDS);

    let meta = SessionMeta::new(request.cycle_type, request.mode).with_options(request.options);
    let session_id = store.create(model, meta)?;

    Ok(CreateCycleOutput {
        session_id,
        model_name,
        top_promoted_inputs,
        top_promoted_outputs,
    })
}

/// Close a session. Closing an unknown id still succeeds.
pub fn close_cycle_model(
    store: &SessionStore,
    session_id: &str,
) -> Result<CloseCycleOutput, ToolError> {
    require_session_id(session_id)?;
    store.close(session_id);
    Ok(CloseCycleOutput { success: true })
}

/// Model name, creation settings and every variable with its current value.
pub fn get_cycle_summary(
    store: &SessionStore,
    session_id: &str,
) -> Result<CycleSummary, ToolError> {
    let session = store.get(session_id)?;
    let model = session.model();
    let info = session.meta();

    let render = |list: VariableList| -> Vec<NamedVariable> {
        list.iter()
            .map(|(name, meta)| NamedVariable::with_current_value(name, meta))
            .collect()
    };

    Ok(CycleSummary {
        model_name: model.name().to_string(),
        mode: info.mode.clone(),
        options: info.options.clone(),
        key_inputs: render(model.list_inputs()),
        key_outputs: render(model.list_outputs()),
    })
}

/// Variables whose name contains any keyword, case-insensitively, as `{name, units, desc}`.
pub fn select_interesting(list: &VariableList, keywords: &[&str]) -> Vec<NamedVariable> {
    list.iter()
        .filter(|(name, _)| {
            let lower = name.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .map(|(name, meta)| NamedVariable::brief(name, meta))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{CycleModel, ModelError, VariableMeta};
    use crate::table::TableModel;
    use serde_json::json;

    fn request(cycle_type: &str) -> CycleRequest {
        CycleRequest {
            cycle_type: cycle_type.to_string(),
            mode: "design".to_string(),
            ..CycleRequest::default()
        }
    }

    #[test]
    fn create_then_summarize_then_close() {
        let store = SessionStore::default();
        let builders = BuilderRegistry::with_templates();
        let mut req = request("turbojet");
        req.options.insert("Mach".to_string(), json!(0.8));

        let created = create_cycle_model(&store, &builders, req).unwrap();
        assert_eq!(created.model_name, "Turbojet");
        let inputs: Vec<&str> = created
            .top_promoted_inputs
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert!(inputs.contains(&"Mach"));
        assert!(inputs.contains(&"comp.PR"));
        assert!(created.top_promoted_outputs.iter().any(|v| v.name == "TSFC"));
        assert!(created.top_promoted_inputs[0].current_value.is_none());

        let summary = get_cycle_summary(&store, &created.session_id).unwrap();
        assert_eq!(summary.mode, "design");
        assert_eq!(summary.options["Mach"], json!(0.8));
        let mach = summary.key_inputs.iter().find(|v| v.name == "Mach").unwrap();
        assert_eq!(mach.current_value, Some(json!(0.8)));

        assert!(close_cycle_model(&store, &created.session_id).unwrap().success);
        let err = get_cycle_summary(&store, &created.session_id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionNotFound);
        assert!(close_cycle_model(&store, &created.session_id).unwrap().success);
    }

    #[test]
    fn missing_mode_is_rejected() {
        let store = SessionStore::default();
        let mut req = request("turbojet");
        req.mode.clear();
        let err = create_cycle_model(&store, &BuilderRegistry::with_templates(), req).unwrap_err();
        assert_eq!(err.message, "cycle_type and mode are required");
        assert!(store.is_empty());
    }

    #[test]
    fn bad_option_aborts_creation() {
        let store = SessionStore::default();
        let mut req = request("turbofan");
        req.options.insert("warp_factor".to_string(), json!(9));
        let err = create_cycle_model(&store, &BuilderRegistry::with_templates(), req).unwrap_err();
        assert_eq!(err.type_name(), "AssignmentError");
        assert!(store.is_empty());
    }

    #[test]
    fn builder_receives_mode_and_setup_runs() {
        struct SetupProbe(TableModel);

        impl CycleModel for SetupProbe {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn list_inputs(&self) -> VariableList {
                self.0.list_inputs()
            }
            fn list_outputs(&self) -> VariableList {
                self.0.list_outputs()
            }
            fn get(&self, name: &str) -> Result<Value, ModelError> {
                self.0.get(name)
            }
            fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
                self.0.set(name, value)
            }
            fn run(&mut self, use_driver: bool) -> Result<(), ModelError> {
                self.0.run(use_driver)
            }
            fn compute_totals(
                &mut self,
                of: &[String],
                wrt: &[String],
            ) -> Result<crate::model::Totals, ModelError> {
                self.0.compute_totals(of, wrt)
            }
            fn setup(&mut self) -> Result<(), ModelError> {
                Err(ModelError::build("setup failed"))
            }
        }

        let mut builders = BuilderRegistry::new();
        builders.register("probe", |mode: &str| -> Result<Box<dyn CycleModel>, ModelError> {
            assert_eq!(mode, "off-design");
            let table = TableModel::new("probe").with_input("Mach", VariableMeta::default());
            Ok(Box::new(SetupProbe(table)))
        });

        let store = SessionStore::default();
        let req = CycleRequest {
            cycle_type: "probe".to_string(),
            mode: "off-design".to_string(),
            ..CycleRequest::default()
        };
        let err = create_cycle_model(&store, &builders, req).unwrap_err();
        assert_eq!(err.type_name(), "BuildError");
        assert_eq!(err.message, "setup failed");
    }

    #[test]
    fn keyword_selection_is_case_insensitive() {
        let list: VariableList = vec![
            ("HPT.eff".to_string(), VariableMeta::default()),
            ("burner.dPqP".to_string(), VariableMeta::default()),
            ("perf.Fn".to_string(), VariableMeta::default().with_units("lbf")),
        ];
        let picked = select_interesting(&list, INTERESTING_OUTPUT_KEYWORDS);
        let names: Vec<&str> = picked.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["HPT.eff", "perf.Fn"]);
        assert_eq!(picked[1].units.as_deref(), Some("lbf"));
    }
}
