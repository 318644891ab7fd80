//! Cycle model builders.
//!
//! `create_cycle_model` resolves its `cycle_type` through a [`BuilderRegistry`].
//! The registry ships with table templates for the three stock cycles; an engine
//! adapter replaces a template by registering a builder under the same name.
//! The special `custom` type loads a [`CycleDefinition`] from disk.

use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ToolError;
use crate::model::{CycleModel, ModelError, VariableMeta};
use crate::table::{CycleDefinition, TableModel};

/// Cycle type that loads its model from a definition file.
pub const CUSTOM_CYCLE: &str = "custom";

/// Constructs a fresh model handle for one session.
pub trait CycleBuilder: Send + Sync {
    fn build(&self, mode: &str) -> Result<Box<dyn CycleModel>, ModelError>;
}

impl<F> CycleBuilder for F
where
    F: Fn(&str) -> Result<Box<dyn CycleModel>, ModelError> + Send + Sync,
{
    fn build(&self, mode: &str) -> Result<Box<dyn CycleModel>, ModelError> {
        self(mode)
    }
}

/// Stock cycle layouts available without an engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTemplate {
    Turbojet,
    Turbofan,
    Turboshaft,
}

impl CycleTemplate {
    pub fn all() -> Vec<&'static str> {
        vec!["turbojet", "turbofan", "turboshaft"]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "turbojet" => Some(Self::Turbojet),
            "turbofan" => Some(Self::Turbofan),
            "turboshaft" => Some(Self::Turboshaft),
            _ => None,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Turbojet => "Turbojet",
            Self::Turbofan => "Turbofan",
            Self::Turboshaft => "Turboshaft",
        }
    }

    /// Design-point variable table for this cycle.
    pub fn to_model(&self) -> TableModel {
        let flight = TableModel::new(self.model_name())
            .with_input("Mach", scalar("", "Flight Mach number", 0.0))
            .with_input("alt", scalar("ft", "Flight altitude", 0.0))
            .with_input("throttle", scalar("", "Throttle setting", 1.0))
            .with_input("T4_MAX", scalar("degR", "Max turbine inlet temperature", 2370.0))
            .with_input(
                "fc.dTs",
                scalar("degR", "Delta from standard day", 0.0).with_promoted_name("dTs"),
            );

        match self {
            Self::Turbojet => flight
                .with_input("comp.PR", scalar("", "Compressor pressure ratio", 13.5))
                .with_input("comp.eff", scalar("", "Compressor efficiency", 0.83))
                .with_input("turb.eff", scalar("", "Turbine efficiency", 0.86))
                .with_output("Fn", scalar("lbf", "Net thrust", 0.0))
                .with_output("TSFC", scalar("lbm/h/lbf", "Thrust specific fuel consumption", 0.0))
                .with_output("perf.Fg", scalar("lbf", "Gross thrust", 0.0))
                .with_output("burner.FAR", scalar("", "Fuel-air ratio", 0.0)),
            Self::Turbofan => flight
                .with_input("fan.PR", scalar("", "Fan pressure ratio", 1.685))
                .with_input("lpc.PR", scalar("", "LPC pressure ratio", 1.935))
                .with_input("hpc.PR", scalar("", "HPC pressure ratio", 9.369))
                .with_input("BPR", scalar("", "Bypass ratio", 5.105))
                .with_input("hp_turbine.eff", scalar("", "HP turbine efficiency", 0.8888))
                .with_input("lp_turbine.eff", scalar("", "LP turbine efficiency", 0.8996))
                .with_output("Fn", scalar("lbf", "Net thrust", 0.0))
                .with_output("TSFC", scalar("lbm/h/lbf", "Thrust specific fuel consumption", 0.0))
                .with_output("OPR", scalar("", "Overall pressure ratio", 0.0))
                .with_output("fan.eff", scalar("", "Fan efficiency", 0.0)),
            Self::Turboshaft => flight
                .with_input("comp.PR", scalar("", "Compressor pressure ratio", 13.5))
                .with_input("pt.eff", scalar("", "Power turbine efficiency", 0.9))
                .with_input("LP_Nmech", scalar("rpm", "Power turbine shaft speed", 12750.0))
                .with_output("pwr_net", scalar("hp", "Net shaft power", 0.0))
                .with_output("PSFC", scalar("lbm/h/hp", "Power specific fuel consumption", 0.0))
                .with_output("Fn", scalar("lbf", "Residual jet thrust", 0.0))
                .with_output("turb.eff", scalar("", "Gas generator turbine efficiency", 0.0)),
        }
    }
}

fn scalar(units: &str, desc: &str, value: f64) -> VariableMeta {
    VariableMeta::default()
        .with_units(units)
        .with_desc(desc)
        .with_value(json!(value))
}

struct TemplateBuilder(CycleTemplate);

impl CycleBuilder for TemplateBuilder {
    fn build(&self, _mode: &str) -> Result<Box<dyn CycleModel>, ModelError> {
        Ok(Box::new(self.0.to_model()))
    }
}

/// Maps cycle types to builders.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<String, Arc<dyn CycleBuilder>>,
    definitions_dir: Option<PathBuf>,
}

impl BuilderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the stock cycle templates registered.
    pub fn with_templates() -> Self {
        let mut registry = Self::new();
        for name in CycleTemplate::all() {
            if let Some(template) = CycleTemplate::parse(name) {
                registry.register(name, TemplateBuilder(template));
            }
        }
        registry
    }

    /// Directory that relative `cycle_module_path` values resolve against.
    pub fn with_definitions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definitions_dir = Some(dir.into());
        self
    }

    /// Register (or replace) the builder for a cycle type.
    pub fn register<B: CycleBuilder + 'static>(&mut self, cycle_type: &str, builder: B) {
        self.builders.insert(cycle_type.to_string(), Arc::new(builder));
    }

    pub fn has_cycle(&self, cycle_type: &str) -> bool {
        cycle_type == CUSTOM_CYCLE || self.builders.contains_key(cycle_type)
    }

    /// Registered cycle types, sorted, including `custom`.
    pub fn cycle_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.push(CUSTOM_CYCLE.to_string());
        names.sort();
        names
    }

    /// Resolve a cycle type (and, for `custom`, a definition path) to a builder.
    pub fn resolve(
        &self,
        cycle_type: &str,
        cycle_module_path: Option<&str>,
    ) -> Result<Arc<dyn CycleBuilder>, ToolError> {
        if cycle_type == CUSTOM_CYCLE {
            let raw = cycle_module_path
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    ToolError::validation("cycle_module_path is required for custom cycles")
                })?;
            let path = self.definition_path(raw);
            return Ok(Arc::new(DefinitionBuilder { path }));
        }

        self.builders.get(cycle_type).cloned().ok_or_else(|| {
            ToolError::validation(format!(
                "Unsupported cycle type: {}. Available: {}",
                cycle_type,
                self.cycle_types().join(", ")
            ))
        })
    }

    fn definition_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        match &self.definitions_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Builds a table model from a definition file, re-read on every build.
struct DefinitionBuilder {
    path: PathBuf,
}

impl CycleBuilder for DefinitionBuilder {
    fn build(&self, _mode: &str) -> Result<Box<dyn CycleModel>, ModelError> {
        let definition =
            CycleDefinition::load(&self.path).map_err(|e| ModelError::build(format!("{:#}", e)))?;
        Ok(Box::new(definition.to_model()))
    }
}
