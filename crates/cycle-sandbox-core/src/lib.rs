//! Cycle Sandbox Core
//!
//! Session-keyed access to engine-cycle simulation models.
//!
//! A session owns one model handle ([`model::CycleModel`]) created through the
//! [`builder::BuilderRegistry`]. The layer modules operate on a
//! [`session::SessionStore`] and return typed outputs or a [`error::ToolError`];
//! front ends wrap either in the uniform [`shared::ToolResponse`] envelope.
//!
//! # Core Modules
//!
//! - [`model`]: the model handle trait and its error type
//! - [`table`]: in-memory model handle and its JSON definition format
//! - [`builder`]: cycle type to model builder mapping
//! - [`session`]: session store with a capacity limit
//! - [`cycle`]: create, summarize and close sessions
//! - [`variables`]: list variables, set inputs, read outputs
//! - [`execution`]: run a model and harvest outputs
//! - [`sweep`]: Cartesian parameter sweeps
//! - [`derivatives`]: total derivatives in pairwise or dense layout
//!
//! # Example
//!
//! ```ignore
//! use cycle_sandbox_core::builder::BuilderRegistry;
//! use cycle_sandbox_core::cycle::{create_cycle_model, CycleRequest};
//! use cycle_sandbox_core::execution::run_cycle;
//! use cycle_sandbox_core::session::SessionStore;
//!
//! let store = SessionStore::default();
//! let builders = BuilderRegistry::with_templates();
//! let created = create_cycle_model(&store, &builders, CycleRequest {
//!     cycle_type: "turbojet".into(),
//!     mode: "design".into(),
//!     ..Default::default()
//! })?;
//! let run = run_cycle(&store, &created.session_id, &[], false)?;
//! ```

pub mod builder;
pub mod cycle;
pub mod derivatives;
pub mod error;
pub mod execution;
pub mod model;
pub mod session;
pub mod shared;
pub mod sweep;
pub mod table;
pub mod variables;

pub use error::{ErrorKind, ToolError};
pub use model::{CycleModel, ModelError, VariableMeta};
pub use session::{SessionMeta, SessionStore};
pub use shared::ToolResponse;
