//! # Engines
//!
//! Turning a configuration into a run: [`plan`] decides which external entry
//! point carries out the run and under which name, [`experiment`] prepares the
//! directory the run writes into.
pub mod experiment;
pub mod plan;

pub use experiment::ExperimentDir;
pub use plan::{
    EntryPoint,
    ExplainMode,
    RunPlan,
    Task,
};
