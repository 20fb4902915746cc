//! Scenario tests: declarative setup, driven engine, mandatory oracle.

mod builder;

pub use builder::{RunnableScenario, Scenario};

use crate::sim::SimWorld;

/// Oracle verifying world state after a scenario run.
pub type OracleFn = Box<dyn Fn(&SimWorld) -> Result<(), String>>;
