//! Deterministic simulation harness for the gridlink protocol.
//!
//! The engines in `gridlink-core` only see three traits - serial port,
//! environment, panel - so the whole protocol can run against virtual
//! time with a scripted radio module on the other end of the wire. Time
//! advances only when an engine yields, which makes every scenario
//! reproducible down to the poll tick: a 100 s name-resolution timeout
//! costs nothing to simulate.
//!
//! # Pieces
//!
//! - [`SimWorld`]: shared state - virtual clock, wire in both
//!   directions, scripted modem replies, scheduled key presses, and
//!   everything the engines rendered.
//! - [`SimPort`], [`SimEnv`], [`SimPanel`]: the trait implementations
//!   handed to an [`Endpoint`](gridlink_core::Endpoint).
//! - [`Scenario`]: declarative builder for scenario tests. The oracle is
//!   mandatory - a scenario cannot run without verification.
//!
//! # Modem scripting
//!
//! Replies are triggered by outgoing command prefixes and delivered
//! after a virtual delay; free-running lines (an incoming connection
//! request, an opponent's score, a carrier drop) are scheduled at
//! absolute virtual times.

pub mod scenario;
pub mod sim;

pub use scenario::{OracleFn, RunnableScenario, Scenario};
pub use sim::{SimEnv, SimPanel, SimPort, SimWorld};
