//! Dashboard orchestration: state machine, commands and async driver

pub mod command;
pub mod controller;
pub mod runtime;

pub use command::{Command, CommandError, HELP};
pub use controller::{DashboardController, FetchTicket, ViewDefaults};
pub use runtime::{DashboardError, DashboardRuntime, FetchCompletion, Outcome};
