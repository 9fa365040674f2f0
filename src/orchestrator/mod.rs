//! Application-level orchestration.
//!
//! This module owns the run lifecycle (validation, single-flight, synthetic
//! progress) and post-run processing that keeps summary text, history, KPIs,
//! charts and the word cloud consistent. UI/CLI layers talk to it through
//! `UiCommand` and `RunEvent` channels only.

mod controller;
mod post_process;
mod progress;
mod session;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use session::Session;
