//! Session workflow orchestration
//!
//! The workflow controller owns one session's lifecycle and drives it through
//! the backend: create, analyze, plan, preview, apply. Long-running stages
//! are observed via the polling engine; plan parameters are collected through
//! a formkit form.

mod controller;

pub use controller::{Workflow, WorkflowError};
