//! FileOrg - client-side orchestration for staged file reorganization
//!
//! A backend service analyzes a directory, proposes a restructuring plan, and
//! this client drives the workflow: create a session, run analysis, generate
//! a plan, preview the before/after structure, and apply it.
//!
//! # Modules
//!
//! - [`api`] - Session backend contract and its HTTP implementation
//! - [`poll`] - Bounded async polling for long-running jobs
//! - [`preview`] - Preview tree parsing and before/after reconciliation
//! - [`session`] - Workflow controller over the session lifecycle
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod poll;
pub mod preview;
pub mod session;

// Re-export commonly used types
pub use api::{
    AlgorithmInfo, AnalysisMethod, AnalysisSummary, ApiError, ApplyResult, FsEntry, HttpSessionApi, JobProgress,
    MethodInfo, PlanSummary, PreviewTree, Session, SessionApi, Stage, StructAlgorithm,
};
pub use config::{ApiConfig, Config, PollConfig};
pub use poll::{Poller, ProbeStatus};
pub use preview::{EntryKind, FlatEntry, PreviewNode, Reconciled, reconcile};
pub use session::{Workflow, WorkflowError};
