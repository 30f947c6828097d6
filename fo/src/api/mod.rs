//! Session API client module
//!
//! Defines the backend contract as a trait plus the reqwest implementation.
//! Transport policy (base URL, timeouts) comes from configuration; retry
//! policy is deliberately not implemented here.

mod error;
mod http;
mod types;

pub use error::ApiError;
pub use http::HttpSessionApi;
pub use types::{
    AlgorithmInfo, AnalysisMethod, AnalysisSummary, ApplyResult, FsEntry, JobProgress, MethodInfo, PlanSummary,
    PreviewTree, Session, Stage, StructAlgorithm,
};

use async_trait::async_trait;

/// Stateless session backend client - each call is independent
///
/// This is the seam between the orchestration core and the transport layer.
/// The workflow controller only ever sees this trait; tests substitute a
/// scripted mock.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a new reorganization session for a directory
    async fn create_session(&self, directory: &str, recursive: bool) -> Result<Session, ApiError>;

    /// Fetch an existing session by id
    async fn get_session(&self, id: &str) -> Result<Session, ApiError>;

    /// Page through known sessions
    async fn list_sessions(&self, skip: u32, limit: u32) -> Result<Vec<Session>, ApiError>;

    /// Run file analysis with the chosen method
    async fn run_analysis(&self, id: &str, method: AnalysisMethod) -> Result<AnalysisSummary, ApiError>;

    /// Generate a restructuring plan with the chosen algorithm
    async fn generate_plan(&self, id: &str, algorithm: StructAlgorithm) -> Result<PlanSummary, ApiError>;

    /// Fetch the preview tree for the generated plan
    async fn get_preview(&self, id: &str) -> Result<PreviewTree, ApiError>;

    /// Apply the plan; a dry run reports what would happen without changes
    async fn apply_plan(&self, id: &str, dry_run: bool) -> Result<ApplyResult, ApiError>;

    /// Latest progress snapshot of the session's running job
    async fn get_progress(&self, id: &str) -> Result<JobProgress, ApiError>;

    /// Available analysis methods
    async fn analysis_methods(&self) -> Result<Vec<MethodInfo>, ApiError>;

    /// Available structuring algorithms with their parameter schemas
    async fn struct_algorithms(&self) -> Result<Vec<AlgorithmInfo>, ApiError>;

    /// Server-side directory listing
    async fn list_directory(&self, path: &str) -> Result<Vec<FsEntry>, ApiError>;
}
