//! Workflow controller implementation

use std::future::Future;
use std::sync::Arc;

use formkit::{Form, FormSchema, SchemaError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    AlgorithmInfo, AnalysisMethod, AnalysisSummary, ApiError, ApplyResult, FsEntry, JobProgress, MethodInfo,
    PlanSummary, Session, SessionApi, Stage, StructAlgorithm,
};
use crate::preview::{PreviewNode, Reconciled, reconcile};

/// Errors raised by workflow actions
///
/// Precondition variants are raised before any backend call and never change
/// the session stage; `Api` failures mark the stage `Failed` while keeping
/// the session identity, so the same action can be retried.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No active session")]
    NoActiveSession,

    #[error("Directory must not be empty")]
    EmptyDirectory,

    #[error("Invalid plan parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid parameter schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives one session through create, analyze, plan, preview, and apply
///
/// Owns all mutable workflow state exclusively (`&mut self` actions, no
/// locking); every action follows the same discipline: clear the error, set
/// loading, await the backend, record the outcome, clear loading on every
/// exit path.
pub struct Workflow {
    api: Arc<dyn SessionApi>,
    session: Option<Session>,
    preview: Option<Reconciled>,
    progress: Option<JobProgress>,
    plan_form: Option<Form>,
    loading: bool,
    error: Option<String>,
}

impl Workflow {
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        Self {
            api,
            session: None,
            preview: None,
            progress: None,
            plan_form: None,
            loading: false,
            error: None,
        }
    }

    /// Create a new session for a directory
    ///
    /// An empty directory string is a precondition error; the backend is not
    /// contacted.
    pub async fn create_session(&mut self, directory: &str, recursive: bool) -> Result<&Session, WorkflowError> {
        if directory.trim().is_empty() {
            return Err(self.precondition(WorkflowError::EmptyDirectory));
        }

        self.error = None;
        self.loading = true;
        let result = self.api.create_session(directory, recursive).await;
        self.loading = false;

        match result {
            Ok(mut session) => {
                session.status = Stage::Created;
                info!(id = %session.id, directory, "create_session: session created");
                Ok(&*self.session.insert(session))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch an existing session and adopt it as the active one
    pub async fn load_session(&mut self, id: &str) -> Result<&Session, WorkflowError> {
        self.error = None;
        self.loading = true;
        let result = self.api.get_session(id).await;
        self.loading = false;

        match result {
            Ok(session) => {
                debug!(id = %session.id, status = %session.status, "load_session: adopted");
                Ok(&*self.session.insert(session))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run analysis with the chosen method and advance to `Analyzing`
    pub async fn run_analysis(&mut self, method: AnalysisMethod) -> Result<AnalysisSummary, WorkflowError> {
        let id = self.require_session()?;

        self.error = None;
        self.loading = true;
        let result = self.api.run_analysis(&id, method).await;
        self.loading = false;

        match result {
            Ok(summary) => {
                if let Some(session) = &mut self.session {
                    session.analysis_method = Some(method);
                    session.status = Stage::Analyzing;
                    session.files_total = summary.files_analyzed;
                }
                info!(%method, files = summary.files_analyzed, "run_analysis: started");
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Install a plan parameter form built from an algorithm's schema
    ///
    /// Subsequent `generate_plan` calls validate the form and refuse to
    /// contact the backend while it is invalid.
    pub fn set_plan_schema(&mut self, schema: &serde_json::Value) -> Result<(), WorkflowError> {
        let schema = FormSchema::from_json(schema)?;
        self.plan_form = Some(Form::new(schema));
        Ok(())
    }

    /// The installed plan parameter form, if any
    pub fn plan_form(&mut self) -> Option<&mut Form> {
        self.plan_form.as_mut()
    }

    /// Generate a restructuring plan and advance to `Planned`
    pub async fn generate_plan(&mut self, algorithm: StructAlgorithm) -> Result<PlanSummary, WorkflowError> {
        let id = self.require_session()?;

        if let Some(form) = &mut self.plan_form
            && !form.validate()
        {
            let count = form.errors().len();
            return Err(self.precondition(WorkflowError::InvalidParams(format!("{count} invalid parameter(s)"))));
        }

        self.error = None;
        self.loading = true;
        let result = self.api.generate_plan(&id, algorithm).await;
        self.loading = false;

        match result {
            Ok(summary) => {
                if let Some(session) = &mut self.session {
                    session.struct_algorithm = Some(algorithm);
                    session.status = Stage::Planned;
                    session.actions_total = summary.actions_created;
                }
                info!(%algorithm, actions = summary.actions_created, "generate_plan: plan ready");
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch and reconcile the preview, advancing to `Previewing`
    ///
    /// A response without a usable tree yields empty before/after lists
    /// rather than an error.
    pub async fn get_preview(&mut self) -> Result<&Reconciled, WorkflowError> {
        let id = self.require_session()?;

        self.error = None;
        self.loading = true;
        let result = self.api.get_preview(&id).await;
        self.loading = false;

        match result {
            Ok(payload) => {
                let reconciled = match PreviewNode::parse(&payload.tree) {
                    Some(tree) => reconcile(&tree),
                    None => {
                        debug!("get_preview: no usable tree structure in response");
                        Reconciled::default()
                    }
                };
                if let Some(session) = &mut self.session {
                    session.status = Stage::Previewing;
                }
                Ok(&*self.preview.insert(reconciled))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Apply the plan
    ///
    /// A dry run is preview-only: the result is returned for inspection but
    /// the stage never advances to `Completed`. A real run passes through
    /// `Applying` and lands on `Completed`.
    pub async fn apply_plan(&mut self, dry_run: bool) -> Result<ApplyResult, WorkflowError> {
        let id = self.require_session()?;

        self.error = None;
        self.loading = true;
        if !dry_run && let Some(session) = &mut self.session {
            session.status = Stage::Applying;
        }
        let result = self.api.apply_plan(&id, dry_run).await;
        self.loading = false;

        match result {
            Ok(outcome) => {
                if !dry_run && let Some(session) = &mut self.session {
                    session.status = Stage::Completed;
                }
                info!(
                    dry_run,
                    applied = outcome.applied,
                    failed = outcome.failed,
                    "apply_plan: finished"
                );
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Latest progress snapshot for the session's running job
    ///
    /// Designed as the polling probe: called at high frequency, so it leaves
    /// the loading flag alone, and a failure records the error without
    /// failing the stage (the poller tolerates transient probe errors).
    pub async fn get_progress(&mut self) -> Result<JobProgress, WorkflowError> {
        let id = self.require_session()?;

        match self.api.get_progress(&id).await {
            Ok(progress) => {
                self.progress = Some(progress.clone());
                Ok(progress)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(WorkflowError::Api(e))
            }
        }
    }

    /// Page through known sessions
    pub async fn list_sessions(&mut self, skip: u32, limit: u32) -> Result<Vec<Session>, WorkflowError> {
        let api = Arc::clone(&self.api);
        self.passthrough(async move { api.list_sessions(skip, limit).await }).await
    }

    /// Available analysis methods
    pub async fn analysis_methods(&mut self) -> Result<Vec<MethodInfo>, WorkflowError> {
        let api = Arc::clone(&self.api);
        self.passthrough(async move { api.analysis_methods().await }).await
    }

    /// Available structuring algorithms with their parameter schemas
    pub async fn struct_algorithms(&mut self) -> Result<Vec<AlgorithmInfo>, WorkflowError> {
        let api = Arc::clone(&self.api);
        self.passthrough(async move { api.struct_algorithms().await }).await
    }

    /// Server-side directory listing
    pub async fn list_directory(&mut self, path: &str) -> Result<Vec<FsEntry>, WorkflowError> {
        let api = Arc::clone(&self.api);
        let path = path.to_string();
        self.passthrough(async move { api.list_directory(&path).await }).await
    }

    /// Discard session identity, preview data, progress, form, and error
    ///
    /// The only transition not gated by a backend call.
    pub fn reset(&mut self) {
        info!("reset: discarding workflow state");
        self.session = None;
        self.preview = None;
        self.progress = None;
        self.plan_form = None;
        self.error = None;
        self.loading = false;
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Current lifecycle stage of the active session
    pub fn stage(&self) -> Option<Stage> {
        self.session.as_ref().map(|s| s.status)
    }

    /// Whether a session is active
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Last reconciled preview
    pub fn preview(&self) -> Option<&Reconciled> {
        self.preview.as_ref()
    }

    /// Last progress snapshot
    pub fn progress(&self) -> Option<&JobProgress> {
        self.progress.as_ref()
    }

    /// Whether an action is in flight
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Last recorded error message
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Discovery/browsing call with the standard action discipline but no
    /// stage transition
    async fn passthrough<T>(&mut self, call: impl Future<Output = Result<T, ApiError>>) -> Result<T, WorkflowError> {
        self.error = None;
        self.loading = true;
        let result = call.await;
        self.loading = false;

        result.map_err(|e| {
            self.error = Some(e.to_string());
            WorkflowError::Api(e)
        })
    }

    fn require_session(&mut self) -> Result<String, WorkflowError> {
        match &self.session {
            Some(session) => Ok(session.id.clone()),
            None => Err(self.precondition(WorkflowError::NoActiveSession)),
        }
    }

    /// Record a precondition error; the stage is untouched and recoverable
    fn precondition(&mut self, err: WorkflowError) -> WorkflowError {
        debug!(error = %err, "precondition failed");
        self.error = Some(err.to_string());
        err
    }

    /// Record a backend failure and mark the stage `Failed`
    ///
    /// Session identity is kept so the caller can retry the same action.
    fn fail(&mut self, err: ApiError) -> WorkflowError {
        let message = err.to_string();
        warn!(error = %message, "workflow action failed");
        self.error = Some(message);
        if let Some(session) = &mut self.session {
            session.status = Stage::Failed;
        }
        WorkflowError::Api(err)
    }
}
