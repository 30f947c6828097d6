//! Integration tests for FileOrg
//!
//! These tests drive the full session workflow end to end against a scripted
//! backend, including progress polling between stages.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use fileorg::poll::Poller;
use fileorg::preview::EntryKind;
use fileorg::{
    AlgorithmInfo, AnalysisMethod, AnalysisSummary, ApiError, ApplyResult, FsEntry, JobProgress, MethodInfo,
    PlanSummary, PreviewTree, Session, SessionApi, Stage, StructAlgorithm, Workflow,
};

/// Scripted backend: canned responses plus a progress script that drains as
/// the poller probes it
struct ScriptedApi {
    progress: Mutex<VecDeque<JobProgress>>,
    fail_plan: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedApi {
    fn new(progress: Vec<JobProgress>) -> Self {
        Self {
            progress: Mutex::new(progress.into()),
            fail_plan: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn session(&self) -> Session {
        Session {
            id: "s-42".to_string(),
            directory: "/data/inbox".to_string(),
            recursive: true,
            status: Stage::Created,
            analysis_method: None,
            struct_algorithm: None,
            files_total: 0,
            actions_total: 0,
            created_at: None,
        }
    }
}

#[async_trait]
impl SessionApi for ScriptedApi {
    async fn create_session(&self, _directory: &str, _recursive: bool) -> Result<Session, ApiError> {
        self.record("create_session");
        Ok(self.session())
    }

    async fn get_session(&self, _id: &str) -> Result<Session, ApiError> {
        self.record("get_session");
        Ok(self.session())
    }

    async fn list_sessions(&self, _skip: u32, _limit: u32) -> Result<Vec<Session>, ApiError> {
        self.record("list_sessions");
        Ok(vec![self.session()])
    }

    async fn run_analysis(&self, _id: &str, _method: AnalysisMethod) -> Result<AnalysisSummary, ApiError> {
        self.record("run_analysis");
        Ok(AnalysisSummary {
            files_analyzed: 3,
            description_examples: vec![],
        })
    }

    async fn generate_plan(&self, _id: &str, _algorithm: StructAlgorithm) -> Result<PlanSummary, ApiError> {
        self.record("generate_plan");
        if self.fail_plan.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 500,
                message: "planner overloaded".to_string(),
            });
        }
        Ok(PlanSummary {
            actions_created: 2,
            breakdown: [("MOVE".to_string(), 2)].into_iter().collect(),
        })
    }

    async fn get_preview(&self, _id: &str) -> Result<PreviewTree, ApiError> {
        self.record("get_preview");
        Ok(PreviewTree {
            tree: json!({
                "inbox": {
                    "report.pdf": "MOVE->Documents/",
                    "photo.jpg": "MOVE->Pictures/",
                    "notes.txt": "file"
                }
            }),
        })
    }

    async fn apply_plan(&self, _id: &str, _dry_run: bool) -> Result<ApplyResult, ApiError> {
        self.record("apply_plan");
        Ok(ApplyResult {
            applied: 2,
            failed: 0,
            errors: vec![],
        })
    }

    async fn get_progress(&self, _id: &str) -> Result<JobProgress, ApiError> {
        self.record("get_progress");
        let mut script = self.progress.lock().unwrap();
        let progress = if script.len() > 1 {
            script.pop_front().expect("non-empty script")
        } else {
            script.front().cloned().unwrap_or(JobProgress {
                percent: 100,
                status: "done".to_string(),
                message: None,
            })
        };
        Ok(progress)
    }

    async fn analysis_methods(&self) -> Result<Vec<MethodInfo>, ApiError> {
        self.record("analysis_methods");
        Ok(vec![])
    }

    async fn struct_algorithms(&self) -> Result<Vec<AlgorithmInfo>, ApiError> {
        self.record("struct_algorithms");
        Ok(vec![])
    }

    async fn list_directory(&self, _path: &str) -> Result<Vec<FsEntry>, ApiError> {
        self.record("list_directory");
        Ok(vec![])
    }
}

fn progress(percent: u8, status: &str) -> JobProgress {
    JobProgress {
        percent,
        status: status.to_string(),
        message: None,
    }
}

#[tokio::test]
async fn test_full_workflow_with_polling() {
    let api = Arc::new(ScriptedApi::new(vec![
        progress(30, "running"),
        progress(70, "running"),
        progress(100, "done"),
    ]));
    let mut workflow = Workflow::new(Arc::clone(&api) as Arc<dyn SessionApi>);

    // Create and analyze
    workflow.create_session("/data/inbox", true).await.unwrap();
    workflow.run_analysis(AnalysisMethod::Meta).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Analyzing));

    // Await the analysis job the way the CLI does
    let poller = Poller::new(Duration::from_millis(10)).with_max_attempts(20);
    let completions = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&completions);
    let probe_api = Arc::clone(&api);
    poller
        .start(
            move || {
                let api = Arc::clone(&probe_api);
                async move { api.get_progress("s-42").await }
            },
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

    for _ in 0..100 {
        if !poller.is_polling() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(poller.latest().unwrap().percent, 100);

    // Plan, preview, apply
    workflow.generate_plan(StructAlgorithm::ByType).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Planned));

    let preview = workflow.get_preview().await.unwrap();
    let after_files: Vec<&str> = preview
        .after
        .iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(|e| e.path.as_str())
        .collect();
    assert!(after_files.contains(&"Documents/report.pdf"));
    assert!(after_files.contains(&"Pictures/photo.jpg"));
    assert!(after_files.contains(&"inbox/notes.txt"));

    // Dry run leaves the stage alone, the real apply completes it
    workflow.apply_plan(true).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Previewing));

    workflow.apply_plan(false).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Completed));

    // The backend saw the stage calls in workflow order
    let stage_calls: Vec<&str> = api.calls().into_iter().filter(|c| *c != "get_progress").collect();
    assert_eq!(
        stage_calls,
        vec![
            "create_session",
            "run_analysis",
            "generate_plan",
            "get_preview",
            "apply_plan",
            "apply_plan"
        ]
    );
}

#[tokio::test]
async fn test_failed_stage_can_be_retried() {
    let api = Arc::new(ScriptedApi::new(vec![progress(100, "done")]));
    api.fail_plan.store(true, Ordering::SeqCst);
    let mut workflow = Workflow::new(Arc::clone(&api) as Arc<dyn SessionApi>);

    workflow.create_session("/data/inbox", true).await.unwrap();
    workflow.run_analysis(AnalysisMethod::Meta).await.unwrap();

    // First attempt fails and marks the stage, keeping the session
    let err = workflow.generate_plan(StructAlgorithm::Cluster).await.unwrap_err();
    assert!(err.to_string().contains("planner overloaded"));
    assert_eq!(workflow.stage(), Some(Stage::Failed));
    assert_eq!(workflow.session().unwrap().id, "s-42");

    // Retrying the same action succeeds from where the workflow stood
    workflow.generate_plan(StructAlgorithm::Cluster).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Planned));
    assert_eq!(workflow.session().unwrap().struct_algorithm, Some(StructAlgorithm::Cluster));
}

#[tokio::test]
async fn test_reset_supports_a_fresh_run() {
    let api = Arc::new(ScriptedApi::new(vec![progress(100, "done")]));
    let mut workflow = Workflow::new(Arc::clone(&api) as Arc<dyn SessionApi>);

    workflow.create_session("/data/inbox", true).await.unwrap();
    workflow.get_preview().await.unwrap();
    assert!(workflow.preview().is_some());

    workflow.reset();
    assert!(!workflow.has_session());
    assert!(workflow.preview().is_none());

    // Stage actions fail fast again until a new session exists
    let err = workflow.run_analysis(AnalysisMethod::Meta).await.unwrap_err();
    assert_eq!(err.to_string(), "No active session");

    workflow.create_session("/data/other", false).await.unwrap();
    assert_eq!(workflow.stage(), Some(Stage::Created));
}
