//! Wire types for the session backend
//!
//! These mirror the REST contract one-to-one. Parsing happens here at the
//! boundary; the rest of the crate works with typed values only.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle stage
///
/// Forward transitions are driven by successful API calls; any failure lands
/// on `Failed` without discarding the session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Created,
    Analyzing,
    Planned,
    Previewing,
    Applying,
    Completed,
    Failed,
}

impl Stage {
    /// Check if the stage is terminal (no further forward transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Planned => write!(f, "planned"),
            Self::Previewing => write!(f, "previewing"),
            Self::Applying => write!(f, "applying"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How file descriptions are extracted during analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisMethod {
    /// Filesystem metadata only (names, sizes, timestamps)
    Meta,
    /// Structural inspection of file contents
    Struct,
    /// Content-semantic analysis
    Semantic,
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meta => write!(f, "META"),
            Self::Struct => write!(f, "STRUCT"),
            Self::Semantic => write!(f, "SEMANTIC"),
        }
    }
}

impl FromStr for AnalysisMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "META" => Ok(Self::Meta),
            "STRUCT" => Ok(Self::Struct),
            "SEMANTIC" => Ok(Self::Semantic),
            other => Err(format!("Unknown analysis method '{other}'. Supported: META, STRUCT, SEMANTIC")),
        }
    }
}

/// How the restructuring plan is derived from the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructAlgorithm {
    /// Group files by detected type
    ByType,
    /// Cluster files by description similarity
    Cluster,
    /// Apply user-defined criteria rules
    Criteria,
}

impl fmt::Display for StructAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByType => write!(f, "BY_TYPE"),
            Self::Cluster => write!(f, "CLUSTER"),
            Self::Criteria => write!(f, "CRITERIA"),
        }
    }
}

impl FromStr for StructAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BY_TYPE" => Ok(Self::ByType),
            "CLUSTER" => Ok(Self::Cluster),
            "CRITERIA" => Ok(Self::Criteria),
            other => Err(format!(
                "Unknown structuring algorithm '{other}'. Supported: BY_TYPE, CLUSTER, CRITERIA"
            )),
        }
    }
}

/// One workflow instance as the server reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque server-assigned identifier
    pub id: String,

    /// Absolute path of the directory under reorganization
    pub directory: String,

    /// Whether sub-directories are scanned too
    #[serde(default)]
    pub recursive: bool,

    /// Current lifecycle stage
    #[serde(default)]
    pub status: Stage,

    /// Chosen analysis method, once analysis has run
    #[serde(default)]
    pub analysis_method: Option<AnalysisMethod>,

    /// Chosen structuring algorithm, once a plan exists
    #[serde(default)]
    pub struct_algorithm: Option<StructAlgorithm>,

    /// Files discovered by the analysis scan
    #[serde(default)]
    pub files_total: u64,

    /// Actions in the generated plan
    #[serde(default)]
    pub actions_total: u64,

    /// Server-side creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Snapshot of a long-running server job
///
/// Only the latest snapshot is ever retained. The canonical percent field is
/// `percent`; the alias absorbs the legacy `percentage` spelling some
/// endpoints still emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    /// Percent complete, 0-100
    #[serde(alias = "percentage")]
    pub percent: u8,

    /// Free-form status token, matched case-insensitively
    pub status: String,

    /// Optional human-readable progress message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of a completed analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub files_analyzed: u64,

    /// A few example descriptions for display
    #[serde(default)]
    pub description_examples: Vec<String>,
}

/// Result of plan generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub actions_created: u64,

    /// Action count per action type
    #[serde(default)]
    pub breakdown: HashMap<String, u64>,
}

/// Raw preview payload; the tree is parsed by the preview module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewTree {
    #[serde(default)]
    pub tree: serde_json::Value,
}

/// Result of applying (or dry-running) a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied: u64,
    pub failed: u64,

    #[serde(default)]
    pub errors: Vec<String>,
}

/// Discovery descriptor for an analysis method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Discovery descriptor for a structuring algorithm
///
/// `params_schema` is a JSON-Schema-style document; feed it to
/// `formkit::FormSchema::from_json` to build a parameter form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub params_schema: Option<serde_json::Value>,
}

/// One entry of a server-side directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsEntry {
    pub name: String,
    pub path: String,

    /// "file" or "directory"
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}
