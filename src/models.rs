use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One source file discovered by the analysis service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FileInfo {
    pub path: String,

    pub relative_path: String,

    pub filename: String,

    pub language: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub is_executable: bool,

    /// Lower rank means the backend considers the file a better "main" candidate.
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ExecutionResult {
    pub success: bool,

    #[serde(default)]
    pub output: String,

    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub execution_time: f64,

    #[serde(default)]
    pub exit_code: i32,
}

/// Qualitative optimization tag, ordered from best to worst.
///
/// Labels the service invents later are kept verbatim in `Other` and rank
/// after every known level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptimizationLevel {
    Optimal,
    Good,
    Average,
    Poor,
    BruteForce,
    Other(String),
}

impl OptimizationLevel {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Optimal => 0,
            Self::Good => 1,
            Self::Average => 2,
            Self::Poor => 3,
            Self::BruteForce => 4,
            Self::Other(_) => 5,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Optimal => "Optimal",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::BruteForce => "Brute Force",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for OptimizationLevel {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "optimal" => Self::Optimal,
            "good" => Self::Good,
            "average" => Self::Average,
            "poor" => Self::Poor,
            "brute force" | "brute_force" | "bruteforce" => Self::BruteForce,
            _ => Self::Other(raw),
        }
    }
}

impl From<OptimizationLevel> for String {
    fn from(level: OptimizationLevel) -> Self {
        level.label().to_string()
    }
}

impl PartialOrd for OptimizationLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OptimizationLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.label().cmp(other.label()))
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComplexityAnalysis {
    pub time_complexity: String,

    pub space_complexity: String,

    pub optimization_level: OptimizationLevel,

    pub complexity_score: f64,

    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CodeQualityMetrics {
    #[serde(default)]
    pub syntax_score: f64,

    #[serde(default)]
    pub readability_score: f64,

    #[serde(default)]
    pub maintainability_score: f64,

    #[serde(default)]
    pub duplicate_code_penalty: f64,

    #[serde(default)]
    pub best_practices_score: f64,

    #[serde(default)]
    pub overall_quality_score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileAnalysisResult {
    pub file_info: FileInfo,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<ExecutionResult>,

    pub ai_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_analysis: Option<ComplexityAnalysis>,

    #[serde(default)]
    pub quality_metrics: CodeQualityMetrics,

    #[serde(default)]
    pub ai_insights: String,

    #[serde(default)]
    pub recommendations: String,

    #[serde(default)]
    pub analysis_timestamp: String,
}

/// Whole-repository result returned by `POST /analyze-bulk`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulkAnalysisResponse {
    pub repository_url: String,

    #[serde(default)]
    pub branch: String,

    pub total_files: usize,

    pub analyzed_files: Vec<FileAnalysisResult>,

    #[serde(default)]
    pub repository_overview: String,

    pub overall_repository_score: f64,

    #[serde(default)]
    pub language_distribution: BTreeMap<String, usize>,

    #[serde(default)]
    pub analysis_summary: String,

    #[serde(default)]
    pub top_issues: Vec<String>,

    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Single-file result returned by `POST /analyze`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub repository_url: String,

    pub analyzed_file_found: bool,

    #[serde(default)]
    pub analyzed_file_path: String,

    #[serde(default)]
    pub analyzed_file_content: String,

    #[serde(default)]
    pub analyzed_file_language: String,

    #[serde(default)]
    pub all_files: Vec<FileInfo>,

    #[serde(default)]
    pub execution_result: ExecutionResult,

    pub ai_score: f64,

    #[serde(default)]
    pub ai_insights: String,

    #[serde(default)]
    pub recommendations: String,
}

/// `GET /files` body. Older services omit `repository_url`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilesResponse {
    #[serde(default)]
    pub repository_url: Option<String>,

    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnalyzeRequest {
    pub repo_url: String,

    pub branch: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_file: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BulkAnalyzeRequest {
    pub repo_url: String,

    pub branch: String,

    pub bulk_analyze: bool,
}

/// Error payload the service attaches to non-2xx responses.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimization_level_parses_known_labels_case_insensitively() {
        assert_eq!(
            OptimizationLevel::from("brute force".to_string()),
            OptimizationLevel::BruteForce
        );
        assert_eq!(OptimizationLevel::from("GOOD".to_string()), OptimizationLevel::Good);
        assert_eq!(
            OptimizationLevel::from("Exotic".to_string()),
            OptimizationLevel::Other("Exotic".to_string())
        );
    }

    #[test]
    fn optimization_levels_are_ordered_best_first() {
        let mut levels = vec![
            OptimizationLevel::Other("Mystery".to_string()),
            OptimizationLevel::Poor,
            OptimizationLevel::Optimal,
            OptimizationLevel::BruteForce,
            OptimizationLevel::Average,
            OptimizationLevel::Good,
        ];
        levels.sort();
        let labels: Vec<_> = levels.iter().map(|l| l.label().to_string()).collect();
        assert_eq!(
            labels,
            vec!["Optimal", "Good", "Average", "Poor", "Brute Force", "Mystery"]
        );
    }

    #[test]
    fn files_response_tolerates_missing_repository_url() {
        let body = r#"{"files":[{"path":"/tmp/x/a.py","relative_path":"a.py",
            "filename":"a.py","language":"Python","size":10,
            "is_executable":true,"priority":1}]}"#;
        let parsed: FilesResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.repository_url.is_none());
        assert_eq!(parsed.files[0].relative_path, "a.py");
    }

    #[test]
    fn analyze_request_omits_absent_specific_file() {
        let request = AnalyzeRequest {
            repo_url: "https://github.com/TheAlgorithms/Python.git".to_string(),
            branch: String::new(),
            specific_file: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["branch"], "");
        assert!(value.get("specific_file").is_none());
    }
}
