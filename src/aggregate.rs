//! Summaries and orderings over an already fetched bulk result.

use crate::models::{BulkAnalysisResponse, FileAnalysisResult, FileInfo};
use clap::ValueEnum;
use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

/// Languages beyond this many are left out of the distribution chart.
pub const TOP_LANGUAGES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Score,
    Name,
    Language,
}

/// Returns a new ordering; equal elements keep their input order.
pub fn sort_files(files: &[FileAnalysisResult], key: SortKey) -> Vec<FileAnalysisResult> {
    let mut sorted = files.to_vec();
    match key {
        SortKey::Score => sorted.sort_by(|a, b| score_desc(a.ai_score, b.ai_score)),
        SortKey::Name => {
            let order = LocaleOrder::new();
            sorted.sort_by(|a, b| order.compare(&a.file_info.filename, &b.file_info.filename))
        }
        SortKey::Language => {
            let order = LocaleOrder::new();
            sorted.sort_by(|a, b| order.compare(&a.file_info.language, &b.file_info.language))
        }
    }
    sorted
}

fn score_desc(a: f64, b: f64) -> Ordering {
    let key = |s: f64| if s.is_nan() { f64::NEG_INFINITY } else { s };
    key(b).total_cmp(&key(a))
}

/// Root-locale collation at tertiary strength: accents and case only
/// decide once the base letters tie, lowercase first.
pub struct LocaleOrder {
    collator: Option<CollatorBorrowed<'static>>,
}

impl LocaleOrder {
    pub fn new() -> Self {
        let mut options = CollatorOptions::default();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                warn!("root collation unavailable, sorting by code point: {}", e);
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

impl Default for LocaleOrder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn locale_compare(a: &str, b: &str) -> Ordering {
    LocaleOrder::new().compare(a, b)
}

/// Listing order for `GET /files` output: best main-file candidates first.
pub fn sort_listing(files: &[FileInfo]) -> Vec<FileInfo> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub count: usize,
    pub percentage: f64,
}

impl LanguageShare {
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

/// Top languages by count with their share of the whole histogram.
///
/// Percentages use the full total, so once more than [`TOP_LANGUAGES`]
/// languages exist the returned shares no longer add up to 100. The
/// remainder is dropped rather than folded into an "other" bucket.
pub fn language_percentages(histogram: &BTreeMap<String, usize>) -> Vec<LanguageShare> {
    let total: usize = histogram.values().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut entries: Vec<(&String, &usize)> = histogram.iter().collect();
    // BTreeMap iteration is name-ordered, stable sort keeps that for ties
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(language, &count)| LanguageShare {
            language: language.clone(),
            count,
            percentage: 100.0 * count as f64 / total as f64,
        })
        .collect()
}

/// Counts analyzed files per language label.
pub fn language_histogram(files: &[FileAnalysisResult]) -> BTreeMap<String, usize> {
    let mut histogram = BTreeMap::new();
    for file in files {
        *histogram.entry(file.file_info.language.clone()).or_insert(0) += 1;
    }
    histogram
}

/// Whether the service's histogram accounts for exactly the analyzed files.
pub fn histogram_is_consistent(bulk: &BulkAnalysisResponse) -> bool {
    bulk.language_distribution.values().sum::<usize>() == bulk.analyzed_files.len()
}

/// Mean complexity score over files that carry a complexity analysis; 0 when none do.
pub fn average_complexity_score(files: &[FileAnalysisResult]) -> f64 {
    let scores: Vec<f64> = files
        .iter()
        .filter_map(|f| f.complexity_analysis.as_ref())
        .map(|c| c.complexity_score)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

/// Figures shown on the overview cards of a bulk report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub overall_score: f64,
    pub analyzed_files: usize,
    pub languages: usize,
    pub average_complexity: f64,
}

pub fn overview(bulk: &BulkAnalysisResponse) -> Overview {
    let languages = if bulk.language_distribution.is_empty() {
        language_histogram(&bulk.analyzed_files).len()
    } else {
        bulk.language_distribution.len()
    };
    Overview {
        overall_score: bulk.overall_repository_score,
        analyzed_files: bulk.analyzed_files.len(),
        languages,
        average_complexity: average_complexity_score(&bulk.analyzed_files),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;

    pub fn file(
        name: &str,
        language: &str,
        score: f64,
        complexity: Option<f64>,
    ) -> FileAnalysisResult {
        FileAnalysisResult {
            file_info: FileInfo {
                path: format!("/tmp/repo/{name}"),
                relative_path: format!("src/{name}"),
                filename: name.to_string(),
                language: language.to_string(),
                size: 100,
                is_executable: false,
                priority: 5,
            },
            content: String::new(),
            execution_result: None,
            ai_score: score,
            complexity_analysis: complexity.map(|score| ComplexityAnalysis {
                time_complexity: "O(n)".to_string(),
                space_complexity: "O(1)".to_string(),
                optimization_level: OptimizationLevel::Good,
                complexity_score: score,
                explanation: String::new(),
            }),
            quality_metrics: CodeQualityMetrics::default(),
            ai_insights: String::new(),
            recommendations: String::new(),
            analysis_timestamp: String::new(),
        }
    }
}
