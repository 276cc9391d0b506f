use proptest::prelude::*;
use repo2score::aggregate::{
    average_complexity_score, language_percentages, sort_files, SortKey, TOP_LANGUAGES,
};
use repo2score::models::{CodeQualityMetrics, FileAnalysisResult, FileInfo};
use std::collections::BTreeMap;

fn result(index: usize, score: f64, language: &str) -> FileAnalysisResult {
    FileAnalysisResult {
        file_info: FileInfo {
            path: format!("/r/f{index}"),
            relative_path: format!("f{index}"),
            filename: format!("f{index}"),
            language: language.to_string(),
            size: 1,
            is_executable: false,
            priority: 0,
        },
        content: String::new(),
        execution_result: None,
        ai_score: score,
        complexity_analysis: None,
        quality_metrics: CodeQualityMetrics::default(),
        ai_insights: String::new(),
        recommendations: String::new(),
        analysis_timestamp: String::new(),
    }
}

fn files() -> impl Strategy<Value = Vec<FileAnalysisResult>> {
    prop::collection::vec((0.0f64..100.0, "[A-Za-z]{1,6}"), 1..40).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (score, language))| result(i, score, &language))
            .collect()
    })
}

proptest! {
    #[test]
    fn score_order_never_increases(files in files()) {
        let sorted = sort_files(&files, SortKey::Score);
        prop_assert_eq!(sorted.len(), files.len());
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].ai_score >= pair[1].ai_score);
        }
    }

    #[test]
    fn equal_languages_keep_input_order(files in files()) {
        let sorted = sort_files(&files, SortKey::Language);
        for pair in sorted.windows(2) {
            if pair[0].file_info.language == pair[1].file_info.language {
                let first: usize = pair[0].file_info.filename[1..].parse().unwrap();
                let second: usize = pair[1].file_info.filename[1..].parse().unwrap();
                prop_assert!(first < second);
            }
        }
    }

    #[test]
    fn untruncated_percentages_sum_to_hundred(
        histogram in prop::collection::btree_map("[a-z]{1,8}", 1usize..500, 1..=TOP_LANGUAGES)
    ) {
        let sum: f64 = language_percentages(&histogram).iter().map(|s| s.percentage).sum();
        prop_assert!((sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn percentages_are_ordered_by_count(
        histogram in prop::collection::btree_map("[a-z]{1,8}", 1usize..500, 1..20)
    ) {
        let shares = language_percentages(&histogram);
        prop_assert!(shares.len() <= TOP_LANGUAGES);
        for pair in shares.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
    }
}

#[test]
fn average_complexity_without_any_analysis_is_zero() {
    assert_eq!(average_complexity_score(&[]), 0.0);
    let files: Vec<_> = (0..3).map(|i| result(i, 50.0, "Python")).collect();
    assert_eq!(average_complexity_score(&files), 0.0);
}

#[test]
fn empty_histogram_yields_nothing() {
    assert!(language_percentages(&BTreeMap::new()).is_empty());
}
