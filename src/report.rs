use crate::aggregate::{self, ScoreBand, SortKey};
use crate::client::RepositoryResults;
use crate::models::{BulkAnalysisResponse, FileAnalysisResult, FileInfo};
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
}

impl Format {
    /// `--json` wins; otherwise an output path ending in `.json` asks for JSON.
    pub fn choose(json: bool, output: Option<&str>) -> Self {
        let json_path = output
            .and_then(|path| Path::new(path).extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if json || json_path {
            Self::Json
        } else {
            Self::Markdown
        }
    }
}

/// Serializes `value` for JSON, or runs `render` for Markdown.
pub fn format_report<T: Serialize>(
    format: Format,
    value: &T,
    render: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(value)?),
        Format::Markdown => Ok(render(value)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Tab {
    Overview,
    Files,
    Insights,
    #[default]
    All,
}

impl Tab {
    fn shows(self, tab: Tab) -> bool {
        self == Tab::All || self == tab
    }
}

fn score_cell(score: f64) -> String {
    format!("{:.0} ({})", score, ScoreBand::of(score).label())
}

/// Markdown for a whole-repository analysis.
pub fn render_bulk(bulk: &BulkAnalysisResponse, sort: SortKey, tab: Tab) -> String {
    let mut md_content = String::new();
    md_content.push_str("# Repository Analysis\n\n");
    md_content.push_str(&format!("- Repository: {}\n", bulk.repository_url));
    if !bulk.branch.is_empty() {
        md_content.push_str(&format!("- Branch: {}\n", bulk.branch));
    }
    md_content.push('\n');

    if tab.shows(Tab::Overview) {
        render_overview(&mut md_content, bulk);
    }
    if tab.shows(Tab::Files) {
        render_file_table(&mut md_content, bulk, sort);
    }
    if tab.shows(Tab::Insights) {
        render_insights(&mut md_content, bulk);
    }
    md_content
}

fn render_overview(md_content: &mut String, bulk: &BulkAnalysisResponse) {
    let overview = aggregate::overview(bulk);
    md_content.push_str("## Overview\n\n");
    md_content.push_str(&format!("- Overall score: {}\n", score_cell(overview.overall_score)));
    md_content.push_str(&format!("- Files analyzed: {}\n", overview.analyzed_files));
    md_content.push_str(&format!("- Languages: {}\n", overview.languages));
    md_content.push_str(&format!(
        "- Average complexity: {:.0}\n\n",
        overview.average_complexity
    ));

    if !bulk.repository_overview.is_empty() {
        md_content.push_str(&format!("{}\n\n", bulk.repository_overview.trim()));
    }

    if !aggregate::histogram_is_consistent(bulk) {
        warn!(
            "language distribution covers {} files but {} were analyzed",
            bulk.language_distribution.values().sum::<usize>(),
            bulk.analyzed_files.len()
        );
    }
    let shares = aggregate::language_percentages(&bulk.language_distribution);
    if !shares.is_empty() {
        md_content.push_str("### Language Distribution\n\n");
        for share in &shares {
            md_content.push_str(&format!(
                "- {}: {} ({})\n",
                share.language,
                share.count,
                share.percentage_label()
            ));
        }
        md_content.push('\n');
    }

    if !bulk.analysis_summary.is_empty() {
        md_content.push_str("### Summary\n\n");
        md_content.push_str(&format!("{}\n\n", bulk.analysis_summary.trim()));
    }
}

fn render_file_table(md_content: &mut String, bulk: &BulkAnalysisResponse, sort: SortKey) {
    let sorted = aggregate::sort_files(&bulk.analyzed_files, sort);
    md_content.push_str(&format!("## Analyzed Files ({})\n\n", sorted.len()));
    md_content.push_str("| # | File | Path | Language | Score | Quality | Level |\n");
    md_content.push_str("|---|------|------|----------|-------|---------|-------|\n");
    for (index, file) in sorted.iter().enumerate() {
        let level = file
            .complexity_analysis
            .as_ref()
            .map(|c| c.optimization_level.to_string())
            .unwrap_or_else(|| "-".to_string());
        md_content.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.0} | {} |\n",
            index + 1,
            file.file_info.filename,
            file.file_info.relative_path,
            file.file_info.language,
            score_cell(file.ai_score),
            file.quality_metrics.overall_quality_score,
            level
        ));
    }
    md_content.push('\n');
}

fn render_insights(md_content: &mut String, bulk: &BulkAnalysisResponse) {
    md_content.push_str("## Insights\n\n");

    let mut analyzed: Vec<&FileAnalysisResult> = bulk
        .analyzed_files
        .iter()
        .filter(|f| f.complexity_analysis.is_some())
        .collect();
    analyzed.sort_by_key(|f| {
        f.complexity_analysis
            .as_ref()
            .map(|c| c.optimization_level.clone())
    });
    if !analyzed.is_empty() {
        md_content.push_str("### Complexity\n\n");
        for file in analyzed {
            if let Some(c) = &file.complexity_analysis {
                md_content.push_str(&format!(
                    "- **{}**: time {}, space {}, level {}, score {:.0}\n",
                    file.file_info.relative_path,
                    c.time_complexity,
                    c.space_complexity,
                    c.optimization_level,
                    c.complexity_score
                ));
            }
        }
        md_content.push('\n');
    }

    if !bulk.top_issues.is_empty() {
        md_content.push_str("### Top Issues\n\n");
        for issue in &bulk.top_issues {
            md_content.push_str(&format!("- {}\n", issue));
        }
        md_content.push('\n');
    }
    if !bulk.recommendations.is_empty() {
        md_content.push_str("### Recommendations\n\n");
        for rec in &bulk.recommendations {
            md_content.push_str(&format!("- {}\n", rec));
        }
        md_content.push('\n');
    }
}

/// Markdown for the single-file "results" view.
pub fn render_results(results: &RepositoryResults, expanded: &[String]) -> String {
    let analysis = &results.analysis;
    let mut md_content = String::new();
    md_content.push_str("# Analysis Results\n\n");
    md_content.push_str(&format!("- Repository: {}\n", analysis.repository_url));
    md_content.push_str(&format!("- Analyzed file: {}\n", analysis.analyzed_file_path));
    md_content.push_str(&format!("- Language: {}\n", analysis.analyzed_file_language));
    md_content.push_str(&format!("- AI score: {}\n\n", score_cell(analysis.ai_score)));

    let execution = &analysis.execution_result;
    md_content.push_str("## Execution\n\n");
    md_content.push_str(&format!(
        "- {} in {:.2}s (exit code {})\n",
        if execution.success { "Succeeded" } else { "Failed" },
        execution.execution_time,
        execution.exit_code
    ));
    if !execution.output.is_empty() {
        md_content.push_str(&format!("\n```\n{}\n```\n", execution.output.trim_end()));
    }
    if !execution.error.is_empty() {
        md_content.push_str(&format!("\n```\n{}\n```\n", execution.error.trim_end()));
    }
    md_content.push('\n');

    if !analysis.ai_insights.is_empty() {
        md_content.push_str("## AI Insights\n\n");
        md_content.push_str(&format!("{}\n\n", analysis.ai_insights.trim()));
    }
    if !analysis.recommendations.is_empty() {
        md_content.push_str("## Recommendations\n\n");
        md_content.push_str(&format!("{}\n\n", analysis.recommendations.trim()));
    }

    // the service repeats the listing in `all_files`; prefer the dedicated call
    let files = if results.files.is_empty() {
        &analysis.all_files
    } else {
        &results.files
    };
    if !files.is_empty() {
        md_content.push_str(&render_listing(
            files,
            Some(&analysis.analyzed_file_path),
            expanded,
        ));
    }
    md_content
}

/// Listing grouped by language in order of first appearance, best
/// main-file candidates first. With `expanded` empty every group is open;
/// otherwise only the named languages list their files.
pub fn render_listing(files: &[FileInfo], analyzed: Option<&str>, expanded: &[String]) -> String {
    let mut groups: Vec<(String, Vec<FileInfo>)> = Vec::new();
    for file in aggregate::sort_listing(files) {
        match groups.iter_mut().find(|(language, _)| *language == file.language) {
            Some((_, entries)) => entries.push(file),
            None => groups.push((file.language.clone(), vec![file])),
        }
    }

    let mut md_content = format!("## Repository Files ({} total)\n\n", files.len());
    for (language, entries) in &groups {
        let open = expanded.is_empty()
            || expanded.iter().any(|e| e.eq_ignore_ascii_case(language));
        if !open {
            md_content.push_str(&format!("### {} ({}), collapsed\n\n", language, entries.len()));
            continue;
        }
        md_content.push_str(&format!("### {} ({})\n\n", language, entries.len()));
        for file in entries {
            let marker = if analyzed == Some(file.relative_path.as_str()) {
                " (analyzed)"
            } else {
                ""
            };
            md_content.push_str(&format!(
                "- {}{} {} bytes{}\n",
                file.relative_path,
                marker,
                file.size,
                if file.is_executable { ", executable" } else { "" }
            ));
        }
        md_content.push('\n');
    }
    md_content
}

/// Markdown for the detail view of one cached file result.
pub fn render_file_details(file: &FileAnalysisResult, repo_url: &str) -> String {
    let info = &file.file_info;
    let metrics = &file.quality_metrics;
    let mut md_content = String::new();
    md_content.push_str("# File Analysis Details\n\n");
    md_content.push_str(&format!("- Repository: {}\n", repo_url));
    md_content.push_str(&format!("- File: {}\n", info.relative_path));
    md_content.push_str(&format!("- Language: {}\n", info.language));
    md_content.push_str(&format!("- Size: {} bytes\n", info.size));
    md_content.push_str(&format!("- AI score: {}\n", score_cell(file.ai_score)));
    if !file.analysis_timestamp.is_empty() {
        md_content.push_str(&format!("- Analyzed at: {}\n", file.analysis_timestamp));
    }
    md_content.push('\n');

    md_content.push_str("## Quality Metrics\n\n");
    for (name, value) in [
        ("Syntax", metrics.syntax_score),
        ("Readability", metrics.readability_score),
        ("Maintainability", metrics.maintainability_score),
        ("Duplicate code penalty", metrics.duplicate_code_penalty),
        ("Best practices", metrics.best_practices_score),
        ("Overall quality", metrics.overall_quality_score),
    ] {
        md_content.push_str(&format!("- {}: {:.1}\n", name, value));
    }
    md_content.push('\n');

    if let Some(c) = &file.complexity_analysis {
        md_content.push_str("## Complexity\n\n");
        md_content.push_str(&format!("- Time: {}\n", c.time_complexity));
        md_content.push_str(&format!("- Space: {}\n", c.space_complexity));
        md_content.push_str(&format!("- Level: {}\n", c.optimization_level));
        md_content.push_str(&format!("- Score: {:.0}\n", c.complexity_score));
        if !c.explanation.is_empty() {
            md_content.push_str(&format!("\n{}\n", c.explanation.trim()));
        }
        md_content.push('\n');
    }

    if let Some(execution) = &file.execution_result {
        md_content.push_str("## Execution\n\n");
        md_content.push_str(&format!(
            "- {} in {:.2}s (exit code {})\n\n",
            if execution.success { "Succeeded" } else { "Failed" },
            execution.execution_time,
            execution.exit_code
        ));
    }
    if !file.ai_insights.is_empty() {
        md_content.push_str("## AI Insights\n\n");
        md_content.push_str(&format!("{}\n\n", file.ai_insights.trim()));
    }
    if !file.recommendations.is_empty() {
        md_content.push_str("## Recommendations\n\n");
        md_content.push_str(&format!("{}\n\n", file.recommendations.trim()));
    }
    if !file.content.is_empty() {
        md_content.push_str("## Source\n\n");
        md_content.push_str(&format!("```\n{}\n```\n", file.content.trim_end()));
    }
    md_content
}

pub fn generate_md_from_json(
    report_path: &str,
    output_path: Option<&str>,
    sort: SortKey,
) -> Result<()> {
    let report_content = std::fs::read_to_string(report_path)?;
    let bulk: BulkAnalysisResponse = serde_json::from_str(&report_content)?;
    let output = output_path.unwrap_or("analysis_report.md");
    std::fs::write(output, render_bulk(&bulk, sort, Tab::All))?;
    info!("Markdown report written to {}", output);
    Ok(())
}
