//! Plain-text audit trails of a run: why cases were excluded and which kept
//! cases need a person to read them.

use std::io::Write;
use std::path::PathBuf;

use crate::app::ports::RunOutputPort;
use crate::error::Result;
use crate::infra::create_output_file;
use crate::pipeline::diagnostics::Diagnostic;
use crate::pipeline::processing::filter::{Exclusion, ExclusionReason};
use crate::pipeline::processing::quality_gate::{ReviewIssue, ReviewSeverity};
use crate::pipeline::{PipelineOutput, RunInfo};
use crate::report::text::{exclusion_lines, merge_lines};

const IDS_PER_LINE: usize = 10;

fn run_header(title: &str, run: &RunInfo) -> Vec<String> {
    vec![
        title.to_string(),
        "=".repeat(title.len()),
        format!("Run: {}", run.run_id),
        format!("Started: {}", run.started_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Input: {}", run.source.display()),
        format!("Input SHA-256: {}", run.input_sha256),
    ]
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
}

/// Identifiers joined with commas, `IDS_PER_LINE` to a line
pub fn grouped_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let ids: Vec<&str> = ids.into_iter().collect();
    ids.chunks(IDS_PER_LINE)
        .map(|chunk| format!("   {}", chunk.join(", ")))
        .collect()
}

fn exclusions(output: &PipelineOutput) -> Vec<&Exclusion> {
    output
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::Exclusion(e) => Some(e),
            _ => None,
        })
        .collect()
}

pub fn render_exclusion_report(output: &PipelineOutput) -> String {
    let mut lines = run_header("EXCLUSION REPORT", &output.run);

    section(&mut lines, "Summary");
    lines.extend(exclusion_lines(&output.exclusion_stats));

    section(&mut lines, "Unit merge");
    lines.extend(merge_lines(&output.merge_stats));

    let all = exclusions(output);
    let (traumatic, missing): (Vec<&Exclusion>, Vec<&Exclusion>) = all
        .into_iter()
        .partition(|e| matches!(e.reason, ExclusionReason::Traumatic { .. }));

    section(&mut lines, &format!("Traumatic origin ({})", traumatic.len()));
    let with_tcpr = traumatic.iter().filter(|e| e.telephone_cpr).count();
    lines.push(format!("   With telephone CPR: {}", with_tcpr));
    lines.extend(grouped_ids(traumatic.iter().map(|e| e.case_id.as_str())));
    lines.push(String::new());
    for exclusion in &traumatic {
        if let ExclusionReason::Traumatic {
            keyword,
            field,
            excerpt,
        } = &exclusion.reason
        {
            lines.push(format!(
                "   - {}{}: '{}' in {}",
                exclusion.case_id,
                if exclusion.telephone_cpr { " [telephone CPR]" } else { "" },
                keyword,
                field
            ));
            lines.push(format!("     {}", excerpt));
        }
    }

    section(
        &mut lines,
        &format!("Telephone-CPR cell blank ({})", missing.len()),
    );
    lines.extend(grouped_ids(missing.iter().map(|e| e.case_id.as_str())));

    lines.join("\n") + "\n"
}

fn severity_tag(issue: &ReviewIssue) -> &'static str {
    match issue.severity {
        ReviewSeverity::Critical => "CRITICAL",
        ReviewSeverity::Warning => "minor",
        ReviewSeverity::Info => "note",
    }
}

pub fn render_manual_review(output: &PipelineOutput) -> String {
    let mut lines = run_header("MANUAL REVIEW", &output.run);

    let flagged: Vec<(&str, &Vec<ReviewIssue>)> = output
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::ReviewFlag { case_id, issues } => Some((case_id.as_str(), issues)),
            _ => None,
        })
        .collect();

    section(&mut lines, "Summary");
    lines.push(format!(
        "   Cases flagged: {} of {} kept",
        flagged.len(),
        output.cases.len()
    ));
    lines.push(
        "   Rule: any critical reason, or at least two minor reasons".to_string(),
    );

    if flagged.is_empty() {
        lines.push(String::new());
        lines.push("No cases need manual review.".to_string());
        return lines.join("\n") + "\n";
    }

    section(&mut lines, "Identifiers");
    lines.extend(grouped_ids(flagged.iter().map(|(id, _)| *id)));

    section(&mut lines, "Reasons");
    for (case_id, issues) in &flagged {
        lines.push(format!("   - {}", case_id));
        for issue in issues.iter() {
            lines.push(format!("       [{}] {}", severity_tag(issue), issue.description));
        }
    }

    lines.join("\n") + "\n"
}

/// Writes `exclusions_report.txt`
pub struct FileExclusionReportAdapter {
    path: PathBuf,
}

impl FileExclusionReportAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunOutputPort for FileExclusionReportAdapter {
    fn name(&self) -> &'static str {
        "exclusion report"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let mut file = create_output_file(&self.path)?;
        file.write_all(render_exclusion_report(output).as_bytes())?;
        file.flush()?;
        Ok(self.path.clone())
    }
}

/// Writes `manual_review.txt`
pub struct FileManualReviewAdapter {
    path: PathBuf,
}

impl FileManualReviewAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunOutputPort for FileManualReviewAdapter {
    fn name(&self) -> &'static str {
        "manual review"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let mut file = create_output_file(&self.path)?;
        file.write_all(render_manual_review(output).as_bytes())?;
        file.flush()?;
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::filter::ExclusionStats;
    use crate::pipeline::processing::merge::MergeStats;
    use crate::pipeline::processing::quality_gate::ReviewIssueType;
    use crate::types::NarrativeField;

    fn output(diagnostics: Vec<Diagnostic>) -> PipelineOutput {
        PipelineOutput {
            run: RunInfo::new(PathBuf::from("registro.csv"), "ab".repeat(32)),
            cases: Vec::new(),
            derived: Vec::new(),
            diagnostics,
            merge_stats: MergeStats::default(),
            exclusion_stats: ExclusionStats::default(),
        }
    }

    #[test]
    fn test_ids_are_grouped_ten_per_line() {
        let ids: Vec<String> = (1..=23).map(|i| i.to_string()).collect();
        let lines = grouped_ids(ids.iter().map(String::as_str));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   1, 2, 3, 4, 5, 6, 7, 8, 9, 10");
        assert_eq!(lines[2], "   21, 22, 23");
    }

    #[test]
    fn test_exclusion_report_lists_trauma_details() {
        let report = render_exclusion_report(&output(vec![
            Diagnostic::Exclusion(Exclusion {
                case_id: "31".into(),
                telephone_cpr: true,
                reason: ExclusionReason::Traumatic {
                    keyword: "precipitad".into(),
                    field: NarrativeField::Antecedentes,
                    excerpt: "Precipitado desde 3er piso".into(),
                },
            }),
            Diagnostic::Exclusion(Exclusion {
                case_id: "32".into(),
                telephone_cpr: false,
                reason: ExclusionReason::MissingTelephoneCpr,
            }),
        ]));

        assert!(report.starts_with("EXCLUSION REPORT\n================\nRun: "));
        assert!(report.contains(&"ab".repeat(32)));
        assert!(report.contains("Traumatic origin (1)"));
        assert!(report.contains("   With telephone CPR: 1"));
        assert!(report.contains("   - 31 [telephone CPR]: 'precipitad' in antecedentes"));
        let title = "Telephone-CPR cell blank (1)";
        assert!(report.contains(&format!("{}\n{}\n   32", title, "-".repeat(title.len()))));
    }

    #[test]
    fn test_manual_review_lists_reasons() {
        let report = render_manual_review(&output(vec![Diagnostic::ReviewFlag {
            case_id: "77".into(),
            issues: vec![ReviewIssue {
                issue_type: ReviewIssueType::MissingFollowUp,
                severity: ReviewSeverity::Critical,
                description: "ROSC recorded but no follow-up information".into(),
                field: None,
            }],
        }]));
        assert!(report.contains("Cases flagged: 1 of 0 kept"));
        assert!(report.contains("   - 77\n       [CRITICAL] ROSC recorded"));

        let empty = render_manual_review(&output(Vec::new()));
        assert!(empty.contains("No cases need manual review."));
    }
}
