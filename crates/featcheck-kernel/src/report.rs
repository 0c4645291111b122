//! Findings and the report sink.
//!
//! Analysers never fail on what they find. Every unresolved import,
//! ambiguous provider or unbacked region export becomes a [`Finding`]
//! pushed to a [`ReportSink`] as either an error or a warning.

use crate::finding_id::{compute_finding_id, compute_report_digest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const ANALYSIS_REPORT_KIND: &str = "featcheck.analysis.v1";
pub const ANALYSIS_REPORT_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingClass {
    /// A mandatory import or requirement has no visible provider.
    MissingMandatory,
    /// An optional import or requirement has no visible provider.
    MissingOptional,
    /// More than one visible provider fits.
    AmbiguousMatch,
    /// A region declares an export no module backs.
    UnbackedExport,
    /// An export without version, or an import without range.
    UndeclaredVersion,
}

impl FindingClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingClass::MissingMandatory => "missing_mandatory",
            FindingClass::MissingOptional => "missing_optional",
            FindingClass::AmbiguousMatch => "ambiguous_match",
            FindingClass::UnbackedExport => "unbacked_export",
            FindingClass::UndeclaredVersion => "undeclared_version",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub finding_id: String,
    /// Id of the task that produced the finding.
    pub task: String,
    pub class: FindingClass,
    /// The module, artifact or region the finding is about.
    pub subject: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        task: impl Into<String>,
        class: FindingClass,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let task = task.into();
        let subject = subject.into();
        let message = message.into();
        let finding_id = compute_finding_id(&task, class.as_str(), &subject, &message);
        Self {
            finding_id,
            task,
            class,
            subject,
            message,
        }
    }
}

/// Where analysers push findings.
pub trait ReportSink {
    fn report_error(&mut self, finding: Finding);
    fn report_warning(&mut self, finding: Finding);
}

/// Sink that keeps findings in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingSink {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

impl ReportSink for CollectingSink {
    fn report_error(&mut self, finding: Finding) {
        tracing::debug!(task = %finding.task, class = finding.class.as_str(), "error reported");
        self.errors.push(finding);
    }

    fn report_warning(&mut self, finding: Finding) {
        tracing::debug!(task = %finding.task, class = finding.class.as_str(), "warning reported");
        self.warnings.push(finding);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub module_count: usize,
    pub task_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub schema: u32,
    pub report_kind: String,
    pub deployable: String,
    pub result: String,
    pub tasks: Vec<String>,
    pub failure_classes: Vec<String>,
    pub warning_classes: Vec<String>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub summary: AnalysisSummary,
    /// Order-sensitive digest over every finding id.
    pub digest: String,
}

impl AnalysisReport {
    pub fn new(
        deployable: impl Into<String>,
        tasks: Vec<String>,
        module_count: usize,
        sink: CollectingSink,
    ) -> Self {
        let CollectingSink { errors, warnings } = sink;
        let digest = compute_report_digest(
            errors.iter().map(|f| f.finding_id.as_str()),
            warnings.iter().map(|f| f.finding_id.as_str()),
        );
        let summary = AnalysisSummary {
            module_count,
            task_count: tasks.len(),
            error_count: errors.len(),
            warning_count: warnings.len(),
        };
        Self {
            schema: ANALYSIS_REPORT_SCHEMA,
            report_kind: ANALYSIS_REPORT_KIND.to_string(),
            deployable: deployable.into(),
            result: if errors.is_empty() {
                "accepted".to_string()
            } else {
                "rejected".to_string()
            },
            tasks,
            failure_classes: collect_classes(&errors),
            warning_classes: collect_classes(&warnings),
            errors,
            warnings,
            summary,
            digest,
        }
    }

    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

fn collect_classes(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .map(|finding| finding.class.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink_is_accepted() {
        let report = AnalysisReport::new(
            "g:f:1",
            vec!["api-regions".to_string()],
            0,
            CollectingSink::new(),
        );
        assert!(report.accepted());
        assert!(report.failure_classes.is_empty());

        let json = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["reportKind"], ANALYSIS_REPORT_KIND);
        assert_eq!(json["summary"]["taskCount"], 1);
    }

    #[test]
    fn errors_reject_and_classes_dedupe() {
        let mut sink = CollectingSink::new();
        sink.report_error(Finding::new("t", FindingClass::MissingMandatory, "a", "x"));
        sink.report_error(Finding::new("t", FindingClass::MissingMandatory, "b", "y"));
        sink.report_warning(Finding::new("t", FindingClass::AmbiguousMatch, "a", "z"));
        let report = AnalysisReport::new("f", vec!["t".to_string()], 2, sink);
        assert!(!report.accepted());
        assert_eq!(report.failure_classes, vec!["missing_mandatory"]);
        assert_eq!(report.warning_classes, vec!["ambiguous_match"]);
        assert_eq!(report.summary.error_count, 2);
        assert_eq!(report.summary.warning_count, 1);
    }

    #[test]
    fn class_serializes_snake_case() {
        let finding = Finding::new("t", FindingClass::UnbackedExport, "r", "m");
        let json = serde_json::to_value(&finding).expect("finding serializes");
        assert_eq!(json["class"], "unbacked_export");
        assert_eq!(json["findingId"], finding.finding_id.as_str());
    }
}
