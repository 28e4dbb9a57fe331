use serde::{Deserialize, Serialize};

use crate::pipeline::processing::classify::outcome::FollowUpStatus;
use crate::pipeline::processing::classify::DerivedCase;

/// Review assessment for one kept case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAssessment {
    pub decision: ReviewDecision,
    pub issues: Vec<ReviewIssue>,
}

impl ReviewAssessment {
    pub fn needs_review(&self) -> bool {
        self.decision == ReviewDecision::ManualReview
    }

    /// Issues that count toward the decision, in the order they were found
    pub fn reasons(&self) -> impl Iterator<Item = &ReviewIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= ReviewSeverity::Warning)
    }
}

/// What the triage decided for a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    /// Nothing worth a second look
    Accept,
    /// Minor gaps, not enough on their own to send to review
    AcceptWithWarnings,
    /// A person should read the narrative before the case is used
    ManualReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub issue_type: ReviewIssueType,
    pub severity: ReviewSeverity,
    pub description: String,
    /// Output column the issue is about
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewIssueType {
    /// ROSC without any follow-up note
    MissingFollowUp,
    /// Survivor whose CPC was inferred rather than recorded
    InferredCpc,
    MissingData,
    InvalidFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReviewSeverity {
    Info,
    /// Minor reason
    Warning,
    /// Sends the case to review on its own
    Critical,
}

/// Trait for the manual-review triage over kept cases
pub trait QualityGate {
    fn assess(&self, case: &DerivedCase) -> ReviewAssessment;
}

#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    /// Minor reasons that together send a case to review
    pub min_minor_issues_for_review: usize,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_minor_issues_for_review: 2,
        }
    }
}

pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self {
            config: QualityGateConfig::default(),
        }
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }

    fn assess_outcome(&self, case: &DerivedCase) -> Vec<ReviewIssue> {
        let mut issues = Vec::new();

        if case.rosc.rosc && case.outcome.follow_up == FollowUpStatus::Unknown {
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::MissingFollowUp,
                severity: ReviewSeverity::Critical,
                description: "ROSC recorded but no follow-up information".to_string(),
                field: Some("supervivencia_7dias".to_string()),
            });
        }

        if case.outcome.survival && !case.outcome.has_explicit_cpc() {
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::InferredCpc,
                severity: ReviewSeverity::Critical,
                description: format!(
                    "Survivor without explicit CPC (assigned {} from {:?})",
                    case.outcome.cpc, case.outcome.cpc_source
                ),
                field: Some("cpc".to_string()),
            });
        }

        issues
    }

    fn assess_demographics(&self, case: &DerivedCase) -> Vec<ReviewIssue> {
        let incident = &case.incident;
        let mut issues = Vec::new();

        if incident.age.is_none() {
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::MissingData,
                severity: ReviewSeverity::Warning,
                description: "Age missing".to_string(),
                field: Some("edad".to_string()),
            });
        }

        if incident.sex.is_none() {
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::MissingData,
                severity: ReviewSeverity::Warning,
                description: "Sex missing".to_string(),
                field: Some("sexo".to_string()),
            });
        }

        if incident.call_time.is_none() {
            let description = match incident.raw.call_date.as_deref() {
                Some(raw) => format!("Call timestamp '{}' could not be parsed", raw),
                None => "Call timestamp missing".to_string(),
            };
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::InvalidFormat,
                severity: ReviewSeverity::Warning,
                description,
                field: Some("fecha".to_string()),
            });
        }

        issues
    }

    fn determine_decision(&self, issues: &[ReviewIssue]) -> ReviewDecision {
        if issues.iter().any(|i| i.severity == ReviewSeverity::Critical) {
            return ReviewDecision::ManualReview;
        }

        let minor = issues
            .iter()
            .filter(|i| i.severity == ReviewSeverity::Warning)
            .count();
        if minor >= self.config.min_minor_issues_for_review {
            return ReviewDecision::ManualReview;
        }
        if minor > 0 {
            return ReviewDecision::AcceptWithWarnings;
        }

        ReviewDecision::Accept
    }
}

impl Default for DefaultQualityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, case: &DerivedCase) -> ReviewAssessment {
        let mut issues = self.assess_outcome(case);
        issues.extend(self.assess_demographics(case));

        for warning in &case.incident.warnings {
            issues.push(ReviewIssue {
                issue_type: ReviewIssueType::InvalidFormat,
                severity: ReviewSeverity::Info,
                description: format!("Normalization warning: {}", warning),
                field: None,
            });
        }

        let decision = self.determine_decision(&issues);
        ReviewAssessment { decision, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::classify::{DefaultTextClassifier, TextClassifier};
    use crate::pipeline::processing::normalize::{DefaultFieldNormalizer, FieldNormalizer};
    use crate::types::{Narrative, RawIncident};

    fn derive(raw: RawIncident) -> DerivedCase {
        let incident = DefaultFieldNormalizer::new().normalize(raw);
        DefaultTextClassifier::new().classify(incident)
    }

    fn complete(narrative: Narrative) -> RawIncident {
        RawIncident {
            id: Some("1001".into()),
            call_date: Some("2023-03-14 10:00:00".into()),
            age: Some("70".into()),
            sex: Some("M".into()),
            telephone_cpr: Some("1".into()),
            narrative,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_case_is_accepted() {
        let case = derive(complete(Narrative {
            tecnicas: Some("RCP 20 min, exitus".into()),
            ..Default::default()
        }));
        let assessment = DefaultQualityGate::new().assess(&case);
        assert_eq!(assessment.decision, ReviewDecision::Accept);
        assert!(assessment.issues.is_empty());
    }

    #[test]
    fn test_rosc_without_follow_up_is_critical() {
        let case = derive(complete(Narrative {
            tecnicas: Some("RCP, recupera pulso".into()),
            ..Default::default()
        }));
        let assessment = DefaultQualityGate::new().assess(&case);
        assert!(assessment.needs_review());
        assert!(assessment
            .issues
            .iter()
            .any(|i| i.issue_type == ReviewIssueType::MissingFollowUp));
    }

    #[test]
    fn test_survivor_without_explicit_cpc_is_critical() {
        let case = derive(complete(Narrative {
            tecnicas: Some("ROSC".into()),
            days_7: Some("Alta, consciente y orientado".into()),
            ..Default::default()
        }));
        assert!(case.outcome.survival);
        let assessment = DefaultQualityGate::new().assess(&case);
        assert!(assessment.needs_review());
        assert_eq!(assessment.reasons().count(), 1);
        assert_eq!(assessment.issues[0].issue_type, ReviewIssueType::InferredCpc);
    }

    #[test]
    fn test_minor_reasons_need_two() {
        let mut raw = complete(Narrative {
            tecnicas: Some("exitus".into()),
            ..Default::default()
        });
        raw.age = None;
        let one = DefaultQualityGate::new().assess(&derive(raw.clone()));
        assert_eq!(one.decision, ReviewDecision::AcceptWithWarnings);

        raw.sex = None;
        let two = DefaultQualityGate::new().assess(&derive(raw.clone()));
        assert_eq!(two.decision, ReviewDecision::ManualReview);

        raw.call_date = Some("not a date".into());
        let three = DefaultQualityGate::new().assess(&derive(raw));
        assert_eq!(three.reasons().count(), 3);
        assert!(three.issues.iter().any(|i| i.severity == ReviewSeverity::Info));
    }
}
