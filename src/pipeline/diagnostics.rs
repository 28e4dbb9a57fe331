use serde::{Deserialize, Serialize};

use crate::pipeline::processing::filter::Exclusion;
use crate::pipeline::processing::quality_gate::ReviewIssue;

/// Something a run noticed about an individual case.
///
/// Serialized one per line into `diagnostics.ndjson`, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Identifier repeated within the raw export
    DuplicateId { case_id: String },
    /// Telephone CPR recorded on a basic unit row that had no advanced partner
    LostInMerge { case_id: String },
    /// Case removed from the cohort
    Exclusion(Exclusion),
    /// Kept case that needs a person to read the narrative
    ReviewFlag {
        case_id: String,
        issues: Vec<ReviewIssue>,
    },
}

impl Diagnostic {
    pub fn case_id(&self) -> &str {
        match self {
            Diagnostic::DuplicateId { case_id }
            | Diagnostic::LostInMerge { case_id }
            | Diagnostic::ReviewFlag { case_id, .. } => case_id,
            Diagnostic::Exclusion(exclusion) => &exclusion.case_id,
        }
    }

    pub fn is_review_flag(&self) -> bool {
        matches!(self, Diagnostic::ReviewFlag { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::filter::ExclusionReason;

    #[test]
    fn test_diagnostics_serialize_with_kind_tag() {
        let exclusion = Diagnostic::Exclusion(Exclusion {
            case_id: "42".into(),
            telephone_cpr: false,
            reason: ExclusionReason::MissingTelephoneCpr,
        });
        let json = serde_json::to_value(&exclusion).unwrap();
        assert_eq!(json["kind"], "exclusion");
        assert_eq!(json["case_id"], "42");
        assert_eq!(json["reason"], "missing_telephone_cpr");
        assert_eq!(exclusion.case_id(), "42");

        let lost = serde_json::to_string(&Diagnostic::LostInMerge {
            case_id: "7".into(),
        })
        .unwrap();
        assert_eq!(lost, r#"{"kind":"lost_in_merge","case_id":"7"}"#);
    }
}
