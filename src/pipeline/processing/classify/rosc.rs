use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::rules::{keywords, KeywordTable};
use super::text::FoldedNarrative;
use crate::pipeline::processing::normalize::NormalizedIncident;
use crate::types::NarrativeField;

/// Death on scene; overrides every recovery signal
pub static DEATH_ON_SCENE: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "death_on_scene",
        &[
            "exitus",
            "fallec",
            r"\bmuerte\b",
            r"\bmuert[oa]\b",
            "cese de maniobras",
            "se suspenden maniobras",
        ],
    )
});

pub static RECOVERY: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "recovery",
        &[
            r"\brosc\b",
            "recupera",
            "circulacion espontanea",
            r"\bpulso\b",
        ],
    )
});

static NEGATION: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?:^|\W)(?:no|sin|nunca|ningun|ninguna|ausencia de)\s+(?:se\s+)?$").ok()
});

const ON_SCENE_FIELDS: [NarrativeField; 2] = [NarrativeField::Tecnicas, NarrativeField::Evolucion];
const RECOVERY_FIELDS: [NarrativeField; 3] = [
    NarrativeField::Consulta,
    NarrativeField::Tecnicas,
    NarrativeField::Evolucion,
];

/// What decided the ROSC flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoscEvidence {
    DeathOnScene { keyword: String, field: NarrativeField },
    Keyword { keyword: String, field: NarrativeField },
    PostArrestTime(i64),
    RecordedFlag,
    HospitalText,
    NoEvidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoscFinding {
    pub rosc: bool,
    pub evidence: RoscEvidence,
}

/// Whether the text before a match ends in a negation ("sin pulso", "no se recupera")
fn is_negated(text: &str, match_start: usize) -> bool {
    let prefix = &text[..match_start];
    let window_start = prefix
        .char_indices()
        .rev()
        .nth(24)
        .map(|(i, _)| i)
        .unwrap_or(0);
    NEGATION
        .as_ref()
        .map(|re| re.is_match(&prefix[window_start..]))
        .unwrap_or(false)
}

/// First recovery keyword that occurs at least once without a negation
fn recovery_keyword(text: &str) -> Option<String> {
    RECOVERY.rules().iter().find_map(|rule| {
        rule.regex
            .find_iter(text)
            .any(|m| !is_negated(text, m.start()))
            .then(|| rule.label.clone())
    })
}

/// Return of spontaneous circulation.
///
/// Death on scene wins over everything; otherwise any recovery signal is enough.
pub fn detect_rosc(
    incident: &NormalizedIncident,
    folded: &FoldedNarrative,
    hospital_text_implies_rosc: bool,
) -> RoscFinding {
    for (field, text) in folded.select(&ON_SCENE_FIELDS) {
        if let Some(hit) = DEATH_ON_SCENE.first_match(text) {
            return RoscFinding {
                rosc: false,
                evidence: RoscEvidence::DeathOnScene {
                    keyword: hit.rule.label.clone(),
                    field,
                },
            };
        }
    }

    for (field, text) in folded.select(&RECOVERY_FIELDS) {
        if let Some(keyword) = recovery_keyword(text) {
            return RoscFinding {
                rosc: true,
                evidence: RoscEvidence::Keyword { keyword, field },
            };
        }
    }

    let evidence = match incident.post_arrest_time {
        Some(seconds) if seconds > 0 => RoscEvidence::PostArrestTime(seconds),
        _ if incident.recorded_rosc == Some(true) => RoscEvidence::RecordedFlag,
        _ if hospital_text_implies_rosc && folded.get(NarrativeField::Hospital).is_some() => {
            RoscEvidence::HospitalText
        }
        _ => RoscEvidence::NoEvidence,
    };

    RoscFinding {
        rosc: evidence != RoscEvidence::NoEvidence,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::{DefaultFieldNormalizer, FieldNormalizer};
    use crate::types::{Narrative, RawIncident};

    fn detect(raw: RawIncident, hospital_rule: bool) -> RoscFinding {
        let incident = DefaultFieldNormalizer::new().normalize(raw);
        let folded = FoldedNarrative::new(&incident.raw.narrative);
        detect_rosc(&incident, &folded, hospital_rule)
    }

    fn with_narrative(narrative: Narrative) -> RawIncident {
        RawIncident {
            narrative,
            ..Default::default()
        }
    }

    #[test]
    fn test_tables_compiled() {
        assert_eq!(DEATH_ON_SCENE.len(), 6);
        assert_eq!(RECOVERY.len(), 4);
        assert!(NEGATION.is_some());
    }

    #[test]
    fn test_recovery_keyword() {
        let finding = detect(
            with_narrative(Narrative {
                evolucion: Some("Tras 2 descargas, ROSC".into()),
                ..Default::default()
            }),
            true,
        );
        assert!(finding.rosc);
        assert_eq!(
            finding.evidence,
            RoscEvidence::Keyword {
                keyword: "rosc".into(),
                field: NarrativeField::Evolucion
            }
        );
    }

    #[test]
    fn test_death_beats_recovery() {
        let finding = detect(
            with_narrative(Narrative {
                tecnicas: Some("Recupera pulso brevemente".into()),
                evolucion: Some("Éxitus a las 11:40".into()),
                hospital: Some("no procede".into()),
                ..Default::default()
            }),
            true,
        );
        assert!(!finding.rosc);
        assert!(matches!(finding.evidence, RoscEvidence::DeathOnScene { .. }));
    }

    #[test]
    fn test_negated_recovery_is_ignored() {
        let finding = detect(
            with_narrative(Narrative {
                tecnicas: Some("Paciente sin pulso, no se recupera".into()),
                ..Default::default()
            }),
            true,
        );
        assert!(!finding.rosc);
        assert_eq!(finding.evidence, RoscEvidence::NoEvidence);
    }

    #[test]
    fn test_post_arrest_time_and_recorded_flag() {
        let finding = detect(
            RawIncident {
                c3_c4: Some("420".into()),
                ..Default::default()
            },
            true,
        );
        assert_eq!(finding.evidence, RoscEvidence::PostArrestTime(420));

        let finding = detect(
            RawIncident {
                rosc: Some("Verdadero".into()),
                ..Default::default()
            },
            true,
        );
        assert_eq!(finding.evidence, RoscEvidence::RecordedFlag);
    }

    #[test]
    fn test_hospital_text_rule_is_configurable() {
        let raw = with_narrative(Narrative {
            hospital: Some("Hospital Universitario".into()),
            ..Default::default()
        });
        assert!(detect(raw.clone(), true).rosc);
        assert!(!detect(raw, false).rosc);
    }

    #[test]
    fn test_sudden_death_is_not_death_on_scene() {
        let finding = detect(
            with_narrative(Narrative {
                evolucion: Some("Muerte súbita recuperada, traslado".into()),
                ..Default::default()
            }),
            true,
        );
        assert!(finding.rosc);
    }
}
