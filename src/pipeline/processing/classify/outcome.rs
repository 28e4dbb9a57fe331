use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::rules::{keywords, KeywordTable, RuleTable};
use super::text::FoldedNarrative;
use crate::types::NarrativeField;

/// Death after the patient left the scene
pub static FOLLOW_UP_DEATH: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "follow_up_death",
        &[
            "exitus",
            "fallec",
            r"\bmuerte\b",
            r"\bmuer[eo]\b",
            r"\bmurio\b",
            "obito",
            "defuncion",
            "deceased",
            r"\bdied\b",
        ],
    )
});

pub static FOLLOW_UP_SURVIVAL: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "follow_up_survival",
        &[
            r"\balta\b",
            "domicilio",
            "recuperad",
            r"\bvive\b",
            "sobrevive",
            r"\bconsciente\b",
            "despert",
            "despiert",
            "estable",
            r"\buci\b",
            "planta",
            "ingres",
            "hospitaliza",
            "sin incidencias",
            "traslad",
        ],
    )
});

/// Explicit CPC scores; capture group 1 is the score
pub static EXPLICIT_CPC: Lazy<RuleTable<()>> = Lazy::new(|| {
    RuleTable::new(
        "explicit_cpc",
        &[
            (r"\bcpc\s*-\s*([1-5])\b", ()),
            (r"\bcpc\s*=\s*([1-5])\b", ()),
            (r"\bcpc\s*(?:de|:)?\s*([1-5])\b", ()),
            (r"cerebral\s*performance\s*category\s*([1-5])\b", ()),
            (r"escala\s*cpc\s*([1-5])\b", ()),
            (r"puntuacion\s*cpc\s*([1-5])\b", ()),
            (r"score\s*cpc\s*([1-5])\b", ()),
            (r"categoria\s*cerebral\s*([1-5])\b", ()),
            (r"estado\s*neurologico\s*([1-5])\b", ()),
            (r"glasgow\s*outcome\s*scale?\s*([1-5])\b", ()),
        ],
    )
});

/// Prognosis indicators, good before moderate before poor
pub static PROGNOSIS: Lazy<RuleTable<u8>> = Lazy::new(|| {
    RuleTable::new(
        "prognosis",
        &[
            (r"\bconsciente\b", 1),
            (r"\bvigil\b", 1),
            (r"\borientad[oa]\b", 1),
            ("colaborador", 1),
            ("reactiv", 1),
            ("despiert", 1),
            (r"\balerta\b", 1),
            ("sin deficit", 1),
            ("recuperado completamente", 1),
            ("confus", 2),
            ("desorientad", 2),
            ("agitad", 2),
            ("somnolient", 2),
            ("deficit leve", 2),
            ("deficit moderado", 2),
            (r"\bcoma", 4),
            ("vegetativo", 4),
            ("no responde", 4),
            ("deficit severo", 4),
            (r"\bgrave\b", 4),
            ("sedad", 4),
            ("intubad", 4),
        ],
    )
});

/// What the follow-up notes say about day 7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpStatus {
    Died,
    Survived,
    Unknown,
}

/// Where the CPC score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpcSource {
    /// No ROSC, score 5 by definition
    NoRosc,
    RecordedColumn,
    ExplicitMention,
    Death,
    Indicator,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub survival: bool,
    pub cpc: u8,
    pub cpc_source: CpcSource,
    pub follow_up: FollowUpStatus,
}

impl Outcome {
    /// Whether the CPC score is backed by an explicit value rather than inferred
    pub fn has_explicit_cpc(&self) -> bool {
        matches!(
            self.cpc_source,
            CpcSource::RecordedColumn | CpcSource::ExplicitMention
        )
    }
}

pub fn follow_up_status(folded: &FoldedNarrative) -> FollowUpStatus {
    let texts: Vec<&str> = folded
        .select(&NarrativeField::FOLLOW_UP)
        .map(|(_, t)| t)
        .collect();

    if texts.iter().any(|t| FOLLOW_UP_DEATH.is_match(t)) {
        FollowUpStatus::Died
    } else if texts.iter().any(|t| FOLLOW_UP_SURVIVAL.is_match(t)) {
        FollowUpStatus::Survived
    } else {
        FollowUpStatus::Unknown
    }
}

/// First explicit CPC score across the narrative, fields in scan order
pub fn explicit_cpc(folded: &FoldedNarrative) -> Option<u8> {
    folded.iter().find_map(|(_, text)| {
        EXPLICIT_CPC
            .first_match(text)
            .and_then(|hit| hit.captures.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
    })
}

fn prognosis_cpc(folded: &FoldedNarrative) -> Option<u8> {
    let text: Vec<&str> = folded
        .select(&NarrativeField::FOLLOW_UP)
        .map(|(_, t)| t)
        .collect();
    PROGNOSIS.outcome(&text.join(" "))
}

/// Seven-day survival and CPC.
///
/// Without ROSC the outcome is fixed at (0, 5). A CPC of 5 always forces
/// survival to 0.
pub fn assess_outcome(
    folded: &FoldedNarrative,
    rosc: bool,
    recorded_cpc: Option<u8>,
    default_cpc_when_ambiguous: u8,
) -> Outcome {
    if !rosc {
        return Outcome {
            survival: false,
            cpc: 5,
            cpc_source: CpcSource::NoRosc,
            follow_up: FollowUpStatus::Died,
        };
    }

    let follow_up = follow_up_status(folded);

    let (cpc, cpc_source) = if let Some(cpc) = recorded_cpc {
        (cpc, CpcSource::RecordedColumn)
    } else if let Some(cpc) = explicit_cpc(folded) {
        (cpc, CpcSource::ExplicitMention)
    } else if follow_up == FollowUpStatus::Died {
        (5, CpcSource::Death)
    } else if let Some(cpc) = prognosis_cpc(folded) {
        (cpc, CpcSource::Indicator)
    } else {
        (default_cpc_when_ambiguous, CpcSource::Default)
    };

    Outcome {
        survival: follow_up == FollowUpStatus::Survived && cpc != 5,
        cpc,
        cpc_source,
        follow_up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Narrative;

    fn folded(narrative: Narrative) -> FoldedNarrative {
        FoldedNarrative::new(&narrative)
    }

    #[test]
    fn test_tables_compiled() {
        assert_eq!(FOLLOW_UP_DEATH.len(), 9);
        assert_eq!(FOLLOW_UP_SURVIVAL.len(), 15);
        assert_eq!(EXPLICIT_CPC.len(), 10);
        assert_eq!(PROGNOSIS.len(), 22);
    }

    #[test]
    fn test_no_rosc_is_death() {
        let text = folded(Narrative {
            days_7: Some("Alta a domicilio, CPC 1".into()),
            ..Default::default()
        });
        let outcome = assess_outcome(&text, false, Some(1), 3);
        assert_eq!((outcome.survival, outcome.cpc), (false, 5));
    }

    #[test]
    fn test_explicit_cpc_variants() {
        for (text, expected) in [
            ("Alta con CPC 2", 2),
            ("cpc-1 al alta", 1),
            ("CPC: 3", 3),
            ("cpc de 4", 4),
            ("Cerebral Performance Category 1", 1),
            ("estado neurológico 2", 2),
        ] {
            let narrative = folded(Narrative {
                days_7: Some(text.into()),
                ..Default::default()
            });
            assert_eq!(explicit_cpc(&narrative), Some(expected), "{text}");
        }
    }

    #[test]
    fn test_survivor_with_explicit_cpc() {
        let text = folded(Narrative {
            hours_24: Some("Ingresado en UCI".into()),
            days_7: Some("Alta a planta, CPC 2".into()),
            ..Default::default()
        });
        let outcome = assess_outcome(&text, true, None, 5);
        assert!(outcome.survival);
        assert_eq!(outcome.cpc, 2);
        assert_eq!(outcome.cpc_source, CpcSource::ExplicitMention);
        assert!(outcome.has_explicit_cpc());
    }

    #[test]
    fn test_follow_up_death_gives_cpc_5() {
        let text = folded(Narrative {
            hours_24: Some("Ingresado en UCI".into()),
            days_7: Some("Fallece en UCI".into()),
            ..Default::default()
        });
        let outcome = assess_outcome(&text, true, None, 3);
        assert_eq!(outcome.follow_up, FollowUpStatus::Died);
        assert_eq!((outcome.survival, outcome.cpc), (false, 5));
        assert_eq!(outcome.cpc_source, CpcSource::Death);
    }

    #[test]
    fn test_prognosis_priority() {
        let text = folded(Narrative {
            days_7: Some("Ingresado, consciente aunque algo confuso".into()),
            ..Default::default()
        });
        let outcome = assess_outcome(&text, true, None, 5);
        assert_eq!(outcome.cpc, 1);
        assert_eq!(outcome.cpc_source, CpcSource::Indicator);
        assert!(outcome.survival);
    }

    #[test]
    fn test_ambiguous_cpc_uses_configured_default() {
        let text = folded(Narrative {
            days_7: Some("Sigue ingresado".into()),
            ..Default::default()
        });

        let lenient = assess_outcome(&text, true, None, 3);
        assert_eq!((lenient.cpc, lenient.cpc_source), (3, CpcSource::Default));
        assert!(lenient.survival);

        // a default of 5 also forces survival to 0
        let strict = assess_outcome(&text, true, None, 5);
        assert_eq!(strict.cpc, 5);
        assert!(!strict.survival);
    }

    #[test]
    fn test_empty_follow_up_is_not_survival() {
        let outcome = assess_outcome(&folded(Narrative::default()), true, None, 3);
        assert_eq!(outcome.follow_up, FollowUpStatus::Unknown);
        assert!(!outcome.survival);
        assert_eq!(outcome.cpc, 3);
    }

    #[test]
    fn test_recorded_cpc_wins() {
        let text = folded(Narrative {
            days_7: Some("Alta, CPC 1".into()),
            ..Default::default()
        });
        let outcome = assess_outcome(&text, true, Some(2), 5);
        assert_eq!((outcome.cpc, outcome.cpc_source), (2, CpcSource::RecordedColumn));
    }

    #[test]
    fn test_unconscious_is_not_conscious() {
        let text = folded(Narrative {
            days_7: Some("inconsciente".into()),
            ..Default::default()
        });
        assert_eq!(follow_up_status(&text), FollowUpStatus::Unknown);
    }
}
