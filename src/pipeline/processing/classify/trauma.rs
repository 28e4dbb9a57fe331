use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::rules::{keywords, KeywordTable};
use super::text::{excerpt, FoldedNarrative};
use crate::types::{Narrative, NarrativeField};

/// Keywords that mark an arrest as traumatic in origin
pub static TRAUMA_KEYWORDS: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "trauma",
        &[
            "trauma",
            "herid",
            "caida",
            "caido",
            "accident",
            "precipitad",
            "ahogamiento",
            "ahogad",
            "sumersion",
            "suicid",
            "autolisis",
            "autolit",
            "ahorcad",
            "defenestr",
            "golpe",
            "agresion",
            "intoxicacion",
            "sobredosis",
            "electrocu",
            "incendio",
            "quemad",
            "atropell",
            "colision",
            r"\barma\b",
            r"\bmoto\b",
            "motocicle",
        ],
    )
});

/// Keywords only read in the presenting complaint. Follow-up notes routinely
/// describe post-arrest anoxic injury with the same words.
pub static PRESENTING_TRAUMA_KEYWORDS: Lazy<KeywordTable> =
    Lazy::new(|| keywords("trauma_presenting", &["lesion"]));

/// Why a case was judged traumatic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraumaFinding {
    pub keyword: String,
    pub field: NarrativeField,
    /// Start of the original cell text
    pub excerpt: String,
}

/// First traumatic keyword across the narrative, scanning fields in order.
pub fn screen_trauma(narrative: &Narrative, folded: &FoldedNarrative) -> Option<TraumaFinding> {
    folded.iter().find_map(|(field, text)| {
        TRAUMA_KEYWORDS
            .first_match(text)
            .or_else(|| {
                (field == NarrativeField::Consulta)
                    .then(|| PRESENTING_TRAUMA_KEYWORDS.first_match(text))
                    .flatten()
            })
            .map(|hit| TraumaFinding {
                keyword: hit.rule.label.clone(),
                field,
                excerpt: excerpt(narrative.get(field).unwrap_or_default(), 100),
            })
    })
}
