use once_cell::sync::Lazy;

use super::rules::{keywords, KeywordTable, RuleTable};
use super::text::FoldedNarrative;
use crate::types::{NarrativeField, Responder};

static MEDICAL: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "medical",
        &[
            "sanitari",
            "medico",
            "enfermer",
            "doctor",
            "facultativo",
            "socorrista",
            r"\btes\b",
            r"\b061\b",
            r"\b060\b",
            r"\bsumma\b",
            r"\bsamur\b",
            r"\bsvb\b",
            r"\bupr\b",
        ],
    )
});

static FIREFIGHTER: Lazy<KeywordTable> =
    Lazy::new(|| keywords("firefighter", &["bombero", r"\b080\b", r"\bbeta\b"]));

static POLICE: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "police",
        &[
            "policia",
            "municipal",
            "guardia civil",
            r"\bagentes?\b",
            r"\b091\b",
            r"\b092\b",
            r"\b062\b",
        ],
    )
});

static BYSTANDER: Lazy<KeywordTable> = Lazy::new(|| {
    keywords(
        "bystander",
        &[
            r"\blego\b",
            "ciudadano",
            "testigo",
            "alertante",
            "demandante",
            "llamante",
            r"\bpersona\b",
        ],
    )
});

/// Responder tables in priority order
static RESPONDER_TABLES: Lazy<[(&'static KeywordTable, Responder); 4]> = Lazy::new(|| {
    [
        (&*MEDICAL, Responder::Medical),
        (&*FIREFIGHTER, Responder::Firefighter),
        (&*POLICE, Responder::Police),
        (&*BYSTANDER, Responder::Bystander),
    ]
});

const RESPONDER_FIELDS: [NarrativeField; 2] = [NarrativeField::Consulta, NarrativeField::Antecedentes];

/// Who performed bystander CPR. Empty when nobody did; telephone-guided CPR
/// is always a lay bystander.
pub fn classify_responder(
    telephone_cpr: bool,
    bystander_cpr: bool,
    folded: &FoldedNarrative,
) -> Option<Responder> {
    if !bystander_cpr && !telephone_cpr {
        return None;
    }
    if telephone_cpr {
        return Some(Responder::Bystander);
    }

    let text: Vec<&str> = folded.select(&RESPONDER_FIELDS).map(|(_, t)| t).collect();
    let text = text.join(" ");

    let category = RESPONDER_TABLES
        .iter()
        .find(|(table, _)| table.is_match(&text))
        .map(|(_, responder)| *responder)
        .unwrap_or(Responder::Bystander);
    Some(category)
}

/// Initial rhythm rules; negated forms come before the positive ones
static RHYTHM_RULES: Lazy<RuleTable<bool>> = Lazy::new(|| {
    RuleTable::new(
        "rhythm",
        &[
            ("no desfibrilable", false),
            ("no chocable", false),
            (r"\b(fv|vf|tv|vt|tvsp)\b", true),
            ("fibrilacion ventricular", true),
            ("taquicardia ventricular", true),
            ("desfibrilable", true),
            ("chocable", true),
        ],
    )
});

/// Whether the recorded initial rhythm is shockable. Blank or unknown is false.
pub fn is_shockable_rhythm(rhythm: Option<&str>) -> bool {
    rhythm
        .map(super::text::fold)
        .and_then(|text| RHYTHM_RULES.outcome(&text))
        .unwrap_or(false)
}
