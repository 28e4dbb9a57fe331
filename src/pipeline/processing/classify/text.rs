use crate::types::{Narrative, NarrativeField};

/// Lowercase and strip Spanish accents so rules can be written without them.
/// `ñ` is kept.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

/// "muerte súbita" names the arrest itself, not an outcome
const BENIGN_PHRASES: [(&str, &str); 1] = [("muerte subita", "parada subita")];

/// Folded text of every present narrative field, in scan order
#[derive(Debug, Clone, Default)]
pub struct FoldedNarrative {
    fields: Vec<(NarrativeField, String)>,
}

impl FoldedNarrative {
    pub fn new(narrative: &Narrative) -> Self {
        let fields = NarrativeField::ALL
            .into_iter()
            .filter_map(|field| {
                narrative.get(field).map(|text| {
                    let mut folded = fold(text);
                    for (phrase, replacement) in BENIGN_PHRASES {
                        folded = folded.replace(phrase, replacement);
                    }
                    (field, folded)
                })
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: NarrativeField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NarrativeField, &str)> {
        self.fields.iter().map(|(f, text)| (*f, text.as_str()))
    }

    /// Present fields among `selection`, in scan order
    pub fn select<'a>(
        &'a self,
        selection: &'a [NarrativeField],
    ) -> impl Iterator<Item = (NarrativeField, &'a str)> + 'a {
        self.iter().filter(move |(f, _)| selection.contains(f))
    }
}

/// First `max_chars` characters of a cell, for reports
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("Reanimación CARDIOPULMONAR"), "reanimacion cardiopulmonar");
        assert_eq!(fold("Éxitus"), "exitus");
        assert_eq!(fold("Niño"), "niño");
    }

    #[test]
    fn test_folded_narrative_skips_missing_fields() {
        let narrative = Narrative {
            consulta: Some("PCR".into()),
            hospital: Some("Ingresa en UCI".into()),
            ..Default::default()
        };
        let folded = FoldedNarrative::new(&narrative);

        let fields: Vec<_> = folded.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![NarrativeField::Consulta, NarrativeField::Hospital]);
        assert_eq!(folded.get(NarrativeField::Hospital), Some("ingresa en uci"));
        assert_eq!(folded.get(NarrativeField::Tecnicas), None);
    }

    #[test]
    fn test_sudden_death_phrase_is_neutralized() {
        let narrative = Narrative {
            consulta: Some("Muerte súbita recuperada".into()),
            ..Default::default()
        };
        let folded = FoldedNarrative::new(&narrative);
        assert!(!folded.get(NarrativeField::Consulta).unwrap().contains("muerte"));
    }

    #[test]
    fn test_excerpt_truncates() {
        assert_eq!(excerpt("abc", 10), "abc");
        assert_eq!(excerpt("abcdef", 3), "abc...");
    }
}
