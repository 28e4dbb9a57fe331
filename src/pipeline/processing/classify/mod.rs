//! Derives clinical and operational flags from the free-text narrative.

pub mod duration;
pub mod outcome;
pub mod responder;
pub mod rosc;
pub mod rules;
pub mod text;
pub mod trauma;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::ClassifyMetrics;
use crate::pipeline::processing::normalize::NormalizedIncident;
use crate::types::Responder;

use duration::{extract_cpr_duration, DurationBounds, DurationFinding};
use outcome::{assess_outcome, CpcSource, Outcome};
use responder::{classify_responder, is_shockable_rhythm};
use rosc::{detect_rosc, RoscFinding};
use text::FoldedNarrative;
use trauma::{screen_trauma, TraumaFinding};

/// Policy knobs for the text classifier
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// CPC assigned when ROSC occurred but no score or indicator was found
    pub default_cpc_when_ambiguous: u8,
    /// Treat any hospital-course text as evidence of ROSC
    pub hospital_text_implies_rosc: bool,
    /// Longest plausible resuscitation mentioned in the narrative
    pub max_cpr_minutes: i64,
    /// Longest plausible call-to-death interval
    pub max_death_offset_minutes: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_cpc_when_ambiguous: 5,
            hospital_text_implies_rosc: true,
            max_cpr_minutes: 180,
            max_death_offset_minutes: 180,
        }
    }
}

/// An incident with every derived field filled in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedCase {
    pub incident: NormalizedIncident,
    pub telephone_cpr: bool,
    pub bystander_cpr: bool,
    pub responder: Option<Responder>,
    pub shockable_rhythm: bool,
    pub rosc: RoscFinding,
    pub cpr_duration: DurationFinding,
    pub outcome: Outcome,
    /// Set when the narrative marks the arrest as traumatic
    pub trauma: Option<TraumaFinding>,
}

impl DerivedCase {
    pub fn label(&self) -> String {
        self.incident.raw.label()
    }
}

/// Trait for turning normalized incidents into derived cases
pub trait TextClassifier {
    fn classify(&self, incident: NormalizedIncident) -> DerivedCase;

    fn classify_all(&self, incidents: Vec<NormalizedIncident>) -> Vec<DerivedCase> {
        incidents.into_iter().map(|i| self.classify(i)).collect()
    }
}

/// Rule-table classifier for the Spanish registry narrative
pub struct DefaultTextClassifier {
    pub config: ClassifierConfig,
}

impl DefaultTextClassifier {
    pub fn new() -> Self {
        Self {
            config: ClassifierConfig::default(),
        }
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn bounds(&self) -> DurationBounds {
        DurationBounds {
            max_cpr_minutes: self.config.max_cpr_minutes,
            max_death_offset_minutes: self.config.max_death_offset_minutes,
        }
    }
}

impl Default for DefaultTextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClassifier for DefaultTextClassifier {
    fn classify(&self, incident: NormalizedIncident) -> DerivedCase {
        let folded = FoldedNarrative::new(&incident.raw.narrative);

        let trauma = screen_trauma(&incident.raw.narrative, &folded);
        if trauma.is_some() {
            ClassifyMetrics::record_trauma_hit();
        }

        let telephone_cpr = incident.telephone_cpr == Some(true);
        let bystander_cpr = telephone_cpr || incident.bystander_cpr == Some(true);
        let responder = classify_responder(telephone_cpr, bystander_cpr, &folded);
        let shockable_rhythm = is_shockable_rhythm(incident.raw.rhythm.as_deref());

        let rosc = detect_rosc(&incident, &folded, self.config.hospital_text_implies_rosc);
        let cpr_duration =
            extract_cpr_duration(&incident, &folded, rosc.rosc, bystander_cpr, self.bounds());
        let outcome = assess_outcome(
            &folded,
            rosc.rosc,
            incident.recorded_cpc,
            self.config.default_cpc_when_ambiguous,
        );

        if outcome.cpc_source == CpcSource::Default {
            ClassifyMetrics::record_cpc_default_applied();
        }
        ClassifyMetrics::record_case(rosc.rosc, outcome.survival);
        ClassifyMetrics::record_cpr_duration(cpr_duration.seconds);

        debug!(
            "Case {}: rosc={} ({:?}), cpc={} ({:?}), survival={}, cpr={}s",
            incident.raw.label(),
            rosc.rosc,
            rosc.evidence,
            outcome.cpc,
            outcome.cpc_source,
            outcome.survival,
            cpr_duration.seconds
        );

        DerivedCase {
            telephone_cpr,
            bystander_cpr,
            responder,
            shockable_rhythm,
            rosc,
            cpr_duration,
            outcome,
            trauma,
            incident,
        }
    }
}
