//! Cohort selection and the final column layout.
//!
//! Traumatic arrests are removed first, then cases whose telephone-CPR cell
//! was blank. Surviving cases keep their input order and are flattened into
//! [`CaseRow`], whose field order is the column order of the cleaned CSV.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::FilterMetrics;
use crate::pipeline::processing::classify::trauma::TraumaFinding;
use crate::pipeline::processing::classify::DerivedCase;
use crate::types::NarrativeField;

/// One row of the cleaned table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRow {
    #[serde(rename = "n_informe")]
    pub id: String,
    /// Call timestamp exactly as it appeared in the export
    #[serde(rename = "fecha")]
    pub call_date: String,
    #[serde(rename = "edad")]
    pub age: Option<i64>,
    #[serde(rename = "sexo")]
    pub sex: String,
    #[serde(rename = "rcp_transtelefonica")]
    pub telephone_cpr: u8,
    #[serde(rename = "rcp_testigos")]
    pub bystander_cpr: u8,
    /// Empty when nobody started CPR before the unit arrived
    #[serde(rename = "respondiente_rcp")]
    pub responder: String,
    #[serde(rename = "desa_externo")]
    pub aed: u8,
    #[serde(rename = "ritmo")]
    pub shockable_rhythm: u8,
    /// Seconds from call to unit arrival
    #[serde(rename = "tiempo_llegada_unidad")]
    pub arrival_time: Option<i64>,
    /// Seconds of resuscitation
    #[serde(rename = "tiempo_rcp")]
    pub cpr_time: i64,
    #[serde(rename = "rosc")]
    pub rosc: u8,
    #[serde(rename = "supervivencia_7dias")]
    pub survival_7d: u8,
    #[serde(rename = "cpc")]
    pub cpc: u8,
}

impl From<&DerivedCase> for CaseRow {
    fn from(case: &DerivedCase) -> Self {
        let incident = &case.incident;
        Self {
            id: incident.raw.id.clone().unwrap_or_default(),
            call_date: incident.raw.call_date.clone().unwrap_or_default(),
            age: incident.age,
            sex: incident.sex.clone().unwrap_or_default(),
            telephone_cpr: flag(case.telephone_cpr),
            bystander_cpr: flag(case.bystander_cpr),
            responder: case
                .responder
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            aed: flag(incident.aed == Some(true)),
            shockable_rhythm: flag(case.shockable_rhythm),
            arrival_time: incident.arrival_time,
            cpr_time: case.cpr_duration.seconds,
            rosc: flag(case.rosc.rosc),
            survival_7d: flag(case.outcome.survival),
            cpc: case.outcome.cpc,
        }
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Why a case left the cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    Traumatic {
        keyword: String,
        field: NarrativeField,
        excerpt: String,
    },
    MissingTelephoneCpr,
}

impl ExclusionReason {
    pub fn code(&self) -> &'static str {
        match self {
            ExclusionReason::Traumatic { .. } => "traumatic",
            ExclusionReason::MissingTelephoneCpr => "missing_telephone_cpr",
        }
    }
}

impl From<&TraumaFinding> for ExclusionReason {
    fn from(finding: &TraumaFinding) -> Self {
        ExclusionReason::Traumatic {
            keyword: finding.keyword.clone(),
            field: finding.field,
            excerpt: finding.excerpt.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub case_id: String,
    pub telephone_cpr: bool,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionStats {
    pub initial: usize,
    pub excluded_traumatic: usize,
    /// Trauma exclusions that had telephone CPR
    pub excluded_traumatic_with_telephone_cpr: usize,
    pub excluded_missing_telephone_cpr: usize,
    pub final_cases: usize,
}

impl ExclusionStats {
    pub fn total_excluded(&self) -> usize {
        self.excluded_traumatic + self.excluded_missing_telephone_cpr
    }
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub kept: Vec<DerivedCase>,
    pub exclusions: Vec<Exclusion>,
    pub stats: ExclusionStats,
}

fn exclusion_reason(case: &DerivedCase) -> Option<ExclusionReason> {
    if let Some(trauma) = &case.trauma {
        return Some(trauma.into());
    }
    if case.incident.telephone_cpr.is_none() {
        return Some(ExclusionReason::MissingTelephoneCpr);
    }
    None
}

/// Split derived cases into the analysis cohort and the exclusions.
pub fn filter_cases(cases: Vec<DerivedCase>) -> FilterOutcome {
    let mut stats = ExclusionStats {
        initial: cases.len(),
        ..Default::default()
    };
    let mut kept = Vec::with_capacity(cases.len());
    let mut exclusions = Vec::new();

    for case in cases {
        match exclusion_reason(&case) {
            None => kept.push(case),
            Some(reason) => {
                match &reason {
                    ExclusionReason::Traumatic { keyword, .. } => {
                        stats.excluded_traumatic += 1;
                        if case.telephone_cpr {
                            stats.excluded_traumatic_with_telephone_cpr += 1;
                        }
                        debug!("Excluding {} as traumatic ('{}')", case.label(), keyword);
                    }
                    ExclusionReason::MissingTelephoneCpr => {
                        stats.excluded_missing_telephone_cpr += 1;
                        debug!("Excluding {}: telephone-CPR cell blank", case.label());
                    }
                }
                exclusions.push(Exclusion {
                    case_id: case.label(),
                    telephone_cpr: case.telephone_cpr,
                    reason,
                });
            }
        }
    }

    stats.final_cases = kept.len();
    FilterMetrics::record_kept(stats.final_cases);
    FilterMetrics::record_excluded_trauma(stats.excluded_traumatic);
    FilterMetrics::record_excluded_missing_telephone_cpr(stats.excluded_missing_telephone_cpr);

    info!(
        "Filter kept {} of {} cases ({} traumatic, {} without telephone-CPR data)",
        stats.final_cases,
        stats.initial,
        stats.excluded_traumatic,
        stats.excluded_missing_telephone_cpr
    );

    FilterOutcome {
        kept,
        exclusions,
        stats,
    }
}

/// Flatten kept cases into output rows, preserving order.
pub fn reorder(cases: &[DerivedCase]) -> Vec<CaseRow> {
    cases.iter().map(CaseRow::from).collect()
}
