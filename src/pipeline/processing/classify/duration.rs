use chrono::{Duration, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::rules::RuleTable;
use super::text::FoldedNarrative;
use crate::pipeline::processing::normalize::NormalizedIncident;
use crate::types::NarrativeField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
}

impl TimeUnit {
    fn to_minutes(self, value: i64) -> Option<i64> {
        match self {
            TimeUnit::Minutes => Some(value),
            TimeUnit::Hours => value.checked_mul(60),
        }
    }
}

/// Explicit resuscitation-length mentions; capture group 1 is the amount
pub static DURATION_RULES: Lazy<RuleTable<TimeUnit>> = Lazy::new(|| {
    use TimeUnit::*;
    RuleTable::new(
        "cpr_duration",
        &[
            (r"tras\s+(\d+)\s+min(?:uto)?s?\s+(?:de\s+)?(?:rcp|reanimacion)", Minutes),
            (r"rcp\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?rcp", Minutes),
            (r"reanimacion\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?reanimacion", Minutes),
            (r"masaje\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?masaje", Minutes),
            (r"maniobras\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?maniobras", Minutes),
            (r"soporte vital\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?soporte vital", Minutes),
            (r"compresiones\D{0,40}?(\d+)\s*min", Minutes),
            (r"(\d+)\s*min(?:uto)?s?\D{0,40}?compresiones", Minutes),
            (r"rcp\D{0,40}?(\d+)\s*horas?\b", Hours),
            (r"(\d+)\s*horas?\D{0,40}?rcp", Hours),
        ],
    )
});

/// Clock time near a death mention; groups 1 and 2 are hour and minute
pub static DEATH_TIME_RULES: Lazy<RuleTable<()>> = Lazy::new(|| {
    RuleTable::new(
        "death_time",
        &[
            (r"(?:exitus|fallec\w*|muerte|\bfin\b|cese\w*)\D{0,30}?(\d{1,2})[:h](\d{2})", ()),
            (r"(\d{1,2})[:h](\d{2})\D{0,30}?(?:exitus|fallec\w*|muerte|cese\w*)", ()),
        ],
    )
});

/// Where the resuscitation duration came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DurationSource {
    /// C3_C4 interval, or 0 when nothing better was found
    Recorded,
    Mention { pattern: String, field: NarrativeField },
    DeathTime { field: NarrativeField },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationFinding {
    pub seconds: i64,
    pub source: DurationSource,
}

/// Limits for accepting a derived duration
#[derive(Debug, Clone, Copy)]
pub struct DurationBounds {
    pub max_cpr_minutes: i64,
    pub max_death_offset_minutes: i64,
}

fn mentioned_duration(folded: &FoldedNarrative, bounds: DurationBounds) -> Option<DurationFinding> {
    for (field, text) in folded.iter() {
        for rule in DURATION_RULES.rules() {
            let Some(captures) = rule.regex.captures(text) else {
                continue;
            };
            let Some(amount) = captures.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) else {
                continue;
            };
            let Some(minutes) = rule.outcome.to_minutes(amount) else {
                continue;
            };
            if minutes > 0 && minutes <= bounds.max_cpr_minutes {
                return Some(DurationFinding {
                    seconds: minutes.saturating_mul(60),
                    source: DurationSource::Mention {
                        pattern: rule.label.clone(),
                        field,
                    },
                });
            }
        }
    }
    None
}

/// Seconds from `start` to the first valid clock time near a death mention.
/// A clock time not after `start` is read as the next day.
fn death_time_offset(
    start: NaiveDateTime,
    folded: &FoldedNarrative,
    bounds: DurationBounds,
) -> Option<DurationFinding> {
    let max_seconds = bounds.max_death_offset_minutes.saturating_mul(60);

    for (field, text) in folded.iter() {
        for rule in DEATH_TIME_RULES.rules() {
            let Some(captures) = rule.regex.captures(text) else {
                continue;
            };
            let hour = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let minute = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            let Some(time) = hour
                .zip(minute)
                .and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            else {
                continue;
            };

            let mut end = start.date().and_time(time);
            if end <= start {
                let Some(next_day) = end.checked_add_signed(Duration::days(1)) else {
                    continue;
                };
                end = next_day;
            }
            let seconds = (end - start).num_seconds();
            if seconds > 0 && seconds <= max_seconds {
                return Some(DurationFinding {
                    seconds,
                    source: DurationSource::DeathTime { field },
                });
            }
        }
    }
    None
}

/// Resuscitation duration in seconds.
///
/// A recorded C3_C4 value is kept for ROSC cases. Otherwise an explicit
/// mention in the narrative wins, then the interval from the call (plus unit
/// arrival when nobody started CPR) to a recorded time of death, and finally
/// the recorded value or 0.
pub fn extract_cpr_duration(
    incident: &NormalizedIncident,
    folded: &FoldedNarrative,
    rosc: bool,
    bystander_cpr: bool,
    bounds: DurationBounds,
) -> DurationFinding {
    let prior = incident.prior_cpr_time();
    let recorded = DurationFinding {
        seconds: prior,
        source: DurationSource::Recorded,
    };
    if rosc && prior > 0 {
        return recorded;
    }

    if let Some(found) = mentioned_duration(folded, bounds) {
        return found;
    }

    incident
        .call_time
        .and_then(|call| {
            if bystander_cpr {
                Some(call)
            } else {
                Duration::try_seconds(incident.arrival_time.unwrap_or(0))
                    .and_then(|arrival| call.checked_add_signed(arrival))
            }
        })
        .and_then(|start| death_time_offset(start, folded, bounds))
        .unwrap_or(recorded)
}
