use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::MergeMetrics;
use crate::pipeline::processing::normalize::{parse_call_timestamp, parse_flag};
use crate::types::{RawIncident, UnitType};

/// How an advanced-unit report is paired with a basic-unit report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Identical call timestamp text
    Exact,
    /// Same calendar day, hour and minute
    SameMinute,
    /// Call timestamps at most `window_minutes` apart
    Window,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub strategy: MatchStrategy,
    pub window_minutes: i64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::Window,
            window_minutes: 120,
        }
    }
}

/// Counters describing one merge pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeStats {
    pub total_records: usize,
    pub advanced_records: usize,
    pub basic_records: usize,
    pub other_records: usize,
    pub matched_advanced: usize,
    pub unmatched_advanced: usize,
    /// Distinct basic-unit rows used by at least one merge
    pub basic_used: usize,
    pub basic_unmatched: usize,
    /// Advanced-unit rows for which more than one basic-unit row qualified
    pub ambiguous_matches: usize,
    pub telephone_cpr_advanced: usize,
    pub telephone_cpr_basic: usize,
    pub telephone_cpr_after_merge: usize,
    /// Identifiers of telephone-CPR cases only recorded on dropped basic-unit rows
    pub lost_telephone_cpr_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// One record per advanced-unit incident, in input order
    pub records: Vec<RawIncident>,
    pub stats: MergeStats,
}

/// Reconciles reports filed by two units for the same incident
pub trait UnitMerger {
    fn merge(&self, records: Vec<RawIncident>) -> MergeOutcome;
}

/// Merger that keeps advanced-unit reports as the base and back-fills
/// from the first qualifying basic-unit report
pub struct DefaultUnitMerger {
    pub config: MergeConfig,
}

impl DefaultUnitMerger {
    pub fn new() -> Self {
        Self {
            config: MergeConfig::default(),
        }
    }

    pub fn with_config(config: MergeConfig) -> Self {
        Self { config }
    }

    fn is_match(&self, advanced: &Keyed<'_>, basic: &Keyed<'_>) -> bool {
        match self.config.strategy {
            MatchStrategy::Exact => match (&advanced.record.call_date, &basic.record.call_date) {
                (Some(a), Some(b)) => a.trim() == b.trim(),
                _ => false,
            },
            MatchStrategy::SameMinute => match (advanced.time, basic.time) {
                (Some(a), Some(b)) => {
                    a.date() == b.date() && a.hour() == b.hour() && a.minute() == b.minute()
                }
                _ => false,
            },
            MatchStrategy::Window => match (advanced.time, basic.time) {
                (Some(a), Some(b)) => (a - b).num_minutes().abs() <= self.config.window_minutes,
                _ => false,
            },
        }
    }
}

impl Default for DefaultUnitMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// A record paired with its parsed call time
struct Keyed<'a> {
    record: &'a RawIncident,
    time: Option<NaiveDateTime>,
}

impl<'a> Keyed<'a> {
    fn new(record: &'a RawIncident) -> Self {
        Self {
            record,
            time: record.call_date.as_deref().and_then(parse_call_timestamp),
        }
    }
}

fn is_set(cell: &Option<String>) -> bool {
    parse_flag(cell.as_deref()) == Some(true)
}

fn merge_pair(advanced: &RawIncident, basic: &RawIncident) -> RawIncident {
    let mut merged = advanced.clone();
    merged.backfill_from(basic);

    if is_set(&advanced.telephone_cpr) || is_set(&basic.telephone_cpr) {
        merged.telephone_cpr = Some("1".to_string());
    }
    // Telephone CPR recorded by the basic unit implies bystander CPR
    if is_set(&advanced.bystander_cpr) || is_set(&basic.bystander_cpr) || is_set(&basic.telephone_cpr)
    {
        merged.bystander_cpr = Some("1".to_string());
    }
    merged
}

impl UnitMerger for DefaultUnitMerger {
    fn merge(&self, records: Vec<RawIncident>) -> MergeOutcome {
        let mut stats = MergeStats {
            total_records: records.len(),
            ..Default::default()
        };

        let mut advanced = Vec::new();
        let mut basic = Vec::new();
        for record in &records {
            match record.unit() {
                UnitType::Advanced => advanced.push(Keyed::new(record)),
                UnitType::Basic => basic.push(Keyed::new(record)),
                UnitType::Other => stats.other_records += 1,
            }
        }
        stats.advanced_records = advanced.len();
        stats.basic_records = basic.len();
        stats.telephone_cpr_advanced = advanced.iter().filter(|k| is_set(&k.record.telephone_cpr)).count();
        stats.telephone_cpr_basic = basic.iter().filter(|k| is_set(&k.record.telephone_cpr)).count();

        info!(
            "Merging {} advanced-unit and {} basic-unit reports ({:?} strategy)",
            stats.advanced_records, stats.basic_records, self.config.strategy
        );

        let mut used = vec![false; basic.len()];
        let mut merged_records = Vec::with_capacity(advanced.len());

        for adv in &advanced {
            let mut candidates = basic
                .iter()
                .enumerate()
                .filter(|(_, b)| self.is_match(adv, b))
                .map(|(i, _)| i);

            match candidates.next() {
                Some(first) => {
                    if candidates.next().is_some() {
                        stats.ambiguous_matches += 1;
                        debug!(
                            "Report {} has several basic-unit candidates, using {}",
                            adv.record.label(),
                            basic[first].record.label()
                        );
                    }
                    used[first] = true;
                    stats.matched_advanced += 1;
                    MergeMetrics::record_match();
                    merged_records.push(merge_pair(adv.record, basic[first].record));
                }
                None => {
                    stats.unmatched_advanced += 1;
                    MergeMetrics::record_no_match();
                    merged_records.push(adv.record.clone());
                }
            }
        }

        stats.basic_used = used.iter().filter(|u| **u).count();
        stats.basic_unmatched = basic.len() - stats.basic_used;
        stats.lost_telephone_cpr_ids = basic
            .iter()
            .zip(&used)
            .filter(|(b, used)| !**used && is_set(&b.record.telephone_cpr))
            .map(|(b, _)| b.record.label())
            .collect();
        stats.telephone_cpr_after_merge = merged_records.iter().filter(|r| is_set(&r.telephone_cpr)).count();

        MergeMetrics::record_dropped_basic(stats.basic_unmatched);
        MergeMetrics::record_dropped_other(stats.other_records);
        MergeMetrics::record_lost_telephone_cpr(stats.lost_telephone_cpr_ids.len());

        if !stats.lost_telephone_cpr_ids.is_empty() {
            warn!(
                "{} telephone-CPR cases were only recorded on unmatched basic-unit reports",
                stats.lost_telephone_cpr_ids.len()
            );
        }
        if stats.other_records > 0 {
            warn!("Dropped {} reports with an unknown unit type", stats.other_records);
        }
        info!(
            "Merge finished: {} matched, {} advanced without match, {} basic dropped",
            stats.matched_advanced, stats.unmatched_advanced, stats.basic_unmatched
        );

        MergeOutcome {
            records: merged_records,
            stats,
        }
    }
}
