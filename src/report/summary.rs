use serde::Serialize;

use crate::pipeline::processing::filter::CaseRow;
use crate::report::percentage;
use crate::types::Responder;

/// Age cut-off for the older stratum
pub const ELDERLY_AGE: i64 = 65;

/// `count` out of `total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Proportion {
    pub count: usize,
    pub total: usize,
}

impl Proportion {
    fn of<T>(rows: &[T], pred: impl Fn(&T) -> bool) -> Self {
        Self {
            count: rows.iter().filter(|r| pred(*r)).count(),
            total: rows.len(),
        }
    }

    /// `None` when the denominator is empty
    pub fn pct(&self) -> Option<f64> {
        percentage(self.count, self.total)
    }
}

/// Descriptive statistics over the present values of a column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` below two values
    pub sd: Option<f64>,
    pub median: f64,
    pub min: i64,
    pub max: i64,
}

impl NumericSummary {
    pub fn from_values(values: &[i64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let n = sorted.len();
        let mean = sorted.iter().map(|v| *v as f64).sum::<f64>() / n as f64;
        let sd = (n > 1).then(|| {
            let variance = sorted
                .iter()
                .map(|v| (*v as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            variance.sqrt()
        });
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
        } else {
            sorted[n / 2] as f64
        };

        Some(Self {
            count: n,
            mean,
            sd,
            median,
            min: sorted[0],
            max: sorted[n - 1],
        })
    }
}

/// Outcomes within one subgroup of the cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stratum {
    pub label: String,
    pub cases: usize,
    pub rosc: Proportion,
    pub survival: Proportion,
    /// CPC 1-2 among all cases of the stratum
    pub favorable_cpc: Proportion,
}

impl Stratum {
    fn new(label: impl Into<String>, rows: &[&CaseRow]) -> Self {
        Self {
            label: label.into(),
            cases: rows.len(),
            rosc: Proportion::of(rows, |r| r.rosc == 1),
            survival: Proportion::of(rows, |r| r.survival_7d == 1),
            favorable_cpc: Proportion::of(rows, |r| is_favorable(r.cpc)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpcCount {
    pub cpc: u8,
    pub description: &'static str,
    pub cases: Proportion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponderCount {
    pub responder: Responder,
    /// Share of cases with bystander CPR
    pub cases: Proportion,
}

/// Aggregate statistics over the cleaned cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub total: usize,
    pub age: Option<NumericSummary>,
    /// Counts per recorded sex, blanks under `unknown`
    pub sex: Vec<(String, usize)>,
    pub telephone_cpr: Proportion,
    pub bystander_cpr: Proportion,
    pub responders: Vec<ResponderCount>,
    pub aed: Proportion,
    pub shockable_rhythm: Proportion,
    pub arrival_time: Option<NumericSummary>,
    /// Only cases with a resuscitation time above zero
    pub cpr_time: Option<NumericSummary>,
    pub rosc: Proportion,
    pub survival: Proportion,
    pub cpc_distribution: Vec<CpcCount>,
    pub favorable_cpc_among_survivors: Proportion,
    /// With telephone CPR first, then without
    pub by_telephone_cpr: [Stratum; 2],
    /// Shockable first, then non-shockable
    pub by_rhythm: [Stratum; 2],
    pub by_age: [Stratum; 2],
    /// At or below the median arrival time first, then above
    pub by_arrival: Option<[Stratum; 2]>,
    pub by_cpr_group: Vec<Stratum>,
}

pub fn cpc_description(cpc: u8) -> &'static str {
    match cpc {
        1 => "Good cerebral performance",
        2 => "Moderate cerebral disability",
        3 => "Severe cerebral disability",
        4 => "Coma or vegetative state",
        5 => "Death",
        _ => "Unknown",
    }
}

fn is_favorable(cpc: u8) -> bool {
    matches!(cpc, 1 | 2)
}

fn split<'a>(rows: &'a [CaseRow], pred: impl Fn(&CaseRow) -> bool) -> (Vec<&'a CaseRow>, Vec<&'a CaseRow>) {
    rows.iter().partition(|r| pred(*r))
}

fn cpr_group(row: &CaseRow) -> &'static str {
    if row.telephone_cpr == 1 {
        "Telephone CPR"
    } else if row.bystander_cpr == 0 {
        "No CPR before arrival"
    } else if row.responder == Responder::Bystander.as_str() || row.responder.is_empty() {
        "Unassisted bystander CPR"
    } else {
        "First-responder CPR"
    }
}

const CPR_GROUPS: [&str; 4] = [
    "Telephone CPR",
    "Unassisted bystander CPR",
    "First-responder CPR",
    "No CPR before arrival",
];

impl CohortSummary {
    /// Compute every statistic over `rows` without touching them.
    pub fn compute(rows: &[CaseRow]) -> Self {
        let ages: Vec<i64> = rows.iter().filter_map(|r| r.age).collect();
        let arrivals: Vec<i64> = rows.iter().filter_map(|r| r.arrival_time).collect();
        let cpr_times: Vec<i64> = rows.iter().map(|r| r.cpr_time).filter(|t| *t > 0).collect();

        let mut sex: Vec<(String, usize)> = Vec::new();
        for row in rows {
            let key = if row.sex.is_empty() {
                "unknown".to_string()
            } else {
                row.sex.to_uppercase()
            };
            match sex.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => sex.push((key, 1)),
            }
        }
        sex.sort();

        let with_bystander: Vec<&CaseRow> = rows.iter().filter(|r| r.bystander_cpr == 1).collect();
        let responders = Responder::ALL
            .iter()
            .map(|responder| ResponderCount {
                responder: *responder,
                cases: Proportion::of(&with_bystander, |r| r.responder == responder.as_str()),
            })
            .collect();

        let cpc_distribution = (1..=5)
            .map(|cpc| CpcCount {
                cpc,
                description: cpc_description(cpc),
                cases: Proportion::of(rows, |r| r.cpc == cpc),
            })
            .collect();

        let survivors: Vec<&CaseRow> = rows.iter().filter(|r| r.survival_7d == 1).collect();

        let (tcpr, no_tcpr) = split(rows, |r| r.telephone_cpr == 1);
        let (shockable, non_shockable) = split(rows, |r| r.shockable_rhythm == 1);
        let (younger, older) = split(rows, |r| r.age.map_or(false, |a| a < ELDERLY_AGE));
        let older: Vec<&CaseRow> = older.into_iter().filter(|r| r.age.is_some()).collect();

        let arrival_time = NumericSummary::from_values(&arrivals);
        let by_arrival = arrival_time.as_ref().map(|summary| {
            let median = summary.median;
            let timed: Vec<&CaseRow> = rows.iter().filter(|r| r.arrival_time.is_some()).collect();
            let (fast, slow): (Vec<&CaseRow>, Vec<&CaseRow>) = timed
                .into_iter()
                .partition(|r| r.arrival_time.map_or(false, |t| t as f64 <= median));
            [
                Stratum::new(format!("Arrival <= {:.0}s", median), &fast),
                Stratum::new(format!("Arrival > {:.0}s", median), &slow),
            ]
        });

        let by_cpr_group = CPR_GROUPS
            .iter()
            .map(|group| {
                let members: Vec<&CaseRow> = rows.iter().filter(|r| cpr_group(r) == *group).collect();
                Stratum::new(*group, &members)
            })
            .filter(|s| s.cases > 0)
            .collect();

        Self {
            total: rows.len(),
            age: NumericSummary::from_values(&ages),
            sex,
            telephone_cpr: Proportion::of(rows, |r| r.telephone_cpr == 1),
            bystander_cpr: Proportion::of(rows, |r| r.bystander_cpr == 1),
            responders,
            aed: Proportion::of(rows, |r| r.aed == 1),
            shockable_rhythm: Proportion::of(rows, |r| r.shockable_rhythm == 1),
            arrival_time,
            cpr_time: NumericSummary::from_values(&cpr_times),
            rosc: Proportion::of(rows, |r| r.rosc == 1),
            survival: Proportion::of(rows, |r| r.survival_7d == 1),
            cpc_distribution,
            favorable_cpc_among_survivors: Proportion::of(&survivors, |r| is_favorable(r.cpc)),
            by_telephone_cpr: [
                Stratum::new("With telephone CPR", &tcpr),
                Stratum::new("Without telephone CPR", &no_tcpr),
            ],
            by_rhythm: [
                Stratum::new("Shockable rhythm", &shockable),
                Stratum::new("Non-shockable rhythm", &non_shockable),
            ],
            by_age: [
                Stratum::new(format!("Age < {}", ELDERLY_AGE), &younger),
                Stratum::new(format!("Age >= {}", ELDERLY_AGE), &older),
            ],
            by_arrival,
            by_cpr_group,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(telephone_cpr: u8, rosc: u8, survival: u8, cpc: u8, age: Option<i64>, arrival: Option<i64>) -> CaseRow {
        CaseRow {
            id: "1".into(),
            call_date: "2023-01-01 10:00:00".into(),
            age,
            sex: "M".into(),
            telephone_cpr,
            bystander_cpr: telephone_cpr,
            responder: if telephone_cpr == 1 { "lego".into() } else { String::new() },
            aed: 0,
            shockable_rhythm: rosc,
            arrival_time: arrival,
            cpr_time: 600,
            rosc,
            survival_7d: survival,
            cpc,
        }
    }

    #[test]
    fn test_numeric_summary() {
        let summary = NumericSummary::from_values(&[4, 1, 3, 2]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.median, 2.5);
        assert_eq!((summary.min, summary.max), (1, 4));
        assert!((summary.sd.unwrap() - 1.2910).abs() < 1e-3);

        assert!(NumericSummary::from_values(&[]).is_none());
        assert_eq!(NumericSummary::from_values(&[7]).unwrap().sd, None);
    }

    #[test]
    fn test_numeric_summary_of_extreme_values() {
        let summary = NumericSummary::from_values(&[i64::MAX, i64::MAX]).unwrap();
        assert_eq!(summary.mean, i64::MAX as f64);
        assert_eq!(summary.median, i64::MAX as f64);
        assert_eq!(summary.max, i64::MAX);
    }

    #[test]
    fn test_zero_telephone_cpr_cases_yield_no_percentage() {
        let rows = vec![row(0, 1, 0, 5, Some(70), Some(400)), row(0, 0, 0, 5, Some(50), None)];
        let summary = CohortSummary::compute(&rows);
        assert_eq!(summary.by_telephone_cpr[0].cases, 0);
        assert_eq!(summary.by_telephone_cpr[0].rosc.pct(), None);
        assert_eq!(summary.by_telephone_cpr[1].rosc.pct(), Some(50.0));
        assert_eq!(summary.favorable_cpc_among_survivors.pct(), None);
    }

    #[test]
    fn test_cohort_summary_counts() {
        let rows = vec![
            row(1, 1, 1, 1, Some(60), Some(300)),
            row(1, 1, 0, 5, Some(80), Some(500)),
            row(0, 0, 0, 5, None, Some(700)),
            row(0, 1, 1, 3, Some(40), None),
        ];
        let summary = CohortSummary::compute(&rows);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.telephone_cpr, Proportion { count: 2, total: 4 });
        assert_eq!(summary.rosc.pct(), Some(75.0));
        assert_eq!(summary.survival.count, 2);
        assert_eq!(summary.favorable_cpc_among_survivors, Proportion { count: 1, total: 2 });
        assert_eq!(summary.cpc_distribution[4].cases.count, 2);

        assert_eq!(summary.by_age[0].cases, 2);
        assert_eq!(summary.by_age[1].cases, 1);
        assert_eq!(summary.arrival_time.as_ref().unwrap().median, 500.0);
        let by_arrival = summary.by_arrival.as_ref().unwrap();
        assert_eq!((by_arrival[0].cases, by_arrival[1].cases), (2, 1));

        let lay = summary
            .responders
            .iter()
            .find(|r| r.responder == Responder::Bystander)
            .unwrap();
        assert_eq!(lay.cases, Proportion { count: 2, total: 2 });
        assert_eq!(summary.by_cpr_group[0].label, "Telephone CPR");
    }

    #[test]
    fn test_empty_cohort() {
        let summary = CohortSummary::compute(&[]);
        assert!(summary.is_empty());
        assert!(summary.age.is_none());
        assert!(summary.by_arrival.is_none());
        assert!(summary.by_cpr_group.is_empty());
        assert_eq!(summary.rosc.pct(), None);
    }
}
