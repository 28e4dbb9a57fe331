use crate::pipeline::processing::filter::ExclusionStats;
use crate::pipeline::processing::merge::MergeStats;
use crate::report::summary::{CohortSummary, NumericSummary, Proportion, Stratum};
use crate::report::{format_pct, percentage};

const RULE_WIDTH: usize = 60;

fn heading(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(RULE_WIDTH));
}

fn proportion_line(label: &str, p: &Proportion) -> String {
    format!("   {:<34} {:>5}/{:<5} ({})", label, p.count, p.total, format_pct(p.pct()))
}

fn seconds_line(label: &str, summary: &Option<NumericSummary>) -> Vec<String> {
    match summary {
        None => vec![format!("   {:<34} n/a", label)],
        Some(s) => vec![
            format!(
                "   {:<34} mean {:.0}s ({:.1} min) ± {}",
                label,
                s.mean,
                s.mean / 60.0,
                s.sd.map_or("n/a".to_string(), |sd| format!("{:.0}s", sd))
            ),
            format!(
                "   {:<34} median {:.0}s, range {}-{}s, n={}",
                "", s.median, s.min, s.max, s.count
            ),
        ],
    }
}

fn strata_lines(lines: &mut Vec<String>, strata: &[Stratum]) {
    for stratum in strata {
        lines.push(format!("   {} (n={})", stratum.label, stratum.cases));
        lines.push(proportion_line("   ROSC", &stratum.rosc));
        lines.push(proportion_line("   7-day survival", &stratum.survival));
        lines.push(proportion_line("   Favorable CPC (1-2)", &stratum.favorable_cpc));
    }
}

/// Merge counters in the order they are reported
pub fn merge_lines(stats: &MergeStats) -> Vec<String> {
    let mut lines = vec![
        format!("   Raw reports: {}", stats.total_records),
        format!(
            "   Advanced / basic / other: {} / {} / {}",
            stats.advanced_records, stats.basic_records, stats.other_records
        ),
        format!(
            "   Advanced matched: {} ({}), unmatched: {}",
            stats.matched_advanced,
            format_pct(percentage(stats.matched_advanced, stats.advanced_records)),
            stats.unmatched_advanced
        ),
        format!(
            "   Basic used: {}, dropped: {}, ambiguous matches: {}",
            stats.basic_used, stats.basic_unmatched, stats.ambiguous_matches
        ),
        format!(
            "   Telephone CPR advanced / basic / after merge: {} / {} / {}",
            stats.telephone_cpr_advanced, stats.telephone_cpr_basic, stats.telephone_cpr_after_merge
        ),
    ];
    if !stats.lost_telephone_cpr_ids.is_empty() {
        lines.push(format!(
            "   Telephone CPR lost on unmatched basic reports: {}",
            stats.lost_telephone_cpr_ids.join(", ")
        ));
    }
    lines
}

pub fn exclusion_lines(stats: &ExclusionStats) -> Vec<String> {
    vec![
        format!("   Cases after merge: {}", stats.initial),
        format!(
            "   Excluded as traumatic: {} ({} with telephone CPR)",
            stats.excluded_traumatic, stats.excluded_traumatic_with_telephone_cpr
        ),
        format!(
            "   Excluded without telephone-CPR data: {}",
            stats.excluded_missing_telephone_cpr
        ),
        format!(
            "   Final cohort: {} ({} retained)",
            stats.final_cases,
            format_pct(percentage(stats.final_cases, stats.initial))
        ),
    ]
}

/// The cohort summary as plain text lines, shared by stdout and the PDF
pub fn summary_lines(summary: &CohortSummary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Total cases: {}", summary.total));
    if summary.is_empty() {
        lines.push("NO VALID CASES".to_string());
        return lines;
    }

    heading(&mut lines, "Demographics");
    match &summary.age {
        Some(age) => {
            lines.push(format!(
                "   {:<34} {:.1} ± {} years",
                "Age",
                age.mean,
                age.sd.map_or("n/a".to_string(), |sd| format!("{:.1}", sd))
            ));
            lines.push(format!(
                "   {:<34} {}-{} years, n={}",
                "Age range", age.min, age.max, age.count
            ));
        }
        None => lines.push(format!("   {:<34} n/a", "Age")),
    }
    for (sex, count) in &summary.sex {
        lines.push(proportion_line(
            &format!("Sex {}", sex),
            &Proportion {
                count: *count,
                total: summary.total,
            },
        ));
    }

    heading(&mut lines, "Pre-arrival care");
    lines.push(proportion_line("Telephone CPR", &summary.telephone_cpr));
    lines.push(proportion_line("Bystander CPR", &summary.bystander_cpr));
    for responder in &summary.responders {
        lines.push(proportion_line(
            &format!("   by {}", responder.responder),
            &responder.cases,
        ));
    }
    lines.push(proportion_line("External AED", &summary.aed));
    lines.push(proportion_line("Shockable rhythm", &summary.shockable_rhythm));

    heading(&mut lines, "Times");
    lines.extend(seconds_line("Unit arrival", &summary.arrival_time));
    lines.extend(seconds_line("Resuscitation (> 0s)", &summary.cpr_time));

    heading(&mut lines, "Outcomes");
    lines.push(proportion_line("ROSC", &summary.rosc));
    lines.push(proportion_line("7-day survival", &summary.survival));
    for entry in &summary.cpc_distribution {
        lines.push(proportion_line(
            &format!("CPC {} {}", entry.cpc, entry.description),
            &entry.cases,
        ));
    }
    lines.push(proportion_line(
        "Favorable CPC among survivors",
        &summary.favorable_cpc_among_survivors,
    ));

    heading(&mut lines, "By telephone CPR");
    strata_lines(&mut lines, &summary.by_telephone_cpr);
    heading(&mut lines, "By initial rhythm");
    strata_lines(&mut lines, &summary.by_rhythm);
    heading(&mut lines, "By age");
    strata_lines(&mut lines, &summary.by_age);
    if let Some(by_arrival) = &summary.by_arrival {
        heading(&mut lines, "By arrival time");
        strata_lines(&mut lines, by_arrival);
    }
    heading(&mut lines, "By CPR group");
    strata_lines(&mut lines, &summary.by_cpr_group);

    lines
}

/// Print the cohort summary, with merge and exclusion counters when known.
pub fn print_summary(
    summary: &CohortSummary,
    merge: Option<&MergeStats>,
    exclusions: Option<&ExclusionStats>,
) {
    println!("\n📊 Cohort summary");
    println!("{}", "=".repeat(RULE_WIDTH));
    if let Some(stats) = merge {
        println!("\n🔗 Unit merge:");
        for line in merge_lines(stats) {
            println!("{}", line);
        }
    }
    if let Some(stats) = exclusions {
        println!("\n🚫 Exclusions:");
        for line in exclusion_lines(stats) {
            println!("{}", line);
        }
    }
    println!();
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}
