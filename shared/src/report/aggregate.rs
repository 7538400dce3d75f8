//! Consolidation and breakdown computation
//!
//! Everything here is a deterministic function of its inputs. Callers pass
//! the current time in where elapsed-time math is needed so results stay
//! reproducible.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use super::{
    CategoryBreakdownRow, ConsolidatedRow, ConsolidatedTotals, CountedRowFlat, CounterAnalysisRow,
    GeneralStatistics, SessionReportTotals, SessionSummary,
};

/// Label used when a product carries no category.
pub const UNCATEGORIZED: &str = "SEM CATEGORIA";

/// Ordering for product codes: case-insensitive on the Unicode lowercase
/// form, raw comparison as tiebreak. Mixed-case codes interleave in natural
/// reading order instead of splitting into ASCII blocks.
pub fn code_ordering(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Fold flat counted-item rows into one row per distinct product code.
///
/// Keyed by product code rather than internal id so the same product is
/// merged even if it reappears under a different generated id across
/// catalog imports. Contributor lists are sets: repeat contributions by
/// the same user do not duplicate.
pub fn consolidate(rows: &[CountedRowFlat]) -> Vec<ConsolidatedRow> {
    let folded = rows.iter().fold(
        HashMap::<&str, ConsolidatedRow>::new(),
        |mut acc, row| {
            acc.entry(row.code.as_str())
                .and_modify(|entry| {
                    entry.quantity += row.quantity;
                    entry.record_count += row.record_count;
                    if !entry.contributors.contains(&row.counted_by) {
                        entry.contributors.push(row.counted_by.clone());
                    }
                    entry.last_updated_at = entry.last_updated_at.max(row.last_updated_at);
                })
                .or_insert_with(|| ConsolidatedRow {
                    code: row.code.clone(),
                    description: row.description.clone(),
                    category: row.category.clone(),
                    barcode: row.barcode.clone(),
                    unit: row.unit.clone(),
                    quantity: row.quantity,
                    record_count: row.record_count,
                    contributors: vec![row.counted_by.clone()],
                    last_updated_at: row.last_updated_at,
                });
            acc
        },
    );

    let mut report: Vec<ConsolidatedRow> = folded.into_values().collect();
    for row in &mut report {
        row.contributors.sort();
    }
    report.sort_by(|a, b| code_ordering(&a.code, &b.code));
    report
}

/// Summary totals over a consolidated report.
pub fn totals(report: &[ConsolidatedRow], session_count: usize) -> ConsolidatedTotals {
    let contributors: BTreeSet<&str> = report
        .iter()
        .flat_map(|r| r.contributors.iter().map(String::as_str))
        .collect();

    ConsolidatedTotals {
        unique_items: report.len(),
        total_units: report.iter().map(|r| r.quantity).sum(),
        total_records: report.iter().map(|r| r.record_count).sum(),
        distinct_contributors: contributors.len(),
        session_count,
    }
}

/// Group consolidated quantities by category, with each category's share of
/// the grand total. Percentages sum to 100 whenever the grand total is
/// positive; with no counted units every share is 0.
pub fn category_breakdown(report: &[ConsolidatedRow]) -> Vec<CategoryBreakdownRow> {
    let grand_total: f64 = report.iter().map(|r| r.quantity).sum();

    let folded = report
        .iter()
        .fold(HashMap::<&str, f64>::new(), |mut acc, row| {
            let category = row.category.as_deref().unwrap_or(UNCATEGORIZED);
            *acc.entry(category).or_insert(0.0) += row.quantity;
            acc
        });

    let mut breakdown: Vec<CategoryBreakdownRow> = folded
        .into_iter()
        .map(|(category, total)| CategoryBreakdownRow {
            category: category.to_string(),
            total,
            percent: if grand_total > 0.0 {
                total / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Aggregate sessions into one performance row per counter name.
///
/// `now_millis` bounds the duration of sessions that are still active.
pub fn counter_analysis(sessions: &[SessionSummary], now_millis: i64) -> Vec<CounterAnalysisRow> {
    let folded = sessions.iter().fold(
        HashMap::<&str, CounterAnalysisRow>::new(),
        |mut acc, session| {
            let minutes = crate::util::minutes_between(
                session.started_at,
                session.ended_at.unwrap_or(now_millis),
            )
            .max(0.0);

            let entry = acc
                .entry(session.user_name.as_str())
                .or_insert_with(|| CounterAnalysisRow {
                    name: session.user_name.clone(),
                    session_count: 0,
                    total_items: 0,
                    total_units: 0.0,
                    total_minutes: 0.0,
                    avg_items_per_session: 0.0,
                    avg_units_per_session: 0.0,
                    items_per_minute: 0.0,
                    units_per_minute: 0.0,
                });
            entry.session_count += 1;
            entry.total_items += session.total_items;
            entry.total_units += session.total_units;
            entry.total_minutes += minutes;
            acc
        },
    );

    let mut analysis: Vec<CounterAnalysisRow> = folded
        .into_values()
        .map(|mut row| {
            let sessions = row.session_count as f64;
            row.avg_items_per_session = row.total_items as f64 / sessions;
            row.avg_units_per_session = row.total_units / sessions;
            if row.total_minutes > 0.0 {
                row.items_per_minute = row.total_items as f64 / row.total_minutes;
                row.units_per_minute = row.total_units / row.total_minutes;
            }
            row
        })
        .collect();

    analysis.sort_by(|a, b| {
        b.total_units
            .partial_cmp(&a.total_units)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    analysis
}

/// Store-wide statistics over every counted-item row and session.
pub fn general_statistics(
    item_rows: &[CountedRowFlat],
    sessions: &[SessionSummary],
) -> GeneralStatistics {
    let total_units: f64 = item_rows.iter().map(|r| r.quantity).sum();
    let counters: BTreeSet<&str> = sessions.iter().map(|s| s.user_name.as_str()).collect();

    let total_sessions = sessions.len();
    let total_counters = counters.len();

    GeneralStatistics {
        total_sessions,
        total_items: item_rows.len(),
        total_units,
        total_counters,
        avg_units_per_session: if total_sessions > 0 {
            total_units / total_sessions as f64
        } else {
            0.0
        },
        avg_items_per_counter: if total_counters > 0 {
            item_rows.len() as f64 / total_counters as f64
        } else {
            0.0
        },
    }
}

/// Order a single session's rows for its report and compute the totals
/// block. Within one session each product appears at most once, so no
/// merging is needed here.
pub fn session_report(mut rows: Vec<CountedRowFlat>) -> (Vec<CountedRowFlat>, SessionReportTotals) {
    rows.sort_by(|a, b| code_ordering(&a.code, &b.code));
    let totals = SessionReportTotals {
        total_items: rows.len(),
        total_units: rows.iter().map(|r| r.quantity).sum(),
        total_records: rows.iter().map(|r| r.record_count).sum(),
    };
    (rows, totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, qty: f64, user: &str) -> CountedRowFlat {
        CountedRowFlat {
            code: code.to_string(),
            description: format!("Produto {code}"),
            category: Some("Fertilizantes".to_string()),
            barcode: None,
            unit: "UN".to_string(),
            quantity: qty,
            record_count: 1,
            counted_by: user.to_string(),
            last_updated_at: 1_000,
        }
    }

    #[test]
    fn consolidates_by_code_and_unions_contributors() {
        let rows = vec![row("A", 3.0, "X"), row("A", 2.0, "Y"), row("B", 5.0, "X")];
        let report = consolidate(&rows);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].code, "A");
        assert_eq!(report[0].quantity, 5.0);
        assert_eq!(report[0].contributors, vec!["X", "Y"]);
        assert_eq!(report[1].code, "B");
        assert_eq!(report[1].quantity, 5.0);
        assert_eq!(report[1].contributors, vec!["X"]);
    }

    #[test]
    fn repeat_contributions_by_same_user_do_not_duplicate() {
        let rows = vec![row("A", 1.0, "X"), row("A", 1.0, "X")];
        let report = consolidate(&rows);
        assert_eq!(report[0].contributors, vec!["X"]);
        assert_eq!(report[0].record_count, 2);
    }

    #[test]
    fn consolidation_is_deterministic() {
        let rows = vec![
            row("C10", 1.5, "Ana"),
            row("a2", 2.0, "Rui"),
            row("C10", 4.0, "Rui"),
            row("B7", 3.0, "Ana"),
        ];
        assert_eq!(consolidate(&rows), consolidate(&rows));
    }

    #[test]
    fn codes_sort_case_insensitively() {
        let rows = vec![row("b2", 1.0, "X"), row("A10", 1.0, "X"), row("B1", 1.0, "X")];
        let report = consolidate(&rows);
        let codes: Vec<&str> = report.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A10", "B1", "b2"]);
    }

    #[test]
    fn keeps_latest_update_timestamp() {
        let mut first = row("A", 1.0, "X");
        first.last_updated_at = 500;
        let mut second = row("A", 1.0, "Y");
        second.last_updated_at = 900;
        let report = consolidate(&[first, second]);
        assert_eq!(report[0].last_updated_at, 900);
    }

    #[test]
    fn totals_deduplicate_contributors_across_rows() {
        let rows = vec![row("A", 3.0, "X"), row("A", 2.0, "Y"), row("B", 5.0, "X")];
        let report = consolidate(&rows);
        let t = totals(&report, 3);

        assert_eq!(t.unique_items, 2);
        assert_eq!(t.total_units, 10.0);
        assert_eq!(t.total_records, 3);
        assert_eq!(t.distinct_contributors, 2);
        assert_eq!(t.session_count, 3);
    }

    #[test]
    fn category_percentages_sum_to_one_hundred() {
        let mut seeds = vec![row("A", 30.0, "X"), row("B", 50.0, "X"), row("C", 20.0, "X")];
        seeds[1].category = Some("Sementes".to_string());
        seeds[2].category = None;
        let breakdown = category_breakdown(&consolidate(&seeds));

        let sum: f64 = breakdown.iter().map(|c| c.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        // Sorted by total descending
        assert_eq!(breakdown[0].category, "Sementes");
        assert_eq!(breakdown[0].percent, 50.0);
        assert_eq!(breakdown[2].category, UNCATEGORIZED);
    }

    #[test]
    fn category_breakdown_of_empty_report_has_no_rows() {
        assert!(category_breakdown(&[]).is_empty());
    }

    fn session(user: &str, items: i64, units: f64, start: i64, end: Option<i64>) -> SessionSummary {
        SessionSummary {
            user_name: user.to_string(),
            total_items: items,
            total_units: units,
            started_at: start,
            ended_at: end,
        }
    }

    #[test]
    fn counter_analysis_aggregates_per_name() {
        let sessions = vec![
            session("Ana", 10, 40.0, 0, Some(600_000)),    // 10 min
            session("Ana", 20, 60.0, 0, Some(1_200_000)),  // 20 min
            session("Rui", 5, 30.0, 0, None),              // active, bounded by now
        ];
        let analysis = counter_analysis(&sessions, 600_000);

        assert_eq!(analysis.len(), 2);
        let ana = &analysis[0];
        assert_eq!(ana.name, "Ana");
        assert_eq!(ana.session_count, 2);
        assert_eq!(ana.total_items, 30);
        assert_eq!(ana.total_minutes, 30.0);
        assert_eq!(ana.avg_items_per_session, 15.0);
        assert_eq!(ana.avg_units_per_session, 50.0);
        assert_eq!(ana.items_per_minute, 1.0);

        let rui = &analysis[1];
        assert_eq!(rui.total_minutes, 10.0);
        assert_eq!(rui.units_per_minute, 3.0);
    }

    #[test]
    fn general_statistics_guard_empty_inputs() {
        let stats = general_statistics(&[], &[]);
        assert_eq!(stats.avg_units_per_session, 0.0);
        assert_eq!(stats.avg_items_per_counter, 0.0);
    }

    #[test]
    fn session_report_sorts_and_totals() {
        let rows = vec![row("B", 2.5, "X"), row("a", 1.0, "X")];
        let (sorted, totals) = session_report(rows);
        assert_eq!(sorted[0].code, "a");
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total_units, 3.5);
        assert_eq!(totals.total_records, 2);
    }
}
