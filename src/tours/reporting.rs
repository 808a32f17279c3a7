use std::collections::BTreeMap;

use serde::Serialize;
use time::UtcOffset;

use crate::tours::repo::{StartDatesSource, StatsSource};

pub const DEFAULT_MIN_RATING: f64 = 4.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyStats {
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Groups tour rows by difficulty and summarizes ratings and prices. Rows
/// are expected to already satisfy the rating cutoff (the store applies it).
/// Output is ascending by difficulty label.
pub fn difficulty_stats(rows: &[StatsSource]) -> Vec<DifficultyStats> {
    struct Acc {
        count: i64,
        ratings: i64,
        rating_sum: f64,
        price_sum: f64,
        min_price: f64,
        max_price: f64,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry(row.difficulty.as_str()).or_insert(Acc {
            count: 0,
            ratings: 0,
            rating_sum: 0.0,
            price_sum: 0.0,
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
        });
        acc.count += 1;
        acc.ratings += i64::from(row.ratings_quantity);
        acc.rating_sum += row.ratings_average;
        acc.price_sum += row.price;
        acc.min_price = acc.min_price.min(row.price);
        acc.max_price = acc.max_price.max(row.price);
    }

    groups
        .into_iter()
        .map(|(difficulty, acc)| DifficultyStats {
            difficulty: difficulty.to_string(),
            num_tours: acc.count,
            num_ratings: acc.ratings,
            avg_rating: acc.rating_sum / acc.count as f64,
            avg_price: acc.price_sum / acc.count as f64,
            min_price: acc.min_price,
            max_price: acc.max_price,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPlanEntry {
    pub month_name: &'static str,
    pub tours: Vec<String>,
    pub num_tour_starts: i64,
}

pub fn month_name(month: u8) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

fn month_order(name: &str) -> u8 {
    match name {
        "January" => 1,
        "February" => 2,
        "March" => 3,
        "April" => 4,
        "May" => 5,
        "June" => 6,
        "July" => 7,
        "August" => 8,
        "September" => 9,
        "October" => 10,
        "November" => 11,
        "December" => 12,
        _ => 13,
    }
}

/// One entry per month that has at least one tour start in `year` (UTC).
/// Each start date counts once, so a tour with three dates in one month
/// contributes three starts. The final list is re-sorted by calendar order
/// even though grouping already yields it: grouping order is not trusted.
pub fn monthly_plan(rows: &[StartDatesSource], year: i32) -> Vec<MonthlyPlanEntry> {
    let mut by_month: BTreeMap<u8, (Vec<String>, i64)> = BTreeMap::new();

    for row in rows {
        for date in &row.start_dates {
            let utc = date.to_offset(UtcOffset::UTC);
            if utc.year() != year {
                continue;
            }
            let month = u8::from(utc.month());
            if !(1..=12).contains(&month) {
                continue;
            }
            let entry = by_month.entry(month).or_default();
            entry.0.push(row.name.clone());
            entry.1 += 1;
        }
    }

    let mut plan: Vec<MonthlyPlanEntry> = by_month
        .into_iter()
        .map(|(month, (tours, starts))| MonthlyPlanEntry {
            month_name: month_name(month),
            tours,
            num_tour_starts: starts,
        })
        .collect();

    plan.sort_by_key(|entry| month_order(entry.month_name));
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn stats_row(difficulty: &str, rating: f64, quantity: i32, price: f64) -> StatsSource {
        StatsSource {
            difficulty: difficulty.to_string(),
            price,
            ratings_average: rating,
            ratings_quantity: quantity,
        }
    }

    #[test]
    fn stats_group_by_difficulty_with_price_summary() {
        // Mirrors the pre-filtered store output: only rows rating >= 4.5.
        let rows = vec![
            stats_row("easy", 4.6, 10, 100.0),
            stats_row("easy", 4.8, 30, 200.0),
        ];
        let stats = difficulty_stats(&rows);
        assert_eq!(stats.len(), 1);
        let easy = &stats[0];
        assert_eq!(easy.difficulty, "easy");
        assert_eq!(easy.num_tours, 2);
        assert_eq!(easy.num_ratings, 40);
        assert_eq!(easy.avg_price, 150.0);
        assert_eq!(easy.min_price, 100.0);
        assert_eq!(easy.max_price, 200.0);
        assert!((easy.avg_rating - 4.7).abs() < 1e-9);
    }

    #[test]
    fn stats_are_sorted_by_difficulty_label() {
        let rows = vec![
            stats_row("medium", 4.9, 1, 50.0),
            stats_row("difficult", 4.7, 1, 80.0),
            stats_row("easy", 4.6, 1, 30.0),
        ];
        let labels: Vec<_> = difficulty_stats(&rows)
            .into_iter()
            .map(|s| s.difficulty)
            .collect();
        assert_eq!(labels, vec!["difficult", "easy", "medium"]);
    }

    #[test]
    fn stats_averages_stay_within_group_bounds() {
        let rows = vec![
            stats_row("easy", 4.5, 5, 397.0),
            stats_row("easy", 4.9, 12, 1197.0),
            stats_row("medium", 4.8, 3, 497.0),
            stats_row("difficult", 4.6, 7, 2997.0),
            stats_row("difficult", 5.0, 2, 997.0),
        ];
        for group in difficulty_stats(&rows) {
            assert!(group.avg_price >= group.min_price);
            assert!(group.avg_price <= group.max_price);
            assert!(group.avg_rating >= 4.5);
            assert!(group.avg_rating <= 5.0);
        }
    }

    #[test]
    fn stats_of_no_rows_is_empty() {
        assert!(difficulty_stats(&[]).is_empty());
    }

    #[test]
    fn plan_counts_each_start_date_separately() {
        let rows = vec![StartDatesSource {
            name: "The Forest Hiker".into(),
            start_dates: vec![
                datetime!(2024-03-01 10:00 UTC),
                datetime!(2024-03-15 10:00 UTC),
                datetime!(2024-07-01 10:00 UTC),
            ],
        }];
        let plan = monthly_plan(&rows, 2024);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].month_name, "March");
        assert_eq!(plan[0].num_tour_starts, 2);
        assert_eq!(
            plan[0].tours,
            vec!["The Forest Hiker".to_string(), "The Forest Hiker".to_string()]
        );
        assert_eq!(plan[1].month_name, "July");
        assert_eq!(plan[1].num_tour_starts, 1);
    }

    #[test]
    fn plan_is_sorted_january_to_december_regardless_of_input_order() {
        let rows = vec![
            StartDatesSource {
                name: "Winter Escape".into(),
                start_dates: vec![datetime!(2024-12-20 09:00 UTC)],
            },
            StartDatesSource {
                name: "Spring Break".into(),
                start_dates: vec![datetime!(2024-04-02 09:00 UTC)],
            },
            StartDatesSource {
                name: "New Year Trek".into(),
                start_dates: vec![datetime!(2024-01-05 09:00 UTC)],
            },
        ];
        let names: Vec<_> = monthly_plan(&rows, 2024)
            .into_iter()
            .map(|e| e.month_name)
            .collect();
        assert_eq!(names, vec!["January", "April", "December"]);
    }

    #[test]
    fn plan_skips_months_with_no_starts_and_other_years() {
        let rows = vec![StartDatesSource {
            name: "The Sea Explorer".into(),
            start_dates: vec![
                datetime!(2023-06-01 08:00 UTC),
                datetime!(2024-06-01 08:00 UTC),
                datetime!(2025-06-01 08:00 UTC),
            ],
        }];
        let plan = monthly_plan(&rows, 2024);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].month_name, "June");
        assert_eq!(plan[0].num_tour_starts, 1);
    }

    #[test]
    fn plan_for_a_year_with_no_tours_is_empty() {
        let rows = vec![StartDatesSource {
            name: "The Sea Explorer".into(),
            start_dates: vec![datetime!(2023-06-01 08:00 UTC)],
        }];
        assert!(monthly_plan(&rows, 1999).is_empty());
        assert!(monthly_plan(&[], 2024).is_empty());
    }

    #[test]
    fn plan_uses_utc_for_month_boundaries() {
        // 2024-02-29 23:30 -02:00 is already March 1st in UTC.
        let rows = vec![StartDatesSource {
            name: "Boundary Tour".into(),
            start_dates: vec![datetime!(2024-02-29 23:30 -2)],
        }];
        let plan = monthly_plan(&rows, 2024);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].month_name, "March");
    }

    #[test]
    fn month_name_mapping_is_fixed_with_unknown_fallback() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(month_name(13), "Unknown");
    }
}
