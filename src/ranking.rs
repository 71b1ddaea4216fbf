use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::error::RankingError;
use crate::models::{AggregatedGroup, Goal, Measure, RankedResult, Record};

/// Ranks schools for `year` by the goal named `goal`, optionally restricted to
/// one position. The goal is validated before any record is looked at.
pub fn rank(
    dataset: &Dataset,
    year: i32,
    goal: &str,
    position: Option<&str>,
) -> Result<RankedResult, RankingError> {
    let goal: Goal = goal.parse()?;
    Ok(rank_goal(dataset, year, goal, position))
}

pub fn rank_goal(
    dataset: &Dataset,
    year: i32,
    goal: Goal,
    position: Option<&str>,
) -> RankedResult {
    let position = position.filter(|position| !position.is_empty());
    let matching: Vec<&Record> = dataset
        .records()
        .iter()
        .filter(|record| record.year == year)
        .filter(|record| position.map_or(true, |pos| record.position.as_deref() == Some(pos)))
        .collect();

    let mut groups = aggregate(matching.iter().copied());
    tracing::debug!(
        year,
        goal = %goal,
        position = position.unwrap_or("all"),
        matched = matching.len(),
        groups = groups.len(),
        "aggregated schools"
    );

    let measure = goal.measure();
    groups.sort_by(|a, b| descending(a.measure(measure), b.measure(measure)));

    let mut ranked = groups.into_iter();
    let result = RankedResult::new(std::array::from_fn(|_| {
        ranked.next().unwrap_or_else(AggregatedGroup::placeholder)
    }));

    tracing::info!(
        year,
        goal = %goal,
        schools = result.schools().count(),
        "ranked schools"
    );
    result
}

#[derive(Default)]
struct Totals {
    salary_sum: f64,
    salary_count: usize,
    cav_sum: f64,
    cav_count: usize,
    pick_sum: f64,
}

/// `None` when nothing was counted, or when `inf` and `-inf` cancel into NaN.
fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0)
        .then(|| sum / count as f64)
        .filter(|value| !value.is_nan())
}

/// Groups records by school, ordered by school name. Records without a school
/// are left out.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<AggregatedGroup> {
    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();

    for record in records {
        let Some(school) = record.school.as_deref() else {
            continue;
        };
        let entry = totals.entry(school).or_default();

        if let Some(salary) = record.cell(Measure::Salary).as_number() {
            entry.salary_sum += salary;
            entry.salary_count += 1;
        }
        if let Some(cav) = record.cell(Measure::Cav).as_number() {
            entry.cav_sum += cav;
            entry.cav_count += 1;
        }
        entry.pick_sum += record.cell(Measure::Pick).as_number().unwrap_or(0.0);
    }

    totals
        .into_iter()
        .map(|(school, totals)| AggregatedGroup {
            school: school.to_string(),
            salary: mean(totals.salary_sum, totals.salary_count),
            cav: mean(totals.cav_sum, totals.cav_count),
            pick: totals.pick_sum,
            placeholder: false,
        })
        .collect()
}

/// Larger values first; undefined and NaN values after every defined one.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    let defined = |value: Option<f64>| value.filter(|v| !v.is_nan());
    match (defined(a), defined(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, PLACEHOLDER_SCHOOL, TOP_N};

    fn record(year: i32, school: &str, position: &str, salary: f64, cav: f64, pick: f64) -> Record {
        Record {
            year,
            school: Some(school.to_string()),
            position: Some(position.to_string()),
            salary: Cell::Number(salary),
            cav: Cell::Number(cav),
            pick: Cell::Number(pick),
        }
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            record(2020, "LSU", "QB", 9_000_000.0, 45.0, 1.0),
            record(2020, "LSU", "WR", 3_000_000.0, 20.0, 22.0),
            record(2020, "Alabama", "QB", 7_500_000.0, 30.0, 5.0),
            record(2020, "Alabama", "OL", 5_500_000.0, 28.0, 10.0),
            record(2020, "Ohio St.", "DE", 8_500_000.0, 21.0, 2.0),
            record(2020, "Georgia", "RB", 1_000_000.0, 12.0, 60.0),
            record(2020, "Clemson", "WR", 4_000_000.0, 18.0, 30.0),
            record(2019, "Oklahoma", "QB", 8_100_000.0, 52.0, 1.0),
            record(2019, "Ohio St.", "DE", 8_000_000.0, 40.0, 2.0),
        ])
    }

    fn schools(result: &RankedResult) -> Vec<&str> {
        result.iter().map(|entry| entry.school.as_str()).collect()
    }

    #[test]
    fn top_three_by_mean_salary() {
        let result = rank(&sample(), 2020, "Max Salary", None).unwrap();
        assert_eq!(schools(&result), vec!["Ohio St.", "Alabama", "LSU"]);
        assert_eq!(result.entries()[1].salary, Some(6_500_000.0));
        assert_eq!(result.entries()[2].salary, Some(6_000_000.0));
    }

    #[test]
    fn single_match_is_padded_with_placeholders() {
        let result = rank(&sample(), 2019, "Best CAV", Some("QB")).unwrap();
        let entries = result.entries();
        assert_eq!(entries[0].school, "Oklahoma");
        assert_eq!(entries[0].cav, Some(52.0));
        assert_eq!(entries[1], AggregatedGroup::placeholder());
        assert_eq!(entries[2], AggregatedGroup::placeholder());
    }

    #[test]
    fn unknown_goal_fails_before_filtering() {
        let err = rank(&sample(), 2020, "Unknown", None).unwrap_err();
        assert!(matches!(err, RankingError::InvalidGoal(goal) if goal == "Unknown"));
    }

    #[test]
    fn all_text_salaries_give_an_undefined_mean() {
        let mut dataset = Dataset::from_records(vec![
            Record {
                salary: Cell::Text("TBD".to_string()),
                ..record(2021, "Miami", "QB", 0.0, 10.0, 4.0)
            },
            Record {
                salary: Cell::Text("unsigned".to_string()),
                ..record(2021, "Miami", "QB", 0.0, 14.0, 9.0)
            },
        ]);
        dataset.coerce_numeric(&Measure::ALL);

        let result = rank(&dataset, 2021, "Max Salary", None).unwrap();
        let miami = &result.entries()[0];
        assert_eq!(miami.school, "Miami");
        assert_eq!(miami.salary, None);
        assert_eq!(miami.cav, Some(12.0));
        assert_eq!(miami.pick, 13.0);
    }

    #[test]
    fn no_matches_yields_three_placeholders() {
        let result = rank(&sample(), 1999, "Most Picks", None).unwrap();
        assert!(result.iter().all(|entry| entry.placeholder));
        assert!(result.iter().all(|entry| entry.school == PLACEHOLDER_SCHOOL
            && entry.salary == Some(0.0)
            && entry.cav == Some(0.0)
            && entry.pick == 0.0));
    }

    #[test]
    fn result_length_is_fixed_for_every_request() {
        let dataset = sample();
        for goal in Goal::ALL {
            for year in [2018, 2019, 2020] {
                for position in [None, Some("QB"), Some("WR"), Some("K")] {
                    let result = rank_goal(&dataset, year, goal, position);
                    assert_eq!(result.iter().count(), TOP_N);
                }
            }
        }
    }

    #[test]
    fn ranking_is_monotonic_for_every_goal() {
        let dataset = sample();
        for goal in Goal::ALL {
            let result = rank_goal(&dataset, 2020, goal, None);
            let values: Vec<f64> = result
                .schools()
                .filter_map(|entry| entry.measure(goal.measure()))
                .collect();
            assert!(values.windows(2).all(|pair| pair[0] >= pair[1]), "{goal}: {values:?}");
        }
    }

    #[test]
    fn position_filter_is_exact_and_case_sensitive() {
        let dataset = sample();
        let result = rank(&dataset, 2020, "Most Picks", Some("WR")).unwrap();
        assert_eq!(schools(&result), vec!["Clemson", "LSU", PLACEHOLDER_SCHOOL]);
        assert_eq!(result.entries()[1].pick, 22.0);

        let lower = rank(&dataset, 2020, "Most Picks", Some("wr")).unwrap();
        assert!(lower.iter().all(|entry| entry.placeholder));
    }

    #[test]
    fn empty_position_applies_no_filter() {
        let dataset = sample();
        assert_eq!(
            rank(&dataset, 2020, "Best CAV", Some("")).unwrap(),
            rank(&dataset, 2020, "Best CAV", None).unwrap()
        );
    }

    #[test]
    fn results_only_contain_schools_matching_the_filter() {
        let dataset = sample();
        let result = rank(&dataset, 2019, "Max Salary", None).unwrap();
        for entry in result.schools() {
            assert!(dataset
                .records()
                .iter()
                .any(|r| r.year == 2019 && r.school.as_deref() == Some(entry.school.as_str())));
        }
        assert_eq!(schools(&result), vec!["Oklahoma", "Ohio St.", PLACEHOLDER_SCHOOL]);
    }

    #[test]
    fn ties_keep_school_name_order() {
        let dataset = Dataset::from_records(vec![
            record(2022, "Texas", "QB", 1.0, 5.0, 3.0),
            record(2022, "Auburn", "QB", 1.0, 5.0, 3.0),
            record(2022, "Miami", "QB", 1.0, 5.0, 3.0),
            record(2022, "Baylor", "QB", 1.0, 5.0, 3.0),
        ]);
        let result = rank(&dataset, 2022, "Best CAV", None).unwrap();
        assert_eq!(schools(&result), vec!["Auburn", "Baylor", "Miami"]);
    }

    #[test]
    fn undefined_means_rank_below_zero() {
        let dataset = Dataset::from_records(vec![
            Record {
                cav: Cell::Missing,
                ..record(2023, "Army", "LB", 1.0, 0.0, 1.0)
            },
            record(2023, "Navy", "LB", 1.0, 0.0, 1.0),
            record(2023, "Utah", "LB", 1.0, 3.0, 1.0),
        ]);
        let result = rank(&dataset, 2023, "Best CAV", None).unwrap();
        assert_eq!(schools(&result), vec!["Utah", "Navy", "Army"]);
        assert_eq!(result.entries()[2].cav, None);
    }

    #[test]
    fn cancelling_infinities_do_not_break_the_order() {
        let dataset = Dataset::from_records(vec![
            record(2020, "Army", "QB", 5.0, 1.0, 1.0),
            record(2020, "Baylor", "QB", f64::INFINITY, 1.0, f64::INFINITY),
            record(2020, "Baylor", "QB", f64::NEG_INFINITY, 1.0, f64::NEG_INFINITY),
            record(2020, "Clemson", "QB", 9.0, 1.0, 2.0),
            record(2020, "Duke", "QB", 7.0, 1.0, 3.0),
        ]);

        let salary = rank(&dataset, 2020, "Max Salary", None).unwrap();
        assert_eq!(schools(&salary), vec!["Clemson", "Duke", "Army"]);

        let picks = rank(&dataset, 2020, "Most Picks", None).unwrap();
        assert_eq!(schools(&picks), vec!["Duke", "Clemson", "Army"]);
    }

    #[test]
    fn nan_mean_is_undefined() {
        let records = vec![
            record(2020, "Baylor", "QB", f64::INFINITY, 1.0, 0.0),
            record(2020, "Baylor", "QB", f64::NEG_INFINITY, 1.0, 0.0),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups[0].salary, None);
        assert_eq!(groups[0].cav, Some(1.0));
    }

    #[test]
    fn pick_sum_counts_missing_as_zero() {
        let records = vec![
            Record {
                pick: Cell::Missing,
                ..record(2020, "Iowa", "OL", 1.0, 1.0, 0.0)
            },
            record(2020, "Iowa", "OL", 1.0, 1.0, 13.0),
            Record {
                pick: Cell::Missing,
                ..record(2020, "Duke", "OL", 1.0, 1.0, 0.0)
            },
        ];
        let groups = aggregate(&records);
        assert_eq!(groups[0].school, "Duke");
        assert_eq!(groups[0].pick, 0.0);
        assert_eq!(groups[1].pick, 13.0);
    }

    #[test]
    fn records_without_a_school_form_no_group() {
        let records = vec![
            Record {
                school: None,
                ..record(2020, "", "QB", 1.0, 1.0, 1.0)
            },
            record(2020, "Utah", "QB", 1.0, 1.0, 1.0),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].school, "Utah");
    }
}
