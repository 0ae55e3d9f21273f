use chrono::{NaiveDate, TimeZone, Utc};
use coachrs::models::{RawSample, SessionSummary, WorkoutTable};
use coachrs::{analyze_workout, compare, compare_tables, import, pmc, trends};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Integration tests that run complete workflows from files to reports

#[cfg(test)]
mod integration_tests {
    use super::*;
    use coachrs::classifier::{ActivityKind, SwimWorkoutType};
    use coachrs::config::AppConfig;
    use coachrs::economy::EconomyRating;
    use coachrs::review::{WorkoutFacts, WorkoutReviewer};
    use coachrs::running::{RunGrade, RunningAnalyzer};
    use coachrs::swimming::Grade;
    use coachrs::trends::{Direction, TrackedQuantity, TrendBucket};
    use coachrs::ImportManager;

    /// Steady 1.0 m/s swim with four 20-sample surges at 1.2 m/s
    fn swim_csv(distance_m: f64, start: &str) -> String {
        let mut csv = String::from(
            "timestamp,enhanced_speed,cadence,session_sport,session_total_distance,session_total_elapsed_time,session_start_time\n",
        );
        for i in 0..1000 {
            let in_surge = [100, 300, 500, 700]
                .iter()
                .any(|&s| (s..s + 20).contains(&i));
            let speed = if in_surge { 1.2 } else { 1.0 };
            csv.push_str(&format!(
                "{},{},30,swimming,{},1900,{}\n",
                i, speed, distance_m, start
            ));
        }
        csv
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reference_swim_from_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "swim.csv", &swim_csv(2000.0, "2024-03-01T07:00:00Z"));

        let table = ImportManager::new().import_workout(&path).unwrap();
        let analysis = analyze_workout(&table);

        assert_eq!(analysis.sub_scores.distance_endurance, 25);
        assert_eq!(analysis.sub_scores.pace_consistency, 20);
        assert_eq!(analysis.sub_scores.stroke_stability, 25);
        assert_eq!(analysis.sub_scores.speed_gears, 20);
        assert_eq!(analysis.total_score, 90);
        assert_eq!(analysis.grade, Grade::A);
        assert_eq!(analysis.workout_type, SwimWorkoutType::Threshold);
        assert_eq!(analysis.metrics.speed_gear_count, 4);
        assert_eq!(analysis.metrics.stop_percentage, Some(0.0));
        assert_eq!(analysis.pros.len(), 3);
        assert_eq!(analysis.cons.len(), 3);

        // the JSON report never carries NaN
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn test_run_heart_rate_drift() {
        let samples: Vec<RawSample> = (0..100)
            .map(|i| RawSample {
                timestamp: Some(i as f64),
                speed: Some(3.0),
                heart_rate: Some(match i {
                    0..=24 => 140.0,
                    75..=99 => 160.0,
                    _ => 150.0,
                }),
                cadence: Some(170.0),
                ..RawSample::default()
            })
            .collect();
        let session = SessionSummary {
            sport: Some("running".to_string()),
            total_distance_m: Some(10_000.0),
            total_elapsed_time_s: Some(3333.0),
            ..SessionSummary::default()
        };
        let table = WorkoutTable::new(samples, session);

        let report = RunningAnalyzer::runner_report(&table);
        let hr = report.metrics.heart_rate.as_ref().unwrap();

        assert_eq!(hr.drift, Some(20.0));
        assert!((hr.drift_pct.unwrap() - 14.2857).abs() < 1e-3);
        assert_eq!(report.activity_kind, ActivityKind::Running);
        assert_eq!(report.distance_km, Some(10.0));
        // drift too high for points, steady cadence earns three
        assert_eq!(report.execution_score, RunGrade::B);
        assert_eq!(report.intervals.as_ref().map(Vec::len), Some(8));
        // constant speed leaves nothing to fit
        assert!(report.economy.is_none());
    }

    #[test]
    fn test_run_csv_report_and_review() {
        let mut csv = String::from(
            "timestamp,speed,heart_rate,cadence,step_length,session_sport,session_total_distance,session_total_elapsed_time,session_total_ascent,session_total_calories,session_start_time\n",
        );
        for i in 0..80 {
            let speed = 2.5 + (i % 20) as f64 * 0.05;
            let step = if i % 2 == 0 { 1000 } else { 1200 };
            csv.push_str(&format!(
                "{},{},{},172,{},running,10000,3000,250,700,2024-05-04T07:00:00Z\n",
                i,
                speed,
                100.0 + 10.0 * speed,
                step
            ));
        }
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "run.csv", &csv);
        let table = ImportManager::new().import_workout(&path).unwrap();

        let report = RunningAnalyzer::runner_report(&table);
        assert!((report.metrics.avg_step_length.unwrap() - 1100.0).abs() < 1e-9);
        assert_eq!(report.intervals.as_ref().map(Vec::len), Some(8));
        let economy = report.economy.as_ref().unwrap();
        assert!((economy.speed_slope - 10.0).abs() < 1e-6);
        assert_eq!(economy.rating, EconomyRating::Good);

        let facts = WorkoutFacts::from_table(&table);
        assert_eq!(facts.date, NaiveDate::from_ymd_opt(2024, 5, 4));
        let review = WorkoutReviewer::new(None).unwrap().review(&facts);
        assert_eq!(review.summary, "Running • 10.00km • 50m • avg pace 5:00/km");
        assert!(review.highlights.contains(&"700 calories burned".to_string()));
        assert!(review
            .suggestions
            .contains(&"Include flat runs to work on speed and efficiency".to_string()));
    }

    #[test]
    fn test_pmc_from_activity_export() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "activities.json",
            r#"[{"id": 1, "start_date": "2024-06-20T06:00:00Z", "sport_type": "Run",
                 "moving_time": 3600, "average_heartrate": 150, "max_heartrate": 200}]"#,
        );
        let activities = ImportManager::new().import_activities(&path).unwrap();

        let calculator = pmc::PmcCalculator::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let series = calculator
            .calculate_pmc(&activities, 30, today, pmc::SportFilter::All)
            .unwrap();

        assert_eq!(series.len(), 31);
        let day = series
            .iter()
            .find(|p| p.date == NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
            .unwrap();
        assert_eq!(day.tss, dec!(60.0625));
        assert_eq!(day.workout_count, 1);
        assert_eq!(day.ctl, dec!(60.0625));
        assert_eq!(day.atl, dec!(60.0625));
        assert_eq!(day.tsb, Decimal::ZERO);

        // filtering the only activity away leaves an all-zero chart
        let swims = calculator
            .calculate_pmc(&activities, 30, today, pmc::SportFilter::Swim)
            .unwrap();
        assert!(swims
            .iter()
            .all(|p| p.tss.is_zero() && p.ctl.is_zero() && p.atl.is_zero() && p.tsb.is_zero()));
    }

    #[test]
    fn test_compare_edge_cases() {
        assert_eq!(compare(&[]).unwrap_err(), trends::TrendError::NoWorkouts);

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "swim.csv", &swim_csv(2000.0, "2024-03-01T07:00:00Z"));
        let table = import::csv::read_workout_table(&path).unwrap();

        let report = compare(&[analyze_workout(&table)]).unwrap();
        assert!(report.trends.is_empty());
        assert_eq!(report.time_series.scores, vec![90.0]);
        assert_eq!(report.summary.total_workouts, 1);
    }

    #[test]
    fn test_compare_sorts_by_date_and_tracks_distance() {
        let dir = TempDir::new().unwrap();
        let later = write_file(&dir, "later.csv", &swim_csv(2000.0, "2024-03-08T07:00:00Z"));
        let earlier = write_file(&dir, "earlier.csv", &swim_csv(500.0, "2024-03-01T07:00:00Z"));

        let tables: Vec<WorkoutTable> = ImportManager::new()
            .import_workouts(&[later, earlier])
            .unwrap()
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        let report = compare_tables(&tables).unwrap();

        assert_eq!(report.workouts.len(), 2);
        assert_eq!(report.workouts[0].metrics.distance_m, 500.0);
        assert_eq!(
            report.workouts[0].metadata.date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap())
        );

        let distance = report.trends[&TrackedQuantity::Distance];
        assert_eq!(distance.trend, TrendBucket::Up);
        assert_eq!(distance.direction, Direction::Improving);
        assert!((distance.change_pct - 300.0).abs() < 1e-9);
        assert_eq!(report.summary.total_distance, 2500.0);
    }

    #[test]
    fn test_config_time_constants_reach_calculator() {
        let mut config = AppConfig::default();
        config.set_value("pmc.atl_time_constant", "3").unwrap();

        let calculator = pmc::PmcCalculator::with_config(config.pmc.clone()).unwrap();
        assert_eq!(calculator.config().atl_time_constant, 3);

        assert!(config.set_value("pmc.ctl_time_constant", "0").is_ok());
        assert!(pmc::PmcCalculator::with_config(config.pmc).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use coachrs::stats::{coefficient_of_variation, UNSTABLE_CV};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_cv_is_never_negative(values in proptest::collection::vec(-10.0f64..10.0, 0..200)) {
            let cv = coefficient_of_variation(&values);
            prop_assert!(cv >= 0.0);
            if values.iter().all(|v| *v <= 0.0) {
                prop_assert_eq!(cv, UNSTABLE_CV);
            }
        }

        #[test]
        fn prop_swim_scores_stay_in_range(
            speeds in proptest::collection::vec(proptest::option::of(0.0f64..3.0), 0..300),
            cadence in proptest::collection::vec(proptest::option::of(0.0f64..120.0), 0..300),
            distance in proptest::option::of(0.0f64..5000.0),
        ) {
            let len = speeds.len().max(cadence.len());
            let samples: Vec<RawSample> = (0..len)
                .map(|i| RawSample {
                    speed: speeds.get(i).copied().flatten(),
                    cadence: cadence.get(i).copied().flatten(),
                    ..RawSample::default()
                })
                .collect();
            let session = SessionSummary {
                total_distance_m: distance,
                ..SessionSummary::default()
            };
            let analysis = analyze_workout(&WorkoutTable::new(samples, session));

            for (_, score) in analysis.sub_scores.iter() {
                prop_assert!(score <= 25);
            }
            prop_assert_eq!(analysis.total_score, analysis.sub_scores.total());
            prop_assert_eq!(analysis.pros.len(), 3);
            prop_assert_eq!(analysis.cons.len(), 3);
        }

        #[test]
        fn prop_tsb_is_ctl_minus_atl(
            loads in proptest::collection::vec((0u32..60, 0u32..10_800), 0..30),
        ) {
            let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
            let activities: Vec<coachrs::models::ActivitySummary> = loads
                .iter()
                .map(|(offset, secs)| coachrs::models::ActivitySummary {
                    id: None,
                    start_date: today - chrono::Duration::days(i64::from(*offset)),
                    sport_type: Some("Ride".to_string()),
                    activity_type: None,
                    distance_m: None,
                    moving_time_s: Some(*secs),
                    elapsed_time_s: None,
                    average_heartrate: None,
                    max_heartrate: None,
                    total_elevation_gain: None,
                })
                .collect();

            let series = pmc::PmcCalculator::new()
                .calculate_pmc(&activities, 60, today, pmc::SportFilter::All)
                .unwrap();

            prop_assert_eq!(series.len(), 61);
            for point in &series {
                prop_assert_eq!(point.tsb, point.ctl - point.atl);
                prop_assert!(point.ctl >= Decimal::ZERO && point.atl >= Decimal::ZERO);
            }
        }
    }
}
