use crate::export::{format_run_pace, format_swim_pace, format_time};
use crate::pmc::{PmcPoint, TsbInterpretation};
use crate::review::TrainingReview;
use crate::running::{LongRunAnalysis, RunnerReport, RunningBlockAnalysis};
use crate::swimming::WorkoutAnalysis;
use crate::trends::ComparisonReport;
use chrono::{DateTime, Utc};
use std::io::{self, Write};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Human-readable rendering of a report
pub trait TextReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

fn heading(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", RULE)
}

fn section(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", THIN_RULE)
}

fn date_label(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

fn optional(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", decimals, v, unit),
        None => "N/A".to_string(),
    }
}

impl TextReport for WorkoutAnalysis {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "SWIM WORKOUT ANALYSIS")?;
        writeln!(out, "Date: {}", date_label(self.metadata.date))?;
        writeln!(
            out,
            "Distance: {:.0} m   Time: {}   Pace: {}",
            self.metrics.distance_m,
            format_time(self.metrics.total_time_s),
            format_swim_pace(self.metrics.avg_speed_ms)
        )?;
        if let Some(pool) = self.metadata.pool_length_m {
            writeln!(out, "Pool: {:.0} m", pool)?;
        }
        writeln!(out, "Workout type: {}", self.workout_type)?;
        writeln!(out, "Score: {}/100 (Grade {})", self.total_score, self.grade)?;
        writeln!(out, "{}", self.verdict)?;

        section(out, "SUB-SCORES")?;
        for (category, score) in self.sub_scores.iter() {
            writeln!(out, "  {:<24} {:>2}/25", category.label(), score)?;
        }

        section(out, "KEY METRICS")?;
        writeln!(out, "  Speed CV:          {}", optional(self.metrics.speed_cv, 1, "%"))?;
        writeln!(out, "  Stops:             {}", optional(self.metrics.stop_percentage, 1, "%"))?;
        writeln!(out, "  Stroke rate:       {:.1} spm", self.metrics.avg_stroke_rate)?;
        writeln!(out, "  Stroke rate CV:    {}", optional(self.metrics.stroke_rate_cv, 1, "%"))?;
        writeln!(out, "  Stroke rate drop:  {}", optional(self.metrics.stroke_rate_drop, 1, " spm"))?;
        writeln!(out, "  Speed gears:       {}", self.metrics.speed_gear_count)?;

        section(out, "STRENGTHS")?;
        for pro in &self.pros {
            writeln!(out, "  + {}", pro)?;
        }
        section(out, "TO IMPROVE")?;
        for con in &self.cons {
            writeln!(out, "  - {}", con)?;
        }

        section(out, "NEXT WORKOUT")?;
        writeln!(out, "  Main set:  {}", self.prescription.main_set)?;
        writeln!(out, "  Key focus: {}", self.prescription.key_focus)?;
        writeln!(out, "  Drills:    {}", self.prescription.drill_set)
    }
}

impl TextReport for ComparisonReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "SWIM PROGRESS REPORT")?;
        let summary = &self.summary;
        writeln!(out, "Workouts: {}", summary.total_workouts)?;
        writeln!(out, "Total distance: {:.0} m", summary.total_distance)?;
        writeln!(out, "Average score: {:.1}", summary.average_score)?;
        writeln!(out, "Most common grade: {}", summary.most_common_grade)?;
        let distribution: Vec<String> = summary
            .grade_distribution
            .iter()
            .map(|(grade, count)| format!("{}: {}", grade, count))
            .collect();
        writeln!(out, "Grades: {}", distribution.join(", "))?;
        writeln!(out, "Overall trend: {}", summary.overall_trend)?;

        section(out, "WORKOUTS")?;
        for workout in &self.workouts {
            writeln!(
                out,
                "  {}  {:>6.0} m  {:>3}/100  {}  {}",
                date_label(workout.metadata.date),
                workout.metrics.distance_m,
                workout.total_score,
                workout.grade,
                workout.workout_type
            )?;
        }

        if !self.trends.is_empty() {
            section(out, "TRENDS (first half vs second half)")?;
            for (quantity, record) in &self.trends {
                writeln!(
                    out,
                    "  {:<34} {:>7.1}%  {:<6} avg {:.2}",
                    quantity.to_string(),
                    record.change_pct,
                    record.trend.to_string(),
                    record.average
                )?;
            }
        }

        if !self.insights.is_empty() {
            section(out, "INSIGHTS")?;
            for insight in &self.insights {
                writeln!(out, "  {}: {}", insight.title, insight.message)?;
                writeln!(out, "    {}", insight.reasoning)?;
            }
        }

        let sw = &self.strengths_weaknesses;
        if !sw.strengths.is_empty() || !sw.weaknesses.is_empty() {
            section(out, "STRENGTHS AND WEAKNESSES")?;
            for area in &sw.strengths {
                writeln!(out, "  + {} ({:.1}/25): {}", area.area, area.score, area.reasoning)?;
            }
            for area in &sw.weaknesses {
                writeln!(out, "  - {} ({:.1}/25): {}", area.area, area.score, area.reasoning)?;
            }
        }

        if !self.recommendations.is_empty() {
            section(out, "RECOMMENDATIONS")?;
            for rec in &self.recommendations {
                writeln!(out, "  [{}] {}: {}", rec.priority, rec.focus, rec.recommendation)?;
                writeln!(out, "    {} ({})", rec.reasoning, rec.frequency)?;
            }
        }
        Ok(())
    }
}

impl TextReport for RunnerReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "RUN REPORT")?;
        writeln!(out, "Date: {}", date_label(self.start_time))?;
        writeln!(out, "Activity: {}", self.activity_kind)?;
        writeln!(out, "Distance: {}", optional(self.distance_km, 2, " km"))?;
        writeln!(
            out,
            "Duration: {}",
            self.duration_s.map(format_time).unwrap_or_else(|| "N/A".to_string())
        )?;
        writeln!(out, "Execution score: {}", self.execution_score)?;

        let metrics = &self.metrics;
        section(out, "PACE")?;
        match &metrics.pace {
            Some(pace) => writeln!(out, "  Average: {} /km", format_run_pace(pace.avg))?,
            None => writeln!(out, "  No speed data")?,
        }

        section(out, "HEART RATE")?;
        match &metrics.heart_rate {
            Some(hr) => {
                writeln!(out, "  Avg {:.0} / max {:.0} / min {:.0} bpm", hr.avg, hr.max, hr.min)?;
                writeln!(
                    out,
                    "  Drift: {} ({})",
                    optional(hr.drift, 1, " bpm"),
                    optional(hr.drift_pct, 1, "%")
                )?;
            }
            None => writeln!(out, "  No heart rate data")?,
        }

        section(out, "CADENCE")?;
        match &metrics.cadence {
            Some(cadence) => {
                writeln!(out, "  Avg {:.0} spm, CV {:.1}%", cadence.avg, cadence.cv)?;
                writeln!(out, "  Drop: {}", optional(cadence.drop, 1, " spm"))?;
            }
            None => writeln!(out, "  No cadence data")?,
        }

        section(out, "EFFICIENCY")?;
        writeln!(
            out,
            "  HR/pace correlation: {}",
            optional(metrics.hr_pace_correlation, 2, "")
        )?;
        writeln!(out, "  Efficiency score:    {}", optional(metrics.efficiency_score, 1, ""))?;
        writeln!(out, "  Step length:         {}", optional(metrics.avg_step_length, 0, " mm"))?;

        if let Some(economy) = &self.economy {
            section(out, "RUNNING ECONOMY")?;
            writeln!(out, "  {}", economy.rating)?;
            writeln!(
                out,
                "  HR/speed slope: {:.1} bpm per m/s (intercept {:.0} bpm)",
                economy.speed_slope, economy.intercept
            )?;
            let zones = &economy.hr_at_pace;
            writeln!(
                out,
                "  HR at easy / moderate / hard pace: {} / {} / {}",
                optional(zones.easy, 0, ""),
                optional(zones.moderate, 0, ""),
                optional(zones.hard, 0, "")
            )?;
        }

        if let Some(intervals) = &self.intervals {
            section(out, "SEGMENTS")?;
            writeln!(out, "  {:>3} {:>8} {:>15} {:>8} {:>8}", "#", "Pace", "Range", "HR", "Cadence")?;
            for interval in intervals {
                writeln!(
                    out,
                    "  {:>3} {:>8} {:>15} {:>8} {:>8}",
                    interval.rep,
                    format_run_pace(interval.pace_avg),
                    format!(
                        "{}-{}",
                        format_run_pace(interval.pace_min),
                        format_run_pace(interval.pace_max)
                    ),
                    optional(interval.hr_avg, 0, ""),
                    optional(interval.cadence_avg, 0, "")
                )?;
            }
        }
        Ok(())
    }
}

impl TextReport for LongRunAnalysis {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        let flag = |stable: bool| if stable { "stable" } else { "unstable" };
        writeln!(
            out,
            "{}  {}  Grade {}",
            date_label(self.start_time),
            optional(self.distance_km, 1, " km"),
            self.grade
        )?;

        let hr = &self.metrics.heart_rate;
        writeln!(
            out,
            "  Heart rate: {:>5.1}/100  CV {:.1}%  drift {:+.1} bpm  ({})",
            hr.stability_score,
            hr.cv,
            hr.drift,
            flag(self.hr_stable)
        )?;
        let cadence = &self.metrics.cadence;
        writeln!(
            out,
            "  Cadence:    {:>5.1}/100  CV {:.1}%  degradation {:+.1} spm  ({})",
            cadence.stability_score,
            cadence.cv,
            cadence.degradation,
            flag(self.cadence_stable)
        )?;
        let pace = &self.metrics.pace;
        writeln!(
            out,
            "  Pace:       {:>5.1}/100  degradation {:+.2} min/km  ({})",
            pace.stability_score,
            pace.degradation,
            flag(self.pace_stable)
        )?;
        writeln!(out, "  Next: {}", self.recommendation)
    }
}

impl TextReport for [LongRunAnalysis] {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "LONG RUN REVIEW")?;
        if self.is_empty() {
            return writeln!(out, "No long runs found");
        }
        for run in self {
            writeln!(out)?;
            run.write_text(out)?;
        }
        Ok(())
    }
}

impl TextReport for RunningBlockAnalysis {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "RUNNING BLOCK REVIEW")?;
        writeln!(out, "Period: last {} days", self.period_days)?;
        writeln!(out, "Runs: {}", self.total_runs)?;

        if let Some(metrics) = &self.metrics {
            writeln!(
                out,
                "Volume: {:.1} km total, {:.1} km average, {:.1} runs/week",
                metrics.total_distance_km, metrics.avg_distance_km, metrics.runs_per_week
            )?;
            writeln!(
                out,
                "Average pace: {}",
                metrics
                    .avg_pace_min_per_km
                    .map(format_run_pace)
                    .unwrap_or_else(|| "N/A".to_string())
            )?;
            writeln!(
                out,
                "Mix: {} short, {} medium, {} long",
                metrics.short_runs_count, metrics.medium_runs_count, metrics.long_runs_count
            )?;
        }

        section(out, "STRENGTHS")?;
        if self.strengths.is_empty() {
            writeln!(out, "  (none identified)")?;
        }
        for strength in &self.strengths {
            writeln!(out, "  + {}", strength)?;
        }
        section(out, "GAPS")?;
        for gap in &self.gaps {
            writeln!(out, "  - {}", gap)?;
        }
        if !self.recommendations.is_empty() {
            section(out, "RECOMMENDATION")?;
            for rec in &self.recommendations {
                writeln!(out, "  {}", rec)?;
            }
        }
        Ok(())
    }
}

impl TextReport for [PmcPoint] {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "PERFORMANCE MANAGEMENT CHART")?;
        writeln!(
            out,
            "{:<12} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "Date", "Workouts", "TSS", "CTL", "ATL", "TSB"
        )?;
        for point in self {
            writeln!(
                out,
                "{:<12} {:>8} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
                point.date.format("%Y-%m-%d").to_string(),
                point.workout_count,
                point.tss.round_dp(1),
                point.ctl.round_dp(1),
                point.atl.round_dp(1),
                point.tsb.round_dp(1)
            )?;
        }

        if let Some(last) = self.last() {
            let form = TsbInterpretation::from_tsb(last.tsb);
            section(out, "CURRENT FORM")?;
            writeln!(
                out,
                "  CTL {:.1}  ATL {:.1}  TSB {:.1}",
                last.ctl.round_dp(1),
                last.atl.round_dp(1),
                last.tsb.round_dp(1)
            )?;
            writeln!(out, "  {}", form.description())?;
            writeln!(out, "  {}", form.recommendation())?;
        }
        Ok(())
    }
}

impl TextReport for TrainingReview {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        heading(out, "WORKOUT REVIEWS")?;
        for review in &self.reviews {
            writeln!(
                out,
                "{}",
                review
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown date".to_string())
            )?;
            writeln!(out, "{}", review.comment())?;
            writeln!(out, "{}", THIN_RULE)?;
        }

        let overview = &self.overview;
        heading(out, "OVERALL TRAINING RECOMMENDATIONS")?;
        if overview.workouts == 0 {
            return writeln!(out, "No workouts analyzed.");
        }

        section(out, "RECENT TRAINING VOLUME")?;
        writeln!(out, "  Total distance: {:.2} km", overview.total_distance_km)?;
        writeln!(out, "  Total time: {:.1} hours", overview.total_time_hours)?;
        writeln!(out, "  Workouts analyzed: {}", overview.workouts)?;
        if let (Some(hr), Some(pct)) = (overview.avg_hr, overview.avg_hr_pct) {
            writeln!(
                out,
                "  Average heart rate: {:.0} bpm ({:.0}% of estimated max {})",
                hr, pct, self.max_heart_rate
            )?;
        }
        if let Some(pace) = overview.avg_pace {
            writeln!(out, "  Average pace: {}/km", format_run_pace(pace))?;
        }

        if !overview.suggestions.is_empty() {
            section(out, "TRAINING SUGGESTIONS")?;
            let (lead, rest) = overview.suggestions.split_at(1);
            writeln!(out, "  {}", lead[0])?;
            for line in rest {
                writeln!(out, "    -> {}", line)?;
            }
        }

        section(out, "WEEKLY TRAINING PLAN")?;
        for day in &overview.weekly_plan {
            writeln!(out, "  {}", day)?;
        }
        writeln!(out)?;
        writeln!(out, "Consistency beats intensity. Recovery is part of training.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{WorkoutFacts, WorkoutReviewer};
    use crate::running::RunningAnalyzer;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn render(report: &(impl TextReport + ?Sized)) -> String {
        let mut buffer = Vec::new();
        report.write_text(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_pmc_text_shows_current_form() {
        let points = vec![PmcPoint {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            tss: dec!(60.0625),
            workout_count: 1,
            ctl: dec!(60.0625),
            atl: dec!(60.0625),
            tsb: dec!(0),
        }];

        let text = render(points.as_slice());
        assert!(text.contains("2024-06-01"));
        assert!(text.contains("Workouts"));
        assert!(text.contains("60.1"));
        assert!(text.contains("Neutral"));
    }

    #[test]
    fn test_empty_block_review_lists_gap() {
        let block = RunningAnalyzer::analyze_block(
            &[],
            30,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap();
        let text = render(&block);
        assert!(text.contains("No running activities found"));
        assert!(text.contains("(none identified)"));
    }

    #[test]
    fn test_training_review_text() {
        let facts = WorkoutFacts {
            date: NaiveDate::from_ymd_opt(2024, 6, 2),
            sport: Some("Run".to_string()),
            distance_km: 10.0,
            duration_min: 65.0,
            avg_pace: Some(6.5),
            avg_hr: Some(133.0),
            ..WorkoutFacts::default()
        };
        let report = WorkoutReviewer::new(None).unwrap().review_all(&[facts]);
        let text = render(&report);

        assert!(text.contains("2024-06-02"));
        assert!(text.contains("Running • 10.00km • 1h 5m • avg pace 6:30/km"));
        assert!(text.contains("Great base building! Time to add some intensity:"));
        assert!(text.contains("    -> Include 1-2 interval sessions per week"));
        assert!(text.contains("Sunday: Long run"));

        let empty = WorkoutReviewer::new(None).unwrap().review_all(&[]);
        assert!(render(&empty).contains("No workouts analyzed."));
    }

    #[test]
    fn test_no_long_runs() {
        let runs: Vec<LongRunAnalysis> = Vec::new();
        assert!(render(runs.as_slice()).contains("No long runs found"));
    }
}
