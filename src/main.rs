use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use coachrs::config::AppConfig;
use coachrs::error::CoachError;
use coachrs::export::{self, format_run_pace, OutputFormat, TextReport};
use coachrs::import::ImportManager;
use coachrs::logging::init_logging;
use coachrs::models::{Sport, WorkoutTable};
use coachrs::pmc::{PmcCalculator, PmcPoint, SportFilter, TsbInterpretation};
use coachrs::review::{WorkoutFacts, WorkoutReviewer};
use coachrs::running::{LongRunAnalysis, RunningAnalyzer};
use coachrs::swimming::{analyze_workout, Grade};
use coachrs::trends::compare_tables;

/// CoachRS - Workout Scoring and Training Load CLI
///
/// Grades swims and runs from recorded workout tables, tracks progress across
/// workouts and charts training load (CTL, ATL, TSB) from activity summaries.
#[derive(Parser)]
#[command(name = "coachrs")]
#[command(author = "CoachRS Contributors")]
#[command(version)]
#[command(about = "Workout scoring and training load CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report format (defaults to the configured format)
    #[arg(short = 'f', long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single swim workout
    Analyze {
        /// Workout CSV file
        file: PathBuf,
    },

    /// Compare swim workouts and report trends
    Compare {
        /// Workout CSV files or directories of them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Report on a single run: drift, cadence and execution score
    RunReport {
        /// Workout CSV file
        file: PathBuf,
    },

    /// Grade the most recent long runs
    LongRun {
        /// Workout CSV files or directories of them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Minimum distance in km (defaults to the configured value)
        #[arg(long)]
        min_km: Option<f64>,

        /// Number of runs to grade
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },

    /// Performance Management Chart from activity summaries
    Pmc {
        /// Activity summary file (CSV or JSON)
        #[arg(short, long)]
        activities: PathBuf,

        /// Days of history to chart
        #[arg(short, long)]
        days: Option<u32>,

        /// Only count one sport (all, swim, run, ride)
        #[arg(short, long)]
        sport: Option<SportFilter>,

        /// Last day of the chart (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Rows shown in the terminal table
        #[arg(long, default_value = "14")]
        last: usize,
    },

    /// Review a block of running: strengths, gaps and a recommendation
    Runs {
        /// Activity summary file (CSV or JSON)
        #[arg(short, long)]
        activities: PathBuf,

        /// Days to review
        #[arg(short, long)]
        days: Option<i64>,

        /// Last day of the block (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Summaries, highlights and next-workout suggestions for recent workouts
    Review {
        /// Activity summary file (CSV or JSON)
        #[arg(short, long, required_unless_present = "workouts")]
        activities: Option<PathBuf>,

        /// Workout CSV files or directories of them
        #[arg(short, long, num_args = 1..)]
        workouts: Vec<PathBuf>,

        /// Number of most recent workouts to review
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (KEY=VALUE)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

/// Shared state for the command handlers
struct App {
    config: AppConfig,
    config_path: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
    importer: ImportManager,
}

impl App {
    /// Terminal extras (tables, colors) only when text goes to stdout
    fn interactive(&self) -> bool {
        self.format == OutputFormat::Text && self.output.is_none()
    }

    fn write<T>(&self, report: &T) -> Result<()>
    where
        T: serde::Serialize + TextReport + ?Sized,
    {
        export::write_report(report, self.format, self.output.as_deref()).map_err(user_error)?;
        if let Some(path) = &self.output {
            eprintln!("{} {}", "✓ Report written to".green(), path.display());
        }
        Ok(())
    }

    fn load_workout(&self, file: &Path) -> Result<WorkoutTable> {
        let mut table = self.importer.import_workout(file).map_err(user_error)?;
        if table.session.sport.is_none() {
            if let Some(sport) = self.config.analysis.default_sport {
                table.session.sport = Some(sport.to_string());
            }
        }
        Ok(table)
    }

    fn load_workouts(&self, paths: &[PathBuf]) -> Result<Vec<WorkoutTable>> {
        let tables = self.importer.import_workouts(paths).map_err(user_error)?;
        if tables.is_empty() {
            bail!("No readable workout files found");
        }
        Ok(tables.into_iter().map(|(_, table)| table).collect())
    }
}

/// Turn a library error into its user-facing message, keeping details in the log
fn user_error<E: Into<CoachError>>(error: E) -> anyhow::Error {
    let error: CoachError = error.into();
    debug!(severity = ?error.severity(), "{:?}", error);
    anyhow!(error.user_message())
}

fn colored_grade(grade: Grade) -> ColoredString {
    let label = format!("Grade {}", grade);
    match grade {
        Grade::A => label.green().bold(),
        Grade::B => label.cyan().bold(),
        Grade::C => label.yellow().bold(),
        Grade::D => label.red().bold(),
    }
}

fn handle_analyze(ctx: &App, file: &Path) -> Result<()> {
    let table = ctx.load_workout(file)?;
    let sport = table.session.sport.as_deref().and_then(Sport::from_session_sport);
    if !matches!(sport, None | Some(Sport::Swimming)) {
        eprintln!(
            "{}",
            format!(
                "Note: {} looks like a {} workout; scoring it as a swim",
                file.display(),
                sport.map(|s| s.to_string()).unwrap_or_default()
            )
            .yellow()
        );
    }

    let analysis = analyze_workout(&table);
    ctx.write(&analysis)?;
    if ctx.interactive() {
        println!();
        println!(
            "{} {}",
            colored_grade(analysis.grade),
            format!("{}/100", analysis.total_score).bold()
        );
    }
    Ok(())
}

fn handle_compare(ctx: &App, paths: &[PathBuf]) -> Result<()> {
    let tables = ctx.load_workouts(paths)?;
    let report = compare_tables(&tables).map_err(user_error)?;
    ctx.write(&report)
}

fn handle_run_report(ctx: &App, file: &Path) -> Result<()> {
    let table = ctx.load_workout(file)?;
    let report = RunningAnalyzer::runner_report(&table);
    ctx.write(&report)
}

fn handle_long_run(
    ctx: &App,
    paths: &[PathBuf],
    min_km: Option<f64>,
    top: Option<usize>,
) -> Result<()> {
    let tables = ctx.load_workouts(paths)?;
    let min_km = min_km.unwrap_or(ctx.config.analysis.long_run_min_km);
    let top = top.unwrap_or(ctx.config.analysis.long_run_count);

    let analyses: Vec<LongRunAnalysis> = RunningAnalyzer::select_long_runs(&tables, min_km, top)
        .into_iter()
        .map(RunningAnalyzer::score_long_run)
        .collect();
    ctx.write(analyses.as_slice())
}

#[derive(Tabled)]
struct PmcRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Workouts")]
    workouts: u16,
    #[tabled(rename = "TSS")]
    tss: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "TSB")]
    tsb: String,
}

impl From<&PmcPoint> for PmcRow {
    fn from(point: &PmcPoint) -> Self {
        PmcRow {
            date: point.date.format("%Y-%m-%d").to_string(),
            workouts: point.workout_count,
            tss: point.tss.round_dp(1).to_string(),
            ctl: point.ctl.round_dp(1).to_string(),
            atl: point.atl.round_dp(1).to_string(),
            tsb: point.tsb.round_dp(1).to_string(),
        }
    }
}

fn print_pmc_table(series: &[PmcPoint], last: usize) {
    let rows: Vec<PmcRow> = series
        .iter()
        .skip(series.len().saturating_sub(last))
        .map(PmcRow::from)
        .collect();
    println!("{}", "Performance Management Chart".blue().bold());
    println!("{}", Table::new(rows).with(Style::rounded()));

    if let Some(current) = series.last() {
        let form = TsbInterpretation::from_tsb(current.tsb);
        let description = match form {
            TsbInterpretation::VeryFresh | TsbInterpretation::Fresh => form.description().green(),
            TsbInterpretation::Neutral => form.description().normal(),
            TsbInterpretation::Fatigued => form.description().yellow(),
            TsbInterpretation::VeryFatigued => form.description().red(),
        };
        println!(
            "Fitness (CTL) {}  Fatigue (ATL) {}  Form (TSB) {}",
            current.ctl.round_dp(1).to_string().bold(),
            current.atl.round_dp(1).to_string().bold(),
            current.tsb.round_dp(1).to_string().bold()
        );
        println!("{}", description);
        println!("{}", form.recommendation().dimmed());
    }
}

fn handle_pmc(
    ctx: &App,
    activities_path: &Path,
    days: Option<u32>,
    sport: Option<SportFilter>,
    today: Option<NaiveDate>,
    last: usize,
) -> Result<()> {
    let activities = ctx
        .importer
        .import_activities(activities_path)
        .map_err(user_error)?;
    let calculator = PmcCalculator::with_config(ctx.config.pmc.clone()).map_err(user_error)?;

    let series = calculator
        .calculate_pmc(
            &activities,
            days.unwrap_or(ctx.config.pmc.default_window_days),
            today.unwrap_or_else(|| Utc::now().date_naive()),
            sport.unwrap_or(ctx.config.pmc.sport_filter),
        )
        .map_err(user_error)?;

    if ctx.interactive() {
        print_pmc_table(&series, last);
        Ok(())
    } else {
        ctx.write(series.as_slice())
    }
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Pace (/km)")]
    pace: String,
    #[tabled(rename = "Avg HR")]
    hr: String,
}

fn handle_runs(
    ctx: &App,
    activities_path: &Path,
    days: Option<i64>,
    today: Option<NaiveDate>,
) -> Result<()> {
    let activities = ctx
        .importer
        .import_activities(activities_path)
        .map_err(user_error)?;
    let days = days.unwrap_or(ctx.config.analysis.block_days);
    let block = match today {
        Some(today) => RunningAnalyzer::analyze_block(&activities, days, today),
        None => RunningAnalyzer::analyze_recent_block(&activities, days),
    }
    .map_err(user_error)?;

    ctx.write(&block)?;
    if ctx.interactive() {
        if let Some(metrics) = &block.metrics {
            let rows: Vec<RunRow> = metrics
                .runs
                .iter()
                .map(|run| RunRow {
                    date: run.date.format("%Y-%m-%d").to_string(),
                    distance: format!("{:.1}", run.distance_km),
                    pace: run
                        .pace_min_per_km
                        .map(format_run_pace)
                        .unwrap_or_else(|| "N/A".to_string()),
                    hr: run
                        .avg_hr
                        .map(|hr| format!("{:.0}", hr))
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }
    Ok(())
}

fn handle_review(
    ctx: &App,
    activities_path: Option<&Path>,
    workout_paths: &[PathBuf],
    last: Option<usize>,
) -> Result<()> {
    let mut facts: Vec<WorkoutFacts> = Vec::new();
    if let Some(path) = activities_path {
        let activities = ctx.importer.import_activities(path).map_err(user_error)?;
        facts.extend(activities.iter().map(WorkoutFacts::from_activity));
    }
    if !workout_paths.is_empty() {
        let tables = ctx.load_workouts(workout_paths)?;
        facts.extend(tables.iter().map(WorkoutFacts::from_table));
    }

    // newest first, undated last
    facts.sort_by(|a, b| b.date.cmp(&a.date));
    facts.truncate(last.unwrap_or(ctx.config.analysis.review_count));

    let reviewer = WorkoutReviewer::new(ctx.config.analysis.athlete_age).map_err(user_error)?;
    debug!(
        "Reviewing {} workouts against a max HR of {}",
        facts.len(),
        reviewer.max_heart_rate()
    );
    ctx.write(&reviewer.review_all(&facts))
}

fn handle_config(
    ctx: &mut App,
    list: bool,
    set: Option<String>,
    get: Option<String>,
) -> Result<()> {
    if let Some(assignment) = set {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", assignment))?;
        ctx.config.set_value(key.trim(), value.trim())?;
        ctx.config
            .save_to_file(&ctx.config_path)
            .with_context(|| "Failed to save configuration")?;
        println!("{} {} = {}", "✓ Set".green(), key.trim(), value.trim());
    } else if let Some(key) = get {
        println!("{}", ctx.config.get_value(&key)?);
    } else if list {
        println!("{}", format!("# {}", ctx.config_path.display()).dimmed());
        println!("{}", toml::to_string_pretty(&ctx.config)?);
    } else {
        println!("Config file: {}", ctx.config_path.display());
        println!("Use --list, --get KEY or --set KEY=VALUE");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let config = AppConfig::load_or_default_from(&config_path);

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;
    debug!("Using configuration from {}", config_path.display());

    let mut ctx = App {
        format: cli.format.unwrap_or(config.analysis.output_format),
        output: cli.output,
        config,
        config_path,
        importer: ImportManager::new(),
    };

    match cli.command {
        Commands::Analyze { file } => handle_analyze(&ctx, &file),
        Commands::Compare { paths } => handle_compare(&ctx, &paths),
        Commands::RunReport { file } => handle_run_report(&ctx, &file),
        Commands::LongRun { paths, min_km, top } => handle_long_run(&ctx, &paths, min_km, top),
        Commands::Pmc {
            activities,
            days,
            sport,
            today,
            last,
        } => handle_pmc(&ctx, &activities, days, sport, today, last),
        Commands::Runs {
            activities,
            days,
            today,
        } => handle_runs(&ctx, &activities, days, today),
        Commands::Review {
            activities,
            workouts,
            last,
        } => handle_review(&ctx, activities.as_deref(), &workouts, last),
        Commands::Config { list, set, get } => handle_config(&mut ctx, list, set, get),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
