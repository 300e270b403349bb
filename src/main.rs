use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use deckcast::application::ml::forecast::{ForecastRequest, forecast};
use deckcast::application::ml::training_pipeline::run_training;
use deckcast::application::ml::winrate_predictor::WinratePredictor;
use deckcast::config::PipelineConfig;
use deckcast::domain::ml::split::SplitPolicy;
use deckcast::domain::performance::matchup_stats::{MatchupSummary, winrate_over_time};
use deckcast::domain::types::MatchContext;
use deckcast::infrastructure::forecast_writer::save_forecast;
use deckcast::infrastructure::{ModelStore, load_matches};
use std::path::PathBuf;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deck archetype winrate analytics and forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a model on historical matches and report hold-out metrics
    Train {
        /// Match history CSV
        #[arg(long)]
        input: PathBuf,

        /// Where to save the trained model (JSON)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pipeline config TOML; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Regression family: linear or random_forest
        #[arg(long)]
        model: Option<String>,

        /// Split policy: random or chronological
        #[arg(long)]
        split: Option<String>,

        #[arg(long)]
        test_fraction: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict the winrate of a single match context
    Predict {
        /// Trained model file
        #[arg(long)]
        model: PathBuf,

        /// Match date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        opponent: String,

        #[arg(long)]
        event: String,

        #[arg(long)]
        deck_version: Option<String>,

        #[arg(long)]
        meta_shift: Option<String>,
    },

    /// Predict every known matchup over a date range and export CSV
    Forecast {
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        #[arg(long, default_value_t = 1)]
        step_days: u32,

        #[arg(long)]
        event: String,

        #[arg(long)]
        deck_version: Option<String>,

        #[arg(long)]
        meta_shift: Option<String>,

        /// Output CSV
        #[arg(long, default_value = "winrate_forecast.csv")]
        output: PathBuf,
    },

    /// Summarize observed winrates per matchup and over time
    Summary {
        #[arg(long)]
        input: PathBuf,

        /// Matchups to show at each end of the table
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train {
            input,
            output,
            config,
            model,
            split,
            test_fraction,
            seed,
        } => {
            let mut pipeline = PipelineConfig::load(config.as_deref())?;
            if let Some(kind) = model {
                pipeline.model.kind = kind.parse()?;
            }
            if let Some(policy) = split {
                pipeline.split.policy = policy.parse::<SplitPolicy>()?;
            }
            if let Some(fraction) = test_fraction {
                pipeline.split.test_fraction = fraction;
            }
            if let Some(seed) = seed {
                pipeline.split.seed = seed;
            }
            pipeline.validate()?;

            let records = load_matches(&input)?;
            let outcome = run_training(&records, &pipeline).context("Training failed")?;
            let report = &outcome.report;

            println!("\nTrained {} model", outcome.model.kind());
            println!(
                "  Records: {}  (train {}, test {}, {} split)",
                report.n_records, report.n_train, report.n_test, pipeline.split.policy
            );
            println!("  Columns: {}", report.columns.join(", "));
            println!("  R² Score: {:.4}", report.metrics.r2);
            println!("  MSE:      {:.4}", report.metrics.mse);
            println!("  RMSE:     {:.4}", report.metrics.rmse);
            println!("  MAE:      {:.4}", report.metrics.mae);

            if let Some(path) = output {
                ModelStore::new(path).save(&outcome.model)?;
            }
        }

        Command::Predict {
            model,
            date,
            opponent,
            event,
            deck_version,
            meta_shift,
        } => {
            let model = ModelStore::new(model).load()?;
            let mut context = MatchContext::new(date, opponent, event);
            context.deck_version = deck_version;
            context.meta_shift = meta_shift;

            let prediction = WinratePredictor::predict_context(&model, &context)?;
            println!("{}", prediction);
        }

        Command::Forecast {
            model,
            start,
            end,
            step_days,
            event,
            deck_version,
            meta_shift,
            output,
        } => {
            let model = ModelStore::new(model).load()?;
            let mut request = ForecastRequest::new(start, end, event).with_step_days(step_days);
            request.deck_version = deck_version;
            request.meta_shift = meta_shift;

            let rows = forecast(&model, &request)?;
            save_forecast(&rows, &output)?;
            info!("Forecast complete: {} rows", rows.len());
        }

        Command::Summary { input, top } => {
            let records = load_matches(&input)?;
            if records.is_empty() {
                bail!("No match records found in {:?}", input);
            }
            let summary = MatchupSummary::from_records(&records);

            println!("\nMatchups ({} archetypes):", summary.matchups.len());
            for m in &summary.matchups {
                let spread = m
                    .std_dev
                    .map(|s| format!("±{:.2}", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<24} {:>6.2}%  {:>8}  (n={})",
                    m.opponent_archetype, m.mean_winrate, spread, m.matches
                );
            }

            println!("\nTop {} Matchups:", top);
            for m in summary.top(top) {
                println!("  {:<24} {:>6.2}%", m.opponent_archetype, m.mean_winrate);
            }
            println!("\nBottom {} Matchups:", top);
            for m in summary.bottom(top) {
                println!("  {:<24} {:>6.2}%", m.opponent_archetype, m.mean_winrate);
            }

            println!("\nWinrate over time:");
            for (date, winrate) in winrate_over_time(&records) {
                println!("  {}  {:>6.2}%", date, winrate);
            }
        }
    }

    Ok(())
}
