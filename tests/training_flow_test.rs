use chrono::NaiveDate;
use deckcast::application::ml::forecast::{ForecastRequest, forecast};
use deckcast::application::ml::smartcore_predictor::ModelKind;
use deckcast::application::ml::training_pipeline::run_training;
use deckcast::application::ml::winrate_predictor::WinratePredictor;
use deckcast::config::PipelineConfig;
use deckcast::domain::errors::PredictionError;
use deckcast::domain::ml::feature_encoder::FeatureEncoder;
use deckcast::domain::ml::split::SplitPolicy;
use deckcast::domain::types::{CategoricalField, MatchContext, MatchRecord};
use deckcast::infrastructure::forecast_writer::save_forecast;
use deckcast::infrastructure::{ModelStore, read_matches};

const HISTORY: &str = "\
date,opponent_archetype,event_type,winrate
2024-01-01,Mono Red,League,42.0
2024-01-02,Control,League,58.5
2024-01-03,Midrange,Challenge,51.0
2024-01-04,Mono Red,Challenge,44.5
2024-01-05,Control,League,60.0
2024-01-06,Midrange,League,52.5
2024-01-07,Mono Red,League,45.0
2024-01-08,Control,Challenge,61.5
2024-01-09,Midrange,Challenge,53.0
2024-01-10,Mono Red,League,46.5
";

const FIELDS: [CategoricalField; 2] = [
    CategoricalField::OpponentArchetype,
    CategoricalField::EventType,
];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

#[test]
fn test_end_to_end_linear_training() {
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    assert_eq!(records.len(), 10);

    let config = PipelineConfig::default();
    let outcome = run_training(&records, &config).unwrap();

    assert_eq!(outcome.report.n_records, 10);
    assert_eq!(outcome.report.n_test, 2);
    assert_eq!(outcome.report.n_train, 8);
    // days_since_start + 3 archetypes + 2 event types
    assert_eq!(outcome.report.columns.len(), 6);
    assert_eq!(outcome.report.columns[0], "days_since_start");
    assert!(outcome.report.metrics.is_finite());

    let ctx = MatchContext::new(day(15), "Control", "League");
    let prediction = WinratePredictor::predict_context(&outcome.model, &ctx).unwrap();
    assert!(prediction.winrate.is_finite());
}

#[test]
fn test_same_seed_same_model() {
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    let mut config = PipelineConfig::default();
    config.model.kind = ModelKind::RandomForest;
    config.model.n_trees = 20;

    let a = run_training(&records, &config).unwrap();
    let b = run_training(&records, &config).unwrap();
    assert_eq!(a.report, b.report);

    let ctx = MatchContext::new(day(12), "Midrange", "Challenge");
    let pa = WinratePredictor::predict_context(&a.model, &ctx).unwrap();
    let pb = WinratePredictor::predict_context(&b.model, &ctx).unwrap();
    assert_eq!(pa.winrate, pb.winrate);
}

#[test]
fn test_chronological_split_holds_out_latest_matches() {
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    let mut config = PipelineConfig::default();
    config.split.policy = SplitPolicy::Chronological;
    config.model.kind = ModelKind::RandomForest;
    config.model.n_trees = 10;

    let outcome = run_training(&records, &config).unwrap();
    assert_eq!(outcome.report.n_test, 2);
    assert_eq!(outcome.model.trained_on(), 8);
}

#[test]
fn test_unseen_archetype_is_rejected() {
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    let outcome = run_training(&records, &PipelineConfig::default()).unwrap();

    let ctx = MatchContext::new(day(11), "Tron", "League");
    match WinratePredictor::predict_context(&outcome.model, &ctx) {
        Err(PredictionError::UnknownCategory { field, value }) => {
            assert_eq!(field, CategoricalField::OpponentArchetype);
            assert_eq!(value, "Tron");
        }
        other => panic!("expected unknown category, got {:?}", other),
    }
}

#[test]
fn test_linear_fit_on_sparse_history() {
    // 5 archetypes x 2 events: 8 encoded columns, only 8 or 9 training rows
    let archetypes = ["Burn", "Tron", "Merfolk", "Affinity", "Jund"];
    let events = ["League", "Challenge"];
    let records: Vec<MatchRecord> = (0..9u32)
        .map(|i| {
            MatchRecord::new(
                day(i + 1),
                archetypes[(i % 5) as usize],
                events[(i % 2) as usize],
                40.0 + 2.0 * i as f64,
            )
        })
        .collect();
    let (vocab, x) = FeatureEncoder::fit_transform(&records, &FIELDS).unwrap();
    assert_eq!(vocab.width(), 8);
    let y: Vec<f64> = records.iter().map(|r| r.winrate).collect();

    for n_train in [8, 9] {
        let model = WinratePredictor::default()
            .fit(vocab.clone(), &x[..n_train], &y[..n_train])
            .unwrap();
        let ctx = MatchContext::new(day(10), "Jund", "League");
        let prediction = WinratePredictor::predict_context(&model, &ctx).unwrap();
        assert!(prediction.winrate.is_finite());
    }
}

#[test]
fn test_small_history_still_trains() {
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    let outcome = run_training(&records[..5], &PipelineConfig::default()).unwrap();
    assert_eq!(outcome.report.n_train, 4);
    assert!(outcome.report.metrics.is_finite());

    // A single record leaves nothing to train on once one row is held out
    assert!(matches!(
        run_training(&records[..1], &PipelineConfig::default()),
        Err(PredictionError::InsufficientData { .. })
    ));
}

#[test]
fn test_saved_model_drives_forecast_export() {
    let dir = tempfile::tempdir().unwrap();
    let records = read_matches(HISTORY.as_bytes()).unwrap();
    let outcome = run_training(&records, &PipelineConfig::default()).unwrap();

    let store = ModelStore::new(dir.path().join("model.json"));
    store.save(&outcome.model).unwrap();
    let model = store.load().unwrap();

    let request = ForecastRequest::new(day(11), day(17), "League").with_step_days(3);
    let rows = forecast(&model, &request).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].date, day(17));
    assert_eq!(rows[0].matchups.len(), 3);

    let out = dir.path().join("forecast.csv");
    save_forecast(&rows, &out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,Predicted Winrate,Winrate_vs_Mono_Red,Winrate_vs_Control,Winrate_vs_Midrange"
    );
    assert!(lines.next().unwrap().starts_with("2024-01-11,"));
    assert_eq!(text.lines().count(), 4);
}
