use deckcast::domain::errors::PredictionError;
use deckcast::domain::performance::matchup_stats::{MatchupSummary, winrate_over_time};
use deckcast::infrastructure::{IngestError, load_matches};
use std::fs;

#[test]
fn test_load_from_disk_and_summarize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matches.csv");
    fs::write(
        &path,
        "\
date,opponent_archetype,event_type,deck_version,meta_shift,winrate
2024-05-01,Rakdos Scam,League,v2,pre-ban,40
2024-05-01,Amulet Titan,League,v2,pre-ban,70
2024-05-03,Rakdos Scam,Challenge,v3,post-ban,50
2024-05-03,Amulet Titan,League,v3,post-ban,60
",
    )
    .unwrap();

    let records = load_matches(&path).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[2].meta_shift.as_deref(), Some("post-ban"));

    let summary = MatchupSummary::from_records(&records);
    assert_eq!(summary.matchups.len(), 2);
    assert_eq!(summary.top(1)[0].opponent_archetype, "Amulet Titan");
    assert!((summary.top(1)[0].mean_winrate - 65.0).abs() < 1e-9);
    assert_eq!(summary.bottom(1)[0].opponent_archetype, "Rakdos Scam");

    let timeline = winrate_over_time(&records);
    assert_eq!(timeline.len(), 2);
    assert!((timeline[0].1 - 55.0).abs() < 1e-9);
    assert!((timeline[1].1 - 55.0).abs() < 1e-9);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    match load_matches(&path) {
        Err(IngestError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {:?}", other),
    }
}

#[test]
fn test_header_only_file_is_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "date,opponent_archetype,event_type,winrate\n").unwrap();

    let records = load_matches(&path).unwrap();
    assert!(records.is_empty());
    assert!(MatchupSummary::from_records(&records).is_empty());
}

#[test]
fn test_bad_row_stops_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "date,opponent_archetype,event_type,winrate\n2024-05-01,,League,50\n",
    )
    .unwrap();

    assert!(matches!(
        load_matches(&path),
        Err(IngestError::Invalid(PredictionError::Parse { index: 0, .. }))
    ));
}
