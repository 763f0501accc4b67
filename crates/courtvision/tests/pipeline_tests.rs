// Integration tests for the rating pipeline.
//
// These run the full report path over the CSV fixtures in tests/fixtures,
// using in-memory caches, and check that the components (distribution cache,
// composite rating, historical builder, blender, grades, similarity) agree
// with each other and degrade gracefully when data is missing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use courtvision::cache::{CacheStore, MemoryCache, SqliteCache};
use courtvision::config::*;
use courtvision::pipeline::RatingPipeline;
use courtvision::provider::csv::CsvSource;
use courtvision::provider::{
    AwardRecord, CareerSeason, CareerTotals, HistoricalProvider, PlayoffTotals, ProviderError,
};
use courtvision::rating::blend::{BASE_RATING, CURRENT_WEIGHT, HISTORICAL_WEIGHT};
use courtvision::rating::grades::{Grade, GradeSource, Skill};
use courtvision::stats::{PlayerId, PositionCategory, StatKey};

// ===========================================================================
// Test helpers
// ===========================================================================

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn fixture_paths() -> DataPaths {
    DataPaths {
        league_basic: fixture("league_basic.csv"),
        league_advanced: fixture("league_advanced.csv"),
        league_per100: fixture("league_per100.csv"),
        career_seasons: fixture("career_seasons.csv"),
        career_totals: fixture("career_totals.csv"),
        playoff_totals: Some(fixture("playoff_totals.csv")),
        awards: fixture("awards.csv"),
    }
}

/// Build a test-ready Config inline (no files).
fn inline_config(paths: DataPaths) -> Config {
    Config {
        league: LeagueConfig {
            reference_season: "2024-25".into(),
            min_games_played: 10,
        },
        cache: CacheConfig {
            db_path: ":memory:".into(),
            distribution_ttl_hours: 24,
            historical_ttl_days: 7,
        },
        similarity: SimilarityConfig {
            top_k: 5,
            min_minutes_per_game: 10.0,
        },
        data_paths: paths,
    }
}

fn fixture_pipeline() -> (RatingPipeline, Arc<MemoryCache>) {
    let config = inline_config(fixture_paths());
    let source = Arc::new(CsvSource::from_paths(&config.data_paths));
    let store = Arc::new(MemoryCache::new());
    let pipeline = RatingPipeline::new(source.clone(), source, store.clone(), &config);
    (pipeline, store)
}

/// Wraps the CSV source and counts career table reads.
struct CountingHistory {
    inner: CsvSource,
    calls: AtomicUsize,
}

impl HistoricalProvider for CountingHistory {
    fn career_seasons(&self, player_id: PlayerId) -> Result<Vec<CareerSeason>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.career_seasons(player_id)
    }

    fn career_totals(&self, player_id: PlayerId) -> Result<CareerTotals, ProviderError> {
        self.inner.career_totals(player_id)
    }

    fn playoff_totals(&self, player_id: PlayerId) -> Result<Option<PlayoffTotals>, ProviderError> {
        self.inner.playoff_totals(player_id)
    }

    fn awards(&self, player_id: PlayerId) -> Result<Vec<AwardRecord>, ProviderError> {
        self.inner.awards(player_id)
    }
}

// ===========================================================================
// Full report
// ===========================================================================

#[test]
fn report_for_star_guard() {
    let (pipeline, _) = fixture_pipeline();
    let report = pipeline.player_report(1, None).unwrap();

    assert_eq!(report.profile.player_name, "Alpha Guard");
    assert_eq!(report.profile.season, "2024-25");
    assert_eq!(report.position, PositionCategory::PG);
    // Basic, advanced and per-100 tables were all merged.
    assert_eq!(report.profile.get(StatKey::Points), Some(27.5));
    assert_eq!(report.profile.get(StatKey::ImpactEstimate), Some(0.185));
    assert_eq!(report.profile.get(StatKey::PointsPer100), Some(36.0));
    let tsa = report.profile.get(StatKey::TrueShotAttemptsPer100).unwrap();
    assert!(approx_eq(tsa, 26.0 + 0.44 * 9.2, 1e-9));

    let r = report.rating;
    assert!(approx_eq(r.total_rating, r.offensive_rating + r.defensive_rating, 1e-12));
    assert!(r.total_rating > 0.0);
    assert!(r.replacement_value > 0.0);
}

#[test]
fn historical_profile_from_fixtures() {
    let (pipeline, _) = fixture_pipeline();
    let h = pipeline.player_report(1, None).unwrap().historical;

    // Nine rows, eight distinct seasons (traded mid 2019-20).
    assert_eq!(h.years_played, 8);
    // 8 + 8 + 10 + 15
    assert!(approx_eq(h.achievement_value, 41.0, 1e-12));
    // 12000 / (2 * (9500 + 1320)) = 0.55453
    assert!(approx_eq(h.career_efficiency_bonus, (12000.0 / 21640.0 - 0.5) * 1000.0, 1e-9));
    assert!(approx_eq(h.career_win_share_bonus, 30.0, 1e-12));
    assert!(approx_eq(h.career_value_bonus, 25.0, 1e-12));
    // 40 games → 20, 22 ppg → 44
    assert!(approx_eq(h.playoff_bonus, 64.0, 1e-12));
}

#[test]
fn blends_are_consistent_with_components() {
    let (pipeline, _) = fixture_pipeline();
    let report = pipeline.player_report(1, None).unwrap();

    for blended in [report.blended, report.blended_with_playoffs] {
        assert!(approx_eq(blended.current_component, report.rating.total_rating * 30.0, 1e-9));
        let expected = BASE_RATING
            + CURRENT_WEIGHT * blended.current_component
            + HISTORICAL_WEIGHT * blended.historical_component;
        assert_eq!(blended.blended_value, expected.round() as i64);
    }
    // The playoff variant adds the playoff bonus on top (neither is capped here).
    assert!(approx_eq(
        report.blended_with_playoffs.historical_component - report.blended.historical_component,
        report.historical.playoff_bonus,
        1e-9
    ));
    assert!(report.blended.historical_component <= 300.0);
    assert!(report.blended_with_playoffs.historical_component <= 400.0);
}

#[test]
fn grades_reflect_league_percentiles() {
    let (pipeline, _) = fixture_pipeline();

    let guard = pipeline.player_report(1, None).unwrap().grades;
    assert_eq!(guard.source, GradeSource::Computed);
    assert_eq!(guard.grades.len(), 9);
    // League-best assists, assist % and assist/turnover.
    assert_eq!(guard.get(Skill::Playmaking), Grade::APlus);

    let big = pipeline.player_report(3, None).unwrap().grades;
    // League-best total, offensive and defensive rebounds.
    assert_eq!(big.get(Skill::Rebounding), Grade::APlus);
    // Best true shooting, worst three-point percentage: (1.0 + 0.2) / 2.
    assert_eq!(big.get(Skill::PerimeterShooting), Grade::BMinus);
}

#[test]
fn similar_players_exclude_target_and_bench() {
    let (pipeline, _) = fixture_pipeline();
    let similar = pipeline.player_report(1, None).unwrap().similar;

    assert_eq!(similar.target_player_id, 1);
    assert!(!similar.players.is_empty());
    assert!(similar.players.len() <= 5);
    assert!(similar.players.iter().all(|p| p.player_id != 1));
    // Epsilon plays 8 mpg, below the 10 mpg threshold.
    assert!(similar.players.iter().all(|p| p.player_id != 5));
    for p in &similar.players {
        assert!(p.similarity_score > 0.0 && p.similarity_score <= 1.0);
    }
    for pair in similar.players.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
    // The other high-usage guard is the closest match.
    assert_eq!(similar.players[0].player_id, 2);
}

#[test]
fn explicit_season_uses_that_seasons_rows() {
    let (pipeline, store) = fixture_pipeline();
    let report = pipeline.player_report(1, Some("2023-24")).unwrap();
    assert_eq!(report.profile.season, "2023-24");
    assert_eq!(report.profile.get(StatKey::Points), Some(24.0));
    // Nobody else played in 2023-24 in the fixtures.
    assert!(report.similar.players.is_empty());

    // Grades are still scored against the reference (2024-25) distribution.
    assert_eq!(report.grades.source, GradeSource::Computed);
    assert_eq!(report.grades.grades.len(), 9);
    let reference = courtvision::rating::distribution::DISTRIBUTION_NAMESPACE;
    assert!(store.get(&format!("{reference}:2024-25")).unwrap().is_some());
    assert!(store.get(&format!("{reference}:2023-24")).unwrap().is_none());
}

#[test]
fn unknown_player_is_an_error() {
    let (pipeline, _) = fixture_pipeline();
    let err = pipeline.player_report(404, None).unwrap_err();
    assert!(matches!(err, ProviderError::PlayerNotFound { player_id: 404, .. }));
}

// ===========================================================================
// Degradation
// ===========================================================================

#[test]
fn player_without_career_totals_gets_zero_history() {
    let (pipeline, store) = fixture_pipeline();
    let report = pipeline.player_report(2, None).unwrap();
    assert_eq!(report.historical.years_played, 0);
    assert_eq!(report.historical.achievement_value, 0.0);
    assert_eq!(report.blended.historical_component, 0.0);
    // Only the distribution is cached; the failed history is not.
    assert_eq!(store.len(), 1);
}

#[test]
fn missing_history_files_degrade_to_zero_profile() {
    let mut paths = fixture_paths();
    paths.career_seasons = fixture("does_not_exist.csv");
    paths.playoff_totals = None;
    let config = inline_config(paths);
    let source = Arc::new(CsvSource::from_paths(&config.data_paths));
    let pipeline = RatingPipeline::new(source.clone(), source, Arc::new(MemoryCache::new()), &config);

    let report = pipeline.player_report(1, None).unwrap();
    assert_eq!(report.historical, courtvision::rating::historical::HistoricalProfile::zero());
    assert_eq!(report.grades.grades.len(), 9);
}

#[test]
fn missing_playoff_file_keeps_career_history() {
    let mut paths = fixture_paths();
    paths.playoff_totals = Some(fixture("no_playoffs.csv"));
    let config = inline_config(paths);
    let source = Arc::new(CsvSource::from_paths(&config.data_paths));
    let pipeline = RatingPipeline::new(source.clone(), source, Arc::new(MemoryCache::new()), &config);

    let h = pipeline.player_report(1, None).unwrap().historical;
    assert_eq!(h.years_played, 8);
    assert!(approx_eq(h.achievement_value, 41.0, 1e-12));
    assert!(approx_eq(h.career_win_share_bonus, 30.0, 1e-12));
    assert!(approx_eq(h.career_value_bonus, 25.0, 1e-12));
    assert_eq!(h.playoff_bonus, 0.0);
}

#[test]
fn missing_per100_file_still_builds_report() {
    let mut paths = fixture_paths();
    paths.league_per100 = fixture("no_per100.csv");
    let config = inline_config(paths);
    let source = Arc::new(CsvSource::from_paths(&config.data_paths));
    let pipeline = RatingPipeline::new(source.clone(), source, Arc::new(MemoryCache::new()), &config);

    let report = pipeline.player_report(1, None).unwrap();
    assert_eq!(report.profile.get(StatKey::Points), Some(27.5));
    assert_eq!(report.profile.get(StatKey::ImpactEstimate), Some(0.185));
    assert_eq!(report.profile.get(StatKey::PointsPer100), None);
    assert_eq!(report.profile.get(StatKey::TrueShotAttemptsPer100), None);
    assert_eq!(report.grades.grades.len(), 9);
    assert!(!report.similar.players.is_empty());
}

#[test]
fn missing_career_metrics_give_zero_bonus() {
    let (pipeline, _) = fixture_pipeline();
    let h = pipeline.player_report(3, None).unwrap().historical;
    assert_eq!(h.years_played, 3);
    // Career TS% of 0.611 saturates the efficiency bonus.
    assert_eq!(h.career_efficiency_bonus, 100.0);
    assert_eq!(h.career_win_share_bonus, 0.0);
    assert_eq!(h.career_value_bonus, 0.0);
    // No playoff row, and the one award is not in the points table.
    assert_eq!(h.playoff_bonus, 0.0);
    assert_eq!(h.achievement_value, 0.0);
}

// ===========================================================================
// Caching
// ===========================================================================

#[test]
fn reports_share_cached_distribution_and_history() {
    let (pipeline, store) = fixture_pipeline();
    pipeline.player_report(1, None).unwrap();
    pipeline.player_report(3, None).unwrap();
    // One distribution plus two historical profiles.
    assert_eq!(store.len(), 3);
}

#[test]
fn historical_profile_is_fetched_once_within_ttl() {
    let config = inline_config(fixture_paths());
    let stats = Arc::new(CsvSource::from_paths(&config.data_paths));
    let history = Arc::new(CountingHistory {
        inner: CsvSource::from_paths(&config.data_paths),
        calls: AtomicUsize::new(0),
    });
    let store = Arc::new(SqliteCache::open(":memory:").unwrap());
    let pipeline = RatingPipeline::new(stats, history.clone(), store, &config);

    let first = pipeline.player_report(1, None).unwrap();
    let second = pipeline.player_report(1, None).unwrap();
    assert_eq!(first.historical, second.historical);
    assert_eq!(history.calls.load(Ordering::SeqCst), 1);
}
