// Statistical similarity between players: weighted, z-score normalized
// Euclidean distance over a fixed metric list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rating::composite::{calculate_rating, CompositeRating};
use crate::stats::{BoxScoreProfile, PlayerId, StatKey};

/// A similarity metric: a raw stat or one of the composite rating outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    Stat(StatKey),
    TotalRating,
    OffensiveComponent,
    DefensiveComponent,
}

pub const SIMILARITY_METRICS: [(SimilarityMetric, f64); 14] = [
    (SimilarityMetric::Stat(StatKey::ImpactEstimate), 3.0),
    (SimilarityMetric::Stat(StatKey::UsagePct), 2.0),
    (SimilarityMetric::Stat(StatKey::TrueShootingPct), 2.0),
    (SimilarityMetric::Stat(StatKey::AssistPct), 1.5),
    (SimilarityMetric::Stat(StatKey::ReboundPct), 1.5),
    (SimilarityMetric::TotalRating, 3.0),
    (SimilarityMetric::OffensiveComponent, 2.0),
    (SimilarityMetric::DefensiveComponent, 2.0),
    (SimilarityMetric::Stat(StatKey::Points), 1.5),
    (SimilarityMetric::Stat(StatKey::Rebounds), 1.0),
    (SimilarityMetric::Stat(StatKey::Assists), 1.0),
    (SimilarityMetric::Stat(StatKey::Steals), 0.5),
    (SimilarityMetric::Stat(StatKey::FieldGoalPct), 0.75),
    (SimilarityMetric::Stat(StatKey::ThreePointPct), 0.75),
];

/// A pool member: profile plus its composite rating.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMetrics {
    pub profile: BoxScoreProfile,
    pub rating: CompositeRating,
}

impl PlayerMetrics {
    pub fn from_profile(profile: BoxScoreProfile) -> Self {
        let rating = calculate_rating(&profile, profile.position_category());
        Self { profile, rating }
    }

    pub fn player_id(&self) -> PlayerId {
        self.profile.player_id
    }

    pub fn metric(&self, metric: SimilarityMetric) -> Option<f64> {
        let value = match metric {
            SimilarityMetric::Stat(key) => self.profile.get(key)?,
            SimilarityMetric::TotalRating => self.rating.total_rating,
            SimilarityMetric::OffensiveComponent => self.rating.offensive_rating,
            SimilarityMetric::DefensiveComponent => self.rating.defensive_rating,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityOptions {
    pub top_k: usize,
    pub min_minutes_per_game: f64,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_minutes_per_game: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPlayer {
    pub player_id: PlayerId,
    pub player_name: String,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub target_player_id: PlayerId,
    /// Non-increasing by score.
    pub players: Vec<SimilarPlayer>,
}

impl SimilarityResult {
    pub fn empty(target_player_id: PlayerId) -> Self {
        Self {
            target_player_id,
            players: Vec::new(),
        }
    }
}

/// Population standard deviation of each metric across the whole pool.
/// `None` when no pool member has the metric.
fn metric_std_devs(pool: &[PlayerMetrics]) -> Vec<Option<f64>> {
    SIMILARITY_METRICS
        .iter()
        .map(|&(metric, _)| {
            let values: Vec<f64> = pool.iter().filter_map(|p| p.metric(metric)).collect();
            if values.is_empty() {
                return None;
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            Some(variance.sqrt())
        })
        .collect()
}

/// Weighted normalized distance, or `None` when no metric was usable.
fn distance(target: &PlayerMetrics, candidate: &PlayerMetrics, std_devs: &[Option<f64>]) -> Option<f64> {
    let mut weighted_sq = 0.0;
    let mut weight_used = 0.0;

    for (&(metric, weight), sigma) in SIMILARITY_METRICS.iter().zip(std_devs.iter().copied()) {
        let Some(sigma) = sigma.filter(|s| *s > 0.0) else {
            continue;
        };
        let (Some(t), Some(c)) = (target.metric(metric), candidate.metric(metric)) else {
            continue;
        };
        let z = (t - c) / sigma;
        weighted_sq += weight * z * z;
        weight_used += weight;
    }

    (weight_used > 0.0).then(|| (weighted_sq / weight_used).sqrt())
}

/// The `top_k` players in `pool` most similar to `target_player_id`.
///
/// Candidates below the minutes threshold, or with no metric in common with
/// the target, are skipped. An unknown target yields an empty result.
pub fn find_similar(
    target_player_id: PlayerId,
    pool: &[PlayerMetrics],
    options: &SimilarityOptions,
) -> SimilarityResult {
    let Some(target) = pool.iter().find(|p| p.player_id() == target_player_id) else {
        debug!("similarity target {} not in league pool", target_player_id);
        return SimilarityResult::empty(target_player_id);
    };

    let std_devs = metric_std_devs(pool);

    let mut players: Vec<SimilarPlayer> = pool
        .iter()
        .filter(|c| c.player_id() != target_player_id)
        .filter(|c| {
            c.profile
                .minutes_per_game()
                .is_some_and(|mpg| mpg >= options.min_minutes_per_game)
        })
        .filter_map(|c| {
            let d = distance(target, c, &std_devs)?;
            Some(SimilarPlayer {
                player_id: c.player_id(),
                player_name: c.profile.player_name.clone(),
                similarity_score: 1.0 / (1.0 + d),
            })
        })
        .collect();

    players.sort_by(|a, b| {
        b.similarity_score
            .total_cmp(&a.similarity_score)
            .then(a.player_id.cmp(&b.player_id))
    });
    players.truncate(options.top_k);

    SimilarityResult {
        target_player_id,
        players,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn player(id: PlayerId, mpg: f64, pts: f64, ast: f64, reb: f64) -> PlayerMetrics {
        PlayerMetrics::from_profile(
            BoxScoreProfile::new(id, &format!("Player {id}"), "2024-25")
                .with_stat(StatKey::Minutes, mpg)
                .with_stat(StatKey::Points, pts)
                .with_stat(StatKey::Assists, ast)
                .with_stat(StatKey::Rebounds, reb),
        )
    }

    fn pool() -> Vec<PlayerMetrics> {
        vec![
            player(1, 34.0, 25.0, 7.0, 5.0),
            player(2, 33.0, 24.0, 6.5, 5.5),
            player(3, 30.0, 12.0, 2.0, 11.0),
            player(4, 28.0, 8.0, 1.0, 3.0),
            player(5, 6.0, 25.0, 7.0, 5.0),
        ]
    }

    #[test]
    fn identical_profiles_score_one() {
        let mut pool = pool();
        let mut twin = pool[0].clone();
        twin.profile.player_id = 9;
        pool.push(twin);
        let result = find_similar(1, &pool, &SimilarityOptions::default());
        assert_eq!(result.players[0].player_id, 9);
        assert_eq!(result.players[0].similarity_score, 1.0);
    }

    #[test]
    fn scores_in_range_and_non_increasing() {
        let result = find_similar(1, &pool(), &SimilarityOptions::default());
        assert!(!result.players.is_empty());
        for p in &result.players {
            assert!(p.similarity_score > 0.0 && p.similarity_score <= 1.0);
        }
        for pair in result.players.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
        assert_eq!(result.players[0].player_id, 2);
    }

    #[test]
    fn target_excluded_and_minutes_filtered() {
        let result = find_similar(1, &pool(), &SimilarityOptions::default());
        assert!(result.players.iter().all(|p| p.player_id != 1));
        // Player 5 mirrors the target but plays 6 mpg.
        assert!(result.players.iter().all(|p| p.player_id != 5));
        assert_eq!(result.players.len(), 3);
    }

    #[test]
    fn truncates_to_top_k() {
        let options = SimilarityOptions {
            top_k: 2,
            ..Default::default()
        };
        let result = find_similar(1, &pool(), &options);
        assert_eq!(result.players.len(), 2);
    }

    #[test]
    fn unknown_target_is_empty() {
        let result = find_similar(404, &pool(), &SimilarityOptions::default());
        assert_eq!(result, SimilarityResult::empty(404));
    }

    #[test]
    fn ties_break_by_player_id() {
        let pool = vec![
            player(1, 30.0, 20.0, 5.0, 5.0),
            player(8, 30.0, 10.0, 5.0, 5.0),
            player(3, 30.0, 10.0, 5.0, 5.0),
        ];
        let result = find_similar(1, &pool, &SimilarityOptions::default());
        let ids: Vec<_> = result.players.iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![3, 8]);
    }

    #[test]
    fn zero_deviation_metric_is_skipped() {
        // Assists and rebounds identical across the pool; only points (and
        // the composite terms driven by minutes) vary.
        let pool = vec![
            player(1, 30.0, 20.0, 5.0, 5.0),
            player(2, 30.0, 10.0, 5.0, 5.0),
        ];
        let std_devs = metric_std_devs(&pool);
        let idx = SIMILARITY_METRICS
            .iter()
            .position(|(m, _)| *m == SimilarityMetric::Stat(StatKey::Assists))
            .unwrap();
        assert_eq!(std_devs[idx], Some(0.0));

        // Points differ by 2σ (σ = 5); composite components are equal.
        let d = distance(&pool[0], &pool[1], &std_devs).unwrap();
        assert!(approx_eq(d, 2.0, 1e-12));
        let result = find_similar(1, &pool, &SimilarityOptions::default());
        assert!(approx_eq(result.players[0].similarity_score, 1.0 / 3.0, 1e-12));
    }

    #[test]
    fn no_common_metric_excludes_candidate() {
        let a = PlayerMetrics {
            profile: BoxScoreProfile::new(1, "A", "2024-25")
                .with_stat(StatKey::Minutes, 30.0)
                .with_stat(StatKey::Points, 20.0),
            rating: CompositeRating {
                offensive_rating: f64::NAN,
                defensive_rating: f64::NAN,
                total_rating: f64::NAN,
                replacement_value: 0.0,
            },
        };
        let mut b = a.clone();
        b.profile = BoxScoreProfile::new(2, "B", "2024-25")
            .with_stat(StatKey::Minutes, 30.0)
            .with_stat(StatKey::Assists, 4.0);
        let result = find_similar(1, &[a, b], &SimilarityOptions::default());
        assert!(result.players.is_empty());
    }
}
