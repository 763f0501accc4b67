// Per-player report assembly: wires the providers and caches into the rating
// engine and collects every derived output for one player-season.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::{Config, SimilarityConfig};
use crate::provider::{merge_tables, HistoricalProvider, ProviderError, StatsProvider};
use crate::rating::blend::{blend, BlendVariant, BlendedRating, CurrentMetrics};
use crate::rating::composite::{calculate_rating, CompositeRating};
use crate::rating::distribution::DistributionCache;
use crate::rating::grades::{grade_skills, SkillGradeSet};
use crate::rating::historical::{HistoricalProfile, HistoricalProfileBuilder};
use crate::rating::similarity::{find_similar, PlayerMetrics, SimilarityOptions, SimilarityResult};
use crate::stats::{BoxScoreProfile, PlayerId, PositionCategory, TableKind};

impl From<&SimilarityConfig> for SimilarityOptions {
    fn from(config: &SimilarityConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_minutes_per_game: config.min_minutes_per_game,
        }
    }
}

/// Everything derived for one player-season.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub profile: BoxScoreProfile,
    pub position: PositionCategory,
    pub rating: CompositeRating,
    pub grades: SkillGradeSet,
    pub historical: HistoricalProfile,
    pub blended: BlendedRating,
    pub blended_with_playoffs: BlendedRating,
    pub similar: SimilarityResult,
}

pub struct RatingPipeline {
    stats: Arc<dyn StatsProvider>,
    distributions: DistributionCache,
    history: HistoricalProfileBuilder,
    reference_season: String,
    similarity: SimilarityOptions,
}

impl RatingPipeline {
    pub fn new(
        stats: Arc<dyn StatsProvider>,
        history: Arc<dyn HistoricalProvider>,
        store: Arc<dyn CacheStore>,
        config: &Config,
    ) -> Self {
        let distributions = DistributionCache::new(
            stats.clone(),
            store.clone(),
            Duration::hours(config.cache.distribution_ttl_hours),
            config.league.min_games_played,
        );
        let history = HistoricalProfileBuilder::new(
            history,
            store,
            Duration::days(config.cache.historical_ttl_days),
        );
        Self {
            stats,
            distributions,
            history,
            reference_season: config.league.reference_season.clone(),
            similarity: SimilarityOptions::from(&config.similarity),
        }
    }

    /// Every player of `season` with a composite rating, for similarity
    /// search. The basic table is required; advanced and per-100 tables only
    /// add stats and are skipped with a warning when unavailable.
    pub fn league_pool(&self, season: &str) -> Result<Vec<PlayerMetrics>, ProviderError> {
        let mut tables = vec![self.stats.league_table(season, TableKind::Basic)?];
        for table in [TableKind::Advanced, TableKind::Per100] {
            match self.stats.league_table(season, table) {
                Ok(rows) => tables.push(rows),
                Err(e) => warn!("{} table for {} unavailable: {}", table.label(), season, e),
            }
        }
        Ok(merge_tables(season, tables)
            .into_iter()
            .map(PlayerMetrics::from_profile)
            .collect())
    }

    /// Build the full report for a player. `season` defaults to the
    /// configured reference season.
    ///
    /// Skill grades are always scored against the reference season's league
    /// distribution, even when `season` names another year.
    ///
    /// Only a missing profile for the player is an error. Every other
    /// upstream failure degrades to neutral output inside its component.
    pub fn player_report(
        &self,
        player_id: PlayerId,
        season: Option<&str>,
    ) -> Result<PlayerReport, ProviderError> {
        let season = season.unwrap_or(&self.reference_season);
        let profile = self.stats.player_profile(player_id, season)?;
        let position = profile.position_category();
        info!(
            "building report for {} ({}, {}, {})",
            profile.player_name, player_id, season, position
        );

        let rating = calculate_rating(&profile, position);

        let distribution = self.distributions.get_distribution(&self.reference_season);
        let grades = grade_skills(&profile, &distribution);

        let historical = self.history.build_profile(player_id);
        let current = CurrentMetrics::from_profile(&profile, Some(&rating));
        let blended = blend(&current, &historical, BlendVariant::Standard);
        let blended_with_playoffs = blend(&current, &historical, BlendVariant::WithPlayoffs);

        let similar = self.similar_players(&profile, season);

        Ok(PlayerReport {
            profile,
            position,
            rating,
            grades,
            historical,
            blended,
            blended_with_playoffs,
            similar,
        })
    }

    fn similar_players(&self, profile: &BoxScoreProfile, season: &str) -> SimilarityResult {
        let mut pool = match self.league_pool(season) {
            Ok(pool) => pool,
            Err(e) => {
                warn!("league pool for {} unavailable, skipping similarity: {}", season, e);
                return SimilarityResult::empty(profile.player_id);
            }
        };
        if !pool.iter().any(|p| p.player_id() == profile.player_id) {
            pool.push(PlayerMetrics::from_profile(profile.clone()));
        }
        find_similar(profile.player_id, &pool, &self.similarity)
    }
}
