// League-wide reference distributions for percentile grading.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{CacheStore, TtlCache};
use crate::provider::{merge_tables, ProviderError, StatRow, StatsProvider};
use crate::stats::{StatKey, TableKind};

/// Cache namespace for distributions.
pub const DISTRIBUTION_NAMESPACE: &str = "league_distribution";

/// Every stat's values across the qualifying players of one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueDistribution {
    pub season: String,
    pub values: BTreeMap<StatKey, Vec<f64>>,
}

impl LeagueDistribution {
    pub fn empty(season: &str) -> Self {
        Self {
            season: season.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Values for `key`; an empty slice when the stat was never collected.
    pub fn values(&self, key: StatKey) -> &[f64] {
        self.values.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(Vec::is_empty)
    }
}

/// Assists per turnover. Zero turnovers falls back to the assist value
/// itself rather than dividing by zero.
pub fn assist_to_turnover(assists: f64, turnovers: f64) -> f64 {
    if turnovers == 0.0 {
        assists
    } else {
        assists / turnovers
    }
}

/// Build a distribution from the basic and advanced league tables.
///
/// Players are merged by id (basic table defines membership) and kept only
/// if they played at least `min_games_played` games. Assist-to-turnover is
/// derived whenever both inputs are present and the advanced table did not
/// already supply it.
pub fn build_distribution(
    season: &str,
    basic: Vec<StatRow>,
    advanced: Vec<StatRow>,
    min_games_played: u32,
) -> LeagueDistribution {
    let mut distribution = LeagueDistribution::empty(season);

    for profile in merge_tables(season, vec![basic, advanced]) {
        if profile.games_played < min_games_played {
            continue;
        }
        for (&key, &value) in &profile.stats {
            distribution.values.entry(key).or_default().push(value);
        }
        if profile.get(StatKey::AssistToTurnover).is_none() {
            if let (Some(ast), Some(tov)) =
                (profile.get(StatKey::Assists), profile.get(StatKey::Turnovers))
            {
                distribution
                    .values
                    .entry(StatKey::AssistToTurnover)
                    .or_default()
                    .push(assist_to_turnover(ast, tov));
            }
        }
    }

    distribution
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Read-through cache of league distributions, one entry per season.
pub struct DistributionCache {
    provider: Arc<dyn StatsProvider>,
    cache: TtlCache,
    min_games_played: u32,
}

impl DistributionCache {
    pub fn new(
        provider: Arc<dyn StatsProvider>,
        store: Arc<dyn CacheStore>,
        ttl: Duration,
        min_games_played: u32,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(store, DISTRIBUTION_NAMESPACE, ttl),
            min_games_played,
        }
    }

    /// The league distribution for `season`.
    ///
    /// Served from cache while younger than the TTL, otherwise rebuilt from
    /// the provider. A provider failure yields an empty distribution (which
    /// makes every percentile neutral) and is not cached, so the next call
    /// retries.
    pub fn get_distribution(&self, season: &str) -> LeagueDistribution {
        match self.cache.get_or_refresh(season, || self.fetch(season)) {
            Ok(distribution) => distribution,
            Err(e) => {
                warn!("league distribution for {} unavailable, using neutral percentiles: {}", season, e);
                LeagueDistribution::empty(season)
            }
        }
    }

    fn fetch(&self, season: &str) -> Result<LeagueDistribution, ProviderError> {
        let basic = self.provider.league_table(season, TableKind::Basic)?;
        let advanced = self.provider.league_table(season, TableKind::Advanced)?;
        let distribution = build_distribution(season, basic, advanced, self.min_games_played);
        info!(
            "refreshed league distribution for {} ({} stats)",
            season,
            distribution.values.len()
        );
        Ok(distribution)
    }
}
