// Career history: longevity, awards, career efficiency and playoff bonuses.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheStore, TtlCache};
use crate::provider::{
    AwardRecord, CareerSeason, CareerTotals, HistoricalProvider, PlayoffTotals, ProviderError,
};
use crate::stats::PlayerId;

/// Cache namespace for historical profiles.
pub const HISTORICAL_NAMESPACE: &str = "historical_profile";

pub const MAX_ACHIEVEMENT_VALUE: f64 = 200.0;
pub const MAX_CAREER_BONUS: f64 = 100.0;
pub const MAX_PLAYOFF_BONUS: f64 = 100.0;
/// Each of the two playoff terms (games, scoring) is capped separately.
pub const MAX_PLAYOFF_PART: f64 = 50.0;

/// Award name → point value. Matching tries every name exactly first, then
/// by substring in table order, so more specific names come first.
pub const AWARD_POINTS: &[(&str, f64)] = &[
    ("Finals Most Valuable Player", 40.0),
    ("Finals MVP", 40.0),
    ("All-Star", 8.0),
    ("Most Valuable Player", 50.0),
    ("MVP", 50.0),
    ("Defensive Player of the Year", 25.0),
    ("Rookie of the Year", 10.0),
    ("Sixth Man of the Year", 8.0),
    ("Most Improved Player", 6.0),
    ("All-NBA First Team", 20.0),
    ("All-NBA Second Team", 15.0),
    ("All-NBA Third Team", 10.0),
    ("All-Defensive First Team", 10.0),
    ("All-Defensive Second Team", 6.0),
    ("NBA Champion", 25.0),
];

/// A player's career, reduced to bounded bonus terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalProfile {
    pub years_played: u32,
    pub achievement_value: f64,
    pub career_efficiency_bonus: f64,
    pub career_win_share_bonus: f64,
    pub career_value_bonus: f64,
    pub playoff_bonus: f64,
}

impl HistoricalProfile {
    /// The profile used when history could not be fetched.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Mean of the three career-stat bonuses.
    pub fn career_stat_bonus(&self) -> f64 {
        (self.career_efficiency_bonus + self.career_win_share_bonus + self.career_value_bonus) / 3.0
    }
}

// ---------------------------------------------------------------------------
// Bonus transforms
// ---------------------------------------------------------------------------

/// Points for one award description; 0.0 if nothing in the table matches.
pub fn award_points(description: &str) -> f64 {
    let needle = description.trim().to_lowercase();
    if needle.is_empty() {
        return 0.0;
    }
    if let Some((_, points)) = AWARD_POINTS
        .iter()
        .find(|(name, _)| name.to_lowercase() == needle)
    {
        return *points;
    }
    AWARD_POINTS
        .iter()
        .find(|(name, _)| needle.contains(&name.to_lowercase()))
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}

/// Sum of award points, capped at [`MAX_ACHIEVEMENT_VALUE`].
pub fn achievement_value(awards: &[AwardRecord]) -> f64 {
    let total: f64 = awards.iter().map(|a| award_points(&a.description)).sum();
    total.min(MAX_ACHIEVEMENT_VALUE)
}

/// `(TS% − 0.50) × 1000`, clamped to `[0, 100]`.
pub fn efficiency_bonus(totals: &CareerTotals) -> f64 {
    totals
        .true_shooting_pct()
        .map(|ts| ((ts - 0.50) * 1000.0).clamp(0.0, MAX_CAREER_BONUS))
        .unwrap_or(0.0)
}

/// `win shares × 0.5`, clamped to `[0, 100]`.
pub fn win_share_bonus(totals: &CareerTotals) -> f64 {
    totals
        .win_shares
        .map(|ws| (ws * 0.5).clamp(0.0, MAX_CAREER_BONUS))
        .unwrap_or(0.0)
}

/// `VORP × 1.0`, clamped to `[0, 100]`.
pub fn value_bonus(totals: &CareerTotals) -> f64 {
    totals
        .value_over_replacement
        .map(|vorp| vorp.clamp(0.0, MAX_CAREER_BONUS))
        .unwrap_or(0.0)
}

/// Games term (`games × 0.5`, ≤ 50) plus scoring term (`PPG × 2`, ≤ 50),
/// capped at [`MAX_PLAYOFF_BONUS`].
pub fn playoff_bonus(playoffs: Option<&PlayoffTotals>) -> f64 {
    let Some(playoffs) = playoffs else {
        return 0.0;
    };
    let games = (playoffs.games_played as f64 * 0.5).min(MAX_PLAYOFF_PART);
    let scoring = (playoffs.points_per_game() * 2.0).clamp(0.0, MAX_PLAYOFF_PART);
    (games + scoring).min(MAX_PLAYOFF_BONUS)
}

/// Aggregate already-fetched career tables into a profile.
pub fn profile_from_history(
    seasons: &[CareerSeason],
    totals: &CareerTotals,
    playoffs: Option<&PlayoffTotals>,
    awards: &[AwardRecord],
) -> HistoricalProfile {
    let distinct_seasons: HashSet<&str> = seasons.iter().map(|s| s.season_id.as_str()).collect();
    HistoricalProfile {
        years_played: distinct_seasons.len() as u32,
        achievement_value: achievement_value(awards),
        career_efficiency_bonus: efficiency_bonus(totals),
        career_win_share_bonus: win_share_bonus(totals),
        career_value_bonus: value_bonus(totals),
        playoff_bonus: playoff_bonus(playoffs),
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Cache-backed historical profile lookups, keyed by player id.
pub struct HistoricalProfileBuilder {
    provider: Arc<dyn HistoricalProvider>,
    cache: TtlCache,
}

impl HistoricalProfileBuilder {
    pub fn new(
        provider: Arc<dyn HistoricalProvider>,
        store: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(store, HISTORICAL_NAMESPACE, ttl),
        }
    }

    /// The player's historical profile.
    ///
    /// Any provider failure yields [`HistoricalProfile::zero`]: history is a
    /// bonus on top of the current rating, not a required input. Zero
    /// profiles from failures are not cached.
    pub fn build_profile(&self, player_id: PlayerId) -> HistoricalProfile {
        match self
            .cache
            .get_or_refresh(&player_id.to_string(), || self.fetch(player_id))
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!("historical data for player {} unavailable, using zero profile: {}", player_id, e);
                HistoricalProfile::zero()
            }
        }
    }

    fn fetch(&self, player_id: PlayerId) -> Result<HistoricalProfile, ProviderError> {
        let seasons = self.provider.career_seasons(player_id)?;
        let totals = self.provider.career_totals(player_id)?;
        // Playoff history is optional; a failed lookup only drops the playoff bonus.
        let playoffs = match self.provider.playoff_totals(player_id) {
            Ok(playoffs) => playoffs,
            Err(e) => {
                warn!("playoff totals for player {} unavailable: {}", player_id, e);
                None
            }
        };
        let awards = self.provider.awards(player_id)?;
        let profile = profile_from_history(&seasons, &totals, playoffs.as_ref(), &awards);
        debug!("built historical profile for player {}: {:?}", player_id, profile);
        Ok(profile)
    }
}
