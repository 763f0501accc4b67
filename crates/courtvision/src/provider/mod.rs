// Data the pipeline consumes from the statistics and historical providers.
//
// The providers themselves are external; these traits are the seams the
// pipeline is written against. `csv` holds a file-backed implementation.

pub mod csv;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::stats::{BoxScoreProfile, PlayerId, StatKey, TableKind};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: ::csv::Error },

    #[error("player {player_id} not found for season {season}")]
    PlayerNotFound { player_id: PlayerId, season: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Statistics provider
// ---------------------------------------------------------------------------

/// One row of a league-wide table, already mapped to stat keys.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Option<String>,
    pub games_played: Option<u32>,
    pub stats: BTreeMap<StatKey, f64>,
}

/// Box-score tables for a player or the whole league.
pub trait StatsProvider: Send + Sync {
    /// The merged (basic + advanced + per-100) profile for one player-season.
    fn player_profile(
        &self,
        player_id: PlayerId,
        season: &str,
    ) -> Result<BoxScoreProfile, ProviderError>;

    /// A league-wide table for the season.
    fn league_table(&self, season: &str, table: TableKind) -> Result<Vec<StatRow>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Historical provider
// ---------------------------------------------------------------------------

/// One row of a player's season-by-season career table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerSeason {
    pub season_id: String,
    pub team: String,
    pub games_played: u32,
}

/// Regular-season career totals. Win shares and VORP come from a different
/// upstream table and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerTotals {
    pub games_played: u32,
    pub points: f64,
    pub field_goal_attempts: f64,
    pub free_throw_attempts: f64,
    pub win_shares: Option<f64>,
    pub value_over_replacement: Option<f64>,
}

impl CareerTotals {
    /// Career true-shooting percentage, `None` without any shot attempts.
    pub fn true_shooting_pct(&self) -> Option<f64> {
        let attempts = 2.0 * (self.field_goal_attempts + 0.44 * self.free_throw_attempts);
        if attempts <= 0.0 {
            return None;
        }
        Some(self.points / attempts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayoffTotals {
    pub games_played: u32,
    pub points: f64,
}

impl PlayoffTotals {
    pub fn points_per_game(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.points / self.games_played as f64
    }
}

/// A single award or honour. `description` is free text such as
/// "All-NBA Second Team" or "NBA Finals Most Valuable Player".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub description: String,
    pub season: Option<String>,
}

/// Career history tables for a single player.
pub trait HistoricalProvider: Send + Sync {
    fn career_seasons(&self, player_id: PlayerId) -> Result<Vec<CareerSeason>, ProviderError>;

    fn career_totals(&self, player_id: PlayerId) -> Result<CareerTotals, ProviderError>;

    /// `Ok(None)` when the player never reached the playoffs.
    fn playoff_totals(&self, player_id: PlayerId) -> Result<Option<PlayoffTotals>, ProviderError>;

    fn awards(&self, player_id: PlayerId) -> Result<Vec<AwardRecord>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Table merging
// ---------------------------------------------------------------------------

/// Merge league tables keyed by player id into per-player profiles.
///
/// The first table defines membership and order; later tables only add stats
/// (and fill in position / games played when the first table lacked them) for
/// players already present. Rows for unknown players are dropped.
pub fn merge_tables(season: &str, tables: Vec<Vec<StatRow>>) -> Vec<BoxScoreProfile> {
    let mut tables = tables.into_iter();
    let Some(base) = tables.next() else {
        return Vec::new();
    };

    let mut profiles: Vec<BoxScoreProfile> = Vec::with_capacity(base.len());
    let mut index: HashMap<PlayerId, usize> = HashMap::with_capacity(base.len());

    for row in base {
        if index.contains_key(&row.player_id) {
            continue;
        }
        index.insert(row.player_id, profiles.len());
        profiles.push(profile_from_row(season, row));
    }

    for table in tables {
        for row in table {
            let Some(&i) = index.get(&row.player_id) else {
                continue;
            };
            let profile = &mut profiles[i];
            if profile.position.is_empty() {
                if let Some(position) = row.position {
                    profile.position = position;
                }
            }
            if profile.games_played == 0 {
                if let Some(gp) = row.games_played {
                    profile.games_played = gp;
                }
            }
            profile.stats.extend(row.stats);
        }
    }

    profiles
}

fn profile_from_row(season: &str, row: StatRow) -> BoxScoreProfile {
    BoxScoreProfile {
        player_id: row.player_id,
        player_name: row.player_name,
        season: season.to_string(),
        position: row.position.unwrap_or_default(),
        games_played: row.games_played.unwrap_or(0),
        stats: row.stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: PlayerId, stats: &[(StatKey, f64)]) -> StatRow {
        StatRow {
            player_id: id,
            player_name: format!("Player {id}"),
            position: None,
            games_played: Some(60),
            stats: stats.iter().copied().collect(),
        }
    }

    #[test]
    fn merge_combines_stats_by_player_id() {
        let basic = vec![row(1, &[(StatKey::Points, 20.0)]), row(2, &[(StatKey::Points, 10.0)])];
        let advanced = vec![
            row(2, &[(StatKey::TrueShootingPct, 0.55)]),
            row(1, &[(StatKey::TrueShootingPct, 0.62)]),
        ];
        let merged = merge_tables("2024-25", vec![basic, advanced]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].player_id, 1);
        assert_eq!(merged[0].get(StatKey::Points), Some(20.0));
        assert_eq!(merged[0].get(StatKey::TrueShootingPct), Some(0.62));
        assert_eq!(merged[1].get(StatKey::TrueShootingPct), Some(0.55));
        assert_eq!(merged[1].season, "2024-25");
    }

    #[test]
    fn merge_drops_rows_missing_from_base_table() {
        let basic = vec![row(1, &[(StatKey::Points, 20.0)])];
        let advanced = vec![row(99, &[(StatKey::TrueShootingPct, 0.5)])];
        let merged = merge_tables("2024-25", vec![basic, advanced]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get(StatKey::TrueShootingPct), None);
    }

    #[test]
    fn merge_fills_position_from_later_table() {
        let basic = vec![row(1, &[])];
        let mut adv = row(1, &[]);
        adv.position = Some("Center".into());
        let merged = merge_tables("2024-25", vec![basic, vec![adv]]);
        assert_eq!(merged[0].position, "Center");
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert!(merge_tables("2024-25", vec![]).is_empty());
    }

    #[test]
    fn career_true_shooting() {
        let totals = CareerTotals {
            points: 1000.0,
            field_goal_attempts: 800.0,
            free_throw_attempts: 250.0,
            ..Default::default()
        };
        // 1000 / (2 * (800 + 110)) = 0.5494...
        let ts = totals.true_shooting_pct().unwrap();
        assert!((ts - 1000.0 / 1820.0).abs() < 1e-12);
        assert_eq!(CareerTotals::default().true_shooting_pct(), None);
    }

    #[test]
    fn playoff_ppg_zero_games() {
        assert_eq!(PlayoffTotals::default().points_per_game(), 0.0);
    }
}
