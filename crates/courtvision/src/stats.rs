// Box-score data model: stat keys, per-player-season profiles, positions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Provider-assigned player identity.
pub type PlayerId = u64;

// ---------------------------------------------------------------------------
// Stat keys
// ---------------------------------------------------------------------------

/// Every statistic the pipeline knows how to consume.
///
/// Per-game stats come from the basic table, rates from the advanced table,
/// and the `*Per100` / on-off terms from the per-100-possessions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Minutes,
    Points,
    Rebounds,
    OffensiveRebounds,
    DefensiveRebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    Fouls,
    FreeThrowAttempts,
    FieldGoalPct,
    ThreePointPct,
    FreeThrowPct,
    TrueShootingPct,
    UsagePct,
    AssistPct,
    ReboundPct,
    OffensiveRating,
    DefensiveRating,
    NetRating,
    Pace,
    ImpactEstimate,
    AssistToTurnover,
    PointsPer100,
    AssistsPer100,
    TurnoversPer100,
    ReboundsPer100,
    StealsPer100,
    BlocksPer100,
    FoulsPer100,
    TrueShotAttemptsPer100,
    OnOffDiff,
    OnCourtNet,
}

/// Which provider table a column came from. The per-100 table reuses the
/// basic column names, so the same header maps to a different key there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Basic,
    Advanced,
    Per100,
}

impl TableKind {
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Basic => "basic",
            TableKind::Advanced => "advanced",
            TableKind::Per100 => "per100",
        }
    }
}

impl StatKey {
    /// Map a provider column header to a stat key for the given table.
    /// Returns `None` for columns the pipeline does not use.
    pub fn from_column(table: TableKind, column: &str) -> Option<Self> {
        let column = column.trim().to_uppercase();
        match table {
            TableKind::Basic => match column.as_str() {
                "MIN" => Some(StatKey::Minutes),
                "PTS" => Some(StatKey::Points),
                "REB" => Some(StatKey::Rebounds),
                "OREB" => Some(StatKey::OffensiveRebounds),
                "DREB" => Some(StatKey::DefensiveRebounds),
                "AST" => Some(StatKey::Assists),
                "STL" => Some(StatKey::Steals),
                "BLK" => Some(StatKey::Blocks),
                "TOV" => Some(StatKey::Turnovers),
                "PF" => Some(StatKey::Fouls),
                "FTA" => Some(StatKey::FreeThrowAttempts),
                "FG_PCT" => Some(StatKey::FieldGoalPct),
                "FG3_PCT" => Some(StatKey::ThreePointPct),
                "FT_PCT" => Some(StatKey::FreeThrowPct),
                _ => None,
            },
            TableKind::Advanced => match column.as_str() {
                "TS_PCT" => Some(StatKey::TrueShootingPct),
                "USG_PCT" => Some(StatKey::UsagePct),
                "AST_PCT" => Some(StatKey::AssistPct),
                "REB_PCT" => Some(StatKey::ReboundPct),
                "OFF_RATING" => Some(StatKey::OffensiveRating),
                "DEF_RATING" => Some(StatKey::DefensiveRating),
                "NET_RATING" => Some(StatKey::NetRating),
                "PACE" => Some(StatKey::Pace),
                "PIE" => Some(StatKey::ImpactEstimate),
                "AST_TO" => Some(StatKey::AssistToTurnover),
                _ => None,
            },
            TableKind::Per100 => match column.as_str() {
                "PTS" => Some(StatKey::PointsPer100),
                "AST" => Some(StatKey::AssistsPer100),
                "TOV" => Some(StatKey::TurnoversPer100),
                "REB" => Some(StatKey::ReboundsPer100),
                "STL" => Some(StatKey::StealsPer100),
                "BLK" => Some(StatKey::BlocksPer100),
                "PF" => Some(StatKey::FoulsPer100),
                "TSA" => Some(StatKey::TrueShotAttemptsPer100),
                "ON_OFF_DIFF" => Some(StatKey::OnOffDiff),
                "ON_COURT_NET" => Some(StatKey::OnCourtNet),
                _ => None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// One player's statistics for one season.
///
/// Stats the provider did not supply are absent from `stats`; they are never
/// zero-filled, so every consumer can tell "missing" from "zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreProfile {
    pub player_id: PlayerId,
    pub player_name: String,
    pub season: String,
    /// Raw provider position string, e.g. "Guard-Forward".
    pub position: String,
    pub games_played: u32,
    pub stats: BTreeMap<StatKey, f64>,
}

impl BoxScoreProfile {
    pub fn new(player_id: PlayerId, player_name: &str, season: &str) -> Self {
        Self {
            player_id,
            player_name: player_name.to_string(),
            season: season.to_string(),
            position: String::new(),
            games_played: 0,
            stats: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: StatKey) -> Option<f64> {
        self.stats.get(&key).copied()
    }

    pub fn set(&mut self, key: StatKey, value: f64) {
        self.stats.insert(key, value);
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with_stat(mut self, key: StatKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn minutes_per_game(&self) -> Option<f64> {
        self.get(StatKey::Minutes)
    }

    pub fn position_category(&self) -> PositionCategory {
        PositionCategory::from_raw(&self.position)
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Canonical single position used for the rating model's positional offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionCategory {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl PositionCategory {
    /// Resolve a raw provider position string.
    ///
    /// Handles abbreviations ("PG", "G-F"), full names ("Point Guard") and
    /// the provider's keyword forms ("Guard", "Forward-Center"). For
    /// hyphenated dual positions the first part is primary and the second
    /// part picks the closer neighbour. Unrecognized strings fall back to SF,
    /// whose positional offsets are zero.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "PG" | "POINT GUARD" => return PositionCategory::PG,
            "SG" | "SHOOTING GUARD" => return PositionCategory::SG,
            "SF" | "SMALL FORWARD" => return PositionCategory::SF,
            "PF" | "POWER FORWARD" => return PositionCategory::PF,
            "C" | "CENTER" | "CENTRE" => return PositionCategory::C,
            _ => {}
        }

        let mut parts = normalized.split('-').map(str::trim);
        let primary = parts.next().map(keyword_of).unwrap_or(None);
        let secondary = parts.next().map(keyword_of).unwrap_or(None);

        match (primary, secondary) {
            (Some(Keyword::Guard), Some(Keyword::Forward)) => PositionCategory::SG,
            (Some(Keyword::Guard), _) => PositionCategory::PG,
            (Some(Keyword::Forward), Some(Keyword::Center)) => PositionCategory::PF,
            (Some(Keyword::Forward), _) => PositionCategory::SF,
            (Some(Keyword::Center), _) => PositionCategory::C,
            (None, _) => PositionCategory::SF,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            PositionCategory::PG => "PG",
            PositionCategory::SG => "SG",
            PositionCategory::SF => "SF",
            PositionCategory::PF => "PF",
            PositionCategory::C => "C",
        }
    }
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

enum Keyword {
    Guard,
    Forward,
    Center,
}

fn keyword_of(part: &str) -> Option<Keyword> {
    if part.contains("GUARD") || part == "G" {
        Some(Keyword::Guard)
    } else if part.contains("FORWARD") || part == "F" {
        Some(Keyword::Forward)
    } else if part.contains("CENTER") || part.contains("CENTRE") || part == "C" {
        Some(Keyword::Center)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_keywords_resolve() {
        assert_eq!(PositionCategory::from_raw("Guard"), PositionCategory::PG);
        assert_eq!(PositionCategory::from_raw("Forward"), PositionCategory::SF);
        assert_eq!(PositionCategory::from_raw("Center"), PositionCategory::C);
    }

    #[test]
    fn hyphenated_positions_resolve_to_single_category() {
        assert_eq!(PositionCategory::from_raw("Guard-Forward"), PositionCategory::SG);
        assert_eq!(PositionCategory::from_raw("Forward-Guard"), PositionCategory::SF);
        assert_eq!(PositionCategory::from_raw("Forward-Center"), PositionCategory::PF);
        assert_eq!(PositionCategory::from_raw("Center-Forward"), PositionCategory::C);
        assert_eq!(PositionCategory::from_raw("G-F"), PositionCategory::SG);
        assert_eq!(PositionCategory::from_raw("F-C"), PositionCategory::PF);
    }

    #[test]
    fn abbreviations_and_full_names() {
        assert_eq!(PositionCategory::from_raw("pg"), PositionCategory::PG);
        assert_eq!(PositionCategory::from_raw("Shooting Guard"), PositionCategory::SG);
        assert_eq!(PositionCategory::from_raw(" Power Forward "), PositionCategory::PF);
        assert_eq!(PositionCategory::from_raw("C"), PositionCategory::C);
    }

    #[test]
    fn unknown_position_falls_back_to_small_forward() {
        assert_eq!(PositionCategory::from_raw(""), PositionCategory::SF);
        assert_eq!(PositionCategory::from_raw("Coach"), PositionCategory::SF);
    }

    #[test]
    fn column_mapping_depends_on_table() {
        assert_eq!(StatKey::from_column(TableKind::Basic, "PTS"), Some(StatKey::Points));
        assert_eq!(
            StatKey::from_column(TableKind::Per100, "PTS"),
            Some(StatKey::PointsPer100)
        );
        assert_eq!(StatKey::from_column(TableKind::Advanced, "pie"), Some(StatKey::ImpactEstimate));
        assert_eq!(StatKey::from_column(TableKind::Basic, "PLAYER_NAME"), None);
    }

    #[test]
    fn missing_stat_is_none_not_zero() {
        let profile = BoxScoreProfile::new(1, "Test", "2024-25").with_stat(StatKey::Points, 0.0);
        assert_eq!(profile.get(StatKey::Points), Some(0.0));
        assert_eq!(profile.get(StatKey::Assists), None);
    }

    #[test]
    fn stat_keys_serialize_as_snake_case_map_keys() {
        let profile = BoxScoreProfile::new(7, "Test", "2024-25").with_stat(StatKey::TrueShootingPct, 0.6);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["stats"]["true_shooting_pct"], 0.6);
    }
}
