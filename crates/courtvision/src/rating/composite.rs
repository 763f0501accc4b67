// Composite offensive/defensive rating from a fixed linear box-score model,
// plus a wins-above-replacement style value.

use serde::{Deserialize, Serialize};

use crate::stats::{BoxScoreProfile, PositionCategory, StatKey};

// ---------------------------------------------------------------------------
// Coefficient tables
// ---------------------------------------------------------------------------

/// `rating = intercept + Σ weight · stat` over a fixed set of terms.
#[derive(Debug, Clone, Copy)]
pub struct LinearModel {
    pub intercept: f64,
    pub weights: &'static [(StatKey, f64)],
}

impl LinearModel {
    /// Evaluate the model. A term whose stat is absent from the profile is
    /// left out of the sum.
    pub fn evaluate(&self, profile: &BoxScoreProfile) -> f64 {
        self.weights
            .iter()
            .filter_map(|&(key, weight)| profile.get(key).map(|value| weight * value))
            .fold(self.intercept, |acc, term| acc + term)
    }
}

pub const OFFENSE_MODEL: LinearModel = LinearModel {
    intercept: -6.50,
    weights: &[
        (StatKey::Minutes, 0.080),
        (StatKey::PointsPer100, 0.220),
        (StatKey::AssistsPer100, 0.280),
        (StatKey::TurnoversPer100, -0.450),
        (StatKey::ReboundsPer100, 0.040),
        (StatKey::StealsPer100, 0.100),
        (StatKey::BlocksPer100, -0.050),
        (StatKey::FoulsPer100, -0.050),
        (StatKey::TrueShotAttemptsPer100, -0.120),
        (StatKey::OnOffDiff, 0.150),
        (StatKey::OnCourtNet, 0.060),
    ],
};

pub const DEFENSE_MODEL: LinearModel = LinearModel {
    intercept: -3.20,
    weights: &[
        (StatKey::Minutes, 0.040),
        (StatKey::PointsPer100, -0.020),
        (StatKey::AssistsPer100, 0.020),
        (StatKey::TurnoversPer100, -0.030),
        (StatKey::ReboundsPer100, 0.120),
        (StatKey::StealsPer100, 0.600),
        (StatKey::BlocksPer100, 0.400),
        (StatKey::FoulsPer100, -0.120),
        (StatKey::TrueShotAttemptsPer100, 0.010),
        (StatKey::OnOffDiff, 0.050),
        (StatKey::OnCourtNet, 0.080),
    ],
};

/// Additive offsets correcting the model's positional bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAdjustment {
    pub offense: f64,
    pub defense: f64,
}

pub const POSITION_ADJUSTMENTS: [(PositionCategory, PositionAdjustment); 5] = [
    (PositionCategory::PG, PositionAdjustment { offense: 1.0, defense: -1.0 }),
    (PositionCategory::SG, PositionAdjustment { offense: 0.5, defense: -0.5 }),
    (PositionCategory::SF, PositionAdjustment { offense: 0.0, defense: 0.0 }),
    (PositionCategory::PF, PositionAdjustment { offense: -0.5, defense: 0.5 }),
    (PositionCategory::C, PositionAdjustment { offense: -1.0, defense: 1.0 }),
];

pub fn position_adjustment(position: PositionCategory) -> PositionAdjustment {
    POSITION_ADJUSTMENTS
        .iter()
        .find(|(p, _)| *p == position)
        .map(|(_, adj)| *adj)
        .unwrap_or(PositionAdjustment {
            offense: 0.0,
            defense: 0.0,
        })
}

// ---------------------------------------------------------------------------
// Replacement value constants
// ---------------------------------------------------------------------------

/// Total rating of a freely available substitute.
pub const REPLACEMENT_LEVEL: f64 = -2.0;
/// Wins per point of net rating over a full season of minutes.
pub const WINS_PER_POINT: f64 = 2.7;
pub const SEASON_GAMES: f64 = 82.0;
/// 48 minutes × 5 players on the floor.
pub const TEAM_MINUTES_PER_GAME: f64 = 48.0 * 5.0;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeRating {
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub total_rating: f64,
    pub replacement_value: f64,
}

/// Rate a player-season. Pure: identical inputs give identical outputs.
pub fn calculate_rating(profile: &BoxScoreProfile, position: PositionCategory) -> CompositeRating {
    let adjustment = position_adjustment(position);
    let offensive_rating = OFFENSE_MODEL.evaluate(profile) + adjustment.offense;
    let defensive_rating = DEFENSE_MODEL.evaluate(profile) + adjustment.defense;
    let total_rating = offensive_rating + defensive_rating;

    let replacement_value = match profile.minutes_per_game() {
        Some(mpg) => replacement_value(total_rating, mpg, profile.games_played),
        None => 0.0,
    };

    CompositeRating {
        offensive_rating,
        defensive_rating,
        total_rating,
        replacement_value,
    }
}

/// Wins above replacement for a season.
///
/// The player's share of team minutes scales the rating margin over
/// replacement into a per-82-game win value, which is then prorated by the
/// fraction of the season actually played. Zero games played is worth zero.
pub fn replacement_value(total_rating: f64, minutes_per_game: f64, games_played: u32) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    let gp = games_played as f64;
    let minutes_share = (minutes_per_game * gp) / (TEAM_MINUTES_PER_GAME * gp);
    let per_82 = (total_rating - REPLACEMENT_LEVEL) * minutes_share * WINS_PER_POINT;
    per_82 * (gp / SEASON_GAMES)
}
