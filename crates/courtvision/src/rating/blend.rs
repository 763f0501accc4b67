// Blend current-season performance with career history into one strength
// number centred on 1500.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rating::composite::CompositeRating;
use crate::rating::historical::HistoricalProfile;
use crate::stats::{BoxScoreProfile, StatKey};

pub const BASE_RATING: f64 = 1500.0;
pub const CURRENT_WEIGHT: f64 = 0.6;
pub const HISTORICAL_WEIGHT: f64 = 0.4;

pub const TOTAL_RATING_SCALE: f64 = 30.0;
/// League-average impact estimate.
pub const IMPACT_BASELINE: f64 = 0.10;
pub const IMPACT_SCALE: f64 = 1500.0;
pub const DIFFERENTIAL_SCALE: f64 = 10.0;

pub const LONGEVITY_CAP_YEARS: u32 = 15;
pub const LONGEVITY_MAX_BONUS: f64 = 100.0;

/// Which historical terms are counted, and the matching ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendVariant {
    /// Longevity + achievements + career stats, capped at 300.
    Standard,
    /// Standard terms plus the playoff bonus, capped at 400.
    WithPlayoffs,
}

impl BlendVariant {
    pub fn historical_cap(&self) -> f64 {
        match self {
            BlendVariant::Standard => 300.0,
            BlendVariant::WithPlayoffs => 400.0,
        }
    }
}

/// The current-season signals the blender can draw on, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentMetrics {
    pub total_rating: Option<f64>,
    pub impact_estimate: Option<f64>,
    pub offensive_rating: Option<f64>,
    pub defensive_rating: Option<f64>,
}

impl CurrentMetrics {
    /// Collect metrics from a profile and (when available) its composite
    /// rating. The offensive/defensive ratings here are the team-style
    /// points-per-100 ratings from the advanced table.
    pub fn from_profile(profile: &BoxScoreProfile, rating: Option<&CompositeRating>) -> Self {
        Self {
            total_rating: rating.map(|r| r.total_rating),
            impact_estimate: profile.get(StatKey::ImpactEstimate),
            offensive_rating: profile.get(StatKey::OffensiveRating),
            defensive_rating: profile.get(StatKey::DefensiveRating),
        }
    }
}

/// Which signal produced the current component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentSource {
    TotalRating,
    ImpactEstimate,
    RatingDifferential,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendedRating {
    pub current_component: f64,
    pub historical_component: f64,
    pub blended_value: i64,
}

/// Current component, in priority order: total rating, impact estimate,
/// offense-minus-defense differential. Zero when none is available.
pub fn current_component(metrics: &CurrentMetrics) -> (f64, CurrentSource) {
    if let Some(total) = metrics.total_rating {
        return (total * TOTAL_RATING_SCALE, CurrentSource::TotalRating);
    }
    if let Some(pie) = metrics.impact_estimate {
        return ((pie - IMPACT_BASELINE) * IMPACT_SCALE, CurrentSource::ImpactEstimate);
    }
    if let (Some(off), Some(def)) = (metrics.offensive_rating, metrics.defensive_rating) {
        return ((off - def) * DIFFERENTIAL_SCALE, CurrentSource::RatingDifferential);
    }
    (0.0, CurrentSource::Unavailable)
}

/// Longevity bonus: years (capped at 15) scaled linearly to 100.
pub fn longevity_bonus(years_played: u32) -> f64 {
    years_played.min(LONGEVITY_CAP_YEARS) as f64 / LONGEVITY_CAP_YEARS as f64 * LONGEVITY_MAX_BONUS
}

/// Historical component, capped according to the variant.
pub fn historical_component(profile: &HistoricalProfile, variant: BlendVariant) -> f64 {
    let mut raw = longevity_bonus(profile.years_played)
        + profile.achievement_value
        + profile.career_stat_bonus();
    if variant == BlendVariant::WithPlayoffs {
        raw += profile.playoff_bonus;
    }
    raw.min(variant.historical_cap())
}

/// `1500 + 0.6 · current + 0.4 · historical`, rounded to the nearest integer.
pub fn blend(
    current: &CurrentMetrics,
    historical: &HistoricalProfile,
    variant: BlendVariant,
) -> BlendedRating {
    let (current_component, source) = current_component(current);
    if source == CurrentSource::Unavailable {
        debug!("no current-season signal available, current component is 0");
    }
    let historical_component = historical_component(historical, variant);
    let blended =
        BASE_RATING + CURRENT_WEIGHT * current_component + HISTORICAL_WEIGHT * historical_component;

    BlendedRating {
        current_component,
        historical_component,
        blended_value: blended.round() as i64,
    }
}
