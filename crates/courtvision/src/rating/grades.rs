// Letter grades for nine skill categories, from league percentiles.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rating::distribution::{assist_to_turnover, LeagueDistribution};
use crate::rating::percentile::{inverted_percentile, percentile, NEUTRAL_PERCENTILE};
use crate::stats::{BoxScoreProfile, StatKey};

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum score for each grade, highest first. Anything below the last
/// entry is an F.
pub const GRADE_THRESHOLDS: [(f64, Grade); 12] = [
    (0.95, Grade::APlus),
    (0.90, Grade::A),
    (0.85, Grade::AMinus),
    (0.80, Grade::BPlus),
    (0.70, Grade::B),
    (0.60, Grade::BMinus),
    (0.50, Grade::CPlus),
    (0.40, Grade::C),
    (0.30, Grade::CMinus),
    (0.20, Grade::DPlus),
    (0.15, Grade::D),
    (0.10, Grade::DMinus),
];

/// First grade whose threshold the score meets, scanning high to low.
pub fn grade_for(score: f64) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    PerimeterShooting,
    InteriorScoring,
    Playmaking,
    PerimeterDefense,
    InteriorDefense,
    Rebounding,
    OffBallMovement,
    Hustle,
    Versatility,
}

impl Skill {
    pub const ALL: [Skill; 9] = [
        Skill::PerimeterShooting,
        Skill::InteriorScoring,
        Skill::Playmaking,
        Skill::PerimeterDefense,
        Skill::InteriorDefense,
        Skill::Rebounding,
        Skill::OffBallMovement,
        Skill::Hustle,
        Skill::Versatility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::PerimeterShooting => "perimeter_shooting",
            Skill::InteriorScoring => "interior_scoring",
            Skill::Playmaking => "playmaking",
            Skill::PerimeterDefense => "perimeter_defense",
            Skill::InteriorDefense => "interior_defense",
            Skill::Rebounding => "rebounding",
            Skill::OffBallMovement => "off_ball_movement",
            Skill::Hustle => "hustle",
            Skill::Versatility => "versatility",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted stat feeding a skill score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillComponent {
    pub stat: StatKey,
    pub weight: f64,
    /// Percentile is inverted (defensive rating: fewer points allowed is better).
    pub lower_is_better: bool,
}

const fn up(stat: StatKey, weight: f64) -> SkillComponent {
    SkillComponent {
        stat,
        weight,
        lower_is_better: false,
    }
}

const fn down(stat: StatKey, weight: f64) -> SkillComponent {
    SkillComponent {
        stat,
        weight,
        lower_is_better: true,
    }
}

const PERIMETER_SHOOTING: &[SkillComponent] = &[
    up(StatKey::TrueShootingPct, 0.5),
    up(StatKey::ThreePointPct, 0.5),
];
const INTERIOR_SCORING: &[SkillComponent] = &[
    up(StatKey::Points, 0.4),
    up(StatKey::FieldGoalPct, 0.35),
    up(StatKey::FreeThrowAttempts, 0.25),
];
const PLAYMAKING: &[SkillComponent] = &[
    up(StatKey::Assists, 0.4),
    up(StatKey::AssistPct, 0.3),
    up(StatKey::AssistToTurnover, 0.3),
];
const PERIMETER_DEFENSE: &[SkillComponent] = &[
    up(StatKey::Steals, 0.5),
    down(StatKey::DefensiveRating, 0.5),
];
const INTERIOR_DEFENSE: &[SkillComponent] = &[
    up(StatKey::Blocks, 0.5),
    up(StatKey::DefensiveRebounds, 0.3),
    down(StatKey::DefensiveRating, 0.2),
];
const REBOUNDING: &[SkillComponent] = &[
    up(StatKey::Rebounds, 0.5),
    up(StatKey::OffensiveRebounds, 0.25),
    up(StatKey::DefensiveRebounds, 0.25),
];
const OFF_BALL_MOVEMENT: &[SkillComponent] = &[
    up(StatKey::FieldGoalPct, 0.4),
    up(StatKey::OffensiveRebounds, 0.3),
    up(StatKey::TrueShootingPct, 0.3),
];
const HUSTLE: &[SkillComponent] = &[
    up(StatKey::Steals, 0.35),
    up(StatKey::OffensiveRebounds, 0.35),
    up(StatKey::Blocks, 0.3),
];
const VERSATILITY: &[SkillComponent] = &[
    up(StatKey::Points, 0.2),
    up(StatKey::Rebounds, 0.2),
    up(StatKey::Assists, 0.2),
    up(StatKey::Steals, 0.2),
    up(StatKey::Blocks, 0.2),
];

pub fn skill_components(skill: Skill) -> &'static [SkillComponent] {
    match skill {
        Skill::PerimeterShooting => PERIMETER_SHOOTING,
        Skill::InteriorScoring => INTERIOR_SCORING,
        Skill::Playmaking => PLAYMAKING,
        Skill::PerimeterDefense => PERIMETER_DEFENSE,
        Skill::InteriorDefense => INTERIOR_DEFENSE,
        Skill::Rebounding => REBOUNDING,
        Skill::OffBallMovement => OFF_BALL_MOVEMENT,
        Skill::Hustle => HUSTLE,
        Skill::Versatility => VERSATILITY,
    }
}

/// Strength of the versatility balance bonus.
pub const BALANCE_BONUS: f64 = 0.3;

// ---------------------------------------------------------------------------
// Grade sets
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("non-finite value for {stat:?}: {value}")]
    NonFiniteStat { stat: StatKey, value: f64 },
}

/// How a grade set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeSource {
    Computed,
    Fallback,
}

/// A grade for every skill, always all nine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGradeSet {
    pub grades: BTreeMap<Skill, Grade>,
    pub source: GradeSource,
}

impl SkillGradeSet {
    /// Every skill graded "C".
    pub fn fallback() -> Self {
        Self {
            grades: Skill::ALL.iter().map(|&s| (s, Grade::C)).collect(),
            source: GradeSource::Fallback,
        }
    }

    pub fn get(&self, skill: Skill) -> Grade {
        self.grades.get(&skill).copied().unwrap_or(Grade::C)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == GradeSource::Fallback
    }
}

/// Stat value for grading. Assist-to-turnover is derived from assists and
/// turnovers when the profile does not carry it directly.
fn stat_value(profile: &BoxScoreProfile, key: StatKey) -> Option<f64> {
    match profile.get(key) {
        Some(v) => Some(v),
        None if key == StatKey::AssistToTurnover => {
            let ast = profile.get(StatKey::Assists)?;
            let tov = profile.get(StatKey::Turnovers)?;
            Some(assist_to_turnover(ast, tov))
        }
        None => None,
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Weighted percentile score for one skill, in `[0, 1]`.
///
/// Missing stats are dropped and the remaining weights renormalized. With no
/// usable stat at all the score is neutral (0.5).
pub fn skill_score(
    profile: &BoxScoreProfile,
    distribution: &LeagueDistribution,
    skill: Skill,
) -> Result<f64, GradeError> {
    let mut weighted = 0.0;
    let mut weight_used = 0.0;
    let mut percentiles = Vec::new();

    for component in skill_components(skill) {
        let Some(value) = stat_value(profile, component.stat) else {
            continue;
        };
        if !value.is_finite() {
            return Err(GradeError::NonFiniteStat {
                stat: component.stat,
                value,
            });
        }
        let values = distribution.values(component.stat);
        let pct = if component.lower_is_better {
            inverted_percentile(value, values)
        } else {
            percentile(value, values)
        };
        weighted += component.weight * pct;
        weight_used += component.weight;
        percentiles.push(pct);
    }

    if weight_used == 0.0 {
        return Ok(NEUTRAL_PERCENTILE);
    }
    let base = weighted / weight_used;

    // Balanced all-rounders earn up to +30%; a single stat has no balance.
    if skill == Skill::Versatility && percentiles.len() >= 2 {
        let sigma = population_std_dev(&percentiles);
        return Ok((base * (1.0 + BALANCE_BONUS * (1.0 - 2.0 * sigma))).min(1.0));
    }
    Ok(base)
}

/// Grade all nine skills, failing on the first grading error.
pub fn grade_skills_checked(
    profile: &BoxScoreProfile,
    distribution: &LeagueDistribution,
) -> Result<SkillGradeSet, GradeError> {
    let mut grades = BTreeMap::new();
    for skill in Skill::ALL {
        grades.insert(skill, grade_for(skill_score(profile, distribution, skill)?));
    }
    Ok(SkillGradeSet {
        grades,
        source: GradeSource::Computed,
    })
}

/// Grade all nine skills. A grading error degrades to the all-"C" set.
pub fn grade_skills(profile: &BoxScoreProfile, distribution: &LeagueDistribution) -> SkillGradeSet {
    match grade_skills_checked(profile, distribution) {
        Ok(set) => set,
        Err(e) => {
            warn!(
                "grading failed for player {} ({}), using fallback grades: {}",
                profile.player_id, profile.season, e
            );
            SkillGradeSet::fallback()
        }
    }
}
