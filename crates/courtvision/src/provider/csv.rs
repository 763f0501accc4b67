// File-backed statistics and historical provider.
//
// Reads NBA-stats style CSV exports. Each league table carries a SEASON
// column so one file can hold several seasons; historical tables are keyed by
// PLAYER_ID. Files are re-read on every call: the caches above this layer
// decide how often that happens.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::DataPaths;
use crate::provider::{
    merge_tables, AwardRecord, CareerSeason, CareerTotals, HistoricalProvider, PlayoffTotals,
    ProviderError, StatRow, StatsProvider,
};
use crate::stats::{BoxScoreProfile, PlayerId, StatKey, TableKind};

type RawRow = HashMap<String, String>;

/// CSV implementation of both provider traits.
#[derive(Debug, Clone)]
pub struct CsvSource {
    league_basic: PathBuf,
    league_advanced: PathBuf,
    league_per100: PathBuf,
    career_seasons: PathBuf,
    career_totals: PathBuf,
    playoff_totals: Option<PathBuf>,
    awards: PathBuf,
}

impl CsvSource {
    pub fn from_paths(paths: &DataPaths) -> Self {
        Self {
            league_basic: PathBuf::from(&paths.league_basic),
            league_advanced: PathBuf::from(&paths.league_advanced),
            league_per100: PathBuf::from(&paths.league_per100),
            career_seasons: PathBuf::from(&paths.career_seasons),
            career_totals: PathBuf::from(&paths.career_totals),
            playoff_totals: paths.playoff_totals.as_ref().map(PathBuf::from),
            awards: PathBuf::from(&paths.awards),
        }
    }

    fn table_path(&self, table: TableKind) -> &Path {
        match table {
            TableKind::Basic => &self.league_basic,
            TableKind::Advanced => &self.league_advanced,
            TableKind::Per100 => &self.league_per100,
        }
    }
}

impl StatsProvider for CsvSource {
    fn player_profile(
        &self,
        player_id: PlayerId,
        season: &str,
    ) -> Result<BoxScoreProfile, ProviderError> {
        let own_rows = |rows: Vec<StatRow>| -> Vec<StatRow> {
            rows.into_iter().filter(|r| r.player_id == player_id).collect()
        };
        let mut tables = vec![own_rows(self.league_table(season, TableKind::Basic)?)];
        for table in [TableKind::Advanced, TableKind::Per100] {
            match self.league_table(season, table) {
                Ok(rows) => tables.push(own_rows(rows)),
                Err(e) => warn!("{} table for {} unavailable: {}", table.label(), season, e),
            }
        }
        merge_tables(season, tables)
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::PlayerNotFound {
                player_id,
                season: season.to_string(),
            })
    }

    fn league_table(&self, season: &str, table: TableKind) -> Result<Vec<StatRow>, ProviderError> {
        let path = self.table_path(table);
        let rows = read_rows(path)?;
        let parsed = stat_rows_from_raw(rows, season, table);
        debug!(
            "read {} {} rows for {} from {}",
            parsed.len(),
            table.label(),
            season,
            path.display()
        );
        Ok(parsed)
    }
}

impl HistoricalProvider for CsvSource {
    fn career_seasons(&self, player_id: PlayerId) -> Result<Vec<CareerSeason>, ProviderError> {
        let rows = read_rows(&self.career_seasons)?;
        Ok(rows
            .iter()
            .filter(|r| row_player_id(r) == Some(player_id))
            .filter_map(|r| {
                let season_id = text(r, "SEASON_ID")?;
                Some(CareerSeason {
                    season_id,
                    team: text(r, "TEAM").unwrap_or_default(),
                    games_played: number(r, "GP").map(|g| g.round() as u32).unwrap_or(0),
                })
            })
            .collect())
    }

    fn career_totals(&self, player_id: PlayerId) -> Result<CareerTotals, ProviderError> {
        let rows = read_rows(&self.career_totals)?;
        let row = rows
            .iter()
            .find(|r| row_player_id(r) == Some(player_id))
            .ok_or_else(|| ProviderError::PlayerNotFound {
                player_id,
                season: "career".into(),
            })?;
        Ok(CareerTotals {
            games_played: number(row, "GP").map(|g| g.round() as u32).unwrap_or(0),
            points: number(row, "PTS").unwrap_or(0.0),
            field_goal_attempts: number(row, "FGA").unwrap_or(0.0),
            free_throw_attempts: number(row, "FTA").unwrap_or(0.0),
            win_shares: number(row, "WS"),
            value_over_replacement: number(row, "VORP"),
        })
    }

    fn playoff_totals(&self, player_id: PlayerId) -> Result<Option<PlayoffTotals>, ProviderError> {
        let Some(path) = &self.playoff_totals else {
            return Ok(None);
        };
        let rows = match read_rows(path) {
            Ok(rows) => rows,
            Err(ProviderError::Io { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                warn!("playoff table {} not found, skipping playoff totals", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(rows
            .iter()
            .find(|r| row_player_id(r) == Some(player_id))
            .map(|row| PlayoffTotals {
                games_played: number(row, "GP").map(|g| g.round() as u32).unwrap_or(0),
                points: number(row, "PTS").unwrap_or(0.0),
            }))
    }

    fn awards(&self, player_id: PlayerId) -> Result<Vec<AwardRecord>, ProviderError> {
        let rows = read_rows(&self.awards)?;
        Ok(rows
            .iter()
            .filter(|r| row_player_id(r) == Some(player_id))
            .filter_map(|r| {
                Some(AwardRecord {
                    description: text(r, "DESCRIPTION")?,
                    season: text(r, "SEASON"),
                })
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Reader-based helpers (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn read_rows(path: &Path) -> Result<Vec<RawRow>, ProviderError> {
    let file = std::fs::File::open(path).map_err(|e| ProviderError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    rows_from_reader(file).map_err(|e| ProviderError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

fn rows_from_reader<R: Read>(rdr: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawRow>() {
        match result {
            Ok(raw) => rows.push(
                raw.into_iter()
                    .map(|(k, v)| (k.trim().to_uppercase(), v.trim().to_string()))
                    .collect(),
            ),
            Err(e) => warn!("skipping malformed CSV row: {}", e),
        }
    }
    Ok(rows)
}

fn stat_rows_from_raw(rows: Vec<RawRow>, season: &str, table: TableKind) -> Vec<StatRow> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(row_season) = text(&row, "SEASON") {
            if row_season != season {
                continue;
            }
        }
        let Some(player_id) = row_player_id(&row) else {
            warn!("skipping {} row without a valid PLAYER_ID", table.label());
            continue;
        };
        if !seen.insert(player_id) {
            warn!("duplicate {} row for player {}, keeping the first", table.label(), player_id);
            continue;
        }

        let mut stats = BTreeMap::new();
        for (column, _) in row.iter() {
            if let Some(key) = StatKey::from_column(table, column) {
                if let Some(value) = number(&row, column) {
                    stats.insert(key, value);
                }
            }
        }
        if table == TableKind::Per100 && !stats.contains_key(&StatKey::TrueShotAttemptsPer100) {
            if let (Some(fga), Some(fta)) = (number(&row, "FGA"), number(&row, "FTA")) {
                stats.insert(StatKey::TrueShotAttemptsPer100, fga + 0.44 * fta);
            }
        }

        out.push(StatRow {
            player_id,
            player_name: text(&row, "PLAYER_NAME").unwrap_or_default(),
            position: text(&row, "POSITION"),
            games_played: number(&row, "GP").map(|g| g.round() as u32),
            stats,
        });
    }
    out
}

fn text(row: &RawRow, column: &str) -> Option<String> {
    row.get(column).filter(|v| !v.is_empty()).cloned()
}

/// Parse a numeric cell. Empty and non-finite cells count as missing.
fn number(row: &RawRow, column: &str) -> Option<f64> {
    row.get(column)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn row_player_id(row: &RawRow) -> Option<PlayerId> {
    row.get("PLAYER_ID").and_then(|v| v.parse::<PlayerId>().ok())
}
