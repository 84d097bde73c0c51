//! Append-only analytics event log backed by SQLite.
//!
//! Two event streams are recorded: diagnoses returned by the symptom predictor
//! and medical topics extracted from assistant questions. Both are aggregated
//! into chart-ready [`ChartData`] for the frontend.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::types::{ChartData, Dataset, DatasetStyle};

/// Timestamp layout used in both tables.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Line colors for known diagnoses.
const DIAGNOSIS_COLORS: &[(&str, &str)] = &[
    ("Flu", "#F97316"),
    ("Cold", "#4169E1"),
    ("Pneumonia", "#EF4444"),
    ("Bronchitis", "#9333EA"),
    ("Healthy", "#22C55E"),
];
const DEFAULT_DIAGNOSIS_COLOR: &str = "#6B7280";

/// Bar palette for the common-queries chart.
const TOPIC_PALETTE: &[&str] = &["#22C55E", "#3B82F6", "#6366F1", "#EC4899", "#F97316"];

type StorageResult<T> = std::result::Result<T, StorageError>;

/// SQLite-backed event log shared by the prediction and assistant services.
pub struct AnalyticsStore {
    conn: Mutex<Connection>,
}

impl AnalyticsStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(db_path: &Path) -> StorageResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            conn: Mutex::new(Connection::open(db_path)?),
        };
        store.init_schema()?;
        tracing::info!("Initialized analytics database at {:?}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                diagnosis TEXT NOT NULL,
                timestamp DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chatbot_queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                timestamp DATETIME NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Record a diagnosis at the current local time.
    pub fn record_prediction(&self, diagnosis: &str) -> StorageResult<()> {
        self.record_prediction_at(diagnosis, Local::now().naive_local())
    }

    pub fn record_prediction_at(&self, diagnosis: &str, at: NaiveDateTime) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO predictions (diagnosis, timestamp) VALUES (?1, ?2)",
            params![diagnosis, at.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        tracing::info!("Saved prediction '{diagnosis}' to database.");
        Ok(())
    }

    /// Record an assistant query topic at the current local time.
    pub fn record_query_topic(&self, topic: &str) -> StorageResult<()> {
        self.record_query_topic_at(topic, Local::now().naive_local())
    }

    pub fn record_query_topic_at(&self, topic: &str, at: NaiveDateTime) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO chatbot_queries (topic, timestamp) VALUES (?1, ?2)",
            params![topic, at.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        tracing::info!("Saved query topic '{topic}' to database.");
        Ok(())
    }

    /// Daily prediction counts, one line series per diagnosis.
    ///
    /// Labels run from the first to the last recorded day with no gaps; days
    /// without predictions count zero.
    pub fn prediction_trends(&self) -> StorageResult<ChartData> {
        tracing::info!("Fetching prediction trends from database.");
        let rows: Vec<(String, String)> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare("SELECT diagnosis, timestamp FROM predictions")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut counts: BTreeMap<(NaiveDate, String), i64> = BTreeMap::new();
        let mut diagnoses = BTreeSet::new();
        for (diagnosis, timestamp) in rows {
            let day = parse_day(&timestamp)?;
            *counts.entry((day, diagnosis.clone())).or_default() += 1;
            diagnoses.insert(diagnosis);
        }

        let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
            (Some((first, _)), Some((last, _))) => (*first, *last),
            _ => return Ok(ChartData::default()),
        };

        let days: Vec<NaiveDate> = std::iter::successors(Some(first), |d| {
            let next = *d + Duration::days(1);
            (next <= last).then_some(next)
        })
        .collect();

        let datasets = diagnoses
            .into_iter()
            .map(|diagnosis| {
                let data = days
                    .iter()
                    .map(|day| {
                        counts
                            .get(&(*day, diagnosis.clone()))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect();
                Dataset {
                    style: DatasetStyle::Line {
                        border_color: diagnosis_color(&diagnosis).to_string(),
                        fill: false,
                        tension: 0.1,
                    },
                    label: diagnosis,
                    data,
                }
            })
            .collect();

        Ok(ChartData {
            labels: days
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            datasets,
        })
    }

    /// Most frequent assistant topics as a single bar series.
    pub fn top_query_topics(&self, limit: usize) -> StorageResult<ChartData> {
        tracing::info!("Fetching top {limit} query topics from database.");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT topic, COUNT(topic) AS count FROM chatbot_queries \
             GROUP BY topic ORDER BY count DESC, topic ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(ChartData::default());
        }

        let (labels, data): (Vec<String>, Vec<i64>) = rows.into_iter().unzip();
        Ok(ChartData {
            labels,
            datasets: vec![Dataset {
                label: "Common Queries".to_string(),
                data,
                style: DatasetStyle::Bar {
                    background_color: TOPIC_PALETTE.iter().map(|c| c.to_string()).collect(),
                },
            }],
        })
    }
}

fn diagnosis_color(diagnosis: &str) -> &'static str {
    DIAGNOSIS_COLORS
        .iter()
        .find(|(name, _)| *name == diagnosis)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_DIAGNOSIS_COLOR)
}

/// Parse the day from a stored timestamp, tolerating a missing fraction.
fn parse_day(value: &str) -> StorageResult<NaiveDate> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(value.get(..10).unwrap_or(value), "%Y-%m-%d"))
        .map_err(|e| StorageError::Time {
            value: value.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{day} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_empty_trends() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        let trends = store.prediction_trends().unwrap();
        assert!(trends.labels.is_empty());
        assert!(trends.datasets.is_empty());
    }

    #[test]
    fn test_trends_fill_missing_days() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        store.record_prediction_at("Flu", at("2026-03-01", "09:00:00")).unwrap();
        store.record_prediction_at("Flu", at("2026-03-01", "17:30:00")).unwrap();
        store.record_prediction_at("Cold", at("2026-03-03", "08:15:00")).unwrap();

        let trends = store.prediction_trends().unwrap();
        assert_eq!(trends.labels, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);

        // Series are sorted by diagnosis name.
        assert_eq!(trends.datasets[0].label, "Cold");
        assert_eq!(trends.datasets[0].data, vec![0, 0, 1]);
        assert_eq!(trends.datasets[1].label, "Flu");
        assert_eq!(trends.datasets[1].data, vec![2, 0, 0]);
    }

    #[test]
    fn test_trend_colors() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        store.record_prediction_at("Pneumonia", at("2026-03-01", "09:00:00")).unwrap();
        store.record_prediction_at("Asthma", at("2026-03-01", "10:00:00")).unwrap();

        let trends = store.prediction_trends().unwrap();
        let color = |label: &str| match &trends.datasets.iter().find(|d| d.label == label).unwrap().style {
            DatasetStyle::Line { border_color, .. } => border_color.clone(),
            DatasetStyle::Bar { .. } => panic!("expected line style"),
        };
        assert_eq!(color("Pneumonia"), "#EF4444");
        assert_eq!(color("Asthma"), "#6B7280");
    }

    #[test]
    fn test_top_topics_ordered_by_count() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        for topic in ["Diabetes", "Asthma", "Diabetes", "Migraine", "Diabetes", "Asthma"] {
            store.record_query_topic(topic).unwrap();
        }

        let chart = store.top_query_topics(5).unwrap();
        assert_eq!(chart.labels, vec!["Diabetes", "Asthma", "Migraine"]);
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].label, "Common Queries");
        assert_eq!(chart.datasets[0].data, vec![3, 2, 1]);
    }

    #[test]
    fn test_top_topics_respects_limit() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        for topic in ["A", "B", "C", "D", "E", "F", "G"] {
            store.record_query_topic(topic).unwrap();
        }
        assert_eq!(store.top_query_topics(5).unwrap().labels.len(), 5);
    }

    #[test]
    fn test_top_topics_empty() {
        let store = AnalyticsStore::open_in_memory().unwrap();
        assert_eq!(store.top_query_topics(5).unwrap(), ChartData::default());
    }

    #[test]
    fn test_open_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("predictions.db");
        {
            let store = AnalyticsStore::open(&path).unwrap();
            store.record_prediction("Healthy").unwrap();
        }
        let store = AnalyticsStore::open(&path).unwrap();
        let trends = store.prediction_trends().unwrap();
        assert_eq!(trends.datasets[0].label, "Healthy");
    }

    #[test]
    fn test_parse_day_formats() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parse_day("2026-03-01 09:00:00.123456").unwrap(), day);
        assert_eq!(parse_day("2026-03-01 09:00:00").unwrap(), day);
        assert_eq!(parse_day("2026-03-01").unwrap(), day);
        assert!(parse_day("yesterday").is_err());
    }
}
