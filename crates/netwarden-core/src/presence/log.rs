// ── Presence log ──
//
// Append-only CSV of every transition, for pattern analysis outside the
// process. One writer per append keeps the file valid across process
// restarts sharing the same path.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Deserialize;

use crate::error::CoreError;
use crate::model::TransitionKind;

const HEADER: [&str; 7] = [
    "timestamp",
    "date",
    "time",
    "day_of_week",
    "event",
    "device_name",
    "ip_address",
];

/// Aggregate counts over the whole log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceStats {
    pub total_events: u64,
    pub arrivals: u64,
    pub departures: u64,
    pub days_tracked: u64,
}

/// Only the columns stats() cares about; the rest are skipped by name.
#[derive(Deserialize)]
struct LogRow {
    date: String,
    event: String,
}

/// Append-only CSV log of presence transitions.
pub struct PresenceLog {
    path: PathBuf,
}

impl PresenceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one transition row, creating the file (with header) on first
    /// use.
    pub fn append(
        &self,
        kind: TransitionKind,
        device_name: &str,
        ip_address: &str,
    ) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let fresh = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if fresh {
            writer.write_record(HEADER)?;
        }

        let now = Local::now();
        writer.write_record([
            now.to_rfc3339().as_str(),
            now.format("%Y-%m-%d").to_string().as_str(),
            now.format("%H:%M:%S").to_string().as_str(),
            now.format("%A").to_string().as_str(),
            kind.to_string().as_str(),
            device_name,
            ip_address,
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Aggregate statistics over the whole log. An absent log counts as
    /// zero events.
    pub fn stats(&self) -> Result<PresenceStats, CoreError> {
        if !self.path.exists() {
            return Ok(PresenceStats::default());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut stats = PresenceStats::default();
        let mut days: HashSet<String> = HashSet::new();

        for row in reader.deserialize::<LogRow>() {
            let row = row?;
            match row.event.as_str() {
                "arrived" => stats.arrivals += 1,
                "left" => stats.departures += 1,
                _ => continue,
            }
            days.insert(row.date);
        }

        stats.total_events = stats.arrivals + stats.departures;
        stats.days_tracked = days.len() as u64;
        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_creates_header_once() {
        let dir = TempDir::new().unwrap();
        let log = PresenceLog::new(dir.path().join("presence_history.csv"));

        log.append(TransitionKind::Arrived, "phone", "192.168.0.5").unwrap();
        log.append(TransitionKind::Departed, "phone", "192.168.0.5").unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,date,time,day_of_week"));
        assert!(lines[1].contains("arrived"));
        assert!(lines[2].contains("left"));
    }

    #[test]
    fn stats_aggregate_events_and_days() {
        let dir = TempDir::new().unwrap();
        let log = PresenceLog::new(dir.path().join("presence_history.csv"));

        log.append(TransitionKind::Arrived, "phone", "192.168.0.5").unwrap();
        log.append(TransitionKind::Arrived, "tablet", "192.168.0.6").unwrap();
        log.append(TransitionKind::Departed, "phone", "192.168.0.5").unwrap();

        let stats = log.stats().unwrap();
        assert_eq!(stats.arrivals, 2);
        assert_eq!(stats.departures, 1);
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.days_tracked, 1);
    }

    #[test]
    fn stats_on_missing_log_are_zero() {
        let dir = TempDir::new().unwrap();
        let log = PresenceLog::new(dir.path().join("nope.csv"));
        assert_eq!(log.stats().unwrap(), PresenceStats::default());
    }
}
