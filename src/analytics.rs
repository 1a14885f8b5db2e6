//! Gameplay analytics: events the engine queues and sinks the app drains them into.
//! Sink failures are logged and dropped.

use crate::player::Achievement;
use crate::powerup::PowerUpKind;
use crate::shop::ShopItem;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    LevelComplete {
        level: u32,
        score: u32,
        stars: u8,
        coins: u32,
        moves_left: u32,
    },
    GameOver {
        level: u32,
        score: u32,
        target: u32,
    },
    PowerUpUsed {
        kind: PowerUpKind,
        level: u32,
    },
    Purchase {
        item: ShopItem,
        cost: u32,
        coins_left: u32,
    },
    AchievementUnlocked {
        id: Achievement,
    },
}

pub trait AnalyticsSink {
    fn record(&mut self, event: &AnalyticsEvent);
}

/// Writes each event to the `analytics` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn record(&mut self, event: &AnalyticsEvent) {
        match serde_json::to_string(event) {
            Ok(line) => log::info!(target: "analytics", "{line}"),
            Err(err) => log::warn!(target: "analytics", "unserializable event {event:?}: {err}"),
        }
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, event: &AnalyticsEvent) -> anyhow::Result<()> {
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl AnalyticsSink for JsonLinesSink {
    fn record(&mut self, event: &AnalyticsEvent) {
        if let Err(err) = self.append(event) {
            log::warn!(target: "analytics", "dropping event for {}: {err}", self.path.display());
        }
    }
}

/// Keeps every event; for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub events: Vec<AnalyticsEvent>,
}

impl AnalyticsSink for MemorySink {
    fn record(&mut self, event: &AnalyticsEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = AnalyticsEvent::PowerUpUsed {
            kind: PowerUpKind::Bomb,
            level: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "power_up_used");
        assert_eq!(json["kind"], "bomb");
        assert_eq!(json["level"], 3);

        let json = serde_json::to_value(AnalyticsEvent::AchievementUnlocked {
            id: Achievement::Score1000,
        })
        .unwrap();
        assert_eq!(json["id"], "score_1000");
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.record(&AnalyticsEvent::GameOver {
            level: 1,
            score: 10,
            target: 1000,
        });
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn test_json_lines_sink_swallows_bad_path() {
        let mut sink = JsonLinesSink::new("/nonexistent-dir/for/sure/events.jsonl");
        sink.record(&AnalyticsEvent::GameOver {
            level: 1,
            score: 0,
            target: 1000,
        });
    }
}
