//! JSON exporter for timeline results.
//!
//! Writes a timeline as pretty-printed JSON so it can be plotted or diffed
//! between runs.

use crate::error::SimError;
use crate::runner::TimelineResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete timeline export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineExport {
    /// Scenario name
    pub scenario: String,

    /// Scenario description
    pub description: String,

    /// Whether the run was free of violations
    pub passed: bool,

    /// Full result
    pub timeline: TimelineResult,
}

impl TimelineExport {
    /// Creates a new export container.
    pub fn new(timeline: TimelineResult) -> Self {
        let profile = timeline.scenario.scenario();
        Self {
            scenario: timeline.scenario.name().to_string(),
            description: profile.description.to_string(),
            passed: timeline.passed(),
            timeline,
        }
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
