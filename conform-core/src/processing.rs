//! Simulated conformance analysis.
//!
//! No documents are parsed. A run "processes" by walking a fixed sequence of
//! stages with a fixed delay between them; the terminal app drives the
//! sequence on its background worker.

use std::time::Duration;

/// Pause before each stage is reported.
pub const STAGE_DELAY: Duration = Duration::from_millis(800);

/// Pause after the final stage before the run opens for review.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const COMPLETION_MESSAGE: &str = "Conformance check complete! Redirecting to results...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStage {
    /// Percent complete once this stage is reached.
    pub progress: u8,
    pub status: &'static str,
}

pub const PROCESSING_STAGES: [ProcessingStage; 8] = [
    ProcessingStage { progress: 10, status: "Uploading documents..." },
    ProcessingStage { progress: 25, status: "Extracting submittal items..." },
    ProcessingStage { progress: 40, status: "Parsing project specifications..." },
    ProcessingStage { progress: 55, status: "Loading Material Index..." },
    ProcessingStage { progress: 70, status: "Running AI conformance analysis..." },
    ProcessingStage { progress: 85, status: "Matching materials against specifications..." },
    ProcessingStage { progress: 95, status: "Generating conformance report..." },
    ProcessingStage { progress: 100, status: "Complete!" },
];

impl ProcessingStage {
    pub fn is_final(&self) -> bool {
        self.progress >= 100
    }
}

/// Total wall time of one simulated run.
pub fn total_duration() -> Duration {
    STAGE_DELAY * PROCESSING_STAGES.len() as u32 + SETTLE_DELAY
}
