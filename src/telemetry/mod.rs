//! Telemetry for a resolution run
//!
//! Collects state transitions, generation calls and command executions, and
//! summarizes them at the end of a run.

use crate::generator::PromptKind;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    StateTransition {
        from: String,
        to: String,
        timestamp: Instant,
    },
    GenerationCompleted {
        kind: PromptKind,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
    CommandExecuted {
        exit_code: Option<i32>,
        duration_ms: u64,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub state_transitions: usize,
    pub generations: usize,
    pub repair_generations: usize,
    pub failed_generations: usize,
    pub executions: usize,
    pub failed_executions: usize,
    pub generation_ms: u64,
    pub execution_ms: u64,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                TelemetryEvent::StateTransition { .. } => {
                    stats.state_transitions += 1;
                }
                TelemetryEvent::GenerationCompleted {
                    kind,
                    duration_ms,
                    success,
                    ..
                } => {
                    stats.generations += 1;
                    stats.generation_ms += duration_ms;
                    if *kind == PromptKind::Repair {
                        stats.repair_generations += 1;
                    }
                    if !success {
                        stats.failed_generations += 1;
                    }
                }
                TelemetryEvent::CommandExecuted {
                    exit_code,
                    duration_ms,
                    ..
                } => {
                    stats.executions += 1;
                    stats.execution_ms += duration_ms;
                    if *exit_code != Some(0) {
                        stats.failed_executions += 1;
                    }
                }
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Log a one-line summary of the run
    pub fn log_summary(&self) {
        let stats = self.get_stats();
        tracing::info!(
            elapsed_ms = self.elapsed().as_millis() as u64,
            events = self.event_count(),
            transitions = stats.state_transitions,
            generations = stats.generations,
            repairs = stats.repair_generations,
            executions = stats.executions,
            failed_executions = stats.failed_executions,
            generation_ms = stats.generation_ms,
            execution_ms = stats.execution_ms,
            "resolution summary"
        );
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
