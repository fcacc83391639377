//! Telemetry for plan execution
//!
//! Collects one event per step plus plan/analysis lifecycle events and keeps
//! running statistics. Every recorded event is also emitted as a `tracing`
//! log line. Telemetry never influences control flow.
//!
//! The event log keeps the most recent `MAX_EVENTS` entries; the running
//! statistics cover every event ever recorded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{info, warn};

/// Events retained per collector before the oldest are dropped
pub const MAX_EVENTS: usize = 1000;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    PlanStarted {
        step_count: usize,
        timestamp: Instant,
    },
    StepStarted {
        index: usize,
        tool: String,
        timestamp: Instant,
    },
    StepCompleted {
        index: usize,
        tool: String,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
    PlanCompleted {
        step_count: usize,
        failed: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    AnalysisFallback {
        reason: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryStats {
    pub plans_started: usize,
    pub plans_completed: usize,
    pub steps_started: usize,
    pub steps_succeeded: usize,
    pub steps_failed: usize,
    pub total_step_duration_ms: u64,
    pub analysis_fallbacks: usize,
}

/// Telemetry collector, cheap to clone and share between requests
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

/// Lock a mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(64))),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        Self::log(&event);

        // Update stats
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::PlanStarted { .. } => {
                    stats.plans_started += 1;
                }
                TelemetryEvent::StepStarted { .. } => {
                    stats.steps_started += 1;
                }
                TelemetryEvent::StepCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if *success {
                        stats.steps_succeeded += 1;
                    } else {
                        stats.steps_failed += 1;
                    }
                    stats.total_step_duration_ms += duration_ms;
                }
                TelemetryEvent::PlanCompleted { .. } => {
                    stats.plans_completed += 1;
                }
                TelemetryEvent::AnalysisFallback { .. } => {
                    stats.analysis_fallbacks += 1;
                }
            }
        }

        // Store event
        let mut events = lock(&self.events);
        if events.len() == MAX_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }

    fn log(event: &TelemetryEvent) {
        match event {
            TelemetryEvent::PlanStarted { step_count, .. } => {
                info!(steps = step_count, "plan execution started");
            }
            TelemetryEvent::StepStarted { index, tool, .. } => {
                info!(step = index, tool = %tool, "executing step");
            }
            TelemetryEvent::StepCompleted {
                index,
                tool,
                duration_ms,
                success,
                ..
            } => {
                if *success {
                    info!(step = index, tool = %tool, duration_ms, outcome = "success", "step completed");
                } else {
                    warn!(step = index, tool = %tool, duration_ms, outcome = "failure", "step failed");
                }
            }
            TelemetryEvent::PlanCompleted {
                step_count,
                failed,
                duration_ms,
                ..
            } => {
                info!(steps = step_count, failed, duration_ms, "plan execution finished");
            }
            TelemetryEvent::AnalysisFallback { reason, .. } => {
                warn!(reason = %reason, "analysis fell back to default verdict");
            }
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events.iter().skip(start).cloned().collect()
    }

    /// Calculate step success rate
    pub fn step_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.steps_succeeded + stats.steps_failed;
        if total == 0 {
            1.0
        } else {
            stats.steps_succeeded as f64 / total as f64
        }
    }

    /// Average duration of completed steps
    pub fn average_step_duration_ms(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.steps_succeeded + stats.steps_failed;
        if total == 0 {
            0.0
        } else {
            stats.total_step_duration_ms as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        eprintln!();
        eprintln!("Session Summary");
        eprintln!("─────────────────────────────────────");
        eprintln!("Duration:          {:?}", elapsed);
        eprintln!("Steps executed:    {}", stats.steps_started);
        eprintln!("Success rate:      {:.1}%", self.collector.step_success_rate() * 100.0);
        eprintln!("Avg step time:     {:.0}ms", self.collector.average_step_duration_ms());
        eprintln!("Analysis fallback: {}", stats.analysis_fallbacks);
        eprintln!();
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}
