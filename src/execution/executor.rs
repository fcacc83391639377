//! Plan executor
//!
//! Runs a plan to completion and produces a trace with the same length and
//! order as the plan. Steps run sequentially by default; with
//! `max_parallel > 1` they are dispatched concurrently under a semaphore and
//! reassembled in plan order.

use crate::dispatch::StepDispatcher;
use crate::execution::policy::{skipped_message, ContinuationPolicy};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{ExecutionTrace, Plan, PlanStep, StepResult};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Sequential execution
pub const SEQUENTIAL: usize = 1;

/// Plan runner over a step dispatcher
#[derive(Clone)]
pub struct PlanExecutor {
    dispatcher: StepDispatcher,
    policy: ContinuationPolicy,
    max_parallel: usize,
    telemetry: TelemetryCollector,
}

impl PlanExecutor {
    /// Create a sequential, continue-on-error executor
    pub fn new(dispatcher: StepDispatcher) -> Self {
        Self {
            dispatcher,
            policy: ContinuationPolicy::default(),
            max_parallel: SEQUENTIAL,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Set the continuation policy (sequential mode only)
    pub fn with_policy(mut self, policy: ContinuationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Allow up to `max_parallel` steps in flight; 0 is treated as 1
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(SEQUENTIAL);
        self
    }

    /// Share a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn policy(&self) -> ContinuationPolicy {
        self.policy
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn dispatcher(&self) -> &StepDispatcher {
        &self.dispatcher
    }

    /// Execute every step of `plan`. Never fails; step faults live in the trace.
    pub async fn run(&self, plan: &Plan) -> ExecutionTrace {
        let start = Instant::now();
        self.telemetry.record(TelemetryEvent::PlanStarted {
            step_count: plan.len(),
            timestamp: Instant::now(),
        });

        let results = if self.max_parallel > SEQUENTIAL {
            self.run_concurrent(plan).await
        } else {
            self.run_sequential(plan).await
        };

        let trace = ExecutionTrace::new(results);
        self.telemetry.record(TelemetryEvent::PlanCompleted {
            step_count: trace.len(),
            failed: trace.failure_count(),
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });
        trace
    }

    async fn run_sequential(&self, plan: &Plan) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());
        let mut halted_after: Option<usize> = None;

        for (i, step) in plan.iter().enumerate() {
            let index = i + 1;

            if let Some(halt) = halted_after {
                results.push(StepResult::failure(step, skipped_message(halt), Duration::ZERO));
                continue;
            }

            let result = self.run_step(index, step).await;
            if !self.policy.should_continue(&result) {
                halted_after = Some(index);
            }
            results.push(result);
        }

        results
    }

    async fn run_concurrent(&self, plan: &Plan) -> Vec<StepResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));

        let pending = plan.iter().enumerate().map(|(i, step)| {
            let semaphore = semaphore.clone();
            async move {
                // Never closed, so acquisition only fails if that changes
                let _permit = semaphore.acquire().await.ok();
                self.run_step(i + 1, step).await
            }
        });

        // join_all yields results in input order
        join_all(pending).await
    }

    async fn run_step(&self, index: usize, step: &PlanStep) -> StepResult {
        self.telemetry.record(TelemetryEvent::StepStarted {
            index,
            tool: step.tool_name.clone(),
            timestamp: Instant::now(),
        });

        let result = self.dispatcher.dispatch(step).await;

        self.telemetry.record(TelemetryEvent::StepCompleted {
            index,
            tool: step.tool_name.clone(),
            duration_ms: result.duration_ms(),
            success: result.is_ok(),
            timestamp: Instant::now(),
        });
        result
    }
}
