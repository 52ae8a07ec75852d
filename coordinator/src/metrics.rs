//! Prometheus metrics for the work coordinator.
//!
//! [`CoordinatorMetrics`] owns a dedicated [`Registry`] that the RPC
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::CoordinatorError;

pub struct CoordinatorMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Calls to `generate`.
    pub races_started: IntCounter,
    /// Winning results, labelled by `source` (peer, distributed, local).
    pub wins: IntCounterVec,
    /// Candidates that answered with an `error` body, by `source`.
    pub solver_errors: IntCounterVec,
    /// Candidates that faulted (transport error, bad status, malformed body), by `source`.
    pub faults: IntCounterVec,
    /// Candidates dropped because their round timed out.
    pub candidates_timed_out: IntCounter,
    /// Races where no candidate produced work.
    pub total_failures: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// End-to-end `generate` latency, in milliseconds.
    pub generate_latency_ms: Histogram,
}

impl CoordinatorMetrics {
    pub fn new() -> Result<Self, CoordinatorError> {
        let registry = Registry::new();

        let races_started = register_int_counter_with_registry!(
            Opts::new("powrace_races_started_total", "Total work_generate races started"),
            registry
        )?;

        let wins = register_int_counter_vec_with_registry!(
            Opts::new("powrace_race_wins_total", "Races won, by winning source"),
            &["source"],
            registry
        )?;

        let solver_errors = register_int_counter_vec_with_registry!(
            Opts::new(
                "powrace_solver_errors_total",
                "Candidates that answered with an error body"
            ),
            &["source"],
            registry
        )?;

        let faults = register_int_counter_vec_with_registry!(
            Opts::new("powrace_candidate_faults_total", "Candidates that faulted"),
            &["source"],
            registry
        )?;

        let candidates_timed_out = register_int_counter_with_registry!(
            Opts::new(
                "powrace_candidates_timed_out_total",
                "Candidates cancelled by a round timeout"
            ),
            registry
        )?;

        let total_failures = register_int_counter_with_registry!(
            Opts::new(
                "powrace_total_failures_total",
                "Races that fell through to final local computation"
            ),
            registry
        )?;

        // 1 ms → ~65 s.
        let generate_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "powrace_generate_latency_ms",
                "work_generate latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 17)?),
            registry
        )?;

        Ok(Self {
            registry,
            races_started,
            wins,
            solver_errors,
            faults,
            candidates_timed_out,
            total_failures,
            generate_latency_ms,
        })
    }

    /// Encode every metric in the text exposition format.
    pub fn render(&self) -> Result<String, CoordinatorError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        let text = String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))?;
        Ok(text)
    }
}
