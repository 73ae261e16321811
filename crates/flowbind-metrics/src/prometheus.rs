//! Prometheus text exposition format.
//!
//! Renders a stats snapshot for scraping by a Prometheus server or a
//! compatible agent.

use std::fmt::Write;

use crate::stats::{DeltaErrorKind, StatsSnapshot};

/// Render a snapshot into Prometheus text format.
///
/// `bridge` labels every sample so several bridges can share a scraper.
pub fn render_prometheus(bridge: &str, snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();

    counter(
        &mut out,
        "flowbind_readiness_probes_total",
        "Engine health probes issued while waiting for readiness.",
        bridge,
        snapshot.readiness_probes,
    );
    counter(
        &mut out,
        "flowbind_iterations_total",
        "Scheduling loop iterations.",
        bridge,
        snapshot.iterations,
    );
    counter(
        &mut out,
        "flowbind_batch_failures_total",
        "Engine schedule requests that failed.",
        bridge,
        snapshot.batch_failures,
    );

    out.push_str("# HELP flowbind_last_batch_size Deltas in the most recent batch.\n");
    out.push_str("# TYPE flowbind_last_batch_size gauge\n");
    let _ = writeln!(
        out,
        "flowbind_last_batch_size{{bridge=\"{bridge}\"}} {}",
        snapshot.last_batch_size
    );

    counter(
        &mut out,
        "flowbind_deltas_received_total",
        "Scheduling deltas received from the engine.",
        bridge,
        snapshot.deltas_received,
    );

    out.push_str("# HELP flowbind_deltas_applied_total Deltas applied, by outcome.\n");
    out.push_str("# TYPE flowbind_deltas_applied_total counter\n");
    for (outcome, value) in [
        ("placed", snapshot.placements),
        ("requeued", snapshot.requeues),
        ("noop", snapshot.noops),
    ] {
        let _ = writeln!(
            out,
            "flowbind_deltas_applied_total{{bridge=\"{bridge}\",outcome=\"{outcome}\"}} {value}"
        );
    }

    out.push_str("# HELP flowbind_delta_errors_total Deltas that could not be applied, by reason.\n");
    out.push_str("# TYPE flowbind_delta_errors_total counter\n");
    for (kind, value) in [
        (DeltaErrorKind::BrokenInvariant, snapshot.broken_invariant_errors),
        (DeltaErrorKind::UnknownKind, snapshot.unknown_kind_errors),
        (
            DeltaErrorKind::UncontrolledWorkload,
            snapshot.uncontrolled_workload_errors,
        ),
        (DeltaErrorKind::Orchestrator, snapshot.orchestrator_errors),
    ] {
        let _ = writeln!(
            out,
            "flowbind_delta_errors_total{{bridge=\"{bridge}\",reason=\"{}\"}} {value}",
            kind.label()
        );
    }

    out
}

fn counter(out: &mut String, name: &str, help: &str, bridge: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name}{{bridge=\"{bridge}\"}} {value}");
}
