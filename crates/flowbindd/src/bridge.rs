//! Bridge mode: wires the engine, registry, orchestrator, scheduling loop,
//! and bridge API together and runs them until shutdown.
//!
//! Startup order:
//! 1. Engine channel (lazy, nothing is dialled yet)
//! 2. Registry, stats, orchestrator, scheduling loop
//! 3. Bridge API, so observers can register identities while we wait
//! 4. Readiness gate
//! 5. Scheduling loop, in the foreground until shutdown or abort

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use flowbind_api::{ApiState, build_router};
use flowbind_core::BridgeConfig;
use flowbind_engine::{GrpcEngine, SchedulingEngine};
use flowbind_metrics::BridgeStats;
use flowbind_orchestrator::{DryRunOrchestrator, KubeOrchestrator, Orchestrator};
use flowbind_registry::IdentityRegistry;
use flowbind_scheduler::{Dispatcher, ReadinessGate, SchedulingLoop};

/// Run the bridge until Ctrl-C, or until the scheduling loop aborts.
pub async fn run_bridge(config: BridgeConfig) -> anyhow::Result<()> {
    info!(
        scheduler = %config.scheduler_name,
        engine = %config.engine_endpoint(),
        dry_run = config.dry_run,
        "flowbind bridge starting"
    );

    // ── Core components ──────────────────────────────────────────

    let request_timeout = config.request_timeout()?;
    let engine: Arc<dyn SchedulingEngine> = Arc::new(GrpcEngine::connect_lazy(
        &config.engine_endpoint(),
        request_timeout,
    )?);

    let registry = Arc::new(IdentityRegistry::new());
    let stats = Arc::new(BridgeStats::new());
    let orchestrator = build_orchestrator(&config, request_timeout);

    let dispatcher = Dispatcher::new(
        registry.clone(),
        orchestrator,
        stats.clone(),
        config.uncontrolled_workload_policy,
    );
    let scheduling_loop = SchedulingLoop::new(
        engine.clone(),
        dispatcher,
        stats.clone(),
        config.scheduling_interval()?,
    )
    .with_invariant_policy(config.broken_invariant_policy);

    // ── Shutdown signal ──────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    spawn_signal_handler(shutdown_tx.clone());

    // ── Bridge API ───────────────────────────────────────────────

    let router = build_router(ApiState {
        bridge_name: config.scheduler_name.clone(),
        registry,
        stats: stats.clone(),
        trigger: scheduling_loop.trigger_handle(),
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    info!(addr = %listener.local_addr()?, "bridge API listening");

    let mut server_shutdown = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    // ── Readiness gate ───────────────────────────────────────────

    let gate = ReadinessGate::new(config.readiness_timeout()?, config.readiness_poll_interval()?)
        .with_stats(stats);
    let mut gate_shutdown = shutdown_rx.clone();

    let ready = tokio::select! {
        result = gate.wait_until_ready(engine.as_ref()) => Some(result),
        _ = gate_shutdown.changed() => None,
    };

    // ── Scheduling loop ──────────────────────────────────────────

    let loop_result = match ready {
        None => {
            info!("shutdown requested before the engine became ready");
            Ok(())
        }
        Some(Err(e)) => {
            error!(error = %e, "engine never became ready");
            Err(e)
        }
        Some(Ok(_)) => scheduling_loop.run(shutdown_rx).await,
    };

    // Stop the API server whatever the reason the loop ended.
    let _ = shutdown_tx.send(true);
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "bridge API server failed"),
        Err(e) => warn!(error = %e, "bridge API task panicked"),
    }

    loop_result?;
    info!("flowbind bridge stopped");
    Ok(())
}

/// Probe the engine once and report whether it is serving.
pub async fn check_engine(config: &BridgeConfig) -> anyhow::Result<()> {
    let engine = GrpcEngine::connect_lazy(&config.engine_endpoint(), config.request_timeout()?)?;

    if engine.health_check().await? {
        info!(endpoint = engine.endpoint(), "engine is serving");
        Ok(())
    } else {
        anyhow::bail!("engine at {} is not serving", engine.endpoint())
    }
}

fn build_orchestrator(
    config: &BridgeConfig,
    request_timeout: std::time::Duration,
) -> Arc<dyn Orchestrator> {
    if config.dry_run {
        info!("dry run: orchestrator actions will only be logged");
        return Arc::new(DryRunOrchestrator::new());
    }

    let mut kube = KubeOrchestrator::new(config.api_server.clone()).with_timeout(request_timeout);
    if let Some(ref token) = config.api_token {
        kube = kube.with_token(token.clone());
    }
    info!(api_server = %kube.address(), "using Kubernetes orchestrator");
    Arc::new(kube)
}

/// Flip the shutdown watch on Ctrl-C.
fn spawn_signal_handler(shutdown_tx: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a handler the bridge only stops if the loop aborts.
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
