//! framelinkd — live frame relay daemon.

use std::time::Duration;

use anyhow::{Context, Result};

use framelink_core::config::{FramelinkConfig, Transport};
use framelink_core::frame::{OpaqueCodec, PassthroughTransform};
use framelink_core::mode::ModeSwitch;

use framelinkd::control;
use framelinkd::datagram::DatagramRelay;
use framelinkd::relay::FrameProcessor;
use framelinkd::stream::StreamServer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = FramelinkConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = FramelinkConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FramelinkConfig::default()
    });

    tracing::info!(transport = ?config.network.transport, "framelinkd starting");

    // The one piece of cross-task shared state.
    let modes = ModeSwitch::default();

    let processor = FrameProcessor::new(
        modes.clone(),
        Box::new(OpaqueCodec::new(
            config.relay.frame_width,
            config.relay.frame_height,
        )),
        Box::new(PassthroughTransform),
        Duration::from_secs(config.relay.metrics_interval_secs),
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let control_task = tokio::spawn(control::input_loop(
        modes.clone(),
        shutdown_tx.subscribe(),
    ));

    let relay_task = match config.network.transport {
        Transport::Stream => {
            let server = StreamServer::bind(
                &config.network.stream_listen_addr,
                processor,
                shutdown_tx.subscribe(),
            )
            .await
            .context("failed to start stream server")?;
            tokio::spawn(server.run())
        }
        Transport::Datagram => {
            let peer = config
                .network
                .peer_addr
                .parse()
                .with_context(|| format!("invalid peer_addr {:?}", config.network.peer_addr))?;
            let relay = DatagramRelay::bind(
                &config.network.datagram_listen_addr,
                peer,
                config.relay.reassembly_window,
                Duration::from_secs(config.relay.stale_entry_secs),
                processor,
                shutdown_tx.subscribe(),
            )
            .await
            .context("failed to start datagram relay")?;
            tokio::spawn(relay.run())
        }
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = relay_task         => tracing::error!("relay task exited: {:?}", r),
        r = control_task       => tracing::error!("control input exited: {:?}", r),
    }

    Ok(())
}
