//! Control input — maps operator text to mode switches.
//!
//! Reads lines from stdin: a single keystroke shortcut ("1".."4") or
//! free-form words standing in for a voice transcript. Runs concurrently
//! with the relay loop; the only state it touches is the [`ModeSwitch`].

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use framelink_core::mode::{Mode, ModeSwitch};

fn print_help() {
    println!();
    println!("=== Mode controls ===");
    for mode in Mode::ALL {
        println!("  {:24} -> {}", mode.aliases().join(", "), mode);
    }
    println!("=====================");
    println!();
}

pub async fn input_loop(modes: ModeSwitch, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("control input shutting down");
                return Ok(());
            }

            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else {
                    tracing::info!("control input closed");
                    return Ok(());
                };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                match modes.apply_command(text) {
                    Ok(mode) => tracing::info!(%mode, "processing mode changed"),
                    Err(e) => tracing::warn!(error = %e, "mode command rejected"),
                }
            }
        }
    }
}
