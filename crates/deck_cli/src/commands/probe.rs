//! Probe command - Check backend reachability.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use deck_chat::{ChatError, ConnectionMonitor, ConnectionStatus};

use super::GlobalOpts;
use crate::render;

#[derive(Args)]
pub struct ProbeArgs {
    /// Keep probing at the configured interval until interrupted
    #[arg(short, long)]
    watch: bool,

    /// Override the polling interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

pub async fn execute(global: &GlobalOpts, args: ProbeArgs) -> Result<()> {
    let connection = global.connect()?;
    let monitor = ConnectionMonitor::new(connection.backend);

    if !args.watch {
        let status = monitor.check_now().await;
        println!("{} ({})", render::status(status), connection.settings.base_url);
        if status != ConnectionStatus::Connected {
            return Err(ChatError::Disconnected.into());
        }
        return Ok(());
    }

    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| connection.settings.probe_interval());
    if interval.is_zero() {
        anyhow::bail!("--interval must be at least one second");
    }

    let mut rx = monitor.subscribe();
    let _task = monitor.spawn_polling(interval);
    println!("Probing {} every {:?} (Ctrl-C to stop)", connection.settings.base_url, interval);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *rx.borrow_and_update();
                println!("{}", render::status(status));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
