// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interrupt handling. The only process-wide signal state lives here; the
//! rest of the program sees a cancellation token.

use std::future::Future;
use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status for a session abandoned by a repeated interrupt.
const EXIT_INTERRUPTED: i32 = 130;

/// Cancel `cancel` on the first SIGINT or SIGTERM. A second one while
/// cleanup is still running exits the process without waiting for it.
pub fn spawn_listener(cancel: CancellationToken) -> JoinHandle<()> {
	spawn_listener_on(cancel, shutdown_signal(), || async {
		if let Ok(name) = shutdown_signal().await {
			warn!(signal = name, "received second interrupt, exiting without cleanup");
			std::process::exit(EXIT_INTERRUPTED);
		}
	})
}

fn spawn_listener_on<F, R, RF>(
	cancel: CancellationToken,
	signal: F,
	on_repeat: R,
) -> JoinHandle<()>
where
	F: Future<Output = io::Result<&'static str>> + Send + 'static,
	R: FnOnce() -> RF + Send + 'static,
	RF: Future<Output = ()> + Send,
{
	tokio::spawn(async move {
		tokio::select! {
			_ = cancel.cancelled() => {}
			received = signal => match received {
				Ok(name) => {
					info!(signal = name, "received interrupt, ending session");
					cancel.cancel();
					on_repeat().await;
				}
				Err(e) => warn!(error = %e, "failed to listen for interrupt signals"),
			},
		}
	})
}

#[cfg(unix)]
async fn shutdown_signal() -> io::Result<&'static str> {
	use tokio::signal::unix::{signal, SignalKind};

	let mut terminate = signal(SignalKind::terminate())?;
	tokio::select! {
		result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
		_ = terminate.recv() => Ok("SIGTERM"),
	}
}

#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<&'static str> {
	tokio::signal::ctrl_c().await?;
	Ok("ctrl-c")
}
