// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The local terminal an attach session is bridged to.

use std::io::{self, IsTerminal};
use std::pin::Pin;

use futures::Stream;
use krun_k8s::TerminalSize;
use tokio::io::{AsyncRead, AsyncWrite};

pub type TerminalReader = Pin<Box<dyn AsyncRead + Send>>;
pub type TerminalWriter = Pin<Box<dyn AsyncWrite + Send>>;
pub type ResizeEvents = Pin<Box<dyn Stream<Item = TerminalSize> + Send>>;

/// Restores the terminal mode it was created for when dropped.
pub struct RawModeGuard {
	restore: Option<Box<dyn FnOnce() + Send>>,
}

impl RawModeGuard {
	pub fn new(restore: impl FnOnce() + Send + 'static) -> Self {
		Self {
			restore: Some(Box::new(restore)),
		}
	}

	/// A guard for a terminal whose mode was never changed.
	pub fn noop() -> Self {
		Self { restore: None }
	}
}

impl Drop for RawModeGuard {
	fn drop(&mut self) {
		if let Some(restore) = self.restore.take() {
			restore();
		}
	}
}

/// A local terminal: raw-mode control, size queries and byte streams.
pub trait Terminal: Send {
	/// Switch to raw mode until the returned guard is dropped.
	fn enter_raw_mode(&mut self) -> io::Result<RawModeGuard>;

	/// Current size, when the output is a terminal.
	fn size(&self) -> Option<TerminalSize>;

	/// Sizes reported after each local resize.
	fn resize_events(&mut self) -> Option<ResizeEvents> {
		None
	}

	/// Hand over the input and output byte streams.
	fn into_io(self) -> (TerminalReader, TerminalWriter);
}

/// The process's own stdin and stdout.
#[derive(Debug, Default)]
pub struct StdioTerminal;

impl StdioTerminal {
	pub fn new() -> Self {
		Self
	}
}

impl Terminal for StdioTerminal {
	fn enter_raw_mode(&mut self) -> io::Result<RawModeGuard> {
		// Piped stdin has no mode to change.
		if !io::stdin().is_terminal() {
			return Ok(RawModeGuard::noop());
		}
		crossterm::terminal::enable_raw_mode()?;
		Ok(RawModeGuard::new(|| {
			if let Err(e) = crossterm::terminal::disable_raw_mode() {
				tracing::warn!(error = %e, "failed to restore terminal mode");
			}
		}))
	}

	fn size(&self) -> Option<TerminalSize> {
		current_size()
	}

	#[cfg(unix)]
	fn resize_events(&mut self) -> Option<ResizeEvents> {
		use tokio::signal::unix::{signal, SignalKind};

		if !io::stdout().is_terminal() {
			return None;
		}
		let winch = match signal(SignalKind::window_change()) {
			Ok(winch) => winch,
			Err(e) => {
				tracing::debug!(error = %e, "resize notifications unavailable");
				return None;
			}
		};

		let events = futures::stream::unfold(winch, |mut winch| async move {
			loop {
				winch.recv().await?;
				if let Some(size) = current_size() {
					return Some((size, winch));
				}
			}
		});
		Some(Box::pin(events))
	}

	fn into_io(self) -> (TerminalReader, TerminalWriter) {
		(Box::pin(tokio::io::stdin()), Box::pin(tokio::io::stdout()))
	}
}

fn current_size() -> Option<TerminalSize> {
	if !io::stdout().is_terminal() {
		return None;
	}
	let (width, height) = crossterm::terminal::size().ok()?;
	Some(TerminalSize { width, height })
}
