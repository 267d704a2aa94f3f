// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lifecycle of one disposable pod: create, wait, attach, delete.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use krun_k8s::{AttachedProcess, K8sClient, K8sError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::ControllerConfig;
use crate::error::LifecycleError;
use crate::spec::{build_pod, PodSpecRequest, CONTAINER_NAME};
use crate::terminal::Terminal;
use crate::types::{PodHandle, PodPhase};

/// Printed before the stream starts, since an idle shell shows nothing.
pub const ATTACH_HINT: &str = "If you don't see a command prompt, try pressing enter.\r\n";

const STREAM_BUFFER_SIZE: usize = 8 * 1024;

/// Drives a single pod through its lifecycle against a cluster client.
pub struct PodController {
	client: Arc<dyn K8sClient>,
	config: ControllerConfig,
}

impl PodController {
	pub fn new(client: Arc<dyn K8sClient>, config: ControllerConfig) -> Self {
		Self { client, config }
	}

	/// Submit the pod for `req` and return its server-assigned identity.
	#[instrument(skip(self, cancel, req), fields(namespace = %namespace))]
	pub async fn create_pod(
		&self,
		cancel: &CancellationToken,
		namespace: &str,
		req: &PodSpecRequest,
	) -> Result<PodHandle, LifecycleError> {
		let pod = build_pod(req);
		debug!(
			command = ?req.command_line(),
			image = %req.image,
			"creating pod"
		);

		let created = bounded(
			cancel,
			"create pod",
			self.config.create_timeout,
			self.client.create_pod(namespace, pod),
		)
		.await?;

		let name = created.metadata.name.ok_or(LifecycleError::MissingName)?;
		let namespace = created
			.metadata
			.namespace
			.unwrap_or_else(|| namespace.to_string());

		debug!(pod_name = %name, namespace = %namespace, "pod created");
		Ok(PodHandle::new(name, namespace))
	}

	/// Poll until the pod is running.
	///
	/// Returns as soon as `Running` is observed. A terminal phase, a failed
	/// fetch or cancellation ends the wait with an error. There is no overall
	/// deadline: callers bound the wait through `cancel`.
	#[instrument(skip(self, cancel), fields(pod_name = %handle.name, namespace = %handle.namespace))]
	pub async fn wait_until_running(
		&self,
		cancel: &CancellationToken,
		handle: &PodHandle,
	) -> Result<(), LifecycleError> {
		let mut ticker = tokio::time::interval(self.config.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = cancel.cancelled() => {
					return Err(LifecycleError::Cancelled { operation: "wait for pod" });
				}
				_ = ticker.tick() => {}
			}

			let pod = bounded(
				cancel,
				"get pod status",
				self.config.status_timeout,
				self.client.get_pod(&handle.name, &handle.namespace),
			)
			.await?;

			let phase = PodPhase::of(&pod);
			debug!(phase = %phase, "observed pod phase");

			if phase == PodPhase::Running {
				return Ok(());
			}
			if phase.is_terminal() {
				return Err(LifecycleError::TerminalPhase {
					name: handle.name.clone(),
					phase,
				});
			}
		}
	}

	/// Bridge `terminal` to the pod's TTY until the remote side closes.
	///
	/// The terminal stays in raw mode for exactly the duration of this call.
	/// Cancellation ends the stream without waiting for the remote side.
	#[instrument(skip(self, cancel, terminal), fields(pod_name = %handle.name, namespace = %handle.namespace))]
	pub async fn attach<T: Terminal>(
		&self,
		cancel: &CancellationToken,
		handle: &PodHandle,
		mut terminal: T,
	) -> Result<(), LifecycleError> {
		debug!("attaching to pod");

		let process = tokio::select! {
			_ = cancel.cancelled() => {
				return Err(LifecycleError::Cancelled { operation: "attach" });
			}
			result = self.client.attach_pod(&handle.name, &handle.namespace, CONTAINER_NAME) => result?,
		};
		let AttachedProcess {
			stdin: remote_stdin,
			stdout: mut remote_stdout,
			resize,
			completion,
		} = process;

		let size = terminal.size();
		let resize_events = terminal.resize_events();
		let _raw_mode = terminal.enter_raw_mode().map_err(LifecycleError::Terminal)?;
		let (local_input, mut local_output) = terminal.into_io();

		write_chunk(&mut local_output, ATTACH_HINT.as_bytes())
			.await
			.map_err(LifecycleError::Stream)?;

		let resize_task = match resize {
			Some(mut sizes) => {
				if let Some(size) = size {
					if let Err(e) = sizes.send(size).await {
						debug!(error = %e, "failed to send initial terminal size");
					}
				}
				resize_events.map(|mut events| {
					tokio::spawn(async move {
						while let Some(size) = events.next().await {
							if let Err(e) = sizes.send(size).await {
								debug!(error = %e, "resize channel closed");
								break;
							}
						}
					})
				})
			}
			None => None,
		};

		let input_task = tokio::spawn(pump_input(local_input, remote_stdin));

		let mut buf = vec![0u8; STREAM_BUFFER_SIZE];
		let outcome = loop {
			tokio::select! {
				_ = cancel.cancelled() => {
					break Err(LifecycleError::Cancelled { operation: "attach" });
				}
				read = remote_stdout.read(&mut buf) => match read {
					Ok(0) => break Ok(()),
					Ok(n) => {
						if let Err(e) = write_chunk(&mut local_output, &buf[..n]).await {
							break Err(LifecycleError::Stream(e));
						}
					}
					Err(e) => break Err(LifecycleError::Stream(e)),
				},
			}
		};

		input_task.abort();
		if let Some(task) = resize_task {
			task.abort();
		}
		outcome?;

		debug!("remote stream closed");
		tokio::select! {
			_ = cancel.cancelled() => Err(LifecycleError::Cancelled { operation: "attach" }),
			result = completion => result.map_err(LifecycleError::from),
		}
	}

	/// Delete the pod. A pod that is already gone counts as deleted.
	///
	/// Takes no cancellation token: cleanup has to run even after the
	/// session was interrupted, bounded only by the delete timeout.
	#[instrument(skip(self), fields(pod_name = %handle.name, namespace = %handle.namespace))]
	pub async fn delete_pod(&self, handle: &PodHandle) -> Result<(), LifecycleError> {
		debug!("deleting pod");

		let delete = self.client.delete_pod(&handle.name, &handle.namespace);
		match tokio::time::timeout(self.config.delete_timeout, delete).await {
			Ok(Ok(())) => {
				debug!("pod deleted");
				Ok(())
			}
			Ok(Err(K8sError::PodNotFound { .. })) => {
				debug!("pod already deleted");
				Ok(())
			}
			Ok(Err(e)) => Err(e.into()),
			Err(_) => Err(LifecycleError::Timeout {
				operation: "delete pod",
				after: self.config.delete_timeout,
			}),
		}
	}
}

/// Run one API call under a timeout, giving up early on cancellation.
async fn bounded<T>(
	cancel: &CancellationToken,
	operation: &'static str,
	limit: Duration,
	call: impl Future<Output = Result<T, K8sError>>,
) -> Result<T, LifecycleError> {
	tokio::select! {
		_ = cancel.cancelled() => Err(LifecycleError::Cancelled { operation }),
		result = tokio::time::timeout(limit, call) => match result {
			Ok(result) => result.map_err(LifecycleError::from),
			Err(_) => Err(LifecycleError::Timeout { operation, after: limit }),
		},
	}
}

async fn write_chunk<W>(writer: &mut W, data: &[u8]) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin + ?Sized,
{
	writer.write_all(data).await?;
	writer.flush().await
}

/// Forward local input to the remote stdin until either side closes.
async fn pump_input<R, W>(mut input: R, mut remote: W)
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut buf = [0u8; 1024];
	loop {
		match input.read(&mut buf).await {
			Ok(0) => break,
			Ok(n) => {
				if write_chunk(&mut remote, &buf[..n]).await.is_err() {
					return;
				}
			}
			Err(e) => {
				debug!(error = %e, "local input closed");
				break;
			}
		}
	}
	let _ = remote.shutdown().await;
}
