// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One interactive session: the full pod lifecycle plus guaranteed cleanup.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::PodController;
use crate::error::SessionError;
use crate::spec::PodSpecRequest;
use crate::terminal::Terminal;
use crate::types::PodHandle;

pub struct Session {
	controller: PodController,
	keep_pod: bool,
}

impl Session {
	/// With `keep_pod` set the pod is left in the cluster when the session ends.
	pub fn new(controller: PodController, keep_pod: bool) -> Self {
		Self {
			controller,
			keep_pod,
		}
	}

	/// Create the pod, wait for it, attach `terminal`, then clean up.
	///
	/// Once the pod exists, deletion is attempted exactly once whatever the
	/// outcome of the later steps. A failed deletion is logged and never
	/// replaces the primary result.
	pub async fn run<T: Terminal>(
		&self,
		cancel: &CancellationToken,
		namespace: &str,
		req: &PodSpecRequest,
		terminal: T,
	) -> Result<(), SessionError> {
		let handle = self
			.controller
			.create_pod(cancel, namespace, req)
			.await
			.map_err(SessionError::Create)?;

		let outcome = self.drive(cancel, &handle, terminal).await;
		self.cleanup(&handle).await;
		outcome
	}

	async fn drive<T: Terminal>(
		&self,
		cancel: &CancellationToken,
		handle: &PodHandle,
		terminal: T,
	) -> Result<(), SessionError> {
		self.controller
			.wait_until_running(cancel, handle)
			.await
			.map_err(SessionError::Wait)?;

		self.controller
			.attach(cancel, handle, terminal)
			.await
			.map_err(SessionError::Attach)
	}

	async fn cleanup(&self, handle: &PodHandle) {
		if self.keep_pod {
			info!(pod_name = %handle.name, namespace = %handle.namespace, "keeping pod");
			return;
		}
		if let Err(e) = self.controller.delete_pod(handle).await {
			warn!(
				pod_name = %handle.name,
				namespace = %handle.namespace,
				error = %e,
				"Failed to delete pod"
			);
		}
	}
}
