// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use krun_k8s::K8sError;
use thiserror::Error;

use crate::types::PodPhase;

/// Failure of a single pod lifecycle operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
	#[error(transparent)]
	Api(#[from] K8sError),

	#[error("{operation} timed out after {after:?}")]
	Timeout {
		operation: &'static str,
		after: Duration,
	},

	#[error("pod {name} reached phase {phase} before running")]
	TerminalPhase { name: String, phase: PodPhase },

	#[error("{operation} cancelled")]
	Cancelled { operation: &'static str },

	#[error("API server returned a pod without a name")]
	MissingName,

	#[error("terminal error: {0}")]
	Terminal(std::io::Error),

	#[error("stream error: {0}")]
	Stream(std::io::Error),
}

impl LifecycleError {
	pub fn is_cancelled(&self) -> bool {
		matches!(self, LifecycleError::Cancelled { .. })
	}
}

/// Primary failure of a session, tagged with the phase that produced it.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("failed to create pod: {0}")]
	Create(LifecycleError),

	#[error("failed to wait for pod to start: {0}")]
	Wait(LifecycleError),

	#[error("failed to attach to pod: {0}")]
	Attach(LifecycleError),
}

impl SessionError {
	/// The lifecycle failure underneath the phase tag.
	pub fn lifecycle(&self) -> &LifecycleError {
		match self {
			SessionError::Create(e) | SessionError::Wait(e) | SessionError::Attach(e) => e,
		}
	}
}
