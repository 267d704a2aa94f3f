// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use krun_k8s::Pod;

/// Identity of a submitted pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodHandle {
	/// Name assigned by the API server from the generated-name prefix.
	pub name: String,
	pub namespace: String,
}

impl PodHandle {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			namespace: namespace.into(),
		}
	}
}

impl fmt::Display for PodHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}

/// Pod lifecycle phase as reported by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
	/// Accepted but not all containers started yet
	Pending,
	/// Bound to a node with at least one container running
	Running,
	/// All containers exited successfully
	Succeeded,
	/// All containers exited, at least one with failure
	Failed,
	/// State could not be obtained from the node
	Unknown,
}

impl PodPhase {
	/// Parse the raw phase string. Absent or unrecognized values are
	/// reported as `Pending` so the caller keeps waiting.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw {
			Some("Running") => PodPhase::Running,
			Some("Succeeded") => PodPhase::Succeeded,
			Some("Failed") => PodPhase::Failed,
			Some("Unknown") => PodPhase::Unknown,
			_ => PodPhase::Pending,
		}
	}

	/// Phase of a fetched pod object.
	pub fn of(pod: &Pod) -> Self {
		Self::parse(pod.status.as_ref().and_then(|s| s.phase.as_deref()))
	}

	/// Whether the pod can no longer reach `Running`.
	pub fn is_terminal(self) -> bool {
		matches!(
			self,
			PodPhase::Succeeded | PodPhase::Failed | PodPhase::Unknown
		)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			PodPhase::Pending => "Pending",
			PodPhase::Running => "Running",
			PodPhase::Succeeded => "Succeeded",
			PodPhase::Failed => "Failed",
			PodPhase::Unknown => "Unknown",
		}
	}
}

impl fmt::Display for PodPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
