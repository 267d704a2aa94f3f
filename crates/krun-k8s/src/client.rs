// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{AttachedProcess, Pod};

/// Trait for K8s client operations.
///
/// This abstraction allows for easy mocking in tests while providing
/// the handful of pod operations a krun session needs.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Create a new pod in the given namespace and return the stored object,
	/// including the name the API server generated for it.
	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError>;

	/// Get a specific pod by name from the given namespace.
	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError>;

	/// Delete a pod by name from the given namespace.
	///
	/// Returns `K8sError::PodNotFound` when the pod is already gone.
	async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), K8sError>;

	/// Attach to a running container's TTY for interactive I/O.
	async fn attach_pod(
		&self,
		name: &str,
		namespace: &str,
		container: &str,
	) -> Result<AttachedProcess, K8sError>;
}
