// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::pin::Pin;

use futures::channel::mpsc;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::K8sError;

pub use k8s_openapi::api::core::v1::{
	Container, EnvVar, Pod, PodSpec, PodStatus, ResourceRequirements, Toleration,
};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use kube::api::TerminalSize;

/// Resolves once the remote side of an attach session has gone away.
pub type AttachCompletion = Pin<Box<dyn Future<Output = Result<(), K8sError>> + Send>>;

/// Bidirectional stream to a container's TTY via attach.
///
/// With a TTY the kubelet merges stderr into stdout, so only one output
/// stream exists.
pub struct AttachedProcess {
	pub stdin: Pin<Box<dyn AsyncWrite + Send>>,
	pub stdout: Pin<Box<dyn AsyncRead + Send>>,
	/// Sender for terminal resize events, when the connection supports them.
	pub resize: Option<mpsc::Sender<TerminalSize>>,
	/// Completes when the connection closes; yields an error for a failed
	/// remote status.
	pub completion: AttachCompletion,
}
