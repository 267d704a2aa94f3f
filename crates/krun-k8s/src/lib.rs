// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for krun pod sessions.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - Cluster session discovery (in-cluster credentials or kubeconfig)

mod client;
mod error;
mod kube_client;
mod session;
mod types;

pub use client::K8sClient;
pub use error::K8sError;
pub use kube_client::KubeClient;
pub use session::{ClusterSession, SessionOptions, SERVICE_ACCOUNT_NAMESPACE_PATH};
pub use types::{
	AttachCompletion, AttachedProcess, Container, EnvVar, ObjectMeta, Pod, PodSpec, PodStatus,
	Quantity, ResourceRequirements, TerminalSize, Toleration,
};
