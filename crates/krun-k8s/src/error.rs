// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Pod not found: {name}")]
	PodNotFound { name: String },

	#[error("Attach error: {message}")]
	AttachError { message: String },

	#[error("error checking in-cluster config: {message}")]
	InClusterConfig { message: String },

	#[error("error getting in-cluster namespace from {path}: {error}")]
	InClusterNamespace {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("error reading kubeconfig {path}: {message}")]
	Kubeconfig { path: PathBuf, message: String },

	#[error("could not determine home directory for kubeconfig lookup")]
	HomeDirNotFound,

	#[error("failed to create kubernetes client: {message}")]
	ClientBuild { message: String },
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}

/// Whether a kube error is the API server reporting a missing object.
pub(crate) fn is_not_found(err: &kube::Error) -> bool {
	matches!(err, kube::Error::Api(resp) if resp.code == 404)
}
