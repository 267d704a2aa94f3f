// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster credential and namespace discovery.
//!
//! Resolution order:
//! 1. An explicit kubeconfig path, when one was given
//! 2. In-cluster service account (when running in K8s)
//! 3. `~/.kube/config`

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::error::K8sError;
use crate::kube_client::KubeClient;

/// Namespace file mounted into every pod with a service account token.
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
	"/var/run/secrets/kubernetes.io/serviceaccount/namespace";

const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Overrides for the kubeconfig fallback.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
	/// Explicit kubeconfig location. May hold several entries separated like
	/// `PATH`; the first one is used.
	pub kubeconfig: Option<OsString>,
	/// Kubeconfig context to use instead of the current one.
	pub context: Option<String>,
}

/// A connected client plus the namespace to default to.
#[derive(Clone)]
pub struct ClusterSession {
	client: KubeClient,
	namespace: String,
}

impl ClusterSession {
	/// Resolve credentials and the default namespace, then build a client.
	pub async fn connect(opts: &SessionOptions) -> Result<Self, K8sError> {
		let (config, namespace) = resolve_config(opts).await?;
		let client = Client::try_from(config).map_err(|e| K8sError::ClientBuild {
			message: e.to_string(),
		})?;

		debug!(namespace = %namespace, "cluster session established");

		Ok(Self {
			client: KubeClient::new(client),
			namespace,
		})
	}

	/// The client handle for pod operations.
	pub fn client(&self) -> &KubeClient {
		&self.client
	}

	/// The namespace pods go to when the caller does not pick one.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}
}

async fn resolve_config(opts: &SessionOptions) -> Result<(Config, String), K8sError> {
	if opts.kubeconfig.is_none() && running_in_cluster(|key| std::env::var_os(key)) {
		let config = Config::incluster().map_err(|e| K8sError::InClusterConfig {
			message: e.to_string(),
		})?;
		let namespace = read_namespace_file(Path::new(SERVICE_ACCOUNT_NAMESPACE_PATH))?;
		debug!("using in-cluster service account credentials");
		return Ok((config, namespace));
	}

	let path = kubeconfig_path(opts.kubeconfig.as_deref(), dirs::home_dir())?;
	debug!(path = %path.display(), "not running in cluster, loading kubeconfig");

	let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| K8sError::Kubeconfig {
		path: path.clone(),
		message: e.to_string(),
	})?;
	let options = KubeConfigOptions {
		context: opts.context.clone(),
		..Default::default()
	};
	let config = Config::from_custom_kubeconfig(kubeconfig, &options)
		.await
		.map_err(|e| K8sError::Kubeconfig {
			path,
			message: e.to_string(),
		})?;
	let namespace = config.default_namespace.clone();

	Ok((config, namespace))
}

/// In-cluster credentials are only usable when the API server location is
/// injected into the environment.
fn running_in_cluster(lookup: impl Fn(&str) -> Option<OsString>) -> bool {
	let present = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
	present(SERVICE_HOST_ENV) && present(SERVICE_PORT_ENV)
}

fn read_namespace_file(path: &Path) -> Result<String, K8sError> {
	let data = std::fs::read_to_string(path).map_err(|error| K8sError::InClusterNamespace {
		path: path.to_path_buf(),
		error,
	})?;
	Ok(data.trim().to_string())
}

fn kubeconfig_path(explicit: Option<&OsStr>, home: Option<PathBuf>) -> Result<PathBuf, K8sError> {
	let first = explicit.and_then(|raw| {
		std::env::split_paths(raw).find(|p| !p.as_os_str().is_empty())
	});
	if let Some(path) = first {
		return Ok(path);
	}
	home
		.map(|home| home.join(".kube").join("config"))
		.ok_or(K8sError::HomeDirNotFound)
}
