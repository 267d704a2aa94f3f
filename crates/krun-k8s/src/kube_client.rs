// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
	api::{Api, AttachParams, DeleteParams, PostParams},
	Client,
};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::{is_not_found, K8sError};
use crate::types::AttachedProcess;

/// Production K8s client implementation using the kube crate.
#[derive(Clone)]
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Wrap an already configured kube client.
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	fn pods(&self, namespace: &str) -> Api<Pod> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	#[instrument(skip(self, pod), fields(namespace = %namespace))]
	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError> {
		let pod = self.pods(namespace).create(&PostParams::default(), &pod).await?;
		debug!(pod_name = ?pod.metadata.name, "pod created");
		Ok(pod)
	}

	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError> {
		match self.pods(namespace).get(name).await {
			Ok(pod) => Ok(pod),
			Err(err) if is_not_found(&err) => Err(K8sError::PodNotFound { name: name.into() }),
			Err(e) => Err(e.into()),
		}
	}

	async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		match self.pods(namespace).delete(name, &DeleteParams::default()).await {
			Ok(_) => Ok(()),
			Err(err) if is_not_found(&err) => Err(K8sError::PodNotFound { name: name.into() }),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self), fields(pod_name = %name, namespace = %namespace))]
	async fn attach_pod(
		&self,
		name: &str,
		namespace: &str,
		container: &str,
	) -> Result<AttachedProcess, K8sError> {
		// stderr must stay off: the API rejects stderr together with a TTY,
		// and the TTY already carries it on stdout.
		let ap = AttachParams::interactive_tty().container(container);

		let mut attached = self.pods(namespace).attach(name, &ap).await.map_err(|e| {
			if is_not_found(&e) {
				K8sError::PodNotFound { name: name.into() }
			} else {
				K8sError::AttachError {
					message: e.to_string(),
				}
			}
		})?;

		let stdin = attached.stdin().ok_or_else(|| K8sError::AttachError {
			message: "stdin not available".into(),
		})?;
		let stdout = attached.stdout().ok_or_else(|| K8sError::AttachError {
			message: "stdout not available".into(),
		})?;
		let resize = attached.terminal_size();
		let status = attached.take_status();

		let completion = async move {
			if let Some(status) = status {
				if let Some(status) = status.await {
					if status.status.as_deref() == Some("Failure") {
						return Err(K8sError::AttachError {
							message: status
								.message
								.unwrap_or_else(|| "remote reported failure".to_string()),
						});
					}
				}
			}
			attached.join().await.map_err(|e| K8sError::AttachError {
				message: e.to_string(),
			})
		};

		debug!("attach stream established");

		Ok(AttachedProcess {
			stdin: Box::pin(stdin),
			stdout: Box::pin(stdout),
			resize,
			completion: Box::pin(completion),
		})
	}
}
