// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pod request types and the pure pod builder.

use std::collections::BTreeMap;

use krun_k8s::{
	Container, EnvVar, ObjectMeta, Pod, PodSpec, Quantity, ResourceRequirements, Toleration,
};

/// Prefix for the name the API server generates for each pod.
pub const POD_NAME_PREFIX: &str = "krun-";
/// Name of the single container in every krun pod.
pub const CONTAINER_NAME: &str = "main";

const RESTART_POLICY_NEVER: &str = "Never";
const RESOURCE_CPU: &str = "cpu";
const RESOURCE_MEMORY: &str = "memory";

/// Optional CPU and memory requests and limits, each settable on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSpec {
	pub requests_cpu: Option<Quantity>,
	pub requests_memory: Option<Quantity>,
	pub limits_cpu: Option<Quantity>,
	pub limits_memory: Option<Quantity>,
}

impl ResourceSpec {
	fn to_requirements(&self) -> Option<ResourceRequirements> {
		let requests = resource_list(&self.requests_cpu, &self.requests_memory);
		let limits = resource_list(&self.limits_cpu, &self.limits_memory);

		if requests.is_none() && limits.is_none() {
			return None;
		}

		Some(ResourceRequirements {
			requests,
			limits,
			..Default::default()
		})
	}
}

fn resource_list(
	cpu: &Option<Quantity>,
	memory: &Option<Quantity>,
) -> Option<BTreeMap<String, Quantity>> {
	let mut list = BTreeMap::new();
	if let Some(cpu) = cpu {
		list.insert(RESOURCE_CPU.to_string(), cpu.clone());
	}
	if let Some(memory) = memory {
		list.insert(RESOURCE_MEMORY.to_string(), memory.clone());
	}
	(!list.is_empty()).then_some(list)
}

/// Everything needed to build one disposable pod, already validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSpecRequest {
	pub image: String,
	pub command: String,
	pub args: Vec<String>,
	pub service_account: Option<String>,
	pub labels: BTreeMap<String, String>,
	pub tolerations: Vec<Toleration>,
	pub node_selector: BTreeMap<String, String>,
	pub resources: ResourceSpec,
	pub env: BTreeMap<String, String>,
	/// Enforced by the cluster, not by krun.
	pub active_deadline_seconds: i64,
}

impl PodSpecRequest {
	/// The full container command line: executable followed by its arguments.
	pub fn command_line(&self) -> Vec<String> {
		std::iter::once(self.command.clone())
			.chain(self.args.iter().cloned())
			.collect()
	}
}

/// Build the pod object for a request.
///
/// Collections are only set when non-empty so the submitted object never
/// carries empty lists or maps.
pub fn build_pod(req: &PodSpecRequest) -> Pod {
	let env: Vec<EnvVar> = req
		.env
		.iter()
		.map(|(name, value)| EnvVar {
			name: name.clone(),
			value: Some(value.clone()),
			value_from: None,
		})
		.collect();

	let container = Container {
		name: CONTAINER_NAME.to_string(),
		image: Some(req.image.clone()),
		command: Some(req.command_line()),
		env: non_empty_vec(env),
		resources: req.resources.to_requirements(),
		// Attach needs an allocated TTY and an open stdin.
		stdin: Some(true),
		tty: Some(true),
		..Default::default()
	};

	Pod {
		metadata: ObjectMeta {
			generate_name: Some(POD_NAME_PREFIX.to_string()),
			labels: non_empty_map(&req.labels),
			..Default::default()
		},
		spec: Some(PodSpec {
			containers: vec![container],
			restart_policy: Some(RESTART_POLICY_NEVER.to_string()),
			active_deadline_seconds: Some(req.active_deadline_seconds),
			service_account_name: req.service_account.clone(),
			tolerations: non_empty_vec(req.tolerations.clone()),
			node_selector: non_empty_map(&req.node_selector),
			..Default::default()
		}),
		status: None,
	}
}

fn non_empty_vec<T>(items: Vec<T>) -> Option<Vec<T>> {
	(!items.is_empty()).then_some(items)
}

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
	(!map.is_empty()).then(|| map.clone())
}
