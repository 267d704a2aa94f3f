// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use krun_k8s::SessionOptions;
use krun_pod::PodOptions;

use crate::config::LogFormat;

/// krun - run a disposable interactive pod and attach to it
#[derive(Parser, Debug)]
#[command(name = "krun", version, about, long_about = None)]
pub struct Args {
	/// Container image to run
	#[arg(short, long, env = "KRUN_IMAGE")]
	pub image: String,

	/// Namespace for the pod (defaults to the cluster session's namespace)
	#[arg(short, long, env = "KRUN_NAMESPACE")]
	pub namespace: Option<String>,

	/// Service account for the pod
	#[arg(short, long)]
	pub service_account: Option<String>,

	/// Seconds before the cluster terminates the pod
	#[arg(short, long, default_value_t = 300, value_parser = clap::value_parser!(i64).range(1..))]
	pub timeout: i64,

	/// Enable debug logging
	#[arg(short, long)]
	pub verbose: bool,

	/// Pod label (repeatable)
	#[arg(short, long = "label", value_name = "KEY=VALUE")]
	pub labels: Vec<String>,

	/// Pod toleration (repeatable)
	#[arg(short = 'T', long = "toleration", value_name = "KEY:OPERATOR:VALUE:EFFECT")]
	pub tolerations: Vec<String>,

	/// Node selector (repeatable)
	#[arg(short = 'N', long = "node-selector", value_name = "KEY=VALUE")]
	pub node_selector: Vec<String>,

	/// Container environment variable (repeatable)
	#[arg(short = 'e', long = "env", value_name = "KEY=VALUE")]
	pub env_vars: Vec<String>,

	/// CPU request, e.g. 250m
	#[arg(short = 'c', long)]
	pub requests_cpu: Option<String>,

	/// Memory request, e.g. 256Mi
	#[arg(short = 'm', long)]
	pub requests_memory: Option<String>,

	/// CPU limit
	#[arg(short = 'C', long)]
	pub limits_cpu: Option<String>,

	/// Memory limit
	#[arg(short = 'M', long)]
	pub limits_memory: Option<String>,

	/// Leave the pod in the cluster when the session ends
	#[arg(short, long)]
	pub keep_pod: bool,

	/// Kubeconfig to use when not running in a cluster
	#[arg(long, env = "KUBECONFIG")]
	pub kubeconfig: Option<OsString>,

	/// Kubeconfig context to use
	#[arg(long)]
	pub context: Option<String>,

	/// Path to configuration file
	#[arg(long)]
	pub config: Option<PathBuf>,

	/// Log output format
	#[arg(long, value_enum, env = "KRUN_LOG_FORMAT")]
	pub log_format: Option<LogFormat>,

	/// Print the pod manifest as JSON instead of running it
	#[arg(long)]
	pub dry_run: bool,

	/// Command to run in the container
	#[arg(default_value = "/bin/sh")]
	pub command: String,

	/// Arguments for the command
	#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
	pub args: Vec<String>,
}

impl Args {
	pub fn pod_options(&self) -> PodOptions {
		PodOptions {
			image: self.image.clone(),
			command: self.command.clone(),
			args: self.args.clone(),
			service_account: self.service_account.clone(),
			labels: self.labels.clone(),
			tolerations: self.tolerations.clone(),
			node_selector: self.node_selector.clone(),
			env: self.env_vars.clone(),
			requests_cpu: self.requests_cpu.clone(),
			requests_memory: self.requests_memory.clone(),
			limits_cpu: self.limits_cpu.clone(),
			limits_memory: self.limits_memory.clone(),
			active_deadline_seconds: self.timeout,
		}
	}

	/// The namespace given on the command line, if it names one.
	pub fn explicit_namespace(&self) -> Option<String> {
		self.namespace.clone().filter(|ns| !ns.is_empty())
	}

	/// The namespace to run in: the explicit one, else `session_default`.
	pub fn namespace_or(&self, session_default: &str) -> String {
		self.explicit_namespace()
			.unwrap_or_else(|| session_default.to_string())
	}

	pub fn session_options(&self) -> SessionOptions {
		SessionOptions {
			kubeconfig: self.kubeconfig.clone(),
			context: self.context.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	fn parse(argv: &[&str]) -> Args {
		Args::try_parse_from(std::iter::once("krun").chain(argv.iter().copied())).unwrap()
	}

	#[test]
	fn test_cli_is_well_formed() {
		Args::command().debug_assert();
	}

	#[test]
	fn test_defaults() {
		let args = parse(&["--image", "alpine"]);
		assert_eq!(args.image, "alpine");
		assert_eq!(args.command, "/bin/sh");
		assert!(args.args.is_empty());
		assert_eq!(args.timeout, 300);
		assert!(!args.keep_pod);
		assert!(!args.dry_run);
	}

	#[test]
	fn test_repeatable_flags_and_command() {
		let args = parse(&[
			"-i", "python:3.12", "-n", "ml", "-l", "team=ml", "-l", "tier=dev", "-T",
			"gpu:Exists::NoSchedule", "-N", "pool=gpu", "-e", "DEBUG=1", "-c", "500m", "-M",
			"2Gi", "-k", "--", "python", "-c", "print(1)",
		]);

		assert_eq!(args.namespace.as_deref(), Some("ml"));
		assert_eq!(args.labels, vec!["team=ml", "tier=dev"]);
		assert_eq!(args.tolerations, vec!["gpu:Exists::NoSchedule"]);
		assert_eq!(args.node_selector, vec!["pool=gpu"]);
		assert_eq!(args.env_vars, vec!["DEBUG=1"]);
		assert_eq!(args.requests_cpu.as_deref(), Some("500m"));
		assert_eq!(args.limits_memory.as_deref(), Some("2Gi"));
		assert!(args.keep_pod);
		assert_eq!(args.command, "python");
		assert_eq!(args.args, vec!["-c", "print(1)"]);
	}

	#[test]
	fn test_pod_options_carry_everything() {
		let args = parse(&["-i", "busybox", "-t", "60", "-s", "runner", "sleep", "10"]);
		let opts = args.pod_options();
		assert_eq!(opts.image, "busybox");
		assert_eq!(opts.command, "sleep");
		assert_eq!(opts.args, vec!["10"]);
		assert_eq!(opts.service_account.as_deref(), Some("runner"));
		assert_eq!(opts.active_deadline_seconds, 60);
	}

	#[test]
	fn test_non_positive_timeout_rejected() {
		let result = Args::try_parse_from(["krun", "-i", "alpine", "-t", "0"]);
		assert!(result.is_err());
	}

	#[test]
	fn test_namespace_falls_back_to_session_default() {
		let args = parse(&["-i", "alpine"]);
		assert_eq!(args.namespace_or("session-default"), "session-default");

		let args = parse(&["-i", "alpine", "-n", ""]);
		assert_eq!(args.explicit_namespace(), None);
		assert_eq!(args.namespace_or("session-default"), "session-default");

		let args = parse(&["-i", "alpine", "--namespace="]);
		assert_eq!(args.namespace_or("session-default"), "session-default");

		let args = parse(&["-i", "alpine", "-n", "ml"]);
		assert_eq!(args.namespace_or("session-default"), "ml");
	}

	#[test]
	fn test_log_format_values() {
		let args = parse(&["-i", "alpine", "--log-format", "json"]);
		assert_eq!(args.log_format, Some(LogFormat::Json));
		assert!(Args::try_parse_from(["krun", "-i", "alpine", "--log-format", "xml"]).is_err());
	}
}
