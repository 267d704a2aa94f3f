// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod config;
mod logging;
mod signal;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use krun_k8s::ClusterSession;
use krun_pod::{build_pod, ControllerConfig, PodController, PodSpecRequest, Session, StdioTerminal};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::args::Args;

fn main() -> ExitCode {
	let args = Args::parse();

	match run(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Error: {e:#}");
			ExitCode::FAILURE
		}
	}
}

fn run(args: Args) -> Result<()> {
	let settings = config::load(args.config.as_deref(), args.log_format)
		.context("failed to load configuration")?;
	logging::init_tracing(settings.log_format, args.verbose);

	let request = args.pod_options().into_request()?;

	if args.dry_run {
		return print_manifest(&args, &request);
	}

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("failed to start async runtime")?;

	let result = runtime.block_on(run_session(&args, settings.controller, &request));

	// The stdin reader may still be parked in a blocking read; don't wait for it.
	runtime.shutdown_background();
	result
}

async fn run_session(args: &Args, config: ControllerConfig, request: &PodSpecRequest) -> Result<()> {
	let cluster = ClusterSession::connect(&args.session_options())
		.await
		.context("failed to create kube config")?;

	let namespace = args.namespace_or(cluster.namespace());
	debug!(namespace = %namespace, image = %request.image, "starting session");

	let cancel = CancellationToken::new();
	let listener = signal::spawn_listener(cancel.clone());

	let controller = PodController::new(Arc::new(cluster.client().clone()), config);
	let session = Session::new(controller, args.keep_pod);
	let result = session
		.run(&cancel, &namespace, request, StdioTerminal::new())
		.await;

	listener.abort();
	result?;
	debug!("session ended");
	Ok(())
}

fn print_manifest(args: &Args, request: &PodSpecRequest) -> Result<()> {
	println!("{}", render_manifest(args, request)?);
	Ok(())
}

/// The pod `Create` would submit, as pretty JSON.
fn render_manifest(args: &Args, request: &PodSpecRequest) -> Result<String> {
	let mut pod = build_pod(request);
	pod.metadata.namespace = args.explicit_namespace();

	serde_json::to_string_pretty(&pod).context("failed to serialize pod")
}
