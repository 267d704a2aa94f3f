// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use krun_k8s::{AttachedProcess, K8sClient, K8sError, Pod, PodStatus, TerminalSize};
use krun_pod::{
	ControllerConfig, PodController, RawModeGuard, ResizeEvents, Terminal, TerminalReader,
	TerminalWriter,
};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

/// How a mocked API call behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
	#[default]
	Succeed,
	Fail,
	NotFound,
	Hang,
}

/// What the remote end of an attach does.
#[derive(Debug, Clone, Default)]
pub enum AttachScript {
	/// Write these bytes, then close.
	Output(Vec<u8>),
	/// Echo remote stdin back until stdin closes.
	#[default]
	Echo,
	/// Keep the stream open without writing.
	Hang,
	/// Reject the attach request itself.
	Reject(String),
}

#[derive(Default)]
struct MockState {
	phases: VecDeque<Option<&'static str>>,
	created: Vec<Pod>,
	deleted: Vec<String>,
	get_calls: usize,
	attach_calls: usize,
	create: Behavior,
	get: Behavior,
	delete: Behavior,
	attach: AttachScript,
	completion_failure: Option<String>,
	drop_resizes: bool,
	resize_rx: Option<mpsc::Receiver<TerminalSize>>,
	held_open: Vec<DuplexStream>,
}

/// Scripted in-memory cluster for controller tests.
#[derive(Default)]
pub struct MockK8sClient {
	state: Mutex<MockState>,
	next_id: AtomicUsize,
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Phases returned by successive status fetches. The last one repeats.
	pub fn with_phases(self, phases: &[&'static str]) -> Self {
		self.state.lock().unwrap().phases = phases.iter().map(|p| Some(*p)).collect();
		self
	}

	/// Like `with_phases`, allowing a pod without any reported phase.
	pub fn with_raw_phases(self, phases: &[Option<&'static str>]) -> Self {
		self.state.lock().unwrap().phases = phases.iter().copied().collect();
		self
	}

	pub fn with_create(self, behavior: Behavior) -> Self {
		self.state.lock().unwrap().create = behavior;
		self
	}

	pub fn with_get(self, behavior: Behavior) -> Self {
		self.state.lock().unwrap().get = behavior;
		self
	}

	pub fn with_delete(self, behavior: Behavior) -> Self {
		self.state.lock().unwrap().delete = behavior;
		self
	}

	pub fn with_attach(self, script: AttachScript) -> Self {
		self.state.lock().unwrap().attach = script;
		self
	}

	/// Make the attach completion report a remote failure.
	pub fn with_completion_failure(self, message: &str) -> Self {
		self.state.lock().unwrap().completion_failure = Some(message.to_string());
		self
	}

	/// Close the resize channel as soon as the attach is established.
	pub fn with_resizes_unsupported(self) -> Self {
		self.state.lock().unwrap().drop_resizes = true;
		self
	}

	pub fn created(&self) -> Vec<Pod> {
		self.state.lock().unwrap().created.clone()
	}

	pub fn deleted(&self) -> Vec<String> {
		self.state.lock().unwrap().deleted.clone()
	}

	pub fn get_calls(&self) -> usize {
		self.state.lock().unwrap().get_calls
	}

	pub fn attach_calls(&self) -> usize {
		self.state.lock().unwrap().attach_calls
	}

	/// Sizes sent over the resize channel so far.
	pub fn resizes(&self) -> Vec<TerminalSize> {
		let mut state = self.state.lock().unwrap();
		let mut sizes = Vec::new();
		if let Some(rx) = state.resize_rx.as_mut() {
			while let Ok(size) = rx.try_recv() {
				sizes.push(size);
			}
		}
		sizes
	}

	fn next_phase(state: &mut MockState) -> Option<&'static str> {
		if state.phases.len() > 1 {
			state.phases.pop_front().flatten()
		} else {
			state.phases.front().copied().unwrap_or(Some("Pending"))
		}
	}
}

fn api_error(message: &str) -> K8sError {
	K8sError::ApiError {
		message: message.to_string(),
	}
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn create_pod(&self, namespace: &str, mut pod: Pod) -> Result<Pod, K8sError> {
		let behavior = self.state.lock().unwrap().create;
		match behavior {
			Behavior::Hang => std::future::pending::<()>().await,
			Behavior::Fail => return Err(api_error("admission webhook denied the request")),
			Behavior::NotFound => return Err(api_error("namespaces \"missing\" not found")),
			Behavior::Succeed => {}
		}

		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let prefix = pod.metadata.generate_name.clone().unwrap_or_default();
		pod.metadata.name = Some(format!("{prefix}{id:05}"));
		pod.metadata.namespace = Some(namespace.to_string());
		pod.status = Some(PodStatus {
			phase: Some("Pending".to_string()),
			..Default::default()
		});

		self.state.lock().unwrap().created.push(pod.clone());
		Ok(pod)
	}

	async fn get_pod(&self, name: &str, _namespace: &str) -> Result<Pod, K8sError> {
		let (behavior, phase) = {
			let mut state = self.state.lock().unwrap();
			state.get_calls += 1;
			let phase = Self::next_phase(&mut state);
			(state.get, phase)
		};
		match behavior {
			Behavior::Hang => std::future::pending::<()>().await,
			Behavior::Fail => return Err(api_error("etcdserver: request timed out")),
			Behavior::NotFound => {
				return Err(K8sError::PodNotFound {
					name: name.to_string(),
				})
			}
			Behavior::Succeed => {}
		}

		let mut pod = Pod::default();
		pod.metadata.name = Some(name.to_string());
		pod.status = Some(PodStatus {
			phase: phase.map(str::to_string),
			..Default::default()
		});
		Ok(pod)
	}

	async fn delete_pod(&self, name: &str, _namespace: &str) -> Result<(), K8sError> {
		let behavior = {
			let mut state = self.state.lock().unwrap();
			state.deleted.push(name.to_string());
			state.delete
		};
		match behavior {
			Behavior::Hang => std::future::pending::<()>().await,
			Behavior::Fail => return Err(api_error("connection refused")),
			Behavior::NotFound => {
				return Err(K8sError::PodNotFound {
					name: name.to_string(),
				})
			}
			Behavior::Succeed => {}
		}
		Ok(())
	}

	async fn attach_pod(
		&self,
		_name: &str,
		_namespace: &str,
		_container: &str,
	) -> Result<AttachedProcess, K8sError> {
		let (script, completion_failure) = {
			let mut state = self.state.lock().unwrap();
			state.attach_calls += 1;
			(state.attach.clone(), state.completion_failure.clone())
		};

		let (local_stdin, mut remote_stdin) = duplex(64 * 1024);
		let (mut remote_stdout, local_stdout) = duplex(64 * 1024);
		let (resize_tx, resize_rx) = mpsc::channel(8);

		match script {
			AttachScript::Reject(message) => return Err(K8sError::AttachError { message }),
			AttachScript::Output(bytes) => {
				remote_stdout.write_all(&bytes).await.unwrap();
				let mut state = self.state.lock().unwrap();
				state.held_open.push(remote_stdin);
			}
			AttachScript::Echo => {
				tokio::spawn(async move {
					let mut buf = [0u8; 1024];
					loop {
						match remote_stdin.read(&mut buf).await {
							Ok(0) | Err(_) => break,
							Ok(n) => {
								if remote_stdout.write_all(&buf[..n]).await.is_err() {
									break;
								}
							}
						}
					}
				});
			}
			AttachScript::Hang => {
				let mut state = self.state.lock().unwrap();
				state.held_open.push(remote_stdin);
				state.held_open.push(remote_stdout);
			}
		}

		{
			let mut state = self.state.lock().unwrap();
			if !state.drop_resizes {
				state.resize_rx = Some(resize_rx);
			}
		}

		let completion = async move {
			match completion_failure {
				Some(message) => Err(K8sError::AttachError { message }),
				None => Ok(()),
			}
		};

		Ok(AttachedProcess {
			stdin: Box::pin(local_stdin),
			stdout: Box::pin(local_stdout),
			resize: Some(resize_tx),
			completion: Box::pin(completion),
		})
	}
}

/// Short intervals so lifecycle tests finish quickly.
pub fn fast_config() -> ControllerConfig {
	ControllerConfig {
		create_timeout: Duration::from_millis(200),
		status_timeout: Duration::from_millis(200),
		delete_timeout: Duration::from_millis(200),
		poll_interval: Duration::from_millis(10),
	}
}

pub fn controller(client: &Arc<MockK8sClient>) -> PodController {
	PodController::new(client.clone(), fast_config())
}

/// In-memory terminal. The paired `TerminalControl` feeds input and
/// observes output and raw mode.
pub struct FakeTerminal {
	input: DuplexStream,
	output: DuplexStream,
	size: Option<(u16, u16)>,
	resizes: Option<ResizeEvents>,
	raw_entered: Arc<AtomicUsize>,
	raw_active: Arc<AtomicBool>,
}

pub struct TerminalControl {
	input: Option<DuplexStream>,
	output: DuplexStream,
	raw_entered: Arc<AtomicUsize>,
	raw_active: Arc<AtomicBool>,
}

pub fn fake_terminal(size: Option<TerminalSize>) -> (FakeTerminal, TerminalControl) {
	let (input_writer, input_reader) = duplex(64 * 1024);
	let (output_writer, output_reader) = duplex(64 * 1024);
	let raw_entered = Arc::new(AtomicUsize::new(0));
	let raw_active = Arc::new(AtomicBool::new(false));

	let terminal = FakeTerminal {
		input: input_reader,
		output: output_writer,
		size: size.map(|s| (s.width, s.height)),
		resizes: None,
		raw_entered: raw_entered.clone(),
		raw_active: raw_active.clone(),
	};
	let term = TerminalControl {
		input: Some(input_writer),
		output: output_reader,
		raw_entered,
		raw_active,
	};
	(terminal, term)
}

impl FakeTerminal {
	/// Report these sizes as window changes while attached.
	pub fn with_resizes(mut self, sizes: Vec<(u16, u16)>) -> Self {
		let events = futures::stream::iter(
			sizes
				.into_iter()
				.map(|(width, height)| TerminalSize { width, height }),
		);
		self.resizes = Some(Box::pin(events));
		self
	}
}

impl Terminal for FakeTerminal {
	fn enter_raw_mode(&mut self) -> io::Result<RawModeGuard> {
		self.raw_entered.fetch_add(1, Ordering::SeqCst);
		self.raw_active.store(true, Ordering::SeqCst);
		let active = self.raw_active.clone();
		Ok(RawModeGuard::new(move || active.store(false, Ordering::SeqCst)))
	}

	fn size(&self) -> Option<TerminalSize> {
		self.size.map(|(width, height)| TerminalSize { width, height })
	}

	fn resize_events(&mut self) -> Option<ResizeEvents> {
		self.resizes.take()
	}

	fn into_io(self) -> (TerminalReader, TerminalWriter) {
		(Box::pin(self.input), Box::pin(self.output))
	}
}

impl TerminalControl {
	/// Type into the terminal.
	pub async fn type_input(&mut self, bytes: &[u8]) {
		if let Some(input) = self.input.as_mut() {
			input.write_all(bytes).await.unwrap();
		}
	}

	/// Close the local input, like Ctrl-D on an empty line.
	pub fn close_input(&mut self) {
		self.input.take();
	}

	/// Everything written to the terminal. Completes once the session
	/// has released the terminal.
	pub async fn output(&mut self) -> Vec<u8> {
		let mut out = Vec::new();
		self.output.read_to_end(&mut out).await.unwrap();
		out
	}

	pub fn raw_entered(&self) -> usize {
		self.raw_entered.load(Ordering::SeqCst)
	}

	pub fn raw_active(&self) -> bool {
		self.raw_active.load(Ordering::SeqCst)
	}
}
