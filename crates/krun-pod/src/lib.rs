// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Disposable interactive pods.
//!
//! This crate provides:
//! - Translation of flat option lists into typed pod settings
//! - A deterministic pod builder
//! - `PodController`, the create / wait / attach / delete lifecycle
//! - `Session`, which runs the lifecycle and always cleans up

mod config;
mod controller;
mod error;
mod session;
mod spec;
mod terminal;
mod translate;
mod types;

pub use config::ControllerConfig;
pub use controller::{PodController, ATTACH_HINT};
pub use error::{LifecycleError, SessionError};
pub use session::Session;
pub use spec::{build_pod, PodSpecRequest, ResourceSpec, CONTAINER_NAME, POD_NAME_PREFIX};
pub use terminal::{
	RawModeGuard, ResizeEvents, StdioTerminal, Terminal, TerminalReader, TerminalWriter,
};
pub use translate::{
	parse_key_value, parse_quantity, parse_tolerations, OptionField, ParseError, PodOptions,
	TranslateError,
};
pub use types::{PodHandle, PodPhase};
