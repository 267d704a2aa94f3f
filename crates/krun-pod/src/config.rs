// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pod controller timing configuration.

use std::time::Duration;

/// Timeouts and polling cadence for the pod controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
	/// Bound on the pod submission call
	pub create_timeout: Duration,
	/// Bound on each individual status fetch while waiting
	pub status_timeout: Duration,
	/// Bound on the delete call; larger than the others since it runs at teardown
	pub delete_timeout: Duration,
	/// Delay between status fetches
	pub poll_interval: Duration,
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			create_timeout: Duration::from_secs(60),
			status_timeout: Duration::from_secs(10),
			delete_timeout: Duration::from_secs(300), // 5 minutes
			poll_interval: Duration::from_secs(1),
		}
	}
}
