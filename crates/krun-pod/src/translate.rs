// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Translation of flat command-line option lists into typed pod settings.

use std::collections::BTreeMap;

use krun_k8s::{Quantity, Toleration};

use crate::spec::{PodSpecRequest, ResourceSpec};

const TOLERATION_FIELDS: usize = 4;

/// A malformed option entry. `index` is the entry's zero-based position in
/// the list it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("invalid kv format: {entry} (entry {index})")]
	InvalidKeyValue { index: usize, entry: String },

	#[error(
		"invalid toleration format: '{entry}' (entry {index}), expected 'key:operator:value:effect'"
	)]
	InvalidToleration { index: usize, entry: String },

	#[error("invalid quantity: '{value}'")]
	InvalidQuantity { value: String },
}

/// Which option list a translation error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
	Labels,
	Tolerations,
	NodeSelector,
	Env,
	RequestsCpu,
	RequestsMemory,
	LimitsCpu,
	LimitsMemory,
}

impl std::fmt::Display for OptionField {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			OptionField::Labels => "labels",
			OptionField::Tolerations => "tolerations",
			OptionField::NodeSelector => "node selector",
			OptionField::Env => "env vars",
			OptionField::RequestsCpu => "cpu request",
			OptionField::RequestsMemory => "memory request",
			OptionField::LimitsCpu => "cpu limit",
			OptionField::LimitsMemory => "memory limit",
		};
		f.write_str(name)
	}
}

/// A failed translation of one option list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse {field}: {error}")]
pub struct TranslateError {
	pub field: OptionField,
	pub error: ParseError,
}

/// Raw, user-supplied pod options as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct PodOptions {
	pub image: String,
	pub command: String,
	pub args: Vec<String>,
	pub service_account: Option<String>,
	pub labels: Vec<String>,
	pub tolerations: Vec<String>,
	pub node_selector: Vec<String>,
	pub env: Vec<String>,
	pub requests_cpu: Option<String>,
	pub requests_memory: Option<String>,
	pub limits_cpu: Option<String>,
	pub limits_memory: Option<String>,
	pub active_deadline_seconds: i64,
}

impl PodOptions {
	/// Validate every option list and produce an immutable pod request.
	///
	/// Fails on the first malformed entry; nothing is partially applied.
	pub fn into_request(self) -> Result<PodSpecRequest, TranslateError> {
		let context = |field: OptionField| move |error: ParseError| TranslateError { field, error };

		let labels = parse_key_value(&self.labels).map_err(context(OptionField::Labels))?;
		let tolerations =
			parse_tolerations(&self.tolerations).map_err(context(OptionField::Tolerations))?;
		let node_selector =
			parse_key_value(&self.node_selector).map_err(context(OptionField::NodeSelector))?;
		let env = parse_key_value(&self.env).map_err(context(OptionField::Env))?;

		let resources = ResourceSpec {
			requests_cpu: parse_optional_quantity(self.requests_cpu.as_deref())
				.map_err(context(OptionField::RequestsCpu))?,
			requests_memory: parse_optional_quantity(self.requests_memory.as_deref())
				.map_err(context(OptionField::RequestsMemory))?,
			limits_cpu: parse_optional_quantity(self.limits_cpu.as_deref())
				.map_err(context(OptionField::LimitsCpu))?,
			limits_memory: parse_optional_quantity(self.limits_memory.as_deref())
				.map_err(context(OptionField::LimitsMemory))?,
		};

		Ok(PodSpecRequest {
			image: self.image,
			command: self.command,
			args: self.args,
			service_account: self.service_account.filter(|sa| !sa.is_empty()),
			labels,
			tolerations,
			node_selector,
			resources,
			env,
			active_deadline_seconds: self.active_deadline_seconds,
		})
	}
}

/// Parse `KEY=VALUE` entries, splitting each on the first `=` only.
pub fn parse_key_value(entries: &[String]) -> Result<BTreeMap<String, String>, ParseError> {
	let mut result = BTreeMap::new();

	for (index, entry) in entries.iter().enumerate() {
		let (key, value) = entry
			.split_once('=')
			.ok_or_else(|| ParseError::InvalidKeyValue {
				index,
				entry: entry.clone(),
			})?;
		result.insert(key.to_string(), value.to_string());
	}

	Ok(result)
}

/// Parse `KEY:OPERATOR:VALUE:EFFECT` entries.
///
/// Fields are positional and trailing ones may be left off; anything past
/// the third `:` belongs to the effect. Empty fields are omitted from the
/// resulting toleration.
pub fn parse_tolerations(entries: &[String]) -> Result<Vec<Toleration>, ParseError> {
	let mut result = Vec::with_capacity(entries.len());

	for (index, entry) in entries.iter().enumerate() {
		if entry.is_empty() {
			return Err(ParseError::InvalidToleration {
				index,
				entry: entry.clone(),
			});
		}

		let parts: Vec<&str> = entry.splitn(TOLERATION_FIELDS, ':').collect();
		let field = |i: usize| {
			parts
				.get(i)
				.filter(|s| !s.is_empty())
				.map(|s| s.to_string())
		};

		result.push(Toleration {
			key: field(0),
			operator: field(1),
			value: field(2),
			effect: field(3),
			toleration_seconds: None,
		});
	}

	Ok(result)
}

/// Validate a resource quantity such as `500m`, `1.5`, `2Gi` or `1e3`.
pub fn parse_quantity(raw: &str) -> Result<Quantity, ParseError> {
	if is_valid_quantity(raw) {
		Ok(Quantity(raw.to_string()))
	} else {
		Err(ParseError::InvalidQuantity {
			value: raw.to_string(),
		})
	}
}

fn parse_optional_quantity(raw: Option<&str>) -> Result<Option<Quantity>, ParseError> {
	match raw.map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) => parse_quantity(value).map(Some),
	}
}

fn is_valid_quantity(raw: &str) -> bool {
	let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);

	let number_len = unsigned
		.find(|c: char| !(c.is_ascii_digit() || c == '.'))
		.unwrap_or(unsigned.len());
	let (number, suffix) = unsigned.split_at(number_len);

	let digits = number.chars().filter(char::is_ascii_digit).count();
	if digits == 0 || number.matches('.').count() > 1 {
		return false;
	}

	match suffix {
		"" | "Ki" | "Mi" | "Gi" | "Ti" | "Pi" | "Ei" => true,
		"n" | "u" | "m" | "k" | "M" | "G" | "T" | "P" | "E" => true,
		_ => is_decimal_exponent(suffix),
	}
}

fn is_decimal_exponent(suffix: &str) -> bool {
	let Some(exponent) = suffix.strip_prefix(['e', 'E']) else {
		return false;
	};
	let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
	!exponent.is_empty() && exponent.chars().all(|c| c.is_ascii_digit())
}
