// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use colored::Colorize;
use ledger_config::ChainConfigs;
use polkadot_ledger::ingest::{IngestConfig, IngestError, ingest};
use polkadot_ledger::types::{IngestedBlock, RawBlock};
use serde_json::Value;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Ingest settings for `raw` as the named chain would apply them.
pub fn config_for(chain: &str, raw: &RawBlock) -> Result<IngestConfig> {
    let configs = ChainConfigs::load()?;
    let chain = configs.get_or_error(chain)?;
    let settings = ledger_config::IngestSettings::default();
    Ok(IngestConfig::for_block(
        chain,
        &settings,
        raw.header.number.unwrap_or_default(),
    ))
}

/// Ingest `raw` with Polkadot's parameters.
pub fn ingest_polkadot(raw: &RawBlock) -> Result<Result<IngestedBlock, IngestError>> {
    let config = config_for("polkadot", raw)?;
    Ok(ingest(raw, &config))
}

/// Compare `actual` against `expected`.
///
/// `expected` may omit object fields; those are reported as
/// [`Difference::ExtraField`] without failing the comparison.
pub fn compare_json(
    actual: &Value,
    expected: &Value,
    ignore_fields: &[&str],
) -> Result<ComparisonResult> {
    let mut differences = Vec::new();

    compare_json_recursive(actual, expected, ignore_fields, "", &mut differences);

    if differences.iter().all(|d| !d.is_failure()) {
        Ok(ComparisonResult::Match)
    } else {
        Ok(ComparisonResult::Mismatch { differences })
    }
}

#[derive(Debug, Clone)]
pub enum Difference {
    ValueMismatch {
        path: String,
        expected: Value,
        actual: Value,
    },
    MissingField {
        path: String,
    },
    ExtraField {
        path: String,
    },
    ArrayLengthMismatch {
        path: String,
        expected_len: usize,
        actual_len: usize,
    },
}

impl Difference {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Difference::ExtraField { .. })
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn compare_json_recursive(
    actual: &Value,
    expected: &Value,
    ignore_fields: &[&str],
    path: &str,
    differences: &mut Vec<Difference>,
) {
    match (actual, expected) {
        (Value::Object(actual_obj), Value::Object(expected_obj)) => {
            for (key, expected_val) in expected_obj.iter() {
                let current_path = join_path(path, key);

                // Skip ignored fields
                if ignore_fields
                    .iter()
                    .any(|&field| current_path.ends_with(field) || current_path == field)
                {
                    continue;
                }

                if let Some(actual_val) = actual_obj.get(key) {
                    compare_json_recursive(
                        actual_val,
                        expected_val,
                        ignore_fields,
                        &current_path,
                        differences,
                    );
                } else {
                    differences.push(Difference::MissingField {
                        path: current_path,
                    });
                }
            }

            for key in actual_obj.keys() {
                if !expected_obj.contains_key(key) {
                    differences.push(Difference::ExtraField {
                        path: join_path(path, key),
                    });
                }
            }
        }
        (Value::Array(actual_arr), Value::Array(expected_arr)) => {
            if actual_arr.len() != expected_arr.len() {
                differences.push(Difference::ArrayLengthMismatch {
                    path: path.to_string(),
                    expected_len: expected_arr.len(),
                    actual_len: actual_arr.len(),
                });
            }

            // Compare overlapping elements even if lengths differ
            for (i, (actual_val, expected_val)) in
                actual_arr.iter().zip(expected_arr.iter()).enumerate()
            {
                let current_path = format!("{}[{}]", path, i);
                compare_json_recursive(
                    actual_val,
                    expected_val,
                    ignore_fields,
                    &current_path,
                    differences,
                );
            }
        }
        (actual_val, expected_val) => {
            if actual_val != expected_val {
                differences.push(Difference::ValueMismatch {
                    path: path.to_string(),
                    expected: expected_val.clone(),
                    actual: actual_val.clone(),
                });
            }
        }
    }
}

#[derive(Debug)]
pub enum ComparisonResult {
    Match,
    Mismatch { differences: Vec<Difference> },
}

impl ComparisonResult {
    pub fn is_match(&self) -> bool {
        matches!(self, ComparisonResult::Match)
    }

    pub fn differences(&self) -> &[Difference] {
        match self {
            ComparisonResult::Match => &[],
            ComparisonResult::Mismatch { differences } => differences,
        }
    }

    /// One colored line per failing difference
    pub fn format_diff(&self) -> String {
        let failures: Vec<&Difference> = self
            .differences()
            .iter()
            .filter(|d| d.is_failure())
            .collect();
        if failures.is_empty() {
            return String::new();
        }

        let mut output = Vec::new();
        output.push(format!("\n{}", "=".repeat(80).bright_white()));
        output.push(format!("{}", "OUTPUT MISMATCH".bright_yellow().bold()));
        output.push(format!("{}", "=".repeat(80).bright_white()));

        for diff in &failures {
            let line = match diff {
                Difference::ValueMismatch {
                    path,
                    expected,
                    actual,
                } => format!(
                    "{}: {} {}",
                    path.bright_cyan(),
                    format!("- {}", expected).red(),
                    format!("+ {}", actual).green()
                ),
                Difference::MissingField { path } => {
                    format!("{}: {}", path.bright_cyan(), "missing".red())
                }
                Difference::ArrayLengthMismatch {
                    path,
                    expected_len,
                    actual_len,
                } => format!(
                    "{}: {}",
                    path.bright_cyan(),
                    format!("length {} != expected {}", actual_len, expected_len).red()
                ),
                Difference::ExtraField { .. } => continue,
            };
            output.push(line);
        }

        output.push(format!(
            "{} {}",
            "Total differences:".bright_cyan().bold(),
            failures.len().to_string().bright_white()
        ));
        output.join("\n")
    }
}
