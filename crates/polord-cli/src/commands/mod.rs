//! Command handler modules for the polord CLI.
//!
//! Shared input loading lives here; the reconcile commands live in
//! [`reconcile`].

pub mod reconcile;

use anyhow::{Context, Result};
use polord_config::{report_unused_keys, Settings, UnusedKeyPolicy};
use polord_model::DesiredOrder;
use polord_paper::BackendState;
use std::fs;
use std::path::PathBuf;

use crate::RunArgs;

/// Everything a plan/apply run needs, loaded and parsed up front.
pub struct RunInputs {
    pub desired: DesiredOrder,
    pub state: BackendState,
    pub state_path: PathBuf,
    pub settings: Settings,
    pub config_hash: Option<String>,
    pub start_after: Option<String>,
}

pub fn load_inputs(args: &RunArgs) -> Result<RunInputs> {
    let (settings, config_hash) = load_settings(&args.config_paths, args.strict_config)?;
    init_tracing(&settings.log_filter);

    let desired: DesiredOrder = serde_yaml::from_str(&read_text(&args.desired)?)
        .with_context(|| format!("desired order is not valid YAML/JSON: {}", args.desired))?;
    let state: BackendState = serde_json::from_str(&read_text(&args.state)?)
        .with_context(|| format!("state file is not valid JSON: {}", args.state))?;

    tracing::debug!(
        desired = %args.desired,
        state = %args.state,
        sections = state.sections.len(),
        "inputs loaded"
    );

    Ok(RunInputs {
        desired,
        state,
        state_path: PathBuf::from(&args.state),
        settings,
        config_hash,
        start_after: args.start_after.clone(),
    })
}

fn load_settings(paths: &[String], strict: bool) -> Result<(Settings, Option<String>)> {
    if paths.is_empty() {
        return Ok((Settings::default(), None));
    }

    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = polord_config::load_layered_yaml(&path_refs)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        // Tracing is not up yet; this goes straight to stderr.
        eprintln!(
            "warning: unused config keys: {}",
            report.unused_leaf_pointers.join(", ")
        );
    }

    let settings = loaded.settings().context("invalid config")?;
    Ok((settings, Some(loaded.config_hash)))
}

/// Read a UTF-8 text file, tolerating a leading BOM.
fn read_text(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec()).with_context(|| format!("{path} must be UTF-8 text"))
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
