use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use polord_reconcile::{PlanMode, ReconcilerSettings};
use polord_sequencer::PolicyEdge;
use serde_json::Value;

const DEFAULT_LOG_FILTER: &str = "info";

/// Upper bound for `reconcile.max_move_retries`.
const MAX_MOVE_RETRIES: u64 = 10;

/// Typed view of the merged config. Missing keys take their defaults;
/// present keys of the wrong type or out of range are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub reconcile: ReconcilerSettings,
    /// `tracing` env-filter directive; `RUST_LOG` still wins at startup.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconcile: ReconcilerSettings::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let defaults = ReconcilerSettings::default();

        let call_timeout = match read_u64(cfg, "/reconcile/call_timeout_ms")? {
            None => defaults.call_timeout,
            Some(0) => return Err(anyhow!("reconcile.call_timeout_ms must be > 0")),
            Some(ms) => Duration::from_millis(ms),
        };

        let max_move_retries = match read_u64(cfg, "/reconcile/max_move_retries")? {
            None => defaults.max_move_retries,
            Some(n) if n > MAX_MOVE_RETRIES => {
                return Err(anyhow!(
                    "reconcile.max_move_retries out of bounds (0..={MAX_MOVE_RETRIES}): {n}"
                ))
            }
            Some(n) => u32::try_from(n).context("reconcile.max_move_retries overflow")?,
        };

        let plan_mode = match read_str(cfg, "/reconcile/plan_mode")? {
            None => defaults.plan_mode,
            Some(s) => parse_plan_mode(s)?,
        };

        let default_placement = match read_str(cfg, "/reconcile/default_placement")? {
            None => defaults.default_placement,
            Some(s) => parse_edge(s)?,
        };

        let log_filter = read_str(cfg, "/logging/filter")?
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string();

        Ok(Self {
            reconcile: ReconcilerSettings {
                call_timeout,
                max_move_retries,
                plan_mode,
                default_placement,
            },
            log_filter,
        })
    }
}

fn parse_plan_mode(s: &str) -> Result<PlanMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "full" => Ok(PlanMode::Full),
        "minimal" => Ok(PlanMode::Minimal),
        other => Err(anyhow!(
            "reconcile.plan_mode must be 'full' or 'minimal' (got '{other}')"
        )),
    }
}

fn parse_edge(s: &str) -> Result<PolicyEdge> {
    match s.trim().to_ascii_lowercase().as_str() {
        "first" => Ok(PolicyEdge::First),
        "last" => Ok(PolicyEdge::Last),
        other => Err(anyhow!(
            "reconcile.default_placement must be 'first' or 'last' (got '{other}')"
        )),
    }
}

/// Accepts a non-negative integer or a numeric string.
fn read_u64(cfg: &Value, ptr: &str) -> Result<Option<u64>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| anyhow!("{} must be a non-negative integer (got {n})", dotted(ptr))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{} is not an integer: '{s}'", dotted(ptr))),
        Some(other) => Err(anyhow!("{} must be an integer (got {other})", dotted(ptr))),
    }
}

fn read_str<'a>(cfg: &'a Value, ptr: &str) -> Result<Option<&'a str>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(anyhow!("{} must be a string (got {other})", dotted(ptr))),
    }
}

/// "/reconcile/plan_mode" -> "reconcile.plan_mode" for messages.
fn dotted(ptr: &str) -> String {
    ptr.trim_start_matches('/').replace('/', ".")
}
