//! Logic behind the `govsync-plan` binary.
//!
//! Reads a previous and a desired document of one kind and renders the
//! patch a reconciliation cycle would send, without contacting the service.

use thiserror::Error;

use govsync_document::{DocumentError, EntityKind};
use govsync_patch::to_json_patch;

use crate::config::{ConfigError, GovsyncConfig};
use crate::driver::plan;
use crate::entity::EntityProfile;
use crate::error::ReconcileError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

pub const USAGE: &str = "usage: govsync-plan [--config <govsync.toml>] <kind> <previous.json> <desired.json>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanArgs {
    pub config: Option<String>,
    pub kind: String,
    pub previous: String,
    pub desired: String,
}

impl PlanArgs {
    /// Parses the arguments that follow the program name.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut config = None;
        let mut positional = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| CliError::Usage(format!("--config needs a path\n{USAGE}")))?;
                    config = Some(path.clone());
                }
                _ => positional.push(arg.clone()),
            }
        }
        match <[String; 3]>::try_from(positional) {
            Ok([kind, previous, desired]) => Ok(Self {
                config,
                kind,
                previous,
                desired,
            }),
            Err(_) => Err(CliError::Usage(USAGE.to_string())),
        }
    }
}

/// Computes the wire patch between two JSON texts of `kind`.
pub fn plan_json(
    kind: EntityKind,
    previous: &str,
    desired: &str,
    config: Option<&GovsyncConfig>,
) -> Result<serde_json::Value, CliError> {
    let profile = match config {
        Some(config) => config.profile(kind)?,
        None => EntityProfile::for_kind(kind),
    };
    let parse = |label: &str, text: &str| {
        serde_json::from_str::<serde_json::Value>(text).map_err(|source| CliError::Json {
            path: label.to_string(),
            source,
        })
    };
    let previous = profile.parse(&parse("previous", previous)?)?;
    let desired = profile.parse(&parse("desired", desired)?)?;
    let operations = plan(&previous, &desired, &profile)?;
    Ok(to_json_patch(&operations))
}

pub fn run(args: &PlanArgs) -> Result<String, CliError> {
    let kind: EntityKind = args.kind.parse()?;
    let config = args.config.as_deref().map(GovsyncConfig::load).transpose()?;
    let read = |path: &str| {
        std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_string(),
            source,
        })
    };
    let patch = plan_json(kind, &read(&args.previous)?, &read(&args.desired)?, config.as_ref())?;
    serde_json::to_string_pretty(&patch).map_err(|source| CliError::Json {
        path: "patch".into(),
        source,
    })
}
