use crate::network::NodeId;
use std::path::PathBuf;

/// Rejected network, train or simulation parameters. Raised when something is
/// constructed or registered, never while the simulation runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown node id {0}")]
    UnknownNodeId(NodeId),

    #[error("rail {start}-{end}: length must be positive, got {length}")]
    RailLength { start: String, end: String, length: f64 },

    #[error("rail {start}-{end}: speed limit must be positive, got {speed_limit}")]
    RailSpeedLimit {
        start: String,
        end: String,
        speed_limit: f64,
    },

    #[error("train {train}: {field} must be positive, got {value}")]
    NonPositive {
        train: String,
        field: &'static str,
        value: f64,
    },

    #[error("train {train}: friction coefficient must be non-negative, got {value}")]
    NegativeFriction { train: String, value: f64 },

    #[error("invalid simulation setting {field}: {reason}")]
    Setting { field: &'static str, reason: String },
}

/// Malformed `HHhMM` time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{0}', expected HHhMM")]
pub struct TimeParseError(pub String);

/// Input file problems, reported with the 1-based line they were found on.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: unknown directive '{directive}'")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: {directive} expects {expected} arguments, got {got}")]
    Arity {
        line: usize,
        directive: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: invalid number '{value}'")]
    Number { line: usize, value: String },

    #[error("line {line}: {source}")]
    Time {
        line: usize,
        source: TimeParseError,
    },

    #[error("line {line}: {source}")]
    Config { line: usize, source: ConfigError },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("simulation has not been initialized")]
    NotInitialized,

    #[error("simulation is already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Problems loading a JSON simulation config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Any failure of a command-line run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
