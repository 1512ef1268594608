//! Text formats for networks and train rosters.
//!
//! Both formats are line based: blank lines and lines starting with `#` are
//! skipped, tokens are separated by whitespace, and the first bad line aborts
//! the load with its 1-based line number.

use crate::error::ParseError;
use crate::network::Network;
use crate::time::Time;
use crate::train::{Train, TrainPhysics, TrainSpec};
use log::*;
use std::path::Path;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Tokens of the non-empty, non-comment lines, with their line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .map(|(n, l)| (n, l.split_whitespace().collect()))
}

fn arity(line: usize, directive: &'static str, args: &[&str], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(ParseError::Arity {
            line,
            directive,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn number(line: usize, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(ParseError::Number {
            line,
            value: value.to_string(),
        }),
    }
}

fn time(line: usize, value: &str) -> Result<Time> {
    value
        .parse()
        .map_err(|source| ParseError::Time { line, source })
}

/// Parses `Node <name>` and `Rail <start> <end> <length> <speedLimit>`
/// directives. Rails may only refer to nodes declared above them.
pub fn parse_network(text: &str) -> Result<Network> {
    let mut network = Network::new();
    for (line, tokens) in content_lines(text) {
        let (directive, args) = (tokens[0], &tokens[1..]);
        match directive {
            "Node" => {
                arity(line, "Node", args, 1)?;
                network.add_node(args[0]);
            }
            "Rail" => {
                arity(line, "Rail", args, 4)?;
                let length = number(line, args[2])?;
                let speed_limit = number(line, args[3])?;
                network
                    .add_rail(args[0], args[1], length, speed_limit)
                    .map_err(|source| ParseError::Config { line, source })?;
            }
            other => {
                return Err(ParseError::UnknownDirective {
                    line,
                    directive: other.to_string(),
                })
            }
        }
    }
    Ok(network)
}

/// Parses one train per line:
/// `<name> <mass> <friction> <maxAccel> <maxBrake> <from> <to> <HHhMM> <HHhMM>`.
pub fn parse_train_specs(text: &str) -> Result<Vec<TrainSpec>> {
    content_lines(text)
        .map(|(line, tokens)| -> Result<TrainSpec> {
            arity(line, "Train", &tokens, 9)?;
            Ok(TrainSpec {
                name: tokens[0].to_string(),
                physics: TrainPhysics {
                    mass: number(line, tokens[1])?,
                    friction: number(line, tokens[2])?,
                    max_accel_force: number(line, tokens[3])?,
                    max_brake_force: number(line, tokens[4])?,
                },
                departure: tokens[5].to_string(),
                destination: tokens[6].to_string(),
                departure_time: time(line, tokens[7])?,
                stop_duration: time(line, tokens[8])?,
            })
        })
        .collect()
}

/// Parses a roster and resolves it against `network`.
pub fn parse_trains(text: &str, network: &Network) -> Result<Vec<Train>> {
    let specs = parse_train_specs(text)?;
    // Line numbers of the specs, in order, for error reporting.
    let lines = content_lines(text).map(|(n, _)| n);
    specs
        .iter()
        .zip(lines)
        .map(|(spec, line)| {
            spec.build(network)
                .map_err(|source| ParseError::Config { line, source })
        })
        .collect()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_network(path: &Path) -> Result<Network> {
    let _h = hprof::enter("load network");
    let network = parse_network(&read(path)?)?;
    info!(
        "Network loaded from {}: {} nodes, {} rails",
        path.display(),
        network.nodes().len(),
        network.rails().len()
    );
    Ok(network)
}

pub fn load_trains(path: &Path, network: &Network) -> Result<Vec<Train>> {
    let _h = hprof::enter("load trains");
    let trains = parse_trains(&read(path)?, network)?;
    info!("{} trains loaded from {}", trains.len(), path.display());
    Ok(trains)
}
