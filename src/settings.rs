//! Run settings, read either from YAML or from the line-oriented command format:
//!
//! ```text
//! fileload trial_01.txt
//! endtime 1000
//! timebin 50
//! samplingrate 0.1
//! numberofneurons 1024
//! output Gr 0:1023
//! ```
use std::fs;
use std::path::Path;

use crate::error::{FrateError, FrateResult};
use crate::group::GroupDirective;
use crate::params::{self, RunParams};

pub fn load_run_params(path: &Path) -> FrateResult<RunParams> {
    let content = fs::read_to_string(path).map_err(|e| FrateError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let run_params = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            FrateError::configuration(format!("invalid settings file {}: {}", path.display(), e))
        })?
    } else {
        parse_commands(&content)?
    };

    params::validate_run_params(&run_params)?;

    log::info!(
        "settings from {}: {} trials, {} groups",
        path.display(),
        run_params.trials.len(),
        run_params.groups.len()
    );

    Ok(run_params)
}

/// Parses the command format. Keys that are not given keep their defaults, and unknown
/// commands are skipped with a warning. A malformed `output` line is logged and skipped without
/// affecting the other groups.
pub fn parse_commands(content: &str) -> FrateResult<RunParams> {
    let mut run_params = RunParams::default();

    for (line_idx, line) in content.lines().enumerate() {
        let args: Vec<&str> = line.split_whitespace().collect();

        let (command, values) = match args.split_first() {
            Some((command, values)) if !command.starts_with('#') => (command, values),
            _ => continue,
        };

        let rate_params = &mut run_params.rate_params;

        match command.to_lowercase().as_str() {
            "fileload" => run_params.trials.push(single_value(command, values)?.to_string()),
            "endtime" => rate_params.end_time = parse_value(command, values)?,
            "timebin" => rate_params.time_bin = parse_value(command, values)?,
            "samplingrate" => rate_params.sampling_rate = parse_value(command, values)?,
            "numberofneurons" => rate_params.num_neurons = parse_value(command, values)?,
            "numberofthreads" => {
                run_params.technical_params.num_threads = Some(parse_value(command, values)?)
            }
            "output" => match GroupDirective::parse(&values.join(" ")) {
                Ok(directive) => run_params.groups.push(directive),
                Err(e) => log::error!("line {}: skipping group: {}", line_idx + 1, e),
            },
            _ => log::warn!("line {}: unknown command {}", line_idx + 1, command),
        }
    }

    Ok(run_params)
}

fn single_value<'a>(command: &str, values: &[&'a str]) -> FrateResult<&'a str> {
    match values {
        [value] => Ok(*value),
        _ => Err(FrateError::configuration(format!(
            "{} expects exactly one value, got {}",
            command,
            values.len()
        ))),
    }
}

fn parse_value<T: std::str::FromStr>(command: &str, values: &[&str]) -> FrateResult<T> {
    let value = single_value(command, values)?;

    value.parse().map_err(|_| {
        FrateError::configuration(format!("invalid value for {}: {:?}", command, value))
    })
}
