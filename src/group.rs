use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::error::{FrateError, FrateResult};
use crate::params::RateParams;
use crate::rate;
use crate::rate_matrix::RateMatrix;

/// A named, inclusive range of neuron ids whose rates are reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDirective {
    pub name: String,
    pub start_id: usize,
    pub end_id: usize,
}

impl GroupDirective {
    pub fn new(name: &str, start_id: usize, end_id: usize) -> Self {
        Self {
            name: name.to_string(),
            start_id,
            end_id,
        }
    }

    /// Parses `<Name> <StartID>:<EndID>`, e.g. `Gr 0:1023`.
    pub fn parse(directive: &str) -> FrateResult<Self> {
        let tokens: Vec<&str> = directive.split_whitespace().collect();

        let (name, id_range) = match tokens[..] {
            [name, id_range] => (name, id_range),
            _ => {
                return Err(FrateError::configuration(format!(
                    "malformed group directive {:?}, expected \"<Name> <StartID>:<EndID>\"",
                    directive
                )))
            }
        };

        let ids = id_range
            .split(':')
            .map(str::parse::<usize>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                FrateError::configuration(format!("invalid neuron id in {:?}: {}", id_range, e))
            })?;

        match ids[..] {
            [start_id, end_id] => Ok(Self::new(name, start_id, end_id)),
            _ => Err(FrateError::configuration(format!(
                "invalid neuron id range {:?}, expected \"<StartID>:<EndID>\"",
                id_range
            ))),
        }
    }

    pub fn nid_range(&self) -> RangeInclusive<usize> {
        self.start_id..=self.end_id
    }
}

pub fn validate_group_directive(
    directive: &GroupDirective,
    num_neurons: usize,
) -> Result<(), SimpleError> {
    if directive.name.is_empty() {
        return Err(SimpleError::new("group name must not be empty"));
    }

    if directive
        .name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace())
    {
        return Err(SimpleError::new(format!(
            "group name {:?} must not contain path separators or whitespace",
            directive.name
        )));
    }

    if directive.start_id > directive.end_id {
        return Err(SimpleError::new(format!(
            "group {}: start id {} is greater than end id {}",
            directive.name, directive.start_id, directive.end_id
        )));
    }

    if directive.end_id >= num_neurons {
        return Err(SimpleError::new(format!(
            "group {}: neuron ids {}:{} exceed the available range [0, {})",
            directive.name, directive.start_id, directive.end_id, num_neurons
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub time: f64,
    pub rates: Vec<f64>,
}

/// The columns of one trial's rate matrix that belong to a group.
#[derive(Debug, Clone)]
pub struct TrialSeries<'a> {
    pub trial_id: &'a str,
    matrix: &'a RateMatrix,
    nid_range: RangeInclusive<usize>,
    params: &'a RateParams,
}

impl<'a> TrialSeries<'a> {
    pub fn num_rows(&self) -> usize {
        self.matrix.num_samples()
    }

    pub fn row(&self, sample_idx: usize) -> SeriesRow {
        SeriesRow {
            time: rate::sample_time(self.params, sample_idx),
            rates: self
                .nid_range
                .clone()
                .map(|nid| self.matrix.get(sample_idx, nid))
                .collect(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SeriesRow> + '_ {
        (0..self.num_rows()).map(|sample_idx| self.row(sample_idx))
    }

    pub fn max_rate(&self) -> f64 {
        self.nid_range
            .clone()
            .flat_map(|nid| self.matrix.column(nid).iter().copied())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone)]
pub struct GroupResult<'a> {
    pub name: &'a str,
    pub series: Vec<TrialSeries<'a>>,
    pub max_rate: f64,
}

/// Largest single rate over all series. Rates are never negative, so an empty input yields 0.
pub fn fold_max_rate<'a, 'b: 'a>(series: impl IntoIterator<Item = &'a TrialSeries<'b>>) -> f64 {
    series
        .into_iter()
        .map(|series| series.max_rate())
        .fold(0.0, f64::max)
}

/// Selects the group's columns from every trial matrix, in trial id order.
pub fn aggregate_group<'a>(
    directive: &'a GroupDirective,
    trials: &'a BTreeMap<String, RateMatrix>,
    params: &'a RateParams,
) -> FrateResult<GroupResult<'a>> {
    validate_group_directive(directive, params.num_neurons)?;

    for (trial_id, matrix) in trials {
        if matrix.num_neurons() != params.num_neurons {
            return Err(FrateError::Data {
                trial_id: trial_id.clone(),
                line: None,
                message: format!(
                    "rate matrix has {} neurons, expected {}",
                    matrix.num_neurons(),
                    params.num_neurons
                ),
            });
        }
    }

    let series: Vec<_> = trials
        .iter()
        .map(|(trial_id, matrix)| TrialSeries {
            trial_id: trial_id.as_str(),
            matrix,
            nid_range: directive.nid_range(),
            params,
        })
        .collect();

    let max_rate = fold_max_rate(&series);

    Ok(GroupResult {
        name: &directive.name,
        series,
        max_rate,
    })
}

/// Receives group output. Implemented by the text writer in [`crate::io`].
pub trait GroupSink {
    fn write_series(&mut self, group_name: &str, series: &TrialSeries<'_>) -> FrateResult<()>;

    fn write_max_rate(&mut self, group_name: &str, max_rate: f64) -> FrateResult<()>;
}

#[derive(Debug)]
pub struct GroupOutcome {
    pub name: String,
    pub result: FrateResult<f64>,
}

/// Runs every directive against the trial matrices and hands the output to `sink`.
///
/// A failing directive is logged and reported in its outcome. It does not stop the others.
pub fn process_groups<S: GroupSink>(
    directives: &[GroupDirective],
    trials: &BTreeMap<String, RateMatrix>,
    params: &RateParams,
    sink: &mut S,
) -> Vec<GroupOutcome> {
    directives
        .iter()
        .map(|directive| {
            let result = process_group(directive, trials, params, sink);

            match &result {
                Ok(max_rate) => log::info!("group {}: max rate {}", directive.name, max_rate),
                Err(e) => log::error!("group {} skipped: {}", directive.name, e),
            }

            GroupOutcome {
                name: directive.name.clone(),
                result,
            }
        })
        .collect()
}

fn process_group<S: GroupSink>(
    directive: &GroupDirective,
    trials: &BTreeMap<String, RateMatrix>,
    params: &RateParams,
    sink: &mut S,
) -> FrateResult<f64> {
    let group_result = aggregate_group(directive, trials, params)?;

    for series in &group_result.series {
        sink.write_series(group_result.name, series)?;
    }

    sink.write_max_rate(group_result.name, group_result.max_rate)?;

    Ok(group_result.max_rate)
}
