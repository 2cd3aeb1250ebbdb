use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{FrateError, FrateResult};
use crate::group::{self, GroupOutcome};
use crate::io::{TextOutput, TrialSource};
use crate::params::{self, RateParams, RunParams, TechnicalParams};
use crate::rate_matrix::{self, RateMatrix};
use crate::spike_set::{SpikeEvent, SpikeSet};

#[derive(Debug, Default)]
pub struct TrialBatch {
    pub matrices: BTreeMap<String, RateMatrix>,
    pub failures: Vec<(String, FrateError)>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub trial_failures: Vec<(String, FrateError)>,
    pub num_trials: usize,
    pub group_outcomes: Vec<GroupOutcome>,
}

impl RunSummary {
    pub fn num_failed_groups(&self) -> usize {
        self.group_outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }
}

/// Builds the spike set and rate matrix of every trial. A trial whose events are invalid is
/// left out and reported in [`TrialBatch::failures`]; the other trials are unaffected.
pub fn compute_trial_matrices(
    trial_events: &BTreeMap<String, Vec<SpikeEvent>>,
    rate_params: &RateParams,
    technical_params: &TechnicalParams,
) -> FrateResult<TrialBatch> {
    params::validate_rate_params(rate_params)?;
    let num_threads = params::get_num_threads(technical_params);

    let mut batch = TrialBatch::default();

    for (trial_id, events) in trial_events {
        match SpikeSet::build(trial_id, rate_params.num_neurons, events) {
            Ok(spike_set) => {
                let matrix = rate_matrix::compute_rate_matrix(&spike_set, rate_params, num_threads);
                batch.matrices.insert(trial_id.clone(), matrix);
            }
            Err(e) => {
                log::error!("skipping trial {}: {}", trial_id, e);
                batch.failures.push((trial_id.clone(), e));
            }
        }
    }

    Ok(batch)
}

/// Loads the trials named in `run_params` from `data`, a directory or a `.zip` archive,
/// computes their rates and writes every group to `out_dir`.
pub fn run(run_params: &RunParams, data: &Path, out_dir: &Path) -> FrateResult<RunSummary> {
    params::validate_run_params(run_params)?;
    let mut trial_source = TrialSource::open(data)?;

    let mut trial_events = BTreeMap::new();
    let mut read_failures = Vec::new();

    for trial_id in &run_params.trials {
        match trial_source.read_trial_events(trial_id) {
            Ok(events) => {
                trial_events.insert(trial_id.clone(), events);
            }
            Err(e) => {
                log::error!("skipping trial {}: {}", trial_id, e);
                read_failures.push((trial_id.clone(), e));
            }
        }
    }

    let mut batch = compute_trial_matrices(
        &trial_events,
        &run_params.rate_params,
        &run_params.technical_params,
    )?;

    let mut output = TextOutput::create(out_dir)?;
    let group_outcomes = group::process_groups(
        &run_params.groups,
        &batch.matrices,
        &run_params.rate_params,
        &mut output,
    );

    read_failures.append(&mut batch.failures);

    Ok(RunSummary {
        trial_failures: read_failures,
        num_trials: batch.matrices.len(),
        group_outcomes,
    })
}
