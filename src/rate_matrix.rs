use std::mem;
use std::thread;

use crate::params::RateParams;
use crate::rate;
use crate::spike_set::SpikeSet;
use crate::util;

/// Dense firing-rate matrix of one trial: `num_samples` rows by `num_neurons` columns.
///
/// Storage is column-major so that each neuron's time series is one contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RateMatrix {
    num_samples: usize,
    num_neurons: usize,
    rates: Vec<f64>,
}

impl RateMatrix {
    fn zeros(num_samples: usize, num_neurons: usize) -> Self {
        Self {
            num_samples,
            num_neurons,
            rates: vec![0.0; num_samples * num_neurons],
        }
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn num_neurons(&self) -> usize {
        self.num_neurons
    }

    pub fn get(&self, sample_idx: usize, nid: usize) -> f64 {
        debug_assert!(sample_idx < self.num_samples);
        self.rates[nid * self.num_samples + sample_idx]
    }

    pub fn column(&self, nid: usize) -> &[f64] {
        let start = nid * self.num_samples;
        &self.rates[start..start + self.num_samples]
    }
}

/// Computes the rate matrix of one trial, spreading the neurons over up to `num_threads`
/// workers. Every worker owns a disjoint block of columns, and the result does not depend on
/// the number of workers.
///
/// `params` must pass [`validate_rate_params`](crate::params::validate_rate_params), which also
/// bounds the size of the matrix.
pub fn compute_rate_matrix(
    spike_set: &SpikeSet,
    params: &RateParams,
    num_threads: usize,
) -> RateMatrix {
    let num_samples = rate::sample_count(params);
    let num_neurons = spike_set.num_neurons();
    let mut matrix = RateMatrix::zeros(num_samples, num_neurons);

    if num_samples == 0 || num_neurons == 0 {
        return matrix;
    }

    let num_workers = num_threads.clamp(1, num_neurons);

    log::debug!(
        "computing rates for {}: {} samples x {} neurons on {} workers",
        spike_set.trial_id(),
        num_samples,
        num_neurons,
        num_workers
    );

    if num_workers == 1 {
        compute_block(spike_set, params, 0, &mut matrix.rates, num_samples);
        return matrix;
    }

    thread::scope(|scope| {
        let mut remaining: &mut [f64] = &mut matrix.rates;

        for worker_id in 0..num_workers {
            let nid_range = util::get_worker_range(num_workers, worker_id, num_neurons);
            let (block, rest) =
                mem::take(&mut remaining).split_at_mut(nid_range.len() * num_samples);
            remaining = rest;

            scope.spawn(move || {
                compute_block(spike_set, params, nid_range.start, block, num_samples);
            });
        }
    });

    matrix
}

fn compute_block(
    spike_set: &SpikeSet,
    params: &RateParams,
    nid_start: usize,
    block: &mut [f64],
    num_samples: usize,
) {
    for (offset, column) in block.chunks_mut(num_samples).enumerate() {
        rate::compute_rates(spike_set.spike_times(nid_start + offset), params, column);
    }
}
