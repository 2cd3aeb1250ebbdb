use crate::params::RateParams;

/// Number of sampling instants `delta, 2 * delta, ...` that do not exceed `end_time`.
pub fn sample_count(params: &RateParams) -> usize {
    (params.end_time / params.delta()).floor() as usize
}

pub fn sample_time(params: &RateParams, sample_idx: usize) -> f64 {
    (sample_idx + 1) as f64 * params.delta()
}

/// Writes the windowed rate of one neuron into `rates`, one value per sample.
///
/// A spike `s` counts towards the sample at `t` iff `t - time_bin / 2 <= s <= t + time_bin / 2`,
/// and the count is divided by `time_bin`. Windows are not clipped at either end of the
/// recording, so rates near the edges come out lower.
///
/// `spike_times` must be sorted ascending and `params` must pass
/// [`validate_rate_params`](crate::params::validate_rate_params). Both window edges only move
/// forward, so the scan is linear in the number of samples plus the number of spikes.
pub fn compute_rates(spike_times: &[f64], params: &RateParams, rates: &mut [f64]) {
    debug_assert!(params.time_bin > 0.0);

    let half_bin = params.half_bin();
    let mut lower = 0;
    let mut upper = 0;

    for (sample_idx, rate) in rates.iter_mut().enumerate() {
        let t = sample_time(params, sample_idx);
        let window_start = t - half_bin;
        let window_end = t + half_bin;

        while lower < spike_times.len() && spike_times[lower] < window_start {
            lower += 1;
        }

        while upper < spike_times.len() && spike_times[upper] <= window_end {
            upper += 1;
        }

        *rate = (upper - lower) as f64 / params.time_bin;
    }
}
