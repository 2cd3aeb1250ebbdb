use crate::error::{FrateError, FrateResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub time: f64,
    pub nid: usize,
    /// 1-based line in the source the event was read from, if any.
    pub line: Option<usize>,
}

impl SpikeEvent {
    pub fn new(time: f64, nid: usize) -> Self {
        Self {
            time,
            nid,
            line: None,
        }
    }

    pub fn at_line(time: f64, nid: usize, line: usize) -> Self {
        Self {
            time,
            nid,
            line: Some(line),
        }
    }
}

/// One trial's spikes, partitioned by neuron. Every per-neuron list is sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeSet {
    trial_id: String,
    spike_times: Vec<Vec<f64>>,
}

impl SpikeSet {
    pub fn build(trial_id: &str, num_neurons: usize, events: &[SpikeEvent]) -> FrateResult<Self> {
        let mut spike_times = vec![Vec::new(); num_neurons];

        for event in events {
            if event.nid >= num_neurons {
                return Err(FrateError::Data {
                    trial_id: trial_id.to_string(),
                    line: event.line,
                    message: format!(
                        "neuron index {} out of range [0, {})",
                        event.nid, num_neurons
                    ),
                });
            }

            if !event.time.is_finite() {
                return Err(FrateError::Data {
                    trial_id: trial_id.to_string(),
                    line: event.line,
                    message: format!("spike time {} is not finite", event.time),
                });
            }

            spike_times[event.nid].push(event.time);
        }

        for neuron_spike_times in &mut spike_times {
            neuron_spike_times.sort_by(f64::total_cmp);
        }

        log::debug!(
            "built spike set for {}: {} spikes over {} neurons",
            trial_id,
            events.len(),
            num_neurons
        );

        Ok(Self {
            trial_id: trial_id.to_string(),
            spike_times,
        })
    }

    pub fn trial_id(&self) -> &str {
        &self.trial_id
    }

    pub fn num_neurons(&self) -> usize {
        self.spike_times.len()
    }

    pub fn spike_times(&self, nid: usize) -> &[f64] {
        &self.spike_times[nid]
    }

    pub fn num_spikes(&self) -> usize {
        self.spike_times.iter().map(Vec::len).sum()
    }
}
