use std::mem;

use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::group::GroupDirective;
use crate::types::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateParams {
    pub end_time: f64,
    pub time_bin: f64,
    pub sampling_rate: f64,
    pub num_neurons: usize,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalParams {
    pub num_threads: Option<usize>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    #[serde(flatten)]
    pub rate_params: RateParams,
    pub technical_params: TechnicalParams,
    pub trials: Vec<String>,
    pub groups: Vec<GroupDirective>,
}

impl RateParams {
    pub fn delta(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    pub fn half_bin(&self) -> f64 {
        self.time_bin * 0.5
    }
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            end_time: 1000.0,
            time_bin: 1000.0,
            sampling_rate: 0.03,
            num_neurons: 0,
        }
    }
}

pub fn validate_run_params(run_params: &RunParams) -> Result<(), SimpleError> {
    validate_rate_params(&run_params.rate_params)?;
    validate_technical_params(&run_params.technical_params)?;

    let mut seen_trials = HashSet::default();

    for trial in &run_params.trials {
        if trial.is_empty() || trial.contains(['/', '\\']) {
            return Err(SimpleError::new(format!(
                "invalid trial id {:?}: must be a plain file name",
                trial
            )));
        }

        if !seen_trials.insert(trial.as_str()) {
            return Err(SimpleError::new(format!("duplicate trial: {}", trial)));
        }
    }

    Ok(())
}

pub fn validate_rate_params(rate_params: &RateParams) -> Result<(), SimpleError> {
    if !rate_params.end_time.is_finite() || rate_params.end_time < 0.0 {
        return Err(SimpleError::new("end_time must be finite and not negative"));
    }

    if !(rate_params.time_bin.is_finite() && rate_params.time_bin > 0.0) {
        return Err(SimpleError::new("time_bin must be strictly positive"));
    }

    if !(rate_params.sampling_rate.is_finite() && rate_params.sampling_rate > 0.0) {
        return Err(SimpleError::new("sampling_rate must be strictly positive"));
    }

    let num_samples = (rate_params.end_time / rate_params.delta()).floor();
    let max_num_rates = isize::MAX as usize / mem::size_of::<f64>();

    let num_rates = if num_samples < max_num_rates as f64 {
        (num_samples as usize).checked_mul(rate_params.num_neurons)
    } else {
        None
    };

    if !matches!(num_rates, Some(num_rates) if num_rates <= max_num_rates) {
        return Err(SimpleError::new(format!(
            "rate matrix of {} samples x {} neurons is too large",
            num_samples, rate_params.num_neurons
        )));
    }

    Ok(())
}

fn validate_technical_params(technical_params: &TechnicalParams) -> Result<(), SimpleError> {
    if technical_params.num_threads == Some(0) {
        return Err(SimpleError::new("num_threads must be strictly positive"));
    }

    Ok(())
}

pub fn get_num_threads(technical_params: &TechnicalParams) -> usize {
    technical_params.num_threads.unwrap_or_else(num_cpus::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn get_template_run_params() -> RunParams {
        RunParams {
            rate_params: RateParams {
                end_time: 10.0,
                time_bin: 2.0,
                sampling_rate: 4.0,
                num_neurons: 3,
            },
            technical_params: TechnicalParams {
                num_threads: Some(2),
            },
            trials: vec!["a.txt".to_string(), "b.txt".to_string()],
            groups: Vec::new(),
        }
    }

    #[test]
    fn valid_params() {
        let params = get_template_run_params();
        assert!(validate_run_params(&params).is_ok());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_run_params(&RunParams::default()).is_ok());
    }

    #[test]
    fn derived_quantities() {
        let params = get_template_run_params().rate_params;
        assert_approx_eq!(f64, params.delta(), 0.25);
        assert_approx_eq!(f64, params.half_bin(), 1.0);
    }

    #[test]
    fn zero_time_bin() {
        let mut params = get_template_run_params();
        params.rate_params.time_bin = 0.0;
        let result = validate_run_params(&params);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "time_bin must be strictly positive"
        );
    }

    #[test]
    fn nan_time_bin() {
        let mut params = get_template_run_params();
        params.rate_params.time_bin = f64::NAN;

        assert_eq!(
            validate_run_params(&params).unwrap_err().as_str(),
            "time_bin must be strictly positive"
        );
    }

    #[test]
    fn negative_sampling_rate() {
        let mut params = get_template_run_params();
        params.rate_params.sampling_rate = -1.0;
        let result = validate_run_params(&params);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "sampling_rate must be strictly positive"
        );
    }

    #[test]
    fn negative_end_time() {
        let mut params = get_template_run_params();
        params.rate_params.end_time = -0.5;

        assert_eq!(
            validate_run_params(&params).unwrap_err().as_str(),
            "end_time must be finite and not negative"
        );
    }

    #[test]
    fn zero_threads() {
        let mut params = get_template_run_params();
        params.technical_params.num_threads = Some(0);

        assert_eq!(
            validate_run_params(&params).unwrap_err().as_str(),
            "num_threads must be strictly positive"
        );
    }

    #[test]
    fn duplicate_trial() {
        let mut params = get_template_run_params();
        params.trials.push("a.txt".to_string());

        assert_eq!(
            validate_run_params(&params).unwrap_err().as_str(),
            "duplicate trial: a.txt"
        );
    }

    #[test]
    fn trial_id_with_path_separator() {
        for trial in ["sub/a.txt", "sub\\a.txt", ""] {
            let mut params = get_template_run_params();
            params.trials.push(trial.to_string());

            assert_eq!(
                validate_run_params(&params).unwrap_err().as_str(),
                format!("invalid trial id {:?}: must be a plain file name", trial)
            );
        }
    }

    #[test]
    fn sample_count_overflow() {
        let mut params = get_template_run_params();
        params.rate_params.end_time = 1000.0;
        params.rate_params.sampling_rate = 1e300;

        let message = validate_run_params(&params).unwrap_err().as_str().to_string();
        assert!(message.starts_with("rate matrix of "));
        assert!(message.ends_with(" samples x 3 neurons is too large"));
    }

    #[test]
    fn rate_matrix_size_overflow() {
        let mut params = get_template_run_params();
        params.rate_params.end_time = 1e6;
        params.rate_params.sampling_rate = 1e6;
        params.rate_params.num_neurons = usize::MAX / 1000;

        assert!(validate_run_params(&params)
            .unwrap_err()
            .as_str()
            .ends_with("neurons is too large"));

        params.rate_params.num_neurons = 3;
        assert!(validate_run_params(&params).is_ok());
    }

    #[test]
    fn num_threads_fallback() {
        assert_eq!(get_num_threads(&TechnicalParams { num_threads: Some(3) }), 3);
        assert_eq!(get_num_threads(&TechnicalParams::default()), num_cpus::get());
    }

    #[test]
    fn params_from_yaml() {
        let params_yaml_str = r#"
end_time: 4.0
time_bin: 1.0
sampling_rate: 1.0
num_neurons: 2
technical_params:
  num_threads: 1
trials:
- trial_a
groups:
- name: Gr
  start_id: 0
  end_id: 1
"#;

        let params: RunParams = serde_yaml::from_str(params_yaml_str).unwrap();

        assert_approx_eq!(f64, params.rate_params.end_time, 4.0);
        assert_eq!(params.rate_params.num_neurons, 2);
        assert_eq!(params.technical_params.num_threads, Some(1));
        assert_eq!(params.trials, ["trial_a"]);
        assert_eq!(params.groups, [GroupDirective::new("Gr", 0, 1)]);
    }

    #[test]
    fn yaml_missing_keys_keep_defaults() {
        let params: RunParams = serde_yaml::from_str("num_neurons: 5\n").unwrap();

        assert_eq!(params.rate_params.num_neurons, 5);
        assert_approx_eq!(f64, params.rate_params.end_time, 1000.0);
        assert_approx_eq!(f64, params.rate_params.sampling_rate, 0.03);
        assert!(params.technical_params.num_threads.is_none());
        assert!(params.trials.is_empty());
    }
}
