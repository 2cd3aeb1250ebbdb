pub mod error;
pub mod group;
pub mod io;
pub mod params;
pub mod pipeline;
pub mod rate;
pub mod rate_matrix;
pub mod settings;
pub mod spike_set;

mod types;
mod util;
