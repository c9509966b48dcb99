
pub mod logging;
pub mod matrix;
pub mod transforms;
pub mod angles;
pub mod options;
pub mod command;
pub mod tomoj;
pub mod tilt_series;
pub mod output_set;
pub mod config;
pub mod protocol;
