//! CLI command implementations

mod cast;
mod config;
mod describe;
mod output;

pub use cast::{cast, CastArgs};
pub use config::{config, ConfigArgs};
pub use describe::{describe, DescribeArgs};
