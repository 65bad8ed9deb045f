//! Jenkins remote trigger: crumb, build request, queue polling and
//! latest-build lookup over blocking HTTP.

pub mod best_effort;
mod client;
mod error;
pub mod normalize;

pub use best_effort::best_effort;
pub use client::{BuildRef, ConnectionStatus, JenkinsClient, TriggerOutcome, TriggerRequest};
pub use error::TriggerError;
pub use normalize::normalize_url;
