pub mod client;
pub mod types;

pub use client::{MbtaClient, MbtaError};
pub use types::{Prediction, Stop};
