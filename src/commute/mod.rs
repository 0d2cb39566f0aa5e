pub mod cache;
pub mod service;

pub use service::{CommuteError, CommuteService, TransitFeed, WalkingMatrix, assemble_options};
