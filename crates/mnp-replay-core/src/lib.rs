pub mod aggregate;
pub mod config;
pub mod confirmation;
pub mod durations;
pub mod error;
pub mod ingestion;
pub mod outputs;
pub mod pipeline;
pub mod query;
pub mod registries;
pub mod rounds;
pub mod summary;
pub mod time;

pub use config::{PhaseOffsets, PipelineConfig};
pub use error::{PipelineError, Result};
pub use outputs::ReplayOutput;
pub use pipeline::{run, PipelineRun};
