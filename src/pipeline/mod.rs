//! Processing pipeline components.

mod coordinator;
mod flush;
mod orchestrator;

pub use coordinator::{collect_input_files, output_dir_for, output_path_for};
pub use flush::FlushPolicy;
pub use orchestrator::{PipelineOptions, PipelineSummary, process_raster};
