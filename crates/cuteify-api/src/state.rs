//! Application state shared by every handler.

use cuteify_core::Config;
use cuteify_processing::UploadPipeline;

pub struct AppState {
    pub config: Config,
    pub pipeline: UploadPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: UploadPipeline) -> Self {
        Self { config, pipeline }
    }
}
