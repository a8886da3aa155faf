// stencil CLI library

pub mod commands;
pub mod error;
pub mod logging;
pub mod router;

pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use router::{Cli, CommandRouter, Commands};

use std::path::Path;

use stencil_templates::{EngineConfig, TemplateEngine, TemplateError};

/// Build an engine from a config file, or the default location when none is given
pub fn engine_from_config(path: Option<&Path>) -> Result<TemplateEngine, TemplateError> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_default()?,
    };
    TemplateEngine::try_from(config)
}
