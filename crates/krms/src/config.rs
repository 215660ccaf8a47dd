//! CLI-side configuration loading: `.env`, settings file and flag
//! overrides, resolved into a `PipelineConfig`.

use krms_config::{Settings, load_env_file, load_settings, resolve};
use krms_core::PipelineConfig;
use tracing::debug;

use crate::cli::SourceArgs;
use crate::error::CliError;

/// Load the `.env` file and settings named by `source`.
fn load_sources(source: &SourceArgs) -> Result<Settings, CliError> {
    if let Some(path) = load_env_file(source.env_file.as_deref())? {
        debug!(path = %path.display(), "loaded environment file");
    }
    Ok(load_settings(source.config.as_deref())?)
}

/// Resolve the full configuration. With `no_email`, `SEND_EMAIL` reads as
/// false so no SMTP variables are required.
pub fn pipeline_config(source: &SourceArgs, no_email: bool) -> Result<PipelineConfig, CliError> {
    let settings = load_sources(source)?;
    let lookup = |name: &str| {
        if no_email && name == "SEND_EMAIL" {
            Some("false".to_owned())
        } else {
            std::env::var(name).ok()
        }
    };
    Ok(resolve(lookup, &settings)?)
}
