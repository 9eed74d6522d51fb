//! Home config file source: `<dkr home>/config.toml`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Add the home config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    config_path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if config_path.exists() {
        builder = builder.add_source(File::from(config_path.to_path_buf()).required(false));
    } else {
        debug!(
            config_path = %config_path.display(),
            "No config file found, using defaults"
        );
    }
    Ok(builder)
}
