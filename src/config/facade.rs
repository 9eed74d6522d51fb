//! Config loading facade.

use super::merge::merge_policy::builder_with_defaults;
use super::paths::default_config_file;
use super::sources::{env, home_file};
use super::DkrConfig;
use crate::error::DkrError;
use config::File;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, `<dkr home>/config.toml`, then `DKR_*` environment overrides.
    pub fn load() -> Result<DkrConfig, DkrError> {
        let builder = builder_with_defaults()?;
        let builder = home_file::add_to_builder(builder, &default_config_file()?)?;
        let builder = env::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load from an explicit file; the home config file is skipped.
    pub fn load_from_file(path: &Path) -> Result<DkrConfig, DkrError> {
        if !path.exists() {
            return Err(DkrError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path.to_path_buf()));
        let builder = env::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }
}
