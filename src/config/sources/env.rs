//! Environment source: `DKR_ENGINE__HOST`, `DKR_STATE__FILE`, ...

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("DKR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
