//! Global file source: $XDG_CONFIG_HOME/hotload/config.toml (optional)

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_path() {
        Some(path) => Ok(builder.add_source(
            File::from(path).format(FileFormat::Toml).required(false),
        )),
        None => Ok(builder),
    }
}
