use anyhow::Error;

use crate::args::ConfigSubCommand;
use crate::config::{default_config_path, Config};

pub fn run(cmd: &ConfigSubCommand) -> Result<(), Error> {
    let config = Config::load(cmd.config.as_deref())?;
    let source = cmd
        .config
        .clone()
        .unwrap_or_else(default_config_path);
    println!("# effective configuration (file: {})", source.display());
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}
