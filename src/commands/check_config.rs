use std::path::Path;

use anyhow::Result;

use crate::config;

pub fn run(config_file: Option<&Path>) -> Result<()> {
    let (path, config) = config::load_resolved(config_file)?;
    config.source.timeout()?;
    config.cache.ttl()?;

    match &path {
        Some(p) => println!("# {}", p.display()),
        None => println!("# no f1replay.toml found, using defaults"),
    }
    print!("{}", toml::to_string_pretty(&config)?);
    println!("# cache directory: {}", config.cache.resolved_dir().display());
    Ok(())
}
