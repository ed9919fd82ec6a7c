//! Provider and configuration inspection commands.

use std::path::Path;

use crate::catalog::ProviderRegistry;
use crate::config::{self, Config};
use crate::model::EntityKind;

/// Print the registered providers and each kind's fallback chain
pub fn cmd_providers(config: &Config) -> anyhow::Result<()> {
    let registry = ProviderRegistry::from_config(config)?;

    println!("Providers");
    println!("=========");
    for name in registry.names() {
        let (variant, authenticated) = config
            .provider(name)
            .map(|p| (p.variant.as_str(), p.token.is_some()))
            .unwrap_or(("?", false));
        let auth = if authenticated { "token set" } else { "no token" };
        println!("  {name:<14} {variant:<12} {auth}");
    }
    println!();

    println!("Fallback chains");
    println!("===============");
    for kind in EntityKind::ALL {
        let chain: Vec<&str> = registry.chain(kind).iter().map(|p| p.name()).collect();
        let chain = if chain.is_empty() { "(none)".to_string() } else { chain.join(" → ") };
        println!("  {:<7} {chain}", kind.as_str());
    }
    println!();
    println!("Records expire after {}s", config.cache.expiration_secs);

    Ok(())
}

/// Print the configuration as TOML, optionally saving it
pub fn cmd_config(config: &Config, path: Option<&Path>, write: bool) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);

    if write {
        let saved = match path {
            Some(path) => {
                config::save_to(config, path)?;
                path.to_path_buf()
            }
            None => config::save(config)?,
        };
        eprintln!("Saved config to {}", saved.display());
    }
    Ok(())
}
