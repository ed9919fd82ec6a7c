//! Record search and lookup commands.

use tokio::runtime::Runtime;

use super::open_store;
use crate::config::Config;
use crate::model::EntityKind;

/// Search the kind's provider chain and print the results as JSON
pub fn cmd_search(rt: &Runtime, config: &Config, kind: EntityKind, query: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(config).await?;
        let results = store.search(kind, query).await?;
        if results.is_empty() {
            tracing::info!(%kind, query, "No results from any provider");
        }
        println!("{}", serde_json::to_string_pretty(&results)?);
        Ok::<_, anyhow::Error>(())
    })
}

/// Fetch records and print them as JSON.
///
/// One id prints the record itself; several ids print the list of those
/// that resolved.
pub fn cmd_get(rt: &Runtime, config: &Config, kind: EntityKind, ids: &[String]) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(config).await?;
        let output = match ids {
            [id] => match store.get(kind, id.trim()).await {
                Ok(cached) => serde_json::to_string_pretty(&cached)?,
                Err(e) if e.is_not_found() => {
                    eprintln!("Not found: {e}");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            },
            ids => {
                let records = store.get_many(kind, ids).await?;
                if records.is_empty() {
                    eprintln!("Not found: none of the {} {kind} ids resolved", ids.len());
                    std::process::exit(1);
                }
                serde_json::to_string_pretty(&records)?
            }
        };
        println!("{output}");
        Ok::<_, anyhow::Error>(())
    })
}
