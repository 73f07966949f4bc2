//! `mongofixture` command-line entry point.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;

use mongofixture::cli_args::{Cli, Command, LoadArgs, PingArgs};
use mongofixture::config::load_settings;
use mongofixture::store::memory::MemoryStore;
use mongofixture::{DocumentData, FixtureConfig, FixtureLoader};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Load(cli) => {
            let args = load_settings(&cli)?;
            let config = args.to_config()?;
            if args.dry_run {
                dry_run(config, &args.names).await
            } else {
                load_into_database(&args, config).await
            }
        }
        Command::Ping(cli) => ping(&load_settings(&cli)?).await,
    }
}

async fn dry_run(config: FixtureConfig, names: &[String]) -> Result<()> {
    let loader = FixtureLoader::new(config, MemoryStore::new());
    let report = loader.load(names).await?;
    let collections: BTreeMap<&str, Vec<DocumentData>> = report
        .collections()
        .iter()
        .map(|(name, _)| (name.as_str(), loader.store().documents(name)))
        .collect();
    let json = serde_json::to_string_pretty(&collections).context("render collections")?;
    println!("{json}");
    Ok(())
}

#[cfg(feature = "mongodb")]
fn connection<'a>(url: Option<&'a str>, database: Option<&'a str>) -> Result<(&'a str, &'a str)> {
    let url = url.context("no MongoDB URL configured (--url or [cmds.<name>] url)")?;
    let database =
        database.context("no database configured (--database or [cmds.<name>] database)")?;
    Ok((url, database))
}

#[cfg(feature = "mongodb")]
async fn load_into_database(args: &LoadArgs, config: FixtureConfig) -> Result<()> {
    use mongofixture::store::mongo::MongoStore;

    let (url, database) = connection(args.url.as_deref(), args.database.as_deref())?;
    let store = MongoStore::new(url, database, config.timeout()).await?;
    let report = FixtureLoader::new(config, store).load(&args.names).await?;
    for (collection, count) in report.collections() {
        log::info!("{collection}: {count} document(s)");
        println!("{collection}\t{count}");
    }
    Ok(())
}

#[cfg(feature = "mongodb")]
async fn ping(args: &PingArgs) -> Result<()> {
    use mongofixture::store::mongo::MongoStore;

    let (url, database) = connection(args.url.as_deref(), args.database.as_deref())?;
    let store = MongoStore::new(url, database, args.timeout()).await?;
    store.ping().await.context("ping failed")?;
    println!("ok");
    Ok(())
}

#[cfg(not(feature = "mongodb"))]
#[allow(
    clippy::unused_async,
    reason = "signature matches the database-backed variant"
)]
async fn load_into_database(_args: &LoadArgs, _config: FixtureConfig) -> Result<()> {
    anyhow::bail!("built without the `mongodb` feature; rerun with --dry-run")
}

#[cfg(not(feature = "mongodb"))]
#[allow(
    clippy::unused_async,
    reason = "signature matches the database-backed variant"
)]
async fn ping(_args: &PingArgs) -> Result<()> {
    anyhow::bail!("built without the `mongodb` feature")
}
