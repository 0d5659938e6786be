//! Command line surface: scrape → (schema | dts)

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use scraper::Html;

use crate::config::Config;
use crate::fetch;
use crate::model::{Group, Service};

// ------------------------------- Types ------------------------------------- //

/// scrape webOS Luna service docs and output either the normalized JSON
/// schema or a TypeScript declaration tree
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// scrape and print the normalized service schema as JSON
    Schema(SchemaOut),
    /// scrape and write a .d.ts declaration tree
    Dts(DtsOut),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Lg,
    Ose,
    All,
}

#[derive(Args, Debug, Clone)]
struct ScrapeSettings {
    /// which documentation source to scrape
    #[arg(long, value_enum, default_value_t = Provider::Ose)]
    provider: Provider,

    /// scrape only these page urls instead of the configured list
    /// (they are all attributed to --provider)
    #[arg(long)]
    url: Vec<String>,

    /// JSON file with per-provider page lists, replacing the built-in ones
    #[arg(long)]
    config: Option<PathBuf>,

    /// pages fetched in parallel per batch
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
}

#[derive(Args, Debug)]
struct SchemaOut {
    #[command(flatten)]
    scrape: ScrapeSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DtsOut {
    #[command(flatten)]
    scrape: ScrapeSettings,

    /// output directory root (cleared before writing)
    #[arg(short, long, default_value = "out-dts")]
    out: PathBuf,
}

// ---------------------------- Implementation -------------------------------- //

impl ScrapeSettings {
    fn jobs(&self) -> anyhow::Result<Vec<(Group, String)>> {
        if !self.url.is_empty() {
            let group = match self.provider {
                Provider::Lg => Group::Lg,
                Provider::Ose => Group::Ose,
                Provider::All => bail!("--url needs a single --provider, not 'all'"),
            };
            return Ok(self.url.iter().map(|u| (group, u.clone())).collect());
        }

        let config = match self.config.as_deref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let groups: &[Group] = match self.provider {
            Provider::Lg => &[Group::Lg],
            Provider::Ose => &[Group::Ose],
            Provider::All => &[Group::Lg, Group::Ose],
        };
        let mut jobs = Vec::new();
        for &group in groups {
            jobs.extend(config.urls(group).iter().map(|u| (group, u.clone())));
        }
        Ok(jobs)
    }

    /// Fetch and extract every configured page, `batch_size` at a time.
    /// Per-page failures are reported and skipped; a run where every page
    /// failed is an error.
    fn scrape(&self) -> anyhow::Result<Vec<Service>> {
        let jobs = self.jobs()?;
        if jobs.is_empty() {
            bail!("nothing to scrape: the page list is empty");
        }
        let client = fetch::client()?;
        let batch_size = self.batch_size.max(1);

        let mut services = Vec::with_capacity(jobs.len());
        for batch in jobs.chunks(batch_size) {
            let results: Vec<(String, anyhow::Result<Service>)> = batch
                .par_iter()
                .map(|(group, url)| {
                    let result = fetch::fetch(&client, url).and_then(|body| {
                        let doc = Html::parse_document(&body);
                        crate::extract::extract(*group, &doc, url)
                            .with_context(|| format!("extraction failed for {url}"))
                    });
                    (url.clone(), result)
                })
                .collect();
            for (url, result) in results {
                match result {
                    Ok(service) => services.push(service),
                    Err(error) => {
                        eprintln!("{} skipping {url}: {error:#}", "error:".red().bold());
                    }
                }
            }
        }

        if services.is_empty() {
            bail!("all {} pages failed", jobs.len());
        }
        Ok(services)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let services = target.scrape.scrape()?;
                let json = serde_json::to_string_pretty(&services)
                    .context("failed to serialize schema")?;
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent).with_context(|| {
                                format!("failed to create {}", parent.display())
                            })?;
                        }
                        std::fs::write(out, &json)
                            .with_context(|| format!("failed to write {}", out.display()))?;
                    }
                    None => println!("{json}"),
                }
            }
            Command::Dts(target) => {
                let services = target.scrape.scrape()?;
                let project = crate::dts::emit(&services)?;
                project.save(&target.out)?;
                eprintln!(
                    "wrote {} declaration files under {}",
                    project.len(),
                    target.out.display()
                );
            }
        }
        Ok(())
    }
}
