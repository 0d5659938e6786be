//! Blocking page downloads.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("luna-dts/", env!("CARGO_PKG_VERSION"));

pub fn client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build http client")
}

/// Download one documentation page as text. Non-2xx is an error.
pub fn fetch(client: &Client, url: &str) -> anyhow::Result<String> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("bad status: {url}"))?;
    response
        .text()
        .with_context(|| format!("failed to read body: {url}"))
}
