mod cli;

use anyhow::Context;
use clap::Parser;
use encoding_rs::UTF_8;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Emit};
use dt_mapper::MapperOptions;

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if is_url(input) {
        debug!(url = input, "fetching document");
        let response = reqwest::blocking::get(input)
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to fetch {input}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read response body from {input}"))?;
        Ok(bytes.to_vec())
    } else {
        std::fs::read(input).with_context(|| format!("failed to read {input}"))
    }
}

/// Decode the raw document, honoring a byte order mark and falling back to UTF-8.
fn decode(input: &str, bytes: &[u8]) -> String {
    let (decoded, encoding, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        warn!(input, encoding = encoding.name(), "input contained malformed sequences");
    }
    decoded.into_owned()
}

fn to_json(value: &impl Serialize, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let bytes = read_input(&cli.input)?;
    let xml = decode(&cli.input, &bytes);
    let options = MapperOptions {
        allow_dtd: cli.allow_dtd,
        ..Default::default()
    };

    let json = match cli.emit {
        Emit::Object => {
            let object = dt_mapper::parse_with_options(&xml, &options)
                .with_context(|| format!("failed to map {}", cli.input))?;
            to_json(&object, cli.pretty)?
        }
        Emit::Schema => {
            let schema = dt_mapper::infer(&xml, &options)
                .with_context(|| format!("failed to infer a schema from {}", cli.input))?;
            to_json(&schema, cli.pretty)?
        }
    };
    println!("{json}");
    Ok(())
}
