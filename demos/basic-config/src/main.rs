//! Declares a small configuration, loads it from JSON and the environment,
//! and shows defaults, locking and custom field kinds.

use anyhow::{Context, Result};
use bonfig::prelude::*;
use bonfig::schema::CodecError;
use bonfig::KindRegistry;
use clap::Parser;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Load a declarative configuration and print it")]
struct Args {
    /// JSON document used as the `d` store.
    #[arg(long, default_value = r#"{"Output": {"c": "1353"}}"#)]
    json: String,

    /// Prefix of the environment variables captured into the `environ` store.
    #[arg(long, default_value = "BONFIG_")]
    env_prefix: String,

    /// Value written to `Output/c` inside a scoped unlock.
    #[arg(long)]
    set_c: Option<i64>,
}

#[derive(Bonfig)]
#[bonfig(store = "d", name = "BasicConfig")]
struct BasicConfig {
    #[bonfig(section = "Output", name = "A Really Long Descriptive Name", default = "foo")]
    a: Field<String>,
    #[bonfig(section = "Output", name = "B", default = "bar")]
    b: Field<String>,
    #[bonfig(section = "Output")]
    c: Field<i64>,
    #[bonfig(section = "Out on a limb", default = "hmmm")]
    lonely: Field<String>,
    #[bonfig(store = "environ", name = "LEVEL", default = "info")]
    level: Field<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let registry = KindRegistry::new();
    registry.make_quick("HourField", read_hour, write_hour)?;

    let mut builder = Schema::builder(BasicConfig::SCHEMA_NAME);
    let fields = BasicConfig::declare(&mut builder)?;
    let input = builder.store("d")?.section("Input")?;
    let start = builder.add(
        input
            .kind(&registry, "HourField", "start-time")?
            .default(json!(7)),
    )?;
    let schema = builder.build();

    let document: Value = serde_json::from_str(&args.json).context("parsing --json")?;
    let prefix = args.env_prefix;
    let mut cfg = Config::load(schema, move |stores: &mut Stores| -> Result<()> {
        stores.insert("d", MemoryStore::from_value(document)?)?;
        stores.insert("environ", EnvStore::capture_prefixed(&prefix))?;
        Ok(())
    })?;

    info!("A = {}", cfg.get(&fields.a)?);
    info!("B = {}", cfg.get(&fields.b)?);
    info!("lonely = {}", cfg.get(&fields.lonely)?);
    info!("LEVEL = {}", cfg.get(&fields.level)?);
    info!("start-time = {}", cfg.get(&start)?);
    match cfg.try_get(&fields.c)? {
        Some(c) => info!("c = {c}"),
        None => info!("c is not set"),
    }

    if let Some(value) = args.set_c {
        if let Err(err) = cfg.set(&fields.c, value) {
            warn!("direct write refused: {err}");
        }
        cfg.with_unlocked(|cfg| cfg.set(&fields.c, value))??;
        info!("c = {} (locked again: {})", cfg.get(&fields.c)?, cfg.is_locked());
    }

    println!("{}", serde_json::to_string_pretty(&cfg.snapshot())?);
    Ok(())
}

/// Stored as the hour in text, read back as a number.
fn read_hour(raw: Value) -> Result<Value, CodecError> {
    match raw {
        Value::String(text) => text
            .parse::<u32>()
            .map(Value::from)
            .map_err(|err| CodecError::parse("hour", text.as_str(), err)),
        other => Ok(other),
    }
}

fn write_hour(value: Value) -> Result<Value, CodecError> {
    match value.as_u64() {
        Some(hour) if hour < 24 => Ok(Value::String(hour.to_string())),
        _ => Err(CodecError::unexpected("hour", &value)),
    }
}
