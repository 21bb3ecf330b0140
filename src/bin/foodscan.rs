//! foodscan: распознать продукт по фото штрих-кода, обогатить его данными
//! OpenFoodFacts и вести учёт запасов в JSON-файле.
//!
//! Логи пишутся в stderr (уровень через RUST_LOG, по умолчанию info),
//! результат в stdout в виде JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use foodscan::catalog::OpenFoodFactsClient;
use foodscan::record::EventKind;
use foodscan::store::{MemoryStore, Store};
use foodscan::{Action, Barcode, Config, EnrichmentWorkflow, Outcome, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "foodscan", version, about)]
struct Args {
    /// Путь к TOML-конфигу (иначе FOODSCAN_CONFIG, иначе умолчания)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Распознать штрих-код и найти продукт в каталоге
    Scan {
        image: PathBuf,
        /// Формат изображения (png, jpeg, gif, bmp); по умолчанию из расширения
        #[arg(short, long)]
        format: Option<String>,
        /// Сохранить продукт в инвентарь
        #[arg(long)]
        save: bool,
        /// Файл содержит изображение в base64
        #[arg(long)]
        base64: bool,
    },
    /// Только распознать штрих-коды
    Detect {
        image: PathBuf,
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Изменить количество продукта в инвентаре
    Adjust {
        barcode: String,
        quantity: u32,
        /// added, removed, consumed или expired
        #[arg(short, long, default_value = "added")]
        kind: EventKind,
    },
    /// Указать срок годности и место хранения продукта
    Set {
        barcode: String,
        /// Срок годности, ГГГГ-ММ-ДД
        #[arg(long)]
        expires: Option<NaiveDate>,
        /// Где лежит: холодильник, шкаф, ...
        #[arg(long)]
        location: Option<String>,
    },
    /// Продукты, срок которых истекает в ближайшие дни
    Expiring {
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::resolve(args.config.as_deref()).context("loading configuration")?;

    match args.command {
        Command::Scan {
            image,
            format,
            save,
            base64,
        } => scan(&config, &image, format, save, base64),
        Command::Detect { image, format } => detect(&config, &image, format),
        Command::Adjust {
            barcode,
            quantity,
            kind,
        } => adjust(&config, &barcode, quantity, kind),
        Command::Set {
            barcode,
            expires,
            location,
        } => set(&config, &barcode, expires, location),
        Command::Expiring { days } => expiring(&config, days),
    }
}

fn scan(
    config: &Config,
    image: &Path,
    format: Option<String>,
    save: bool,
    base64: bool,
) -> anyhow::Result<()> {
    let format = format.unwrap_or_else(|| format_from_path(image));
    let action = if save { Action::ScanAndSave } else { Action::Scan };

    let catalog = OpenFoodFactsClient::new(&config.catalog).context("building catalog client")?;
    let store = MemoryStore::load(&config.store.path)
        .with_context(|| format!("loading inventory {}", config.store.path.display()))?;
    let workflow = EnrichmentWorkflow::with_pipeline(
        Pipeline::with_options(config.detector.clone()),
        catalog,
        &store,
    );

    let outcome = if base64 {
        let text = fs::read_to_string(image)
            .with_context(|| format!("reading {}", image.display()))?;
        workflow.handle_encoded(&text, &format, action)
    } else {
        let bytes = fs::read(image).with_context(|| format!("reading {}", image.display()))?;
        workflow.handle(&bytes, &format, action)
    };

    if matches!(outcome, Outcome::Saved { .. }) {
        store
            .save(&config.store.path)
            .with_context(|| format!("writing inventory {}", config.store.path.display()))?;
    }

    print_json(&report(&outcome)?)
}

fn detect(config: &Config, image: &Path, format: Option<String>) -> anyhow::Result<()> {
    let format = format.unwrap_or_else(|| format_from_path(image));
    let bytes = fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let texts = Pipeline::with_options(config.detector.clone()).detect(&bytes, &format);
    print_json(&json!({ "barcodes": texts }))
}

fn adjust(config: &Config, barcode: &str, quantity: u32, kind: EventKind) -> anyhow::Result<()> {
    let barcode = Barcode::parse(barcode)?;
    let store = MemoryStore::load(&config.store.path)
        .with_context(|| format!("loading inventory {}", config.store.path.display()))?;

    let Some(record) = store.find_by_barcode(&barcode)? else {
        bail!("продукт {barcode} не найден в инвентаре");
    };
    let event = store.append_event(record.id, quantity, kind)?;
    store
        .save(&config.store.path)
        .with_context(|| format!("writing inventory {}", config.store.path.display()))?;

    let left = store.find_by_id(record.id).map(|r| r.food.quantity);
    info!(barcode = %barcode, kind = %kind, quantity, "inventory adjusted");
    print_json(&json!({ "event": event, "quantity": left }))
}

fn set(
    config: &Config,
    barcode: &str,
    expires: Option<NaiveDate>,
    location: Option<String>,
) -> anyhow::Result<()> {
    if expires.is_none() && location.is_none() {
        bail!("нужно указать --expires и/или --location");
    }
    let barcode = Barcode::parse(barcode)?;
    let store = MemoryStore::load(&config.store.path)
        .with_context(|| format!("loading inventory {}", config.store.path.display()))?;

    let Some(record) = store.find_by_barcode(&barcode)? else {
        bail!("продукт {barcode} не найден в инвентаре");
    };
    let record = store.annotate(record.id, expires, location)?;
    store
        .save(&config.store.path)
        .with_context(|| format!("writing inventory {}", config.store.path.display()))?;

    info!(barcode = %barcode, "inventory record updated");
    print_json(&json!({ "record": record }))
}

fn expiring(config: &Config, days: u32) -> anyhow::Result<()> {
    let store = MemoryStore::load(&config.store.path)
        .with_context(|| format!("loading inventory {}", config.store.path.display()))?;
    let today = Local::now().date_naive();
    let records = store.expiring_within(today, days);
    print_json(&json!({ "today": today, "days": days, "records": records }))
}

/// Ответ в форме `{ success, message, outcome, ... }`.
fn report(outcome: &Outcome) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(outcome)?;
    if let Value::Object(map) = &mut value {
        map.insert("success".into(), Value::Bool(outcome.is_success()));
        map.insert("message".into(), Value::String(outcome.message().into()));
    }
    Ok(value)
}

fn format_from_path(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
