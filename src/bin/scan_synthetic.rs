//! Демо: синтезировать идеальный EAN-13/UPC-A/EAN-8, прогнать через пайплайн
//! и при желании сохранить картинку в PNG.
//!
//!   cargo run --bin scan_synthetic --
//!   cargo run --bin scan_synthetic -- --code 036000291452   # UPC-A (12 цифр)
//!   cargo run --bin scan_synthetic -- --code 96385074 --write-png out.png

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use foodscan::one_d::synth::{ean13_row, ean8_row, encode_png, render};
use foodscan::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "scan_synthetic", version, about)]
struct Args {
    /// Цифры кода: 8 (EAN-8), 12 (UPC-A) или 13 (EAN-13)
    #[arg(long, default_value = "5901234123457")]
    code: String,
    /// Ширина модуля в пикселях
    #[arg(long, default_value_t = 2)]
    unit: usize,
    /// Высота картинки
    #[arg(long, default_value_t = 64)]
    height: usize,
    /// Сохранить синтезированную картинку в PNG
    #[arg(long)]
    write_png: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let row = match args.code.len() {
        8 => ean8_row(&args.code, args.unit),
        12 | 13 => ean13_row(&args.code, args.unit),
        _ => None,
    };
    let Some(row) = row else {
        bail!("код должен состоять из 8, 12 или 13 цифр: {:?}", args.code);
    };

    let grid = render(&row, args.height.max(1)).context("картинка слишком большая")?;
    let png = encode_png(&grid).context("encoding PNG")?;
    info!(width = grid.width(), height = grid.height(), "synthetic image ready");

    // через полный путь: PNG → декодер → детектор
    let found = Pipeline::new().detect(&png, "png");
    if found.is_empty() {
        println!("Ничего не распознано :(");
    } else {
        for text in &found {
            println!("{text}");
        }
    }

    if let Some(path) = args.write_png {
        fs::write(&path, &png).with_context(|| format!("writing {}", path.display()))?;
        println!("PNG сохранён: {}", path.display());
    }
    Ok(())
}
