mod config;
mod constants;
mod dataset;
mod error;
mod report;
mod style;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::error::Error;
use std::fs::{self, File};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{DEFAULT_CONFIG_PATH, load_map_config};
use crate::report::{MapSummary, generate_map, inject_header};
use crate::style::AREA_BUCKETS;
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

const APP_ABOUT: &str = "Solarmap - interactive rooftop solar potential map from GeoJSON";
const DEFAULT_INPUT: &str = "datos/Edificios_Orcasitas.json";
const DEFAULT_OUTPUT_HTML: &str = "public_html/index_orcasitas.html";

#[derive(Parser, Debug)]
#[command(name = "solarmap", about = APP_ABOUT)]
struct Args {
    /// GeoJSON FeatureCollection со зданиями.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        default_value = DEFAULT_INPUT
    )]
    input: PathBuf,
    /// Куда сохранить HTML.
    #[arg(
        short = 'o',
        long = "output-html",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_HTML
    )]
    output_html: PathBuf,
    /// TOML-файл с параметрами карты.
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Не минифицировать HTML (по умолчанию минифицируется).
    #[arg(
        long = "no-minify-html",
        default_value_t = true,
        action = ArgAction::SetFalse
    )]
    minify_html: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Вставить шапку в уже сгенерированный HTML (повторный запуск ничего не меняет).
    InjectHeader {
        /// HTML-документ.
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Сгенерировать файлы автодополнения для shell.
    Completions {
        /// Целевой shell.
        #[arg(value_enum)]
        shell: Shell,
        /// Куда сохранить файл (если не указано — stdout).
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn generate_completions(shell: Shell, output: Option<PathBuf>) -> Result<(), String> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
        }
        let mut file = File::create(&path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        generate(shell, &mut cmd, bin_name, &mut file);
    } else {
        let mut stdout = std::io::stdout();
        generate(shell, &mut cmd, bin_name, &mut stdout);
    }
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("solarmap=info"));
    let ansi = std::io::stdout().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .compact()
        .init();
}

fn headline(message: &str) {
    tracing::info!(status = "start", "{message}");
}

fn info(message: &str) {
    tracing::info!(status = "info", "{message}");
}

fn success(message: &str) {
    tracing::info!(status = "ok", "{message}");
}

fn warn(message: &str) {
    tracing::warn!(status = "warn", "{message}");
}

fn error(message: &str) {
    tracing::error!(status = "err", "{message}");
}

/// Сообщение об ошибке вместе с цепочкой причин.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn log_summary(summary: &MapSummary) {
    for (bucket, count) in AREA_BUCKETS.iter().zip(summary.per_bucket) {
        tracing::info!(
            bucket = %bucket.label(),
            fill = bucket.style.fill_color,
            buildings = count,
            "Area bucket"
        );
    }
    if summary.unclassified > 0 {
        info(&format!(
            "{} buildings fell outside all area buckets",
            summary.unclassified
        ));
    }
}

fn run_generate(
    input: &Path,
    output_html: &Path,
    config_path: &Path,
    minify_html: bool,
) -> ExitCode {
    let config = match load_map_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            error(&err);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        mode = "generate",
        input = %input.display(),
        output_html = %output_html.display(),
        config = %config_path.display(),
        minify_html,
        "Building solar map"
    );
    match generate_map(input, output_html, &config, minify_html) {
        Ok(summary) => {
            log_summary(&summary);
            success(&format!(
                "Saved map with {} buildings to {}",
                summary.features,
                output_html.display()
            ));
            ExitCode::SUCCESS
        }
        Err(err) => {
            error(&format!("Failed to build map: {}", describe(&err)));
            ExitCode::FAILURE
        }
    }
}

fn run_inject_header(path: &Path, config_path: &Path) -> ExitCode {
    let config = match load_map_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            error(&err);
            return ExitCode::FAILURE;
        }
    };
    match inject_header(path, &config.header) {
        Ok(true) => success(&format!("Inserted header into {}", path.display())),
        Ok(false) => info(&format!("Header already present in {}", path.display())),
        // Ошибка вставки шапки не считается провалом запуска.
        Err(err) => warn(&format!("Header not inserted: {}", describe(&err))),
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = Args::parse();
    match args.command {
        Some(Command::Completions { shell, output }) => {
            if let Err(err) = generate_completions(shell, output) {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Some(Command::InjectHeader { path }) => {
            init_logging();
            headline(APP_ABOUT);
            run_inject_header(&path, &args.config)
        }
        None => {
            init_logging();
            headline(APP_ABOUT);
            run_generate(&args.input, &args.output_html, &args.config, args.minify_html)
        }
    }
}
