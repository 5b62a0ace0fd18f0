use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    catalog: Option<PathBuf>,
    config_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    let root = match &args.config_dir {
        Some(dir) => dir.clone(),
        None => luminex::config::config_root()?,
    };
    luminex::config::ensure_dir(&root)?;
    let _guard = init_logging(&root);

    luminex::app::run_with_startup(luminex::app::AppStartupOptions {
        catalog: args.catalog,
        config_dir: Some(root),
    })
}

/// Logs go to a file next to the slots; stdout belongs to the terminal UI.
fn init_logging(root: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(root, luminex::config::log_file_name());
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--catalog" => {
                index += 1;
                out.catalog = Some(path_value(&args, index, "--catalog")?);
            }
            "--config-dir" => {
                index += 1;
                out.config_dir = Some(path_value(&args, index, "--config-dir")?);
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn path_value(args: &[String], index: usize, flag: &str) -> anyhow::Result<PathBuf> {
    let Some(value) = args.get(index) else {
        anyhow::bail!("{flag} requires a path");
    };
    if value.trim().is_empty() {
        anyhow::bail!("{flag} cannot be empty");
    }
    Ok(PathBuf::from(value.trim()))
}

fn print_help() {
    println!("Luminex");
    println!("  --catalog <path>     Load videos and tracks from a JSON catalog");
    println!("  --config-dir <path>  Directory for settings, favorites and logs");
    println!("                       (default: $LUMINEX_CONFIG_DIR or ~/.config/luminex)");
    println!("  -h, --help           Show this help");
}
