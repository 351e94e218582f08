//! CLI entry point for `linkscan`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use linkscan::config::Config;
use linkscan::extract::urls::extract_urls;
use linkscan::links::normalize::dedupe;
use linkscan::links::reachability::AssumePublic;
use linkscan::pipeline::{ScanReport, Scanner};
use linkscan::source::attachments::{AttachmentSource, DirectoryAttachments};
use linkscan::source::dump::load_dump;

#[derive(Parser)]
#[command(
    name = "linkscan",
    version,
    about = "Find shared file links in a mailbox dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a mailbox dump for shared file links
    Scan {
        /// JSON dump of message resources
        dump: PathBuf,
        /// Read attachment bodies from <DIR>/<message id>/<attachment id>
        #[arg(long, value_name = "DIR")]
        attachments_dir: Option<PathBuf>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Also list every link found, not only unique file links
        #[arg(long)]
        all: bool,
    },
    /// Extract and normalize the links of a plain text file
    Urls {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = linkscan::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Scan {
            dump,
            attachments_dir,
            json,
            all,
        } => cmd_scan(&dump, attachments_dir.as_deref(), json, all, &config).await,
        Commands::Urls { file, json } => cmd_urls(&file, json),
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = linkscan::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "linkscan.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Scan a mailbox dump and print the unique public file links.
async fn cmd_scan(
    dump: &Path,
    attachments_dir: Option<&Path>,
    json: bool,
    all: bool,
    config: &Config,
) -> anyhow::Result<()> {
    if !dump.exists() {
        anyhow::bail!("Mailbox dump not found: {}", dump.display());
    }

    let mailbox = load_dump(dump)?;
    let directory = attachments_dir.map(DirectoryAttachments::new);
    let attachments: &dyn AttachmentSource = match &directory {
        Some(dir) => dir,
        None => &mailbox.attachments,
    };

    // No remote reachability check is wired into the CLI.
    let scanner = Scanner::from_config(attachments, &AssumePublic, config)?;

    let pb = ProgressBar::new(mailbox.messages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Scanning [{bar:40.cyan/blue}] {pos}/{len} messages")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let report = scanner
        .run(
            &mailbox.messages,
            Some(&|settled, total| {
                pb.set_length(total as u64);
                pb.set_position(settled as u64);
            }),
        )
        .await;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, elapsed, all);
    }

    Ok(())
}

/// Extract and normalize the links of a text file.
fn cmd_urls(file: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", file.display()))?;
    let unique = dedupe(extract_urls(&text));

    if json {
        println!("{}", serde_json::to_string_pretty(&unique)?);
    } else {
        for url in &unique {
            println!("{url}");
        }
    }
    Ok(())
}

/// Print the effective configuration, or write the defaults to disk.
fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        let path = linkscan::config::save_config(&Config::default())?;
        println!("  Wrote default configuration to {}", path.display());
        return Ok(());
    }

    if let Some(path) = linkscan::config::config_file_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "linkscan", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print a scan report in human-readable form.
fn print_report(report: &ScanReport, elapsed: std::time::Duration, all: bool) {
    println!();
    println!("  {:<20} {}", "Messages", report.messages);
    println!("  {:<20} {}", "Failed messages", report.failures.len());
    println!("  {:<20} {}", "Links found", report.all_urls.len());
    println!("  {:<20} {}", "File links", report.file_urls.len());
    println!("  {:<20} {}", "Public file links", report.public_urls.len());
    println!("  {:<20} {}", "Unique", report.unique_urls.len());
    println!("  {:<20} {:.2?}", "Scan time", elapsed);

    if !report.failures.is_empty() {
        println!();
        println!("  Failed messages:");
        for failure in &report.failures {
            println!("    {}  {}", failure.message_id, failure.reason);
        }
    }

    if all && !report.all_urls.is_empty() {
        println!();
        println!("  All links:");
        for url in &report.all_urls {
            println!("    {url}");
        }
    }

    println!();
    if report.unique_urls.is_empty() {
        println!("  No shared file links found.");
    } else {
        println!("  Unique public file links:");
        for url in &report.unique_urls {
            println!("    {url}");
        }
    }
    println!();
}
