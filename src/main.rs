use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use xyz_dl::{
    Config, DownloadError, DownloadMode, DownloadReport, DownloadRequest, NoopReporter,
    OverwritePolicy, ProgressEvent, ProgressReporter, ReqwestClient, SharedProgressReporter,
    download,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static NOTES: Emoji<'_, '_> = Emoji("📝 ", "[n] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static RETRY: Emoji<'_, '_> = Emoji("🔄 ", "[r] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");

/// Download xiaoyuzhoufm.com podcast episodes with their show notes
#[derive(Parser, Debug)]
#[command(name = "xyz-dl")]
#[command(about = "Download xiaoyuzhoufm.com podcast episodes with their show notes")]
#[command(version)]
struct Args {
    /// Episode page URL
    url: String,

    /// Output directory for downloaded files
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// What to download: audio, notes, or both
    #[arg(short, long)]
    mode: Option<DownloadMode>,

    /// Overwrite existing files without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum fetch attempts per request
    #[arg(long)]
    retries: Option<u32>,

    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            main_bar,
        }
    }

    fn get_or_create_bar(&self, file_name: &str) -> ProgressBar {
        let mut bars = self.bars.lock().unwrap();

        if let Some(bar) = bars.get(file_name) {
            return bar.clone();
        }

        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap()
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(style);
        bars.insert(file_name.to_string(), bar.clone());
        bar
    }

    fn finish_bar(&self, file_name: &str) {
        let mut bars = self.bars.lock().unwrap();
        if let Some(bar) = bars.remove(file_name) {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingPage { url } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Fetching episode page: {}", url.cyan()));
            }

            ProgressEvent::RetryingFetch {
                url,
                attempt,
                max_attempts,
            } => {
                self.main_bar.set_message(format!(
                    "{RETRY}Retrying ({}/{}): {}",
                    attempt.to_string().yellow(),
                    max_attempts,
                    url.dimmed()
                ));
            }

            ProgressEvent::MetadataExtracted { title, host } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} • {}",
                    host.bold().green(),
                    title.cyan()
                ));
            }

            ProgressEvent::DownloadStarting {
                file_name,
                content_length,
            } => {
                let bar = self.get_or_create_bar(&file_name);
                bar.set_length(content_length.unwrap_or(0));
                bar.set_position(0);
                bar.set_message(truncate_title(&file_name, 40));
            }

            ProgressEvent::DownloadProgress {
                file_name,
                bytes_downloaded,
                total_bytes,
            } => {
                let bar = self.get_or_create_bar(&file_name);
                if let Some(total) = total_bytes {
                    bar.set_length(total);
                }
                bar.set_position(bytes_downloaded);
            }

            ProgressEvent::Finalizing { file_name } => {
                let bar = self.get_or_create_bar(&file_name);
                bar.set_message(format!("Finalizing {}", truncate_title(&file_name, 40)));
            }

            ProgressEvent::DownloadCompleted {
                file_name,
                bytes_downloaded,
            } => {
                let bar = self.get_or_create_bar(&file_name);
                bar.set_position(bytes_downloaded);
                self.finish_bar(&file_name);
                let _ = self.multi.println(format!(
                    "{SUCCESS}{}",
                    truncate_title(&file_name, 60).green()
                ));
            }

            ProgressEvent::DownloadFailed { file_name, error } => {
                let bar = self.get_or_create_bar(&file_name);
                bar.abandon_with_message(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&file_name, 30).red(),
                    error.red()
                ));
                self.finish_bar(&file_name);
            }

            ProgressEvent::NotesWritten { path } => {
                let _ = self.multi.println(format!(
                    "{NOTES}{}",
                    path.display().to_string().green()
                ));
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Asks on stdin before replacing an existing file, unless `--yes` was given
struct PromptOverwrite {
    assume_yes: bool,
}

impl OverwritePolicy for PromptOverwrite {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        if self.assume_yes {
            return true;
        }

        print!(
            "{} {} already exists. Overwrite? [y/N] ",
            FAILURE,
            path.display().to_string().yellow()
        );
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = &args.dir {
        config.download_dir = dir.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn exit_code(error: &DownloadError) -> i32 {
    match error {
        DownloadError::Url(_) => 2,
        DownloadError::Extract(_) => 3,
        DownloadError::PageFetch(_) | DownloadError::AudioFetch(_) => 4,
        DownloadError::FileExists { .. } => 5,
        DownloadError::Cancelled => 130,
        _ => 6,
    }
}

/// Worst exit code among the per-artifact failures, 0 when all succeeded
fn report_exit_code(report: &DownloadReport) -> i32 {
    report
        .audio
        .iter()
        .chain(report.notes.iter())
        .filter_map(|outcome| outcome.error())
        .map(exit_code)
        .max()
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "xyz-dl".bold().magenta(),
            "- Episode Downloader".dimmed()
        );
    }

    let config = build_config(&args)?;

    let client = ReqwestClient::new(&config.user_agent, config.timeout())
        .context("Failed to build HTTP client")?;

    let request = DownloadRequest {
        url: args.url.clone(),
        directory: config.download_dir.clone(),
        mode: config.mode,
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let overwrite = PromptOverwrite {
        assume_yes: args.yes,
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let report = match download(&client, &request, &config, &overwrite, &reporter, &cancel).await {
        Ok(report) => report,
        Err(error) => {
            eprintln!("{FAILURE}{}", error.to_string().red());
            std::process::exit(exit_code(&error));
        }
    };

    if !args.quiet {
        for outcome in report.audio.iter().chain(report.notes.iter()) {
            if let Some(error) = outcome.error() {
                eprintln!("{FAILURE}{}", error.to_string().red());
            }
        }
        println!(
            "\n{FOLDER}Output: {}\n",
            config.download_dir.display().to_string().cyan()
        );
    }

    let code = report_exit_code(&report);
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
