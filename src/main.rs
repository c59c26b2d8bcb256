//! stratum-catalog: catalog every audio file in a folder
//!
//! Usage:
//!   stratum-catalog [--ext mp3 --ext wav] [--jobs N] [--no-tags] <folder>

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use stratum_catalog::features::tempo::AubioTempoEstimator;
use stratum_catalog::{CatalogConfig, Cataloger};

#[derive(Parser)]
#[command(
    name = "stratum-catalog",
    version,
    about = "Write tempo, key and spectral manifests for a folder of audio files"
)]
struct Cli {
    /// Folder to catalog (top level only)
    folder: PathBuf,

    /// Recognized audio extension, repeatable (default: mp3)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Parallel workers (1 = sequential)
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Do not write tempo/comment tags back into the audio files
    #[arg(long)]
    no_tags: bool,

    /// Analysis sample rate in Hz; 0 keeps each file's native rate
    #[arg(long, default_value_t = 22050)]
    sample_rate: u32,

    /// Description stored in every record and tag comment
    #[arg(long, default_value = "N/A")]
    description: String,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// aubio executable
    #[arg(long, default_value = "aubio")]
    aubio: String,
}

impl Cli {
    fn into_config(self) -> (PathBuf, CatalogConfig) {
        let mut config = CatalogConfig::default()
            .with_jobs(self.jobs)
            .with_tag_writing(!self.no_tags);
        if !self.extensions.is_empty() {
            config = config.with_extensions(&self.extensions);
        }
        config.sample_rate = (self.sample_rate > 0).then_some(self.sample_rate);
        config.description = self.description;
        config.ffmpeg_path = self.ffmpeg;
        config.aubio_path = self.aubio;
        (self.folder, config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (folder, config) = Cli::parse().into_config();

    if !AubioTempoEstimator::from_config(&config).is_available() {
        log::warn!(
            "{} or {} could not be launched; tempo estimation will fail for every file",
            config.ffmpeg_path,
            config.aubio_path
        );
    }

    let cataloger = Cataloger::from_config(config);
    match cataloger.run(&folder) {
        Ok(report) => {
            println!(
                "Cataloged {}/{} files in {:.1}s ({} tagged)",
                report.cataloged.len(),
                report.attempted(),
                report.elapsed_ms / 1000.0,
                report.tagged
            );
            for skipped in &report.skipped {
                let label = if skipped.storage_failure {
                    "not stored"
                } else {
                    "skipped"
                };
                println!("  {} {}: {}", label, skipped.filename, skipped.reason);
            }
            println!("Combined manifest: {}", report.combined_manifest.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Catalog run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
