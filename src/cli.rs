use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, error::ErrorKind};

use crate::config::{FilterConfig, FolderLayout, PartitionConfig, PipelineConfig, SourceDescriptor};
use crate::constants::cli::{DATA_ROOT_ENV, DEFAULT_DATA_ROOT};
use crate::data::{CollectRecord, CollectedStatus};
use crate::metrics::{evaluate_collect_progression, select_by_status};
use crate::partition::resolve_filtered_urls_file;
use crate::results::{ResultKind, SnapshotReport, aggregate_results};
use crate::store::FileArtifactStore;
use crate::transport::fs::{most_recent_json_file, read_json};
use crate::{aggregate_new_urls, filter_new_urls, generate_urls_to_collect};

#[derive(Debug, Parser)]
#[command(
    name = "crawl_batches",
    disable_help_subcommand = true,
    about = "Aggregate, filter, and partition discovered URLs; fold collected results",
    long_about = "Consolidate per-run URL discovery files into deduplicated, keyword-filtered candidate sets, split them into collection batches, and fold collected product and review files into dated snapshots.",
    after_help = "The data root is resolved in order by --data-root, the CRAWL_BATCHES_DATA_ROOT environment variable, then ./data."
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct CommonArgs {
    #[arg(
        long = "data-root",
        value_name = "DIR",
        global = true,
        help = "Folder holding new_urls/, filtered_urls/, products/, ..."
    )]
    data_root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        conflicts_with = "source_config",
        help = "Source name used to namespace artifacts"
    )]
    source: Option<String>,
    #[arg(
        long = "source-config",
        value_name = "FILE",
        global = true,
        help = "JSON file with a \"source\" key"
    )]
    source_config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge every new-URL file into one aggregated_urls artifact.
    AggregateUrls,
    /// Dedup and keyword-filter new URLs into a filtered_urls artifact.
    FilterUrls {
        #[arg(
            long = "exclude-keyword",
            value_name = "KEYWORD",
            help = "Drop URLs whose product name or url contains this keyword; repeatable"
        )]
        exclude_keywords: Vec<String>,
        #[arg(
            long = "select-keyword",
            value_name = "KEYWORD",
            help = "Keep only URLs whose product name or url contains one of these; repeatable"
        )]
        select_keywords: Vec<String>,
    },
    /// Split a filtered_urls file into urls_to_collect batches.
    GenerateUrlsToCollect {
        #[arg(
            long = "n-parts",
            default_value_t = 1,
            value_parser = parse_positive_usize,
            help = "Number of batches to create"
        )]
        n_parts: usize,
        #[arg(
            long = "filtered-urls-file-name",
            value_name = "FILE_NAME",
            help = "File inside filtered_urls/; defaults to the most recent one"
        )]
        filtered_urls_file_name: Option<String>,
    },
    /// Fold products/ into one aggregated products snapshot.
    AggregateProducts,
    /// Fold reviews/ into one aggregated reviews snapshot.
    AggregateReviews,
    /// Report collected/pending counts for a urls_to_collect batch.
    EvaluateProgress {
        #[arg(
            long = "urls-to-collect-file-name",
            value_name = "FILE_NAME",
            help = "File inside urls_to_collect/; defaults to the most recent one"
        )]
        urls_to_collect_file_name: Option<String>,
        #[arg(
            long = "list-status",
            value_name = "no|yes",
            value_parser = parse_status_arg,
            help = "Also print the URLs with this collected status"
        )]
        list_status: Option<CollectedStatus>,
    },
}

/// Parse `args_iter` (without the program name) and run one pipeline stage.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<Cli, _>(std::iter::once("crawl_batches".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = build_config(&cli.common)?;
    config.validate()?;
    let store = FileArtifactStore::new();

    match cli.command {
        Command::AggregateUrls => {
            let report = aggregate_new_urls(&config, &store)?;
            println!(
                "{} aggregated URLs from {} files saved to {}",
                report.aggregated,
                report.files_read,
                report.artifact.display()
            );
        }
        Command::FilterUrls {
            exclude_keywords,
            select_keywords,
        } => {
            let filter = FilterConfig {
                exclude_keywords,
                select_keywords,
            };
            let report = filter_new_urls(&config, &filter, &store)?;
            println!(
                "{} filtered URLs (from {} loaded) saved to {}",
                report.stats.filtered,
                report.stats.loaded,
                report.artifact.display()
            );
        }
        Command::GenerateUrlsToCollect {
            n_parts,
            filtered_urls_file_name,
        } => {
            let input = resolve_filtered_urls_file(
                &config.folders.filtered_urls,
                filtered_urls_file_name.as_deref(),
            )?;
            let report =
                generate_urls_to_collect(&config, &input, PartitionConfig { n_parts }, &store)?;
            for batch in &report.batches {
                println!(
                    "batch {}: {} URLs saved to {} and {}",
                    batch.index,
                    batch.len,
                    batch.primary.display(),
                    batch.anchor.display()
                );
            }
            let noun = if report.batches.len() == 1 { "file" } else { "files" };
            println!(
                "{} URLs to collect split into {} {noun}",
                report.total,
                report.batches.len()
            );
        }
        Command::AggregateProducts => {
            print_snapshot(aggregate_results(&config, ResultKind::Products)?);
        }
        Command::AggregateReviews => {
            print_snapshot(aggregate_results(&config, ResultKind::Reviews)?);
        }
        Command::EvaluateProgress {
            urls_to_collect_file_name,
            list_status,
        } => {
            let dir = &config.folders.urls_to_collect;
            let path = match urls_to_collect_file_name {
                Some(name) => dir.join(name),
                None => most_recent_json_file(dir)?,
            };
            let progress = evaluate_collect_progression(&path)?;
            println!(
                "{}: {}/{} collected ({:.1}%), {} pending",
                path.display(),
                progress.collected,
                progress.total,
                progress.collected_share * 100.0,
                progress.pending
            );
            if let Some(status) = list_status {
                let records: Vec<CollectRecord> = read_json(&path)?;
                for record in select_by_status(&records, status) {
                    println!("{}", record.url);
                }
            }
        }
    }
    Ok(())
}

fn print_snapshot(report: SnapshotReport) {
    println!(
        "{} aggregated {} from {} files ({} skipped) saved to {}",
        report.records,
        report.kind,
        report.loaded_files,
        report.skipped.len(),
        report.snapshot.display()
    );
}

fn build_config(common: &CommonArgs) -> Result<PipelineConfig, Box<dyn Error>> {
    let source = match (&common.source, &common.source_config) {
        (Some(name), _) => SourceDescriptor::new(name.clone()),
        (None, Some(path)) => SourceDescriptor::from_json_file(path)?,
        (None, None) => return Err("either --source or --source-config is required".into()),
    };
    let root = resolve_data_root(common.data_root.clone());
    Ok(PipelineConfig::new(source, FolderLayout::under(root)))
}

/// Explicit root, then the environment, then `./data`.
fn resolve_data_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(root) = explicit {
        return root;
    }
    match env::var(DATA_ROOT_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_DATA_ROOT),
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --n-parts value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--n-parts must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_status_arg(raw: &str) -> Result<CollectedStatus, String> {
    raw.parse().map_err(|err: crate::PipelineError| err.to_string())
}
