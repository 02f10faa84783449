use anyhow::{Context, Result};
use clap::ArgMatches;
use reqflow_batch::{EngineConfig, TracingNotifier};
use reqflow_cli::commands::{self, ReviewRequest};
use reqflow_cli::selection::Selection;
use reqflow_cli::{cli, logging};
use reqflow_model::{LevelNumber, Requirement, ReviewStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("query", args)) => {
            let (_, items, fields) = source(args)?;
            let filter = Selection::from_matches(args)?.to_filter();
            let selected = commands::select(items, &fields, filter.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&selected)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("review", args)) => {
            let (config, items, fields) = source(args)?;
            let filter = Selection::from_matches(args)?.to_filter();
            let selected = commands::select(items.clone(), &fields, filter.as_ref())?;

            let level = args
                .get_one::<u8>("level")
                .copied()
                .context("--level is required")?;
            let status = args
                .get_one::<String>("status")
                .context("--status is required")?;
            let request = ReviewRequest {
                level: LevelNumber::try_from(level)?,
                status: status.parse::<ReviewStatus>()?,
                opinion: args.get_one::<String>("opinion").cloned(),
                batch_size: args.get_one::<usize>("batch-size").copied(),
                delay_ms: args.get_one::<u64>("delay-ms").copied(),
            };

            let report = commands::run_review(
                items,
                selected,
                &request,
                &config,
                Arc::new(TracingNotifier::new()),
            )
            .await?;

            println!(
                "{} succeeded, {} failed, {} total",
                report.result.success_count(),
                report.result.fail_count(),
                report.result.total()
            );
            for failed in report.result.failed() {
                println!("  {}: {:#}", failed.item.id, failed.error);
            }

            if let Some(out) = path_arg(args, "out") {
                commands::save_requirements(&out, &report.collection)?;
                println!("wrote {}", out.display());
            }

            Ok(if report.result.fail_count() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Some(("status", args)) => {
            let (_, items, _) = source(args)?;
            for line in commands::status_lines(&items) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            cli().print_help()?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Configuration, collection and indexed fields named by the common arguments
fn source(args: &ArgMatches) -> Result<(EngineConfig, Vec<Requirement>, Vec<String>)> {
    let data = path_arg(args, "data").context("--data is required")?;
    let config = commands::load_config(path_arg(args, "config").as_deref())?;
    let view = args
        .get_one::<String>("view")
        .map_or(commands::DEFAULT_VIEW, String::as_str);

    let items = commands::load_requirements(&data)?;
    let fields =
        commands::resolve_indexed_fields(&config, path_arg(args, "settings").as_deref(), view)?;
    tracing::info!(items = items.len(), view, "Loaded collection");
    Ok((config, items, fields))
}

fn path_arg(args: &ArgMatches, name: &str) -> Option<PathBuf> {
    args.get_one::<PathBuf>(name).cloned()
}
