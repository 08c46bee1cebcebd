//! Request commands - todo CRUD and the dataset read path

use crate::cli::args::{OutputFormat, Request};
use crate::error::TodoResult;
use crate::fetcher::{FetchStats, Fetched};
use crate::service::ResourceService;
use crate::store::{Priority, Record};
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;
use serde_json::json;

/// Execute one request against the service and print the result
pub async fn execute(
    request: Request,
    service: &ResourceService,
    format: OutputFormat,
) -> TodoResult<()> {
    match request {
        Request::List(args) => {
            let records = service.list_todos(args.limit);
            print_records(&records, format)
        }
        Request::Get(args) => {
            let record = service.get_todo(args.id)?;
            print_record(&record, format)
        }
        Request::Create(args) => {
            let id = service.create_todo(args.into_new_record()).await?;
            match format {
                OutputFormat::Table => {
                    ui::step_ok(&UiContext::detect(), &format!("Created todo {}", id))
                }
                OutputFormat::Json => println!("{}", json!({ "id": id })),
                OutputFormat::Plain => println!("{}", id),
            }
            Ok(())
        }
        Request::Update(args) => {
            let (id, patch) = args.into_patch();
            let record = service.update_todo(id, patch).await?;
            match format {
                OutputFormat::Table => ui::step_ok_detail(
                    &UiContext::detect(),
                    &format!("Updated todo {}", record.id),
                    &record.name,
                ),
                _ => print_record(&record, format)?,
            }
            Ok(())
        }
        Request::Delete(args) => {
            let record = service.delete_todo(args.id).await?;
            match format {
                OutputFormat::Table => {
                    ui::step_ok(&UiContext::detect(), &format!("Deleted todo {}", record.id))
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Plain => println!("{}", record.id),
            }
            Ok(())
        }
        Request::Dataset(args) => fetch_dataset(service, args.refresh, format).await,
    }
}

async fn fetch_dataset(
    service: &ResourceService,
    refresh: bool,
    format: OutputFormat,
) -> TodoResult<()> {
    let fetch = async {
        if refresh {
            service.refresh_dataset().await
        } else {
            service.fetch_dataset_detailed().await
        }
    };

    match format {
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            let mut spinner = TaskSpinner::new(&ctx);
            spinner.start("Fetching dataset...");

            let fetched = match fetch.await {
                Ok(fetched) => fetched,
                Err(e) => {
                    spinner.stop_error("Dataset unavailable");
                    return Err(e);
                }
            };
            spinner.stop(&format!("Dataset served from {}", fetched.source.name()));
            print_dataset_summary(&ctx, service, &fetched)
        }
        OutputFormat::Json => {
            let fetched = fetch.await?;
            let out = json!({
                "key": service.dataset_key(),
                "source": fetched.source.name(),
                "entries": fetched.dataset.entry_count(),
                "data": fetched.dataset.value(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        OutputFormat::Plain => {
            let fetched = fetch.await?;
            println!("{}", fetched.dataset.to_payload()?);
            Ok(())
        }
    }
}

fn print_dataset_summary(
    ctx: &UiContext,
    service: &ResourceService,
    fetched: &Fetched,
) -> TodoResult<()> {
    let bytes = fetched.dataset.to_payload()?.len();
    let entries = fetched
        .dataset
        .entry_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    ui::key_value(ctx, "key", service.dataset_key());
    ui::key_value(ctx, "source", fetched.source.name());
    ui::key_value(ctx, "backend", service.cache_backend());
    ui::key_value(ctx, "entries", &entries);
    ui::key_value(ctx, "bytes", &bytes.to_string());
    Ok(())
}

/// Print dataset cache counters
pub fn print_stats(stats: &FetchStats, format: OutputFormat) -> TodoResult<()> {
    match format {
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "hits", &stats.hits.to_string());
            ui::key_value(&ctx, "misses", &stats.misses.to_string());
            ui::key_value(&ctx, "origin calls", &stats.origin_calls.to_string());
            ui::key_value(&ctx, "degraded", &stats.degraded.to_string());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(stats)?),
        OutputFormat::Plain => println!(
            "{}\t{}\t{}\t{}",
            stats.hits, stats.misses, stats.origin_calls, stats.degraded
        ),
    }
    Ok(())
}

fn print_records(records: &[Record], format: OutputFormat) -> TodoResult<()> {
    match format {
        OutputFormat::Table => print_table(records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Plain => {
            for record in records {
                print_plain(record);
            }
        }
    }
    Ok(())
}

fn print_record(record: &Record, format: OutputFormat) -> TodoResult<()> {
    match format {
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "id", &record.id.to_string());
            ui::key_value(&ctx, "name", &record.name);
            ui::key_value(&ctx, "description", &record.description);
            ui::key_value(&ctx, "priority", record.priority.name());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Plain => print_plain(record),
    }
    Ok(())
}

fn print_table(records: &[Record]) {
    let ctx = UiContext::detect();

    if records.is_empty() {
        ui::step_info(&ctx, "No todos");
        return;
    }

    ui::intro(&ctx, "Todos");

    println!(
        "{:<6} {:<24} {:<10} {}",
        style("ID").bold(),
        style("NAME").bold(),
        style("PRIORITY").bold(),
        style("DESCRIPTION").bold()
    );
    println!("{}", "-".repeat(72));

    for record in records {
        let priority = match record.priority {
            Priority::High => style(record.priority.name()).red(),
            Priority::Medium => style(record.priority.name()).yellow(),
            Priority::Low => style(record.priority.name()).dim(),
        };
        println!(
            "{:<6} {:<24} {:<10} {}",
            record.id, record.name, priority, record.description
        );
    }

    println!();
    println!("{} todo(s)", records.len());
}

fn print_plain(record: &Record) {
    println!(
        "{}\t{}\t{}\t{}",
        record.id,
        record.name,
        record.priority.name(),
        record.description
    );
}
