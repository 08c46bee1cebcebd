//! Shell command - serve requests read from stdin against one store
//!
//! One-shot commands start from a fresh store every time; the shell keeps a
//! single service alive so creates, updates and deletes build on each other.

use super::request;
use crate::cli::args::{split_words, OutputFormat, ShellCommand, ShellLine};
use crate::config::Config;
use crate::error::{TodoError, TodoResult};
use crate::service::{Failure, ResourceService};
use crate::ui::{self, UiContext};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Execute the shell command
pub async fn execute(config: &Config, format: OutputFormat) -> TodoResult<()> {
    ResourceService::run_scoped(config, move |service| async move {
        run_loop(service, format).await
    })
    .await
}

async fn run_loop(service: Arc<ResourceService>, format: OutputFormat) -> TodoResult<()> {
    let ctx = UiContext::detect();
    let prompt = ctx.is_interactive() && matches!(format, OutputFormat::Table);

    if prompt {
        ui::intro(&ctx, "todocache shell");
        ui::remark(&ctx, "Type 'help' for commands, 'exit' to quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if prompt {
            print!("> ");
            std::io::stdout().flush().ok();
        }

        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|e| TodoError::io("reading stdin", e))?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, leaving shell");
                break;
            }
        };

        let Some(line) = line else {
            debug!("End of input");
            break;
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(reason) => {
                report(&Failure::from(TodoError::User(reason)), format);
                continue;
            }
        };

        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                e.print().ok();
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Exit => break,
            ShellCommand::Stats => request::print_stats(&service.dataset_stats(), format)?,
            ShellCommand::Request(req) => {
                if let Err(e) = request::execute(req, &service, format).await {
                    debug!(error = %e, "Request failed");
                    report(&Failure::from(e), format);
                }
            }
        }
    }

    if prompt {
        ui::outro_success(&ctx, "Bye");
    }
    Ok(())
}

fn report(failure: &Failure, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            ui::step_error_detail(&UiContext::detect(), &failure.status.to_string(), &failure.message)
        }
        OutputFormat::Json => match serde_json::to_string(failure) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", failure),
        },
        OutputFormat::Plain => println!("{}", failure),
    }
}
