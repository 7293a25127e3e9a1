use std::{
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    escape::sanitize_terminal,
    form::SUCCESS_TEXT,
    load_client_settings,
    view::{EMPTY_LIST_TEXT, LIST_ERROR_TEXT},
    FormFields, ListContent, SubmissionsPage, SubmitOutcome, ViewState,
};
use shared::domain::SubmissionId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Submit event entries and follow the submissions list")]
struct Cli {
    /// Overrides the configured API base url, e.g. http://localhost:5000/api
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one entry
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        date: String,
    },
    /// Print the submissions list once
    List {
        #[arg(long)]
        json: bool,
    },
    Show {
        id: i64,
    },
    Health,
    /// Poll the list and redraw on every change until interrupted
    Watch {
        /// Also keep an HTML rendering of the page at this path
        #[arg(long)]
        html_out: Option<PathBuf>,
    },
    /// Fill in and submit the form from stdin while the list is polled
    Interactive {
        #[arg(long)]
        html_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_client_settings();
    if let Some(api_base_url) = cli.api_base_url {
        settings = settings.with_api_base_url(api_base_url);
    }
    let page = SubmissionsPage::connect(settings)?;

    match cli.command {
        Command::Submit { name, age, date } => {
            let outcome = page.submit_form(FormFields::new(name, age, date)).await;
            report_submit(&page, outcome)?;
        }
        Command::List { json: true } => {
            let records = page.api.list_submissions().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::List { json: false } => {
            let loaded = page.poller.refresh().await;
            print!("{}", list_text(&page.view.snapshot().list));
            loaded?;
        }
        Command::Show { id } => {
            let record = page.api.get_submission(SubmissionId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Health => {
            let health = page.api.health().await?;
            println!("{}", serde_json::to_string(&health)?);
        }
        Command::Watch { html_out } => watch(&page, html_out).await?,
        Command::Interactive { html_out } => interactive(&page, html_out).await?,
    }

    Ok(())
}

fn report_submit(page: &SubmissionsPage, outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Accepted(receipt) => {
            println!("{SUCCESS_TEXT}");
            if let Some(reply) = receipt.message() {
                info!(reply, "service response");
            }
            print!("{}", list_text(&page.view.snapshot().list));
            Ok(())
        }
        SubmitOutcome::Busy => bail!("a submission is already in flight"),
        SubmitOutcome::Invalid(_)
        | SubmitOutcome::Rejected { .. }
        | SubmitOutcome::NetworkFailure(_) => {
            let text = page
                .view
                .snapshot()
                .notice
                .map(|notice| notice.text)
                .unwrap_or_default();
            bail!("{}", sanitize_terminal(&text))
        }
    }
}

/// The list section only, one tab-separated record per line.
fn list_text(list: &ListContent) -> String {
    match list {
        ListContent::Loading => String::new(),
        ListContent::Empty => format!("{EMPTY_LIST_TEXT}\n"),
        ListContent::Failed => format!("{LIST_ERROR_TEXT}\n"),
        ListContent::Records(records) => records
            .iter()
            .map(|record| {
                format!(
                    "{}\t{}\t{}\t{}\n",
                    sanitize_terminal(&record.user_name),
                    record.user_age,
                    sanitize_terminal(&record.event_date),
                    sanitize_terminal(&record.submitted_at),
                )
            })
            .collect(),
    }
}

async fn watch(page: &SubmissionsPage, html_out: Option<PathBuf>) -> Result<()> {
    watch_until(page, html_out.as_deref(), tokio::signal::ctrl_c()).await
}

/// Redraws on every view change until `shutdown` resolves. The same
/// `shutdown` future is polled across redraws, so a signal that lands while
/// the page is being written still ends the loop.
async fn watch_until<T>(
    page: &SubmissionsPage,
    html_out: Option<&Path>,
    shutdown: impl Future<Output = T>,
) -> Result<()> {
    let _poller = page.start();
    let refresh_secs = page.settings().poll_interval.as_secs().max(1);
    let mut changes = page.view.subscribe();
    tokio::pin!(shutdown);
    loop {
        let view = page.view.snapshot();
        print!("\x1b[2J\x1b[H{}", view.render_text());
        if let Some(path) = html_out {
            write_html(path, &page.view, refresh_secs).await;
        }
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }
    Ok(())
}

const INTERACTIVE_HELP: &str = "\
commands:
  name <text>    set the name field
  age <text>     set the age field
  date <text>    set the event date field (YYYY-MM-DD)
  submit         submit the form
  view           print the page
  quit";

async fn interactive(page: &SubmissionsPage, html_out: Option<PathBuf>) -> Result<()> {
    let _poller = page.start();
    let mirror = html_out.map(|path| {
        let view = page.view.clone();
        let refresh_secs = page.settings().poll_interval.as_secs().max(1);
        tokio::spawn(async move {
            let mut changes = view.subscribe();
            loop {
                write_html(&path, &view, refresh_secs).await;
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    });

    println!("{INTERACTIVE_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupted => None,
        };
        let Some(line) = line else {
            break;
        };
        let (command, rest) = line
            .trim_start()
            .split_once(' ')
            .unwrap_or((line.trim(), ""));
        let mut form = page.view.form();
        match command {
            "name" => form.user_name = rest.to_string(),
            "age" => form.user_age = rest.to_string(),
            "date" => form.event_date = rest.to_string(),
            "submit" => {
                page.form.submit().await;
                print!("{}", page.view.snapshot().render_text());
                continue;
            }
            "view" => {
                print!("{}", page.view.snapshot().render_text());
                continue;
            }
            "quit" | "exit" => break,
            "" => continue,
            other => {
                println!("unknown command '{}'\n{INTERACTIVE_HELP}", sanitize_terminal(other));
                continue;
            }
        }
        page.view.set_form(form);
    }

    if let Some(mirror) = mirror {
        mirror.abort();
    }
    Ok(())
}

async fn write_html(path: &Path, view: &ViewState, refresh_secs: u64) {
    let document = view.snapshot().render_document(refresh_secs);
    if let Err(err) = tokio::fs::write(path, document).await {
        warn!(path = %path.display(), error = %err, "failed to write html page");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use client_core::ClientSettings;
    use shared::domain::Submission;
    use tokio::sync::oneshot;

    fn record(name: &str) -> Submission {
        Submission {
            id: None,
            user_name: name.to_string(),
            user_age: 40,
            event_date: "2024-05-01".to_string(),
            submitted_at: "2024-05-02 10:11:12".to_string(),
        }
    }

    #[test]
    fn failed_load_prints_the_error_placeholder() {
        assert_eq!(list_text(&ListContent::Failed), "Error loading submissions\n");
        assert_eq!(
            list_text(&ListContent::Empty),
            "No submissions yet. Be the first to submit!\n"
        );
    }

    #[test]
    fn records_print_one_sanitized_line_each() {
        let text = list_text(&ListContent::Records(vec![
            record("Ada"),
            record("Eve\u{1b}[2J"),
        ]));
        assert_eq!(
            text,
            "Ada\t40\t2024-05-01\t2024-05-02 10:11:12\n\
             Eve\u{FFFD}[2J\t40\t2024-05-01\t2024-05-02 10:11:12\n"
        );
    }

    #[tokio::test]
    async fn watch_ends_on_a_shutdown_that_fired_before_it_waited() {
        let page = SubmissionsPage::connect(
            ClientSettings::default().with_api_base_url("http://127.0.0.1:9/api"),
        )
        .expect("page");
        let (stop, stopped) = oneshot::channel::<()>();
        stop.send(()).expect("send");

        tokio::time::timeout(Duration::from_secs(5), watch_until(&page, None, stopped))
            .await
            .expect("watch returned")
            .expect("watch ok");
    }
}
