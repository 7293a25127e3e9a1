use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::domain::{Submission, SubmissionId, EVENT_DATE_FORMAT};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/submissions.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stored submission, newest first
    List,
    Show {
        id: i64,
    },
    Count,
    /// Insert a submission directly, bypassing the HTTP service
    Seed {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List => {
            let records: Vec<Submission> = storage
                .list_submissions()
                .await?
                .into_iter()
                .map(Submission::from)
                .collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Show { id } => {
            let Some(record) = storage.load_submission(SubmissionId(id)).await? else {
                bail!("no submission with id={id}");
            };
            println!("{}", serde_json::to_string_pretty(&record.to_submission())?);
        }
        Command::Count => {
            println!("{}", storage.count_submissions().await?);
        }
        Command::Seed { name, age, date } => {
            let event_date = NaiveDate::parse_from_str(&date, EVENT_DATE_FORMAT)
                .with_context(|| format!("invalid date '{date}', expected YYYY-MM-DD"))?;
            let stored = storage.insert_submission(&name, age, event_date).await?;
            println!("created submission_id={}", stored.id.0);
        }
    }

    Ok(())
}
