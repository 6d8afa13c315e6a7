use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::domain::{FieldKey, FormId, IntakeFormData};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/intake.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One line per stored intake form.
    List {
        #[arg(long, conflicts_with = "submitted")]
        open: bool,
        #[arg(long)]
        submitted: bool,
    },
    Show {
        form_id: String,
    },
    /// Every record as a JSON array on stdout.
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List { open, submitted } => {
            let forms = storage.list_intake_forms().await?;
            for form in forms
                .iter()
                .filter(|form| !open || !form.is_submitted())
                .filter(|form| !submitted || form.is_submitted())
            {
                println!("{}", summary_line(form));
            }
        }
        Command::Show { form_id } => {
            let Some(form) = storage.get_intake_form(&FormId::new(form_id.clone())).await? else {
                bail!("intake form {form_id} not found");
            };
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        Command::Export => {
            let forms = storage.list_intake_forms().await?;
            println!("{}", serde_json::to_string_pretty(&forms)?);
        }
    }

    Ok(())
}

fn summary_line(form: &IntakeFormData) -> String {
    let id = form.id.as_ref().map(FormId::as_str).unwrap_or("-");
    let status = match form.submitted_at {
        Some(at) => format!("submitted {}", at.to_rfc3339()),
        None => "open".to_string(),
    };
    format!(
        "{id}\t{status}\t{}/{} answered\t{}",
        form.answered_count(),
        FieldKey::ALL.len(),
        form.email.as_deref().unwrap_or("-")
    )
}
