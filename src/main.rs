use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use invoice_control::commands;
use invoice_control::models::{Action, IssueKind, Settings};
use invoice_control::services::state::AppState;

#[derive(Parser)]
#[command(name = "invoice-control")]
#[command(about = "Review AI-extracted invoices and trigger workflow actions")]
struct Cli {
    /// NocoDB base URL (overrides NOCODB_URL)
    #[arg(long, global = true)]
    nocodb_url: Option<String>,

    /// n8n webhook base URL (overrides N8N_WEBHOOK_URL)
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    /// Invoices fetched per page (overrides INVOICE_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<u32>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the newest invoices
    List {
        /// Only invoices carrying this issue
        #[arg(long, value_enum)]
        issue: Option<IssueArg>,
    },
    /// Show one invoice with its document, extracted data and issues
    Show { id: Option<i64> },
    /// Send a workflow action for an invoice
    Action {
        #[arg(value_enum)]
        action: ActionArg,
        id: Option<i64>,
    },
    /// Open the invoice PDF in the default browser
    Open { id: Option<i64> },
    /// Processing log entries
    Logs {
        #[arg(long)]
        invoice: Option<i64>,
        #[arg(long, default_value = "25")]
        limit: u32,
    },
    /// Emails that were not classified as invoices
    Emails {
        #[arg(long, default_value = "25")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },
    /// Print the effective settings
    Settings,
    /// Check that the backing store accepts the token
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Validate,
    Review,
    RequestPo,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Validate => Action::Validate,
            ActionArg::Review => Action::Review,
            ActionArg::RequestPo => Action::RequestPo,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum IssueArg {
    MissingPo,
    LowConfidence,
    NeedsReview,
    ValidationError,
}

impl From<IssueArg> for IssueKind {
    fn from(arg: IssueArg) -> Self {
        match arg {
            IssueArg::MissingPo => IssueKind::MissingPo,
            IssueArg::LowConfidence => IssueKind::LowConfidence,
            IssueArg::NeedsReview => IssueKind::NeedsReview,
            IssueArg::ValidationError => IssueKind::ValidationError,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("invoice_control=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("invoice_control=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = Settings::from_env_with(|key| match key {
        "NOCODB_URL" => cli.nocodb_url.clone(),
        "N8N_WEBHOOK_URL" => cli.webhook_url.clone(),
        "INVOICE_PAGE_SIZE" => cli.page_size.map(|size| size.to_string()),
        _ => None,
    })?;
    Ok(settings)
}

async fn run(cli: Cli) -> Result<String> {
    let settings = load_settings(&cli)?;
    let state = AppState::new(settings);

    match cli.command {
        Command::List { issue } => {
            commands::invoices::list_invoices(issue.map(IssueKind::from), &state).await
        }
        Command::Show { id } => commands::dashboard::show_dashboard(id, &state).await,
        Command::Action { action, id } => {
            commands::actions::run_action(action.into(), id, &state).await
        }
        Command::Open { id } => commands::invoices::open_invoice_file(id, &state).await,
        Command::Logs { invoice, limit } => {
            commands::invoices::list_processing_logs(invoice, limit, &state).await
        }
        Command::Emails { limit, offset } => {
            commands::mailbox::list_other_emails(limit, offset, &state).await
        }
        Command::Settings => Ok(commands::settings::get_settings(&state)),
        Command::Check => commands::settings::test_connection(&state).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
