//! Job Board terminal client
//!
//! A prompt-driven front end over the session and navigation core.
//!
//! # Usage
//!
//! ```bash
//! # Against a running backend (JOB_BOARD_API_URL, or the flag)
//! job_board --api-url http://localhost:8000/
//!
//! # Fully offline, against a seeded in-process backend
//! job_board --offline
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use job_board_client::api::memory::InMemoryJobBoardApi;
use job_board_client::session::MemoryTokenStorage;
use job_board_client::{
    ClientConfig, FormDraft, FormField, JobId, JobPosting, ScreenState, ViewController, ViewEvent,
};

#[derive(Parser)]
#[command(name = "job_board")]
#[command(version = "0.1.0")]
#[command(about = "Browse, search, post and apply to jobs from the terminal")]
#[command(long_about = None)]
struct Cli {
    /// Backend base URL (overrides JOB_BOARD_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// File holding the session token (overrides JOB_BOARD_TOKEN_FILE)
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Use a seeded in-process backend and keep the session in memory
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Jobs,
    Search(String),
    Post,
    Apply(JobId),
    Login,
    Register,
    Logout,
    Set(FormField, String),
    Submit,
    Show,
    Help,
    Quit,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("job_board_client=info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let view = if cli.offline {
        println!("{}", "Offline mode: demo backend, user 'demo' / 'demo'".yellow());
        offline_controller()?
    } else {
        let config = ClientConfig::from_lookup(|key| match key {
            "JOB_BOARD_API_URL" => cli.api_url.clone().or_else(|| std::env::var(key).ok()),
            "JOB_BOARD_TOKEN_FILE" => cli
                .token_file
                .as_ref()
                .map(|p| p.display().to_string())
                .or_else(|| std::env::var(key).ok()),
            _ => std::env::var(key).ok(),
        })?;
        println!("Backend: {}", config.api_base_url.as_str().cyan());
        ViewController::from_config(&config)?
    };

    // A failed first load is shown on screen, not fatal
    let _ = view.mount().await;
    render(&view);

    let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
    loop {
        let prompt = format!("{}> ", view.screen());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{} {}", "?".yellow().bold(), msg);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        execute(&view, command).await;
        render(&view);
    }

    Ok(())
}

fn offline_controller() -> Result<ViewController> {
    let now = Utc::now();
    let seed = [
        ("Rust Engineer", "Ferrous Systems", "Berlin", "Async services in Rust."),
        ("Frontend Developer", "Acme", "Remote", "Build the job board UI."),
        ("Platform Engineer", "Initech", "Austin", "Keep the lights on."),
    ];
    let jobs = seed
        .iter()
        .enumerate()
        .map(|(i, (title, company, location, description))| JobPosting {
            id: JobId(i as i64 + 1),
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            description: description.to_string(),
            posted_at: now - Duration::days(i as i64),
            posted_by: None,
        })
        .collect();

    let api = Arc::new(InMemoryJobBoardApi::new().with_jobs(jobs));
    api.add_user("demo", "demo")
        .context("Failed to seed demo user")?;
    Ok(ViewController::connect(api, Arc::new(MemoryTokenStorage::new())))
}

// =============================================================================
// COMMANDS
// =============================================================================

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match head {
        "jobs" => Ok(Command::Jobs),
        "search" => Ok(Command::Search(rest.to_string())),
        "post" => Ok(Command::Post),
        "apply" => rest
            .parse::<JobId>()
            .map(Command::Apply)
            .map_err(|_| format!("usage: apply <job id> (got '{}')", rest)),
        "login" => Ok(Command::Login),
        "register" => Ok(Command::Register),
        "logout" => Ok(Command::Logout),
        "set" => {
            let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
            let field = field.parse::<FormField>().map_err(|e| e.to_string())?;
            Ok(Command::Set(field, value.trim().to_string()))
        }
        "submit" => Ok(Command::Submit),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

/// Failures the view records are rendered from `last_error`; only field
/// edits and misplaced submits are reported here.
async fn execute(view: &ViewController, command: Command) {
    match command {
        Command::Jobs => navigate(view, ViewEvent::ClickViewJobs),
        Command::Post => navigate(view, ViewEvent::ClickPost),
        Command::Apply(id) => navigate(view, ViewEvent::ClickApply(id)),
        Command::Login => navigate(view, ViewEvent::ClickLogin),
        Command::Register => navigate(view, ViewEvent::ClickRegister),
        Command::Logout => navigate(view, ViewEvent::ClickLogout),
        Command::Search(query) => {
            let _ = view.search(&query).await;
        }
        Command::Set(field, value) => {
            if let Err(e) = view.update_field(field, &value) {
                eprintln!("{} {}", "!".red().bold(), e);
            }
        }
        Command::Submit => submit(view).await,
        Command::Help => print_help(),
        Command::Show | Command::Quit => {}
    }
}

fn navigate(view: &ViewController, event: ViewEvent) {
    let _ = view.request_transition(event);
}

async fn submit(view: &ViewController) {
    let _ = match view.screen() {
        ScreenState::PostJob => view.submit_post_job().await.map(drop),
        ScreenState::Apply(_) => view.submit_application().await,
        ScreenState::Login => view.submit_login().await.map(drop),
        ScreenState::Register => view.submit_register().await.map(drop),
        ScreenState::Jobs => {
            eprintln!("{} nothing to submit on the jobs screen", "!".red().bold());
            Ok(())
        }
    };
}

// =============================================================================
// RENDERING
// =============================================================================

fn render(view: &ViewController) {
    println!();
    let session = if view.session().is_authenticated() {
        "logged in".green()
    } else {
        "anonymous".dimmed()
    };
    println!("{} [{}]", view.screen().to_string().to_uppercase().bold(), session);

    if let Some(notice) = view.notice() {
        println!("{}", notice.green());
    }
    if let Some(err) = view.last_error() {
        println!("{}", err.to_string().red());
    }

    match view.form() {
        FormDraft::None => render_listing(view),
        form => render_form(&form),
    }

    println!("{}", menu(view).dimmed());
}

fn render_listing(view: &ViewController) {
    let search = view.search_input();
    if !search.is_empty() {
        println!("Search: {}", search.cyan());
    }

    let postings = view.catalog().postings();
    if postings.is_empty() {
        println!("  {}", "No jobs found.".dimmed());
    }
    for job in postings {
        println!(
            "  {} {} at {} ({})  {}",
            format!("#{}", job.id).yellow(),
            job.title.bold(),
            job.company,
            job.location,
            job.posted_at.format("%Y-%m-%d").to_string().dimmed()
        );
        println!("      {}", job.description);
    }
}

fn render_form(form: &FormDraft) {
    for field in form.fields() {
        let value = form.get(*field).unwrap_or_default();
        let shown = if field.is_secret() && !value.is_empty() {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        println!("  {:<16} {}", field.name().cyan(), shown);
    }
}

/// Commands the current state allows
fn menu(view: &ViewController) -> String {
    let mut items: Vec<&str> = Vec::new();
    if view.screen() == ScreenState::Jobs {
        items.push("search <q>");
    } else {
        items.extend(["jobs", "set <field> <value>", "submit"]);
    }
    if view.can_post() {
        items.push("post");
    }
    if view.can_apply() {
        items.push("apply <id>");
    }
    if view.can_login() {
        items.extend(["login", "register"]);
    }
    if view.can_logout() {
        items.push("logout");
    }
    items.extend(["show", "help", "quit"]);
    if view.is_busy() {
        items.push("(busy)");
    }
    items.join(" | ")
}

fn print_help() {
    println!("{}", "Commands".bold());
    println!("  jobs                 back to the listing");
    println!("  search <q>           server-side search by title or company");
    println!("  post                 open the 'post a job' form (logged in)");
    println!("  apply <id>           open the application form for a job (logged in)");
    println!("  login / register     open the login or registration form");
    println!("  logout               end the session");
    println!("  set <field> <value>  fill a field of the open form");
    println!("  submit               send the open form");
    println!("  show                 redraw the screen");
    println!("  quit                 leave");
}
