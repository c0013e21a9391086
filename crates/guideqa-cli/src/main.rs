//! guideqa - command-line client for the diabetes guideline assistant.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use guideqa_cli::{app::App, config::Config, logging, output};
use guideqa_core::{PatchOutcome, load_cases};
use guideqa_types::Thumbs;
use std::path::PathBuf;

/// Ask the guideline assistant and keep a local record of answers and feedback.
#[derive(Parser, Debug)]
#[command(name = "guideqa")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the backend base URL from config
    #[arg(long, value_name = "URL", global = true)]
    api_base: Option<String>,

    /// More log output; repeat for debug (-vv) and trace (-vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Per-target level, e.g. "history=debug". Bare targets are looked up
    /// under "guideqa::".
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_targets: Vec<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a question. Without QUESTION, uses the question queued by `repeat`.
    Ask {
        question: Option<String>,
        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<u32>,
        /// Leave the result pending for a later `show`
        #[arg(long)]
        no_show: bool,
    },
    /// Show the pending result of the last `ask`, once
    Show,
    /// List past questions with their latest feedback
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Rate the last shown answer, or an answer from history
    Feedback {
        /// up or down
        thumbs: Thumbs,
        /// History id or unique prefix; defaults to the last shown answer
        id: Option<String>,
        #[arg(short = 'm', long)]
        comment: Option<String>,
    },
    /// Queue a past question for the next `ask`
    Repeat {
        /// History id or unique prefix
        id: String,
    },
    /// Delete one history item
    Remove {
        /// History id or unique prefix
        id: String,
    },
    /// Delete all history
    Clear,
    /// Index a guideline PDF on the backend
    Ingest { pdf_path: String },
    /// Show backend index status
    Status,
    /// Run labelled questions from a JSON Lines file and score the answers
    Eval {
        cases: PathBuf,
        #[arg(short, long, default_value = "eval_outputs.jsonl")]
        out: PathBuf,
    },
    /// Manage pending session values
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Drop any pending result and queued question
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        -1
    } else {
        cli.verbose.min(3) as i8
    };
    logging::init(&logging::LogSettings {
        verbosity,
        targets: cli.log_targets,
        json: cli.log_json,
    });

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    tracing::debug!(target: "guideqa::startup", "Backend: {}", config.api_base);

    let app = App::open(config)?;
    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    let flow = &app.flow;

    match command {
        Command::Ask {
            question,
            top_k,
            no_show,
        } => {
            let typed = question.is_some();
            let Some(question) = flow.next_question(question) else {
                bail!("No question given and none queued by `repeat`");
            };
            if !typed {
                println!("Repeating: {}", question);
            }

            flow.submit(&question, top_k).await;
            if !no_show {
                show_pending(app);
            }
        }
        Command::Show => show_pending(app),
        Command::History { limit } => {
            let mut items = flow.history_view();
            if let Some(n) = limit {
                items.truncate(n);
            }
            print!("{}", output::render_history(&items));
        }
        Command::Feedback {
            thumbs,
            id,
            comment,
        } => {
            let (entry, patched) = match id {
                Some(id) => flow.rate(app.resolve_id(&id)?, thumbs, comment)?,
                None => match flow.rate_last_answer(thumbs, comment) {
                    Some(rated) => rated,
                    None => bail!("No answer shown in this session; pass a history id"),
                },
            };
            match patched {
                PatchOutcome::ById(id) => println!(
                    "Recorded feedback ({}) for {}",
                    entry.thumbs,
                    output::short_id(id)
                ),
                PatchOutcome::ByQuestion(id) | PatchOutcome::MostRecent(id) => println!(
                    "Recorded feedback ({}); its answer is gone, attached to {}",
                    entry.thumbs,
                    output::short_id(id)
                ),
                PatchOutcome::NotFound => println!(
                    "Recorded feedback ({}); no history item to attach it to",
                    entry.thumbs
                ),
            }
        }
        Command::Repeat { id } => {
            let id = app.resolve_id(&id)?;
            match flow.repeat(id) {
                Some(question) => {
                    println!("Queued: {}\nRun `guideqa ask` to submit it.", question)
                }
                None => bail!("No history item {}", id),
            }
        }
        Command::Remove { id } => {
            let id = app.resolve_id(&id)?;
            if flow.remove(id) {
                println!("Removed {}", output::short_id(id));
            } else {
                println!("Nothing to remove");
            }
        }
        Command::Clear => {
            flow.clear();
            println!("History cleared");
        }
        Command::Ingest { pdf_path } => {
            let response = flow.ingest(&pdf_path).await?;
            println!(
                "Indexed {}: {} pages, {} chunks",
                pdf_path, response.pages, response.chunks
            );
        }
        Command::Status => {
            let status = flow.index_status().await?;
            print!("{}", output::render_status(&status));
        }
        Command::Eval { cases, out } => {
            let cases_list = load_cases(&cases)
                .with_context(|| format!("Failed to load cases from {}", cases.display()))?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            let mut writer = std::io::BufWriter::new(file);

            tracing::info!(
                target: "guideqa::eval",
                "Loaded {} cases from {}",
                cases_list.len(),
                cases.display()
            );
            let summary = app.eval_runner().run(&cases_list, &mut writer).await?;

            println!("Total cases: {}", summary.total);
            println!("OK responses: {}", summary.ok);
            println!("Avg category jaccard: {:.3}", summary.avg_category_jaccard);
            println!("Evidence non-empty rate: {:.3}", summary.evidence_nonempty_rate);
            println!("Outputs: {}", out.display());
        }
        Command::Session {
            action: SessionAction::Reset,
        } => {
            flow.handoff().reset();
            println!("Session cleared");
        }
    }

    Ok(())
}

fn show_pending(app: &App) {
    match app.flow.take_result() {
        Some(outcome) => print!("{}", output::render_outcome(&outcome)),
        None => println!("No pending result."),
    }
}
