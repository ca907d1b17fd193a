use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use notetag::provider::{
    OllamaProviderBuilder, OpenAiProviderBuilder, ProviderKind, TagProvider,
};
use notetag::service::{FsStore, ManualTagSource, TaggingError, TaggingService};
use notetag::settings::{MergeMode, Settings};
use notetag::tags::TagGenerator;
use notetag::PlainTextExtractor;

/// notetag - AI-assisted tagging for a Markdown note vault
#[derive(Parser)]
#[command(name = "notetag")]
#[command(about = "Attach AI-generated tags to notes in a knowledge-base vault")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Generate tags for one or more notes and merge them into frontmatter
    Tag(TagCommand),
    /// Inspect or initialize the persisted settings file
    Settings(SettingsCommand),
}

/// Tag one or more notes
#[derive(Parser)]
struct TagCommand {
    /// Note files to tag
    #[arg(value_name = "FILE", required = true)]
    paths: Vec<PathBuf>,

    /// Replace existing tags instead of appending
    #[arg(long, conflicts_with = "append")]
    replace: bool,

    /// Append to existing tags (overrides a replace setting)
    #[arg(long)]
    append: bool,

    /// Skip the AI backend and type tags by hand
    #[arg(long)]
    manual: bool,

    /// AI backend to use
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Model name passed to the backend
    #[arg(long)]
    model: Option<String>,

    /// Maximum number of tags to write
    #[arg(long)]
    max_tags: Option<usize>,

    /// Print the merged document instead of writing it
    #[arg(long)]
    dry_run: bool,
}

/// Inspect or initialize settings
#[derive(Parser)]
struct SettingsCommand {
    #[command(subcommand)]
    action: SettingsAction,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Write a settings file with defaults if one does not exist
    Init,
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Tag(cmd) => handle_tag(cmd),
        Commands::Settings(cmd) => handle_settings(cmd),
    };

    if let Err(e) = result {
        if is_cancellation(&e) {
            eprintln!("Cancelled.");
            return;
        }
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notetag=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include missing configuration and busy/unsupported files.
/// Internal errors include unexpected I/O and backend failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<TaggingError>() {
        Some(TaggingError::Busy { .. }) => true,
        Some(TaggingError::Extraction(_)) => true,
        Some(TaggingError::Provider(p)) => {
            matches!(p, notetag::ProviderError::Configuration(_))
        }
        _ => error.to_string().contains("not configured"),
    }
}

fn is_cancellation(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<TaggingError>(),
        Some(TaggingError::Cancelled)
    )
}

/// Handles the tag command for every requested path.
fn handle_tag(cmd: &TagCommand) -> Result<()> {
    let settings_path = Settings::default_path()?;
    let mut settings = Settings::load_or_default(&settings_path)?;

    if cmd.replace {
        settings.merge_mode = MergeMode::Replace;
    } else if cmd.append {
        settings.merge_mode = MergeMode::Append;
    }
    if let Some(max_tags) = cmd.max_tags {
        settings.max_tags = max_tags;
    }

    let provider = build_provider(cmd)?;
    let service = TaggingService::new(
        Box::new(FsStore),
        Box::new(PlainTextExtractor),
        TagGenerator::new(provider),
    );

    for path in &cmd.paths {
        let report = if cmd.manual {
            service.tag_document_manual(path, &StdinTagSource, &settings)?
        } else if cmd.dry_run {
            service.preview_document(path, &settings)?
        } else {
            service.tag_document(path, &settings)?
        };

        if cmd.dry_run {
            print!("{}", report.document);
        } else if report.changed {
            println!("{}: tags updated ({})", path.display(), report.tags.join(", "));
        } else {
            println!("{}: no changes", path.display());
        }
    }

    Ok(())
}

/// Builds the selected AI backend.
///
/// The backend is chosen once here; nothing downstream knows which provider
/// produced the tags.
fn build_provider(cmd: &TagCommand) -> Result<Arc<dyn TagProvider>> {
    let kind = cmd
        .provider
        .or_else(provider_from_env)
        .unwrap_or_default();

    let provider: Arc<dyn TagProvider> = match kind {
        ProviderKind::Ollama => {
            let mut builder = OllamaProviderBuilder::new();
            if let Some(model) = &cmd.model {
                builder = builder.model(model);
            }
            Arc::new(builder.build().context("Failed to configure Ollama backend")?)
        }
        ProviderKind::Openai => {
            let mut builder = OpenAiProviderBuilder::new();
            if let Some(model) = &cmd.model {
                builder = builder.model(model);
            }
            Arc::new(builder.build().context("Failed to configure OpenAI backend")?)
        }
    };
    Ok(provider)
}

fn provider_from_env() -> Option<ProviderKind> {
    match std::env::var("NOTETAG_PROVIDER").ok()?.to_lowercase().as_str() {
        "ollama" => Some(ProviderKind::Ollama),
        "openai" => Some(ProviderKind::Openai),
        _ => None,
    }
}

fn handle_settings(cmd: &SettingsCommand) -> Result<()> {
    let path = Settings::default_path()?;
    match cmd.action {
        SettingsAction::Show => {
            let settings = Settings::load_or_default(&path)?;
            let json =
                serde_json::to_string_pretty(&settings).context("Failed to render settings")?;
            println!("{json}");
        }
        SettingsAction::Init => {
            if path.exists() {
                println!("Settings file already exists: {}", path.display());
            } else {
                Settings::default().save(&path)?;
                println!("Wrote default settings to {}", path.display());
            }
        }
    }
    Ok(())
}

/// Manual tag entry on stdin: one comma-separated line.
///
/// EOF or a blank line counts as dismissal.
struct StdinTagSource;

impl ManualTagSource for StdinTagSource {
    fn prompt_tags(&self) -> Result<Vec<String>, TaggingError> {
        print!("Tags (comma-separated): ");
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 || line.trim().is_empty() {
            return Err(TaggingError::Cancelled);
        }

        Ok(parse_tags(&line))
    }
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty
/// strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_with_normal_input() {
        let result = parse_tags("rust,learning");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_with_whitespace() {
        let result = parse_tags(" rust , learning ");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_with_empty_elements() {
        let result = parse_tags("rust,,learning,");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_only_whitespace() {
        let result = parse_tags("  ,  ,  ");
        assert!(result.is_empty());
    }

    #[test]
    fn cancellation_is_not_a_user_error() {
        let error = anyhow::Error::new(TaggingError::Cancelled);
        assert!(is_cancellation(&error));
        assert!(!is_user_error(&error));
    }

    #[test]
    fn busy_is_a_user_error() {
        let error = anyhow::Error::new(TaggingError::Busy {
            path: PathBuf::from("/vault/note.md"),
        });
        assert!(is_user_error(&error));
        assert!(!is_cancellation(&error));
    }
}
