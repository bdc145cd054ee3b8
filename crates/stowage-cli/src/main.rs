use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Stowage - lowers contract state access into explicit storage operations")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pass pipeline over a tree document.
    Lower {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pass keys to run, in order (defaults to every registered pass).
        #[arg(long, value_delimiter = ',')]
        passes: Option<Vec<String>>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Dump the tree to stderr after every pass.
        #[arg(long)]
        print_tree: bool,

        #[arg(long, value_enum, default_value = "json")]
        emit: OutputFormat,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Render a tree document as pseudo-source.
    Show {
        input: PathBuf,

        #[arg(long)]
        ids: bool,

        #[arg(long)]
        types: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Lower { verbose: true, .. });
    init_logging(verbose);

    match cli.command {
        Commands::Lower {
            input,
            output,
            passes,
            config,
            print_tree,
            emit,
            verbose,
        } => cmd_lower(input, output, passes, config, print_tree, emit, verbose),
        Commands::Show { input, ids, types } => cmd_show(input, ids, types),
    }
}

/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so stdout only ever carries the tree.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "warn,stowage_transform=debug,stowage_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_document(input: &Path) -> Result<(stowage_core::AstContext, stowage_core::NodeId)> {
    stowage_core::persist::load_tree(input)
        .with_context(|| format!("Failed to load tree document {}", input.display()))
}

fn terminal_config(show_ids: bool, show_types: bool) -> stowage_emit::EmitterConfig {
    use std::io::IsTerminal;

    stowage_emit::EmitterConfig {
        use_colors: std::io::stdout().is_terminal(),
        show_ids,
        show_types,
        ..stowage_emit::EmitterConfig::default()
    }
}

fn cmd_lower(
    input: PathBuf,
    output: Option<PathBuf>,
    passes: Option<Vec<String>>,
    config: Option<PathBuf>,
    print_tree: bool,
    emit: OutputFormat,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use std::fs;
    use std::time::Instant;
    use stowage_core::persist::{save_tree, tree_to_string};
    use stowage_emit::{dump_tree_string, EmitterConfig, SourceEmitter};
    use stowage_transform::{Pipeline, PipelineConfig};

    let mut pipeline_config = match config {
        Some(ref path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(keys) = passes {
        pipeline_config = pipeline_config.with_passes(keys);
    }
    pipeline_config.print_tree |= print_tree;
    pipeline_config.collect_stats |= verbose;

    if verbose {
        eprintln!("{}", " Stowage".bright_blue().bold());
        eprintln!("{}", "=".repeat(50).bright_blue());
        eprintln!(" Input: {}", input.display());
        if let Some(ref out) = output {
            eprintln!(" Output: {}", out.display());
        }
        eprintln!(" Passes: {}", pipeline_config.passes.join(","));
        eprintln!();
    }

    let start = Instant::now();
    let (mut ctx, module) = load_document(&input)?;
    let mut pipeline = Pipeline::from_config(&pipeline_config)?;
    tracing::debug!(nodes = ctx.len(), passes = ?pipeline.pass_keys(), "Loaded tree");

    let mut dump_failure = None;
    pipeline
        .run_with_observer(&mut ctx, module, |pass, ctx, module| {
            if pipeline_config.print_tree {
                match dump_tree_string(ctx, module) {
                    Ok(dump) => {
                        eprintln!("{} {}", "After".bright_blue().bold(), pass.name());
                        eprintln!("{}", dump);
                    }
                    Err(err) if dump_failure.is_none() => dump_failure = Some(err),
                    Err(_) => {}
                }
            }
            Ok(())
        })
        .with_context(|| format!("Lowering {} failed", input.display()))?;
    if let Some(err) = dump_failure {
        return Err(err.context("Failed to dump tree"));
    }

    match (emit, output.as_ref()) {
        (OutputFormat::Json, Some(path)) => save_tree(&ctx, module, path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        (OutputFormat::Json, None) => println!("{}", tree_to_string(&ctx, module)?),
        (OutputFormat::Text, Some(path)) => {
            let text = SourceEmitter::new(&ctx, EmitterConfig::plain()).render(module)?;
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        (OutputFormat::Text, None) => {
            print!("{}", SourceEmitter::new(&ctx, terminal_config(false, false)).render(module)?);
        }
    }

    if verbose {
        for stat in pipeline.statistics() {
            eprintln!(
                "   {} ({}): {:.3}ms, {} nodes",
                stat.name,
                stat.key,
                stat.duration.as_secs_f64() * 1000.0,
                stat.nodes_after
            );
        }
        eprintln!("\n {} Lowering successful!", "SUCCESS:".bright_green().bold());
        eprintln!("   Time: {:.3}s", start.elapsed().as_secs_f64());
        if let Some(path) = output {
            eprintln!("   Output: {}", path.display());
        }
    }

    Ok(())
}

fn cmd_show(input: PathBuf, ids: bool, types: bool) -> Result<()> {
    use stowage_emit::SourceEmitter;

    let (ctx, root) = load_document(&input)?;
    let text = SourceEmitter::new(&ctx, terminal_config(ids, types)).render(root)?;
    print!("{}", text);
    Ok(())
}
