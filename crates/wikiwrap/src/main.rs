//! wikiwrap: wrap regex-matched spans of Markdown notes in `[[wiki-links]]`.

mod config_loader;

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use walkdir::WalkDir;

use wikiwrap_core::{
    BatchPlan, CancelToken, DEFAULT_CONCURRENCY, Document, FsDocument, render_json, run_batch,
};
use wikiwrap_domain::{annotate, unlink, unlink_all, validate_rule_set};
use wikiwrap_types::{BatchReceipt, RulesFile, WarningKind};

#[derive(Parser)]
#[command(name = "wikiwrap")]
#[command(about = "Wrap regex-matched spans of Markdown in [[wiki-links]]", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate Markdown documents, wrapping rule matches in [[wiki-links]].
    Annotate(AnnotateArgs),

    /// Remove [[wiki-link]] markup, the inverse of annotate.
    Strip(StripArgs),

    /// Validate the rules file (check patterns and capture groups).
    Validate(ValidateArgs),

    /// Print the effective rule set.
    Rules(RulesArgs),

    /// Initialize a new wikiwrap.toml with the built-in rule library.
    Init(InitArgs),

    /// Print the JSON Schema for rules files or batch receipts.
    Schema(SchemaArgs),
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Files or directories to annotate. Directories are searched for *.md
    /// files. With no paths (or a single '-'), reads stdin and writes the
    /// annotated text to stdout.
    paths: Vec<PathBuf>,

    /// Path to a rules file. If omitted, uses ./wikiwrap.toml if present,
    /// else the built-in library.
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Write changes back to the files. Without this flag nothing is
    /// touched and the report shows what would change.
    #[arg(long)]
    write: bool,

    /// Number of documents processed in parallel.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    jobs: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct StripArgs {
    /// Files or directories to strip. Directories are searched for *.md
    /// files. With no paths (or a single '-'), reads stdin and writes the
    /// stripped text to stdout.
    paths: Vec<PathBuf>,

    /// Also unwrap embeds (`![[...]]`). Destructive: embeds do not survive
    /// a later annotate run.
    #[arg(long)]
    all: bool,

    /// Write changes back to the files.
    #[arg(long)]
    write: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Path to a rules file. If omitted, uses ./wikiwrap.toml if present,
    /// else the built-in library.
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct RulesArgs {
    /// Path to a rules file. If omitted, uses ./wikiwrap.toml if present,
    /// else the built-in library.
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RulesFormat::Toml)]
    format: RulesFormat,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Where to write the rules file.
    #[arg(long, short = 'o', default_value = "wikiwrap.toml")]
    output: PathBuf,

    /// Overwrite an existing file without prompting.
    #[arg(long, short = 'f')]
    force: bool,
}

#[derive(Parser, Debug)]
struct SchemaArgs {
    /// Which schema to print.
    #[arg(value_enum, default_value_t = SchemaKind::Rules)]
    kind: SchemaKind,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RulesFormat {
    Toml,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaKind {
    Rules,
    Receipt,
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Annotate(args) => cmd_annotate(args),
        Commands::Strip(args) => cmd_strip(args),
        Commands::Validate(args) => cmd_validate(args),
        Commands::Rules(args) => {
            cmd_rules(args)?;
            Ok(0)
        }
        Commands::Init(args) => {
            cmd_init(args)?;
            Ok(0)
        }
        Commands::Schema(args) => {
            cmd_schema(args)?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn cmd_annotate(args: AnnotateArgs) -> Result<i32> {
    let rules_file = load_rules(args.rules)?;

    if read_from_stdin(&args.paths) {
        return annotate_stdin(&rules_file);
    }

    let rule_set = rules_file.rule_set();
    let paths = collect_documents(&args.paths)?;
    info!(
        "Annotating {} document(s) with {} rule(s)",
        paths.len(),
        rule_set.rule_count()
    );

    let documents: Vec<Box<dyn Document>> = paths
        .into_iter()
        .map(|p| Box::new(FsDocument::new(p)) as Box<dyn Document>)
        .collect();

    let plan = BatchPlan {
        concurrency: args.jobs,
        write: args.write,
    };

    let run = run_batch(
        &plan,
        &rule_set,
        &rules_file.policy,
        &documents,
        &CancelToken::new(),
    )?;

    match args.format {
        OutputFormat::Json => println!("{}", render_json(&run.receipt)?),
        OutputFormat::Text => {
            print!("{}", run.summary);
            if !args.write && run.receipt.totals.changed > 0 {
                println!(
                    "dry run: pass --write to update {} document(s)",
                    run.receipt.totals.changed
                );
            }
        }
    }

    Ok(run.exit_code)
}

/// Filter mode: annotate stdin onto stdout. The annotated buffer has its
/// trailing whitespace trimmed, so printing restores exactly one final
/// newline.
fn annotate_stdin(rules_file: &RulesFile) -> Result<i32> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input).context("read stdin")?;

    let annotated = annotate(&input, &rules_file.rule_set(), &rules_file.policy);
    for warning in &annotated.warnings {
        eprintln!(
            "warning: rule '{}' ({}): {}",
            warning.rule,
            warning.kind.as_str(),
            warning.detail
        );
    }

    println!("{}", annotated.text);
    Ok(0)
}

fn cmd_strip(args: StripArgs) -> Result<i32> {
    if read_from_stdin(&args.paths) {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).context("read stdin")?;
        let stripped = if args.all {
            unlink_all(&input)
        } else {
            unlink(&input)
        };
        print!("{stripped}");
        return Ok(0);
    }

    let paths = collect_documents(&args.paths)?;
    info!("Stripping links from {} document(s)", paths.len());

    let mut changed: usize = 0;
    let mut failed: usize = 0;

    for path in &paths {
        match strip_file(path, args.all, args.write) {
            Ok(true) => {
                changed += 1;
                println!("changed   {}", path.display());
            }
            Ok(false) => {}
            Err(err) => {
                failed += 1;
                println!("failed    {}: {:#}", path.display(), err);
            }
        }
    }

    println!(
        "{} document(s): {} changed, {} failed",
        paths.len(),
        changed,
        failed
    );
    if !args.write && changed > 0 {
        println!("dry run: pass --write to update {changed} document(s)");
    }

    Ok(if failed > 0 { 1 } else { 0 })
}

fn strip_file(path: &Path, all: bool, write: bool) -> Result<bool> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;

    let stripped = if all { unlink_all(&text) } else { unlink(&text) };
    if stripped == text {
        return Ok(false);
    }

    if write {
        std::fs::write(path, &stripped)
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(true)
}

fn cmd_validate(args: ValidateArgs) -> Result<i32> {
    let rules_file = load_rules(args.rules)?;
    let rule_set = rules_file.rule_set();

    debug!("Validating {} rule(s)", rule_set.rule_count());

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    for warning in validate_rule_set(&rule_set) {
        let line = format!("Rule '{}': {}", warning.rule, warning.detail);
        match warning.kind {
            WarningKind::InvalidPattern => errors.push(line),
            WarningKind::MultipleCaptureGroups
            | WarningKind::NoCaptureGroup
            | WarningKind::DuplicateName => warnings.push(line),
        }
    }

    match args.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "valid": errors.is_empty(),
                "rules": rule_set.rule_count(),
                "errors": errors,
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if !warnings.is_empty() {
                println!("Warnings ({}):", warnings.len());
                for (i, warn) in warnings.iter().enumerate() {
                    println!("  {}. {}", i + 1, warn);
                }
                println!();
            }

            if errors.is_empty() {
                println!("Rule set is valid!");
                println!("  {} rule(s) defined", rule_set.rule_count());
            } else {
                println!("Rule set has {} error(s):", errors.len());
                println!();
                for (i, err) in errors.iter().enumerate() {
                    println!("  {}. {}", i + 1, err);
                }
            }
        }
    }

    if errors.is_empty() { Ok(0) } else { Ok(1) }
}

fn cmd_rules(args: RulesArgs) -> Result<()> {
    let rules_file = load_rules(args.rules)?;

    match args.format {
        RulesFormat::Toml => {
            let s = toml::to_string_pretty(&rules_file).context("render toml")?;
            print!("{s}");
        }
        RulesFormat::Json => {
            let s = serde_json::to_string_pretty(&rules_file).context("render json")?;
            print!("{s}");
        }
    }

    Ok(())
}

fn cmd_init(args: InitArgs) -> Result<()> {
    let mut input = io::stdin().lock();
    cmd_init_with_io(args, &mut input, io::stderr())
}

fn cmd_init_with_io<R: BufRead, W: Write>(args: InitArgs, input: &mut R, err: W) -> Result<()> {
    let output_path = &args.output;

    if output_path.exists() && !args.force && !confirm_overwrite(input, err, output_path)? {
        println!("Aborted.");
        return Ok(());
    }

    let content = starter_rules_toml()?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }

    std::fs::write(output_path, &content)
        .with_context(|| format!("write {}", output_path.display()))?;

    println!(
        "Created {} with the built-in rule library.",
        output_path.display()
    );
    println!();
    println!("Next steps:");
    println!(
        "  1. Review and customize the rules in {}",
        output_path.display()
    );
    println!("  2. Run 'wikiwrap annotate <PATH>' to preview changes");
    println!("  3. Re-run with --write to apply them");

    Ok(())
}

fn confirm_overwrite<R: BufRead, W: Write>(
    input: &mut R,
    mut err: W,
    output_path: &Path,
) -> Result<bool> {
    write!(
        err,
        "Rules file '{}' already exists. Overwrite? [y/N] ",
        output_path.display()
    )?;
    err.flush().context("flush stderr")?;

    let mut input_line = String::new();
    input.read_line(&mut input_line).context("read stdin")?;

    let input = input_line.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

fn starter_rules_toml() -> Result<String> {
    let body = toml::to_string_pretty(&RulesFile::built_in()).context("render toml")?;
    Ok(format!(
        "# wikiwrap rules. Rules run top to bottom; earlier matches shield later ones.\n\
         # Run 'wikiwrap validate' after editing.\n\n{body}"
    ))
}

fn cmd_schema(args: SchemaArgs) -> Result<()> {
    let schema = match args.kind {
        SchemaKind::Rules => schemars::schema_for!(RulesFile),
        SchemaKind::Receipt => schemars::schema_for!(BatchReceipt),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Resolve the effective rules: an explicit path, then ./wikiwrap.toml if
/// present, then the built-in library. A user file replaces the built-in
/// library entirely; deleted rules stay deleted.
fn load_rules(path: Option<PathBuf>) -> Result<RulesFile> {
    let user_path = path.or_else(|| {
        let p = PathBuf::from("wikiwrap.toml");
        if p.exists() { Some(p) } else { None }
    });

    let Some(path) = user_path else {
        debug!("No rules file found, using the built-in library");
        return Ok(RulesFile::built_in());
    };

    debug!("Loading rules from {}", path.display());
    config_loader::load_rules_with_includes(&path)
}

/// True when the path arguments select the stdin/stdout filter mode.
fn read_from_stdin(paths: &[PathBuf]) -> bool {
    paths.is_empty() || (paths.len() == 1 && paths[0] == Path::new("-"))
}

/// Expand path arguments into the documents to process.
///
/// Directories are walked recursively for `*.md` files, skipping hidden
/// entries (`.obsidian/`, `.git/`, dotfiles). Files named explicitly are
/// taken as-is, whatever their extension. The result is sorted and
/// deduplicated so receipts are deterministic.
fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_entry(|e| !is_hidden(e)) {
                let entry = entry.with_context(|| format!("walk {}", path.display()))?;
                if entry.file_type().is_file() && is_markdown(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("path not found: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
