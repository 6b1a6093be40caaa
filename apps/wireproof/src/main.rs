use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::Read as _;
use std::path::PathBuf;
use wireproof_config::{WireproofConfig, load_config, load_dictionary};
use wireproof_context::ExchangeContext;
use wireproof_dictionary::PathMappingStrategy;
use wireproof_ports::ValidationFailure;
use wireproof_text::{PlainTextValidator, TextValidatorConfig};

#[derive(Parser, Debug)]
#[command(name = "wireproof")]
#[command(about = "Rewrite and validate message payloads for integration tests.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a data dictionary to a JSON payload.
    Apply {
        /// Dictionary file (json, yaml, or key=value properties lines).
        #[arg(long)]
        dictionary: PathBuf,
        /// "exact" (default), "starts-with", or "ends-with". Overrides the file.
        #[arg(long)]
        strategy: Option<String>,
        /// Variable binding, repeatable (name=value).
        #[arg(long = "var")]
        vars: Vec<String>,
        /// Payload file, or '-' for stdin.
        payload: String,
    },
    /// Validate a received plain-text payload against a control file.
    ///
    /// Exits 0 silently on success; prints the failure on stderr and
    /// exits 1 on mismatch. Variables captured by @variable(...)@ are
    /// printed as name=value lines on stdout.
    Check {
        /// Control file with the expected text (placeholders allowed).
        #[arg(long)]
        control: PathBuf,
        /// Collapse all whitespace runs before comparing.
        #[arg(long)]
        ignore_whitespace: bool,
        /// Normalize CRLF/CR line endings to LF before comparing.
        #[arg(long)]
        ignore_newline_type: bool,
        /// Variable binding, repeatable (name=value).
        #[arg(long = "var")]
        vars: Vec<String>,
        /// Config file supplying policy defaults (flags win).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Received payload file, or '-' for stdin.
        received: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply {
            dictionary,
            strategy,
            vars,
            payload,
        } => run_apply(&dictionary, strategy.as_deref(), &vars, &payload),
        Command::Check {
            control,
            ignore_whitespace,
            ignore_newline_type,
            vars,
            config,
            received,
        } => run_check(
            &control,
            ignore_whitespace,
            ignore_newline_type,
            &vars,
            config.as_deref(),
            &received,
        ),
    }
}

fn run_apply(
    dictionary: &std::path::Path,
    strategy: Option<&str>,
    vars: &[String],
    payload: &str,
) -> Result<()> {
    let strategy = strategy
        .map(|s| s.parse::<PathMappingStrategy>().map_err(anyhow::Error::msg))
        .transpose()?;
    let dictionary = load_dictionary(dictionary, strategy)?;
    let ctx = context_with(vars)?;

    let payload = read_input(payload)?;
    let rewritten = dictionary.apply_payload(&payload, &ctx)?;
    println!("{rewritten}");
    Ok(())
}

fn run_check(
    control: &std::path::Path,
    ignore_whitespace: bool,
    ignore_newline_type: bool,
    vars: &[String],
    config: Option<&std::path::Path>,
    received: &str,
) -> Result<()> {
    let defaults = match config {
        Some(path) => load_config(path)?,
        None => WireproofConfig::default(),
    };
    let validator = PlainTextValidator::new(TextValidatorConfig {
        ignore_whitespace: ignore_whitespace || defaults.validator.ignore_whitespace,
        ignore_newline_type: ignore_newline_type || defaults.validator.ignore_newline_type,
    });

    let mut ctx = context_with(vars)?;
    let preset: Vec<String> = ctx.variables().map(|(n, _)| n.to_string()).collect();

    let control = std::fs::read_to_string(control)
        .with_context(|| format!("read control file {}", control.display()))?;
    let received = read_input(received)?;

    match validator.validate(&received, &control, &mut ctx) {
        Ok(()) => {
            for (name, value) in ctx.variables() {
                if !preset.iter().any(|p| p == name) {
                    println!("{name}={value}");
                }
            }
            Ok(())
        }
        Err(err) => match err.downcast_ref::<ValidationFailure>() {
            Some(failure) => {
                eprintln!("{failure}");
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

fn context_with(vars: &[String]) -> Result<ExchangeContext> {
    let mut ctx = ExchangeContext::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            bail!("--var must be name=value, got '{var}'");
        };
        ctx.set_variable(name.trim(), value);
    }
    Ok(ctx)
}

fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("read payload from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("read payload file {arg}"))
    }
}
