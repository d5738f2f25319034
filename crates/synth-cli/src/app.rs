//! Command-line surface
//!
//! `cli()` builds the clap command; `run()` executes parsed matches and
//! returns the process exit code. Documents and JSON go to the given writer,
//! status lines go to stderr.

use crate::command::CommandGenerator;
use crate::sources::SourcesFile;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synth_attribution::{
    compute_breakdown, parse_sections, strip_generated_breakdown, validate_synthesis_attributions,
};
use synth_core::{attribution_rules, PostProcessConfig, PostProcessor};

/// Exit code for success
pub const EXIT_OK: u8 = 0;
/// Exit code when the document does not carry valid attribution
pub const EXIT_INVALID: u8 = 1;

fn document_arg() -> Arg {
    Arg::new("document")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Composite markdown document")
}

fn sources_arg() -> Arg {
    Arg::new("sources")
        .long("sources")
        .value_parser(value_parser!(PathBuf))
        .help("JSON file listing reports and additional sources")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

/// Build the `synth-attrib` command
#[must_use]
pub fn cli() -> Command {
    Command::new("synth-attrib")
        .version(synth_core::VERSION)
        .about("Validate, break down and post-process attributed composite reports")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check every section's Attribution line")
                .arg(document_arg())
                .arg(sources_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("breakdown")
                .about("Print the source utilization breakdown")
                .arg(document_arg())
                .arg(sources_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("process")
                .about("Validate, repair once if needed, and append the breakdown")
                .arg(document_arg())
                .arg(sources_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML post-processing configuration"),
                )
                .arg(
                    Arg::new("repair-command")
                        .long("repair-command")
                        .help("Shell command used for the repair call (prompt on stdin)"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("rules")
                .about("Print the attribution rules block for a set of sources")
                .arg(sources_arg()),
        )
}

/// Execute parsed matches
pub async fn run(matches: &ArgMatches, out: &mut impl Write) -> anyhow::Result<u8> {
    match matches.subcommand() {
        Some(("validate", args)) => validate(args, out),
        Some(("breakdown", args)) => breakdown(args, out),
        Some(("process", args)) => process(args, out).await,
        Some(("rules", args)) => {
            let sources = load_sources(args)?;
            writeln!(out, "{}", attribution_rules(&sources.source_map()))?;
            Ok(EXIT_OK)
        }
        Some((other, _)) => anyhow::bail!("unknown subcommand `{other}`"),
        None => anyhow::bail!("no subcommand given"),
    }
}

fn validate(args: &ArgMatches, out: &mut impl Write) -> anyhow::Result<u8> {
    let text = load_document(args)?;
    let source_map = load_sources(args)?.source_map();

    let sections = parse_sections(strip_generated_breakdown(&text));
    let result = validate_synthesis_attributions(&sections, &source_map);

    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut *out, &result)?;
        writeln!(out)?;
    } else if result.valid {
        writeln!(out, "valid ({} section(s))", sections.len())?;
    } else {
        for error in &result.errors {
            writeln!(out, "{error}")?;
        }
    }

    Ok(if result.valid { EXIT_OK } else { EXIT_INVALID })
}

fn breakdown(args: &ArgMatches, out: &mut impl Write) -> anyhow::Result<u8> {
    let text = load_document(args)?;
    let source_map = load_sources(args)?.source_map();

    let sections = parse_sections(strip_generated_breakdown(&text));
    let breakdown = compute_breakdown(&sections, &source_map);

    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut *out, &breakdown)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", breakdown.render_markdown())?;
    }
    Ok(EXIT_OK)
}

async fn process(args: &ArgMatches, out: &mut impl Write) -> anyhow::Result<u8> {
    let text = load_document(args)?;
    let sources = load_sources(args)?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => PostProcessConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PostProcessConfig::default(),
    };

    let mut processor = PostProcessor::new(config).context("invalid post-processing config")?;
    if let Some(command) = args.get_one::<String>("repair-command") {
        processor = processor.with_generator(Arc::new(CommandGenerator::new(command.as_str())));
    }

    let outcome = processor
        .process(&text, &sources.reports, &sources.additional_sources)
        .await;

    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut *out, &outcome)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", outcome.final_text)?;
        eprintln!("status: {}", outcome.status);
        for error in &outcome.validation.errors {
            eprintln!("  {error}");
        }
    }

    Ok(if outcome.status.is_valid() { EXIT_OK } else { EXIT_INVALID })
}

fn load_document(args: &ArgMatches) -> anyhow::Result<String> {
    let path = args
        .get_one::<PathBuf>("document")
        .context("missing document argument")?;
    read_document(path)
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read document {}", path.display()))
}

fn load_sources(args: &ArgMatches) -> anyhow::Result<SourcesFile> {
    match args.get_one::<PathBuf>("sources") {
        Some(path) => SourcesFile::load(path),
        None => Ok(SourcesFile::default()),
    }
}
