use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::render::{generate, write_output_svg};
use crate::verify::{Expectations, verify_svg};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Where the documentation expects the diagram.
pub const DEFAULT_OUTPUT: &str = "docs/img/distributed-scaling.svg";

#[derive(Parser, Debug)]
#[command(
    name = "distributed-scaling-svg",
    version,
    about = "Generate the animated distributed-scaling diagram"
)]
pub struct Args {
    /// Output SVG path, or '-' for stdout
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Config file (JSON or JSON5) overriding theme, layout, timing or the scene
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Also write the resolved geometry as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Fail when the self-check finds a mismatch instead of only reporting it
    #[arg(long)]
    pub strict: bool,

    /// Skip the self-check
    #[arg(long = "no-verify", conflicts_with = "strict")]
    pub no_verify: bool,

    /// Debug-level logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let generated = generate(&config).context("invalid scene")?;

    let to_stdout = args.output == Path::new("-");
    let output = (!to_stdout).then_some(args.output.as_path());
    write_output_svg(&generated.svg, output)?;
    if let Some(path) = output {
        tracing::info!(path = %path.display(), bytes = generated.svg.len(), "wrote diagram");
    }

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &generated.layout, &config.scene, config.animation.stagger)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote layout dump");
    }

    if args.no_verify {
        return Ok(());
    }

    let report = verify_svg(&generated.svg, Expectations::from_scene(&config.scene))?;
    // Keep stdout clean for the document itself when streaming it.
    if !to_stdout {
        println!("Generated {}", args.output.display());
        println!("{report}");
    }
    if args.strict {
        report.into_result()?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_arguments_uses_defaults() {
        let args = Args::try_parse_from(["distributed-scaling-svg"]).unwrap();
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(args.config.is_none());
        assert!(!args.strict);
    }

    #[test]
    fn strict_and_no_verify_conflict() {
        assert!(
            Args::try_parse_from(["distributed-scaling-svg", "--strict", "--no-verify"]).is_err()
        );
    }
}
