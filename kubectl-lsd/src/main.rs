use std::fs;
use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context as _};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "Examples:
  kubectl get secret my-secret -o yaml | kubectl lsd
  kubectl lsd -f - <./my-secret.json
  kubectl lsd -f ./my-secret.json
  kubectl lsd get -- get secret -n default mysecret --output json";

/// Print kubernetes secrets with their data decoded into stringData
#[derive(Parser, Debug)]
#[command(name = "kubectl-lsd", version, about, after_help = EXAMPLES)]
struct Cli {
    /// File to decode, or - to read from stdin
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Log more, repeat for more detail. RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<LsdCommand>,
}

#[derive(Subcommand, Debug)]
enum LsdCommand {
    /// Run kubectl with the given arguments and decode its output
    Get {
        /// kubectl binary to invoke
        #[arg(long, env = "LSD_KUBECTL", default_value = "kubectl")]
        kubectl: String,

        /// Arguments passed to kubectl verbatim, e.g. `get secret db -o yaml`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let input = match &cli.command {
        Some(LsdCommand::Get { kubectl, args }) => kubectl_get(kubectl, args)?,
        None => read_input(&cli.file)?,
    };

    let out = kubelsd::transform(&input).context("error running LSD")?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    if !out.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        debug!("reading secret from stdin");
        let mut input = Vec::new();
        io::stdin()
            .read_to_end(&mut input)
            .context("error reading from stdin")?;
        return Ok(input);
    }

    debug!(path = %path.display(), "reading secret from file");
    fs::read(path).with_context(|| format!("error reading file {}", path.display()))
}

/// Runs `kubectl <args>` and returns what it printed, stdout first then stderr.
fn kubectl_get(kubectl: &str, args: &[String]) -> anyhow::Result<Vec<u8>> {
    let mut cmd = Command::new(kubectl);
    cmd.args(args);
    info!(?cmd, "invoking kubectl");

    let output = cmd
        .output()
        .with_context(|| format!("error invoking kubectl as {cmd:?}"))?;
    if !output.status.success() {
        bail!(
            "error invoking kubectl as {cmd:?}: {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    Ok(combined)
}
