// crates/cfdot-cli/src/main.rs - CLI Application Entry Point
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────────┐
// │   argv          │───▶│ clap + registry  │───▶│ Invocation          │
// │                 │    │ (cli.rs)         │    │ (validated args)    │
// └─────────────────┘    └──────────────────┘    └─────────────────────┘
//                                                          │
//                                                          ▼
// ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────────┐
// │ stdout: JSON    │◀───│ Command bodies   │◀───│ Config → Context    │
// │ stderr: Error:  │    │ (commands/*.rs)  │    │ (client set)        │
// └─────────────────┘    └──────────────────┘    └─────────────────────┘
//
// Arguments are validated before configuration is resolved, and only the
// clients the command's registry entry asks for are built. The process exit
// code comes from the error kind: 3 validation, 4 remote, 5 not found, -1
// anything unexpected.
//
// EXAMPLE USAGE:
// ```bash
// cfdot --bbsURL=http://bbs.service.cf.internal:8889 domains
// cfdot actual-lrps -d cf-apps -c cell_z1-0 | jq .state
// BBS_URL=https://... BBS_CA_CERT_FILE=ca.crt cfdot lrp-events --exclude-actual-lrp-groups
// cfdot claim-lock --key k --owner me --ttl 60 --locketAPILocation locket.service.cf.internal:8891
// ```

use std::ffi::OsString;

use anyhow::{Result, anyhow};
use cfdot_core::error::{EXIT_INTERNAL, EXIT_SUCCESS, EXIT_VALIDATION, exit_code};
use cfdot_core::{CfdotError, Config};
use clap::FromArgMatches;
use clap::error::ErrorKind as ClapErrorKind;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

mod args; // Positional and flag validators
mod cli; // Command-line surface (pure data structures)
mod commands; // Command validation, dispatch and bodies
mod context; // Client set built from the resolved config
mod output; // Newline-delimited JSON writer
mod registry; // Ordered command table

use cli::Cli;
use commands::Invocation;
use context::Context;
use output::JsonWriter;

const LOG_LEVEL_ENV: &str = "CFDOT_LOG_LEVEL";

fn log_level(raw: Option<&str>) -> Level {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("error") => Level::ERROR,
        _ => Level::WARN,
    }
}

fn init_tracing() {
    let level = log_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    // A second install only happens in tests; the first one stays.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    init_tracing();

    let code = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run(std::env::args_os())),
        Err(err) => {
            eprintln!("Error: failed to start async runtime: {err}");
            EXIT_INTERNAL
        }
    };

    std::process::exit(code);
}

/// Parse, execute and report; returns the process exit code
async fn run<I>(argv: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let matches = match registry::command().try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(err) => return report_parse_error(err),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(err),
    };

    let name = cli.command.name();
    debug!(command = name, "dispatching");

    let result = execute(&cli).await;
    if let Err(err) = &result {
        report(name, err);
    }
    exit_code(&result)
}

async fn execute(cli: &Cli) -> Result<()> {
    let name = cli.command.name();
    let spec = registry::lookup(name).ok_or_else(|| anyhow!("command '{name}' is not registered"))?;

    let invocation = Invocation::validate(&cli.command)?;
    let config = Config::from_env(&cli.global.raw_options())?;
    let ctx = Context::new(&config, spec.requires)?;

    let out = JsonWriter::stdout();
    commands::run(invocation, &ctx, &out).await
}

fn report(name: &str, err: &anyhow::Error) {
    match err.downcast_ref::<CfdotError>() {
        Some(cfdot) => {
            eprintln!("Error: {cfdot}");
            if !cfdot.silence_usage() {
                if let Some(help) = registry::render_help(name) {
                    eprintln!();
                    eprint!("{help}");
                }
            }
        }
        None => eprintln!("Error: {err:#}"),
    }
}

/// Help and version exit 0; anything else clap rejects is a validation error
fn report_parse_error(err: clap::Error) -> i32 {
    let _ = err.print();
    match err.kind() {
        ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => EXIT_SUCCESS,
        _ => EXIT_VALIDATION,
    }
}
