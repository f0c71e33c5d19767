mod cli;

use clap::Parser;
use cli::Cli;
use heartbleed_probe::engine::HeartbleedProbe;
use heartbleed_probe::output::OutputSink;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err:#}");
            return Ok(ExitCode::from(2));
        }
    };

    let mut sink = OutputSink::stdout(cfg.output.clone());
    let probe = HeartbleedProbe::new(cfg);

    match probe.run().await {
        Ok(report) => {
            sink.write_report(&report)?;
            if report.outcome.is_conclusive() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Err(err) => {
            sink.write_failure(&probe.config().target, &err)?;
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}
