mod cli;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use krms_config::ConfigView;
use krms_core::{EmailStatus, Pipeline};

use crate::cli::{Cli, Command, GlobalOpts, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(&cli.global);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(global: &GlobalOpts) {
    let filter = match (global.quiet, global.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match global.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run(args) => {
            let config = config::pipeline_config(&args.source, args.no_email)?;
            let pipeline = Pipeline::new(config)?;
            let outcome = pipeline.run().await?;

            if let EmailStatus::Failed { ref reason } = outcome.email {
                tracing::error!(%reason, "report written but email failed");
            }
            output::print_output(
                &output::render_outcome(cli.global.output, &outcome),
                cli.global.quiet,
            );
            Ok(())
        }

        Command::CheckConfig(source) => {
            let config = config::pipeline_config(&source, false)?;
            let view = ConfigView::from(&config);
            output::print_output(
                &output::render_config(cli.global.output, &view),
                cli.global.quiet,
            );
            Ok(())
        }

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "krms", &mut std::io::stdout());
            Ok(())
        }
    }
}
