use clap::Parser;
use rusty_library::cli::{self, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rusty_library=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.output_format();

    let mut stdout = std::io::stdout();
    if let Err(error) = cli::run(cli, &mut stdout).await {
        cli::report_error(&error, format, &mut std::io::stderr());
        std::process::exit(error.exit_code());
    }
}
