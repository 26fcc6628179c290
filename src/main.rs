use clap::Parser;
use sharepass::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Purger));

    let result = match cli.command {
        Commands::Encrypt {
            ref secret,
            ref key,
            ref output,
            ref url,
        } => sharepass::cli::commands::encrypt::execute(&cli, secret.as_deref(), key, output, url),
        Commands::Lock {
            ref file,
            ref ip,
            ref forwarded_for,
        } => sharepass::cli::commands::lock::execute(
            &cli,
            file.as_deref(),
            ip,
            forwarded_for.as_deref(),
        ),
        Commands::Unlock { ref code } => sharepass::cli::commands::unlock::execute(&cli, code),
        Commands::Peek { ref code } => sharepass::cli::commands::peek::execute(&cli, code),
        Commands::TimeLeft { ref code } => sharepass::cli::commands::time_left::execute(&cli, code),
        Commands::CheckLimit {
            ref ip,
            ref forwarded_for,
        } => sharepass::cli::commands::check_limit::execute(&cli, ip, forwarded_for.as_deref()),
        Commands::Purge => sharepass::cli::commands::purge::execute_once(&cli),
        Commands::Purger => sharepass::cli::commands::purge::execute_daemon(&cli),
    };

    if let Err(e) = result {
        sharepass::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for blobs, links and secrets.
/// `RUST_LOG` wins; otherwise the long-running purger logs at info and
/// one-shot commands only warn.
fn init_tracing(long_running: bool) {
    let default = if long_running { "info" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
