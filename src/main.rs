use clap::Parser;
use secretsafe::cli::{load_settings, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            secretsafe::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    secretsafe::logging::init(&settings.log_level);

    let result = match cli.command {
        Commands::Serve => secretsafe::cli::commands::serve::execute(&settings),
        Commands::Call {
            ref channel,
            ref payload,
        } => secretsafe::cli::commands::call::execute(&settings, channel, payload.as_deref()),
    };

    if let Err(e) = result {
        secretsafe::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
