use clap::Parser;

use quote_refresh::adapter::inbound::cli::command::{Cli, ColorChoice, Commands, ConfigCommand};
use quote_refresh::adapter::inbound::cli::diagnostic::CliError;
use quote_refresh::adapter::inbound::cli::output::{self, OutputConfig};
use quote_refresh::adapter::inbound::cli::{config, operator, refresh};
use quote_refresh::infrastructure::operator::Operator;

fn apply_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Auto => owo_colors::unset_override(),
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    apply_color(cli.color);
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    if operator::install(Box::new(Operator::new())).is_err() {
        return Err(CliError::Runtime("CLI operator already installed".to_string()).into());
    }

    match cli.command {
        Commands::Refresh(args) => refresh::execute(&args).await?,
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(args.config.as_deref())?,
    }
    Ok(())
}
