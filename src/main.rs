use clap::Parser;
use colored::Colorize;
use tracing::error;

use travelbook::cli::{Cli, Commands};
use travelbook::config::{get_config, init_config};
use travelbook::runtime::modes;
use travelbook::system::logging::init_logging;
use travelbook::system::panic_handler::{RunMode, install_panic_hook};

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    // generate-config 不需要加载配置与日志
    if let Commands::GenerateConfig { path, force } = &command {
        install_panic_hook(RunMode::Command);
        if let Err(e) = modes::run_generate_config(path.as_deref(), *force) {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
        return;
    }

    init_config(cli.config.as_deref());
    let config = get_config();

    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Serve => {
            install_panic_hook(RunMode::Server);
            modes::run_server().await
        }
        Commands::Migrate => {
            install_panic_hook(RunMode::Command);
            modes::run_migrate().await
        }
        Commands::ImportGeo { file } => {
            install_panic_hook(RunMode::Command);
            modes::run_import_geo(&file).await
        }
        Commands::GenerateConfig { .. } => Ok(()),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
