use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use fbimport::app::Application;
use fbimport::cli::Cli;
use fbimport::config::{load_env_file, Config};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with custom format
    let env = Env::default().default_filter_or(cli.log_level.as_deref().unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    load_env_file();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env_overrides();
    info!(
        "Graph API {} at {}",
        config.graph.version, config.graph.base_url
    );

    let app = Application::from_config(&config, cli.page)?;
    app.run().await
}
