use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use pagemark::core::notes;
use pagemark::utils::{logger, validation::Validate};
use pagemark::{
    CliConfig, ContentFetcher, HtmdConvert, LocalNoteStore, NoteOptions, PagemarkConfig,
    PortRegistry, Retriever, ReverseProxy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting pagemark");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    let file_config = match &cli.config {
        Some(path) => PagemarkConfig::from_file(path)?,
        None => PagemarkConfig::default(),
    };
    file_config.validate()?;

    // Flags win over file values, file values over built-in defaults.
    let base_port = cli.base_port.unwrap_or(file_config.retrieval.base_port);
    let timeout = file_config.retrieval.timeout_seconds.map(Duration::from_secs);
    let options = NoteOptions {
        url_attribute: cli
            .attribute
            .clone()
            .unwrap_or_else(|| file_config.notes.url_attribute.clone()),
        read_later_folder: cli
            .folder
            .clone()
            .or_else(|| file_config.notes.read_later_folder.clone()),
    };

    let registry = Arc::new(PortRegistry::new());
    let fetcher = ContentFetcher::with_options(timeout, file_config.retrieval.user_agent.clone())?;
    let proxy = ReverseProxy::with_base_port(registry, base_port);
    let mut retriever = Retriever::with_converter(fetcher, HtmdConvert::new(), proxy);
    let store = LocalNoteStore::new(cli.notes_root.clone());

    if let Some(url) = &cli.url {
        match notes::create_note_from_url(&store, &mut retriever, &options, url, cli.proxy).await {
            Ok(path) => {
                tracing::info!("Note created at {}", path);
                println!("{}", path);
            }
            Err(e) => {
                tracing::error!("Failed to create note: {}", e);
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    } else if let Some(path) = &cli.sync {
        match notes::sync_note(&store, &mut retriever, &options, path, cli.proxy).await {
            Ok(Some(new_path)) => {
                tracing::info!("Note refreshed at {}", new_path);
                println!("{}", new_path);
            }
            Ok(None) => {
                println!(
                    "{}: no {} attribute in front matter, nothing to do",
                    path, options.url_attribute
                );
            }
            Err(e) => {
                tracing::error!("Failed to refresh note: {}", e);
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
