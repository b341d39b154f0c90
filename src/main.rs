use std::io::IsTerminal;

use clap::Parser;
use coldcall::app::App;
use coldcall::cli::{
    run_call, run_clicks, run_dial, run_dispose, run_edit, run_export, run_info, run_list, run_load, run_menu,
    run_note, run_reparse, run_restore, run_save, run_show, run_upload, Cli, Commands,
};
use coldcall::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let mut app = App::open(config).await?;
    app.init().await;

    match cli.command {
        None => {
            // No subcommand provided - show interactive menu
            run_menu(&mut app).await?;
        }
        Some(Commands::Upload(args)) => {
            run_upload(&app, args.file).await?;
        }
        Some(Commands::List(args)) => {
            run_list(&app, &args).await?;
        }
        Some(Commands::Show(args)) => {
            run_show(&app, &args.identifier).await?;
        }
        Some(Commands::Dispose(args)) => {
            run_dispose(&app, &args.identifier, &args.disposition).await?;
        }
        Some(Commands::Note(args)) => {
            run_note(&app, &args.identifier, args.text).await?;
        }
        Some(Commands::Edit(args)) => {
            run_edit(&app, &args.identifier, &args.field, args.value).await?;
        }
        Some(Commands::Call(args)) => {
            run_call(&app, &args.identifier).await?;
        }
        Some(Commands::Clicks(args)) => {
            run_clicks(&app, args.reset).await?;
        }
        Some(Commands::Dial(args)) => {
            run_dial(&app, &args).await?;
        }
        Some(Commands::Export(args)) => {
            run_export(&app, args.path.as_deref()).await?;
        }
        Some(Commands::Restore(args)) => {
            run_restore(&app, &args.path, std::io::stdin().is_terminal()).await?;
        }
        Some(Commands::Save) => {
            run_save(&mut app).await?;
        }
        Some(Commands::Load) => {
            run_load(&mut app).await?;
        }
        Some(Commands::Reparse) => {
            run_reparse(&app).await?;
        }
        Some(Commands::Info) => {
            run_info(&app).await?;
        }
    }

    Ok(())
}
