use clap::Parser;
use color_eyre::Result;
use qplan::{
    cli::{self, Cli, Commands},
    tasks::SortMode,
    Config, Database, Profile,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Logging goes to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // Load configuration with the determined profile
    let config = Config::load_with_profile(profile)?;

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::AddTask {
            title,
            date,
            description,
            start,
            end,
            priority,
            emoji,
            subtasks,
            notify,
        } => {
            cli::handle_add_task(
                title,
                date,
                description,
                start,
                end,
                priority,
                emoji,
                subtasks,
                notify,
                &db,
            )?;
        }
        Commands::ImportDraft { json, date } => {
            cli::handle_import_draft(json, date, &db)?;
        }
        Commands::ListTasks { date, sort } => {
            let sort = match sort {
                Some(arg) => arg.into(),
                None if config.default_sort == "priority" => SortMode::Priority,
                None => SortMode::CreatedAt,
            };
            cli::handle_list_tasks(date, sort, &db)?;
        }
        Commands::ReorderTasks { date, ids } => {
            cli::handle_reorder_tasks(date, ids, &db)?;
        }
        Commands::UpdateTask {
            id,
            status,
            toggle_subtasks,
            notify,
        } => {
            cli::handle_update_task(id, status, toggle_subtasks, notify, &db)?;
        }
        Commands::DeleteTask { id } => {
            cli::handle_delete_task(id, &db)?;
        }
        Commands::AddEvent {
            title,
            start,
            end,
            location,
        } => {
            cli::handle_add_event(title, start, end, location, &db)?;
        }
        Commands::DeleteEvent { id } => {
            cli::handle_delete_event(id, &db)?;
        }
        Commands::Timeline => {
            cli::handle_timeline(&db)?;
        }
        Commands::History => {
            cli::handle_history(&db)?;
        }
        Commands::AddPost {
            title,
            content,
            date,
            id,
        } => {
            cli::handle_add_post(title, content, date, id, &db)?;
        }
        Commands::DeletePost { id } => {
            cli::handle_delete_post(id, &db)?;
        }
        Commands::Feed => {
            cli::handle_feed(&config.site_url, &db)?;
        }
        Commands::Watch { track } => {
            cli::handle_watch(track, &db)?;
        }
    }

    Ok(())
}
