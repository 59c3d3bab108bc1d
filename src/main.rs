use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use field_dump::app_state::AppState;
use field_dump::config::ServerConfig;
use field_dump::error::{DumpError, Result};
use field_dump::routes;
use field_dump::utils::parser_registry::ParserRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about = "Field dump file tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve dump files from a resource directory over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        #[arg(long, default_value = "test/resource")]
        resource_dir: PathBuf,
        /// Seconds before an unfinished chunk task is dropped
        #[arg(long, default_value_t = 30 * 60)]
        task_ttl_secs: u64,
        #[arg(long, default_value_t = 5 * 60)]
        cleanup_interval_secs: u64,
    },
    /// Print a dump's metadata and one component
    Inspect {
        file: PathBuf,
        #[arg(long, default_value_t = 2)]
        component: usize,
        /// Also write the data back out to <file>.new.dump
        #[arg(long)]
        resave: bool,
    },
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Command::Serve {
            bind,
            resource_dir,
            task_ttl_secs,
            cleanup_interval_secs,
        } => {
            let config = ServerConfig {
                bind,
                resource_dir,
                task_ttl: Duration::from_secs(task_ttl_secs),
                cleanup_interval: Duration::from_secs(cleanup_interval_secs.max(1)),
            };
            serve(config).await
        }
        Command::Inspect {
            file,
            component,
            resave,
        } => inspect(&file, component, resave).map_err(std::io::Error::other),
    }
}

async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config);
    for ext in state.parser_registry.supported_extensions() {
        info!("registered parser for .{ext}");
    }

    let task_store = state.task_store.clone();
    let app_state = web::Data::new(state);

    let cleanup_store = Arc::clone(&task_store);
    let cleanup_interval = config.cleanup_interval;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let cleaned_count = cleanup_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    remaining = cleanup_store.task_count(),
                    "dropped {cleaned_count} expired tasks"
                );
            }
        }
    });

    info!(
        resource_dir = %config.resource_dir.display(),
        task_ttl_secs = task_store.default_ttl().as_secs(),
        "listening on http://{}",
        config.bind
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(config.bind)?
    .run()
    .await
}

fn inspect(file: &Path, component: usize, resave: bool) -> Result<()> {
    let registry = ParserRegistry::new();
    let (parser, _) = registry
        .find_parser_for_file(file)
        .ok_or_else(|| DumpError::UnsupportedFile {
            file: file.display().to_string(),
        })?;
    let dump = parser.parse_from_file(file)?;
    let header = &dump.header;

    println!(
        "cell: {} {} {} {}  shape: {:?}",
        header.csx,
        header.csy,
        header.csz,
        header.meshunit,
        dump.field.shape()
    );
    println!(
        "quantity: {} [{}]  arg: {} {}",
        header.quant, header.quantunit, header.arg, header.argunit
    );
    println!("trailer: {:#018x} (not verified)", dump.trailer);

    match dump.field.component(component) {
        Some(view) => {
            if let Some((lo, hi)) = dump.field.component_range(component) {
                println!("component {component}: min {lo} max {hi}");
            }
            println!("{view}");
        }
        None => println!(
            "component {component} not present ({} components)",
            dump.field.components()
        ),
    }

    if resave {
        let mut target = OsString::from(file.as_os_str());
        target.push(".new.dump");
        let target = PathBuf::from(target);
        field_dump::save(&target, &dump.header, &dump.field)?;
        info!("wrote {}", target.display());
    }
    Ok(())
}
