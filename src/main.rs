use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use routekit::dispatcher::Dispatcher;
use routekit::middleware::TracingMiddleware;
use routekit::router::Router;
use routekit::runtime_config::RuntimeConfig;
use routekit::server::{AppService, HttpServer};
use routekit::users;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Users service backed by the flat-file store.
#[derive(Parser, Debug)]
#[command(name = "users-api", version, about)]
struct Args {
    /// Address to bind, e.g. 127.0.0.1:8080 (overrides ROUTEKIT_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// Directory for the flat-file collections (overrides ROUTEKIT_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let addr = args.addr.unwrap_or(config.addr);
    let data_dir = args.data_dir.unwrap_or(config.data_dir);

    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    // SAFETY: the may runtime is configured above and no requests arrive
    // before the server starts.
    unsafe {
        dispatcher.register_routes(&mut router, users::routes(&data_dir));
    }

    info!(%addr, routes = router.len(), "users-api listening");
    let service = AppService::new(router, dispatcher);
    let server = HttpServer(service).start(addr.as_str())?;

    server
        .join()
        .map_err(|e| anyhow::anyhow!("server failed: {e:?}"))?;
    Ok(())
}
