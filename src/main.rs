use std::{process, sync::Arc};

use axum::Router;
use citytrends::{
    application::{
        archive,
        cities::CityService,
        error::AppError,
        repos::{CitiesRepo, CitiesWriteRepo},
        trends::{TrendService, TrendsClient},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, RouterState},
        telemetry,
        twitter::TwitterClient,
    },
};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Import(args) => run_import(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let credentials = settings
        .twitter
        .credentials
        .clone()
        .ok_or_else(|| InfraError::configuration("upstream API credentials are not configured"))?;
    let client = TwitterClient::new(&settings.twitter, credentials)?;

    let repositories = init_repositories(&settings).await?;
    let router = build_application_router(repositories, Arc::new(client));

    serve_http(&settings.server, router).await
}

async fn run_import(settings: config::Settings, args: config::ImportArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let path = args.file;

    info!(
        target = "citytrends::import",
        path = %path.display(),
        "Starting import"
    );

    let summary = archive::import_cities(&repositories, &path).await?;
    info!(
        target = "citytrends::import",
        cities = summary.cities,
        images = summary.images,
        facts = summary.facts,
        "Import completed"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_router(
    repositories: Arc<PostgresRepositories>,
    client: Arc<dyn TrendsClient>,
) -> Router {
    let cities_repo: Arc<dyn CitiesRepo> = repositories.clone();
    let cities_write_repo: Arc<dyn CitiesWriteRepo> = repositories.clone();

    let api = ApiState {
        cities: Arc::new(CityService::new(cities_repo.clone())),
        trends: Arc::new(TrendService::new(cities_repo, cities_write_repo, client)),
    };

    http::build_router(RouterState {
        api,
        db: repositories,
    })
}

async fn serve_http(server: &config::ServerSettings, router: Router) -> Result<(), AppError> {
    let listener = TcpListener::bind(server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "citytrends::serve", addr = %server.addr, "Listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let serve = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = shutdown_rx.await;
        },
    );
    let mut handle = tokio::spawn(async move { serve.await });

    tokio::select! {
        joined = &mut handle => return server_outcome(joined),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| AppError::from(InfraError::from(err)))?;
        }
    }

    info!(
        target = "citytrends::serve",
        grace_seconds = server.graceful_shutdown.as_secs(),
        "Shutdown requested; draining connections"
    );
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(server.graceful_shutdown, &mut handle).await {
        Ok(joined) => server_outcome(joined),
        Err(_) => {
            warn!(
                target = "citytrends::serve",
                "Graceful shutdown timed out; aborting open connections"
            );
            handle.abort();
            Ok(())
        }
    }
}

fn server_outcome(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}
