use std::env;
use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use giftwise::catalog::{Catalog, StaticCatalog};
use giftwise::config::get_variable;
use giftwise::environment::{Config, Environment};
use giftwise::recommender::SimulatedRecommender;
use giftwise::routes;
use giftwise::sessions::Sessions;
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("GIFTWISE_PORT")
        .parse()
        .expect("parse GIFTWISE_PORT as u16");
    let admin_port: u16 = get_variable("GIFTWISE_ADMIN_PORT")
        .parse()
        .expect("parse GIFTWISE_ADMIN_PORT as u16");

    let config = Config::from_env();

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port, "config" => ?config);
    let logger = Arc::new(logger);

    let catalog = match env::var("GIFTWISE_CATALOG_PATH") {
        Ok(path) => {
            info!(logger, "Loading catalog..."; "path" => %path);
            StaticCatalog::from_file(&path)?
        }
        Err(_) => StaticCatalog::builtin(),
    };
    info!(logger, "Catalog ready"; "items" => catalog.len());

    let catalog: Arc<dyn Catalog> = Arc::new(catalog.with_latency(config.results_delay()));
    let recommender = Arc::new(SimulatedRecommender::new(config.submit_delay()));
    let sessions = Arc::new(Sessions::new());

    let environment = Environment::new(logger.clone(), catalog, recommender, sessions, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // A full channel means shutdown is already under way.
            let _ = termination_sender.try_send(());
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let sweeper = {
        let should_terminate = should_terminate.clone();
        let sessions = environment.sessions.clone();
        let logger = logger.clone();
        let session_ttl = environment.config.session_ttl();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = sessions.sweep(session_ttl, &logger) => {},
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::make_main_routes(environment.clone());

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone())
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, sweeper, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
