use std::error::Error;
use std::sync::Arc;

use warp::Filter;

use filmgraph::config::{get_variable, get_variable_or};
use filmgraph::db::PgDb;
use filmgraph::environment::{Config, Environment};
use filmgraph::routes;
use futures::future::FutureExt;
use log::{info, initialize_logger};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("FILMGRAPH_PORT")
        .parse()
        .expect("parse FILMGRAPH_PORT as u16");
    let admin_port: u16 = get_variable("FILMGRAPH_ADMIN_PORT")
        .parse()
        .expect("parse FILMGRAPH_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("FILMGRAPH_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from FILMGRAPH_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let config = Config::new(
        get_variable_or("FILMGRAPH_POPULAR_DEFAULT_COUNT", "10")
            .parse()
            .expect("parse FILMGRAPH_POPULAR_DEFAULT_COUNT as i64"),
    );
    let environment = Environment::new(logger.clone(), db, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate =
        Arc::new(move || {
            let termination_sender = termination_sender.clone();

            async move {
            let termination_sender = termination_sender.clone();
                termination_sender.send(()).await.unwrap();
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
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate();
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let films_list_route = routes::make_films_list_route(environment.clone());
        let film_create_route = routes::make_film_create_route(environment.clone());
        let film_update_route = routes::make_film_update_route(environment.clone());
        let popular_route = routes::make_popular_route(environment.clone());
        let film_retrieve_route = routes::make_film_retrieve_route(environment.clone());
        let film_delete_route = routes::make_film_delete_route(environment.clone());
        let like_route = routes::make_like_route(environment.clone());
        let unlike_route = routes::make_unlike_route(environment.clone());
        let users_list_route = routes::make_users_list_route(environment.clone());
        let user_create_route = routes::make_user_create_route(environment.clone());
        let user_update_route = routes::make_user_update_route(environment.clone());
        let user_retrieve_route = routes::make_user_retrieve_route(environment.clone());
        let user_delete_route = routes::make_user_delete_route(environment.clone());
        let common_friends_route = routes::make_common_friends_route(environment.clone());
        let friends_list_route = routes::make_friends_list_route(environment.clone());
        let friend_add_route = routes::make_friend_add_route(environment.clone());
        let friend_remove_route = routes::make_friend_remove_route(environment.clone());
        let genres_list_route = routes::make_genres_list_route(environment.clone());
        let genre_retrieve_route = routes::make_genre_retrieve_route(environment.clone());
        let ratings_list_route = routes::make_ratings_list_route(environment.clone());
        let rating_retrieve_route = routes::make_rating_retrieve_route(environment.clone());

        let routes = films_list_route
            .or(film_create_route)
            .or(film_update_route)
            .or(popular_route)
            .or(film_retrieve_route)
            .or(film_delete_route)
            .or(like_route)
            .or(unlike_route)
            .or(users_list_route)
            .or(user_create_route)
            .or(user_update_route)
            .or(common_friends_route)
            .or(friends_list_route)
            .or(friend_add_route)
            .or(friend_remove_route)
            .or(user_retrieve_route)
            .or(user_delete_route)
            .or(genres_list_route)
            .or(genre_retrieve_route)
            .or(ratings_list_route)
            .or(rating_retrieve_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
