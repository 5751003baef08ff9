// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use async_graphql::dataloader::DataLoader;
use async_graphql::http::GraphiQLSource;
use async_graphql::EmptyMutation;
use async_graphql::EmptySubscription;
use async_graphql::Schema;
use async_graphql_warp::GraphQLBadRequest;
use async_graphql_warp::GraphQLResponse;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::time;
use tokio_util::sync::CancellationToken;
use warp::http::Response as HttpResponse;
use warp::http::StatusCode;
use warp::Filter;
use warp::Rejection;

use crate::config::ServerConfig;
use crate::defaults;
use crate::schema::db::DBConnector;
use crate::schema::graphql::loader::BlockTransactionsLoader;
use crate::schema::graphql::ApiState;
use crate::schema::graphql::QueryRoot;

pub type ApiSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub async fn open_db(db_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("DB url: {db_url}"))?
        .create_if_missing(true);
    let mut interval = time::interval(time::Duration::from_secs(defaults::DB_CONNECT_INTERVAL));
    let mut attempt: u16 = 0;
    let pool = loop {
        interval.tick().await;

        let res = SqlitePoolOptions::new()
            .max_connections(defaults::MAX_POOL_CONNECTIONS)
            .connect_with(options.clone())
            .await
            .with_context(|| format!("DB file: {db_url}"));

        match res {
            Ok(pool) => break pool,
            Err(err) => {
                if attempt + 1 >= defaults::DB_CONNECT_ATTEMPTS {
                    anyhow::bail!("Failed to open DB file {}: timeout", db_url);
                } else {
                    tracing::error!(target: "gql_server", "{err:?}")
                }
            }
        }

        attempt += 1;
    };

    Ok(pool)
}

pub fn build_schema(state: ApiState) -> ApiSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(DataLoader::new(BlockTransactionsLoader::new(state.clone()), tokio::spawn))
        .data(state)
        .with_sorted_fields()
        .finish()
}

pub async fn start(
    bind_to: String,
    db_url: String,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let pool = open_db(&db_url).await?;
    let connector = DBConnector::new(pool);
    connector.apply_schema().await.context("Failed to apply DB schema")?;
    let socket_addr = bind_to.parse::<SocketAddr>()?;

    let state = ApiState::new(connector, config.paging, shutdown.clone());
    let schema = build_schema(state);

    let graphiql = warp::path!("graphql").and(warp::get()).map(|| {
        HttpResponse::builder()
            .header("content-type", "text/html")
            .body(GraphiQLSource::build().endpoint("/graphql").finish())
    });

    let graphql_post = async_graphql_warp::graphql(schema).and_then(
        |(schema, request): (ApiSchema, async_graphql::Request)| async move {
            Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
        },
    );

    let routes = graphql_post.or(graphiql).recover(|err: Rejection| async move {
        if let Some(GraphQLBadRequest(err)) = err.find() {
            return Ok::<_, Infallible>(warp::reply::with_status(
                err.to_string(),
                StatusCode::BAD_REQUEST,
            ));
        }

        Ok(warp::reply::with_status(
            "INTERNAL_SERVER_ERROR".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    });

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(socket_addr, async move { shutdown.cancelled().await })
        .with_context(|| format!("Failed to bind {bind_to}"))?;
    tracing::info!(target: "gql_server", "Listening on: {addr}");
    server.await;
    tracing::info!(target: "gql_server", "Server stopped");

    Ok(())
}
