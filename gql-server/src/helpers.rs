// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    let verbose = matches!(std::env::var("GQL_VERBOSE"), Ok(v) if !v.is_empty());
    let server_level = if verbose { LevelFilter::TRACE } else { LevelFilter::INFO };
    let paging_level = if verbose { LevelFilter::TRACE } else { LevelFilter::DEBUG };
    let filter = tracing_subscriber::filter::Targets::new()
        .with_target("gql_server", server_level)
        .with_target("data_loader", paging_level)
        .with_target("blockchain_api", paging_level)
        .with_target("paging", paging_level)
        .with_target("sqlx", LevelFilter::OFF);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
