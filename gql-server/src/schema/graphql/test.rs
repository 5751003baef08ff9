// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use paging_engine::PagingConfig;
    use paging_engine::PlannedQuery;
    use paging_engine::QueryKind;
    use parking_lot::Mutex;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio_util::sync::CancellationToken;

    use crate::schema::db::DBConnector;
    use crate::schema::graphql::paging_arguments;
    use crate::schema::graphql::ApiState;
    use crate::web::build_schema;
    use crate::web::ApiSchema;

    async fn seeded() -> (ApiSchema, Arc<Mutex<Vec<QueryKind>>>) {
        let pool =
            SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        let connector = DBConnector::new(pool);
        connector.apply_schema().await.unwrap();

        // Block `bK` has seq_no K and K transactions with lt K1..KK.
        for seq in 1..=5i64 {
            let producer = if seq % 2 == 0 { "p2" } else { "p1" };
            sqlx::query(
                "INSERT INTO blocks (id, seq_no, gen_utime, producer_id, tr_count) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(format!("b{seq}"))
            .bind(seq)
            .bind(1_700_000_000 + seq)
            .bind(producer)
            .bind(seq)
            .execute(connector.pool())
            .await
            .unwrap();
            for i in 1..=seq {
                sqlx::query(
                    "INSERT INTO transactions (id, block_id, account_addr, lt, balance_delta, aborted, now) VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(format!("t{seq}-{i}"))
                .bind(format!("b{seq}"))
                .bind(format!("a{}", i % 2))
                .bind(seq * 10 + i)
                .bind(i)
                .bind(false)
                .bind(1_700_000_000 + seq)
                .execute(connector.pool())
                .await
                .unwrap();
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let state = ApiState::new(connector, PagingConfig::default(), CancellationToken::new())
            .with_interceptor(Arc::new(move |query: &PlannedQuery| sink.lock().push(query.kind)));
        (build_schema(state), seen)
    }

    async fn execute(schema: &ApiSchema, query: &str) -> serde_json::Value {
        serde_json::to_value(schema.execute(query).await).unwrap()
    }

    fn seq_nos(response: &serde_json::Value) -> Vec<i64> {
        response["data"]["blocks"]["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|edge| edge["node"]["seqNo"].as_i64().unwrap())
            .collect()
    }

    fn error_code(response: &serde_json::Value) -> &str {
        response["errors"][0]["extensions"]["code"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_blocks_forward_pages() {
        let (schema, _) = seeded().await;
        let first = execute(
            &schema,
            "{ blocks(first: 2, withTotalCount: true) { totalCount pageInfo { hasNextPage hasPreviousPage endCursor } edges { node { seqNo } } } }",
        )
        .await;
        assert_eq!(seq_nos(&first), vec![1, 2]);
        let blocks = &first["data"]["blocks"];
        assert_eq!(blocks["totalCount"], json!(5));
        assert_eq!(blocks["pageInfo"]["hasNextPage"], json!(true));
        assert_eq!(blocks["pageInfo"]["hasPreviousPage"], json!(false));

        let cursor = blocks["pageInfo"]["endCursor"].as_str().unwrap();
        let second = execute(
            &schema,
            &format!(
                "{{ blocks(first: 2, after: \"{cursor}\") {{ pageInfo {{ hasNextPage hasPreviousPage }} edges {{ node {{ seqNo }} }} }} }}"
            ),
        )
        .await;
        assert_eq!(seq_nos(&second), vec![3, 4]);
        assert_eq!(second["data"]["blocks"]["pageInfo"]["hasPreviousPage"], json!(true));
    }

    #[tokio::test]
    async fn test_blocks_last_with_filters_and_order() {
        let (schema, _) = seeded().await;
        let last = execute(
            &schema,
            "{ blocks(last: 2) { pageInfo { hasNextPage hasPreviousPage } edges { node { seqNo } } } }",
        )
        .await;
        assert_eq!(seq_nos(&last), vec![4, 5]);
        assert_eq!(last["data"]["blocks"]["pageInfo"]["hasPreviousPage"], json!(true));
        assert_eq!(last["data"]["blocks"]["pageInfo"]["hasNextPage"], json!(false));

        let filtered = execute(
            &schema,
            r#"{ blocks(producerId: "p1", orderBy: [{ path: "seq_no", direction: DESC }]) { edges { node { seqNo } } } }"#,
        )
        .await;
        assert_eq!(seq_nos(&filtered), vec![5, 3, 1]);

        let ranged =
            execute(&schema, "{ blocks(minTrCount: 2, maxTrCount: 4) { edges { node { seqNo } } } }")
                .await;
        assert_eq!(seq_nos(&ranged), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_blocks_relative_cursors() {
        let (schema, _) = seeded().await;
        let response = execute(
            &schema,
            "{ blocks(first: 2, relativeCursors: true) { totalCount pageIndex edges { node { seqNo } } } }",
        )
        .await;
        assert_eq!(response["data"]["blocks"]["pageIndex"], json!(1));
        assert_eq!(response["data"]["blocks"]["totalCount"], json!(5));

        let response =
            execute(&schema, "{ blocks(first: 2) { totalCount pageIndex edges { node { seqNo } } } }")
                .await;
        assert_eq!(response["data"]["blocks"]["pageIndex"], json!(null));
        assert_eq!(response["data"]["blocks"]["totalCount"], json!(null));
    }

    #[tokio::test]
    async fn test_transactions_by_account() {
        let (schema, _) = seeded().await;
        let response = execute(
            &schema,
            r#"{ transactions(accountAddr: "a1", first: 3, withTotalCount: true) { totalCount edges { node { lt } } } }"#,
        )
        .await;
        let lts = response["data"]["transactions"]["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|edge| edge["node"]["lt"].as_i64().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(lts, vec![11, 21, 31]);
        assert_eq!(response["data"]["transactions"]["totalCount"], json!(9));
    }

    #[tokio::test]
    async fn test_error_codes() {
        let (schema, seen) = seeded().await;
        let response = execute(&schema, "{ blocks(first: 0) { edges { cursor } } }").await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");

        let response = execute(&schema, "{ blocks(first: 1, last: 1) { edges { cursor } } }").await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");

        let response =
            execute(&schema, r#"{ blocks(first: 1, after: "%%%") { edges { cursor } } }"#).await;
        assert_eq!(error_code(&response), "INVALID_CURSOR");

        let response = execute(
            &schema,
            r#"{ blocks(orderBy: [{ path: "nope" }]) { edges { cursor } } }"#,
        )
        .await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");

        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_block_transactions_are_batched() {
        let (schema, seen) = seeded().await;
        let response = execute(
            &schema,
            "{ blocks(first: 5) { edges { node { id transactions(first: 2, withTotalCount: true) { totalCount pageInfo { hasNextPage } edges { node { lt } } } } } } }",
        )
        .await;
        assert!(response.get("errors").is_none(), "{response}");

        let edges = response["data"]["blocks"]["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 5);
        for (index, edge) in edges.iter().enumerate() {
            let seq = index as i64 + 1;
            let transactions = &edge["node"]["transactions"];
            let lts = transactions["edges"]
                .as_array()
                .unwrap()
                .iter()
                .map(|edge| edge["node"]["lt"].as_i64().unwrap())
                .collect::<Vec<_>>();
            let expected = (1..=seq.min(2)).map(|i| seq * 10 + i).collect::<Vec<_>>();
            assert_eq!(lts, expected);
            assert_eq!(transactions["totalCount"], json!(seq));
            assert_eq!(transactions["pageInfo"]["hasNextPage"], json!(seq > 2));
        }

        assert_eq!(*seen.lock(), vec![QueryKind::Page, QueryKind::GroupCount, QueryKind::Page]);
    }

    #[tokio::test]
    async fn test_block_transactions_last() {
        let (schema, seen) = seeded().await;
        let response = execute(
            &schema,
            "{ blocks(first: 5) { edges { node { transactions(last: 2) { pageInfo { hasPreviousPage hasNextPage } edges { node { lt } } } } } } }",
        )
        .await;
        assert!(response.get("errors").is_none(), "{response}");

        let edges = response["data"]["blocks"]["edges"].as_array().unwrap();
        for (index, edge) in edges.iter().enumerate() {
            let seq = index as i64 + 1;
            let transactions = &edge["node"]["transactions"];
            let lts = transactions["edges"]
                .as_array()
                .unwrap()
                .iter()
                .map(|edge| edge["node"]["lt"].as_i64().unwrap())
                .collect::<Vec<_>>();
            let expected = ((seq - 1).max(1)..=seq).map(|i| seq * 10 + i).collect::<Vec<_>>();
            assert_eq!(lts, expected);
            assert_eq!(transactions["pageInfo"]["hasPreviousPage"], json!(seq > 2));
            assert_eq!(transactions["pageInfo"]["hasNextPage"], json!(false));
        }
        assert_eq!(*seen.lock(), vec![QueryKind::Page, QueryKind::Page]);
    }

    #[test]
    fn test_empty_cursors_are_ignored() {
        let arguments = paging_arguments(
            Some(5),
            Some(String::new()),
            None,
            Some("abc".into()),
            None,
            Some(true),
        );
        assert_eq!(arguments.first, Some(5));
        assert_eq!(arguments.after, None);
        assert_eq!(arguments.before.as_deref(), Some("abc"));
        assert!(!arguments.include_total_count);
        assert!(arguments.enable_relative_cursors);
    }
}
