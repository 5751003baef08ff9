// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::connection::Connection;
use async_graphql::connection::ConnectionNameType;
use async_graphql::connection::Edge;
use async_graphql::connection::EdgeNameType;
use async_graphql::connection::EmptyFields;
use async_graphql::OutputType;
use async_graphql::SimpleObject;
use paging_engine::Page;

/// Page metadata shown next to `pageInfo`.
#[derive(SimpleObject, Debug, Clone, Default)]
pub struct PageFields {
    /// Number of items matching the filters, when requested.
    pub total_count: Option<i64>,
    /// 1-based index of this page; set when relative cursors are enabled.
    pub page_index: Option<i64>,
}

pub type PageConnection<Node, Name, EdgeName> =
    Connection<String, Node, PageFields, EmptyFields, Name, EdgeName>;

pub fn page_connection<T, Node, Name, EdgeName, F>(
    page: Page<T>,
    node: F,
) -> PageConnection<Node, Name, EdgeName>
where
    Node: OutputType,
    Name: ConnectionNameType,
    EdgeName: EdgeNameType,
    F: FnMut(T) -> Node,
{
    let fields = PageFields {
        total_count: page.total_count().map(|total| total as i64),
        page_index: page.page_index().map(|index| index as i64),
    };
    let mut connection =
        Connection::with_additional_fields(page.has_previous_page(), page.has_next_page(), fields);

    let cursors = page.edges().map(|(_, cursor)| cursor).collect::<Vec<_>>();
    connection.edges.extend(page.into_items().into_iter().map(node).zip(cursors).map(
        |(node, cursor)| {
            let edge: Edge<String, Node, EmptyFields, EdgeName> =
                Edge::with_additional_fields(cursor, node, EmptyFields);
            edge
        },
    ));
    connection
}

pub struct BlocksConnection;

impl ConnectionNameType for BlocksConnection {
    fn type_name<T: OutputType>() -> String {
        "BlocksConnection".to_string()
    }
}

pub struct BlocksEdge;

impl EdgeNameType for BlocksEdge {
    fn type_name<T: OutputType>() -> String {
        "BlocksEdge".to_string()
    }
}

pub struct TransactionsConnection;

impl ConnectionNameType for TransactionsConnection {
    fn type_name<T: OutputType>() -> String {
        "TransactionsConnection".to_string()
    }
}

pub struct TransactionsEdge;

impl EdgeNameType for TransactionsEdge {
    fn type_name<T: OutputType>() -> String {
        "TransactionsEdge".to_string()
    }
}
