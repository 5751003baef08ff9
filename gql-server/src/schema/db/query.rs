// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use futures::TryStreamExt;
use paging_engine::ArgumentError;
use paging_engine::Direction;
use paging_engine::GroupKey;
use paging_engine::GroupKeySpec;
use paging_engine::GroupedQuery;
use paging_engine::KeysetBound;
use paging_engine::KeysetPredicate;
use paging_engine::OrderKey;
use paging_engine::OrderSpec;
use paging_engine::PageQuery;
use paging_engine::ProjectionKey;
use paging_engine::Value;
use sqlx::sqlite::SqliteArguments;
use sqlx::sqlite::SqliteRow;
use sqlx::Arguments;
use sqlx::FromRow;
use sqlx::Row;
use sqlx::TypeInfo;
use sqlx::ValueRef;

use crate::schema::db::DBConnector;
use crate::schema::db::Table;

const TOTAL_COUNT_COLUMN: &str = "__total_count";
const ROW_NUMBER_COLUMN: &str = "__row_number";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
}

impl FilterOp {
    fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ge => ">=",
            FilterOp::Le => "<=",
        }
    }
}

#[derive(Debug, Clone)]
struct Condition {
    column: String,
    op: FilterOp,
    value: Value,
}

/// SQL text with its positional bind values.
#[derive(Debug, Clone, Default)]
struct Compiled {
    sql: String,
    binds: Vec<Value>,
}

impl Compiled {
    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_bind(&mut self, value: Value) {
        self.sql.push('?');
        self.binds.push(value);
    }

    fn append(&mut self, other: Compiled) {
        self.sql.push_str(&other.sql);
        self.binds.extend(other.binds);
    }
}

/// Query over the rows of `T`, compiled to one SQLite statement.
///
/// Every column name is checked against `T::columns()` before it reaches the
/// SQL text; all values are bound.
pub struct SqliteQuery<T> {
    connector: Arc<DBConnector>,
    filters: Vec<Condition>,
    group_keys: Option<(String, Vec<Value>)>,
    order: Vec<OrderKey>,
    predicates: Vec<KeysetPredicate>,
    skip: usize,
    take: Option<usize>,
    grouping: Option<String>,
    page_sql: OnceLock<Compiled>,
    counted_sql: OnceLock<Compiled>,
    _row: PhantomData<fn() -> T>,
}

impl<T: Table> SqliteQuery<T> {
    pub fn new(connector: Arc<DBConnector>) -> Self {
        Self {
            connector,
            filters: Vec::new(),
            group_keys: None,
            order: Vec::new(),
            predicates: Vec::new(),
            skip: 0,
            take: None,
            grouping: None,
            page_sql: OnceLock::new(),
            counted_sql: OnceLock::new(),
            _row: PhantomData,
        }
    }

    pub fn filter(
        mut self,
        column: &str,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Result<Self, ArgumentError> {
        let column = checked_column::<T>(column)?;
        self.filters.push(Condition { column, op, value: value.into() });
        Ok(self.invalidate())
    }

    pub fn order_by(mut self, key: OrderKey) -> Result<Self, ArgumentError> {
        checked_column::<T>(&key.field)?;
        self.order.push(key);
        Ok(self.invalidate())
    }

    /// Orders by `keys`, then by the table's unique id when it is missing.
    pub fn order_by_total(self, keys: Vec<OrderKey>) -> Result<Self, ArgumentError> {
        let appends_id = !keys.iter().any(|key| key.field == T::ID);
        let mut query = self;
        for key in keys {
            query = query.order_by(key)?;
        }
        if appends_id {
            query = query.order_by(OrderKey::asc(T::ID))?;
        }
        Ok(query)
    }

    fn invalidate(mut self) -> Self {
        self.page_sql = OnceLock::new();
        self.counted_sql = OnceLock::new();
        self
    }

    fn compiled(&self, with_total: bool) -> &Compiled {
        if with_total {
            self.counted_sql.get_or_init(|| self.compile(true))
        } else {
            self.page_sql.get_or_init(|| self.compile(false))
        }
    }

    /// `WHERE` body shared by the page and count statements: filters and
    /// parent keys, without keyset predicates.
    fn base_condition(&self) -> Compiled {
        let mut parts = Vec::new();
        for condition in &self.filters {
            let mut part = Compiled::default();
            part.push(&format!("{} {} ", condition.column, condition.op.as_sql()));
            part.push_bind(condition.value.clone());
            parts.push(part);
        }
        if let Some((column, keys)) = &self.group_keys {
            let mut part = Compiled::default();
            part.push(&format!("{column} IN ("));
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    part.push(", ");
                }
                part.push_bind(key.clone());
            }
            part.push(")");
            parts.push(part);
        }
        join_conditions(parts)
    }

    fn compile(&self, with_total: bool) -> Compiled {
        let table = T::TABLE;
        let base = self.base_condition();
        let order = order_clause(&self.order);

        let mut conditions = Vec::with_capacity(1 + self.predicates.len());
        if !base.sql.is_empty() {
            conditions.push(base.clone());
        }
        conditions.extend(self.predicates.iter().map(keyset_condition));
        let filter = join_conditions(conditions);

        let mut select = Compiled::default();
        select.push("SELECT *");
        if with_total {
            select.push(&format!(", (SELECT COUNT(*) FROM {table}"));
            if !base.sql.is_empty() {
                select.push(" WHERE ");
                select.append(base);
            }
            select.push(&format!(") AS {TOTAL_COUNT_COLUMN}"));
        }
        if let Some(group) = &self.grouping {
            select.push(&format!(
                ", ROW_NUMBER() OVER (PARTITION BY {group}{}) AS {ROW_NUMBER_COLUMN}",
                order.as_deref().map(|order| format!(" ORDER BY {order}")).unwrap_or_default()
            ));
        }
        select.push(&format!(" FROM {table}"));
        if !filter.sql.is_empty() {
            select.push(" WHERE ");
            select.append(filter);
        }

        match &self.grouping {
            None => {
                if let Some(order) = &order {
                    select.push(&format!(" ORDER BY {order}"));
                }
                match (self.take, self.skip) {
                    (Some(take), skip) => select.push(&format!(" LIMIT {take} OFFSET {skip}")),
                    (None, 0) => {}
                    (None, skip) => select.push(&format!(" LIMIT -1 OFFSET {skip}")),
                }
                select
            }
            Some(group) => {
                let mut windowed = Compiled::default();
                windowed.push("SELECT * FROM (");
                windowed.append(select);
                windowed.push(&format!(") WHERE {ROW_NUMBER_COLUMN} > {}", self.skip));
                if let Some(take) = self.take {
                    let end = self.skip.saturating_add(take);
                    windowed.push(&format!(" AND {ROW_NUMBER_COLUMN} <= {end}"));
                }
                windowed.push(&format!(" ORDER BY {group}, {ROW_NUMBER_COLUMN}"));
                windowed
            }
        }
    }

    fn compile_group_count<K: GroupKey>(
        &self,
        group: &GroupKeySpec,
    ) -> Result<Compiled, ArgumentError> {
        let column = checked_column::<T>(&group.field)?;
        let projection = self
            .connector
            .group_counts()
            .get_or_insert_with(ProjectionKey::of::<K, T>(&column), || {
                group_count_projection::<T>(&column)
            });
        Ok(self.group_count_statement(&column, &projection))
    }

    fn group_count_statement(&self, column: &str, projection: &str) -> Compiled {
        let mut compiled = Compiled::default();
        compiled.push(projection);
        let base = self.base_condition();
        if !base.sql.is_empty() {
            compiled.push(" WHERE ");
            compiled.append(base);
        }
        compiled.push(&format!(" GROUP BY {column}"));
        compiled
    }
}

fn group_count_projection<T: Table>(column: &str) -> String {
    format!("SELECT {column}, COUNT(*) FROM {}", T::TABLE)
}

fn checked_column<T: Table>(name: &str) -> Result<String, ArgumentError> {
    if T::has_column(name) {
        Ok(name.to_string())
    } else {
        Err(ArgumentError::UnknownField(name.to_string()))
    }
}

fn join_conditions(parts: Vec<Compiled>) -> Compiled {
    let mut joined = Compiled::default();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            joined.push(" AND ");
        }
        joined.push("(");
        joined.append(part);
        joined.push(")");
    }
    joined
}

fn order_clause(order: &[OrderKey]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let keys = order
        .iter()
        .map(|key| format!("{} {}", key.field, key.direction.as_sql()))
        .collect::<Vec<_>>();
    Some(keys.join(", "))
}

/// Expands "tuple after/before the cursor" into
/// `(a > ?) OR (a = ? AND b < ?) OR ...` with the operator of each key
/// following its direction.
fn keyset_condition(predicate: &KeysetPredicate) -> Compiled {
    let keys = predicate.order.keys();
    let mut compiled = Compiled::default();
    for i in 0..keys.len() {
        if i > 0 {
            compiled.push(" OR ");
        }
        compiled.push("(");
        for (key, value) in keys.iter().zip(&predicate.values).take(i) {
            compiled.push(&format!("{} = ", key.field));
            compiled.push_bind(value.clone());
            compiled.push(" AND ");
        }
        let key = &keys[i];
        let op = match (predicate.bound, key.direction) {
            (KeysetBound::After, Direction::Ascending)
            | (KeysetBound::Before, Direction::Descending) => ">",
            (KeysetBound::After, Direction::Descending)
            | (KeysetBound::Before, Direction::Ascending) => "<",
        };
        compiled.push(&format!("{} {op} ", key.field));
        compiled.push_bind(predicate.values.get(i).cloned().unwrap_or(Value::Null));
        compiled.push(")");
    }
    compiled
}

fn arguments<'q>(binds: &[Value]) -> anyhow::Result<SqliteArguments<'q>> {
    let mut arguments = SqliteArguments::default();
    for value in binds {
        match value {
            Value::Null => arguments.add(Option::<i64>::None),
            Value::Bool(v) => arguments.add(*v),
            Value::Int(v) => arguments.add(*v),
            Value::Float(v) => arguments.add(*v),
            Value::Text(v) => arguments.add(v.clone()),
            Value::Bytes(v) => arguments.add(v.clone()),
            Value::Timestamp(v) => arguments.add(v.to_rfc3339()),
        }
        .map_err(|err| anyhow::format_err!("failed to bind {value}: {err}"))?;
    }
    Ok(arguments)
}

/// Reads column `index` by its storage class.
fn column_value(row: &SqliteRow, index: usize) -> anyhow::Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();
    Ok(match storage.as_str() {
        "INTEGER" => Value::Int(row.try_get(index)?),
        "REAL" => Value::Float(row.try_get(index)?),
        "BLOB" => Value::Bytes(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    })
}

impl<T: Table> PageQuery for SqliteQuery<T> {
    type Item = T;

    fn ordering(&self) -> &[OrderKey] {
        &self.order
    }

    fn with_predicate(mut self, predicate: KeysetPredicate) -> Result<Self, ArgumentError> {
        for field in predicate.order.fields() {
            checked_column::<T>(field)?;
        }
        self.predicates.push(predicate);
        Ok(self.invalidate())
    }

    fn with_order(mut self, order: OrderSpec) -> Result<Self, ArgumentError> {
        for field in order.fields() {
            checked_column::<T>(field)?;
        }
        self.order = order.keys().to_vec();
        Ok(self.invalidate())
    }

    fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self.invalidate()
    }

    fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self.invalidate()
    }

    fn describe(&self) -> String {
        self.compiled(false).sql.clone()
    }

    fn describe_with_total(&self) -> String {
        self.compiled(true).sql.clone()
    }

    fn fetch(&self) -> BoxStream<'_, anyhow::Result<T>> {
        let compiled = self.compiled(false);
        tracing::trace!(target: "blockchain_api", "SQL: {}", compiled.sql);
        let arguments = match arguments(&compiled.binds) {
            Ok(arguments) => arguments,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };
        sqlx::query_as_with::<_, T, _>(&compiled.sql, arguments)
            .fetch(self.connector.pool())
            .map_err(anyhow::Error::from)
            .boxed()
    }

    fn fetch_with_total(&self) -> BoxStream<'_, anyhow::Result<(usize, T)>> {
        let compiled = self.compiled(true);
        tracing::trace!(target: "blockchain_api", "SQL: {}", compiled.sql);
        let arguments = match arguments(&compiled.binds) {
            Ok(arguments) => arguments,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };
        sqlx::query_with(&compiled.sql, arguments)
            .fetch(self.connector.pool())
            .map(|row| -> anyhow::Result<(usize, T)> {
                let row = row?;
                let total: i64 = row.try_get(TOTAL_COUNT_COLUMN)?;
                Ok((usize::try_from(total)?, T::from_row(&row)?))
            })
            .boxed()
    }
}

#[async_trait]
impl<T: Table> GroupedQuery for SqliteQuery<T> {
    fn with_grouping(mut self, group: &GroupKeySpec) -> Result<Self, ArgumentError> {
        self.grouping = Some(checked_column::<T>(&group.field)?);
        Ok(self.invalidate())
    }

    fn with_group_keys(
        mut self,
        group: &GroupKeySpec,
        keys: Vec<Value>,
    ) -> Result<Self, ArgumentError> {
        self.group_keys = Some((checked_column::<T>(&group.field)?, keys));
        Ok(self.invalidate())
    }

    fn describe_group_count(&self, group: &GroupKeySpec) -> String {
        match checked_column::<T>(&group.field) {
            Ok(column) => {
                self.group_count_statement(&column, &group_count_projection::<T>(&column)).sql
            }
            Err(err) => err.to_string(),
        }
    }

    async fn count_groups<K: GroupKey>(
        &self,
        group: &GroupKeySpec,
    ) -> anyhow::Result<HashMap<K, usize>> {
        let compiled = self.compile_group_count::<K>(group)?;
        tracing::trace!(target: "blockchain_api", "SQL: {}", compiled.sql);
        let rows = sqlx::query_with(&compiled.sql, arguments(&compiled.binds)?)
            .fetch_all(self.connector.pool())
            .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let key = K::try_from(column_value(row, 0)?)?;
            let count: i64 = row.try_get(1)?;
            counts.insert(key, usize::try_from(count)?);
        }
        Ok(counts)
    }
}

impl<T: Table> fmt::Debug for SqliteQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteQuery")
            .field("table", &T::TABLE)
            .field("sql", &self.compiled(false).sql)
            .finish()
    }
}
