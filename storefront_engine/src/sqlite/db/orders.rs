use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Row, SqliteConnection};

use crate::{
    db_types::{Decision, DecisionActor, NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
    traits::OrderStoreError,
};

const ORDER_COLUMNS: &str = "id, buyer_id, product_id, quantity, unit_price, total_price, status, payment_reference, \
                             created_at, decided_at, decided_by";

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let decided_by = row
            .try_get::<Option<String>, _>("decided_by")?
            .map(|s| s.parse::<DecisionActor>())
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "decided_by".into(), source: Box::new(e) })?;
        let order = Order {
            id: row.try_get("id")?,
            buyer_id: row.try_get("buyer_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total_price: row.try_get("total_price")?,
            status: row.try_get("status")?,
            payment_reference: row.try_get("payment_reference")?,
            created_at: row.try_get("created_at")?,
            decided_at: row.try_get("decided_at")?,
            decided_by,
        };
        order
            .check_decision_fields()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "status".into(), source: Box::new(e) })?;
        Ok(order)
    }
}

/// Inserts a new pending order. Fails with [`OrderStoreError::DuplicatePaymentReference`] if the payment reference is
/// already bound to another order.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let reference = order.payment_reference.clone();
    let sql = format!(
        r#"
            INSERT INTO orders (
                buyer_id,
                product_id,
                quantity,
                unit_price,
                total_price,
                payment_reference,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let result = sqlx::query_as::<_, Order>(&sql)
        .bind(order.buyer_id)
        .bind(order.product_id)
        .bind(order.quantity)
        .bind(order.unit_price)
        .bind(order.total_price)
        .bind(order.payment_reference)
        .bind(order.created_at)
        .fetch_one(conn)
        .await;
    match result {
        Ok(order) => {
            debug!("🗃️ Order {} inserted for reference {reference}", order.id);
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderStoreError::DuplicatePaymentReference(reference))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1");
    let order = sqlx::query_as(&sql).bind(reference).fetch_optional(conn).await?;
    Ok(order)
}

/// Closes the order if, and only if, it is still pending.
///
/// The status guard lives in the `UPDATE` itself, so of two racing writers exactly one sees a returned row. The loser
/// reads back the winner's record and reports `false`.
pub async fn decide_order(
    id: OrderId,
    decision: Decision,
    actor: DecisionActor,
    decided_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), OrderStoreError> {
    let sql = format!(
        r#"
            UPDATE orders SET status = $1, decided_at = $2, decided_by = $3
            WHERE id = $4 AND status = 'pending'
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let updated: Option<Order> = sqlx::query_as(&sql)
        .bind(decision.status())
        .bind(decided_at)
        .bind(actor.to_string())
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(order) = updated {
        trace!("🗃️ Order {id} is now {} (by {actor})", order.status);
        return Ok((order, true));
    }
    match fetch_order(id, conn).await? {
        Some(order) => {
            trace!("🗃️ Order {id} was already {}. {decision} by {actor} ignored", order.status);
            Ok((order, false))
        },
        None => Err(OrderStoreError::OrderNotFound(id)),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    if let Some(reference) = query.payment_reference {
        where_clause.push("payment_reference = ");
        where_clause.push_bind_unseparated(reference);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}
