use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT id, name, description, price, in_stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(product)
}

/// Catalogue maintenance lives outside the storefront core. This is used to seed databases.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, in_stock) VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, in_stock;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.in_stock)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product #{} ({}) inserted", product.id, product.name);
    Ok(product)
}
