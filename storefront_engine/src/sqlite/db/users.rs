use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewUser, Role, User};

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT id, email, name, role FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// User records are created by the sign-in flow. This is used to seed databases.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (email, name, role) VALUES ($1, $2, $3)
            RETURNING id, email, name, role;
        "#,
    )
    .bind(user.email)
    .bind(user.name)
    .bind(user.role)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User #{} inserted with role {}", user.id, user.role);
    Ok(user)
}

/// Returns the number of rows changed: 0 if the user does not exist.
pub async fn set_role(id: i64, role: Role, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2").bind(role).bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}
