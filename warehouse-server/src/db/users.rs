//! Login accounts

use rand::Rng;
use rand::distributions::Alphanumeric;
use shared::models::{Role, User};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::auth::password::hash_password;

/// Accounts created on first start, with the env var holding each password
const SEED_ACCOUNTS: [(&str, Role, &str); 4] = [
    ("supervisor", Role::Supervisor, "SEED_PASSWORD_SUPERVISOR"),
    ("leader", Role::Leader, "SEED_PASSWORD_LEADER"),
    ("admin.inbound", Role::AdminInbound, "SEED_PASSWORD_ADMIN_INBOUND"),
    ("admin.inventory", Role::AdminInventory, "SEED_PASSWORD_ADMIN_INVENTORY"),
];

pub async fn list(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count as u64)
}

/// Insert a new account. A taken username is `RepoError::Duplicate`.
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    role: Role,
) -> RepoResult<User> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        role: role.as_str().to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

pub async fn update_role(pool: &SqlitePool, id: i64, role: Role) -> RepoResult<()> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

/// Hard delete
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

/// Create the default accounts when the table is empty
///
/// Returns the number of accounts created. Passwords come from the
/// `SEED_PASSWORD_*` variables; a missing one is replaced by a random
/// password that is logged once.
pub async fn seed_default_users(pool: &SqlitePool) -> RepoResult<u64> {
    seed_with(pool, |var| std::env::var(var).ok()).await
}

pub(crate) async fn seed_with(
    pool: &SqlitePool,
    lookup: impl Fn(&str) -> Option<String>,
) -> RepoResult<u64> {
    if count(pool).await? > 0 {
        return Ok(0);
    }

    let mut created = 0;
    for (username, role, var) in SEED_ACCOUNTS {
        let password = match lookup(var).filter(|p| !p.is_empty()) {
            Some(password) => password,
            None => {
                let generated = random_password();
                tracing::warn!(
                    username,
                    password = %generated,
                    "{var} not set, generated password for seeded account"
                );
                generated
            }
        };

        let hash = hash_password(&password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
        create(pool, username, &hash, role).await?;
        created += 1;
    }

    tracing::info!(created, "Seeded default user accounts");
    Ok(created)
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}
