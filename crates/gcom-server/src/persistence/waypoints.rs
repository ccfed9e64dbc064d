//! Waypoint persistence operations.

use gcom_core::models::{EntityId, Waypoint};
use sqlx::SqlitePool;

use crate::errors::{EntityKind, StoreError};

type Result<T> = std::result::Result<T, StoreError>;

const KIND: EntityKind = EntityKind::Waypoint;

/// Store a new waypoint, or find the stored duplicate.
///
/// The waypoint must be unpersisted. Returns the waypoint carrying its
/// assigned id; when an identical waypoint already exists its id is reused
/// and nothing is written.
pub async fn create_waypoint(pool: &SqlitePool, waypoint: &Waypoint) -> Result<Waypoint> {
    if let EntityId::Persisted(id) = waypoint.id {
        tracing::error!("Refusing to create waypoint '{}' with id {}", waypoint.name, id);
        return Err(StoreError::NonSentinelIdentifier { kind: KIND, id });
    }

    insert_or_find(pool, waypoint)
        .await
        .inspect_err(|err| tracing::error!("Failed to create waypoint '{}': {}", waypoint.name, err))
}

async fn insert_or_find(pool: &SqlitePool, waypoint: &Waypoint) -> Result<Waypoint> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO waypoints (name, longitude, latitude, altitude)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&waypoint.name)
    .bind(waypoint.longitude)
    .bind(waypoint.latitude)
    .bind(waypoint.altitude)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let (id,): (i64,) = sqlx::query_as(
        "SELECT id FROM waypoints WHERE name = ?1 AND longitude = ?2 AND latitude = ?3 AND altitude = ?4",
    )
    .bind(&waypoint.name)
    .bind(waypoint.longitude)
    .bind(waypoint.latitude)
    .bind(waypoint.altitude)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if inserted == 0 {
        tracing::warn!(
            "Waypoint '{}' already registered as {}, reusing it",
            waypoint.name,
            id
        );
    }

    Ok(waypoint.clone().with_id(id))
}

/// Load a waypoint by id.
pub async fn get_waypoint(pool: &SqlitePool, id: EntityId) -> Result<Waypoint> {
    let id = id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let row = sqlx::query_as::<_, WaypointRow>(
        "SELECT id, name, longitude, latitude, altitude FROM waypoints WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to load waypoint {}: {}", id, err))?;

    row.map(Waypoint::from)
        .ok_or(StoreError::NotFound { kind: KIND })
}

/// Load the stored waypoint whose fields (all but id) equal `waypoint`'s.
pub async fn find_waypoint(pool: &SqlitePool, waypoint: &Waypoint) -> Result<Waypoint> {
    let row = sqlx::query_as::<_, WaypointRow>(
        r#"
        SELECT id, name, longitude, latitude, altitude FROM waypoints
        WHERE name = ?1 AND longitude = ?2 AND latitude = ?3 AND altitude = ?4
        "#,
    )
    .bind(&waypoint.name)
    .bind(waypoint.longitude)
    .bind(waypoint.latitude)
    .bind(waypoint.altitude)
    .fetch_optional(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to look up waypoint '{}': {}", waypoint.name, err))?;

    row.map(Waypoint::from)
        .ok_or(StoreError::NotFound { kind: KIND })
}

/// Load by id when `waypoint` is persisted, by its fields otherwise.
pub async fn lookup_waypoint(pool: &SqlitePool, waypoint: &Waypoint) -> Result<Waypoint> {
    match waypoint.id {
        EntityId::Persisted(_) => get_waypoint(pool, waypoint.id).await,
        EntityId::Unpersisted => find_waypoint(pool, waypoint).await,
    }
}

/// Overwrite every field of a stored waypoint.
pub async fn update_waypoint(pool: &SqlitePool, waypoint: &Waypoint) -> Result<()> {
    let id = waypoint
        .id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        "UPDATE waypoints SET name = ?2, longitude = ?3, latitude = ?4, altitude = ?5 WHERE id = ?1",
    )
    .bind(id)
    .bind(&waypoint.name)
    .bind(waypoint.longitude)
    .bind(waypoint.latitude)
    .bind(waypoint.altitude)
    .execute(&mut *tx)
    .await
    .inspect_err(|err| tracing::error!("Failed to update waypoint {}: {}", id, err))?
    .rows_affected();

    if updated == 0 {
        return Err(StoreError::NotFound { kind: KIND });
    }
    tx.commit().await?;
    Ok(())
}

/// Delete a stored waypoint.
pub async fn delete_waypoint(pool: &SqlitePool, id: EntityId) -> Result<()> {
    let id = id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM waypoints WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .inspect_err(|err| tracing::error!("Failed to delete waypoint {}: {}", id, err))?
        .rows_affected();

    if deleted == 0 {
        return Err(StoreError::NotFound { kind: KIND });
    }
    tx.commit().await?;
    Ok(())
}

/// Load all waypoints in insertion order.
pub async fn load_all_waypoints(pool: &SqlitePool) -> Result<Vec<Waypoint>> {
    let rows = sqlx::query_as::<_, WaypointRow>(
        "SELECT id, name, longitude, latitude, altitude FROM waypoints ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to load waypoints: {}", err))?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct WaypointRow {
    id: i64,
    name: String,
    longitude: f64,
    latitude: f64,
    altitude: f64,
}

impl From<WaypointRow> for Waypoint {
    fn from(row: WaypointRow) -> Self {
        Waypoint {
            id: EntityId::Persisted(row.id),
            name: row.name,
            longitude: row.longitude,
            latitude: row.latitude,
            altitude: row.altitude,
        }
    }
}
