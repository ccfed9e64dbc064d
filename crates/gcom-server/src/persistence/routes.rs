//! Competition route persistence operations.

use gcom_core::models::{EntityId, Route};
use sqlx::SqlitePool;

use crate::errors::{EntityKind, StoreError};

type Result<T> = std::result::Result<T, StoreError>;

const KIND: EntityKind = EntityKind::Route;

const ROUTE_COLUMNS: &str =
    "id, number, start_waypoint, end_waypoint, passengers, max_weight, value, remarks, odr";

/// Store a new route, or find the stored duplicate.
///
/// Duplicates are matched on every field but the id and the order. A new
/// route is stored unplanned whatever order it carries; only a recorded
/// plan assigns orders. Returns the route with its assigned id and stored
/// order.
pub async fn create_route(pool: &SqlitePool, route: &Route) -> Result<Route> {
    if let EntityId::Persisted(id) = route.id {
        tracing::error!("Refusing to create route {} with id {}", route.number, id);
        return Err(StoreError::NonSentinelIdentifier { kind: KIND, id });
    }

    insert_or_find(pool, route)
        .await
        .inspect_err(|err| tracing::error!("Failed to create route {}: {}", route.number, err))
}

async fn insert_or_find(pool: &SqlitePool, route: &Route) -> Result<Route> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO routes (number, start_waypoint, end_waypoint, passengers, max_weight, value, remarks, odr)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, -1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(route.number)
    .bind(&route.start_waypoint)
    .bind(&route.end_waypoint)
    .bind(route.passengers)
    .bind(route.max_vehicle_weight)
    .bind(route.value)
    .bind(&route.remarks)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let (id, odr): (i64, i64) = sqlx::query_as(
        r#"
        SELECT id, odr FROM routes
        WHERE number = ?1 AND start_waypoint = ?2 AND end_waypoint = ?3 AND passengers = ?4
        AND max_weight = ?5 AND value = ?6 AND remarks = ?7
        "#,
    )
    .bind(route.number)
    .bind(&route.start_waypoint)
    .bind(&route.end_waypoint)
    .bind(route.passengers)
    .bind(route.max_vehicle_weight)
    .bind(route.value)
    .bind(&route.remarks)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if inserted == 0 {
        tracing::warn!("Route {} already registered as {}, reusing it", route.number, id);
    }

    Ok(Route {
        order: u32::try_from(odr).ok(),
        ..route.clone().with_id(id)
    })
}

/// Load a route by id.
pub async fn get_route(pool: &SqlitePool, id: EntityId) -> Result<Route> {
    let id = id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let row = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {} FROM routes WHERE id = ?1",
        ROUTE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to load route {}: {}", id, err))?;

    row.map(Route::from).ok_or(StoreError::NotFound { kind: KIND })
}

/// Load the stored route whose fields (all but id and order) equal `route`'s.
pub async fn find_route(pool: &SqlitePool, route: &Route) -> Result<Route> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        r#"
        SELECT {} FROM routes
        WHERE number = ?1 AND start_waypoint = ?2 AND end_waypoint = ?3 AND passengers = ?4
        AND max_weight = ?5 AND value = ?6 AND remarks = ?7
        "#,
        ROUTE_COLUMNS
    ))
    .bind(route.number)
    .bind(&route.start_waypoint)
    .bind(&route.end_waypoint)
    .bind(route.passengers)
    .bind(route.max_vehicle_weight)
    .bind(route.value)
    .bind(&route.remarks)
    .fetch_optional(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to look up route {}: {}", route.number, err))?;

    row.map(Route::from).ok_or(StoreError::NotFound { kind: KIND })
}

/// Load by id when `route` is persisted, by its fields otherwise.
pub async fn lookup_route(pool: &SqlitePool, route: &Route) -> Result<Route> {
    match route.id {
        EntityId::Persisted(_) => get_route(pool, route.id).await,
        EntityId::Unpersisted => find_route(pool, route).await,
    }
}

/// Overwrite every field of a stored route, including its order.
pub async fn update_route(pool: &SqlitePool, route: &Route) -> Result<()> {
    let id = route
        .id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE routes SET
            number = ?2, start_waypoint = ?3, end_waypoint = ?4, passengers = ?5,
            max_weight = ?6, value = ?7, remarks = ?8, odr = ?9
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(route.number)
    .bind(&route.start_waypoint)
    .bind(&route.end_waypoint)
    .bind(route.passengers)
    .bind(route.max_vehicle_weight)
    .bind(route.value)
    .bind(&route.remarks)
    .bind(order_column(route.order))
    .execute(&mut *tx)
    .await
    .inspect_err(|err| tracing::error!("Failed to update route {}: {}", id, err))?
    .rows_affected();

    if updated == 0 {
        return Err(StoreError::NotFound { kind: KIND });
    }
    tx.commit().await?;
    Ok(())
}

/// Delete a stored route.
pub async fn delete_route(pool: &SqlitePool, id: EntityId) -> Result<()> {
    let id = id
        .persisted()
        .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;

    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM routes WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .inspect_err(|err| tracing::error!("Failed to delete route {}: {}", id, err))?
        .rows_affected();

    if deleted == 0 {
        return Err(StoreError::NotFound { kind: KIND });
    }
    tx.commit().await?;
    Ok(())
}

/// Load all routes in insertion order.
pub async fn load_all_routes(pool: &SqlitePool) -> Result<Vec<Route>> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {} FROM routes ORDER BY id",
        ROUTE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to load routes: {}", err))?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Replace every stored order with the plan's: planned routes get their
/// position, all others are reset to unplanned.
pub async fn record_route_orders(pool: &SqlitePool, plan: &[Route]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE routes SET odr = -1")
        .execute(&mut *tx)
        .await?;

    for route in plan {
        let id = route
            .id
            .persisted()
            .ok_or(StoreError::UncreatedIdentifier { kind: KIND })?;
        let updated = sqlx::query("UPDATE routes SET odr = ?2 WHERE id = ?1")
            .bind(id)
            .bind(order_column(route.order))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            tracing::error!("Planned route {} vanished before its order was recorded", id);
            return Err(StoreError::NotFound { kind: KIND });
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Remove and return the planned route with the lowest order.
///
/// One statement, so concurrent callers queue on the write lock instead of
/// failing to upgrade a read lock.
pub async fn take_next_route(pool: &SqlitePool) -> Result<Option<Route>> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        r#"
        DELETE FROM routes
        WHERE id = (SELECT id FROM routes WHERE odr >= 0 ORDER BY odr ASC, id ASC LIMIT 1)
        RETURNING {}
        "#,
        ROUTE_COLUMNS
    ))
    .fetch_optional(pool)
    .await
    .inspect_err(|err| tracing::error!("Failed to take next route: {}", err))?;

    let Some(row) = row else {
        return Ok(None);
    };

    tracing::info!("Dispatched route {} (order {})", row.number, row.odr);
    Ok(Some(row.into()))
}

fn order_column(order: Option<u32>) -> i64 {
    order.map(i64::from).unwrap_or(-1)
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct RouteRow {
    id: i64,
    number: u32,
    start_waypoint: String,
    end_waypoint: String,
    passengers: u32,
    max_weight: f64,
    value: f64,
    remarks: String,
    odr: i64,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: EntityId::Persisted(row.id),
            number: row.number,
            start_waypoint: row.start_waypoint,
            end_waypoint: row.end_waypoint,
            passengers: row.passengers,
            max_vehicle_weight: row.max_weight,
            value: row.value,
            remarks: row.remarks,
            order: u32::try_from(row.odr).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::test_database;

    fn new_route(number: u32, start: &str, end: &str) -> Route {
        Route {
            id: EntityId::Unpersisted,
            number,
            start_waypoint: start.to_string(),
            end_waypoint: end.to_string(),
            passengers: 4,
            max_vehicle_weight: 500.0,
            value: 200.0,
            remarks: String::new(),
            order: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let (_dir, db) = test_database().await;
        let route = new_route(1, "Alpha", "Zeta");

        let created = create_route(db.pool(), &route).await.unwrap();
        assert!(created.id.is_persisted());

        let fetched = get_route(db.pool(), created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.order, None);
    }

    #[tokio::test]
    async fn duplicate_create_ignores_order() {
        let (_dir, db) = test_database().await;
        let first = create_route(db.pool(), &new_route(1, "Alpha", "Zeta")).await.unwrap();
        let second = create_route(db.pool(), &new_route(1, "Alpha", "Zeta").with_order(3))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(load_all_routes(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_stores_route_unplanned() {
        let (_dir, db) = test_database().await;

        let created = create_route(db.pool(), &new_route(7, "alpha", "beta").with_order(0))
            .await
            .unwrap();

        assert_eq!(created.order, None);
        assert_eq!(get_route(db.pool(), created.id).await.unwrap().order, None);
        assert!(take_next_route(db.pool()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_create_returns_stored_order() {
        let (_dir, db) = test_database().await;
        let created = create_route(db.pool(), &new_route(1, "alpha", "beta")).await.unwrap();
        record_route_orders(db.pool(), &[created.clone().with_order(0)])
            .await
            .unwrap();

        let again = create_route(db.pool(), &new_route(1, "alpha", "beta")).await.unwrap();

        assert_eq!(again.id, created.id);
        assert_eq!(again.order, Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_creates_store_one_row() {
        let (_dir, db) = test_database().await;
        let route = new_route(5, "alpha", "gamma");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                let route = route.clone();
                tokio::spawn(async move { create_route(db.pool(), &route).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(load_all_routes(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_takes_dispatch_each_route_once() {
        let (_dir, db) = test_database().await;
        let mut plan = Vec::new();
        for number in 0..20u32 {
            let created = create_route(db.pool(), &new_route(number, "alpha", "beta"))
                .await
                .unwrap();
            plan.push(created.with_order(number));
        }
        record_route_orders(db.pool(), &plan).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { take_next_route(db.pool()).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            let route = handle.await.unwrap().unwrap().expect("a planned route");
            numbers.push(route.number);
        }
        numbers.sort_unstable();

        assert_eq!(numbers, (0..20).collect::<Vec<u32>>());
        assert!(take_next_route(db.pool()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_non_sentinel_id() {
        let (_dir, db) = test_database().await;
        let err = create_route(db.pool(), &new_route(1, "Alpha", "Zeta").with_id(5))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NonSentinelIdentifier { id: 5, .. }));
        assert!(load_all_routes(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_id_is_not_found() {
        let (_dir, db) = test_database().await;
        assert!(matches!(
            get_route(db.pool(), EntityId::Persisted(45)).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_persists_order() {
        let (_dir, db) = test_database().await;
        let created = create_route(db.pool(), &new_route(1, "Alpha", "Zeta")).await.unwrap();

        update_route(db.pool(), &created.clone().with_order(10)).await.unwrap();

        let fetched = get_route(db.pool(), created.id).await.unwrap();
        assert_eq!(fetched.order, Some(10));
        assert!(matches!(
            update_route(db.pool(), &new_route(1, "Alpha", "Zeta")).await,
            Err(StoreError::UncreatedIdentifier { .. })
        ));
    }

    #[tokio::test]
    async fn lookup_resolves_unpersisted_route_by_fields() {
        let (_dir, db) = test_database().await;
        let created = create_route(db.pool(), &new_route(2, "alpha", "beta")).await.unwrap();

        let found = lookup_route(db.pool(), &new_route(2, "alpha", "beta")).await.unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn next_route_follows_recorded_orders() {
        let (_dir, db) = test_database().await;
        let a = create_route(db.pool(), &new_route(1, "alpha", "beta")).await.unwrap();
        let b = create_route(db.pool(), &new_route(2, "beta", "gamma")).await.unwrap();
        let c = create_route(db.pool(), &new_route(3, "gamma", "alpha")).await.unwrap();

        record_route_orders(db.pool(), &[c.clone().with_order(0), a.clone().with_order(1)])
            .await
            .unwrap();

        let first = take_next_route(db.pool()).await.unwrap().unwrap();
        assert_eq!(first.id, c.id);
        assert_eq!(first.order, Some(0));

        let second = take_next_route(db.pool()).await.unwrap().unwrap();
        assert_eq!(second.id, a.id);

        // b was never planned
        assert!(take_next_route(db.pool()).await.unwrap().is_none());
        assert_eq!(load_all_routes(db.pool()).await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn recording_a_new_plan_resets_old_orders() {
        let (_dir, db) = test_database().await;
        let a = create_route(db.pool(), &new_route(1, "alpha", "beta")).await.unwrap();
        let b = create_route(db.pool(), &new_route(2, "beta", "gamma")).await.unwrap();

        record_route_orders(db.pool(), &[a.clone().with_order(0), b.clone().with_order(1)])
            .await
            .unwrap();
        record_route_orders(db.pool(), &[b.clone().with_order(0)]).await.unwrap();

        assert_eq!(get_route(db.pool(), a.id).await.unwrap().order, None);
        assert_eq!(get_route(db.pool(), b.id).await.unwrap().order, Some(0));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let (_dir, db) = test_database().await;
        let created = create_route(db.pool(), &new_route(1, "Alpha", "Zeta")).await.unwrap();

        delete_route(db.pool(), created.id).await.unwrap();
        assert!(matches!(
            get_route(db.pool(), created.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            delete_route(db.pool(), EntityId::Unpersisted).await,
            Err(StoreError::UncreatedIdentifier { .. })
        ));
    }
}
