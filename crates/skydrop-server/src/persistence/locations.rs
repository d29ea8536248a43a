//! Persistence for durable location records: DDTs, warehouses, drones.

use anyhow::Result;
use skydrop_core::{Ddt, DroneOpStatus, DroneRecord, Warehouse};
use sqlx::SqlitePool;

pub async fn upsert_ddt(pool: &SqlitePool, ddt: &Ddt) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ddts (id, name, lat, lon, rack, active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            name = ?2, lat = ?3, lon = ?4, rack = ?5, active = ?6
        "#,
    )
    .bind(ddt.id)
    .bind(&ddt.name)
    .bind(ddt.lat)
    .bind(ddt.lon)
    .bind(&ddt.rack)
    .bind(ddt.active)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_ddt(pool: &SqlitePool, id: u32) -> Result<()> {
    sqlx::query("DELETE FROM ddts WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all_ddts(pool: &SqlitePool) -> Result<Vec<Ddt>> {
    let rows = sqlx::query_as::<_, DdtRow>("SELECT id, name, lat, lon, rack, active FROM ddts")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn upsert_warehouse(pool: &SqlitePool, warehouse: &Warehouse) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO warehouses (id, name, lat, lon)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            name = ?2, lat = ?3, lon = ?4
        "#,
    )
    .bind(warehouse.id)
    .bind(&warehouse.name)
    .bind(warehouse.lat)
    .bind(warehouse.lon)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_warehouse(pool: &SqlitePool, id: u32) -> Result<()> {
    sqlx::query("DELETE FROM warehouses WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all_warehouses(pool: &SqlitePool) -> Result<Vec<Warehouse>> {
    let rows =
        sqlx::query_as::<_, WarehouseRow>("SELECT id, name, lat, lon FROM warehouses")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn upsert_drone(pool: &SqlitePool, drone: &DroneRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drones (id, name, status, battery_pct, package, active, lat, lon)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            name = ?2, status = ?3, battery_pct = ?4,
            package = ?5, active = ?6, lat = ?7, lon = ?8
        "#,
    )
    .bind(drone.id)
    .bind(&drone.name)
    .bind(status_label(drone.status))
    .bind(drone.battery_pct)
    .bind(drone.package)
    .bind(drone.active)
    .bind(drone.lat)
    .bind(drone.lon)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_drone(pool: &SqlitePool, id: u32) -> Result<()> {
    sqlx::query("DELETE FROM drones WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all_drones(pool: &SqlitePool) -> Result<Vec<DroneRecord>> {
    let rows = sqlx::query_as::<_, DroneRow>(
        "SELECT id, name, status, battery_pct, package, active, lat, lon FROM drones",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

fn status_label(status: DroneOpStatus) -> &'static str {
    match status {
        DroneOpStatus::Idle => "idle",
        DroneOpStatus::Active => "active",
    }
}

// Internal row types for SQLx

#[derive(sqlx::FromRow)]
struct DdtRow {
    id: u32,
    name: String,
    lat: f64,
    lon: f64,
    rack: Option<String>,
    active: bool,
}

impl From<DdtRow> for Ddt {
    fn from(row: DdtRow) -> Self {
        Ddt {
            id: row.id,
            name: row.name,
            lat: row.lat,
            lon: row.lon,
            rack: row.rack,
            active: row.active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WarehouseRow {
    id: u32,
    name: String,
    lat: f64,
    lon: f64,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: row.id,
            name: row.name,
            lat: row.lat,
            lon: row.lon,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DroneRow {
    id: u32,
    name: String,
    status: String,
    battery_pct: u8,
    package: Option<u8>,
    active: bool,
    lat: f64,
    lon: f64,
}

impl From<DroneRow> for DroneRecord {
    fn from(row: DroneRow) -> Self {
        let status = match row.status.as_str() {
            "active" => DroneOpStatus::Active,
            _ => DroneOpStatus::Idle,
        };
        DroneRecord {
            id: row.id,
            name: row.name,
            status,
            battery_pct: row.battery_pct,
            package: row.package,
            active: row.active,
            lat: row.lat,
            lon: row.lon,
        }
    }
}
