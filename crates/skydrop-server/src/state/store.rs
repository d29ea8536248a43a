//! In-memory application state.
//!
//! Location collections live in DashMaps backed by SQLite; the planning
//! route, pending import preview, mission hand-off and active simulation
//! are single-writer slots behind mutexes. A generation counter fences the
//! simulation so a tick computed before an abort is discarded instead of
//! being published.

use crate::config::Config;
use crate::persistence::Database;
use crate::weather::WeatherClient;
use dashmap::DashMap;
use skydrop_core::{
    Ddt, DroneRecord, ImportPreview, MissionError, MissionFix, MissionSim, MissionSnapshot,
    MissionStatus, Route, RouteError, Warehouse, Waypoint,
};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

// Poisoned locks recover the inner value; the slots hold plain data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct AppState {
    config: Config,
    db: Database,
    weather: WeatherClient,

    ddts: DashMap<u32, Ddt>,
    warehouses: DashMap<u32, Warehouse>,
    drones: DashMap<u32, DroneRecord>,
    ddt_counter: AtomicU32,
    warehouse_counter: AtomicU32,
    drone_counter: AtomicU32,

    route: Mutex<Route>,
    pending_import: Mutex<Option<ImportPreview>>,
    mission: Mutex<Option<MissionSnapshot>>,
    sim: Mutex<Option<MissionSim>>,
    sim_generation: AtomicU64,

    /// Serialized MissionFix fan-out for WebSocket subscribers.
    pub fix_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn with_database(db: Database, config: Config) -> Self {
        let (fix_tx, _) = broadcast::channel(64);
        let route = Route::new(config.route_limits());
        let weather = WeatherClient::new(
            config.weather_base_url.clone(),
            config.weather_api_key.clone(),
        );
        Self {
            config,
            db,
            weather,
            ddts: DashMap::new(),
            warehouses: DashMap::new(),
            drones: DashMap::new(),
            ddt_counter: AtomicU32::new(1),
            warehouse_counter: AtomicU32::new(1),
            drone_counter: AtomicU32::new(1),
            route: Mutex::new(route),
            pending_import: Mutex::new(None),
            mission: Mutex::new(None),
            sim: Mutex::new(None),
            sim_generation: AtomicU64::new(0),
            fix_tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn weather(&self) -> &WeatherClient {
        &self.weather
    }

    /// Populate the in-memory collections from SQLite and resume the id
    /// counters above the highest persisted id.
    pub async fn load_from_database(&self) -> anyhow::Result<()> {
        for ddt in crate::persistence::load_all_ddts(self.db.pool()).await? {
            bump_counter(&self.ddt_counter, ddt.id);
            self.ddts.insert(ddt.id, ddt);
        }
        for warehouse in crate::persistence::load_all_warehouses(self.db.pool()).await? {
            bump_counter(&self.warehouse_counter, warehouse.id);
            self.warehouses.insert(warehouse.id, warehouse);
        }
        for drone in crate::persistence::load_all_drones(self.db.pool()).await? {
            bump_counter(&self.drone_counter, drone.id);
            self.drones.insert(drone.id, drone);
        }
        tracing::info!(
            "Loaded {} DDTs, {} warehouses, {} drones",
            self.ddts.len(),
            self.warehouses.len(),
            self.drones.len()
        );
        Ok(())
    }

    // ==== DDT markers ====

    pub fn next_ddt_id(&self) -> u32 {
        self.ddt_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert_ddt(&self, ddt: Ddt) {
        self.ddts.insert(ddt.id, ddt);
    }

    pub fn get_ddt(&self, id: u32) -> Option<Ddt> {
        self.ddts.get(&id).map(|r| r.value().clone())
    }

    pub fn list_ddts(&self) -> Vec<Ddt> {
        let mut all: Vec<Ddt> = self.ddts.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|d| d.id);
        all
    }

    pub fn remove_ddt(&self, id: u32) -> Option<Ddt> {
        self.ddts.remove(&id).map(|(_, ddt)| ddt)
    }

    // ==== Warehouses ====

    pub fn next_warehouse_id(&self) -> u32 {
        self.warehouse_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert_warehouse(&self, warehouse: Warehouse) {
        self.warehouses.insert(warehouse.id, warehouse);
    }

    pub fn get_warehouse(&self, id: u32) -> Option<Warehouse> {
        self.warehouses.get(&id).map(|r| r.value().clone())
    }

    pub fn list_warehouses(&self) -> Vec<Warehouse> {
        let mut all: Vec<Warehouse> = self.warehouses.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|w| w.id);
        all
    }

    pub fn remove_warehouse(&self, id: u32) -> Option<Warehouse> {
        self.warehouses.remove(&id).map(|(_, w)| w)
    }

    // ==== Drones ====

    pub fn next_drone_id(&self) -> u32 {
        self.drone_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert_drone(&self, drone: DroneRecord) {
        self.drones.insert(drone.id, drone);
    }

    pub fn get_drone(&self, id: u32) -> Option<DroneRecord> {
        self.drones.get(&id).map(|r| r.value().clone())
    }

    pub fn list_drones(&self) -> Vec<DroneRecord> {
        let mut all: Vec<DroneRecord> = self.drones.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|d| d.id);
        all
    }

    pub fn remove_drone(&self, id: u32) -> Option<DroneRecord> {
        self.drones.remove(&id).map(|(_, d)| d)
    }

    // ==== Planning route ====

    pub fn route_waypoints(&self) -> Vec<Waypoint> {
        lock(&self.route).waypoints().to_vec()
    }

    pub fn route_snapshot(&self) -> MissionSnapshot {
        lock(&self.route).snapshot(self.config.planning_speed_kmh)
    }

    pub fn add_waypoint(&self, latitude: f64, longitude: f64) -> Result<Waypoint, RouteError> {
        lock(&self.route).add_waypoint(latitude, longitude)
    }

    pub fn move_waypoint(
        &self,
        index: usize,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), RouteError> {
        lock(&self.route).move_waypoint(index, latitude, longitude)
    }

    pub fn remove_waypoint(&self, index: usize) -> Result<Waypoint, RouteError> {
        lock(&self.route).remove_waypoint(index)
    }

    pub fn clear_route(&self) {
        lock(&self.route).clear();
    }

    // ==== Two-phase CSV import ====

    pub fn set_pending_import(&self, preview: ImportPreview) {
        *lock(&self.pending_import) = Some(preview);
    }

    pub fn cancel_pending_import(&self) -> bool {
        lock(&self.pending_import).take().is_some()
    }

    /// Apply the pending preview to the live route. `Ok(None)` means there
    /// was nothing pending; a rejected preview stays pending so the caller
    /// can adjust and retry or cancel.
    pub fn confirm_pending_import(&self) -> Result<Option<MissionSnapshot>, RouteError> {
        let mut pending = lock(&self.pending_import);
        let Some(preview) = pending.as_ref() else {
            return Ok(None);
        };
        let mut route = lock(&self.route);
        route.replace(preview.waypoints.clone())?;
        *pending = None;
        Ok(Some(route.snapshot(self.config.planning_speed_kmh)))
    }

    // ==== Mission hand-off and simulation ====

    /// Derive a mission snapshot from the planning route and park it in
    /// the hand-off slot for the tower context.
    pub fn create_mission(&self) -> Result<MissionSnapshot, MissionError> {
        let snapshot = self.route_snapshot();
        if snapshot.waypoints.len() < 2 {
            return Err(MissionError::InvalidMission {
                waypoint_count: snapshot.waypoints.len(),
            });
        }
        *lock(&self.mission) = Some(snapshot.clone());
        Ok(snapshot)
    }

    pub fn mission(&self) -> Option<MissionSnapshot> {
        lock(&self.mission).clone()
    }

    pub fn sim_generation(&self) -> u64 {
        self.sim_generation.load(Ordering::SeqCst)
    }

    pub fn start_mission(&self) -> Result<MissionFix, MissionError> {
        let mut sim = lock(&self.sim);
        // Completed and Aborted are terminal states of the machine, not of
        // the slot: a finished run is replaced by a fresh machine built from
        // the current mission snapshot.
        let needs_machine = sim.as_ref().map_or(true, |machine| {
            matches!(
                machine.status(),
                MissionStatus::Completed | MissionStatus::Aborted
            )
        });
        if needs_machine {
            let snapshot = lock(&self.mission)
                .clone()
                .ok_or(MissionError::InvalidMission { waypoint_count: 0 })?;
            *sim = Some(MissionSim::from_snapshot(
                &snapshot,
                self.config.sim_speed_mps,
            ));
        }
        let machine = sim
            .as_mut()
            .ok_or(MissionError::InvalidMission { waypoint_count: 0 })?;
        machine.start()?;
        self.sim_generation.fetch_add(1, Ordering::SeqCst);
        Ok(machine.fix())
    }

    pub fn pause_mission(&self) -> Result<MissionFix, MissionError> {
        self.with_sim(|sim| sim.pause().map(|_| sim.fix()))
    }

    pub fn resume_mission(&self) -> Result<MissionFix, MissionError> {
        self.with_sim(|sim| sim.resume().map(|_| sim.fix()))
    }

    /// Abort and discard the simulation. Runs entirely under the sim lock,
    /// so no tick can observe an aborted machine; the generation bump makes
    /// any already-computed fix stale.
    pub fn abort_mission(&self) -> Result<(), MissionError> {
        let mut sim = lock(&self.sim);
        let machine = sim
            .as_mut()
            .ok_or(MissionError::InvalidMission { waypoint_count: 0 })?;
        machine.abort()?;
        *sim = None;
        self.sim_generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn telemetry(&self) -> Option<MissionFix> {
        lock(&self.sim).as_ref().map(|sim| sim.fix())
    }

    /// One simulation frame. Returns the fix together with the generation
    /// observed under the lock, letting the loop drop stale results.
    pub fn tick_sim(&self, elapsed_ms: f64) -> Option<(u64, MissionFix)> {
        let mut sim = lock(&self.sim);
        let machine = sim.as_mut()?;
        let generation = self.sim_generation.load(Ordering::SeqCst);
        Some((generation, machine.tick(elapsed_ms)))
    }

    fn with_sim<F>(&self, apply: F) -> Result<MissionFix, MissionError>
    where
        F: FnOnce(&mut MissionSim) -> Result<MissionFix, MissionError>,
    {
        let mut sim = lock(&self.sim);
        let machine = sim
            .as_mut()
            .ok_or(MissionError::InvalidMission { waypoint_count: 0 })?;
        apply(machine)
    }
}

fn bump_counter(counter: &AtomicU32, seen_id: u32) {
    let mut current = counter.load(Ordering::SeqCst);
    while current <= seen_id {
        match counter.compare_exchange(
            current,
            seen_id + 1,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}
