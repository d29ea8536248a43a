//! SQLite persistence, the durable-storage analogue of the browser app's
//! localStorage collections.

mod db;
mod locations;

pub use db::{init_database, Database};
pub use locations::{
    delete_ddt, delete_drone, delete_warehouse, load_all_ddts, load_all_drones,
    load_all_warehouses, upsert_ddt, upsert_drone, upsert_warehouse,
};
