mod availability;
mod db;
mod inventory;
mod reservations;

use std::sync::Arc;

pub use availability::*;
pub use db::*;
pub use inventory::*;
pub use reservations::*;

/// The bunkhouse booking system, facilitating inventory, availability search,
/// and reservation admission.
pub struct Bunkhouse<Db> {
    pub inventory: InventoryManager<Db>,
    pub reservations: ReservationManager<Db>,
}

/// A type passed to the managers of the system, to access shared state.
pub struct BunkhouseContext<Db> {
    pub database: Arc<Db>,
}

impl<Db> Bunkhouse<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let context = BunkhouseContext {
            database: Arc::new(database),
        };

        let inventory = InventoryManager::new(&context);
        let reservations = ReservationManager::new(&context);

        Self {
            inventory,
            reservations,
        }
    }
}

impl<Db> Clone for BunkhouseContext<Db>
where
    Db: Database,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
        }
    }
}
