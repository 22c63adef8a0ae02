pub mod common;
pub mod dock_locations;
pub mod grn;
pub mod inventory;
pub mod locations;
pub mod master_list;
pub mod products;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    grn::GrnService, inventory::InventoryService, locations::LocationService,
    master_list::MasterListService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub grn: Arc<GrnService>,
    pub master_list: Arc<MasterListService>,
    pub locations: Arc<LocationService>,
    pub inventory: Arc<InventoryService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let master_list = Arc::new(MasterListService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let grn = Arc::new(GrnService::new(
            db_pool.clone(),
            event_sender.clone(),
            master_list.clone(),
        ));
        let locations = Arc::new(LocationService::new(db_pool.clone(), event_sender.clone()));
        let inventory = Arc::new(InventoryService::new(db_pool, event_sender));

        Self {
            grn,
            master_list,
            locations,
            inventory,
        }
    }
}
