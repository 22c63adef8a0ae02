use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entities::{grn::ReceiptStatus, location, product};

/// Snapshot pushed to real-time listeners after a stock adjustment commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub product: product::Model,
    pub location: location::Model,
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Receiving events
    GrnCreated {
        grn_id: Uuid,
        receiving_no: String,
        item_count: usize,
    },
    GrnUpdated(Uuid),
    GrnDeleted(Uuid),
    GrnItemStatusChanged {
        grn_id: Uuid,
        item_id: Uuid,
        status: ReceiptStatus,
    },
    GrnItemRemoved {
        grn_id: Uuid,
        item_no: String,
    },
    LocationsAssigned {
        grn_id: Uuid,
        applied: usize,
        skipped: usize,
    },

    // Stock ledger events
    StockUpdated(StockUpdate),
    ProductsDeleted {
        count: u64,
    },

    // Master list events
    MasterListReplaced {
        count: usize,
    },
    MasterListItemAdded(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::GrnCreated { .. } => "grn.created",
            Event::GrnUpdated(_) => "grn.updated",
            Event::GrnDeleted(_) => "grn.deleted",
            Event::GrnItemStatusChanged { .. } => "grn.item_status_changed",
            Event::GrnItemRemoved { .. } => "grn.item_removed",
            Event::LocationsAssigned { .. } => "grn.locations_assigned",
            Event::StockUpdated(_) => "stock.updated",
            Event::ProductsDeleted { .. } => "products.deleted",
            Event::MasterListReplaced { .. } => "master_list.replaced",
            Event::MasterListItemAdded(_) => "master_list.item_added",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Publishes without waiting; a full or closed channel drops the event with a warning.
    pub fn send_or_log(&self, event: Event) {
        let name = event.name();
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                counter!("warehouse_events.dropped", 1);
                warn!(event = name, "Event channel full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                counter!("warehouse_events.dropped", 1);
                warn!(event = name, "Event channel closed; dropping event");
            }
        }
    }
}

// Handlers receive every event published after a successful write.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Notifier that records every event in the service log.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl EventHandler for LoggingNotifier {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        match &event {
            Event::StockUpdated(update) => info!(
                event = event.name(),
                product_id = %update.product.id,
                location_id = %update.location.id,
                total_stock = update.product.total_stock,
                current_load = update.location.current_load,
                "stock updated"
            ),
            other => info!(event = other.name(), payload = ?other, "domain event"),
        }
        Ok(())
    }
}

/// Fan-out of stock updates to any number of real-time listeners.
#[derive(Debug, Clone)]
pub struct StockFeed {
    sender: broadcast::Sender<StockUpdate>,
}

impl StockFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StockUpdate> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventHandler for StockFeed {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        if let Event::StockUpdated(update) = event {
            if self.sender.send(update).is_err() {
                debug!("No stock listeners connected");
            }
        }
        Ok(())
    }
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Arc<dyn EventHandler>>) {
    info!(
        "Starting event processing loop with {} handlers",
        handlers.len()
    );

    while let Some(event) = rx.recv().await {
        let name = event.name();
        debug!(event = name, "Received event");
        counter!("warehouse_events.processed", 1);

        let results = join_all(
            handlers
                .iter()
                .map(|handler| handler.handle_event(event.clone())),
        )
        .await;

        for err in results.into_iter().filter_map(Result::err) {
            error!(event = name, error = %err, "Event handler failed");
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
