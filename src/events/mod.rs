use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed by a single logging loop;
/// delivery is best-effort and never blocks the emitting request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartItemAdded { session_id: String, product_id: Uuid, quantity: i32 },
    CartItemUpdated { session_id: String, product_id: Uuid, quantity: i32 },
    CartItemRemoved { session_id: String, product_id: Uuid },
    CartCleared { session_id: String },

    OrderCreated(Uuid),
    OrderConfirmed(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockDepleted { product_id: Uuid },

    CategoryCreated(Uuid),
    CategoryDeleted(Uuid),

    UserRegistered(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Send an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Builds a connected sender/receiver pair with the standard channel depth.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging every event. Runs until all senders drop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = %id, "order created"),
            Event::OrderConfirmed(id) => info!(order_id = %id, "order confirmed"),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(%order_id, %old_status, %new_status, "order status changed"),
            Event::StockDepleted { product_id } => {
                warn!(%product_id, "product stock depleted")
            }
            other => debug!(event = ?other, "event"),
        }
    }
    debug!("event channel closed; processor exiting");
}
