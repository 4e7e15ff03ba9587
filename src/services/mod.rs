pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod users;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use orders::OrderService;
pub use users::UserService;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

/// All services wired against one pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub cart: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub users: UserService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        auth: AuthService,
        config: &AppConfig,
    ) -> Self {
        let catalog = CatalogService::new(
            db.clone(),
            event_sender.clone(),
            config.low_stock_threshold,
        );
        let cart = CartService::new(db.clone(), event_sender.clone());
        let orders = OrderService::new(db.clone(), event_sender.clone());
        let checkout = CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            config.default_country.clone(),
        );
        let users = UserService::new(db, event_sender, auth);
        Self {
            catalog,
            cart,
            checkout,
            orders,
            users,
        }
    }
}
