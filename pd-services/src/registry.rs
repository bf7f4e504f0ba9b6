//! Wiring of all services around one database and event bus.

use std::sync::Arc;

use tracing::info;

use pd_core::config::AppConfig;
use pd_models::Database;

use crate::auth::{AuthService, JwtService};
use crate::conversation::ConversationService;
use crate::event_bus::EventBus;
use crate::message::MessageService;
use crate::notification::NotificationService;
use crate::user::UserService;

/// Shared handles to every service. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub database: Database,
    pub event_bus: EventBus,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub conversations: Arc<ConversationService>,
    pub messages: Arc<MessageService>,
    pub notifications: Arc<NotificationService>,
}

impl Services {
    pub fn new(database: Database, config: &AppConfig) -> Self {
        let event_bus = EventBus::default();
        let jwt = JwtService::from_config(&config.auth);
        let services = Self {
            auth: Arc::new(AuthService::new(database.clone(), jwt)),
            users: Arc::new(UserService::new(database.clone(), event_bus.clone())),
            conversations: Arc::new(ConversationService::new(database.clone(), event_bus.clone())),
            messages: Arc::new(MessageService::new(database.clone(), event_bus.clone())),
            notifications: Arc::new(NotificationService::new(database.clone())),
            database,
            event_bus,
        };
        info!("services initialized");
        services
    }
}
