use std::sync::Arc;

use burrow_config::Settings;
use burrow_services::{AuthService, ChatHistoryService, MembershipManager, Stores};

use crate::ws::registry::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<AuthService>,
    pub memberships: MembershipManager,
    pub chat: ChatHistoryService,
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(settings: Settings, stores: Stores) -> Self {
        let auth = Arc::new(AuthService::new(&settings.jwt));
        let memberships = MembershipManager::new(&stores);
        let chat = ChatHistoryService::new(stores.messages.clone(), &settings.chat);

        Self {
            settings: Arc::new(settings),
            auth,
            memberships,
            chat,
            registry: Arc::new(RoomRegistry::new()),
        }
    }
}
