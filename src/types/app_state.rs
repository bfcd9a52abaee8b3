use std::sync::Arc;

use crate::{
    app::AppConfig,
    services::{
        arrival_board::LiveBoards, arrival_service::arrival_service::ArrivalService,
        catalog_service::StopCatalog,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: StopCatalog,
    pub arrival_service: ArrivalService,
    pub live_boards: LiveBoards,
}
