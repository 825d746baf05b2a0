use crate::config::Config;
use crate::gate::StatsStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    pub store: StatsStore,
}
