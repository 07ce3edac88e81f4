use std::sync::Arc;

use application::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}
