use crate::use_cases::types::SessionEvent;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Lifecycle and traffic events flowing from the network into the
    // session task; the only way shared relay state is ever touched.
    pub event_tx: mpsc::Sender<SessionEvent>,
}
