use crate::processor::Tally;

// app's shared state
pub struct AppState {
    pub tally: Tally,
}

impl AppState {
    pub fn new(tally: Tally) -> Self {
        Self { tally }
    }
}
