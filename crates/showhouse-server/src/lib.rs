mod routes;

pub use routes::{AppState, build_router, build_state};
