//! Kiosk clock in/out
//!
//! No token required. Writes are restricted to the warehouse network.
//!
//! | Path                         | Method | Guard          |
//! |------------------------------|--------|----------------|
//! | /api/clock/employees         | GET    | none           |
//! | /api/clock/attendances       | GET    | none           |
//! | /api/clock/attendances       | POST   | IP allow-list  |
//! | /api/clock/attendances/{id}  | PUT    | IP allow-list  |

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use shared::models::{Attendance, Employee};

use super::resources::{create, list, update};
use crate::auth::require_clock_network;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let writes = Router::new()
        .route("/api/clock/attendances", post(create::<Attendance>))
        .route("/api/clock/attendances/{id}", put(update::<Attendance>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_clock_network,
        ));

    Router::new()
        .route("/api/clock/employees", get(list::<Employee>))
        .route("/api/clock/attendances", get(list::<Attendance>))
        .merge(writes)
}
