//! Read-only HTTP surface for broker status.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    context::BrokerContext,
    status::{self, BrokerStatus},
};

/// Routes exposing the broker status. Read-only; no mutation endpoints.
pub fn broker_routes(context: Arc<BrokerContext>) -> Router {
    Router::new()
        .route("/api/broker", get(broker_status_handler))
        .with_state(context)
}

/// `GET /api/broker` — fresh status snapshot of every configured queue.
async fn broker_status_handler(State(context): State<Arc<BrokerContext>>) -> Json<BrokerStatus> {
    Json(status::broker_status(&context))
}
