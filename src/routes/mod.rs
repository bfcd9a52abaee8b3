use axum::{
    routing::{get, post},
    Router,
};

use crate::types::app_state::AppState;

mod get_nearby_stops;
mod get_stop_arrivals;
mod get_stop_arrivals_live;
mod redirect_stop;
mod refresh_live_board;
mod reload_catalog;

pub fn apply_routes(app: Router<AppState>) -> Router<AppState> {
    app.route("/", get(get_nearby_stops::get_nearby_stops))
        .route("/stops/:stop_code", get(redirect_stop::redirect_stop))
        .route(
            "/stops/:stop_code/:slug",
            get(get_stop_arrivals::get_stop_arrivals),
        )
        .route(
            "/stops/:stop_code/:slug/live",
            get(get_stop_arrivals_live::get_stop_arrivals_live),
        )
        .route(
            "/stops/:stop_code/:slug/live/refresh",
            post(refresh_live_board::refresh_live_board),
        )
        .route(
            "/stops/:stop_code/:slug/live/retry",
            post(refresh_live_board::retry_live_board),
        )
        .route("/catalog/reload", post(reload_catalog::reload_catalog))
}
