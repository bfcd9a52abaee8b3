use crate::{
    services::{
        location_service::{locate, QueryLocation},
        proximity::{filter_stops, rank, sort_stops, SortMode},
    },
    types::app_state::AppState,
    utils::{
        app_error::AppError,
        slug::{slugify, stop_href},
        validated_query::ValidatedQuery,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(test)]
use axum_macros::debug_handler;
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::Validate;

#[derive(Validate, Deserialize)]
pub struct GetNearbyStopsPayload {
    #[validate(range(min = -90.0, max = 90.0, message = "Must be between -90 and 90"))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Must be between -180 and 180"))]
    pub lon: Option<f64>,

    #[serde(default)]
    pub sort: SortMode,

    #[serde(default)]
    pub q: String,

    #[validate(range(min = 1, max = 1000, message = "Must be between 1 and 1000"))]
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyStopsResponseStop {
    pub code: String,
    pub name: String,
    pub road: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_meters: f64,
    pub distance_label: String,
    pub slug: String,
    pub href: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyStopsResponseLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub is_fallback: bool,
    pub notice: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyStopsResponseData {
    pub location: GetNearbyStopsResponseLocation,
    /// Matches before `limit` was applied.
    pub total: usize,
    pub stops: Vec<GetNearbyStopsResponseStop>,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyStopsResponse {
    pub data: GetNearbyStopsResponseData,
}

#[cfg_attr(test, debug_handler)]
pub async fn get_nearby_stops(
    State(state): State<AppState>,
    ValidatedQuery(payload): ValidatedQuery<GetNearbyStopsPayload>,
) -> Result<Response, AppError> {
    let stops = state.catalog.stops_or_load().await.map_err(|e| {
        error!("Failed to load stop catalog: {}", e);
        AppError::from(e)
    })?;

    let location = locate(
        &QueryLocation {
            lat: payload.lat,
            lon: payload.lon,
        },
        state.config.geolocation_timeout,
        state.config.fallback_location,
    )
    .await;

    let mut ranked = filter_stops(rank(&stops, &location), &payload.q);
    sort_stops(&mut ranked, payload.sort);

    let total = ranked.len();
    if let Some(limit) = payload.limit {
        ranked.truncate(limit);
    }

    let stops = ranked
        .into_iter()
        .map(|r| GetNearbyStopsResponseStop {
            slug: slugify(&r.stop.name),
            href: stop_href(&r.stop.code, &r.stop.name),
            code: r.stop.code,
            name: r.stop.name,
            road: r.stop.road,
            latitude: r.stop.latitude,
            longitude: r.stop.longitude,
            distance_meters: r.distance_meters,
            distance_label: r.distance_label,
        })
        .collect::<Vec<GetNearbyStopsResponseStop>>();

    Ok((
        StatusCode::OK,
        Json(GetNearbyStopsResponse {
            data: GetNearbyStopsResponseData {
                location: GetNearbyStopsResponseLocation {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    is_fallback: location.is_fallback,
                    notice: location
                        .is_fallback
                        .then(|| "Location unavailable, showing stops near the city centre".to_string()),
                },
                total,
                stops,
            },
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body, Bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use crate::{
        app::{gen_mock_app, MOCK_CATALOG_CSV},
        utils::app_error::ErrorResponseJson,
    };

    use super::*;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Bytes) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, to_bytes(response.into_body(), usize::MAX).await.unwrap())
    }

    #[tokio::test]
    #[traced_test]
    async fn ranks_by_distance() {
        let mut mock_app = gen_mock_app().await;
        let catalog = mock_app.mock_catalog(MOCK_CATALOG_CSV).await;

        let (status, body) = get(mock_app.app, "/?lat=1.2968&lon=103.8525").await;

        assert_eq!(status, StatusCode::OK);
        catalog.assert_async().await;

        let body: GetNearbyStopsResponse = serde_json::from_slice(&body).unwrap();
        assert!(!body.data.location.is_fallback);
        assert!(body.data.location.notice.is_none());
        assert_eq!(body.data.total, 4);

        let codes: Vec<_> = body.data.stops.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["01012", "01013", "83139", "75009"]);
        assert!(body.data.stops[0].distance_meters < 10.0);
        assert_eq!(body.data.stops[0].slug, "hotel-grand-pacific");
        assert_eq!(body.data.stops[0].href, "/stops/01012/hotel-grand-pacific");
        assert!(body.data.stops[3].distance_label.ends_with(" km"));
    }

    #[tokio::test]
    async fn sorts_by_name_and_filters() {
        let mut mock_app = gen_mock_app().await;
        mock_app.mock_catalog(MOCK_CATALOG_CSV).await;

        let (status, body) = get(
            mock_app.app,
            "/?lat=1.2968&lon=103.8525&sort=name&q=victoria",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: GetNearbyStopsResponse = serde_json::from_slice(&body).unwrap();
        let names: Vec<_> = body.data.stops.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Hotel Grand Pacific", "St. Joseph's Ch"]);
    }

    #[tokio::test]
    async fn limit_truncates_but_reports_total() {
        let mut mock_app = gen_mock_app().await;
        mock_app.mock_catalog(MOCK_CATALOG_CSV).await;

        let (_, body) = get(mock_app.app, "/?lat=1.2968&lon=103.8525&limit=2").await;

        let body: GetNearbyStopsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.data.total, 4);
        assert_eq!(body.data.stops.len(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_location_uses_fallback() {
        let mut mock_app = gen_mock_app().await;
        mock_app.mock_catalog(MOCK_CATALOG_CSV).await;

        let (status, body) = get(mock_app.app, "/").await;

        assert_eq!(status, StatusCode::OK);
        let body: GetNearbyStopsResponse = serde_json::from_slice(&body).unwrap();
        assert!(body.data.location.is_fallback);
        assert!(body.data.location.notice.is_some());
        assert_eq!(body.data.location.latitude, 1.3521);
        assert_eq!(body.data.location.longitude, 103.8198);
        assert_eq!(body.data.stops.len(), 4);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let mut mock_app = gen_mock_app().await;
        mock_app.mock_catalog(MOCK_CATALOG_CSV).await;

        let (status, body) = get(mock_app.app, "/?lat=123&lon=103.8").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorResponseJson = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.kind, "invalid_request");
        assert!(!body.retryable);
    }

    #[tokio::test]
    #[traced_test]
    async fn catalog_failure_is_retryable() {
        let mut mock_app = gen_mock_app().await;
        let failing = mock_app
            .catalog_server
            .mock("GET", "/bus_stops.csv")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let (status, body) = get(mock_app.app.clone(), "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponseJson = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.kind, "catalog_load_failure");
        assert!(body.retryable);

        // Asking again retries the load.
        let (status, _) = get(mock_app.app, "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn unparseable_catalog_is_a_parse_failure() {
        let mut mock_app = gen_mock_app().await;
        mock_app
            .mock_catalog("code,name\n01012,Hotel Grand Pacific\n")
            .await;

        let (status, body) = get(mock_app.app, "/").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponseJson = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.kind, "catalog_parse_failure");
    }
}
