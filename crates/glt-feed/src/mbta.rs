//! MBTA realtime v2 client.
//!
//! Wraps `predictionsbyroutes` and flattens its nested payload
//! (mode → route → direction → trip → vehicle) into flat
//! [`VehicleStatus`] values. The v2 API serialises every scalar as a
//! string; numeric fields are parsed here, per-record best-effort.

use glt_reconcile::{Direction, Position, VehicleId, VehicleStatus};
use serde::Deserialize;
use tracing::debug;

use crate::feed::{FeedError, VehicleFeed};

/// MBTA realtime developer API, version 2.
///
/// The API key is passed in by the caller (config reads it from the
/// environment); it must never be logged.
#[derive(Debug, Clone)]
pub struct MbtaFeed {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    route_ids: Vec<String>,
}

impl MbtaFeed {
    pub fn new(base_url: String, api_key: String, route_ids: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            route_ids,
        }
    }

    fn predictions_url(&self) -> String {
        format!(
            "{}/predictionsbyroutes",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl VehicleFeed for MbtaFeed {
    fn name(&self) -> &'static str {
        "mbta-v2"
    }

    async fn fetch_vehicle_statuses(&self) -> Result<Vec<VehicleStatus>, FeedError> {
        let routes = self.route_ids.join(",");

        let resp = self
            .http
            .get(self.predictions_url())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("routes", routes.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: PredictionsByRoutes = resp
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        let statuses = flatten(payload);
        debug!(count = statuses.len(), feed = self.name(), "fetched vehicle statuses");
        Ok(statuses)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes (v2 predictionsbyroutes)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PredictionsByRoutes {
    #[serde(default)]
    mode: Vec<WireMode>,
}

#[derive(Debug, Deserialize)]
struct WireMode {
    #[serde(default)]
    route: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    direction: Vec<WireDirection>,
}

#[derive(Debug, Deserialize)]
struct WireDirection {
    #[serde(default)]
    direction_name: String,
    #[serde(default)]
    trip: Vec<WireTrip>,
}

#[derive(Debug, Deserialize)]
struct WireTrip {
    #[serde(default)]
    trip_name: String,
    #[serde(default)]
    trip_headsign: String,
    vehicle: Option<WireVehicle>,
}

#[derive(Debug, Deserialize)]
struct WireVehicle {
    #[serde(default)]
    vehicle_id: String,
    #[serde(default)]
    vehicle_lat: String,
    #[serde(default)]
    vehicle_lon: String,
    #[serde(default)]
    vehicle_bearing: String,
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Flatten the nested v2 payload into vehicle statuses.
///
/// Per-record best-effort: a trip with no vehicle block, or whose id /
/// coordinates fail to parse, is dropped; a malformed direction name or
/// bearing degrades (to `Direction::None` / `0.0`) and the record is
/// kept. Structural problems were already rejected by serde.
fn flatten(payload: PredictionsByRoutes) -> Vec<VehicleStatus> {
    let mut out = Vec::new();

    for mode in payload.mode {
        for route in mode.route {
            for dir in route.direction {
                let direction = Direction::parse_name(&dir.direction_name);
                for trip in dir.trip {
                    let Some(vehicle) = trip.vehicle else {
                        continue;
                    };
                    let Ok(id) = vehicle.vehicle_id.trim().parse::<i64>() else {
                        debug!(raw = %vehicle.vehicle_id, "skipping vehicle with unparsable id");
                        continue;
                    };
                    let (Ok(lat), Ok(lon)) = (
                        vehicle.vehicle_lat.trim().parse::<f64>(),
                        vehicle.vehicle_lon.trim().parse::<f64>(),
                    ) else {
                        debug!(vehicle_id = id, "skipping vehicle with unparsable coordinates");
                        continue;
                    };
                    let bearing = vehicle
                        .vehicle_bearing
                        .trim()
                        .parse::<f64>()
                        .unwrap_or(0.0);

                    out.push(VehicleStatus {
                        vehicle_id: VehicleId(id),
                        position: Position::new(lat, lon),
                        bearing_degrees: bearing,
                        direction,
                        headsign: trip.trip_headsign.clone(),
                        trip_name: trip.trip_name.clone(),
                    });
                }
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests (no network; payload decode only)
// ---------------------------------------------------------------------------
