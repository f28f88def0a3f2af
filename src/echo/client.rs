use std::time::Duration;

use crate::echo::{EchoError, EchoRequest, EchoResponse};

/// HTTP client for the remote echo simulation service.
#[derive(Clone)]
pub struct EchoClient {
    client: reqwest::Client,
    url: String,
}

impl EchoClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, EchoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn simulate(&self, request: &EchoRequest) -> Result<EchoResponse, EchoError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EchoError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<EchoResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::Utc;
    use serde_json::{json, Value};

    use crate::config::tests::radar;
    use crate::orbit::{GeodeticPosition, SatelliteState};
    use crate::pulse::PointTarget;

    async fn spawn_service(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/simulate")
    }

    fn request() -> EchoRequest {
        let state = SatelliteState::from_geodetic(
            Utc::now(),
            GeodeticPosition {
                longitude_deg: 0.0,
                latitude_deg: 0.0,
                altitude_m: 519_000.0,
            },
            [0.0, 0.0, 7_600.0],
        );
        let targets = [
            PointTarget {
                position: [6_378_137.0, 0.0, 0.0],
                reflectivity: 1.0,
                phase: 0.0,
            },
            PointTarget {
                position: [6_378_137.0, 1_000.0, 0.0],
                reflectivity: 1.0,
                phase: 0.0,
            },
        ];
        EchoRequest::new(&radar(), &targets, &state)
    }

    #[tokio::test]
    async fn posts_request_and_parses_samples() {
        let app = Router::new().route(
            "/simulate",
            post(|Json(body): Json<Value>| async move {
                let n = body["targets"].as_array().map(|t| t.len()).unwrap_or(0);
                assert_eq!(body["config"]["Pt"], 1000.0);
                assert!(body["satellite_state"]["velocity"].is_array());
                let raw: Vec<u8> = (0..n)
                    .flat_map(|i| [i as f32, -(i as f32)])
                    .flat_map(|v| v.to_le_bytes())
                    .collect();
                Json(json!({ "shape": [1, n], "data": STANDARD.encode(raw) }))
            }),
        );
        let url = spawn_service(app).await;

        let client = EchoClient::new(url, Duration::from_secs(5)).unwrap();
        let response = client.simulate(&request()).await.unwrap();
        let samples = response.decode().unwrap();
        assert_eq!(samples.real(), vec![0.0, 1.0]);
        assert_eq!(samples.imag(), vec![0.0, -1.0]);
    }

    #[tokio::test]
    async fn service_errors_carry_status_and_body() {
        let app = Router::new().route(
            "/simulate",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "bad targets") }),
        );
        let url = spawn_service(app).await;

        let client = EchoClient::new(url, Duration::from_secs(5)).unwrap();
        match client.simulate(&request()).await {
            Err(EchoError::Service { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "bad targets");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
