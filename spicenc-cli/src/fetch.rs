//! HTTP client of the SPICE positioning service
use std::time::Duration;

use log::debug;
use reqwest::{blocking::Client, StatusCode, Url};
use serde::Deserialize;

use spicenc::{
    prelude::{Epoch, FetchError, PositionSample, SampleSource, StationCode, TimeWindow},
    sample::format_utc,
};

/// Body answered when the window holds no data
const NO_RESULTS: &str = "0 results";

#[derive(Debug, Deserialize)]
struct Payload {
    positions: Vec<Fix>,
}

#[derive(Debug, Deserialize)]
struct Fix {
    /// Unix timestamp (s)
    t: i64,
    lat: f64,
    lon: f64,
    cep: f64,
}

/// Decodes a service answer into chronologically sorted [PositionSample]s.
pub fn parse_body(body: &str) -> Result<Vec<PositionSample>, FetchError> {
    if body.trim() == NO_RESULTS {
        return Ok(Vec::new());
    }

    let payload: Payload =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut samples = payload
        .positions
        .into_iter()
        .map(|fix| {
            PositionSample::new(
                Epoch::from_unix_seconds(fix.t as f64),
                fix.lat,
                fix.lon,
                fix.cep,
            )
            .map_err(|e| FetchError::Malformed(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    samples.sort_by(|a, b| a.epoch.cmp(&b.epoch));
    Ok(samples)
}

/// [SampleSource] querying the SPICE positioning service over HTTP.
pub struct HttpSource {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpSource {
    /// Builds a new [HttpSource]. Every request is bounded by `timeout`.
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            FetchError::Network(format!("invalid endpoint \"{}\": {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spicenc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    fn url(&self, station: StationCode, window: &TimeWindow) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("spice", &station.to_string())
            .append_pair("startTs", &format_utc(window.start))
            .append_pair("endTs", &format_utc(window.end));
        url
    }
}

impl SampleSource for HttpSource {
    fn fetch(
        &self,
        station: StationCode,
        window: &TimeWindow,
    ) -> Result<Vec<PositionSample>, FetchError> {
        let url = self.url(station, window);
        debug!("GET {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| FetchError::Network(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Auth(format!("HTTP {} from {}", response.status(), url)));
            },
            StatusCode::BAD_REQUEST => {
                return Err(FetchError::InvalidRange {
                    start: window.start,
                    end: window.end,
                });
            },
            StatusCode::NOT_FOUND => {
                return Err(FetchError::UnknownStation(station.to_string()));
            },
            status if !status.is_success() => {
                return Err(FetchError::Network(format!("HTTP {} from {}", status, url)));
            },
            _ => {},
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Network(format!("failed to read response: {}", e)))?;

        parse_body(&body)
    }
}

#[cfg(test)]
mod test {
    use super::{parse_body, HttpSource};
    use spicenc::prelude::{FetchError, StationCode, TimeWindow};
    use std::time::Duration;

    #[test]
    fn no_results() {
        assert_eq!(parse_body("0 results").unwrap(), vec![]);
        assert_eq!(parse_body("0 results\n").unwrap(), vec![]);
    }

    #[test]
    fn positions() {
        let body = r#"{"positions":[
            {"t": 1693533600, "lat": 77.52, "lon": 14.40, "cep": 1.0},
            {"t": 1693526400, "lat": 77.50, "lon": 350.0, "cep": 5.0}
        ]}"#;

        let samples = parse_body(body).unwrap();
        assert_eq!(samples.len(), 2);

        // sorted, normalized
        assert!(samples[0].epoch < samples[1].epoch);
        assert_eq!(samples[0].cep, 5.0);
        assert!((samples[0].longitude + 10.0).abs() < 1.0e-9);
        assert!((samples[1].longitude - 14.40).abs() < 1.0e-9);
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            parse_body("<html>503</html>"),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_body(r#"{"positions":[{"t": 0, "lat": 120.0, "lon": 0.0, "cep": 1.0}]}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn request_url() {
        let source = HttpSource::new(
            "https://example.org/SPICE/positions.php",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let window = TimeWindow::parse("2023-09-01T00:00:00Z", "2023-09-02T00:00:00Z").unwrap();
        let url = source.url(StationCode::Spice38, &window);

        assert_eq!(
            url.as_str(),
            "https://example.org/SPICE/positions.php?spice=SPICE38&startTs=2023-09-01T00%3A00%3A00Z&endTs=2023-09-02T00%3A00%3A00Z"
        );
    }

    #[test]
    fn invalid_endpoint() {
        assert!(HttpSource::new("not a url", None, Duration::from_secs(1)).is_err());
    }
}
