//! Energy-charts `public_power` integration.
//!
//! One request returns a shared `unix_seconds` array plus one data array per
//! production type. We flatten that into `TimeSeriesPoint` rows, keeping only
//! the requested categories and dropping derived series (residual load,
//! renewable shares) that are not production.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::data::timestamps::normalize_timestamps;
use crate::domain::{ProductionTable, QuerySignature, TimeSeriesPoint};
use crate::error::FeedError;

const ENDPOINT: &str = "public_power";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const MAX_ERROR_BODY: usize = 500;

/// Summary series published alongside production types.
pub const EXCLUDED_CATEGORIES: [&str; 3] = [
    "Residual load",
    "Renewable share of generation",
    "Renewable share of load",
];

/// Categories shown by the production charts.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Nuclear",
    "Hydro Run-of-River",
    "Hydro water reservoir",
    "Hydro pumped storage",
    "Wind onshore",
    "Solar",
];

/// Anything that can answer a production query.
pub trait FeedSource {
    fn fetch(&self, query: &QuerySignature) -> Result<ProductionTable, FeedError>;
}

impl<T: FeedSource + ?Sized> FeedSource for &T {
    fn fetch(&self, query: &QuerySignature) -> Result<ProductionTable, FeedError> {
        (**self).fetch(query)
    }
}

pub struct FeedClient {
    client: Client,
    base_url: String,
    country: String,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("swiss-energy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            country: config.country.clone(),
        })
    }
}

impl FeedSource for FeedClient {
    fn fetch(&self, query: &QuerySignature) -> Result<ProductionTable, FeedError> {
        query.validate()?;

        let url = format!("{}{ENDPOINT}", self.base_url);
        let start = query.start().format(TIMESTAMP_FORMAT).to_string();
        let end = query.end().format(TIMESTAMP_FORMAT).to_string();
        debug!(%url, %start, %end, country = %self.country, "requesting public power");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("country", self.country.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout(e.to_string())
                } else {
                    FeedError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = match resp.text() {
                Ok(body) => body.chars().take(MAX_ERROR_BODY).collect(),
                Err(e) => {
                    debug!(error = %e, "failed to read error response body");
                    String::new()
                }
            };
            warn!(status = status.as_u16(), %body, "failed to retrieve public power data");
            return Err(FeedError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .map_err(|e| FeedError::Unavailable(format!("failed to read response body: {e}")))?;
        let table = parse_public_power(&body, query)?;
        info!(rows = table.len(), "fetched public power");
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct PublicPowerResponse {
    unix_seconds: Vec<i64>,
    production_types: Vec<ProductionType>,
}

#[derive(Debug, Deserialize)]
struct ProductionType {
    name: String,
    /// The feed reports gaps as `null`.
    data: Vec<Option<f64>>,
}

/// Parse a `public_power` body into rows for `query`.
///
/// Rows outside `[start, end)` are dropped, as are `null` samples.
pub fn parse_public_power(body: &str, query: &QuerySignature) -> Result<ProductionTable, FeedError> {
    let envelope: PublicPowerResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;
    let timestamps = normalize_timestamps(&envelope.unix_seconds)?;

    let mut out = Vec::new();
    for entry in envelope.production_types {
        if EXCLUDED_CATEGORIES.contains(&entry.name.as_str()) || !query.wants(&entry.name) {
            continue;
        }
        if entry.data.len() != timestamps.len() {
            return Err(FeedError::Malformed(format!(
                "series '{}' has {} values for {} timestamps",
                entry.name,
                entry.data.len(),
                timestamps.len()
            )));
        }

        for (ts, value) in timestamps.iter().zip(entry.data) {
            let Some(value) = value else { continue };
            if !query.contains(*ts) {
                continue;
            }
            out.push(TimeSeriesPoint {
                timestamp: *ts,
                category: entry.name.clone(),
                value,
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn utc(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2023, 1, 1, h, m, 0)
            .unwrap()
    }

    const BODY: &str = r#"{
        "unix_seconds": [1672531200, 1672532100],
        "production_types": [
            {"name": "Solar", "data": [10, 20]},
            {"name": "Nuclear", "data": [2900.5, null]},
            {"name": "Residual load", "data": [5000, 5100]},
            {"name": "Renewable share of load", "data": [40.1, 41.2]}
        ]
    }"#;

    /// Serve one canned HTTP response on a local port, after `delay`.
    fn serve_once(response: String, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).is_ok_and(|n| n > 0) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            thread::sleep(delay);
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}/")
    }

    fn client(base_url: String, timeout: Duration) -> FeedClient {
        FeedClient::new(&FeedConfig {
            base_url,
            timeout,
            ..FeedConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn error_status_is_upstream_error() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom".to_string(),
            Duration::ZERO,
        );
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Solar"]);
        match client(base, Duration::from_secs(5)).fetch(&query) {
            Err(FeedError::Upstream { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn slow_upstream_times_out() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}".to_string(),
            Duration::from_millis(1500),
        );
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Solar"]);
        let result = client(base, Duration::from_millis(200)).fetch(&query);
        assert!(matches!(result, Err(FeedError::Timeout(_))), "got {result:?}");
    }

    #[test]
    fn successful_response_is_parsed() {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{BODY}",
            BODY.len()
        );
        let base = serve_once(response, Duration::ZERO);
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Solar"]);
        let rows = client(base, Duration::from_secs(5)).fetch(&query).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.category == "Solar"));
    }

    #[test]
    fn inverted_window_fails_before_any_request() {
        // Nothing listens on the discard port; a request would surface as Unavailable.
        let feed = client("http://127.0.0.1:9/".to_string(), Duration::from_millis(200));
        let query = QuerySignature::new(utc(1, 0), utc(0, 0), ["Solar"]);
        assert!(matches!(feed.fetch(&query), Err(FeedError::Validation(_))));
    }

    #[test]
    fn parses_requested_category() {
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Solar"]);
        let rows = parse_public_power(BODY, &query).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(rows[0].category, "Solar");
        assert_eq!(rows[0].value, 10.0);
        assert_eq!(rows[1].timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 0, 15, 0).unwrap());
        assert_eq!(rows[1].value, 20.0);
    }

    #[test]
    fn empty_request_means_all_non_excluded() {
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), Vec::<String>::new());
        let rows = parse_public_power(BODY, &query).unwrap();
        let mut names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        names.dedup();
        assert_eq!(names, ["Solar", "Nuclear"]);
        // The null Nuclear sample is skipped, not zero-filled.
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn drops_rows_outside_window() {
        let query = QuerySignature::new(utc(0, 0), utc(0, 15), ["Solar"]);
        let rows = parse_public_power(BODY, &query).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| query.contains(r.timestamp)));
    }

    #[test]
    fn unknown_category_is_absent() {
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Geothermal"]);
        assert!(parse_public_power(BODY, &query).unwrap().is_empty());
    }

    #[test]
    fn malformed_bodies_are_errors() {
        let query = QuerySignature::new(utc(0, 0), utc(1, 0), ["Solar"]);
        assert!(matches!(
            parse_public_power("{\"unix_seconds\": ", &query),
            Err(FeedError::Malformed(_))
        ));

        let short = r#"{"unix_seconds": [1672531200, 1672532100],
            "production_types": [{"name": "Solar", "data": [1]}]}"#;
        assert!(matches!(parse_public_power(short, &query), Err(FeedError::Malformed(_))));
    }
}
