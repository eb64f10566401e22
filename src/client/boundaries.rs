//! GeoJSON boundary loading

use reqwest::Client;
use serde_json::Value;
use std::path::Path;

use super::{SourceError, SourceResult};
use crate::record::{sanitize_json, RecordError};

/// Load a GeoJSON document from an http(s) URL or a local path
pub async fn fetch_boundaries(client: &Client, location: &str) -> SourceResult<Value> {
    let raw = if location.starts_with("http://") || location.starts_with("https://") {
        tracing::debug!(url = %location, "Downloading boundaries");
        let response = client
            .get(location)
            .send()
            .await
            .map_err(SourceError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: format!("boundary download failed: {}", location),
            });
        }
        response.text().await.map_err(SourceError::from_transport)?
    } else {
        let path = Path::new(location.trim_start_matches("file://"));
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RecordError::Io {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?
    };

    let value: Value = serde_json::from_str(&sanitize_json(&raw)).map_err(RecordError::from)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"type": "FeatureCollection", "features": [{"type": "Feature", "properties": {"name": "Ohio"}}]}"#,
        )
        .unwrap();

        let location = file.path().to_string_lossy().to_string();
        let value = fetch_boundaries(&Client::new(), &location).await.unwrap();
        assert_eq!(value["features"][0]["properties"]["name"], "Ohio");

        let value = fetch_boundaries(&Client::new(), &format!("file://{}", location))
            .await
            .unwrap();
        assert_eq!(value["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = fetch_boundaries(&Client::new(), "/nonexistent/states.json")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(RecordError::Io { .. })));
    }
}
