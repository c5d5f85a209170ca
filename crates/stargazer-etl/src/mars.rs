//! Mars rover photo fetcher.
//!
//! Pulls the photos a rover took on one Earth date and writes them out as a
//! JSON array. Requests go through the same retrying [`ApiClient`] as APOD.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use stargazer_core::model::{RoverPhoto, DATE_FORMAT};

use crate::client::ApiClient;
use crate::error::{IngestError, IngestResult};

/// Rover queried when none is given.
pub const DEFAULT_ROVER: &str = "curiosity";

// ---------------------------------------------------------------------------
// API response types (private -- the API nests rover and camera objects)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PhotosResponse {
    #[serde(default)]
    photos: Vec<RawPhoto>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    id: Option<i64>,
    img_src: Option<String>,
    earth_date: Option<String>,
    rover: Option<RawRover>,
    camera: Option<RawCamera>,
}

#[derive(Debug, Deserialize)]
struct RawRover {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCamera {
    full_name: Option<String>,
}

impl From<RawPhoto> for RoverPhoto {
    fn from(raw: RawPhoto) -> Self {
        Self {
            id: raw.id,
            img_src: raw.img_src,
            earth_date: raw.earth_date,
            rover: raw.rover.and_then(|r| r.name),
            camera: raw.camera.and_then(|c| c.full_name),
        }
    }
}

/// Mars rover photos API client.
#[derive(Debug, Clone)]
pub struct MarsClient {
    api: ApiClient,
    base_url: String,
    api_key: String,
}

impl MarsClient {
    pub fn new(api: ApiClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Fetch every photo `rover` took on `earth_date`.
    pub async fn fetch_photos(
        &self,
        rover: &str,
        earth_date: NaiveDate,
    ) -> IngestResult<Vec<RoverPhoto>> {
        let url = format!(
            "{}/mars-photos/api/v1/rovers/{}/photos",
            self.base_url,
            rover.to_lowercase()
        );
        let query = [
            ("earth_date", earth_date.format(DATE_FORMAT).to_string()),
            ("api_key", self.api_key.clone()),
        ];

        let payload = self.api.get_json(&url, &query).await?;
        let response: PhotosResponse =
            serde_json::from_value(payload).map_err(|e| IngestError::Api {
                status: 200,
                body: format!("unexpected photos payload: {e}"),
            })?;

        let photos: Vec<RoverPhoto> = response.photos.into_iter().map(RoverPhoto::from).collect();
        log::info!(
            "Fetched {} {} photos for {}",
            photos.len(),
            rover,
            earth_date.format(DATE_FORMAT)
        );
        Ok(photos)
    }
}

/// Write `photos` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_photos(path: &Path, photos: &[RoverPhoto]) -> IngestResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(photos)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_photos_response_flattens_rover_and_camera() {
        let payload = json!({
            "photos": [{
                "id": 102_693,
                "sol": 1000,
                "img_src": "https://mars.nasa.gov/a.jpg",
                "earth_date": "2015-05-30",
                "camera": {"id": 20, "name": "FHAZ", "full_name": "Front Hazard Avoidance Camera"},
                "rover": {"id": 5, "name": "Curiosity", "status": "active"}
            }]
        });

        let response: PhotosResponse = serde_json::from_value(payload).unwrap();
        let photos: Vec<RoverPhoto> = response.photos.into_iter().map(RoverPhoto::from).collect();

        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].id, Some(102_693));
        assert_eq!(photos[0].rover.as_deref(), Some("Curiosity"));
        assert_eq!(
            photos[0].camera.as_deref(),
            Some("Front Hazard Avoidance Camera")
        );
    }

    #[test]
    fn test_missing_photos_field_defaults_to_empty() {
        let response: PhotosResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.photos.is_empty());
    }

    #[test]
    fn test_photo_without_nested_objects() {
        let response: PhotosResponse =
            serde_json::from_value(json!({"photos": [{"id": 1}]})).unwrap();
        let photo = RoverPhoto::from(response.photos.into_iter().next().unwrap());
        assert!(photo.rover.is_none());
        assert!(photo.camera.is_none());
    }

    #[test]
    fn test_write_photos_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("mars_photos.json");
        let photos = vec![RoverPhoto {
            id: Some(1),
            img_src: Some("https://mars.nasa.gov/1.jpg".to_string()),
            earth_date: Some("2015-05-30".to_string()),
            rover: Some("Curiosity".to_string()),
            camera: None,
        }];

        write_photos(&path, &photos).unwrap();

        let written: Vec<RoverPhoto> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, photos);
    }
}
