use serde::{Deserialize, Serialize};

/// A single photo taken by a Mars rover, flattened from the API's nested
/// `rover` and `camera` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverPhoto {
    pub id: Option<i64>,

    /// Direct link to the full-size image.
    pub img_src: Option<String>,

    /// Earth date the photo was taken, as returned by the API.
    pub earth_date: Option<String>,

    /// Rover name (e.g. "Curiosity").
    pub rover: Option<String>,

    /// Full camera name (e.g. "Front Hazard Avoidance Camera").
    pub camera: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rover_photo_json_shape() {
        let photo = RoverPhoto {
            id: Some(102_693),
            img_src: Some("https://mars.nasa.gov/photo.jpg".to_string()),
            earth_date: Some("2015-06-03".to_string()),
            rover: Some("Curiosity".to_string()),
            camera: Some("Front Hazard Avoidance Camera".to_string()),
        };

        let json = serde_json::to_value(&photo).unwrap();
        assert_eq!(json["id"], 102_693);
        assert_eq!(json["rover"], "Curiosity");
        assert_eq!(json["camera"], "Front Hazard Avoidance Camera");
    }
}
