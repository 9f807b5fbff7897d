use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The public face of a user, used wherever an `author` is expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// A hosted image. `filename` is the image host's identifier and is what
/// deletions are keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
}

/// GeoJSON point, coordinates ordered `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: [f64; 2],
}

impl Geometry {
    pub fn point(lng: f64, lat: f64) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A campground as stored: author and reviews are references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campground {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    pub author: Uuid,
    pub reviews: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub body: String,
    pub rating: u8,
    pub author: Uuid,
}

/// Review with its author expanded, as shown on a campground page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDetail {
    pub id: Uuid,
    pub body: String,
    pub rating: u8,
    pub author: UserSummary,
}

/// Campground with its author and reviews (and their authors) expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampgroundDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    pub author: UserSummary,
    pub reviews: Vec<ReviewDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_serializes_as_geojson_point() {
        let g = Geometry::point(-119.5383, 37.8651);
        let json = serde_json::to_value(g).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -119.5383);
        assert_eq!(json["coordinates"][1], 37.8651);
    }

    #[test]
    fn campground_without_geometry_omits_field() {
        let camp = Campground {
            id: Uuid::new_v4(),
            title: "Pine Hollow".into(),
            description: "Quiet".into(),
            location: "Bend, Oregon".into(),
            price: 12.0,
            images: vec![],
            geometry: None,
            author: Uuid::new_v4(),
            reviews: vec![],
        };
        let json = serde_json::to_value(&camp).unwrap();
        assert!(json.get("geometry").is_none());
    }
}
