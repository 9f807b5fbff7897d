//! Rows as they come out of SQLite. Campground and review queries turn these
//! into `yelpcamp_types` models before returning.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct CampgroundRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub geometry_lng: Option<f64>,
    pub geometry_lat: Option<f64>,
    pub author_id: String,
}

pub struct ImageRow {
    pub campground_id: String,
    pub url: String,
    pub filename: String,
}

pub struct ReviewRow {
    pub id: String,
    pub body: String,
    pub rating: u8,
    pub author_id: String,
}

pub struct SessionRow {
    pub id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub return_to: Option<String>,
}

pub struct FlashRow {
    pub severity: String,
    pub message: String,
}
