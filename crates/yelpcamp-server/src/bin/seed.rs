//! Replace every campground with 50 random ones owned by an existing user.
//!
//! Usage: `yelpcamp-seed <author-username>`

use anyhow::{Context, Result};
use rand::{Rng, seq::IndexedRandom};
use tracing::info;
use uuid::Uuid;

use yelpcamp_db::Database;
use yelpcamp_server::config;
use yelpcamp_types::api::CampgroundInput;
use yelpcamp_types::models::{Geometry, Image};

const CAMPGROUNDS: usize = 50;

const DESCRIPTION: &str = "Lorem, ipsum dolor sit amet consectetur adipisicing elit. Et cumque cupiditate \
expedita magnam sequi hic aperiam perspiciatis reiciendis, nulla, odio aliquid maiores. Quas tempora \
sequi corporis iusto omnis sit nihil.";

const DESCRIPTORS: &[&str] = &[
    "Forest", "Ancient", "Petrified", "Roaring", "Cascade", "Tumbling", "Silent", "Redwood",
    "Bullfrog", "Maple", "Misty", "Elk", "Grizzly", "Ocean", "Sea", "Sky", "Dusty", "Diamond",
];

const PLACES: &[&str] = &[
    "Flats", "Village", "Canyon", "Pond", "Group Camp", "Horse Camp", "Ghost Town", "Camp",
    "Dispersed Camp", "Backcountry", "River", "Creek", "Creekside", "Bay", "Spring", "Bayshore",
    "Sands", "Mule Camp", "Hunting Camp", "Cliffs", "Hollow",
];

struct City {
    city: &'static str,
    state: &'static str,
    lng: f64,
    lat: f64,
}

const CITIES: &[City] = &[
    City { city: "Moab", state: "Utah", lng: -109.5498, lat: 38.5733 },
    City { city: "Springdale", state: "Utah", lng: -112.9980, lat: 37.1889 },
    City { city: "Flagstaff", state: "Arizona", lng: -111.6513, lat: 35.1983 },
    City { city: "Sedona", state: "Arizona", lng: -111.7610, lat: 34.8697 },
    City { city: "Boulder", state: "Colorado", lng: -105.2705, lat: 40.0150 },
    City { city: "Estes Park", state: "Colorado", lng: -105.5217, lat: 40.3772 },
    City { city: "Jackson", state: "Wyoming", lng: -110.7624, lat: 43.4799 },
    City { city: "Bozeman", state: "Montana", lng: -111.0429, lat: 45.6770 },
    City { city: "Bend", state: "Oregon", lng: -121.3153, lat: 44.0582 },
    City { city: "Yosemite Valley", state: "California", lng: -119.5936, lat: 37.7456 },
    City { city: "Big Sur", state: "California", lng: -121.8081, lat: 36.2704 },
    City { city: "Asheville", state: "North Carolina", lng: -82.5515, lat: 35.5951 },
    City { city: "Gatlinburg", state: "Tennessee", lng: -83.5102, lat: 35.7143 },
    City { city: "Bar Harbor", state: "Maine", lng: -68.2039, lat: 44.3876 },
    City { city: "Ely", state: "Minnesota", lng: -91.8671, lat: 47.9032 },
    City { city: "Marfa", state: "Texas", lng: -104.0205, lat: 30.3094 },
];

fn sample_images() -> Vec<Image> {
    vec![
        Image {
            url: "https://res.cloudinary.com/dusen9otk/image/upload/v1657580201/YelpCamp/xm9cn0sq0kergrlorkyl.jpg".into(),
            filename: "YelpCamp/xm9cn0sq0kergrlorkyl".into(),
        },
        Image {
            url: "https://res.cloudinary.com/dusen9otk/image/upload/v1657580202/YelpCamp/aupess9t6hhjyomhjyp6.jpg".into(),
            filename: "YelpCamp/aupess9t6hhjyomhjyp6".into(),
        },
    ]
}

fn random_campground(rng: &mut impl Rng) -> Result<(CampgroundInput, Geometry)> {
    let city = CITIES.choose(rng).context("no cities")?;
    let descriptor = DESCRIPTORS.choose(rng).context("no descriptors")?;
    let place = PLACES.choose(rng).context("no places")?;

    let input = CampgroundInput {
        title: format!("{} {}", descriptor, place),
        price: rng.random_range(10..30) as f64,
        location: format!("{}, {}", city.city, city.state),
        description: DESCRIPTION.to_string(),
    };
    Ok((input, Geometry::point(city.lng, city.lat)))
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yelpcamp=info".into()),
        )
        .init();

    let username = std::env::args()
        .nth(1)
        .context("usage: yelpcamp-seed <author-username>")?;

    let db_path = config::db_path(|key| std::env::var(key).ok());
    let db = Database::open(&db_path)?;

    let author = db
        .get_user_by_username(&username)?
        .with_context(|| format!("No user named {:?}; register one first", username))?;
    let author_id: Uuid = author.id.parse()?;

    let removed = db.delete_all_campgrounds()?;
    info!("Removed {} existing campgrounds", removed);

    let mut rng = rand::rng();
    let images = sample_images();
    for _ in 0..CAMPGROUNDS {
        let (input, geometry) = random_campground(&mut rng)?;
        db.insert_campground(Uuid::new_v4(), &input, Some(geometry), &images, author_id)?;
    }

    info!("Seeded {} campgrounds for {} into {}", CAMPGROUNDS, username, db_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_campgrounds_are_well_formed() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let (input, geometry) = random_campground(&mut rng).unwrap();
            assert!((10.0..30.0).contains(&input.price));
            assert_eq!(input.price.fract(), 0.0);
            assert!(input.location.contains(", "));
            assert!(CITIES.iter().any(|c| c.lng == geometry.lng() && c.lat == geometry.lat()));
        }
    }
}
