/// Campground/review aggregate behaviour against a real (in-memory) SQLite
/// database: creation, expansion, image bookkeeping and cascade delete.
use uuid::Uuid;

use yelpcamp_db::Database;
use yelpcamp_types::api::{CampgroundInput, ReviewInput};
use yelpcamp_types::models::{Geometry, Image};

fn user(db: &Database, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(&id.to_string(), name, &format!("{}@example.com", name), "hash")
        .unwrap();
    id
}

fn input(title: &str) -> CampgroundInput {
    CampgroundInput {
        title: title.to_string(),
        price: 15.0,
        location: "Moab, Utah".to_string(),
        description: "Red rock views".to_string(),
    }
}

fn image(name: &str) -> Image {
    Image {
        url: format!("https://img.example.com/{}.jpg", name),
        filename: format!("YelpCamp/{}", name),
    }
}

fn review(rating: u8) -> ReviewInput {
    ReviewInput {
        body: "Loved it".to_string(),
        rating,
    }
}

#[test]
fn created_campground_has_author_and_no_reviews() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let id = Uuid::new_v4();

    db.insert_campground(id, &input("Arches"), Some(Geometry::point(-109.5, 38.6)), &[image("a")], owner)
        .unwrap();

    let camp = db.get_campground(id).unwrap().unwrap();
    assert_eq!(camp.author, owner);
    assert!(camp.reviews.is_empty());
    assert_eq!(camp.images, vec![image("a")]);
    assert_eq!(camp.geometry, Some(Geometry::point(-109.5, 38.6)));

    let detail = db.get_campground_detail(id).unwrap().unwrap();
    assert_eq!(detail.author.username, "owner");
    assert!(detail.reviews.is_empty());
}

#[test]
fn missing_campground_reads_as_none() {
    let db = Database::open_in_memory().unwrap();
    let id = Uuid::new_v4();
    assert!(db.get_campground(id).unwrap().is_none());
    assert!(db.get_campground_detail(id).unwrap().is_none());
    assert!(db.delete_campground(id).unwrap().is_none());
}

#[test]
fn detail_expands_reviews_with_their_authors() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let critic = user(&db, "critic");
    let id = Uuid::new_v4();
    db.insert_campground(id, &input("Zion"), None, &[], owner).unwrap();

    let r1 = db.insert_review(id, Uuid::new_v4(), &review(4), critic).unwrap().unwrap();
    let r2 = db.insert_review(id, Uuid::new_v4(), &review(2), owner).unwrap().unwrap();

    let camp = db.get_campground(id).unwrap().unwrap();
    assert_eq!(camp.reviews, vec![r1.id, r2.id]);

    let detail = db.get_campground_detail(id).unwrap().unwrap();
    assert_eq!(detail.reviews.len(), 2);
    assert_eq!(detail.reviews[0].author.username, "critic");
    assert_eq!(detail.reviews[0].rating, 4);
    assert_eq!(detail.reviews[1].author.username, "owner");
}

#[test]
fn review_on_missing_campground_writes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let critic = user(&db, "critic");
    let review_id = Uuid::new_v4();

    let created = db.insert_review(Uuid::new_v4(), review_id, &review(5), critic).unwrap();
    assert!(created.is_none());
    assert!(db.get_review(review_id).unwrap().is_none());
}

#[test]
fn deleting_campground_cascades_to_its_reviews_only() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let critic = user(&db, "critic");
    let doomed = Uuid::new_v4();
    let kept = Uuid::new_v4();
    db.insert_campground(doomed, &input("Doomed"), None, &[image("d")], owner).unwrap();
    db.insert_campground(kept, &input("Kept"), None, &[], owner).unwrap();

    let r1 = db.insert_review(doomed, Uuid::new_v4(), &review(3), critic).unwrap().unwrap();
    let r2 = db.insert_review(doomed, Uuid::new_v4(), &review(1), owner).unwrap().unwrap();
    let other = db.insert_review(kept, Uuid::new_v4(), &review(5), critic).unwrap().unwrap();

    assert_eq!(db.delete_campground(doomed).unwrap(), Some(2));

    assert!(db.get_campground(doomed).unwrap().is_none());
    assert!(db.get_review(r1.id).unwrap().is_none());
    assert!(db.get_review(r2.id).unwrap().is_none());
    assert!(db.get_review(other.id).unwrap().is_some());
    assert_eq!(db.get_campground(kept).unwrap().unwrap().reviews, vec![other.id]);
}

#[test]
fn deleting_campground_without_reviews_succeeds() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let id = Uuid::new_v4();
    db.insert_campground(id, &input("Empty"), None, &[], owner).unwrap();

    assert_eq!(db.delete_campground(id).unwrap(), Some(0));
    assert!(db.list_campgrounds().unwrap().is_empty());
}

#[test]
fn review_delete_unlinks_and_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let id = Uuid::new_v4();
    db.insert_campground(id, &input("Joshua Tree"), None, &[], owner).unwrap();
    let r = db.insert_review(id, Uuid::new_v4(), &review(4), owner).unwrap().unwrap();

    db.delete_review(id, r.id).unwrap();
    assert!(db.get_review(r.id).unwrap().is_none());
    assert!(db.get_campground(id).unwrap().unwrap().reviews.is_empty());

    // Second delete of the same review is a no-op success.
    db.delete_review(id, r.id).unwrap();
}

#[test]
fn update_appends_and_removes_images_by_filename() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let id = Uuid::new_v4();
    db.insert_campground(id, &input("Old"), None, &[image("a"), image("b")], owner).unwrap();

    let removed = db
        .update_campground(
            id,
            &input("New"),
            &[image("c")],
            &["YelpCamp/a".to_string(), "YelpCamp/not-ours".to_string()],
        )
        .unwrap()
        .unwrap();
    assert_eq!(removed, vec![image("a")]);

    let camp = db.get_campground(id).unwrap().unwrap();
    assert_eq!(camp.title, "New");
    assert_eq!(camp.images, vec![image("b"), image("c")]);
}

#[test]
fn update_of_missing_campground_is_none() {
    let db = Database::open_in_memory().unwrap();
    let updated = db.update_campground(Uuid::new_v4(), &input("X"), &[image("x")], &[]).unwrap();
    assert!(updated.is_none());
}

#[test]
fn list_returns_every_campground_with_images_and_reviews() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    db.insert_campground(first, &input("First"), None, &[image("f")], owner).unwrap();
    db.insert_campground(second, &input("Second"), None, &[], owner).unwrap();
    let r = db.insert_review(second, Uuid::new_v4(), &review(5), owner).unwrap().unwrap();

    let all = db.list_campgrounds().unwrap();
    assert_eq!(all.len(), 2);
    let f = all.iter().find(|c| c.id == first).unwrap();
    let s = all.iter().find(|c| c.id == second).unwrap();
    assert_eq!(f.images, vec![image("f")]);
    assert_eq!(s.reviews, vec![r.id]);
}

#[test]
fn delete_all_campgrounds_leaves_no_orphan_reviews() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let id = Uuid::new_v4();
    db.insert_campground(id, &input("Seeded"), None, &[], owner).unwrap();
    let r = db.insert_review(id, Uuid::new_v4(), &review(3), owner).unwrap().unwrap();

    assert_eq!(db.delete_all_campgrounds().unwrap(), 1);
    assert!(db.get_review(r.id).unwrap().is_none());
}

#[test]
fn duplicate_username_is_a_constraint_violation() {
    let db = Database::open_in_memory().unwrap();
    user(&db, "ranger");

    let err = db
        .create_user(&Uuid::new_v4().to_string(), "ranger", "other@example.com", "hash")
        .unwrap_err();
    assert!(yelpcamp_db::is_constraint_violation(&err));

    assert!(!yelpcamp_db::is_constraint_violation(&anyhow::anyhow!("disk full")));
}

#[test]
fn review_is_scoped_to_its_campground() {
    let db = Database::open_in_memory().unwrap();
    let owner = user(&db, "owner");
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    db.insert_campground(a, &input("Arches"), None, &[], owner).unwrap();
    db.insert_campground(b, &input("Bryce"), None, &[], owner).unwrap();
    let r = db.insert_review(a, Uuid::new_v4(), &review(5), owner).unwrap().unwrap();

    assert_eq!(db.get_campground_review(a, r.id).unwrap().unwrap().id, r.id);
    assert!(db.get_campground_review(b, r.id).unwrap().is_none());

    db.delete_review(b, r.id).unwrap();
    assert!(db.get_review(r.id).unwrap().is_some());
    assert_eq!(db.get_campground(a).unwrap().unwrap().reviews, vec![r.id]);
}
