use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Transaction, params};
use tracing::debug;
use uuid::Uuid;

use yelpcamp_types::api::CampgroundInput;
use yelpcamp_types::models::{
    Campground, CampgroundDetail, Geometry, Image, ReviewDetail, UserSummary,
};

use crate::Database;
use crate::models::{CampgroundRow, ImageRow};
use crate::queries::{OptionalExt, parse_id};

const CAMPGROUND_COLUMNS: &str =
    "c.id, c.title, c.description, c.location, c.price, c.geometry_lng, c.geometry_lat, c.author_id";

impl Database {
    // -- Campgrounds --

    /// Every campground, oldest first. Full scan; images and review ids are
    /// fetched in two extra queries rather than per row.
    pub fn list_campgrounds(&self) -> Result<Vec<Campground>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM campgrounds c ORDER BY c.created_at, c.rowid",
                CAMPGROUND_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], read_campground_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut images: HashMap<String, Vec<Image>> = HashMap::new();
            for img in query_images(conn, None)? {
                images.entry(img.campground_id).or_default().push(Image {
                    url: img.url,
                    filename: img.filename,
                });
            }

            let mut reviews: HashMap<String, Vec<Uuid>> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT cr.campground_id, cr.review_id
                 FROM campground_reviews cr
                 JOIN reviews r ON r.id = cr.review_id
                 ORDER BY r.created_at, r.rowid",
            )?;
            let links = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (campground_id, review_id) in links {
                reviews.entry(campground_id).or_default().push(parse_id(&review_id)?);
            }

            rows.into_iter()
                .map(|row| {
                    let imgs = images.remove(&row.id).unwrap_or_default();
                    let revs = reviews.remove(&row.id).unwrap_or_default();
                    assemble(row, imgs, revs)
                })
                .collect()
        })
    }

    pub fn insert_campground(
        &self,
        id: Uuid,
        input: &CampgroundInput,
        geometry: Option<Geometry>,
        images: &[Image],
        author: Uuid,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO campgrounds
                    (id, title, description, location, price, geometry_lng, geometry_lat, author_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    input.title,
                    input.description,
                    input.location,
                    input.price,
                    geometry.map(|g| g.lng()),
                    geometry.map(|g| g.lat()),
                    author.to_string(),
                ],
            )?;
            append_images(&tx, &id.to_string(), images)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// The stored campground with author and reviews as references.
    pub fn get_campground(&self, id: Uuid) -> Result<Option<Campground>> {
        self.with_conn(|conn| query_campground(conn, &id.to_string()))
    }

    /// The campground with its author, its reviews and each review's author
    /// expanded.
    pub fn get_campground_detail(&self, id: Uuid) -> Result<Option<CampgroundDetail>> {
        self.with_conn(|conn| {
            let cid = id.to_string();
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {}, u.username
                         FROM campgrounds c
                         JOIN users u ON u.id = c.author_id
                         WHERE c.id = ?1",
                        CAMPGROUND_COLUMNS
                    ),
                    [&cid],
                    |row| Ok((read_campground_row(row)?, row.get::<_, String>(8)?)),
                )
                .optional()?;

            let Some((row, author_username)) = row else {
                return Ok(None);
            };

            let images = query_images(conn, Some(&cid))?
                .into_iter()
                .map(|img| Image {
                    url: img.url,
                    filename: img.filename,
                })
                .collect();

            let mut stmt = conn.prepare(
                "SELECT r.id, r.body, r.rating, r.author_id, u.username
                 FROM campground_reviews cr
                 JOIN reviews r ON r.id = cr.review_id
                 JOIN users u ON u.id = r.author_id
                 WHERE cr.campground_id = ?1
                 ORDER BY r.created_at, r.rowid",
            )?;
            let review_rows = stmt
                .query_map([&cid], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u8>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut reviews = Vec::with_capacity(review_rows.len());
            for (rid, body, rating, author_id, username) in review_rows {
                reviews.push(ReviewDetail {
                    id: parse_id(&rid)?,
                    body,
                    rating,
                    author: UserSummary {
                        id: parse_id(&author_id)?,
                        username,
                    },
                });
            }

            Ok(Some(CampgroundDetail {
                id: parse_id(&row.id)?,
                title: row.title,
                description: row.description,
                location: row.location,
                price: row.price,
                images,
                geometry: geometry_of(row.geometry_lng, row.geometry_lat),
                author: UserSummary {
                    id: parse_id(&row.author_id)?,
                    username: author_username,
                },
                reviews,
            }))
        })
    }

    /// Apply new field values, append `new_images`, and drop every image whose
    /// filename is in `delete_filenames`, all in one transaction.
    ///
    /// Returns the images that were actually removed (so the caller can
    /// delete them from the image host), or `None` if the campground does not
    /// exist. Filenames not attached to this campground are ignored.
    pub fn update_campground(
        &self,
        id: Uuid,
        input: &CampgroundInput,
        new_images: &[Image],
        delete_filenames: &[String],
    ) -> Result<Option<Vec<Image>>> {
        self.with_conn_mut(|conn| {
            let cid = id.to_string();
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE campgrounds SET title = ?2, description = ?3, location = ?4, price = ?5
                 WHERE id = ?1",
                params![cid, input.title, input.description, input.location, input.price],
            )?;
            if updated == 0 {
                return Ok(None);
            }

            append_images(&tx, &cid, new_images)?;

            let mut removed = Vec::new();
            for filename in delete_filenames {
                let mut stmt = tx.prepare(
                    "DELETE FROM campground_images
                     WHERE campground_id = ?1 AND filename = ?2
                     RETURNING url, filename",
                )?;
                let rows = stmt
                    .query_map(params![cid, filename], |row| {
                        Ok(Image {
                            url: row.get(0)?,
                            filename: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                removed.extend(rows);
            }

            tx.commit()?;
            Ok(Some(removed))
        })
    }

    /// Delete a campground together with every review it references.
    ///
    /// Reviews go first, then the campground, in a single transaction, so no
    /// reader ever sees one without the other. Returns the number of reviews
    /// removed, or `None` if the campground does not exist.
    pub fn delete_campground(&self, id: Uuid) -> Result<Option<usize>> {
        self.with_conn_mut(|conn| {
            let cid = id.to_string();
            let tx = conn.transaction()?;

            let exists = tx
                .query_row("SELECT 1 FROM campgrounds WHERE id = ?1", [&cid], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let reviews = delete_reviews_of(&tx, &cid)?;
            tx.execute("DELETE FROM campgrounds WHERE id = ?1", [&cid])?;
            tx.commit()?;

            debug!("Deleted campground {} and {} reviews", cid, reviews);
            Ok(Some(reviews))
        })
    }

    /// Delete every campground and, with them, every review they reference.
    pub fn delete_all_campgrounds(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM reviews WHERE id IN (SELECT review_id FROM campground_reviews)",
                [],
            )?;
            let count = tx.execute("DELETE FROM campgrounds", [])?;
            tx.commit()?;
            Ok(count)
        })
    }
}

/// Cascade step: remove the reviews a campground references. The link rows
/// follow through `ON DELETE CASCADE`.
fn delete_reviews_of(tx: &Transaction<'_>, campground_id: &str) -> Result<usize> {
    let count = tx.execute(
        "DELETE FROM reviews
         WHERE id IN (SELECT review_id FROM campground_reviews WHERE campground_id = ?1)",
        [campground_id],
    )?;
    Ok(count)
}

fn append_images(conn: &Connection, campground_id: &str, images: &[Image]) -> Result<()> {
    if images.is_empty() {
        return Ok(());
    }

    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM campground_images WHERE campground_id = ?1",
        [campground_id],
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO campground_images (campground_id, position, url, filename)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (offset, image) in images.iter().enumerate() {
        stmt.execute(params![
            campground_id,
            next + offset as i64,
            image.url,
            image.filename
        ])?;
    }
    Ok(())
}

fn query_campground(conn: &Connection, id: &str) -> Result<Option<Campground>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM campgrounds c WHERE c.id = ?1", CAMPGROUND_COLUMNS),
            [id],
            read_campground_row,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let images = query_images(conn, Some(id))?
        .into_iter()
        .map(|img| Image {
            url: img.url,
            filename: img.filename,
        })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT cr.review_id
         FROM campground_reviews cr
         JOIN reviews r ON r.id = cr.review_id
         WHERE cr.campground_id = ?1
         ORDER BY r.created_at, r.rowid",
    )?;
    let reviews = stmt
        .query_map([id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .iter()
        .map(|rid| parse_id(rid))
        .collect::<Result<Vec<_>>>()?;

    assemble(row, images, reviews).map(Some)
}

/// Images in position order, for one campground or (with `None`) for all.
fn query_images(conn: &Connection, campground_id: Option<&str>) -> Result<Vec<ImageRow>> {
    let rows = match campground_id {
        Some(cid) => {
            let mut stmt = conn.prepare(
                "SELECT campground_id, url, filename FROM campground_images
                 WHERE campground_id = ?1 ORDER BY position",
            )?;
            stmt.query_map([cid], read_image_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT campground_id, url, filename FROM campground_images
                 ORDER BY campground_id, position",
            )?;
            stmt.query_map([], read_image_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn read_image_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        campground_id: row.get(0)?,
        url: row.get(1)?,
        filename: row.get(2)?,
    })
}

fn read_campground_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CampgroundRow> {
    Ok(CampgroundRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        price: row.get(4)?,
        geometry_lng: row.get(5)?,
        geometry_lat: row.get(6)?,
        author_id: row.get(7)?,
    })
}

fn assemble(row: CampgroundRow, images: Vec<Image>, reviews: Vec<Uuid>) -> Result<Campground> {
    Ok(Campground {
        id: parse_id(&row.id)?,
        title: row.title,
        description: row.description,
        location: row.location,
        price: row.price,
        images,
        geometry: geometry_of(row.geometry_lng, row.geometry_lat),
        author: parse_id(&row.author_id)?,
        reviews,
    })
}

fn geometry_of(lng: Option<f64>, lat: Option<f64>) -> Option<Geometry> {
    match (lng, lat) {
        (Some(lng), Some(lat)) => Some(Geometry::point(lng, lat)),
        _ => None,
    }
}
