use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use yelpcamp_types::api::ReviewInput;
use yelpcamp_types::models::Review;

use crate::Database;
use crate::models::ReviewRow;
use crate::queries::{OptionalExt, parse_id};

impl Database {
    // -- Reviews --

    /// Insert a review and link it to its campground in one transaction.
    /// Returns `None` without writing anything if the campground is missing.
    pub fn insert_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
        input: &ReviewInput,
        author: Uuid,
    ) -> Result<Option<Review>> {
        self.with_conn_mut(|conn| {
            let cid = campground_id.to_string();
            let rid = review_id.to_string();
            let tx = conn.transaction()?;

            let parent = tx
                .query_row("SELECT 1 FROM campgrounds WHERE id = ?1", [&cid], |_| Ok(()))
                .optional()?;
            if parent.is_none() {
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO reviews (id, body, rating, author_id) VALUES (?1, ?2, ?3, ?4)",
                params![rid, input.body, input.rating, author.to_string()],
            )?;
            tx.execute(
                "INSERT INTO campground_reviews (campground_id, review_id) VALUES (?1, ?2)",
                params![cid, rid],
            )?;
            tx.commit()?;

            Ok(Some(Review {
                id: review_id,
                body: input.body.clone(),
                rating: input.rating,
                author,
            }))
        })
    }

    pub fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, body, rating, author_id FROM reviews WHERE id = ?1",
                [id.to_string()],
                read_review_row,
            )
            .optional()?
            .map(ReviewRow::into_review)
            .transpose()
        })
    }

    /// The review, only if it is linked to `campground_id`.
    pub fn get_campground_review(&self, campground_id: Uuid, review_id: Uuid) -> Result<Option<Review>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT r.id, r.body, r.rating, r.author_id
                 FROM reviews r
                 JOIN campground_reviews cr ON cr.review_id = r.id
                 WHERE r.id = ?1 AND cr.campground_id = ?2",
                params![review_id.to_string(), campground_id.to_string()],
                read_review_row,
            )
            .optional()?
            .map(ReviewRow::into_review)
            .transpose()
        })
    }

    /// Unlink the review from the campground and delete it. Deleting a review
    /// that is already gone succeeds. A review linked to some other campground
    /// is left alone.
    pub fn delete_review(&self, campground_id: Uuid, review_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            let rid = review_id.to_string();
            let tx = conn.transaction()?;
            let unlinked = tx.execute(
                "DELETE FROM campground_reviews WHERE campground_id = ?1 AND review_id = ?2",
                params![campground_id.to_string(), rid],
            )?;
            if unlinked > 0 {
                tx.execute("DELETE FROM reviews WHERE id = ?1", [&rid])?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

impl ReviewRow {
    fn into_review(self) -> Result<Review> {
        Ok(Review {
            id: parse_id(&self.id)?,
            body: self.body,
            rating: self.rating,
            author: parse_id(&self.author_id)?,
        })
    }
}

fn read_review_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        body: row.get(1)?,
        rating: row.get(2)?,
        author_id: row.get(3)?,
    })
}
