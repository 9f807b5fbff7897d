//! Payload validation for campground and review submissions.
//!
//! Validation is pure: it reads form fields and either produces a typed input
//! or every problem it found. Nothing here touches the database.

use std::collections::BTreeMap;

use thiserror::Error;

use yelpcamp_types::api::{CampgroundInput, ReviewInput};

use crate::images::ImageUpload;

/// All field errors for one payload, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join(","))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

/// Raw form fields, keyed by bare field name. `campground[title]` and
/// `title` land in the same slot; repeated names (`deleteImages[]`) keep
/// every value.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: BTreeMap<String, Vec<String>>,
}

impl FormFields {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut fields = Self::default();
        for (name, value) in pairs {
            fields.insert(name.as_ref(), value.into());
        }
        fields
    }

    pub fn insert(&mut self, name: &str, value: String) {
        self.values
            .entry(field_name(name).to_string())
            .or_default()
            .push(value);
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.first().map(String::as_str)
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// `entity[field]` → `field`, `list[]` / `list[0]` → `list`.
pub fn field_name(raw: &str) -> &str {
    let Some(open) = raw.find('[') else {
        return raw;
    };
    let Some(inner) = raw[open + 1..].strip_suffix(']') else {
        return raw;
    };
    if inner.is_empty() || inner.bytes().all(|b| b.is_ascii_digit()) {
        &raw[..open]
    } else {
        inner
    }
}

/// A typed input that can be checked out of raw form fields.
pub trait Schema: Sized {
    fn check(fields: &FormFields) -> Result<Self, ValidationError>;
}

impl Schema for CampgroundInput {
    fn check(fields: &FormFields) -> Result<Self, ValidationError> {
        campground(fields)
    }
}

impl Schema for ReviewInput {
    fn check(fields: &FormFields) -> Result<Self, ValidationError> {
        review(fields)
    }
}

/// Either the typed input for `T` or every problem with the payload.
pub fn validate<T: Schema>(fields: &FormFields) -> Result<T, ValidationError> {
    T::check(fields)
}

fn campground(fields: &FormFields) -> Result<CampgroundInput, ValidationError> {
    let mut check = Checker::new(fields);
    let title = check.text("title");
    let price = check.number("price", Some(0.0), None);
    let location = check.text("location");
    let description = check.text("description");

    match (title, price, location, description) {
        (Some(title), Some(price), Some(location), Some(description)) if check.ok() => {
            Ok(CampgroundInput {
                title,
                price,
                location,
                description,
            })
        }
        _ => Err(check.finish()),
    }
}

/// Campground fields plus the uploaded files that come with them. Field and
/// file problems are reported together.
pub fn campground_with_uploads(
    fields: &FormFields,
    uploads: &[ImageUpload],
    max_images: usize,
) -> Result<CampgroundInput, ValidationError> {
    let upload_errors = check_uploads(uploads, max_images);
    match validate::<CampgroundInput>(fields) {
        Ok(input) if upload_errors.is_empty() => Ok(input),
        Ok(_) => Err(ValidationError {
            messages: upload_errors,
        }),
        Err(mut e) => {
            e.messages.extend(upload_errors);
            Err(e)
        }
    }
}

fn review(fields: &FormFields) -> Result<ReviewInput, ValidationError> {
    let mut check = Checker::new(fields);
    let body = check.text("body");
    let rating = check.integer("rating", 1, 5);

    match (body, rating) {
        (Some(body), Some(rating)) if check.ok() => Ok(ReviewInput {
            body,
            rating: rating as u8,
        }),
        _ => Err(check.finish()),
    }
}

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

fn check_uploads(uploads: &[ImageUpload], max_images: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if uploads.len() > max_images {
        errors.push(format!(
            "\"image\" must contain less than or equal to {} items",
            max_images
        ));
    }
    if uploads.iter().any(|u| u.extension().is_none()) {
        errors.push(format!(
            "\"image\" must be a {} or {} file",
            ALLOWED_EXTENSIONS[..ALLOWED_EXTENSIONS.len() - 1].join(", "),
            ALLOWED_EXTENSIONS[ALLOWED_EXTENSIONS.len() - 1]
        ));
    }
    errors
}

/// Accepted image extension for an upload's file name, normalised to
/// lowercase.
pub fn image_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

struct Checker<'a> {
    fields: &'a FormFields,
    errors: Vec<String>,
}

impl<'a> Checker<'a> {
    fn new(fields: &'a FormFields) -> Self {
        Self {
            fields,
            errors: Vec::new(),
        }
    }

    fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn finish(self) -> ValidationError {
        ValidationError {
            messages: self.errors,
        }
    }

    fn fail(&mut self, name: &str, rule: String) {
        self.errors.push(format!("\"{}\" {}", name, rule));
    }

    fn text(&mut self, name: &str) -> Option<String> {
        match self.fields.first(name) {
            None => {
                self.fail(name, "is required".into());
                None
            }
            Some(v) if v.trim().is_empty() => {
                self.fail(name, "is not allowed to be empty".into());
                None
            }
            Some(v) => Some(v.to_string()),
        }
    }

    fn number(&mut self, name: &str, min: Option<f64>, max: Option<f64>) -> Option<f64> {
        let Some(raw) = self.fields.first(name) else {
            self.fail(name, "is required".into());
            return None;
        };
        let value = match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                self.fail(name, "must be a number".into());
                return None;
            }
        };
        if let Some(min) = min.filter(|m| value < *m) {
            self.fail(name, format!("must be greater than or equal to {}", min));
            return None;
        }
        if let Some(max) = max.filter(|m| value > *m) {
            self.fail(name, format!("must be less than or equal to {}", max));
            return None;
        }
        Some(value)
    }

    fn integer(&mut self, name: &str, min: i64, max: i64) -> Option<i64> {
        let value = self.number(name, None, None)?;
        if value.fract() != 0.0 {
            self.fail(name, "must be an integer".into());
            return None;
        }
        let value = value as i64;
        if value < min {
            self.fail(name, format!("must be greater than or equal to {}", min));
            return None;
        }
        if value > max {
            self.fail(name, format!("must be less than or equal to {}", max));
            return None;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::from_pairs(pairs.iter().copied())
    }

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: None,
            bytes: Bytes::from_static(b"img"),
        }
    }

    #[test]
    fn accepts_minimal_campground_with_zero_price() {
        let input = campground(&fields(&[
            ("title", "Camp"),
            ("price", "0"),
            ("location", "X"),
            ("description", "Y"),
        ]))
        .unwrap();
        assert_eq!(input.price, 0.0);
        assert_eq!(input.title, "Camp");
    }

    #[test]
    fn reports_every_campground_error() {
        let err = campground(&fields(&[
            ("title", ""),
            ("price", "-1"),
            ("location", "X"),
        ]))
        .unwrap_err();

        assert_eq!(
            err.messages,
            vec![
                "\"title\" is not allowed to be empty",
                "\"price\" must be greater than or equal to 0",
                "\"description\" is required",
            ]
        );
        assert_eq!(
            err.to_string(),
            "\"title\" is not allowed to be empty,\"price\" must be greater than or equal to 0,\"description\" is required"
        );
    }

    #[test]
    fn nested_form_names_are_flattened() {
        let input = campground(&fields(&[
            ("campground[title]", "Camp"),
            ("campground[price]", "12.5"),
            ("campground[location]", "X"),
            ("campground[description]", "Y"),
        ]))
        .unwrap();
        assert_eq!(input.price, 12.5);
    }

    #[test]
    fn price_must_be_a_finite_number() {
        for bad in ["abc", "", "NaN", "inf"] {
            let err = campground(&fields(&[
                ("title", "T"),
                ("price", bad),
                ("location", "L"),
                ("description", "D"),
            ]))
            .unwrap_err();
            assert_eq!(err.messages, vec!["\"price\" must be a number"], "input {:?}", bad);
        }
    }

    #[test]
    fn review_rating_bounds_and_integrality() {
        let ok = review(&fields(&[("review[body]", "Nice"), ("review[rating]", "5")])).unwrap();
        assert_eq!(ok.rating, 5);

        let cases = [
            ("0", "\"rating\" must be greater than or equal to 1"),
            ("6", "\"rating\" must be less than or equal to 5"),
            ("3.5", "\"rating\" must be an integer"),
            ("five", "\"rating\" must be a number"),
        ];
        for (rating, message) in cases {
            let err = review(&fields(&[("body", "Nice"), ("rating", rating)])).unwrap_err();
            assert_eq!(err.messages, vec![message]);
        }
    }

    #[test]
    fn empty_review_reports_both_fields() {
        let err = review(&FormFields::default()).unwrap_err();
        assert_eq!(err.messages, vec!["\"body\" is required", "\"rating\" is required"]);
        assert_eq!(validate::<ReviewInput>(&FormFields::default()).unwrap_err(), err);
    }

    #[test]
    fn uploads_are_limited_in_count_and_type() {
        let good = fields(&[
            ("title", "T"),
            ("price", "1"),
            ("location", "L"),
            ("description", "D"),
        ]);
        assert!(campground_with_uploads(&good, &[upload("a.JPG"), upload("b.png")], 2).is_ok());

        let err = campground_with_uploads(&good, &[upload("a.jpg"), upload("b.gif"), upload("c.png")], 2)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "\"image\" must contain less than or equal to 2 items",
                "\"image\" must be a jpeg, jpg or png file",
            ]
        );
    }

    #[test]
    fn field_errors_and_upload_errors_are_combined() {
        let err = campground_with_uploads(&fields(&[("title", "T")]), &[upload("x.txt")], 10).unwrap_err();
        assert_eq!(err.messages.len(), 4);
        assert_eq!(err.messages.last().unwrap(), "\"image\" must be a jpeg, jpg or png file");
    }

    #[test]
    fn repeated_fields_keep_every_value() {
        let f = fields(&[("deleteImages[]", "a"), ("deleteImages[]", "b")]);
        assert_eq!(f.all("deleteImages"), ["a".to_string(), "b".to_string()]);
        assert!(f.all("missing").is_empty());
    }

    #[test]
    fn field_name_normalisation() {
        assert_eq!(field_name("title"), "title");
        assert_eq!(field_name("campground[title]"), "title");
        assert_eq!(field_name("deleteImages[]"), "deleteImages");
        assert_eq!(field_name("deleteImages[2]"), "deleteImages");
        assert_eq!(field_name("broken[name"), "broken[name");
    }
}
