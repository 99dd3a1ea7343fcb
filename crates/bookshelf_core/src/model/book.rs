//! Book domain model and field rules.
//!
//! # Responsibility
//! - Define the canonical `Book` record and its per-operation inputs.
//! - Own the ordered field rule table used by every write path.
//!
//! # Invariants
//! - `id` and `created_at` are assigned by storage and never taken from
//!   caller input.
//! - `title` and `author` must not be blank for any persisted book.
//! - Rule evaluation order is the order of [`BOOK_FIELD_RULES`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier assigned by storage on create.
pub type BookId = Uuid;

/// Fields a caller may submit for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    Title,
    Author,
    Genre,
    Year,
}

impl BookField {
    /// Human-facing label used in violation messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Genre => "Genre",
            Self::Year => "Year",
        }
    }
}

/// Check applied to one submitted field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Value must be supplied and contain a non-whitespace character.
    NonEmpty,
    /// Value, when not blank, must parse as a whole number.
    WholeNumber,
}

/// One entry of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRuleSpec {
    pub field: BookField,
    pub rule: FieldRule,
    pub message: &'static str,
}

/// Ordered rule table. Violations are always reported in this order.
pub const BOOK_FIELD_RULES: &[FieldRuleSpec] = &[
    FieldRuleSpec {
        field: BookField::Title,
        rule: FieldRule::NonEmpty,
        message: "\"Title\" is required",
    },
    FieldRuleSpec {
        field: BookField::Author,
        rule: FieldRule::NonEmpty,
        message: "\"Author\" is required",
    },
    FieldRuleSpec {
        field: BookField::Year,
        rule: FieldRule::WholeNumber,
        message: "\"Year\" must be a whole number",
    },
];

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: BookField,
    pub message: &'static str,
}

/// Field-level validation failure carrying every violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookValidationError {
    violations: Vec<FieldViolation>,
}

impl BookValidationError {
    /// Returns violations in rule-table order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns one message per violated rule.
    pub fn messages(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|violation| violation.message.to_string())
            .collect()
    }

    fn from_violations(violations: Vec<FieldViolation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self { violations })
        }
    }
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "book validation failed: {}", self.messages().join("; "))
    }
}

impl Error for BookValidationError {}

/// Canonical persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i64>,
    /// Unix epoch milliseconds. Display only.
    pub created_at: i64,
}

impl Book {
    /// Formats `created_at` as `Month D, YYYY` in UTC.
    ///
    /// Returns an empty string when the stored timestamp is out of range.
    pub fn published_at(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.created_at)
            .map(|at| at.format("%B %-d, %Y").to_string())
            .unwrap_or_default()
    }

    /// Merges supplied patch fields into this record.
    ///
    /// Fields absent from the patch are left untouched.
    pub fn apply_patch(&mut self, patch: &BookPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(genre) = &patch.genre {
            self.genre = genre.clone();
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
    }

    /// Checks the required-field rules on a fully merged record.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_required(&self.title, &self.author)
    }
}

/// Typed input for creating a book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i64>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: None,
            year: None,
        }
    }

    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_required(&self.title, &self.author)
    }
}

/// Typed partial update. `None` means "leave untouched".
///
/// `genre` and `year` use a nested option so a caller can clear them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Option<String>>,
    pub year: Option<Option<i64>>,
}

/// Raw values as submitted by a caller, before any coercion.
///
/// Kept verbatim so a rejected form can be redisplayed exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl BookInput {
    /// Pre-populates form values from a stored record.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: Some(book.title.clone()),
            author: Some(book.author.clone()),
            genre: book.genre.clone(),
            year: book.year.map(|year| year.to_string()),
        }
    }

    /// Converts submitted values into a create input.
    ///
    /// Missing `title`/`author` are treated as empty submissions.
    pub fn to_new_book(&self) -> Result<NewBook, BookValidationError> {
        let title = self.title.as_deref().unwrap_or("");
        let author = self.author.as_deref().unwrap_or("");
        BookValidationError::from_violations(evaluate_rules(|field| match field {
            BookField::Title => Some(title),
            BookField::Author => Some(author),
            BookField::Genre => self.genre.as_deref(),
            BookField::Year => self.year.as_deref(),
        }))?;

        Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: optional_text(self.genre.as_deref()),
            year: optional_year(self.year.as_deref()),
        })
    }

    /// Converts submitted values into a partial update.
    ///
    /// Only fields present in the input are checked and merged. A blank
    /// `genre` or `year` clears the stored value.
    pub fn to_patch(&self) -> Result<BookPatch, BookValidationError> {
        BookValidationError::from_violations(evaluate_rules(|field| match field {
            BookField::Title => self.title.as_deref(),
            BookField::Author => self.author.as_deref(),
            BookField::Genre => self.genre.as_deref(),
            BookField::Year => self.year.as_deref(),
        }))?;

        Ok(BookPatch {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.as_deref().map(|value| optional_text(Some(value))),
            year: self.year.as_deref().map(|value| optional_year(Some(value))),
        })
    }
}

/// Runs the rule table against submitted values.
///
/// `lookup` returns `None` for fields that were not supplied; their rules are
/// skipped.
fn evaluate_rules<'a>(lookup: impl Fn(BookField) -> Option<&'a str>) -> Vec<FieldViolation> {
    BOOK_FIELD_RULES
        .iter()
        .filter_map(|spec| {
            let value = lookup(spec.field)?;
            let ok = match spec.rule {
                FieldRule::NonEmpty => !value.trim().is_empty(),
                FieldRule::WholeNumber => {
                    value.trim().is_empty() || value.trim().parse::<i64>().is_ok()
                }
            };
            (!ok).then_some(FieldViolation {
                field: spec.field,
                message: spec.message,
            })
        })
        .collect()
}

fn validate_required(title: &str, author: &str) -> Result<(), BookValidationError> {
    let violations = BOOK_FIELD_RULES
        .iter()
        .filter(|spec| spec.rule == FieldRule::NonEmpty)
        .filter(|spec| match spec.field {
            BookField::Title => title.trim().is_empty(),
            BookField::Author => author.trim().is_empty(),
            _ => false,
        })
        .map(|spec| FieldViolation {
            field: spec.field,
            message: spec.message,
        })
        .collect();
    BookValidationError::from_violations(violations)
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

// Callers must have run the WholeNumber rule first.
fn optional_year(value: Option<&str>) -> Option<i64> {
    value.and_then(|text| text.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::{Book, BookField, BookInput, BookPatch, NewBook};
    use uuid::Uuid;

    fn input(title: &str, author: &str) -> BookInput {
        BookInput {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            ..BookInput::default()
        }
    }

    #[test]
    fn empty_title_and_author_report_two_messages_in_rule_order() {
        let err = input("", "  ").to_new_book().unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "\"Title\" is required".to_string(),
                "\"Author\" is required".to_string()
            ]
        );
    }

    #[test]
    fn missing_fields_on_create_count_as_empty() {
        let err = BookInput::default().to_new_book().unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn non_numeric_year_is_a_field_violation() {
        let mut values = input("Dune", "Herbert");
        values.year = Some("nineteen".to_string());
        let err = values.to_new_book().unwrap_err();
        assert_eq!(err.violations()[0].field, BookField::Year);
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut values = input("Dune", "Herbert");
        values.genre = Some(" ".to_string());
        values.year = Some(String::new());
        let book = values.to_new_book().unwrap();
        assert_eq!(book.genre, None);
        assert_eq!(book.year, None);
    }

    #[test]
    fn patch_only_checks_supplied_fields() {
        let values = BookInput {
            genre: Some("Sci-Fi".to_string()),
            ..BookInput::default()
        };
        let patch = values.to_patch().unwrap();
        assert_eq!(patch.title, None);
        assert_eq!(patch.genre, Some(Some("Sci-Fi".to_string())));

        let blank_title = BookInput {
            title: Some(String::new()),
            ..BookInput::default()
        };
        assert!(blank_title.to_patch().is_err());
    }

    #[test]
    fn apply_patch_merges_and_can_clear_optionals() {
        let mut book = Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: Some("Sci-Fi".to_string()),
            year: Some(1965),
            created_at: 0,
        };
        book.apply_patch(&BookPatch {
            title: Some("Dune Messiah".to_string()),
            year: Some(None),
            ..BookPatch::default()
        });
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.author, "Herbert");
        assert_eq!(book.genre.as_deref(), Some("Sci-Fi"));
        assert_eq!(book.year, None);
    }

    #[test]
    fn published_at_formats_month_day_year() {
        let book = Book {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            author: "a".to_string(),
            genre: None,
            year: None,
            // 2024-03-04T12:00:00Z
            created_at: 1_709_553_600_000,
        };
        assert_eq!(book.published_at(), "March 4, 2024");
    }

    #[test]
    fn new_book_validate_rejects_blank_author() {
        let err = NewBook::new("Dune", "").validate().unwrap_err();
        assert_eq!(err.violations()[0].field, BookField::Author);
    }
}
