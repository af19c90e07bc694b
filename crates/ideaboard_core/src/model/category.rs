//! Category (board column) model.
//!
//! # Invariants
//! - `title`, `icon` and `color` are trimmed and never blank.
//! - Categories are not reordered by core.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one category.
pub type CategoryId = Uuid;

/// Named, styled container of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    /// Emoji or glyph token.
    pub icon: String,
    /// Display color token.
    pub color: String,
}

/// Editable category field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    Title,
    Icon,
    Color,
}

impl CategoryField {
    /// Stable string id used by rendering callers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Icon => "icon",
            Self::Color => "color",
        }
    }
}

/// Category field validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Field value is blank after trim.
    BlankField(CategoryField),
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => {
                write!(f, "category {} must not be blank", field.as_str())
            }
        }
    }
}

impl Error for CategoryValidationError {}

impl Category {
    /// Creates a validated category with a generated ID.
    pub fn try_new(
        title: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<Self, CategoryValidationError> {
        Self::try_with_id(Uuid::new_v4(), title, icon, color)
    }

    /// Creates a validated category with a caller-provided ID.
    pub fn try_with_id(
        id: CategoryId,
        title: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<Self, CategoryValidationError> {
        Ok(Self {
            id,
            title: normalize_field(CategoryField::Title, title.into())?,
            icon: normalize_field(CategoryField::Icon, icon.into())?,
            color: normalize_field(CategoryField::Color, color.into())?,
        })
    }

    /// Replaces one field after validation. On error the category is untouched.
    pub fn set_field(
        &mut self,
        field: CategoryField,
        value: impl Into<String>,
    ) -> Result<(), CategoryValidationError> {
        let normalized = normalize_field(field, value.into())?;
        match field {
            CategoryField::Title => self.title = normalized,
            CategoryField::Icon => self.icon = normalized,
            CategoryField::Color => self.color = normalized,
        }
        Ok(())
    }
}

fn normalize_field(field: CategoryField, value: String) -> Result<String, CategoryValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CategoryValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}
