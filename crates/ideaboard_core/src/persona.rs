//! Read-only persona preset catalog.
//!
//! # Responsibility
//! - Provide the static list of board templates offered at creation time.
//! - Turn a preset's columns into fresh categories.
//!
//! # Invariants
//! - The catalog is immutable; seeding never changes a preset.
//! - Every preset has at least one column.

use crate::model::category::{Category, CategoryValidationError};
use serde::Serialize;

/// One column template inside a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonaColumn {
    pub title: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Board template for one kind of user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonaPreset {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    /// Free-form description handed to the idea assistant.
    pub context: &'static str,
    pub columns: &'static [PersonaColumn],
}

const fn column(title: &'static str, icon: &'static str, color: &'static str) -> PersonaColumn {
    PersonaColumn { title, icon, color }
}

const PRESETS: &[PersonaPreset] = &[
    PersonaPreset {
        kind: "founder",
        name: "Startup Founder",
        icon: "🚀",
        context: "An early-stage founder collecting product, growth and fundraising ideas.",
        columns: &[
            column("Product", "🧩", "blue"),
            column("Growth", "📈", "green"),
            column("Fundraising", "💰", "amber"),
        ],
    },
    PersonaPreset {
        kind: "writer",
        name: "Writer",
        icon: "✍️",
        context: "A writer gathering story premises, characters and research leads.",
        columns: &[
            column("Premises", "💡", "yellow"),
            column("Characters", "🎭", "purple"),
            column("Research", "🔎", "slate"),
        ],
    },
    PersonaPreset {
        kind: "student",
        name: "Student",
        icon: "🎓",
        context: "A student planning essays, projects and exam revision.",
        columns: &[
            column("Essays", "📝", "indigo"),
            column("Projects", "🛠️", "teal"),
            column("Revision", "📚", "rose"),
        ],
    },
    PersonaPreset {
        kind: "developer",
        name: "Developer",
        icon: "💻",
        context: "A software developer tracking side projects, tools to try and reading.",
        columns: &[
            column("Side Projects", "🧪", "cyan"),
            column("Tools", "🧰", "orange"),
            column("Reading", "📖", "gray"),
        ],
    },
];

/// Column used when a board is created without a persona.
pub const DEFAULT_COLUMN: PersonaColumn = column("Inbox", "📥", "slate");

/// Returns the full preset catalog.
pub fn presets() -> &'static [PersonaPreset] {
    PRESETS
}

/// Looks up a preset by kind, ignoring case and surrounding whitespace.
pub fn find_preset(kind: &str) -> Option<&'static PersonaPreset> {
    let normalized = kind.trim().to_ascii_lowercase();
    PRESETS.iter().find(|preset| preset.kind == normalized)
}

/// Creates fresh categories for a preset's columns, in column order.
pub fn seed_categories(preset: &PersonaPreset) -> Result<Vec<Category>, CategoryValidationError> {
    preset.columns.iter().map(category_from_column).collect()
}

/// Categories for a board with no persona: a single inbox.
pub fn default_categories() -> Result<Vec<Category>, CategoryValidationError> {
    Ok(vec![category_from_column(&DEFAULT_COLUMN)?])
}

fn category_from_column(column: &PersonaColumn) -> Result<Category, CategoryValidationError> {
    Category::try_new(column.title, column.icon, column.color)
}
