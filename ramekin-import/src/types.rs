use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned when the source recipe has none.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Supported self-hosted recipe platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mealie,
    Tandoor,
    Nextcloud,
}

impl Platform {
    /// Display name, also used as the source attribution when a recipe has no URL.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Mealie => "Mealie",
            Platform::Tandoor => "Tandoor",
            Platform::Nextcloud => "Nextcloud",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mealie => "mealie",
            Platform::Tandoor => "tandoor",
            Platform::Nextcloud => "nextcloud",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mealie" => Ok(Platform::Mealie),
            "tandoor" => Ok(Platform::Tandoor),
            "nextcloud" | "nextcloud-cookbook" => Ok(Platform::Nextcloud),
            other => Err(format!(
                "Unknown platform: {}. Expected one of: mealie, tandoor, nextcloud",
                other
            )),
        }
    }
}

/// Lifecycle of an import run.
///
/// `Idle -> Authenticating -> Listing -> Fetching -> Completed`. Only the
/// first two active phases can fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Idle,
    Authenticating,
    Listing,
    Fetching,
    Completed,
}

impl ImportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPhase::Idle => "idle",
            ImportPhase::Authenticating => "authenticating",
            ImportPhase::Listing => "listing",
            ImportPhase::Fetching => "fetching",
            ImportPhase::Completed => "completed",
        }
    }
}

/// Login details for a remote recipe platform.
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Snapshot of how many listed recipes have been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Recipes finished so far, successful or not.
    pub value: usize,
    /// Recipes found while listing. Fixed for the whole run.
    pub total: usize,
}

/// Nutrition facts. Each field is empty or a value with its unit, e.g. "322 kcal".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: String,
    pub cholesterol: String,
    pub fiber: String,
    pub protein: String,
    pub saturated_fat: String,
    pub sodium: String,
    pub sugars: String,
    pub total_carbohydrates: String,
    pub total_fat: String,
    pub trans_fat: String,
    pub unsaturated_fat: String,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        *self == Nutrition::default()
    }
}

/// Preparation, cooking and total time. Zero when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Times {
    pub prep: Duration,
    pub cook: Duration,
    pub total: Duration,
}

/// A recipe in ramekin's platform-neutral form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Midnight UTC of the creation date.
    pub created_at: DateTime<Utc>,
    /// Midnight UTC of the last modification date.
    pub updated_at: DateTime<Utc>,
    /// Uploaded photo IDs, in source order.
    pub images: Vec<Uuid>,
    /// Ingredient lines in source order.
    pub ingredients: Vec<String>,
    /// One entry per step or paragraph.
    pub instructions: Vec<String>,
    pub keywords: Vec<String>,
    pub nutrition: Nutrition,
    pub times: Times,
    pub tools: Vec<String>,
    /// Original recipe URL. Mealie and Tandoor fall back to the platform name.
    pub url: String,
    #[serde(rename = "yield")]
    pub yields: u16,
}
