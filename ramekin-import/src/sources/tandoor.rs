//! Tandoor: JSON login for a token, paginated `/api/recipe/` listing with
//! absolute `next` links, detail by numeric ID. Images are public URLs
//! given in the detail payload.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{lenient, non_empty, RawRecipe, RecipeSource};
use crate::auth::AuthToken;
use crate::coordinator::FetchedRecipe;
use crate::error::{FetchError, ItemError};
use crate::http::HttpRequest;
use crate::image::ImageSource;
use crate::normalize::{date_or_zero, format_amount, minutes, split_paragraphs, whole_servings};
use crate::pagination::{walk_pages, Page, WalkError};
use crate::session::Session;
use crate::types::{Credentials, Nutrition, Platform, Recipe, Times, UNCATEGORIZED};

pub struct TandoorSource {
    base_url: String,
}

impl TandoorSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn detail_url(&self, id: i64) -> String {
        format!("{}/api/recipe/{}/", self.base_url, id)
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ListingPage {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<ListingItem>,
}

#[derive(Deserialize)]
struct ListingItem {
    id: i64,
}

#[async_trait]
impl RecipeSource for TandoorSource {
    type Id = i64;

    fn platform(&self) -> Platform {
        Platform::Tandoor
    }

    async fn authenticate(
        &self,
        session: Session,
        credentials: &Credentials,
    ) -> Result<Session, FetchError> {
        let url = format!("{}/api-token-auth/", self.base_url);
        let request = HttpRequest::post(&url)
            .header("Accept", "application/json")
            .json(serde_json::json!({
                "username": credentials.username,
                "password": credentials.password,
            }));
        let login: LoginResponse = session.send(request).await?.json(&url)?;
        Ok(session.with_auth(AuthToken::bearer(login.token)))
    }

    async fn list(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<i64>, WalkError> {
        walk_pages(
            session,
            format!("{}/api/recipe/", self.base_url),
            &self.base_url,
            cancel,
            |page: ListingPage| Page {
                items: page.results.into_iter().map(|r| r.id).collect(),
                next: page.next,
            },
        )
        .await
    }

    async fn fetch(&self, session: Session, id: i64) -> Result<FetchedRecipe, ItemError> {
        let url = self.detail_url(id);
        let detail: TandoorRecipe = session.get_json(&url).await?;

        let image = detail
            .image
            .as_deref()
            .and_then(non_empty)
            .map(ImageSource::public);
        let recipe = RawRecipe::Tandoor(detail).normalize();
        Ok(FetchedRecipe::new(recipe, image))
    }
}

/// A recipe from Tandoor's `/api/recipe/{id}/` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TandoorRecipe {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(default)]
    pub keywords: Vec<TandoorKeyword>,
    #[serde(default)]
    pub steps: Vec<TandoorStep>,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient")]
    pub working_time: Option<u64>,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient")]
    pub waiting_time: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub servings: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TandoorKeyword {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TandoorStep {
    #[serde(default, deserialize_with = "lenient")]
    pub instruction: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<TandoorIngredient>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TandoorIngredient {
    #[serde(default)]
    pub food: Option<TandoorNamed>,
    #[serde(default)]
    pub unit: Option<TandoorNamed>,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub note: Option<String>,
    #[serde(default)]
    pub no_amount: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub original_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TandoorNamed {
    #[serde(default)]
    pub name: String,
}

impl TandoorIngredient {
    /// The line as written in the source, else `amount unit food note`.
    /// `None` when there is nothing to show.
    pub fn line(&self) -> Option<String> {
        if let Some(original) = self.original_text.as_deref().and_then(non_empty) {
            return Some(original.to_string());
        }

        let amount = self
            .amount
            .filter(|a| *a > 0.0 && !self.no_amount)
            .map(format_amount);
        let name = |named: &Option<TandoorNamed>| {
            named
                .as_ref()
                .and_then(|n| non_empty(&n.name))
                .map(str::to_string)
        };

        let parts: Vec<String> = [
            amount,
            name(&self.unit),
            name(&self.food),
            self.note.as_deref().and_then(non_empty).map(str::to_string),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

impl TandoorRecipe {
    pub fn normalize(&self) -> Recipe {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .filter_map(|k| non_empty(&k.name))
            .map(str::to_string)
            .collect();

        let category = keywords
            .first()
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let url = self
            .source_url
            .as_deref()
            .and_then(non_empty)
            .unwrap_or(Platform::Tandoor.name())
            .to_string();

        let mut ingredients = Vec::new();
        let mut instructions = Vec::new();
        for step in &self.steps {
            if let Some(text) = &step.instruction {
                instructions.extend(split_paragraphs(text));
            }
            ingredients.extend(step.ingredients.iter().filter_map(TandoorIngredient::line));
        }

        let prep = minutes(self.working_time.unwrap_or(0));
        let cook = minutes(self.waiting_time.unwrap_or(0));

        Recipe {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            category,
            created_at: date_or_zero(self.created_at.as_deref().unwrap_or_default()),
            updated_at: date_or_zero(self.updated_at.as_deref().unwrap_or_default()),
            images: Vec::new(),
            ingredients,
            instructions,
            keywords,
            nutrition: Nutrition::default(),
            times: Times {
                prep,
                cook,
                total: prep.saturating_add(cook),
            },
            tools: Vec::new(),
            url,
            yields: self.servings.and_then(whole_servings).unwrap_or(1),
        }
    }
}
