//! Nextcloud Cookbook: HTTP Basic auth on every request, a flat unpaginated
//! listing, schema.org Recipe JSON for each detail.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{lenient, non_empty, RawRecipe, RecipeSource};
use crate::auth::AuthToken;
use crate::coordinator::FetchedRecipe;
use crate::error::{FetchError, ItemError};
use crate::image::ImageSource;
use crate::normalize::{date_only, date_or_zero, first_integer, parse_duration, split_paragraphs, whole_servings};
use crate::pagination::{walk_pages, Page, WalkError};
use crate::session::Session;
use crate::types::{Credentials, Nutrition, Platform, Recipe, Times, UNCATEGORIZED};

const API_PATH: &str = "/apps/cookbook/api/v1";

pub struct NextcloudSource {
    api_url: String,
}

impl NextcloudSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            api_url: format!("{}{}", base_url.trim_end_matches('/'), API_PATH),
        }
    }

    fn recipes_url(&self) -> String {
        format!("{}/recipes", self.api_url)
    }

    fn detail_url(&self, id: &str) -> String {
        format!("{}/recipes/{}", self.api_url, id)
    }

    fn image_url(&self, id: &str) -> String {
        format!("{}/recipes/{}/image?size=thumb", self.api_url, id)
    }
}

#[derive(Deserialize)]
struct ListingItem {
    #[serde(default)]
    recipe_id: Value,
}

impl ListingItem {
    /// Older Cookbook versions send the ID as a number, newer ones as a string.
    fn id(&self) -> Option<String> {
        match &self.recipe_id {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => non_empty(s).map(str::to_string),
            _ => None,
        }
    }
}

#[async_trait]
impl RecipeSource for NextcloudSource {
    type Id = String;

    fn platform(&self) -> Platform {
        Platform::Nextcloud
    }

    /// No login exchange: the Basic credentials go on every request.
    async fn authenticate(
        &self,
        session: Session,
        credentials: &Credentials,
    ) -> Result<Session, FetchError> {
        Ok(session.with_auth(AuthToken::basic(
            &credentials.username,
            &credentials.password,
        )))
    }

    async fn list(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, WalkError> {
        walk_pages(
            session,
            self.recipes_url(),
            &self.api_url,
            cancel,
            |items: Vec<ListingItem>| Page::single(items.iter().filter_map(ListingItem::id).collect()),
        )
        .await
    }

    async fn fetch(&self, session: Session, id: String) -> Result<FetchedRecipe, ItemError> {
        let detail: NextcloudRecipe = session.get_json(&self.detail_url(&id)).await?;
        let recipe = RawRecipe::Nextcloud(detail).normalize();
        Ok(FetchedRecipe::new(
            recipe,
            Some(ImageSource::authenticated(self.image_url(&id))),
        ))
    }
}

/// A schema.org Recipe as served by the Cookbook app.
///
/// The loosely-typed schema.org properties stay as JSON values and are
/// interpreted during normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextcloudRecipe {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default)]
    pub recipe_category: Value,
    #[serde(default)]
    pub keywords: Value,
    #[serde(default)]
    pub recipe_ingredient: Value,
    #[serde(default)]
    pub recipe_instructions: Value,
    #[serde(default)]
    pub tool: Value,
    #[serde(default)]
    pub recipe_yield: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub prep_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cook_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_created: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_modified: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_published: Option<String>,
    #[serde(default)]
    pub nutrition: Value,
}

impl NextcloudRecipe {
    pub fn normalize(&self) -> Recipe {
        let category = texts(&self.recipe_category)
            .into_iter()
            .next()
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let created = [&self.date_published, &self.date_created]
            .into_iter()
            .find_map(|d| d.as_deref().and_then(non_empty))
            .unwrap_or_default();
        let created_at = date_or_zero(created);
        let updated_at = self
            .date_modified
            .as_deref()
            .and_then(date_only)
            .unwrap_or(created_at);

        Recipe {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            category,
            created_at,
            updated_at,
            images: Vec::new(),
            ingredients: texts(&self.recipe_ingredient),
            instructions: instructions(&self.recipe_instructions),
            keywords: keywords(&self.keywords),
            nutrition: nutrition(&self.nutrition),
            times: self.times(),
            tools: texts(&self.tool),
            url: self.url.clone().unwrap_or_default(),
            yields: yields(&self.recipe_yield),
        }
    }

    fn times(&self) -> Times {
        let parse = |field: &Option<String>| field.as_deref().and_then(parse_duration);
        let prep = parse(&self.prep_time).unwrap_or_default();
        let cook = parse(&self.cook_time).unwrap_or_default();
        let total = parse(&self.total_time).unwrap_or(prep.saturating_add(cook));
        Times { prep, cook, total }
    }
}

/// Non-empty trimmed strings from a string, an array of strings, or an
/// array of objects carrying `name` or `text`.
fn texts(value: &Value) -> Vec<String> {
    let one = |v: &Value| -> Option<String> {
        let s = match v {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj
                .get("name")
                .or_else(|| obj.get("text"))
                .and_then(|v| v.as_str())?,
            _ => return None,
        };
        non_empty(s).map(str::to_string)
    };

    match value {
        Value::Array(arr) => arr.iter().filter_map(one).collect(),
        other => one(other).into_iter().collect(),
    }
}

/// Steps from a single text blob, plain strings, HowToStep objects or
/// HowToSection objects with an `itemListElement`.
fn instructions(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_paragraphs(s),
        Value::Array(arr) => arr
            .iter()
            .flat_map(|item| match item {
                Value::String(s) => non_empty(s).map(str::to_string).into_iter().collect(),
                Value::Object(obj) => {
                    if let Some(text) = obj.get("text").and_then(|v| v.as_str()) {
                        non_empty(text).map(str::to_string).into_iter().collect()
                    } else if let Some(steps) = obj.get("itemListElement") {
                        instructions(steps)
                    } else {
                        Vec::new()
                    }
                }
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Comma-separated keywords, trimmed and de-duplicated in first-seen order.
fn keywords(value: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    texts(value)
        .iter()
        .flat_map(|s| s.split(','))
        .filter_map(non_empty)
        .filter(|k| seen.insert(k.to_string()))
        .map(str::to_string)
        .collect()
}

fn yields(value: &Value) -> u16 {
    match value {
        Value::Number(n) => n.as_f64().and_then(whole_servings).unwrap_or(0),
        Value::String(s) => first_integer(s).unwrap_or(0),
        Value::Array(arr) => arr.first().map(yields).unwrap_or(0),
        _ => 0,
    }
}

/// Cookbook nutrition values already carry their units ("250 kcal", "12 g").
fn nutrition(value: &Value) -> Nutrition {
    let field = |key: &str| match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    Nutrition {
        calories: field("calories"),
        cholesterol: field("cholesterolContent"),
        fiber: field("fiberContent"),
        protein: field("proteinContent"),
        saturated_fat: field("saturatedFatContent"),
        sodium: field("sodiumContent"),
        sugars: field("sugarContent"),
        total_carbohydrates: field("carbohydrateContent"),
        total_fat: field("fatContent"),
        trans_fat: field("transFatContent"),
        unsaturated_fat: field("unsaturatedFatContent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const DETAIL: &str = r#"{
        "@context": "http://schema.org",
        "@type": "Recipe",
        "id": "1397",
        "name": "Banana Bread",
        "description": "Moist and easy.",
        "url": "https://example.com/banana-bread",
        "image": "https://example.com/banana.jpg",
        "prepTime": "PT0H15M0S",
        "cookTime": "PT1H0M0S",
        "totalTime": null,
        "recipeCategory": " Baking ",
        "keywords": "bread, banana,quick ,bread",
        "recipeYield": 8,
        "tool": ["loaf pan", "mixing bowl"],
        "recipeIngredient": ["3 ripe bananas", " ", "2 cups flour"],
        "recipeInstructions": [
            "Preheat oven to 350F.",
            {"@type": "HowToStep", "text": "Mash the bananas."},
            {"@type": "HowToSection", "name": "Bake", "itemListElement": [
                {"@type": "HowToStep", "text": "Pour into the pan."},
                {"@type": "HowToStep", "text": "Bake for an hour."}
            ]}
        ],
        "nutrition": {"@type": "NutritionInformation", "calories": "250 kcal", "fatContent": "9 g", "sodiumContent": null},
        "dateCreated": "2023-01-05T10:00:00+0000",
        "dateModified": "2024-12-18T08:18:02Z"
    }"#;

    fn decode(json: &str) -> NextcloudRecipe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_detail() {
        let recipe = decode(DETAIL).normalize();

        assert_eq!(recipe.name, "Banana Bread");
        assert_eq!(recipe.description, "Moist and easy.");
        assert_eq!(recipe.category, "baking");
        assert_eq!(recipe.url, "https://example.com/banana-bread");
        assert_eq!(recipe.yields, 8);
        assert_eq!(recipe.ingredients, vec!["3 ripe bananas", "2 cups flour"]);
        assert_eq!(
            recipe.instructions,
            vec![
                "Preheat oven to 350F.",
                "Mash the bananas.",
                "Pour into the pan.",
                "Bake for an hour.",
            ]
        );
        assert_eq!(recipe.tools, vec!["loaf pan", "mixing bowl"]);
        assert_eq!(
            recipe.created_at,
            Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            recipe.updated_at,
            Utc.with_ymd_and_hms(2024, 12, 18, 0, 0, 0).unwrap()
        );
        assert!(recipe.images.is_empty());
    }

    #[test]
    fn test_keywords_split_and_deduplicated() {
        let recipe = decode(DETAIL).normalize();
        assert_eq!(recipe.keywords, vec!["bread", "banana", "quick"]);
    }

    #[test]
    fn test_nutrition_carried_verbatim() {
        let nutrition = decode(DETAIL).normalize().nutrition;
        assert_eq!(nutrition.calories, "250 kcal");
        assert_eq!(nutrition.total_fat, "9 g");
        assert_eq!(nutrition.sodium, "");
    }

    #[test]
    fn test_total_time_defaults_to_prep_plus_cook() {
        let times = decode(DETAIL).normalize().times;
        assert_eq!(times.prep, Duration::from_secs(15 * 60));
        assert_eq!(times.cook, Duration::from_secs(60 * 60));
        assert_eq!(times.total, Duration::from_secs(75 * 60));
    }

    #[test]
    fn test_sparse_detail() {
        let recipe = decode(r#"{"name": "Toast", "recipeInstructions": "Toast it.\n\nButter it."}"#)
            .normalize();

        assert_eq!(recipe.category, "uncategorized");
        assert_eq!(recipe.url, "");
        assert_eq!(recipe.yields, 0);
        assert!(recipe.keywords.is_empty());
        assert!(recipe.nutrition.is_empty());
        assert_eq!(recipe.instructions, vec!["Toast it.", "Butter it."]);
        assert_eq!(recipe.updated_at, recipe.created_at);
    }

    #[test]
    fn test_mistyped_fields_are_zeroed() {
        let recipe = decode(
            r#"{"name": "Soup", "prepTime": 15, "cookTime": "PT20M",
                "dateCreated": 1700000000, "url": false, "description": ["hot"]}"#,
        )
        .normalize();

        assert_eq!(recipe.name, "Soup");
        assert_eq!(recipe.times.prep, Duration::ZERO);
        assert_eq!(recipe.times.cook, Duration::from_secs(20 * 60));
        assert_eq!(recipe.times.total, Duration::from_secs(20 * 60));
        assert_eq!(recipe.created_at, chrono::DateTime::<Utc>::default());
        assert_eq!(recipe.url, "");
        assert_eq!(recipe.description, "");
    }

    #[test]
    fn test_out_of_range_times_fall_back_to_zero() {
        let times = decode(
            r#"{"name": "x", "prepTime": "PT99999999999999999999H", "cookTime": "PT30M"}"#,
        )
        .normalize()
        .times;

        assert_eq!(times.prep, Duration::ZERO);
        assert_eq!(times.cook, Duration::from_secs(30 * 60));
        assert_eq!(times.total, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_total_saturates() {
        let recipe = NextcloudRecipe {
            prep_time: Some("PT5000000000000000H".to_string()),
            cook_time: Some("PT5000000000000000H".to_string()),
            ..Default::default()
        };
        assert_eq!(recipe.times().total, Duration::MAX);
    }

    #[test]
    fn test_text_yield() {
        assert_eq!(yields(&serde_json::json!("4 servings")), 4);
        assert_eq!(yields(&serde_json::json!(["6", "6 slices"])), 6);
        assert_eq!(yields(&serde_json::json!(null)), 0);
    }

    #[test]
    fn test_listing_ids_number_or_string() {
        let items: Vec<ListingItem> =
            serde_json::from_str(r#"[{"recipe_id": 12}, {"recipe_id": "34"}, {"name": "no id"}]"#)
                .unwrap();
        let ids: Vec<String> = items.iter().filter_map(ListingItem::id).collect();
        assert_eq!(ids, vec!["12", "34"]);
    }

    #[test]
    fn test_urls() {
        let source = NextcloudSource::new("https://cloud.example.com/");
        assert_eq!(
            source.detail_url("12"),
            "https://cloud.example.com/apps/cookbook/api/v1/recipes/12"
        );
        assert_eq!(
            source.image_url("12"),
            "https://cloud.example.com/apps/cookbook/api/v1/recipes/12/image?size=thumb"
        );
    }
}
