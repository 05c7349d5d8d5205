//! Mealie: form login for a bearer token, cursor-paginated listing under
//! `/api`, detail by slug, image by recipe ID.
//!
//! Mealie has shipped two detail schemas: the current snake_case one and an
//! older camelCase one (`recipeIngredient`, `orgURL`, `dateAdded`, ...).
//! Each is decoded into its own struct and converted into [`MealieRecipe`].

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{lenient, non_empty, RawRecipe, RecipeSource, Scalar};
use crate::auth::AuthToken;
use crate::coordinator::FetchedRecipe;
use crate::error::{FetchError, ItemError};
use crate::http::{join_url, HttpRequest};
use crate::image::ImageSource;
use crate::normalize::{date_or_zero, first_integer, parse_duration, whole_servings, with_unit};
use crate::pagination::{walk_pages, Page, WalkError};
use crate::session::Session;
use crate::types::{Credentials, Nutrition, Platform, Recipe, Times, UNCATEGORIZED};

pub struct MealieSource {
    api_url: String,
    page_size: usize,
}

impl MealieSource {
    /// `base_url` may or may not already end in `/api`.
    pub fn new(base_url: &str, page_size: usize) -> Self {
        let base = base_url.trim_end_matches('/');
        let api_url = if base.ends_with("/api") {
            base.to_string()
        } else {
            format!("{}/api", base)
        };
        Self {
            api_url,
            page_size: page_size.max(1),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/recipes?page=1&perPage={}&orderDirection=desc&requireAllCategories=false&requireAllTags=false&requireAllTools=false&requireAllFoods=false",
            self.api_url, self.page_size
        )
    }

    fn detail_url(&self, slug: &str) -> String {
        join_url(&self.api_url, &format!("recipes/{}", slug))
    }

    fn image_url(&self, recipe_id: &str) -> String {
        format!(
            "{}/media/recipes/{}/images/min-original.webp",
            self.api_url, recipe_id
        )
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ListingPage {
    #[serde(default)]
    items: Vec<ListingItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct ListingItem {
    #[serde(default)]
    slug: Option<String>,
}

#[async_trait]
impl RecipeSource for MealieSource {
    type Id = String;

    fn platform(&self) -> Platform {
        Platform::Mealie
    }

    async fn authenticate(
        &self,
        session: Session,
        credentials: &Credentials,
    ) -> Result<Session, FetchError> {
        let url = format!("{}/auth/token", self.api_url);
        let request = HttpRequest::post(&url)
            .header("Accept", "application/json")
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]);
        let login: LoginResponse = session.send(request).await?.json(&url)?;
        Ok(session.with_auth(AuthToken::bearer(login.access_token)))
    }

    async fn list(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, WalkError> {
        walk_pages(
            session,
            self.listing_url(),
            &self.api_url,
            cancel,
            |page: ListingPage| Page {
                items: page
                    .items
                    .into_iter()
                    .filter_map(|item| item.slug.filter(|s| !s.is_empty()))
                    .collect(),
                next: page.next,
            },
        )
        .await
    }

    async fn fetch(&self, session: Session, slug: String) -> Result<FetchedRecipe, ItemError> {
        let url = self.detail_url(&slug);
        let value: serde_json::Value = session.get_json(&url).await?;
        let detail = MealieRecipe::from_json(value)
            .map_err(|source| FetchError::Decode { url, source })?;

        let image = non_empty(&detail.id).map(|id| ImageSource::authenticated(self.image_url(id)));
        let recipe = RawRecipe::Mealie(detail).normalize();
        Ok(FetchedRecipe::new(recipe, image))
    }
}

/// A Mealie recipe, whichever schema version it arrived in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealieRecipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub recipe_yield: String,
    pub recipe_servings: Option<f64>,
    pub recipe_yield_quantity: Option<f64>,
    pub total_time: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub perform_time: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub tools: Vec<String>,
    pub org_url: String,
    pub date_added: String,
    pub date_updated: String,
    pub created_at: String,
    pub update_at: String,
    pub ingredients: Vec<MealieIngredient>,
    pub instructions: Vec<String>,
    pub nutrition: MealieNutrition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealieIngredient {
    pub original_text: String,
    pub display: String,
}

/// Nutrition values as Mealie stores them: bare numbers without units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealieNutrition {
    pub calories: String,
    pub carbohydrate: String,
    pub cholesterol: String,
    pub fat: String,
    pub fiber: String,
    pub protein: String,
    pub saturated_fat: String,
    pub sodium: String,
    pub sugar: String,
    pub trans_fat: String,
    pub unsaturated_fat: String,
}

/// Keys only the camelCase schema uses, and their snake_case counterparts.
const LEGACY_KEYS: &[&str] = &[
    "recipeIngredient",
    "recipeInstructions",
    "recipeYield",
    "recipeCategory",
    "orgURL",
    "dateAdded",
    "dateUpdated",
    "createdAt",
    "updateAt",
    "totalTime",
    "prepTime",
    "performTime",
];
const CURRENT_KEYS: &[&str] = &[
    "recipe_ingredient",
    "recipe_instructions",
    "recipe_yield",
    "recipe_category",
    "org_url",
    "date_added",
    "date_updated",
    "created_at",
    "update_at",
    "total_time",
    "prep_time",
    "perform_time",
];

impl MealieRecipe {
    /// Decode a detail payload, picking the schema by which key style it uses.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if is_legacy(&value) {
            tracing::debug!("decoding legacy Mealie schema");
            serde_json::from_value::<LegacyRecipe>(value).map(Into::into)
        } else {
            serde_json::from_value::<CurrentRecipe>(value).map(Into::into)
        }
    }

    pub fn normalize(&self) -> Recipe {
        let category = self
            .categories
            .first()
            .and_then(|c| non_empty(c))
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        let url = non_empty(&self.org_url)
            .unwrap_or(Platform::Mealie.name())
            .to_string();

        let created = non_empty(&self.created_at).unwrap_or(&self.date_added);
        let updated = non_empty(&self.date_updated).unwrap_or(&self.update_at);

        let ingredients = self
            .ingredients
            .iter()
            .filter_map(|ing| {
                non_empty(&ing.original_text).or_else(|| non_empty(&ing.display))
            })
            .map(str::to_string)
            .collect();

        let instructions = self
            .instructions
            .iter()
            .filter(|text| !text.trim().is_empty())
            .cloned()
            .collect();

        Recipe {
            name: self.name.clone(),
            description: self.description.clone(),
            category,
            created_at: date_or_zero(created),
            updated_at: date_or_zero(updated),
            images: Vec::new(),
            ingredients,
            instructions,
            keywords: self.tags.clone(),
            nutrition: self.nutrition.normalize(),
            times: self.times(),
            tools: self.tools.clone(),
            url,
            yields: self.yields(),
        }
    }

    fn yields(&self) -> u16 {
        first_integer(&self.recipe_yield)
            .or_else(|| self.recipe_servings.and_then(whole_servings))
            .or_else(|| self.recipe_yield_quantity.and_then(whole_servings))
            .unwrap_or(0)
    }

    /// Prep and total come straight from the payload. Cook is the perform
    /// time, unless Mealie left `cook_time` out: then it is whatever part of
    /// the total (or perform) time the prep does not account for.
    fn times(&self) -> Times {
        let parse = |field: &Option<String>| field.as_deref().and_then(parse_duration);
        let prep = parse(&self.prep_time);
        let total = parse(&self.total_time);
        let perform = parse(&self.perform_time);

        let mut cook = perform.or_else(|| parse(&self.cook_time)).unwrap_or_default();
        if self.cook_time.is_none() {
            if let Some(prep) = prep {
                if let Some(total) = total {
                    cook = total.saturating_sub(prep);
                } else if let Some(perform) = perform {
                    cook = perform.saturating_sub(prep);
                }
            }
        }

        Times {
            prep: prep.unwrap_or_default(),
            cook,
            total: total.unwrap_or_default(),
        }
    }
}

impl MealieNutrition {
    fn normalize(&self) -> Nutrition {
        Nutrition {
            calories: with_unit(&self.calories, " kcal"),
            cholesterol: with_unit(&self.cholesterol, "g"),
            fiber: with_unit(&self.fiber, "g"),
            protein: with_unit(&self.protein, "g"),
            saturated_fat: with_unit(&self.saturated_fat, "g"),
            sodium: with_unit(&self.sodium, "g"),
            sugars: with_unit(&self.sugar, "g"),
            total_carbohydrates: with_unit(&self.carbohydrate, "g"),
            total_fat: with_unit(&self.fat, "g"),
            trans_fat: with_unit(&self.trans_fat, "g"),
            unsaturated_fat: with_unit(&self.unsaturated_fat, "g"),
        }
    }
}

fn is_legacy(value: &serde_json::Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let count = |keys: &[&str]| keys.iter().filter(|k| object.contains_key(**k)).count();
    count(LEGACY_KEYS) > count(CURRENT_KEYS)
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn scalar(value: Option<Scalar>) -> String {
    value.map(Scalar::into_text).unwrap_or_default()
}

#[derive(Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

fn names(items: Option<Vec<Named>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| item.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Every name as listed, blanks included.
fn listed_names(items: Option<Vec<Named>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.name.unwrap_or_default())
        .collect()
}

#[derive(Deserialize)]
struct Instruction {
    #[serde(default)]
    text: Option<String>,
}

fn instruction_texts(steps: Option<Vec<Instruction>>) -> Vec<String> {
    steps
        .unwrap_or_default()
        .into_iter()
        .filter_map(|step| step.text)
        .collect()
}

#[derive(Deserialize)]
struct CurrentRecipe {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_yield: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_servings: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_yield_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    prep_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    cook_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    perform_time: Option<String>,
    #[serde(default)]
    recipe_category: Option<Vec<Named>>,
    #[serde(default)]
    tags: Option<Vec<Named>>,
    #[serde(default)]
    tools: Option<Vec<Named>>,
    #[serde(default, deserialize_with = "lenient")]
    org_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date_added: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date_updated: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    update_at: Option<String>,
    #[serde(default)]
    recipe_ingredient: Option<Vec<CurrentIngredient>>,
    #[serde(default)]
    recipe_instructions: Option<Vec<Instruction>>,
    #[serde(default)]
    nutrition: Option<CurrentNutrition>,
}

#[derive(Deserialize)]
struct CurrentIngredient {
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default)]
    display: Option<String>,
}

#[derive(Deserialize)]
struct CurrentNutrition {
    #[serde(default)]
    calories: Option<Scalar>,
    #[serde(default)]
    carbohydrate_content: Option<Scalar>,
    #[serde(default)]
    cholesterol_content: Option<Scalar>,
    #[serde(default)]
    fat_content: Option<Scalar>,
    #[serde(default)]
    fiber_content: Option<Scalar>,
    #[serde(default)]
    protein_content: Option<Scalar>,
    #[serde(default)]
    saturated_fat_content: Option<Scalar>,
    #[serde(default)]
    sodium_content: Option<Scalar>,
    #[serde(default)]
    sugar_content: Option<Scalar>,
    #[serde(default)]
    trans_fat_content: Option<Scalar>,
    #[serde(default)]
    unsaturated_fat_content: Option<Scalar>,
}

impl From<CurrentNutrition> for MealieNutrition {
    fn from(n: CurrentNutrition) -> Self {
        Self {
            calories: scalar(n.calories),
            carbohydrate: scalar(n.carbohydrate_content),
            cholesterol: scalar(n.cholesterol_content),
            fat: scalar(n.fat_content),
            fiber: scalar(n.fiber_content),
            protein: scalar(n.protein_content),
            saturated_fat: scalar(n.saturated_fat_content),
            sodium: scalar(n.sodium_content),
            sugar: scalar(n.sugar_content),
            trans_fat: scalar(n.trans_fat_content),
            unsaturated_fat: scalar(n.unsaturated_fat_content),
        }
    }
}

impl From<CurrentRecipe> for MealieRecipe {
    fn from(r: CurrentRecipe) -> Self {
        Self {
            id: text(r.id),
            name: text(r.name),
            description: text(r.description),
            recipe_yield: text(r.recipe_yield),
            recipe_servings: r.recipe_servings,
            recipe_yield_quantity: r.recipe_yield_quantity,
            total_time: r.total_time,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            perform_time: r.perform_time,
            categories: listed_names(r.recipe_category),
            tags: names(r.tags),
            tools: names(r.tools),
            org_url: text(r.org_url),
            date_added: text(r.date_added),
            date_updated: text(r.date_updated),
            created_at: text(r.created_at),
            update_at: text(r.update_at),
            ingredients: r
                .recipe_ingredient
                .unwrap_or_default()
                .into_iter()
                .map(|ing| MealieIngredient {
                    original_text: text(ing.original_text),
                    display: text(ing.display),
                })
                .collect(),
            instructions: instruction_texts(r.recipe_instructions),
            nutrition: r.nutrition.map(Into::into).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecipe {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_yield: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_servings: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    recipe_yield_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    prep_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    cook_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    perform_time: Option<String>,
    #[serde(default)]
    recipe_category: Option<Vec<Named>>,
    #[serde(default)]
    tags: Option<Vec<Named>>,
    #[serde(default)]
    tools: Option<Vec<Named>>,
    #[serde(default, rename = "orgURL", deserialize_with = "lenient")]
    org_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date_added: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date_updated: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    update_at: Option<String>,
    #[serde(default)]
    recipe_ingredient: Option<Vec<LegacyIngredient>>,
    #[serde(default)]
    recipe_instructions: Option<Vec<Instruction>>,
    #[serde(default)]
    nutrition: Option<LegacyNutrition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyIngredient {
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default)]
    display: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyNutrition {
    #[serde(default)]
    calories: Option<Scalar>,
    #[serde(default)]
    carbohydrate_content: Option<Scalar>,
    #[serde(default)]
    cholesterol_content: Option<Scalar>,
    #[serde(default)]
    fat_content: Option<Scalar>,
    #[serde(default)]
    fiber_content: Option<Scalar>,
    #[serde(default)]
    protein_content: Option<Scalar>,
    #[serde(default)]
    saturated_fat_content: Option<Scalar>,
    #[serde(default)]
    sodium_content: Option<Scalar>,
    #[serde(default)]
    sugar_content: Option<Scalar>,
    #[serde(default)]
    trans_fat_content: Option<Scalar>,
    #[serde(default)]
    unsaturated_fat_content: Option<Scalar>,
}

impl From<LegacyNutrition> for MealieNutrition {
    fn from(n: LegacyNutrition) -> Self {
        Self {
            calories: scalar(n.calories),
            carbohydrate: scalar(n.carbohydrate_content),
            cholesterol: scalar(n.cholesterol_content),
            fat: scalar(n.fat_content),
            fiber: scalar(n.fiber_content),
            protein: scalar(n.protein_content),
            saturated_fat: scalar(n.saturated_fat_content),
            sodium: scalar(n.sodium_content),
            sugar: scalar(n.sugar_content),
            trans_fat: scalar(n.trans_fat_content),
            unsaturated_fat: scalar(n.unsaturated_fat_content),
        }
    }
}

impl From<LegacyRecipe> for MealieRecipe {
    fn from(r: LegacyRecipe) -> Self {
        Self {
            id: text(r.id),
            name: text(r.name),
            description: text(r.description),
            recipe_yield: text(r.recipe_yield),
            recipe_servings: r.recipe_servings,
            recipe_yield_quantity: r.recipe_yield_quantity,
            total_time: r.total_time,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            perform_time: r.perform_time,
            categories: listed_names(r.recipe_category),
            tags: names(r.tags),
            tools: names(r.tools),
            org_url: text(r.org_url),
            date_added: text(r.date_added),
            date_updated: text(r.date_updated),
            created_at: text(r.created_at),
            update_at: text(r.update_at),
            ingredients: r
                .recipe_ingredient
                .unwrap_or_default()
                .into_iter()
                .map(|ing| MealieIngredient {
                    original_text: text(ing.original_text),
                    display: text(ing.display),
                })
                .collect(),
            instructions: instruction_texts(r.recipe_instructions),
            nutrition: r.nutrition.map(Into::into).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const LEGACY_DETAIL: &str = r#"{
        "id": "843b4a6d-6855-48c3-8186-22f096310243",
        "name": "Roasted Vegetable Bowls",
        "recipeYield": "6 servings",
        "totalTime": "45 minutes",
        "prepTime": "15 minutes",
        "cookTime": null,
        "performTime": "30 minutes",
        "description": "Crispy roasted veggies.",
        "recipeCategory": [],
        "tags": [{"name": "Green Tahini"}, {"name": "Bowls"}],
        "tools": [],
        "rating": 4,
        "orgURL": "https://pinchofyum.com/roasted-vegetable-bowls",
        "dateAdded": "2024-04-12",
        "dateUpdated": "2024-04-13T18:14:29.168064",
        "createdAt": "2024-04-12T18:06:06.692275",
        "updateAt": "2024-04-12T18:07:56.850947",
        "recipeIngredient": [
            {"quantity": 8.0, "unit": null, "food": null, "display": "8 carrot large", "originalText": "8 large carrots, peeled and chopped"},
            {"quantity": 0.0, "display": "cilantro and/or parsley", "originalText": null},
            {"quantity": 0.0, "display": "", "originalText": ""}
        ],
        "recipeInstructions": [
            {"id": "1", "title": "", "text": "Prep", "ingredientReferences": []},
            {"id": "2", "title": "", "text": "Preheat the oven to 425 degrees."}
        ],
        "nutrition": {"calories": "322", "fatContent": "24.6", "sodiumContent": "302.3", "sugarContent": "6.9"}
    }"#;

    const CURRENT_DETAIL: &str = r#"{
        "id": "abc",
        "name": "Crackers",
        "recipe_yield": "",
        "recipe_servings": 24.0,
        "total_time": "PT1H25M",
        "prep_time": "PT25M",
        "cook_time": "PT1H",
        "perform_time": "PT1H",
        "recipe_category": [{"id": "c1", "name": "Snacks", "slug": "snacks"}],
        "tags": [],
        "tools": [{"id": "t1", "name": "Rolling pin", "slug": "rolling-pin"}],
        "org_url": null,
        "date_added": "2024-04-06",
        "date_updated": "2024-04-07T10:38:36.127382",
        "created_at": "2024-04-06T19:18:04.359452",
        "update_at": "2024-04-07T10:38:36.130814",
        "recipe_ingredient": [
            {"display": "1 cup flour", "original_text": null}
        ],
        "recipe_instructions": [{"text": "Mix."}],
        "nutrition": {"calories": 120, "protein_content": "3", "fat_content": null}
    }"#;

    fn decode(json: &str) -> MealieRecipe {
        MealieRecipe::from_json(serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_source_urls() {
        let source = MealieSource::new("http://mealie.local/", 100);
        assert_eq!(source.api_url(), "http://mealie.local/api");
        assert_eq!(
            source.detail_url("sourdough-crackers"),
            "http://mealie.local/api/recipes/sourdough-crackers"
        );
        assert_eq!(
            source.image_url("abc"),
            "http://mealie.local/api/media/recipes/abc/images/min-original.webp"
        );
        assert!(source
            .listing_url()
            .starts_with("http://mealie.local/api/recipes?page=1&perPage=100&orderDirection=desc"));

        let already_api = MealieSource::new("http://mealie.local/api", 50);
        assert_eq!(already_api.api_url(), "http://mealie.local/api");
    }

    #[test]
    fn test_detects_schema_version() {
        assert!(is_legacy(&serde_json::from_str(LEGACY_DETAIL).unwrap()));
        assert!(!is_legacy(&serde_json::from_str(CURRENT_DETAIL).unwrap()));
        assert!(!is_legacy(&serde_json::json!({"name": "bare"})));
    }

    #[test]
    fn test_normalize_legacy_schema() {
        let recipe = decode(LEGACY_DETAIL).normalize();

        assert_eq!(recipe.name, "Roasted Vegetable Bowls");
        assert_eq!(recipe.category, "uncategorized");
        assert_eq!(recipe.url, "https://pinchofyum.com/roasted-vegetable-bowls");
        assert_eq!(recipe.yields, 6);
        assert_eq!(
            recipe.created_at,
            Utc.with_ymd_and_hms(2024, 4, 12, 0, 0, 0).unwrap()
        );
        assert_eq!(
            recipe.updated_at,
            Utc.with_ymd_and_hms(2024, 4, 13, 0, 0, 0).unwrap()
        );
        assert_eq!(
            recipe.ingredients,
            vec!["8 large carrots, peeled and chopped", "cilantro and/or parsley"]
        );
        assert_eq!(
            recipe.instructions,
            vec!["Prep", "Preheat the oven to 425 degrees."]
        );
        assert_eq!(recipe.keywords, vec!["Green Tahini", "Bowls"]);
        assert!(recipe.tools.is_empty());
        assert!(recipe.images.is_empty());
    }

    #[test]
    fn test_legacy_nutrition_units() {
        let nutrition = decode(LEGACY_DETAIL).normalize().nutrition;
        assert_eq!(nutrition.calories, "322 kcal");
        assert_eq!(nutrition.total_fat, "24.6g");
        assert_eq!(nutrition.sodium, "302.3g");
        assert_eq!(nutrition.sugars, "6.9g");
        assert_eq!(nutrition.protein, "");
        assert_eq!(nutrition.cholesterol, "");
    }

    #[test]
    fn test_cook_time_derived_when_absent() {
        let times = decode(LEGACY_DETAIL).normalize().times;
        assert_eq!(times.prep, Duration::from_secs(15 * 60));
        assert_eq!(times.cook, Duration::from_secs(30 * 60));
        assert_eq!(times.total, Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_cook_time_from_perform_when_present() {
        let times = decode(CURRENT_DETAIL).normalize().times;
        assert_eq!(times.prep, Duration::from_secs(25 * 60));
        assert_eq!(times.cook, Duration::from_secs(60 * 60));
        assert_eq!(times.total, Duration::from_secs(85 * 60));
    }

    #[test]
    fn test_cook_time_never_negative() {
        let recipe = MealieRecipe {
            prep_time: Some("PT2H".to_string()),
            total_time: Some("PT1H".to_string()),
            ..Default::default()
        };
        assert_eq!(recipe.times().cook, Duration::ZERO);
    }

    #[test]
    fn test_normalize_current_schema() {
        let recipe = decode(CURRENT_DETAIL).normalize();

        assert_eq!(recipe.category, "Snacks");
        assert_eq!(recipe.url, "Mealie");
        assert_eq!(recipe.yields, 24);
        assert_eq!(recipe.tools, vec!["Rolling pin"]);
        assert_eq!(recipe.ingredients, vec!["1 cup flour"]);
        assert_eq!(recipe.instructions, vec!["Mix."]);
        assert!(recipe.keywords.is_empty());
        assert_eq!(recipe.nutrition.calories, "120 kcal");
        assert_eq!(recipe.nutrition.protein, "3g");
        assert_eq!(recipe.nutrition.total_fat, "");
        assert_eq!(
            recipe.created_at,
            Utc.with_ymd_and_hms(2024, 4, 6, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_category_is_first_listed() {
        let mut recipe = MealieRecipe {
            categories: vec!["Dinner".to_string(), "Bowls".to_string()],
            ..Default::default()
        };
        assert_eq!(recipe.normalize().category, "Dinner");

        recipe.categories = vec!["  ".to_string(), "Bowls".to_string()];
        assert_eq!(recipe.normalize().category, "uncategorized");
    }

    #[test]
    fn test_out_of_range_time_keeps_recipe() {
        let recipe = decode(
            r#"{"name": "Slow", "prep_time": "PT99999999999999999999H", "total_time": "PT45M",
                "perform_time": "PT30M"}"#,
        )
        .normalize();

        assert_eq!(recipe.name, "Slow");
        assert_eq!(recipe.times.prep, Duration::ZERO);
        assert_eq!(recipe.times.cook, Duration::from_secs(30 * 60));
        assert_eq!(recipe.times.total, Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_mistyped_fields_are_zeroed() {
        let recipe = decode(
            r#"{"name": "Odd", "recipe_yield": 6, "recipe_servings": "four",
                "prep_time": 15, "created_at": false, "date_added": "2024-04-12"}"#,
        )
        .normalize();

        assert_eq!(recipe.name, "Odd");
        assert_eq!(recipe.yields, 0);
        assert_eq!(recipe.times.prep, Duration::ZERO);
        assert_eq!(
            recipe.created_at,
            Utc.with_ymd_and_hms(2024, 4, 12, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_yield_fallbacks() {
        let mut recipe = MealieRecipe {
            recipe_yield: "about a dozen".to_string(),
            recipe_yield_quantity: Some(12.0),
            ..Default::default()
        };
        assert_eq!(recipe.yields(), 12);

        recipe.recipe_servings = Some(4.0);
        assert_eq!(recipe.yields(), 4);

        recipe.recipe_yield = "6 servings".to_string();
        assert_eq!(recipe.yields(), 6);

        assert_eq!(MealieRecipe::default().yields(), 0);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        assert_eq!(decode(LEGACY_DETAIL).normalize(), decode(LEGACY_DETAIL).normalize());
    }

    #[test]
    fn test_rejects_non_object_detail() {
        assert!(MealieRecipe::from_json(serde_json::json!([1, 2])).is_err());
    }
}
