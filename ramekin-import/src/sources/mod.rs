//! Recipe platforms and the import run that drives them.
//!
//! Each platform implements [`RecipeSource`]: how to log in, how to list
//! recipe identifiers, and how to fetch and normalize one recipe. The run
//! itself (phases, cancellation, fan-out, progress) is shared.

pub mod mealie;
pub mod nextcloud;
pub mod tandoor;

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ImportConfig;
use crate::coordinator::{Coordinator, FetchedRecipe};
use crate::error::{FetchError, ImportError, ItemError};
use crate::http::HttpClient;
use crate::image::ImageUploader;
use crate::pagination::WalkError;
use crate::progress::ProgressSender;
use crate::session::Session;
use crate::types::{Credentials, ImportPhase, Platform, Recipe};

pub use mealie::{MealieRecipe, MealieSource};
pub use nextcloud::{NextcloudRecipe, NextcloudSource};
pub use tandoor::{TandoorRecipe, TandoorSource};

/// One remote recipe platform.
#[async_trait]
pub trait RecipeSource: Send + Sync + 'static {
    /// What the listing yields and the detail endpoint takes.
    type Id: Display + Send + 'static;

    fn platform(&self) -> Platform;

    /// Log in, returning the session all later requests use.
    async fn authenticate(
        &self,
        session: Session,
        credentials: &Credentials,
    ) -> Result<Session, FetchError>;

    /// Every recipe identifier, in listing order.
    async fn list(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Id>, WalkError>;

    /// Fetch and normalize one recipe.
    async fn fetch(&self, session: Session, id: Self::Id) -> Result<FetchedRecipe, ItemError>;
}

/// A detail payload as the platform sent it, before normalization.
#[derive(Debug, Clone)]
pub enum RawRecipe {
    Mealie(MealieRecipe),
    Tandoor(TandoorRecipe),
    Nextcloud(NextcloudRecipe),
}

impl RawRecipe {
    /// Map into ramekin's form. Images are attached later by the relay.
    pub fn normalize(&self) -> Recipe {
        match self {
            RawRecipe::Mealie(r) => r.normalize(),
            RawRecipe::Tandoor(r) => r.normalize(),
            RawRecipe::Nextcloud(r) => r.normalize(),
        }
    }
}

/// A JSON value that platforms send either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// Field deserializer that turns a value of the wrong type into `None`
/// instead of failing the whole payload.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value.clone()) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::debug!(%value, error = %e, "unexpected field type, using zero value");
            Ok(None)
        }
    }
}

/// The trimmed text, or `None` when nothing is left.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|s| !s.is_empty())
}

/// Imports recipes from any supported platform.
///
/// Holds the injected HTTP client and image store; each call to
/// [`Importer::import`] is an independent run with its own credentials.
pub struct Importer {
    client: Arc<dyn HttpClient>,
    uploader: Arc<dyn ImageUploader>,
    config: ImportConfig,
    cancel: CancellationToken,
}

impl Importer {
    pub fn new(client: Arc<dyn HttpClient>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self {
            client,
            uploader,
            config: ImportConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop runs when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run a full import.
    ///
    /// Login and listing failures abort the run before any progress is sent.
    /// After that the run always succeeds, possibly with fewer recipes than
    /// were listed; exactly one progress message is sent per listed recipe.
    pub async fn import(
        &self,
        platform: Platform,
        credentials: &Credentials,
        progress: ProgressSender,
    ) -> Result<Vec<Recipe>, ImportError> {
        let span = tracing::info_span!(
            "import",
            platform = platform.as_str(),
            username = %credentials.username
        );

        async {
            let base_url = validate(credentials).inspect_err(|e| {
                tracing::error!(error = %e, "rejected import request");
            })?;

            match platform {
                Platform::Mealie => {
                    let source = MealieSource::new(&base_url, self.config.page_size);
                    self.run(source, credentials, progress).await
                }
                Platform::Tandoor => {
                    self.run(TandoorSource::new(&base_url), credentials, progress)
                        .await
                }
                Platform::Nextcloud => {
                    self.run(NextcloudSource::new(&base_url), credentials, progress)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run<S: RecipeSource>(
        &self,
        source: S,
        credentials: &Credentials,
        progress: ProgressSender,
    ) -> Result<Vec<Recipe>, ImportError> {
        let platform = source.platform();
        let cancelled = |phase| {
            tracing::info!(phase = ImportPhase::as_str(&phase), "import cancelled");
            ImportError::Cancelled { phase }
        };

        tracing::info!(phase = ImportPhase::Authenticating.as_str(), "logging in");
        let session = Session::new(self.client.clone(), credentials.username.clone());
        let session = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(cancelled(ImportPhase::Authenticating)),
            result = source.authenticate(session, credentials) => result,
        }
        .map_err(|source| {
            tracing::error!(error = %source, "login failed");
            ImportError::Authentication { platform, source }
        })?;

        tracing::info!(phase = ImportPhase::Listing.as_str(), "listing recipes");
        let ids = match source.list(&session, &self.cancel).await {
            Ok(ids) => ids,
            Err(WalkError::Cancelled) => return Err(cancelled(ImportPhase::Listing)),
            Err(source) => {
                tracing::error!(error = %source, "listing failed");
                return Err(ImportError::Listing { platform, source });
            }
        };
        if self.cancel.is_cancelled() {
            return Err(cancelled(ImportPhase::Listing));
        }

        tracing::info!(phase = ImportPhase::Fetching.as_str(), total = ids.len(), "fetching recipes");
        let source = Arc::new(source);
        let coordinator = Coordinator::new(
            session,
            self.uploader.clone(),
            self.config.clone(),
            self.cancel.clone(),
        );
        let recipes = coordinator
            .fetch_all(ids, progress, move |session, id| {
                let source = source.clone();
                async move { source.fetch(session, id).await }
            })
            .await;

        tracing::info!(
            phase = ImportPhase::Completed.as_str(),
            imported = recipes.len(),
            "import finished"
        );
        Ok(recipes)
    }
}

/// Check credentials before any request is sent. Returns the base URL without a trailing `/`.
fn validate(credentials: &Credentials) -> Result<String, ImportError> {
    let base_url = credentials.base_url.trim().trim_end_matches('/');
    if base_url.is_empty() {
        return Err(ImportError::InvalidRequest("base URL is empty".to_string()));
    }

    let parsed = url::Url::parse(base_url)
        .map_err(|e| ImportError::InvalidRequest(format!("invalid base URL {}: {}", base_url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ImportError::InvalidRequest(format!(
            "base URL must be http or https: {}",
            base_url
        )));
    }

    if credentials.username.trim().is_empty() {
        return Err(ImportError::InvalidRequest("username is empty".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(ImportError::InvalidRequest("password is empty".to_string()));
    }

    Ok(base_url.to_string())
}

/// Import every recipe from a Mealie instance.
pub async fn import_mealie(
    base_url: &str,
    username: &str,
    password: &str,
    client: Arc<dyn HttpClient>,
    uploader: Arc<dyn ImageUploader>,
    progress: ProgressSender,
) -> Result<Vec<Recipe>, ImportError> {
    let credentials = Credentials::new(base_url, username, password);
    Importer::new(client, uploader)
        .import(Platform::Mealie, &credentials, progress)
        .await
}

/// Import every recipe from a Tandoor instance.
pub async fn import_tandoor(
    base_url: &str,
    username: &str,
    password: &str,
    client: Arc<dyn HttpClient>,
    uploader: Arc<dyn ImageUploader>,
    progress: ProgressSender,
) -> Result<Vec<Recipe>, ImportError> {
    let credentials = Credentials::new(base_url, username, password);
    Importer::new(client, uploader)
        .import(Platform::Tandoor, &credentials, progress)
        .await
}

/// Import every recipe from a Nextcloud Cookbook.
pub async fn import_nextcloud(
    base_url: &str,
    username: &str,
    password: &str,
    client: Arc<dyn HttpClient>,
    uploader: Arc<dyn ImageUploader>,
    progress: ProgressSender,
) -> Result<Vec<Recipe>, ImportError> {
    let credentials = Credentials::new(base_url, username, password);
    Importer::new(client, uploader)
        .import(Platform::Nextcloud, &credentials, progress)
        .await
}
