//! Concurrent fetch of every listed recipe.
//!
//! One task per identifier, at most `max_concurrency` in flight. Each task
//! fetches and normalizes its recipe, relays the image, then appends the
//! result and reports progress under a single lock. Failed items are logged
//! and dropped; the run itself never fails here.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ImportConfig;
use crate::error::ItemError;
use crate::image::{relay_image, ImageSource, ImageUploader};
use crate::progress::{ProgressReporter, ProgressSender};
use crate::session::Session;
use crate::types::Recipe;

/// A normalized recipe plus where to find its image.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecipe {
    pub recipe: Recipe,
    pub image: Option<ImageSource>,
}

impl FetchedRecipe {
    pub fn new(recipe: Recipe, image: Option<ImageSource>) -> Self {
        Self { recipe, image }
    }
}

/// Mutable state shared by all item tasks.
struct Shared {
    recipes: Vec<Recipe>,
    reporter: ProgressReporter,
}

impl Shared {
    fn finish(&mut self, recipe: Option<Recipe>) {
        if let Some(recipe) = recipe {
            self.recipes.push(recipe);
        }
        self.reporter.item_finished();
    }
}

fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Coordinator {
    session: Session,
    uploader: Arc<dyn ImageUploader>,
    config: ImportConfig,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        session: Session,
        uploader: Arc<dyn ImageUploader>,
        config: ImportConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            uploader,
            config,
            cancel,
        }
    }

    /// Fetch every identifier with `fetch`, returning the recipes that succeeded.
    ///
    /// Sends exactly `ids.len()` progress messages, one per item, whatever
    /// happens to the item. Output order is completion order.
    pub async fn fetch_all<I, F, Fut>(
        &self,
        ids: Vec<I>,
        progress: ProgressSender,
        fetch: F,
    ) -> Vec<Recipe>
    where
        I: Display + Send + 'static,
        F: Fn(Session, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FetchedRecipe, ItemError>> + Send + 'static,
    {
        let total = ids.len();
        let shared = Arc::new(Mutex::new(Shared {
            recipes: Vec::with_capacity(total),
            reporter: ProgressReporter::new(progress, total),
        }));
        let max_concurrency = self.config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let fetch = Arc::new(fetch);

        tracing::info!(total, max_concurrency, "fetching recipes");

        let mut tasks = JoinSet::new();
        for id in ids {
            let span = tracing::info_span!("import_item", id = %id);
            let shared = shared.clone();
            let semaphore = semaphore.clone();
            let fetch = fetch.clone();
            let session = self.session.clone();
            let uploader = self.uploader.clone();
            let cancel = self.cancel.clone();
            let max_image_bytes = self.config.max_image_bytes;

            tasks.spawn(
                async move {
                    let recipe = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(ItemError::Cancelled),
                        result = async {
                            let _permit = semaphore
                                .acquire_owned()
                                .await
                                .map_err(|_| ItemError::Cancelled)?;
                            let fetched = (*fetch)(session.clone(), id).await?;
                            let mut recipe = fetched.recipe;
                            if let Some(image) = relay_image(
                                &session,
                                uploader.as_ref(),
                                fetched.image.as_ref(),
                                max_image_bytes,
                            )
                            .await
                            {
                                recipe.images.push(image);
                            }
                            Ok::<_, ItemError>(recipe)
                        } => result,
                    };

                    let recipe = match recipe {
                        Ok(recipe) => Some(recipe),
                        Err(ItemError::Cancelled) => {
                            tracing::debug!("skipped, import cancelled");
                            None
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "recipe not imported");
                            None
                        }
                    };
                    lock(&shared).finish(recipe);
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // The task died before reporting; count it so totals still add up.
                tracing::error!(error = %e, "recipe task failed");
                lock(&shared).finish(None);
            }
        }

        let mut state = lock(&shared);
        tracing::info!(
            imported = state.recipes.len(),
            finished = state.reporter.completed(),
            total,
            "finished fetching recipes"
        );
        std::mem::take(&mut state.recipes)
    }
}
