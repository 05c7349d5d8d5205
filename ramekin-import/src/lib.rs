pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod image;
pub mod normalize;
pub mod pagination;
pub mod progress;
pub mod session;
pub mod sources;
pub mod types;

pub use auth::AuthToken;
pub use config::ImportConfig;
pub use coordinator::{Coordinator, FetchedRecipe};
pub use error::{FetchError, ImageError, ImportError, ItemError, UploadError};
pub use http::{
    HttpClient, HttpRequest, HttpResponse, MockClient, MockResponse, ReqwestClient,
    ReqwestClientBuilder,
};
pub use image::{fetch_and_upload, relay_image, ImageSource, ImageUploader, UploadFn, MAX_FILE_SIZE};
pub use pagination::{walk_pages, Page, WalkError};
pub use progress::{progress_channel, ProgressReporter, ProgressSender};
pub use session::Session;
pub use sources::{
    import_mealie, import_nextcloud, import_tandoor, Importer, MealieRecipe, MealieSource,
    NextcloudRecipe, NextcloudSource, RawRecipe, RecipeSource, TandoorRecipe, TandoorSource,
};
pub use types::{
    Credentials, ImportPhase, Nutrition, Platform, Progress, Recipe, Times, UNCATEGORIZED,
};
