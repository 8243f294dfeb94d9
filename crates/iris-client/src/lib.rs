use std::{ops::Deref, sync::Arc};

use rest::{RestBackend, RestOptions};
use traits::{SubmitReviews, TrackJobs};

pub mod error;
pub mod models;
pub mod rest;
pub mod traits;

pub use error::ApiError;

/// Full capability set of the review backend.
pub trait Backend: SubmitReviews + TrackJobs + Send + Sync {}

/// Handle to a review backend. Cheap to pass around; the concrete transport
/// sits behind [`Backend`].
pub struct ReviewClient {
    backend: Arc<dyn Backend>,
}

impl ReviewClient {
    pub fn rest(options: RestOptions) -> Result<Self, ApiError> {
        let backend = Arc::new(RestBackend::new(options)?);

        Ok(Self { backend })
    }
}

impl Deref for ReviewClient {
    type Target = Arc<dyn Backend>;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}
