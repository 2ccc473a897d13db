//! Recipe image search used as the frame fallback tier.
//!
//! Only the image field of each hit is read; every other field of the
//! provider's response is ignored.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::constants;
use crate::media::{MediaRequest, MediaTier, TierOutput};

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
  #[serde(default)]
  pub hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
pub struct Hit {
  pub recipe: Option<HitRecipe>,
}

#[derive(Debug, Deserialize)]
pub struct HitRecipe {
  pub image: Option<String>,
}

impl SearchResponse {
  /// Image URLs from the first `limit` hits. Hits without an image are skipped,
  /// so the result can be shorter than `limit`.
  pub fn images(&self, limit: usize) -> Vec<String> {
    self
      .hits
      .iter()
      .take(limit)
      .filter_map(|hit| hit.recipe.as_ref()?.image.clone())
      .filter(|url| !url.trim().is_empty())
      .collect()
  }
}

pub struct RecipeImageTier {
  client: Client,
  endpoint: String,
  app_id: String,
  app_key: String,
}

impl RecipeImageTier {
  pub fn new(client: Client, app_id: String, app_key: String) -> Self {
    Self { client, endpoint: constants().edamam_endpoint.clone(), app_id, app_key }
  }

  /// `?type=public&q=<term>&app_id=<id>&app_key=<key>` against the configured endpoint.
  pub fn search_url(&self, term: &str) -> Result<Url> {
    Url::parse_with_params(
      &self.endpoint,
      &[("type", "public"), ("q", term), ("app_id", self.app_id.as_str()), ("app_key", self.app_key.as_str())],
    )
    .with_context(|| format!("Invalid recipe search endpoint {}", self.endpoint))
  }
}

#[async_trait]
impl MediaTier for RecipeImageTier {
  fn name(&self) -> &'static str {
    "recipe-images"
  }

  async fn attempt(&self, request: &MediaRequest) -> Result<Option<TierOutput>> {
    let term = request.search_term();
    info!(term = %term, "edamam: fetching recipe images");
    let url = self.search_url(&term)?;

    let response = self.client.get(url).send().await.context("Recipe image request failed")?;
    if !response.status().is_success() {
      return Err(anyhow!("Recipe image search returned {}", response.status()));
    }
    let body: SearchResponse = response.json().await.context("Failed to parse recipe image response")?;
    debug!(hits = body.hits.len(), "edamam: response received");

    Ok(Some(TierOutput::Images(body.images(constants().frame_count))))
  }
}
