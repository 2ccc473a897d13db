use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::constants::constants;
use crate::edamam::RecipeImageTier;
use crate::studio::StudioVideoTier;

/// What the detail view asks the resolver for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
  pub recipe_id: String,
  pub title: String,
}

impl MediaRequest {
  pub fn new(recipe_id: impl Into<String>, title: impl Into<String>) -> Self {
    Self { recipe_id: recipe_id.into(), title: title.into() }
  }

  /// The title reduced to alphanumerics and whitespace, lower-cased.
  /// Used both as the image search query and as the placeholder seed.
  pub fn search_term(&self) -> String {
    let kept: String =
      self.title.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace()).collect();
    kept.to_lowercase()
  }
}

/// Raw output of a single fallback tier, before padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutput {
  Video(String),
  Images(Vec<String>),
}

/// One strategy in the fallback chain.
///
/// `Ok(None)` means "nothing to offer, try the next tier"; `Err` is an
/// upstream failure that the resolver logs and swallows.
#[async_trait]
pub trait MediaTier: Send + Sync {
  fn name(&self) -> &'static str;

  async fn attempt(&self, request: &MediaRequest) -> Result<Option<TierOutput>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
  /// `fetched` of the frames came from an image provider; the rest are placeholders.
  Provider { fetched: usize },
  Placeholder,
}

/// Ordered image URLs standing in for a video. Always exactly `frame_count` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
  urls: Vec<String>,
  origin: FrameOrigin,
}

impl FrameSequence {
  /// Take up to `frame_count` non-blank URLs and pad the rest with placeholders seeded from `seed`.
  /// Padding frames are numbered from 0, independent of how many URLs were fetched.
  fn padded(urls: Vec<String>, seed: &str, origin: impl FnOnce(usize) -> FrameOrigin) -> Self {
    let target = constants().frame_count;
    let mut urls: Vec<String> = urls.into_iter().filter(|u| !u.trim().is_empty()).take(target).collect();
    let fetched = urls.len();
    urls.extend((0..target - fetched).map(|i| placeholder_frame_url(seed, i)));
    Self { urls, origin: origin(fetched) }
  }

  pub fn placeholders(seed: &str) -> Self {
    Self::padded(Vec::new(), seed, |_| FrameOrigin::Placeholder)
  }

  pub fn urls(&self) -> &[String] {
    &self.urls
  }

  pub fn len(&self) -> usize {
    self.urls.len()
  }

  pub fn origin(&self) -> FrameOrigin {
    self.origin
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
  Video { url: String },
  Frames(FrameSequence),
}

impl Media {
  pub fn frames(&self) -> Option<&FrameSequence> {
    match self {
      Media::Frames(seq) => Some(seq),
      Media::Video { .. } => None,
    }
  }

  pub fn frame_count(&self) -> usize {
    self.frames().map_or(0, FrameSequence::len)
  }
}

/// Deterministic placeholder image for `seed` at frame `index`.
///
/// Whitespace runs in the seed collapse to `-` so the URL path stays clean.
pub fn placeholder_frame_url(seed: &str, index: usize) -> String {
  let slug = seed.split_whitespace().collect::<Vec<_>>().join("-");
  format!("{}/seed/{}-frame-{}/1280/720", constants().placeholder_host, slug, index)
}

/// Walks the fallback chain until a tier yields something usable.
pub struct MediaResolver {
  tiers: Vec<Box<dyn MediaTier>>,
}

impl MediaResolver {
  pub fn new(tiers: Vec<Box<dyn MediaTier>>) -> Self {
    Self { tiers }
  }

  /// Video generation first, then the recipe image search.
  pub fn standard(client: Client, credentials: &Credentials) -> Self {
    Self::new(vec![
      Box::new(StudioVideoTier::new(credentials.studio_api_token.clone())),
      Box::new(RecipeImageTier::new(client, credentials.edamam_app_id.clone(), credentials.edamam_app_key.clone())),
    ])
  }

  /// Never fails: the worst case is a full set of placeholders seeded from the recipe id.
  pub async fn resolve(&self, request: &MediaRequest) -> Media {
    for tier in &self.tiers {
      match tier.attempt(request).await {
        Ok(Some(TierOutput::Video(url))) if !url.trim().is_empty() => {
          info!(tier = tier.name(), url = %url, "media: video resolved");
          return Media::Video { url };
        }
        Ok(Some(TierOutput::Images(urls))) => {
          let seq = FrameSequence::padded(urls, &request.search_term(), |fetched| FrameOrigin::Provider { fetched });
          info!(tier = tier.name(), origin = ?seq.origin(), "media: frame sequence resolved");
          return Media::Frames(seq);
        }
        Ok(_) => {
          debug!(tier = tier.name(), "media: tier had nothing to offer");
        }
        Err(e) => {
          warn!(tier = tier.name(), err = %format!("{:#}", e), "media: tier failed, falling back");
        }
      }
    }
    warn!(recipe_id = %request.recipe_id, "media: all tiers exhausted, using placeholders");
    Media::Frames(FrameSequence::placeholders(&request.recipe_id))
  }
}

/// Download and decode one frame for terminal rendering.
pub async fn fetch_frame_image(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to request frame {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Frame request {} returned {}", url, response.status()));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read frame bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode frame (URL: {})", url))
}
