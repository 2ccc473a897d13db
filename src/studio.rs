use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::info;

use crate::constants::constants;
use crate::media::{MediaRequest, MediaTier, TierOutput};

/// AI video generation tier.
///
/// Generation is simulated: with a token configured the tier waits out the
/// usual generation latency and hands back a deterministic URL. Without a
/// token it fails so the chain moves on to images.
pub struct StudioVideoTier {
  api_token: Option<String>,
  delay: Duration,
  base_url: String,
}

impl StudioVideoTier {
  pub fn new(api_token: Option<String>) -> Self {
    let c = constants();
    Self { api_token, delay: c.video_latency(), base_url: c.studio_video_base.clone() }
  }

  #[cfg(test)]
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}

/// `<base>/<title>` with the title percent-encoded as a single path segment.
pub fn video_url(base: &str, title: &str) -> Result<String> {
  let mut url = Url::parse(base).map_err(|e| anyhow!("Invalid video base URL {}: {}", base, e))?;
  url.path_segments_mut().map_err(|_| anyhow!("Video base URL {} cannot have a path", base))?.push(title);
  Ok(url.to_string())
}

#[async_trait]
impl MediaTier for StudioVideoTier {
  fn name(&self) -> &'static str {
    "studio-video"
  }

  async fn attempt(&self, request: &MediaRequest) -> Result<Option<TierOutput>> {
    if self.api_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
      return Err(anyhow!("no video generation credentials configured"));
    }
    info!(title = %request.title, "studio: generating recipe video");
    tokio::time::sleep(self.delay).await;
    video_url(&self.base_url, &request.title).map(|url| Some(TierOutput::Video(url)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn video_url_encodes_title() {
    let url = video_url("https://example.com/ai-generated-video", "Berry Smoothie Bowl").unwrap();
    assert_eq!(url, "https://example.com/ai-generated-video/Berry%20Smoothie%20Bowl");
  }

  #[test]
  fn video_url_rejects_bad_base() {
    assert!(video_url("not a url", "x").is_err());
  }

  #[tokio::test]
  async fn attempt_without_token_fails() {
    let tier = StudioVideoTier::new(None).with_delay(Duration::ZERO);
    assert!(tier.attempt(&MediaRequest::new("1", "Pasta")).await.is_err());
    let tier = StudioVideoTier::new(Some(" ".to_string())).with_delay(Duration::ZERO);
    assert!(tier.attempt(&MediaRequest::new("1", "Pasta")).await.is_err());
  }

  #[tokio::test(start_paused = true)]
  async fn attempt_with_token_returns_video_after_delay() {
    let tier = StudioVideoTier::new(Some("token".to_string()));
    let started = tokio::time::Instant::now();
    let out = tier.attempt(&MediaRequest::new("1", "Pasta")).await.unwrap();
    assert_eq!(out, Some(TierOutput::Video("https://example.com/ai-generated-video/Pasta".to_string())));
    assert!(started.elapsed() >= Duration::from_millis(2000));
  }
}
