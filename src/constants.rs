//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Playback simulation
  pub tick_interval_ms: u64,
  pub tick_step: f64,
  pub clip_secs: u32,

  // Frame sequences
  pub frame_count: usize,
  pub frame_fetch_concurrency: usize,
  pub placeholder_host: String,

  // Simulated latency
  pub search_latency_ms: u64,
  pub detail_latency_ms: u64,
  pub video_latency_ms: u64,

  // Recipe image search
  pub edamam_endpoint: String,
  pub edamam_app_id: String,
  pub edamam_app_key: String,

  // Video generation
  pub studio_video_base: String,

  // UI
  pub notice_secs: u64,
}

impl Constants {
  pub fn tick_interval(&self) -> Duration {
    Duration::from_millis(self.tick_interval_ms)
  }

  pub fn search_latency(&self) -> Duration {
    Duration::from_millis(self.search_latency_ms)
  }

  pub fn detail_latency(&self) -> Duration {
    Duration::from_millis(self.detail_latency_ms)
  }

  pub fn video_latency(&self) -> Duration {
    Duration::from_millis(self.video_latency_ms)
  }

  pub fn notice_lifetime(&self) -> Duration {
    Duration::from_secs(self.notice_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test below fails.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
