use futures::stream::{self, StreamExt};
use image::DynamicImage;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::media::{Media, MediaRequest, MediaResolver, fetch_frame_image};
use crate::playback::Playback;
use crate::present::Rating;
use crate::recipes::{RecipeBook, RecipeDetail};

/// Shared, read-only backends handed to every detail session.
#[derive(Clone)]
pub struct Services {
  pub recipes: Arc<RecipeBook>,
  pub resolver: Arc<MediaResolver>,
  /// `None` skips downloading frame images (text-only player).
  pub client: Option<Client>,
}

/// Things the app reacts to after a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
  NotFound,
  /// `fallback` is true when no video could be generated and frames stand in for it.
  MediaReady { fallback: bool },
}

/// In-flight task receivers and handles, all owned by one session.
#[derive(Default)]
struct SessionTasks {
  detail_rx: Option<oneshot::Receiver<RecipeDetail>>,
  detail_handle: Option<JoinHandle<()>>,
  media_rx: Option<oneshot::Receiver<Media>>,
  media_handle: Option<JoinHandle<()>>,
  frames_rx: Option<mpsc::Receiver<(usize, DynamicImage)>>,
  frames_handle: Option<JoinHandle<()>>,
}

impl SessionTasks {
  fn abort_all(&mut self) {
    let handles = [self.detail_handle.take(), self.media_handle.take(), self.frames_handle.take()];
    for handle in handles.into_iter().flatten() {
      handle.abort();
    }
    self.detail_rx = None;
    self.media_rx = None;
    self.frames_rx = None;
  }
}

/// Everything one open detail view owns: the recipe, its media, the simulated
/// player and the rating widget. Tearing the session down (`cancel` or drop)
/// aborts every task it started and stops the playback timer.
pub struct DetailSession {
  recipe_id: String,
  services: Services,
  detail: Option<RecipeDetail>,
  media: Option<Media>,
  frame_images: HashMap<usize, DynamicImage>,
  pub playback: Playback,
  pub rating: Rating,
  tasks: SessionTasks,
  cancelled: bool,
}

impl DetailSession {
  /// Start loading the recipe. Media resolution begins once the recipe is known.
  pub fn open(recipe_id: impl Into<String>, services: Services) -> Self {
    let recipe_id = recipe_id.into();
    info!(recipe_id = %recipe_id, "session: opening detail view");
    let mut playback = Playback::new();
    playback.set_loading(true);

    let (tx, rx) = oneshot::channel();
    let recipes = Arc::clone(&services.recipes);
    let id = recipe_id.clone();
    let handle = tokio::spawn(async move {
      let _ = tx.send(recipes.get_by_id(&id).await);
    });

    Self {
      recipe_id,
      services,
      detail: None,
      media: None,
      frame_images: HashMap::new(),
      playback,
      rating: Rating::default(),
      tasks: SessionTasks { detail_rx: Some(rx), detail_handle: Some(handle), ..SessionTasks::default() },
      cancelled: false,
    }
  }

  pub fn recipe_id(&self) -> &str {
    &self.recipe_id
  }

  pub fn detail(&self) -> Option<&RecipeDetail> {
    self.detail.as_ref()
  }

  pub fn media(&self) -> Option<&Media> {
    self.media.as_ref()
  }

  #[cfg(test)]
  pub fn is_loading_detail(&self) -> bool {
    self.detail.is_none()
  }

  pub fn is_resolving_media(&self) -> bool {
    self.tasks.media_rx.is_some()
  }

  #[cfg(test)]
  pub fn is_cancelled(&self) -> bool {
    self.cancelled
  }

  /// Index and image of the frame for the current progress, if it has been downloaded.
  pub fn current_frame(&self) -> Option<(usize, &DynamicImage)> {
    let idx = self.playback.frame_index(self.media.as_ref()?.frame_count())?;
    self.frame_images.get(&idx).map(|img| (idx, img))
  }

  pub fn current_frame_index(&self) -> Option<usize> {
    self.playback.frame_index(self.media.as_ref()?.frame_count())
  }

  fn start_media(&mut self, request: MediaRequest) {
    let (tx, rx) = oneshot::channel();
    let resolver = Arc::clone(&self.services.resolver);
    let handle = tokio::spawn(async move {
      let media = resolver.resolve(&request).await;
      let _ = tx.send(media);
    });
    self.tasks.media_rx = Some(rx);
    self.tasks.media_handle = Some(handle);
  }

  fn start_frame_downloads(&mut self, urls: Vec<String>) {
    let Some(client) = self.services.client.clone() else { return };
    let (tx, rx) = mpsc::channel(urls.len().max(1));
    let handle = tokio::spawn(async move {
      stream::iter(urls.into_iter().enumerate())
        .map(|(idx, url)| {
          let client = client.clone();
          let tx = tx.clone();
          async move {
            match fetch_frame_image(&client, &url).await {
              Ok(img) => {
                let _ = tx.send((idx, img)).await;
              }
              Err(e) => warn!(idx, err = %e, "session: frame download failed"),
            }
          }
        })
        .buffer_unordered(constants().frame_fetch_concurrency)
        .collect::<()>()
        .await;
    });
    self.tasks.frames_rx = Some(rx);
    self.tasks.frames_handle = Some(handle);
  }

  /// Apply finished background work and pending playback ticks.
  /// After `cancel` this does nothing, so late results never land on a dead view.
  pub fn poll(&mut self) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    if self.cancelled {
      return events;
    }

    if let Some(mut rx) = self.tasks.detail_rx.take() {
      match rx.try_recv() {
        Ok(detail) => {
          self.tasks.detail_handle = None;
          match detail.recipe.as_ref() {
            Some(recipe) => self.start_media(MediaRequest::new(recipe.id.clone(), recipe.title.clone())),
            None => {
              info!(recipe_id = %self.recipe_id, "session: recipe not found");
              events.push(SessionEvent::NotFound);
            }
          }
          self.detail = Some(detail);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.detail_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          warn!("session: detail task ended without a result");
          self.detail = Some(RecipeDetail::default());
          events.push(SessionEvent::NotFound);
        }
      }
    }

    if let Some(mut rx) = self.tasks.media_rx.take() {
      match rx.try_recv() {
        Ok(media) => {
          self.tasks.media_handle = None;
          let fallback = matches!(media, Media::Frames(_));
          if let Some(seq) = media.frames() {
            self.start_frame_downloads(seq.urls().to_vec());
          }
          self.media = Some(media);
          self.playback.set_loading(false);
          events.push(SessionEvent::MediaReady { fallback });
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.media_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          warn!("session: media task ended without a result");
        }
      }
    }

    if let Some(ref mut rx) = self.tasks.frames_rx {
      while let Ok((idx, img)) = rx.try_recv() {
        debug!(idx, "session: frame image ready");
        self.frame_images.insert(idx, img);
      }
    }

    self.playback.poll();
    events
  }

  /// Tear down: abort in-flight work and stop the playback timer.
  pub fn cancel(&mut self) {
    if self.cancelled {
      return;
    }
    debug!(recipe_id = %self.recipe_id, "session: cancelling");
    self.cancelled = true;
    self.tasks.abort_all();
    self.playback.release();
  }
}

impl Drop for DetailSession {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::media::tests::FakeTier;
  use crate::media::{MediaTier, TierOutput};
  use anyhow::{Result, anyhow};
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::time::Duration;

  /// Video tier that takes `delay` and records whether it ever finished.
  struct SlowTier {
    delay: Duration,
    finished: Arc<AtomicBool>,
  }

  #[async_trait]
  impl MediaTier for SlowTier {
    fn name(&self) -> &'static str {
      "slow"
    }

    async fn attempt(&self, _request: &MediaRequest) -> Result<Option<TierOutput>> {
      tokio::time::sleep(self.delay).await;
      self.finished.store(true, Ordering::SeqCst);
      Ok(Some(TierOutput::Video("https://example.com/slow".to_string())))
    }
  }

  fn services(tiers: Vec<Box<dyn MediaTier>>) -> Services {
    Services {
      recipes: Arc::new(RecipeBook::sample().with_latency(Duration::ZERO)),
      resolver: Arc::new(MediaResolver::new(tiers)),
      client: None,
    }
  }

  /// Poll for a while, collecting events, letting spawned tasks run in between.
  async fn settle(session: &mut DetailSession, rounds: usize) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    for _ in 0..rounds {
      tokio::time::sleep(Duration::from_millis(10)).await;
      events.extend(session.poll());
    }
    events
  }

  #[tokio::test(start_paused = true)]
  async fn open_loads_detail_then_video() {
    let (video, _) = FakeTier::boxed(|| Ok(Some(TierOutput::Video("https://example.com/v".to_string()))));
    let mut session = DetailSession::open("1", services(vec![video]));
    assert!(session.is_loading_detail());
    assert!(session.playback.is_loading());

    let events = settle(&mut session, 5).await;
    assert_eq!(events, vec![SessionEvent::MediaReady { fallback: false }]);
    let recipe = session.detail().and_then(|d| d.recipe.as_ref()).expect("recipe");
    assert_eq!(recipe.title, "Creamy Garlic Parmesan Pasta with Grilled Chicken");
    assert_eq!(session.media(), Some(&Media::Video { url: "https://example.com/v".to_string() }));
    assert!(!session.playback.is_loading());
    assert_eq!(session.current_frame_index(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn failed_tiers_fall_back_to_frames() {
    let (video, _) = FakeTier::boxed(|| Err(anyhow!("down")));
    let mut session = DetailSession::open("2", services(vec![video]));
    let events = settle(&mut session, 5).await;
    assert_eq!(events, vec![SessionEvent::MediaReady { fallback: true }]);
    assert_eq!(session.media().map(Media::frame_count), Some(5));
    assert_eq!(session.current_frame_index(), Some(0));
    assert!(session.current_frame().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn unknown_recipe_reports_not_found() {
    let mut session = DetailSession::open("999", services(Vec::new()));
    let events = settle(&mut session, 3).await;
    assert_eq!(events, vec![SessionEvent::NotFound]);
    assert!(session.media().is_none());
    assert!(!session.is_resolving_media());
  }

  #[tokio::test(start_paused = true)]
  async fn play_is_ignored_until_media_resolves() {
    let finished = Arc::new(AtomicBool::new(false));
    let tier = SlowTier { delay: Duration::from_secs(2), finished: Arc::clone(&finished) };
    let mut session = DetailSession::open("1", services(vec![Box::new(tier)]));
    settle(&mut session, 2).await;
    assert!(session.is_resolving_media());

    session.playback.play();
    assert!(!session.playback.is_playing());

    tokio::time::sleep(Duration::from_secs(3)).await;
    session.poll();
    session.playback.play();
    assert!(session.playback.is_playing());
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_discards_in_flight_resolution() {
    let finished = Arc::new(AtomicBool::new(false));
    let tier = SlowTier { delay: Duration::from_secs(5), finished: Arc::clone(&finished) };
    let mut session = DetailSession::open("1", services(vec![Box::new(tier)]));
    settle(&mut session, 2).await;
    assert!(session.is_resolving_media());

    session.cancel();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(session.poll().is_empty());
    assert!(session.media().is_none());
    assert!(!finished.load(Ordering::SeqCst), "resolution task should have been aborted");
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_stops_playback_timer() {
    let (video, _) = FakeTier::boxed(|| Ok(Some(TierOutput::Video("https://example.com/v".to_string()))));
    let mut session = DetailSession::open("1", services(vec![video]));
    settle(&mut session, 5).await;
    session.playback.play();
    assert!(session.playback.has_ticker());

    session.cancel();
    assert!(session.is_cancelled());
    assert!(!session.playback.has_ticker());
    let progress = session.playback.progress();
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.poll();
    assert_eq!(session.playback.progress(), progress);
  }

  #[tokio::test(start_paused = true)]
  async fn progress_selects_frames() {
    let (video, _) = FakeTier::boxed(|| Ok(None));
    let mut session = DetailSession::open("3", services(vec![video]));
    settle(&mut session, 5).await;
    session.playback.play();
    // 80 ticks of 0.5 → progress 40 → frame 2 of 5.
    for _ in 0..80 {
      session.playback.tick();
    }
    assert_eq!(session.current_frame_index(), Some(2));
  }
}
