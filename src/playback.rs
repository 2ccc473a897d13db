//! Simulated video playback.
//!
//! There is no decoder: progress runs from 0 to 100 on a fixed timer and the
//! current frame is derived from progress and the length of the frame
//! sequence.
//!
//! - Idle: nothing played yet
//! - Playing: ticker task alive, progress advancing
//! - Paused: ticker released, progress kept (or reset to 0 after reaching the end)

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::constants::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
  Idle,
  Playing,
  Paused,
}

/// Repeating timer task. Dropping it aborts the task, so a `Ticker` can never
/// outlive the playback that owns it.
pub struct Ticker {
  handle: JoinHandle<()>,
  rx: mpsc::Receiver<()>,
}

impl Ticker {
  pub fn spawn(period: Duration) -> Self {
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(async move {
      let mut interval = tokio::time::interval_at(Instant::now() + period, period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
      loop {
        interval.tick().await;
        if tx.send(()).await.is_err() {
          break;
        }
      }
    });
    Self { handle, rx }
  }

  /// Number of ticks delivered since the last drain.
  fn drain(&mut self) -> usize {
    let mut n = 0;
    while self.rx.try_recv().is_ok() {
      n += 1;
    }
    n
  }
}

impl Drop for Ticker {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// `floor(progress / 100 * count)`, clamped to the last frame. `None` for an empty sequence.
pub fn frame_index(progress: f64, frame_count: usize) -> Option<usize> {
  if frame_count == 0 {
    return None;
  }
  let raw = (progress.clamp(0.0, 100.0) / 100.0 * frame_count as f64).floor() as usize;
  Some(raw.min(frame_count - 1))
}

fn clock(secs: u32) -> String {
  format!("{}:{:02}", secs / 60, secs % 60)
}

pub struct Playback {
  progress: f64,
  status: PlaybackStatus,
  muted: bool,
  loading: bool,
  ticker: Option<Ticker>,
  period: Duration,
  step: f64,
}

impl Default for Playback {
  fn default() -> Self {
    Self::new()
  }
}

impl Playback {
  pub fn new() -> Self {
    let c = constants();
    Self {
      progress: 0.0,
      status: PlaybackStatus::Idle,
      muted: false,
      loading: false,
      ticker: None,
      period: c.tick_interval(),
      step: c.tick_step,
    }
  }

  pub fn progress(&self) -> f64 {
    self.progress
  }

  pub fn status(&self) -> PlaybackStatus {
    self.status
  }

  pub fn is_playing(&self) -> bool {
    self.status == PlaybackStatus::Playing
  }

  pub fn is_muted(&self) -> bool {
    self.muted
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  #[cfg(test)]
  pub fn has_ticker(&self) -> bool {
    self.ticker.is_some()
  }

  /// While loading, `play` is ignored. Entering the loading state stops playback.
  pub fn set_loading(&mut self, loading: bool) {
    self.loading = loading;
    if loading {
      self.pause();
    }
  }

  pub fn play(&mut self) {
    if self.loading || self.is_playing() {
      return;
    }
    debug!(progress = self.progress, "playback: play");
    self.status = PlaybackStatus::Playing;
    self.ticker = Some(Ticker::spawn(self.period));
  }

  pub fn pause(&mut self) {
    if !self.is_playing() {
      return;
    }
    debug!(progress = self.progress, "playback: pause");
    self.status = PlaybackStatus::Paused;
    self.ticker = None;
  }

  pub fn toggle(&mut self) {
    if self.is_playing() { self.pause() } else { self.play() }
  }

  /// Pure UI state; there is no audio track to silence.
  pub fn toggle_mute(&mut self) {
    self.muted = !self.muted;
  }

  /// Advance one step. The step that would reach the end rewinds to 0 and pauses.
  pub fn tick(&mut self) {
    if !self.is_playing() {
      return;
    }
    let next = self.progress + self.step;
    if next >= 100.0 {
      self.progress = 0.0;
      self.pause();
    } else {
      self.progress = next;
    }
  }

  /// Apply every tick delivered by the ticker since the last poll.
  /// Returns true if any tick was applied.
  pub fn poll(&mut self) -> bool {
    let pending = self.ticker.as_mut().map_or(0, Ticker::drain);
    for _ in 0..pending {
      self.tick();
    }
    pending > 0
  }

  /// Stop the timer for good; used when the owning view is torn down.
  pub fn release(&mut self) {
    self.pause();
    self.ticker = None;
  }

  pub fn frame_index(&self, frame_count: usize) -> Option<usize> {
    frame_index(self.progress, frame_count)
  }

  /// Elapsed / total time of the simulated clip, e.g. `0:24 / 1:00`.
  pub fn elapsed_label(&self) -> String {
    let total = constants().clip_secs;
    let elapsed = (self.progress / 100.0 * total as f64).floor() as u32;
    format!("{} / {}", clock(elapsed.min(total)), clock(total))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- frame_index ---

  #[test]
  fn frame_index_examples() {
    assert_eq!(frame_index(40.0, 5), Some(2));
    assert_eq!(frame_index(0.0, 5), Some(0));
    assert_eq!(frame_index(99.9, 5), Some(4));
  }

  #[test]
  fn frame_index_never_out_of_bounds() {
    assert_eq!(frame_index(100.0, 5), Some(4));
    assert_eq!(frame_index(250.0, 5), Some(4));
    assert_eq!(frame_index(-3.0, 5), Some(0));
    assert_eq!(frame_index(50.0, 1), Some(0));
  }

  #[test]
  fn frame_index_empty_sequence() {
    assert_eq!(frame_index(50.0, 0), None);
  }

  // --- state machine ---

  #[test]
  fn new_playback_is_idle() {
    let p = Playback::new();
    assert_eq!(p.status(), PlaybackStatus::Idle);
    assert_eq!(p.progress(), 0.0);
    assert!(!p.is_muted());
    assert!(!p.has_ticker());
  }

  #[test]
  fn tick_ignored_when_not_playing() {
    let mut p = Playback::new();
    p.tick();
    assert_eq!(p.progress(), 0.0);
  }

  #[tokio::test]
  async fn play_while_loading_is_noop() {
    let mut p = Playback::new();
    p.set_loading(true);
    p.play();
    assert_eq!(p.status(), PlaybackStatus::Idle);
    assert!(!p.has_ticker());
    p.set_loading(false);
    p.play();
    assert_eq!(p.status(), PlaybackStatus::Playing);
  }

  #[tokio::test]
  async fn toggle_cycles_playing_and_paused() {
    let mut p = Playback::new();
    p.toggle();
    assert_eq!(p.status(), PlaybackStatus::Playing);
    assert!(p.has_ticker());
    p.toggle();
    assert_eq!(p.status(), PlaybackStatus::Paused);
    assert!(!p.has_ticker());
    p.toggle();
    assert_eq!(p.status(), PlaybackStatus::Playing);
  }

  #[tokio::test]
  async fn progress_is_monotonic_then_resets_at_end() {
    let mut p = Playback::new();
    p.play();
    let mut last = p.progress();
    for _ in 0..199 {
      p.tick();
      assert!(p.progress() >= last);
      last = p.progress();
    }
    assert_eq!(p.progress(), 99.5);
    assert!(p.is_playing());

    p.tick();
    assert_eq!(p.progress(), 0.0);
    assert_eq!(p.status(), PlaybackStatus::Paused);
    assert!(!p.has_ticker());
  }

  #[tokio::test]
  async fn mute_does_not_touch_progress() {
    let mut p = Playback::new();
    p.play();
    p.tick();
    p.tick();
    p.toggle_mute();
    assert!(p.is_muted());
    assert_eq!(p.progress(), 1.0);
    assert!(p.is_playing());
    p.toggle_mute();
    assert!(!p.is_muted());
  }

  #[test]
  fn elapsed_label_formats_clip_time() {
    let mut p = Playback::new();
    assert_eq!(p.elapsed_label(), "0:00 / 1:00");
    p.progress = 40.0;
    assert_eq!(p.elapsed_label(), "0:24 / 1:00");
    p.progress = 99.5;
    assert_eq!(p.elapsed_label(), "0:59 / 1:00");
  }

  // --- ticker ---

  #[tokio::test(start_paused = true)]
  async fn ticker_drives_progress_while_playing() {
    let mut p = Playback::new();
    p.play();
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(p.poll());
    assert!(p.progress() > 0.0 && p.progress() <= 1.5, "progress was {}", p.progress());

    p.pause();
    let paused_at = p.progress();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!p.poll());
    assert_eq!(p.progress(), paused_at);
  }

  #[tokio::test(start_paused = true)]
  async fn release_stops_the_ticker() {
    let mut p = Playback::new();
    p.play();
    p.release();
    assert!(!p.has_ticker());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!p.poll());
    assert_eq!(p.progress(), 0.0);
  }
}
