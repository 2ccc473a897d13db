use image::DynamicImage;
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::ResizeCache;
use crate::media::fetch_frame_image;
use crate::recipes::Recipe;
use crate::session::{DetailSession, Services, SessionEvent};
use crate::theme::{THEMES, Theme, theme_index};

// --- Types ---

pub type SearchResult = Vec<Recipe>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
  Detail,
}

/// Identifies a resized frame: recipe, frame index and target cell size.
pub type FrameKey = (String, usize, u16, u16);

/// Identifies a resized card image: recipe and target cell size.
pub type CardKey = (String, u16, u16);

/// Recipe id and its decoded card image, `None` when the download failed.
type CardResult = (String, Option<DynamicImage>);

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<SearchResult>>,
  pub(crate) card_rx: Option<oneshot::Receiver<CardResult>>,
  /// Recipe whose card image is being downloaded.
  pub(crate) card_pending: Option<String>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub search_results: Vec<Recipe>,
  pub list_state: ListState,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error. Expires like errors do.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub input_scroll: usize,
  /// The open detail view. Replacing or clearing it tears the old session down.
  pub detail: Option<DetailSession>,
  /// Last frame resized for the video panel, so it is not resized on every draw.
  pub resized_frame: ResizeCache<FrameKey>,
  /// Card image of the most recently fetched recipe.
  pub card_image: Option<(String, DynamicImage)>,
  pub resized_card: ResizeCache<CardKey>,
  services: Services,
  /// Preferences as read from disk; environment overrides are never written back.
  prefs: Config,
  pub(crate) tasks: AsyncTasks,
  error_time: Option<Instant>,
  info_time: Option<Instant>,
}

impl App {
  pub fn new(display_mode: DisplayMode, services: Services, prefs: Config) -> Self {
    Self {
      input: String::new(),
      cursor_position: 0,
      mode: AppMode::Input,
      theme_index: theme_index(prefs.theme_name.as_deref()),
      display_mode,
      search_results: Vec::new(),
      list_state: ListState::default(),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      input_scroll: 0,
      detail: None,
      resized_frame: ResizeCache::default(),
      card_image: None,
      resized_card: ResizeCache::default(),
      services,
      prefs,
      tasks: AsyncTasks::default(),
      error_time: None,
      info_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn set_info(&mut self, msg: String) {
    self.info_message = Some(msg);
    self.info_time = Some(Instant::now());
  }

  /// Clear error and info messages once they are older than the notice lifetime.
  pub fn expire_messages(&mut self) {
    let lifetime = constants().notice_lifetime();
    if self.error_time.is_some_and(|t| t.elapsed() >= lifetime) {
      self.clear_error();
    }
    if self.info_time.is_some_and(|t| t.elapsed() >= lifetime) {
      self.info_message = None;
      self.info_time = None;
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.prefs.theme_name = Some(self.theme().name.to_string());
    self.prefs.save();
  }

  pub fn selected_recipe(&self) -> Option<&Recipe> {
    self.list_state.selected().and_then(|i| self.search_results.get(i))
  }

  pub fn select_next(&mut self) {
    let count = self.search_results.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
      self.request_card_image();
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.search_results.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
      self.request_card_image();
    }
  }

  /// Images are only downloaded when the app has an HTTP client (not `--no-frames`).
  pub fn downloads_enabled(&self) -> bool {
    self.services.client.is_some()
  }

  /// The card image, if it belongs to the selected recipe.
  pub fn selected_card_image(&self) -> Option<&DynamicImage> {
    let selected = self.selected_recipe()?;
    self.card_image.as_ref().filter(|(id, _)| *id == selected.id).map(|(_, image)| image)
  }

  /// Fetch the selected recipe's card image unless it is cached or already downloading.
  /// A newer request replaces the receiver of an older one.
  pub fn request_card_image(&mut self) {
    let Some(client) = self.services.client.clone() else { return };
    let Some(recipe) = self.selected_recipe() else { return };
    let id = recipe.id.clone();
    let url = recipe.image.clone();
    if url.trim().is_empty()
      || self.card_image.as_ref().is_some_and(|(cached, _)| *cached == id)
      || self.tasks.card_pending.as_deref() == Some(id.as_str())
    {
      return;
    }

    debug!(recipe_id = %id, "fetching card image");
    let (tx, rx) = oneshot::channel();
    self.tasks.card_pending = Some(id.clone());
    tokio::spawn(async move {
      let image = match fetch_frame_image(&client, &url).await {
        Ok(image) => Some(image),
        Err(e) => {
          warn!(recipe_id = %id, err = %format!("{:#}", e), "card image download failed");
          None
        }
      };
      let _ = tx.send((id, image));
    });
    self.tasks.card_rx = Some(rx);
  }

  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(results) => {
          self.status_message = None;
          if results.is_empty() {
            self.search_results.clear();
            self.list_state.select(None);
            self.mode = AppMode::Input;
            self.set_info("No recipes found.".to_string());
          } else {
            info!(count = results.len(), "search results received");
            self.search_results = results;
            self.list_state.select(Some(0));
            self.mode = AppMode::Results;
            self.request_card_image();
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.card_rx.take() {
      match rx.try_recv() {
        Ok((id, image)) => {
          self.tasks.card_pending = None;
          if let Some(image) = image {
            self.resized_card.clear();
            self.card_image = Some((id, image));
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.card_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.tasks.card_pending = None;
        }
      }
    }

    let events = self.detail.as_mut().map(DetailSession::poll).unwrap_or_default();
    for event in events {
      match event {
        SessionEvent::MediaReady { fallback: true } => {
          self.set_info("Using placeholder video".to_string());
        }
        SessionEvent::MediaReady { fallback: false } => {
          debug!("detail: generated video ready");
        }
        SessionEvent::NotFound => {
          debug!("detail: recipe not found");
        }
      }
    }
  }

  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      self.set_error("Enter at least one ingredient.".to_string());
      return;
    }
    info!(query = %query, "search triggered");
    self.clear_error();
    self.info_message = None;
    self.status_message = Some(format!("Finding recipes with '{}'…", query));

    let recipes = Arc::clone(&self.services.recipes);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(recipes.search(&query).await);
    });
    // Dropping an older receiver discards its result.
    self.tasks.search_rx = Some(rx);
  }

  /// Open the detail view for the selected recipe, tearing down any previous one.
  pub fn open_detail(&mut self) {
    let Some(recipe) = self.selected_recipe() else { return };
    let id = recipe.id.clone();
    self.clear_error();
    self.resized_frame.clear();
    self.detail = Some(DetailSession::open(id, self.services.clone()));
    self.mode = AppMode::Detail;
  }

  pub fn close_detail(&mut self) {
    if let Some(mut session) = self.detail.take() {
      session.cancel();
    }
    self.resized_frame.clear();
    self.info_message = None;
    self.mode = if self.search_results.is_empty() { AppMode::Input } else { AppMode::Results };
  }
}
