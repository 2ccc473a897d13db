use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, LineGauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, CardKey, FrameKey};
use crate::display::DisplayMode;
use crate::graphics::{FrameWidget, ResizeCache};
use crate::media::Media;
use crate::playback::PlaybackStatus;
use crate::present::{CARD_MATCHED_LIMIT, CARD_MISSING_LIMIT, badges, format_amount, macro_split, partition_ingredients};
use crate::recipes::{Ingredient, Recipe, RecipeDetail};
use crate::session::DetailSession;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn panel<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ◆ pantry ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  match app.mode {
    AppMode::Detail if app.detail.is_some() => render_detail(frame, app, area),
    AppMode::Results if !app.search_results.is_empty() => render_results(frame, app, area),
    _ => render_welcome(frame, app.theme(), area),
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("◆  Welcome to pantry", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Cook with what you already have.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled(
      "List your ingredients below, separated by commas, and press Enter.",
      Style::default().fg(theme.muted),
    )),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

// --- Results ---

fn badge_line<'a>(theme: &Theme, icon: &'a str, labels: &'a [String], limit: usize, color: Color) -> Line<'a> {
  let set = badges(labels, limit);
  let mut spans = vec![Span::styled(icon, Style::default().fg(color))];
  for label in set.shown {
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!("[{}]", label), Style::default().fg(color)));
  }
  if let Some(more) = set.overflow_label() {
    spans.push(Span::styled(format!(" {}", more), Style::default().fg(theme.muted)));
  }
  Line::from(spans)
}

fn recipe_card<'a>(theme: &Theme, recipe: &'a Recipe, inner_w: usize, fg: Color) -> Vec<Line<'a>> {
  vec![
    Line::from(Span::styled(
      truncate_str(&recipe.title, inner_w),
      Style::default().fg(fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      format!("{} min · {} servings · ♥ {}", recipe.ready_in_minutes, recipe.servings, recipe.likes),
      Style::default().fg(theme.muted),
    )),
    badge_line(theme, "✓", &recipe.matched_ingredients, CARD_MATCHED_LIMIT, theme.available),
    badge_line(theme, "✗", &recipe.missing_ingredients, CARD_MISSING_LIMIT, theme.missing),
  ]
}

/// Cache key for the card image drawn into `area`.
fn card_key(recipe_id: &str, area: Rect) -> CardKey {
  (recipe_id.to_string(), area.width, area.height)
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let [list_area, preview_area] =
    Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(area);
  render_recipe_list(frame, app, list_area);
  render_preview(frame, app, preview_area);
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = panel(theme, " Preview ");
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(recipe) = app.selected_recipe() else { return };
  let key = card_key(&recipe.id, inner);
  let mode = app.display_mode;
  let downloads = app.downloads_enabled();
  let App { card_image, resized_card, .. } = app;

  match card_image.as_ref().filter(|(id, _)| *id == key.0) {
    Some((_, image)) => {
      if let Some(resized) = resized_card.fit(key, image, inner, mode) {
        frame.render_widget(FrameWidget { image: resized, display_mode: mode }, inner);
      }
    }
    None => {
      let text = if downloads { "Loading image…" } else { "Image preview off" };
      let paragraph = Paragraph::new(text).style(Style::default().fg(theme.muted)).alignment(Alignment::Center);
      frame.render_widget(paragraph, centered(inner, 1));
    }
  }
}

fn render_recipe_list(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .search_results
    .iter()
    .enumerate()
    .map(|(i, recipe)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.accent } else { theme.fg };
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let mut lines = recipe_card(theme, recipe, inner_w, fg);
      lines.push(Line::from(""));
      ListItem::new(lines).bg(bg)
    })
    .collect();

  let title = format!(" {} recipes ", app.search_results.len());
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

// --- Detail ---

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let App { detail, resized_frame, display_mode, .. } = app;
  let Some(session) = detail.as_ref() else { return };

  let Some(detail) = session.detail() else {
    let text = Paragraph::new("Loading recipe…").style(Style::default().fg(theme.muted)).alignment(Alignment::Center);
    frame.render_widget(text.block(panel(theme, " Recipe ")), area);
    return;
  };

  let Some(recipe) = detail.recipe.as_ref() else {
    render_not_found(frame, theme, area);
    return;
  };

  let [title_area, body_area] = Layout::vertical([Constraint::Length(2), Constraint::Min(3)]).areas(area);
  let title = vec![
    Line::from(Span::styled(format!(" {}", recipe.title), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(
      format!(" {} min · {} servings · ♥ {}", recipe.ready_in_minutes, recipe.servings, recipe.likes),
      Style::default().fg(theme.muted),
    )),
  ];
  frame.render_widget(Paragraph::new(title), title_area);

  let [left, right] = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(body_area);
  let [video_area, nutrition_area] = Layout::vertical([Constraint::Min(8), Constraint::Length(6)]).areas(left);
  let [ingredients_area, rating_area] = Layout::vertical([Constraint::Min(4), Constraint::Length(5)]).areas(right);

  render_video(frame, theme, session, resized_frame, *display_mode, video_area);
  render_nutrition(frame, theme, detail, nutrition_area);
  render_ingredients(frame, theme, &detail.ingredients, ingredients_area);
  render_rating(frame, theme, session, rating_area);
}

fn render_not_found(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("Recipe not found", Style::default().fg(theme.error).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(
      "The recipe you're looking for doesn't exist or has been removed.",
      Style::default().fg(theme.muted),
    )),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true });
  frame.render_widget(paragraph.block(panel(theme, " Recipe ")), area);
}

/// Draw the downloaded frame for the current progress. Returns false when it is not available yet.
fn render_frame_image(
  frame: &mut Frame,
  session: &DetailSession,
  cache: &mut ResizeCache<FrameKey>,
  mode: DisplayMode,
  area: Rect,
) -> bool {
  let Some((idx, image)) = session.current_frame() else { return false };
  let key: FrameKey = (session.recipe_id().to_string(), idx, area.width, area.height);
  if let Some(resized) = cache.fit(key, image, area, mode) {
    frame.render_widget(FrameWidget { image: resized, display_mode: mode }, area);
  }
  true
}

fn render_video(
  frame: &mut Frame,
  theme: &Theme,
  session: &DetailSession,
  cache: &mut ResizeCache<FrameKey>,
  mode: DisplayMode,
  area: Rect,
) {
  let tag = Line::from(Span::styled(" ✦ AI Generated ", Style::default().fg(theme.key_fg).bg(theme.accent)));
  let block = Block::bordered()
    .title(" Video ")
    .title(tag.right_aligned())
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [screen, gauge_area, controls_area] =
    Layout::vertical([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)]).areas(inner);
  let inner_w = screen.width as usize;
  let playback = &session.playback;

  if playback.is_loading() {
    let text = vec![
      Line::from(Span::styled("⟳ Generating AI video…", Style::default().fg(theme.status))),
      Line::from(Span::styled("This may take a moment", Style::default().fg(theme.muted))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), centered(screen, 2));
  } else {
    match session.media() {
      Some(Media::Video { url }) => {
        let text = vec![
          Line::from(Span::styled("AI video ready", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
          Line::from(Span::styled(
            truncate_str(url, inner_w),
            Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
          )),
        ];
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), centered(screen, 2));
      }
      Some(Media::Frames(seq)) => {
        if !render_frame_image(frame, session, cache, mode, screen) {
          let idx = session.current_frame_index().unwrap_or(0);
          let url = seq.urls().get(idx).map(String::as_str).unwrap_or("");
          let text = vec![
            Line::from(Span::styled(
              format!("Frame {} of {}", idx + 1, seq.len()),
              Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(truncate_str(url, inner_w), Style::default().fg(theme.muted))),
          ];
          frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), centered(screen, 2));
        }
      }
      None => {}
    }
  }

  let ratio = (playback.progress() / 100.0).clamp(0.0, 1.0);
  let gauge = LineGauge::default()
    .ratio(ratio)
    .label(Span::styled(playback.elapsed_label(), Style::default().fg(theme.muted)))
    .filled_style(Style::default().fg(theme.accent))
    .unfilled_style(Style::default().fg(theme.border));
  frame.render_widget(gauge, gauge_area);

  let play = match playback.status() {
    PlaybackStatus::Playing => "❚❚ Pause",
    PlaybackStatus::Idle | PlaybackStatus::Paused => "▶ Play",
  };
  let sound = if playback.is_muted() { "✕ Muted" } else { "♪ Sound" };
  let mut spans = vec![
    Span::styled(play, Style::default().fg(theme.fg)),
    Span::raw("   "),
    Span::styled(sound, Style::default().fg(theme.fg)),
  ];
  if let (Some(idx), Some(count)) = (session.current_frame_index(), session.media().map(Media::frame_count)) {
    spans.push(Span::styled(format!("   frame {}/{}", idx + 1, count), Style::default().fg(theme.muted)));
  }
  spans.push(Span::styled(format!("   [{}]", mode.label().to_lowercase()), Style::default().fg(theme.muted)));
  frame.render_widget(Line::from(spans), controls_area);
}

/// A `height`-row strip vertically centred in `area`.
fn centered(area: Rect, height: u16) -> Rect {
  let height = height.min(area.height);
  Rect { y: area.y + (area.height - height) / 2, height, ..area }
}

fn render_nutrition(frame: &mut Frame, theme: &Theme, detail: &RecipeDetail, area: Rect) {
  let block = panel(theme, " Nutrition per serving ");
  let inner_w = block.inner(area).width as usize;
  let label_w = 9;
  let tail_w = 11;
  let bar_w = inner_w.saturating_sub(label_w + tail_w);

  let mut lines = vec![Line::from(vec![
    Span::styled(format!("{:<label_w$}", "Calories"), Style::default().fg(theme.muted)),
    Span::styled(format!("{} kcal", format_amount(detail.nutrition.calories)), Style::default().fg(theme.fg)),
  ])];
  for share in macro_split(&detail.nutrition) {
    let filled = bar_w * usize::from(share.percent) / 100;
    lines.push(Line::from(vec![
      Span::styled(format!("{:<label_w$}", share.label), Style::default().fg(theme.muted)),
      Span::styled("█".repeat(filled), Style::default().fg(theme.accent)),
      Span::styled("░".repeat(bar_w - filled), Style::default().fg(theme.border)),
      Span::styled(format!(" {:>4}g {:>3}%", format_amount(share.grams), share.percent), Style::default().fg(theme.fg)),
    ]));
  }
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn ingredient_label(ingredient: &Ingredient) -> String {
  let amount = format_amount(ingredient.amount);
  if ingredient.unit.is_empty() {
    format!("{} {}", amount, ingredient.name)
  } else {
    format!("{} {} {}", amount, ingredient.unit, ingredient.name)
  }
}

fn render_ingredients(frame: &mut Frame, theme: &Theme, ingredients: &[Ingredient], area: Rect) {
  let block = panel(theme, " Ingredients ");
  let inner_w = block.inner(area).width.saturating_sub(4) as usize;

  if ingredients.is_empty() {
    let text = Paragraph::new("No ingredient list for this recipe.").style(Style::default().fg(theme.muted));
    frame.render_widget(text.block(block), area);
    return;
  }

  let (available, missing) = partition_ingredients(ingredients);
  let mut lines = Vec::new();
  for (heading, items, icon, color) in
    [("You have", &available, "✓", theme.available), ("You need", &missing, "✗", theme.missing)]
  {
    lines.push(Line::from(Span::styled(
      format!("{} ({})", heading, items.len()),
      Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    for ingredient in items.iter() {
      lines.push(Line::from(vec![
        Span::styled(format!(" {} ", icon), Style::default().fg(color)),
        Span::styled(truncate_str(&ingredient_label(ingredient), inner_w), Style::default().fg(theme.fg)),
      ]));
    }
    lines.push(Line::from(""));
  }
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_rating(frame: &mut Frame, theme: &Theme, session: &DetailSession, area: Rect) {
  let rating = &session.rating;
  let mut stars: Vec<Span> = rating
    .stars()
    .iter()
    .map(|&filled| {
      if filled {
        Span::styled("★ ", Style::default().fg(theme.star))
      } else {
        Span::styled("☆ ", Style::default().fg(theme.muted))
      }
    })
    .collect();
  stars.push(Span::styled(format!(" {:.1}", rating.rating), Style::default().fg(theme.fg)));

  let prompt = if rating.has_rated {
    Span::styled("Thanks for rating this recipe!", Style::default().fg(theme.available))
  } else {
    Span::styled("Tried it? ←/→ to pick, Enter to rate", Style::default().fg(theme.muted))
  };
  let lines = vec![
    Line::from(stars),
    Line::from(Span::styled(rating.summary(), Style::default().fg(theme.muted))),
    Line::from(prompt),
  ];
  frame.render_widget(Paragraph::new(lines).block(panel(theme, " Rating ")), area);
}

// --- Chrome ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.status))
  } else {
    match app.detail.as_ref().filter(|_| app.mode == AppMode::Detail) {
      Some(session) if session.playback.is_playing() => {
        (format!(" ▶ Playing {}", session.playback.elapsed_label()), Style::default().fg(theme.status))
      }
      Some(session) if session.is_resolving_media() => {
        (" ⟳ Generating video…".to_string(), Style::default().fg(theme.status))
      }
      _ => (" Ready".to_string(), Style::default().fg(theme.muted)),
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Ingredients (comma separated) ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.search_results.is_empty();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("^t", "Theme")];
      if has_results {
        k.push(("↓", "Results"));
        k.push(("Esc", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Results => vec![("Enter", "Open"), ("j/k", "Navigate"), ("^t", "Theme"), ("Esc", "Back")],
    AppMode::Detail => {
      let playback = app.detail.as_ref().map(|s| &s.playback);
      let play = if playback.is_some_and(|p| p.is_playing()) { "Pause" } else { "Play" };
      let mute = if playback.is_some_and(|p| p.is_muted()) { "Unmute" } else { "Mute" };
      vec![("Space", play), ("m", mute), ("←/→", "Stars"), ("Enter", "Rate"), ("^t", "Theme"), ("Esc", "Back")]
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
