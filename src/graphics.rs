use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

/// Indexed by brightness, darkest first.
const LUMA_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Pixel size of the image that fills `area` in the given mode.
/// Half-blocks pack two pixel rows per cell.
pub fn target_size(area: Rect, mode: DisplayMode) -> (u32, u32) {
  let w = u32::from(area.width).max(1);
  let h = match mode {
    DisplayMode::Direct => u32::from(area.height) * 2,
    DisplayMode::Ascii => u32::from(area.height),
  };
  (w, h.max(1))
}

/// Resize a frame to exactly cover `area`.
pub fn fit_frame(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let (w, h) = target_size(area, mode);
  image.resize_to_fill(w, h, FilterType::Triangle)
}

/// Resized copy of one source image, rebuilt only when its key changes.
/// Keys carry the target cell size so a terminal resize refits the image.
pub struct ResizeCache<K> {
  entry: Option<(K, DynamicImage)>,
}

impl<K> Default for ResizeCache<K> {
  fn default() -> Self {
    Self { entry: None }
  }
}

impl<K: PartialEq> ResizeCache<K> {
  pub fn fit(&mut self, key: K, image: &DynamicImage, area: Rect, mode: DisplayMode) -> Option<&DynamicImage> {
    if self.entry.as_ref().is_none_or(|(cached, _)| *cached != key) {
      self.entry = Some((key, fit_frame(image, area, mode)));
    }
    self.entry.as_ref().map(|(_, resized)| resized)
  }

  pub fn clear(&mut self) {
    self.entry = None;
  }
}

/// Draws an already-resized frame centred in its area.
pub struct FrameWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

impl Widget for FrameWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => draw_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => draw_luma(self.image, area, buf),
    }
  }
}

/// Cell position for pixel column `x` / cell row `y`, centred inside `area`.
fn cell(area: Rect, used_w: u32, used_h: u32, x: u32, y: u32) -> (u16, u16) {
  let off_x = (u32::from(area.width).saturating_sub(used_w) / 2 + x).min(u32::from(u16::MAX)) as u16;
  let off_y = (u32::from(area.height).saturating_sub(used_h) / 2 + y).min(u32::from(u16::MAX)) as u16;
  (area.x.saturating_add(off_x), area.y.saturating_add(off_y))
}

fn draw_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let width = rgb.width().min(u32::from(area.width));
  let rows = rgb.height().div_ceil(2).min(u32::from(area.height));

  for row in 0..rows {
    for x in 0..width {
      let top = rgb.get_pixel(x, row * 2);
      let below = row * 2 + 1;
      let bg = if below < rgb.height() {
        let p = rgb.get_pixel(x, below);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, width, rows, x, row);
      buf.set_string(cx, cy, "▀", Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bg));
    }
  }
}

fn draw_luma(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let width = luma.width().min(u32::from(area.width));
  let rows = luma.height().min(u32::from(area.height));

  for y in 0..rows {
    for x in 0..width {
      let (cx, cy) = cell(area, width, rows, x, y);
      buf.set_string(cx, cy, luma_char(luma.get_pixel(x, y)[0]), Style::default());
    }
  }
}

fn luma_char(value: u8) -> &'static str {
  let idx = (f32::from(value) / 255.0 * (LUMA_RAMP.len() - 1) as f32).round() as usize;
  LUMA_RAMP[idx.min(LUMA_RAMP.len() - 1)]
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn target_size_doubles_rows_for_half_blocks() {
    let area = Rect::new(0, 0, 40, 10);
    assert_eq!(target_size(area, DisplayMode::Direct), (40, 20));
    assert_eq!(target_size(area, DisplayMode::Ascii), (40, 10));
  }

  #[test]
  fn luma_char_extremes() {
    assert_eq!(luma_char(0), " ");
    assert_eq!(luma_char(255), "@");
  }

  #[test]
  fn half_blocks_paint_top_and_bottom_pixels() {
    let mut img = RgbImage::new(2, 2);
    img.put_pixel(0, 0, Rgb([255, 0, 0]));
    img.put_pixel(0, 1, Rgb([0, 0, 255]));
    let image = DynamicImage::ImageRgb8(img);
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    FrameWidget { image: &image, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    let c = &buf[(0, 0)];
    assert_eq!(c.symbol(), "▀");
    assert_eq!(c.fg, Color::Rgb(255, 0, 0));
    assert_eq!(c.bg, Color::Rgb(0, 0, 255));
  }

  #[test]
  fn resize_cache_reuses_until_key_changes() {
    let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
    let blue = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 255])));
    let area = Rect::new(0, 0, 2, 2);
    let mut cache = ResizeCache::default();

    let first = cache.fit("a", &red, area, DisplayMode::Direct).map(|img| img.to_rgb8().get_pixel(0, 0).0);
    assert_eq!(first, Some([255, 0, 0]));
    let same_key = cache.fit("a", &blue, area, DisplayMode::Direct).map(|img| img.to_rgb8().get_pixel(0, 0).0);
    assert_eq!(same_key, Some([255, 0, 0]));
    let new_key = cache.fit("b", &blue, area, DisplayMode::Direct).map(|img| img.to_rgb8().get_pixel(0, 0).0);
    assert_eq!(new_key, Some([0, 0, 255]));

    cache.clear();
    let refit = cache.fit("b", &red, area, DisplayMode::Direct).map(|img| (img.width(), img.height()));
    assert_eq!(refit, Some((2, 4)));
  }

  #[test]
  fn empty_area_renders_nothing() {
    let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
    let area = Rect::new(0, 0, 0, 0);
    let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
    FrameWidget { image: &image, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }
}
