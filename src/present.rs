//! Display-only derivations shared by the recipe cards and the detail view.

use crate::recipes::{Ingredient, Nutrition};

/// Matched ingredients shown on a recipe card before collapsing into "+K more".
pub const CARD_MATCHED_LIMIT: usize = 3;
pub const CARD_MISSING_LIMIT: usize = 2;

pub const STAR_COUNT: u8 = 5;

/// Split ingredients into (available, missing), keeping their order.
pub fn partition_ingredients(ingredients: &[Ingredient]) -> (Vec<&Ingredient>, Vec<&Ingredient>) {
  ingredients.iter().partition(|i| i.available)
}

#[derive(Debug, PartialEq, Eq)]
pub struct Badges<'a> {
  pub shown: &'a [String],
  /// Labels hidden behind the "+K more" indicator.
  pub overflow: usize,
}

impl Badges<'_> {
  pub fn overflow_label(&self) -> Option<String> {
    (self.overflow > 0).then(|| format!("+{} more", self.overflow))
  }
}

pub fn badges(labels: &[String], limit: usize) -> Badges<'_> {
  let shown = &labels[..labels.len().min(limit)];
  Badges { shown, overflow: labels.len() - shown.len() }
}

/// Whether star `position` (1-based) is filled. A hovered star wins over the stored rating.
pub fn star_filled(position: u8, hover: u8, rating: f32) -> bool {
  if hover != 0 { position <= hover } else { f32::from(position) <= rating }
}

/// Star widget state for the detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
  pub rating: f32,
  /// 0 when no star is highlighted.
  pub hover: u8,
  pub has_rated: bool,
  pub total_ratings: u32,
}

impl Rating {
  pub fn new(rating: f32, total_ratings: u32) -> Self {
    Self { rating, hover: 0, has_rated: false, total_ratings }
  }

  pub fn hover_next(&mut self) {
    self.hover = (self.hover + 1).min(STAR_COUNT);
  }

  pub fn hover_prev(&mut self) {
    self.hover = self.hover.saturating_sub(1);
  }

  /// Commit the highlighted star. Does nothing when no star is highlighted.
  pub fn rate(&mut self) {
    if self.hover == 0 {
      return;
    }
    self.rating = f32::from(self.hover);
    self.has_rated = true;
    self.hover = 0;
  }

  pub fn stars(&self) -> [bool; STAR_COUNT as usize] {
    std::array::from_fn(|i| star_filled(i as u8 + 1, self.hover, self.rating))
  }

  pub fn summary(&self) -> String {
    let noun = if self.total_ratings == 1 { "rating" } else { "ratings" };
    format!("Based on {} {}", self.total_ratings, noun)
  }
}

impl Default for Rating {
  fn default() -> Self {
    Self::new(4.5, 128)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroShare {
  pub label: &'static str,
  pub grams: f64,
  /// Rounded share of the protein + fat + carbs total.
  pub percent: u8,
}

pub fn macro_split(nutrition: &Nutrition) -> [MacroShare; 3] {
  let total = nutrition.protein + nutrition.fat + nutrition.carbs;
  let share = |label: &'static str, grams: f64| MacroShare {
    label,
    grams,
    percent: if total > 0.0 { (grams / total * 100.0).round() as u8 } else { 0 },
  };
  [share("Protein", nutrition.protein), share("Fat", nutrition.fat), share("Carbs", nutrition.carbs)]
}

/// `2.0` → `2`, `0.25` → `0.25`.
pub fn format_amount(amount: f64) -> String {
  if amount.fract() == 0.0 { format!("{}", amount as i64) } else { format!("{}", amount) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn ingredient(id: u32, available: bool) -> Ingredient {
    Ingredient {
      id,
      name: format!("item{}", id),
      amount: 1.0,
      unit: String::new(),
      original: String::new(),
      available,
    }
  }

  // --- partition_ingredients ---

  #[test]
  fn partition_follows_flag_and_order() {
    let items = vec![ingredient(1, true), ingredient(2, false), ingredient(3, true)];
    let (available, missing) = partition_ingredients(&items);
    assert_eq!(available.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(missing.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2]);
  }

  // --- badges ---

  #[test]
  fn badges_overflow_past_limit() {
    let matched = labels(&["pasta", "chicken", "parmesan", "garlic"]);
    let b = badges(&matched, CARD_MATCHED_LIMIT);
    assert_eq!(b.shown, &matched[..3]);
    assert_eq!(b.overflow_label().as_deref(), Some("+1 more"));
  }

  #[test]
  fn badges_within_limit_have_no_overflow() {
    let missing = labels(&["heavy cream", "parsley"]);
    let b = badges(&missing, CARD_MISSING_LIMIT);
    assert_eq!(b.shown.len(), 2);
    assert_eq!(b.overflow_label(), None);
    assert_eq!(badges(&[], 2).shown.len(), 0);
  }

  // --- stars ---

  #[test]
  fn stars_follow_rating_without_hover() {
    let r = Rating::default();
    assert_eq!(r.stars(), [true, true, true, true, false]);
  }

  #[test]
  fn stars_follow_hover_over_rating() {
    let mut r = Rating::default();
    r.hover_next();
    r.hover_next();
    assert_eq!(r.stars(), [true, true, false, false, false]);
  }

  #[test]
  fn hover_is_clamped() {
    let mut r = Rating::default();
    for _ in 0..10 {
      r.hover_next();
    }
    assert_eq!(r.hover, 5);
    for _ in 0..10 {
      r.hover_prev();
    }
    assert_eq!(r.hover, 0);
  }

  #[test]
  fn rate_commits_hover() {
    let mut r = Rating::default();
    r.rate();
    assert!(!r.has_rated);
    r.hover_next();
    r.rate();
    assert!(r.has_rated);
    assert_eq!(r.rating, 1.0);
    assert_eq!(r.stars(), [true, false, false, false, false]);
  }

  #[test]
  fn summary_pluralizes() {
    assert_eq!(Rating::new(0.0, 1).summary(), "Based on 1 rating");
    assert_eq!(Rating::default().summary(), "Based on 128 ratings");
  }

  // --- macro_split ---

  #[test]
  fn macro_split_percentages() {
    let n = Nutrition { calories: 520.0, protein: 30.0, fat: 28.0, carbs: 42.0 };
    let split = macro_split(&n);
    assert_eq!(split.iter().map(|m| m.percent).collect::<Vec<_>>(), vec![30, 28, 42]);
    assert_eq!(split[0].label, "Protein");
  }

  #[test]
  fn macro_split_zero_nutrition() {
    assert!(macro_split(&Nutrition::default()).iter().all(|m| m.percent == 0));
  }

  // --- format_amount ---

  #[test]
  fn format_amount_trims_whole_numbers() {
    assert_eq!(format_amount(2.0), "2");
    assert_eq!(format_amount(0.25), "0.25");
    assert_eq!(format_amount(0.5), "0.5");
  }
}
