//! In-memory recipe table: ingredient search and per-recipe details.
//!
//! Every call sleeps for a configurable latency first so the UI goes through
//! the same loading states it would against a real backend.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::constants;

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
  pub id: String,
  pub title: String,
  pub image: String,
  pub ready_in_minutes: u32,
  pub servings: u32,
  pub likes: u32,
  /// Ingredients the user already has, in display order.
  pub matched_ingredients: Vec<String>,
  pub missing_ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
  pub id: u32,
  pub name: String,
  pub amount: f64,
  /// May be empty ("1 ripe avocado").
  pub unit: String,
  pub original: String,
  pub available: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Nutrition {
  pub calories: f64,
  pub protein: f64,
  pub fat: f64,
  pub carbs: f64,
}

/// Everything the detail view needs for one recipe.
///
/// An unknown id is not an error: `recipe` is `None`, the ingredient list is
/// empty and nutrition is all zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDetail {
  pub recipe: Option<Recipe>,
  pub ingredients: Vec<Ingredient>,
  pub nutrition: Nutrition,
}

pub struct RecipeBook {
  recipes: Vec<Recipe>,
  ingredients: HashMap<String, Vec<Ingredient>>,
  nutrition: HashMap<String, Nutrition>,
  search_latency: Duration,
  detail_latency: Duration,
}

/// Split a comma-separated ingredient query into lower-cased, trimmed terms.
/// Empty terms are dropped, so they never match anything.
pub fn parse_terms(query: &str) -> Vec<String> {
  query.split(',').map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect()
}

/// True when any matched-ingredient label contains any of the terms.
pub fn matches_terms(recipe: &Recipe, terms: &[String]) -> bool {
  recipe.matched_ingredients.iter().any(|label| {
    let label = label.to_lowercase();
    terms.iter().any(|term| label.contains(term.as_str()))
  })
}

impl RecipeBook {
  pub fn new(
    recipes: Vec<Recipe>,
    ingredients: HashMap<String, Vec<Ingredient>>,
    nutrition: HashMap<String, Nutrition>,
  ) -> Self {
    let c = constants();
    Self { recipes, ingredients, nutrition, search_latency: c.search_latency(), detail_latency: c.detail_latency() }
  }

  /// Override both simulated latencies.
  #[cfg(test)]
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.search_latency = latency;
    self.detail_latency = latency;
    self
  }

  /// Recipes whose matched ingredients contain at least one query term.
  /// Storage order is kept; there is no ranking.
  pub async fn search(&self, query: &str) -> Vec<Recipe> {
    info!(query = %query, "recipes: searching by ingredients");
    tokio::time::sleep(self.search_latency).await;
    self.search_now(query)
  }

  fn search_now(&self, query: &str) -> Vec<Recipe> {
    let terms = parse_terms(query);
    if terms.is_empty() {
      debug!("recipes: query has no usable terms");
      return Vec::new();
    }
    self.recipes.iter().filter(|r| matches_terms(r, &terms)).cloned().collect()
  }

  pub async fn get_by_id(&self, id: &str) -> RecipeDetail {
    info!(id = %id, "recipes: loading recipe detail");
    tokio::time::sleep(self.detail_latency).await;
    self.detail_now(id)
  }

  fn detail_now(&self, id: &str) -> RecipeDetail {
    RecipeDetail {
      recipe: self.recipes.iter().find(|r| r.id == id).cloned(),
      ingredients: self.ingredients.get(id).cloned().unwrap_or_default(),
      nutrition: self.nutrition.get(id).copied().unwrap_or_default(),
    }
  }

  /// The built-in sample catalogue.
  pub fn sample() -> Self {
    let recipes = vec![
      recipe(
        "1",
        "Creamy Garlic Parmesan Pasta with Grilled Chicken",
        "https://images.unsplash.com/photo-1473093295043-cdd812d0e601?q=80&w=2070",
        (30, 4, 256),
        &["pasta", "chicken", "parmesan", "garlic"],
        &["heavy cream", "parsley"],
      ),
      recipe(
        "2",
        "Avocado Toast with Poached Eggs and Tomatoes",
        "https://images.unsplash.com/photo-1603046891744-1f76eb10aec7?q=80&w=2487",
        (15, 2, 187),
        &["bread", "avocado", "eggs"],
        &["cherry tomatoes", "microgreens"],
      ),
      recipe(
        "3",
        "Vegetable Stir Fry with Tofu and Soy Sauce",
        "https://images.unsplash.com/photo-1512621776951-a57141f2eefd?q=80&w=2070",
        (25, 3, 142),
        &["tofu", "bell peppers", "broccoli"],
        &["soy sauce", "sesame oil", "green onions"],
      ),
      recipe(
        "4",
        "Chocolate Chip Cookies with Sea Salt",
        "https://images.unsplash.com/photo-1499636136210-6f4ee915583e?q=80&w=2487",
        (45, 24, 312),
        &["flour", "sugar", "butter", "chocolate chips"],
        &["sea salt", "vanilla extract"],
      ),
      recipe(
        "5",
        "Berry Smoothie Bowl with Granola",
        "https://images.unsplash.com/photo-1501443762994-82bd5dace89a?q=80&w=2070",
        (10, 1, 165),
        &["berries", "banana", "yogurt"],
        &["granola", "honey", "chia seeds"],
      ),
      recipe(
        "6",
        "Roasted Salmon with Lemon and Dill",
        "https://images.unsplash.com/photo-1519708227418-c8fd9a32b7a2?q=80&w=2070",
        (35, 2, 201),
        &["salmon", "lemon", "olive oil"],
        &["dill", "garlic powder", "black pepper"],
      ),
    ];

    let mut ingredients = HashMap::new();
    ingredients.insert(
      "1".to_string(),
      vec![
        ingredient(1, "pasta", 8.0, "oz", "8 oz pasta", true),
        ingredient(2, "chicken", 2.0, "breasts", "2 chicken breasts, grilled and sliced", true),
        ingredient(3, "parmesan", 1.0, "cup", "1 cup grated parmesan cheese", true),
        ingredient(4, "garlic", 4.0, "cloves", "4 cloves garlic, minced", true),
        ingredient(5, "heavy cream", 1.0, "cup", "1 cup heavy cream", false),
        ingredient(6, "parsley", 2.0, "tbsp", "2 tbsp fresh parsley, chopped", false),
        ingredient(7, "butter", 2.0, "tbsp", "2 tbsp butter", true),
        ingredient(8, "salt", 1.0, "tsp", "1 tsp salt", true),
        ingredient(9, "pepper", 0.5, "tsp", "1/2 tsp black pepper", true),
      ],
    );
    ingredients.insert(
      "2".to_string(),
      vec![
        ingredient(1, "bread", 2.0, "slices", "2 slices sourdough bread, toasted", true),
        ingredient(2, "avocado", 1.0, "", "1 ripe avocado, mashed", true),
        ingredient(3, "eggs", 2.0, "", "2 large eggs, poached", true),
        ingredient(4, "cherry tomatoes", 0.5, "cup", "1/2 cup cherry tomatoes, halved", false),
        ingredient(5, "microgreens", 0.25, "cup", "1/4 cup microgreens", false),
        ingredient(6, "lemon juice", 1.0, "tsp", "1 tsp fresh lemon juice", true),
        ingredient(7, "salt", 0.25, "tsp", "1/4 tsp salt", true),
        ingredient(8, "pepper", 0.25, "tsp", "1/4 tsp black pepper", true),
      ],
    );

    let nutrition = [
      ("1", 520.0, 30.0, 28.0, 42.0),
      ("2", 350.0, 15.0, 20.0, 30.0),
      ("3", 280.0, 18.0, 12.0, 25.0),
      ("4", 180.0, 2.0, 9.0, 22.0),
      ("5", 320.0, 10.0, 6.0, 60.0),
      ("6", 380.0, 36.0, 22.0, 8.0),
    ]
    .into_iter()
    .map(|(id, calories, protein, fat, carbs)| (id.to_string(), Nutrition { calories, protein, fat, carbs }))
    .collect();

    Self::new(recipes, ingredients, nutrition)
  }
}

fn recipe(id: &str, title: &str, image: &str, stats: (u32, u32, u32), matched: &[&str], missing: &[&str]) -> Recipe {
  let (ready_in_minutes, servings, likes) = stats;
  Recipe {
    id: id.to_string(),
    title: title.to_string(),
    image: image.to_string(),
    ready_in_minutes,
    servings,
    likes,
    matched_ingredients: matched.iter().map(|s| s.to_string()).collect(),
    missing_ingredients: missing.iter().map(|s| s.to_string()).collect(),
  }
}

fn ingredient(id: u32, name: &str, amount: f64, unit: &str, original: &str, available: bool) -> Ingredient {
  Ingredient {
    id,
    name: name.to_string(),
    amount,
    unit: unit.to_string(),
    original: original.to_string(),
    available,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn book() -> RecipeBook {
    RecipeBook::sample().with_latency(Duration::ZERO)
  }

  fn titles(recipes: &[Recipe]) -> Vec<&str> {
    recipes.iter().map(|r| r.title.as_str()).collect()
  }

  // --- parse_terms ---

  #[test]
  fn parse_terms_trims_and_lowercases() {
    assert_eq!(parse_terms(" Chicken , GARLIC"), vec!["chicken", "garlic"]);
  }

  #[test]
  fn parse_terms_drops_empty_terms() {
    assert!(parse_terms("").is_empty());
    assert!(parse_terms(" , ,").is_empty());
    assert_eq!(parse_terms("eggs,"), vec!["eggs"]);
  }

  // --- search ---

  #[tokio::test]
  async fn search_chicken_finds_pasta_not_smoothie() {
    let results = book().search("chicken").await;
    let titles = titles(&results);
    assert!(titles.contains(&"Creamy Garlic Parmesan Pasta with Grilled Chicken"));
    assert!(!titles.contains(&"Berry Smoothie Bowl with Granola"));
  }

  #[tokio::test]
  async fn search_results_only_contain_matching_labels() {
    let results = book().search("an").await;
    assert!(!results.is_empty());
    for r in &results {
      assert!(r.matched_ingredients.iter().any(|l| l.to_lowercase().contains("an")), "{} should not match", r.title);
    }
  }

  #[tokio::test]
  async fn search_is_case_insensitive() {
    let results = book().search("SALMON").await;
    assert_eq!(titles(&results), vec!["Roasted Salmon with Lemon and Dill"]);
  }

  #[tokio::test]
  async fn search_keeps_storage_order_across_terms() {
    let results = book().search("salmon, eggs, tofu").await;
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "6"]);
  }

  #[tokio::test]
  async fn search_empty_terms_match_nothing() {
    let book = book();
    assert!(book.search("").await.is_empty());
    assert!(book.search(",").await.is_empty());
    assert!(book.search("   ").await.is_empty());
  }

  #[tokio::test]
  async fn search_trailing_comma_behaves_like_single_term() {
    let book = book();
    assert_eq!(book.search("chicken,").await, book.search("chicken").await);
  }

  #[tokio::test]
  async fn search_only_checks_matched_ingredients() {
    // "granola" is a missing ingredient of the smoothie bowl, not a matched one.
    assert!(book().search("granola").await.is_empty());
  }

  #[tokio::test]
  async fn search_no_results_is_empty_list() {
    assert!(book().search("durian").await.is_empty());
  }

  // --- get_by_id ---

  #[tokio::test]
  async fn get_by_id_unknown_returns_defaults() {
    let detail = book().get_by_id("999").await;
    assert!(detail.recipe.is_none());
    assert!(detail.ingredients.is_empty());
    assert_eq!(detail.nutrition, Nutrition { calories: 0.0, protein: 0.0, fat: 0.0, carbs: 0.0 });
  }

  #[tokio::test]
  async fn get_by_id_known_recipe() {
    let detail = book().get_by_id("1").await;
    let recipe = detail.recipe.expect("recipe 1 exists");
    assert_eq!(recipe.ready_in_minutes, 30);
    assert_eq!(detail.ingredients.len(), 9);
    assert_eq!(detail.nutrition.calories, 520.0);
  }

  #[tokio::test]
  async fn get_by_id_without_ingredient_table() {
    let detail = book().get_by_id("4").await;
    assert!(detail.recipe.is_some());
    assert!(detail.ingredients.is_empty());
    assert_eq!(detail.nutrition.carbs, 22.0);
  }

  #[tokio::test(start_paused = true)]
  async fn search_waits_for_simulated_latency() {
    let book = RecipeBook::sample().with_latency(Duration::from_millis(1000));
    let started = tokio::time::Instant::now();
    let results = book.search("pasta").await;
    assert_eq!(results.len(), 1);
    assert!(started.elapsed() >= Duration::from_millis(1000));
  }
}
