use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  /// Ingredients the user has.
  pub available: Color,
  /// Ingredients the user still needs.
  pub missing: Color,
  pub star: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Basil",
    bg: Color::Rgb(24, 28, 24),
    fg: Color::Rgb(224, 230, 218),
    accent: Color::Rgb(132, 196, 120),
    muted: Color::Rgb(128, 140, 124),
    border: Color::Rgb(64, 78, 62),
    stripe_bg: Color::Rgb(30, 35, 30),
    status: Color::Rgb(230, 200, 110),
    error: Color::Rgb(232, 110, 100),
    key_fg: Color::Rgb(24, 28, 24),
    key_bg: Color::Rgb(128, 140, 124),
    available: Color::Rgb(120, 200, 130),
    missing: Color::Rgb(236, 120, 110),
    star: Color::Rgb(240, 180, 60),
  },
  Theme {
    name: "Paprika",
    bg: Color::Rgb(34, 22, 20),
    fg: Color::Rgb(240, 224, 214),
    accent: Color::Rgb(232, 108, 72),
    muted: Color::Rgb(150, 126, 116),
    border: Color::Rgb(86, 56, 48),
    stripe_bg: Color::Rgb(42, 28, 25),
    status: Color::Rgb(242, 196, 96),
    error: Color::Rgb(255, 92, 92),
    key_fg: Color::Rgb(34, 22, 20),
    key_bg: Color::Rgb(150, 126, 116),
    available: Color::Rgb(150, 204, 120),
    missing: Color::Rgb(244, 132, 100),
    star: Color::Rgb(245, 190, 70),
  },
  Theme {
    name: "Butter",
    bg: Color::Rgb(250, 246, 232),
    fg: Color::Rgb(60, 52, 40),
    accent: Color::Rgb(196, 140, 30),
    muted: Color::Rgb(140, 128, 104),
    border: Color::Rgb(214, 200, 164),
    stripe_bg: Color::Rgb(243, 237, 216),
    status: Color::Rgb(160, 110, 20),
    error: Color::Rgb(196, 60, 48),
    key_fg: Color::Rgb(250, 246, 232),
    key_bg: Color::Rgb(140, 128, 104),
    available: Color::Rgb(60, 150, 70),
    missing: Color::Rgb(200, 80, 60),
    star: Color::Rgb(214, 150, 20),
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
