use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
}

/// How frame images are drawn into terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// Grayscale character ramp; works everywhere.
  Ascii,
  /// True-colour upper half-blocks, two pixels per cell.
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
    }
  }
}

/// Half-blocks need 24-bit colour, advertised through `COLORTERM`.
pub fn detect_display_mode(colorterm: Option<&str>) -> DisplayMode {
  match colorterm.map(str::to_lowercase).as_deref() {
    Some("truecolor" | "24bit") => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(std::env::var("COLORTERM").ok().as_deref()),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detect_truecolor() {
    assert_eq!(detect_display_mode(Some("truecolor")), DisplayMode::Direct);
    assert_eq!(detect_display_mode(Some("24BIT")), DisplayMode::Direct);
  }

  #[test]
  fn detect_fallback_ascii() {
    assert_eq!(detect_display_mode(None), DisplayMode::Ascii);
    assert_eq!(detect_display_mode(Some("256color")), DisplayMode::Ascii);
  }

  #[test]
  fn explicit_modes_skip_detection() {
    assert_eq!(resolve_display_mode(CliDisplayMode::Ascii), DisplayMode::Ascii);
    assert_eq!(resolve_display_mode(CliDisplayMode::Direct), DisplayMode::Direct);
  }
}
