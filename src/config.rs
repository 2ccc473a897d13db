use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::constants;

pub const ENV_EDAMAM_APP_ID: &str = "PANTRY_EDAMAM_APP_ID";
pub const ENV_EDAMAM_APP_KEY: &str = "PANTRY_EDAMAM_APP_KEY";
pub const ENV_STUDIO_TOKEN: &str = "PANTRY_STUDIO_TOKEN";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub edamam_app_id: Option<String>,
  pub edamam_app_key: Option<String>,
  pub studio_api_token: Option<String>,
}

/// Resolved third-party credentials. The defaults are placeholders, never real secrets.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
  pub edamam_app_id: String,
  pub edamam_app_key: String,
  pub studio_api_token: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "pantry") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "pantry") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Let environment variables override credentials from the file.
  /// `lookup` is `std::env::var(..).ok()` in production.
  pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(v) = non_empty(ENV_EDAMAM_APP_ID) {
      self.edamam_app_id = Some(v);
    }
    if let Some(v) = non_empty(ENV_EDAMAM_APP_KEY) {
      self.edamam_app_key = Some(v);
    }
    if let Some(v) = non_empty(ENV_STUDIO_TOKEN) {
      self.studio_api_token = Some(v);
    }
    self
  }

  pub fn credentials(&self) -> Credentials {
    let c = constants();
    Credentials {
      edamam_app_id: self.edamam_app_id.clone().unwrap_or_else(|| c.edamam_app_id.clone()),
      edamam_app_key: self.edamam_app_key.clone().unwrap_or_else(|| c.edamam_app_key.clone()),
      studio_api_token: self.studio_api_token.clone(),
    }
  }
}
