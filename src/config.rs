use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_FONT_SIZE: u32 = 11;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Sample document shown when a session starts without content.
pub const DEFAULT_PLACEHOLDER: &str = r#"
<h1>Sample Document</h1>
<hr>
<h2>Heading</h2>
<p><strong>Bold</strong> text</p>
<p><em>Italic</em> text</p>
<p><u>Underlined</u> text</p>
<p><strike>Strikethrough</strike> text</p>
<p>X<sub>2</sub> and X<sup>2</sup></p>
<ul>
  <li>Bulleted item</li>
  <li>Another item</li>
</ul>
<p>Text in red <span style="color: #ea384c;">red</span> <span style="background-color: #ff9800;">highlighted</span> text</p>
"#;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period before a burst of edits becomes one undo step.
    pub debounce_ms: u64,
    /// Maximum number of undo snapshots kept, including the initial state.
    pub history_limit: usize,
    pub default_font_size: u32,
    pub default_font_family: String,
    pub placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_font_size: DEFAULT_FONT_SIZE,
            default_font_family: DEFAULT_FONT_FAMILY.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to serialize editor config")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_limit must keep at least one snapshot".to_string(),
            ));
        }
        if self.default_font_family.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_font_family must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
