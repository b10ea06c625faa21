use serde::Deserialize;

use super::WindowError;

/// Initial state of a native window and its graphics context.
///
/// Fixed once passed to `Window::create`; runtime changes go through the
/// window's own setters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub fullscreen: bool,
    pub vsync: bool,
    /// MSAA sample count; 1 disables multisampling.
    pub samples: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Volante".to_string(),
            fullscreen: false,
            vsync: true,
            samples: 1,
        }
    }
}

impl WindowConfig {
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        if self.width == 0 || self.height == 0 {
            return Err(WindowError::InvalidConfig(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples == 0 {
            return Err(WindowError::InvalidConfig("sample count must be at least 1".into()));
        }
        if self.title.trim().is_empty() {
            return Err(WindowError::InvalidConfig("window title must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(WindowConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_extent() {
        let cfg = WindowConfig::new(0, 600, "x");
        assert!(matches!(cfg.validate(), Err(WindowError::InvalidConfig(_))));
        let cfg = WindowConfig::new(800, 0, "x");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_samples_and_blank_title() {
        let cfg = WindowConfig { samples: 0, ..WindowConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = WindowConfig::new(10, 10, "   ");
        assert!(cfg.validate().is_err());
    }
}
