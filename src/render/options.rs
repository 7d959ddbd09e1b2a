//! Print options for PDF downloads

use serde::Deserialize;

use super::RenderError;

/// Paper size used when neither the client nor the source document names one
pub const DEFAULT_PAPER_SIZE: &str = "A4";

/// Client-supplied download options. Every field has a default so partial
/// option objects merge over the server defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub layout: Layout,
    /// Named size ("A4", "Letter", ...) or "custom"; `None` falls back to
    /// the source document's detected size, then [`DEFAULT_PAPER_SIZE`]
    pub paper_size: Option<String>,
    pub scale: f64,
    pub margin: MarginPreset,
    /// Millimeters, used with [`MarginPreset::Custom`]
    pub custom_margins: Margins,
    /// Accepted from clients, irrelevant for PDF generation
    pub duplex: bool,
    /// Inches, required when `paper_size` is "custom"
    pub custom_width: Option<f64>,
    pub custom_height: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Portrait,
            paper_size: None,
            scale: 1.0,
            margin: MarginPreset::Default,
            custom_margins: Margins::default(),
            duplex: false,
            custom_width: None,
            custom_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginPreset {
    Default,
    None,
    Minimal,
    Custom,
}

/// Custom margins in millimeters
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 10.0,
            bottom: 10.0,
            left: 10.0,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(0.1..=2.0).contains(&self.scale) {
            return Err(RenderError::InvalidScale(self.scale));
        }
        if self.paper_size.as_deref() == Some("custom")
            && (self.custom_width.is_none() || self.custom_height.is_none())
        {
            return Err(RenderError::MissingCustomSize);
        }
        Ok(())
    }

    /// Style preamble expressing the requested page geometry for the
    /// browser's print pipeline.
    pub fn page_style(&self) -> String {
        let size = match self.paper_size.as_deref() {
            Some("custom") => format!(
                "{}in {}in",
                self.custom_width.unwrap_or(0.0),
                self.custom_height.unwrap_or(0.0)
            ),
            Some(named) => format!("{} {}", named, self.orientation()),
            None => format!("{} {}", DEFAULT_PAPER_SIZE, self.orientation()),
        };

        // Custom margins arrive in mm and print styles use cm.
        let margin = match self.margin {
            MarginPreset::None => "margin: 0cm;".to_string(),
            MarginPreset::Minimal => "margin: 0.5cm;".to_string(),
            MarginPreset::Custom => format!(
                "margin: {}cm {}cm {}cm {}cm;",
                self.custom_margins.top / 10.0,
                self.custom_margins.right / 10.0,
                self.custom_margins.bottom / 10.0,
                self.custom_margins.left / 10.0
            ),
            MarginPreset::Default => "margin: 1cm;".to_string(),
        };

        format!(
            "<style>@page {{ size: {size}; {margin} }} body {{ zoom: {}; }}</style>",
            self.scale
        )
    }

    fn orientation(&self) -> &'static str {
        match self.layout {
            Layout::Portrait => "portrait",
            Layout::Landscape => "landscape",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert!(options.validate().is_ok());

        let style = options.page_style();
        assert!(style.contains("size: A4 portrait;"));
        assert!(style.contains("margin: 1cm;"));
        assert!(style.contains("zoom: 1;"));
    }

    #[test]
    fn test_rejects_out_of_range_scale() {
        for scale in [0.05, 2.5, -1.0] {
            let options = RenderOptions {
                scale,
                ..Default::default()
            };
            assert!(matches!(
                options.validate(),
                Err(RenderError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_custom_size_requires_dimensions() {
        let options = RenderOptions {
            paper_size: Some("custom".to_string()),
            custom_width: Some(8.5),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(RenderError::MissingCustomSize)
        ));
    }

    #[test]
    fn test_custom_size_style() {
        let options = RenderOptions {
            paper_size: Some("custom".to_string()),
            custom_width: Some(8.5),
            custom_height: Some(11.0),
            ..Default::default()
        };
        assert!(options.validate().is_ok());
        assert!(options.page_style().contains("size: 8.5in 11in;"));
    }

    #[test]
    fn test_custom_margins_convert_mm_to_cm() {
        let options = RenderOptions {
            margin: MarginPreset::Custom,
            custom_margins: Margins {
                top: 5.0,
                right: 10.0,
                bottom: 15.0,
                left: 20.0,
            },
            ..Default::default()
        };
        assert!(options
            .page_style()
            .contains("margin: 0.5cm 1cm 1.5cm 2cm;"));
    }

    #[test]
    fn test_partial_options_deserialize_over_defaults() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"layout":"landscape","scale":1.5}"#).unwrap();

        assert_eq!(options.layout, Layout::Landscape);
        assert_eq!(options.scale, 1.5);
        assert_eq!(options.margin, MarginPreset::Default);
        assert!(options.paper_size.is_none());
        assert!(options.page_style().contains("size: A4 landscape;"));
    }
}
