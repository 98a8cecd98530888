use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use crate::{
    assets::images::ImageRef,
    effects::filter::FilterParams,
    foundation::{
        core::{LayoutAlignX, LayoutAlignY, Rgba8},
        error::{CoverError, CoverResult},
    },
};

/// What fills the card behind the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BackgroundMode {
    #[default]
    #[serde(rename = "color")]
    SolidColor,
    #[serde(rename = "image")]
    Image,
}

/// Placement of the content stack on the card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    #[default]
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Alignment {
    pub const ALL: [Alignment; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::Center,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::CenterLeft => "center-left",
            Self::Center => "center",
            Self::CenterRight => "center-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Column and row of this position.
    pub fn axes(self) -> (LayoutAlignX, LayoutAlignY) {
        let x = match self {
            Self::TopLeft | Self::CenterLeft | Self::BottomLeft => LayoutAlignX::Start,
            Self::TopCenter | Self::Center | Self::BottomCenter => LayoutAlignX::Center,
            Self::TopRight | Self::CenterRight | Self::BottomRight => LayoutAlignX::End,
        };
        let y = match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => LayoutAlignY::Start,
            Self::CenterLeft | Self::Center | Self::CenterRight => LayoutAlignY::Center,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => LayoutAlignY::End,
        };
        (x, y)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoverError::validation(format!("unknown alignment \"{s}\"")))
    }
}

/// Font families available without an upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresetFont {
    SansSerif,
    Monospace,
    Serif,
    Impact,
    ArialBlack,
}

impl PresetFont {
    pub const ALL: [PresetFont; 5] = [
        Self::SansSerif,
        Self::Monospace,
        Self::Serif,
        Self::Impact,
        Self::ArialBlack,
    ];

    /// CSS-style family identifier.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
            Self::Serif => "serif",
            Self::Impact => "Impact",
            Self::ArialBlack => "Arial Black",
        }
    }

    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.css_name() == name)
    }
}

/// Active typeface: a preset or the name of a registered custom font.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontFamily {
    Preset(PresetFont),
    Custom(String),
}

impl Default for FontFamily {
    fn default() -> Self {
        Self::Preset(PresetFont::SansSerif)
    }
}

impl FontFamily {
    pub fn name(&self) -> &str {
        match self {
            Self::Preset(p) => p.css_name(),
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for FontFamily {
    fn from(name: String) -> Self {
        match PresetFont::from_css_name(&name) {
            Some(p) => Self::Preset(p),
            None => Self::Custom(name),
        }
    }
}

impl From<&str> for FontFamily {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<FontFamily> for String {
    fn from(family: FontFamily) -> Self {
        family.name().to_owned()
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The authoritative description of one cover card.
///
/// Every dimension is expressed on the fixed 1280x720 virtual canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub title: String,
    pub subtitle: String,
    pub background_mode: BackgroundMode,
    pub background_color: Rgba8,
    /// Handles only make sense inside the session that issued them.
    #[serde(skip_deserializing)]
    pub background_image: Option<ImageRef>,
    pub accent_color: Rgba8,
    pub text_color: Rgba8,
    pub font_family: FontFamily,
    pub alignment: Alignment,
    pub blur_amount: f32,
    pub brightness_percent: f32,
    pub font_size_px: f32,
    pub show_decorations: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            title: "REFAC7.LOGS".to_owned(),
            subtitle: "ARCHITECT OF THE DIGITAL VOID".to_owned(),
            background_mode: BackgroundMode::SolidColor,
            background_color: Rgba8::rgb(0x0e, 0x0e, 0x0e),
            background_image: None,
            accent_color: Rgba8::rgb(0xef, 0x44, 0x44),
            text_color: Rgba8::WHITE,
            font_family: FontFamily::default(),
            alignment: Alignment::BottomLeft,
            blur_amount: 0.0,
            brightness_percent: 100.0,
            font_size_px: 100.0,
            show_decorations: true,
        }
    }
}

impl Configuration {
    /// Parse a configuration from a JSON reader; missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> CoverResult<Self> {
        let cfg: Configuration = serde_json::from_reader(r)
            .map_err(|e| CoverError::validation(format!("parse cover configuration JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> CoverResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CoverResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CoverError::validation(format!("open configuration JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> CoverResult<()> {
        non_negative("blurAmount", self.blur_amount)?;
        non_negative("brightnessPercent", self.brightness_percent)?;
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(CoverError::validation("fontSizePx must be finite and > 0"));
        }
        Ok(())
    }

    pub fn filter(&self) -> FilterParams {
        FilterParams::new(self.blur_amount, self.brightness_percent)
    }

    /// The background image that is actually drawn, if any.
    pub fn active_background_image(&self) -> Option<ImageRef> {
        match self.background_mode {
            BackgroundMode::Image => self.background_image,
            BackgroundMode::SolidColor => None,
        }
    }

    /// Whether an export must bake the live filter into a new bitmap first.
    pub fn needs_baking(&self) -> bool {
        self.active_background_image().is_some() && self.filter().needs_baking()
    }

    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            background_image: self.background_image,
            blur_amount: self.blur_amount,
            brightness_percent: self.brightness_percent,
        }
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: ExportSnapshot) -> bool {
        let before = self.export_snapshot();
        self.background_image = snapshot.background_image;
        self.blur_amount = snapshot.blur_amount;
        self.brightness_percent = snapshot.brightness_percent;
        before != snapshot
    }
}

fn non_negative(field: &str, v: f32) -> CoverResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(CoverError::validation(format!(
            "{field} must be finite and >= 0, got {v}"
        )));
    }
    Ok(())
}

/// The export-sensitive fields, captured before an export mutates them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportSnapshot {
    pub background_image: Option<ImageRef>,
    pub blur_amount: f32,
    pub brightness_percent: f32,
}

/// A single-field edit, the only way collaborators mutate a [`Configuration`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Subtitle(String),
    BackgroundMode(BackgroundMode),
    BackgroundColor(Rgba8),
    BackgroundImage(Option<ImageRef>),
    AccentColor(Rgba8),
    TextColor(Rgba8),
    FontFamily(FontFamily),
    Alignment(Alignment),
    BlurAmount(f32),
    BrightnessPercent(f32),
    FontSizePx(f32),
    ShowDecorations(bool),
}

impl FieldUpdate {
    /// Serialized key of the field this update targets.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Subtitle(_) => "subtitle",
            Self::BackgroundMode(_) => "backgroundMode",
            Self::BackgroundColor(_) => "backgroundColor",
            Self::BackgroundImage(_) => "backgroundImage",
            Self::AccentColor(_) => "accentColor",
            Self::TextColor(_) => "textColor",
            Self::FontFamily(_) => "fontFamily",
            Self::Alignment(_) => "alignment",
            Self::BlurAmount(_) => "blurAmount",
            Self::BrightnessPercent(_) => "brightnessPercent",
            Self::FontSizePx(_) => "fontSizePx",
            Self::ShowDecorations(_) => "showDecorations",
        }
    }

    /// Build an update from a serialized key and a JSON value.
    ///
    /// `backgroundImage` is not accepted here; images enter through the upload API.
    pub fn from_key_value(key: &str, value: serde_json::Value) -> CoverResult<Self> {
        fn parse<T: serde::de::DeserializeOwned>(
            key: &str,
            value: serde_json::Value,
        ) -> CoverResult<T> {
            serde_json::from_value(value)
                .map_err(|e| CoverError::validation(format!("invalid value for {key}: {e}")))
        }

        Ok(match key {
            "title" => Self::Title(parse(key, value)?),
            "subtitle" => Self::Subtitle(parse(key, value)?),
            "backgroundMode" => Self::BackgroundMode(parse(key, value)?),
            "backgroundColor" => Self::BackgroundColor(parse(key, value)?),
            "accentColor" => Self::AccentColor(parse(key, value)?),
            "textColor" => Self::TextColor(parse(key, value)?),
            "fontFamily" => Self::FontFamily(parse(key, value)?),
            "alignment" => Self::Alignment(parse(key, value)?),
            "blurAmount" => Self::BlurAmount(parse(key, value)?),
            "brightnessPercent" => Self::BrightnessPercent(parse(key, value)?),
            "fontSizePx" => Self::FontSizePx(parse(key, value)?),
            "showDecorations" => Self::ShowDecorations(parse(key, value)?),
            other => {
                return Err(CoverError::validation(format!(
                    "unknown configuration field \"{other}\""
                )));
            }
        })
    }

    /// Apply to `cfg`. Returns whether the value changed; invalid values leave `cfg` untouched.
    pub fn apply(self, cfg: &mut Configuration) -> CoverResult<bool> {
        fn set<T: PartialEq>(slot: &mut T, v: T) -> bool {
            if *slot == v {
                return false;
            }
            *slot = v;
            true
        }

        Ok(match self {
            Self::Title(v) => set(&mut cfg.title, v),
            Self::Subtitle(v) => set(&mut cfg.subtitle, v),
            Self::BackgroundMode(v) => set(&mut cfg.background_mode, v),
            Self::BackgroundColor(v) => set(&mut cfg.background_color, v),
            Self::BackgroundImage(v) => set(&mut cfg.background_image, v),
            Self::AccentColor(v) => set(&mut cfg.accent_color, v),
            Self::TextColor(v) => set(&mut cfg.text_color, v),
            Self::FontFamily(v) => set(&mut cfg.font_family, v),
            Self::Alignment(v) => set(&mut cfg.alignment, v),
            Self::BlurAmount(v) => {
                non_negative("blurAmount", v)?;
                set(&mut cfg.blur_amount, v)
            }
            Self::BrightnessPercent(v) => {
                non_negative("brightnessPercent", v)?;
                set(&mut cfg.brightness_percent, v)
            }
            Self::FontSizePx(v) => {
                if !v.is_finite() || v <= 0.0 {
                    return Err(CoverError::validation(format!(
                        "fontSizePx must be finite and > 0, got {v}"
                    )));
                }
                set(&mut cfg.font_size_px, v)
            }
            Self::ShowDecorations(v) => set(&mut cfg.show_decorations, v),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
