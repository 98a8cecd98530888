use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use usvg::fontdb;

use crate::{
    config::model::{FontFamily, PresetFont},
    foundation::error::{CoverError, CoverResult},
};

/// Font bytes ready for shaping and rasterization, addressed by the name the card refers to.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisteredFont {
    /// Name used in [`FontFamily`] (a custom name or a preset identifier).
    pub name: String,
    /// Family name found inside the font data.
    pub family: String,
    pub data: Arc<Vec<u8>>,
    /// Face index inside a font collection.
    pub index: u32,
}

impl fmt::Debug for RegisteredFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFont")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Session-scoped font table plus the system font database used for presets.
pub struct FontRegistry {
    system: fontdb::Database,
    custom: Mutex<HashMap<String, RegisteredFont>>,
    presets: Mutex<HashMap<PresetFont, RegisteredFont>>,
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRegistry")
            .field("system_faces", &self.system.len())
            .field("custom", &self.custom_names())
            .finish()
    }
}

impl FontRegistry {
    /// Create a registry, optionally scanning the platform font directories.
    #[tracing::instrument]
    pub fn new(load_system_fonts: bool) -> Self {
        let mut system = fontdb::Database::new();
        if load_system_fonts {
            system.load_system_fonts();
        }
        tracing::debug!(faces = system.len(), "font database ready");
        Self {
            system,
            custom: Mutex::new(HashMap::new()),
            presets: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_system_fonts(&self) -> bool {
        !self.system.is_empty()
    }

    pub fn custom_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.custom.lock() {
            Ok(c) => c.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.custom
            .lock()
            .map(|c| c.contains_key(name))
            .unwrap_or(false)
    }

    /// Validate `bytes` off the executor and add them to the table under `name`.
    ///
    /// Registering the same name twice is a no-op for identical bytes and an error otherwise.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn register(&self, name: String, bytes: Vec<u8>) -> CoverResult<RegisteredFont> {
        if name.trim().is_empty() {
            return Err(CoverError::font_load("font name must be non-empty"));
        }
        if PresetFont::from_css_name(&name).is_some() {
            return Err(CoverError::font_load(format!(
                "\"{name}\" is reserved for a preset family"
            )));
        }
        if let Some(existing) = self.lookup_same(&name, &bytes)? {
            return Ok(existing);
        }

        let data = Arc::new(bytes);
        let candidate = data.clone();
        let (family, index) =
            tokio::task::spawn_blocking(move || inspect_font_bytes(&candidate)).await??;

        let font = RegisteredFont {
            name: name.clone(),
            family,
            data,
            index,
        };

        let mut custom = self.lock_custom()?;
        if let Some(existing) = custom.get(&name) {
            return if existing.data == font.data {
                Ok(existing.clone())
            } else {
                Err(name_taken(&name))
            };
        }
        custom.insert(name, font.clone());
        tracing::info!(name = %font.name, family = %font.family, "registered custom font");
        Ok(font)
    }

    /// Font bytes for `family`.
    ///
    /// A custom name that was never registered, or a preset with no usable system face, is
    /// reported as a rasterization failure.
    pub fn resolve(&self, family: &FontFamily) -> CoverResult<RegisteredFont> {
        match family {
            FontFamily::Custom(name) => self.lock_custom()?.get(name).cloned().ok_or_else(|| {
                CoverError::rasterization(format!(
                    "unresolvable external resource: font \"{name}\" is not registered"
                ))
            }),
            FontFamily::Preset(preset) => self.resolve_preset(*preset),
        }
    }

    fn resolve_preset(&self, preset: PresetFont) -> CoverResult<RegisteredFont> {
        if let Some(hit) = self.lock_presets()?.get(&preset) {
            return Ok(hit.clone());
        }

        let primary = match preset {
            PresetFont::SansSerif => fontdb::Family::SansSerif,
            PresetFont::Monospace => fontdb::Family::Monospace,
            PresetFont::Serif => fontdb::Family::Serif,
            PresetFont::Impact => fontdb::Family::Name("Impact"),
            PresetFont::ArialBlack => fontdb::Family::Name("Arial Black"),
        };
        let families = [primary, fontdb::Family::SansSerif];
        let query = fontdb::Query {
            families: &families,
            ..fontdb::Query::default()
        };

        let id = self
            .system
            .query(&query)
            .or_else(|| self.system.faces().next().map(|f| f.id))
            .ok_or_else(|| {
                CoverError::rasterization(format!(
                    "unresolvable external resource: no system font for \"{}\"",
                    preset.css_name()
                ))
            })?;

        let family = self
            .system
            .face(id)
            .and_then(|f| f.families.first().map(|(n, _)| n.clone()))
            .unwrap_or_else(|| preset.css_name().to_owned());
        let (data, index) = self
            .system
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| {
                CoverError::rasterization(format!(
                    "unresolvable external resource: cannot read font data for \"{}\"",
                    preset.css_name()
                ))
            })?;

        let font = RegisteredFont {
            name: preset.css_name().to_owned(),
            family,
            data: Arc::new(data),
            index,
        };
        tracing::debug!(preset = preset.css_name(), family = %font.family, "resolved preset font");
        self.lock_presets()?.insert(preset, font.clone());
        Ok(font)
    }

    fn lookup_same(&self, name: &str, bytes: &[u8]) -> CoverResult<Option<RegisteredFont>> {
        match self.lock_custom()?.get(name) {
            Some(existing) if existing.data.as_slice() == bytes => Ok(Some(existing.clone())),
            Some(_) => Err(name_taken(name)),
            None => Ok(None),
        }
    }

    fn lock_custom(&self) -> CoverResult<MutexGuard<'_, HashMap<String, RegisteredFont>>> {
        self.custom
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("font table lock poisoned")))
    }

    fn lock_presets(&self) -> CoverResult<MutexGuard<'_, HashMap<PresetFont, RegisteredFont>>> {
        self.presets
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("preset font cache lock poisoned")))
    }
}

/// Parse font bytes and return the first face's family name and index.
pub fn inspect_font_bytes(bytes: &[u8]) -> CoverResult<(String, u32)> {
    if bytes.is_empty() {
        return Err(CoverError::font_load("font data is empty"));
    }
    let mut db = fontdb::Database::new();
    db.load_font_data(bytes.to_vec());
    let face = db
        .faces()
        .next()
        .ok_or_else(|| CoverError::font_load("font data contains no usable faces"))?;
    let family = face
        .families
        .first()
        .map(|(n, _)| n.clone())
        .ok_or_else(|| CoverError::font_load("font face has no family name"))?;
    Ok((family, face.index))
}

fn name_taken(name: &str) -> CoverError {
    CoverError::font_load(format!(
        "font name \"{name}\" is already registered with different data"
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/fonts/registry.rs"]
mod tests;
