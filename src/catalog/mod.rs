//! Fixed catalog of ambient sounds and their resource locators

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

#[cfg(test)]
mod tests;

/// Built-in sounds as `(id, label, relative path)`, in display order.
pub const DEFAULT_SOUNDS: &[(&str, &str, &str)] = &[
    ("rain_in_the_forest", "Rain in the forest", "sounds/rain_in_the_forest.mp3"),
    ("the_sound_of_rain", "The sound of rain", "sounds/the_sound_of_rain.mp3"),
    ("glucophone", "Glucophone (sleep melody)", "sounds/Glucophone_(sleep_melody)_01.mp3"),
    ("the_fire_in_the_oven", "The fire in the oven", "sounds/the_fire_in_the_oven.mp3"),
    ("fire_in_the_street", "Fire in the street", "sounds/fire_in_the_street.mp3"),
    ("the_noise_of_the_forest", "The noise of the forest", "sounds/the_noise_of_the_forest.mp3"),
    ("wave_noise", "Wave noise", "sounds/wave_noise.mp3"),
    ("the_sound_of_the_sea", "The sound of the sea", "sounds/the_sound_of_the_sea.mp3"),
    ("the_sound_of_the_spring", "The sound of the spring", "sounds/the_sound_of_the_spring.mp3"),
    ("crickets", "Crickets", "sounds/crickets.mp3"),
    ("cicadas", "Cicadas", "sounds/cicadas.mp3"),
    ("in_the_cafe", "In the cafe", "sounds/in_the_cafe.mp3"),
];

/// Errors raised while building or querying the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownSound(String),
    InvalidBase(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownSound(id) => write!(f, "Unknown sound: {}", id),
            CatalogError::InvalidBase(s) => write!(f, "Invalid sounds base: {}", s),
        }
    }
}

impl Error for CatalogError {}

/// Where a sound's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    File(PathBuf),
    Http(Url),
}

impl Locator {
    /// Resolves `relative` against a base that is either an http(s) URL or a directory.
    pub fn resolve(base: &str, relative: &str) -> Result<Self, CatalogError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            let mut base_url = base.to_string();
            if !base_url.ends_with('/') {
                base_url.push('/');
            }
            let base_url = Url::parse(&base_url)
                .map_err(|e| CatalogError::InvalidBase(format!("{}: {}", base, e)))?;
            let url = base_url
                .join(relative)
                .map_err(|e| CatalogError::InvalidBase(format!("{} + {}: {}", base, relative, e)))?;
            Ok(Locator::Http(url))
        } else if base.is_empty() {
            Err(CatalogError::InvalidBase("empty base".to_string()))
        } else {
            Ok(Locator::File(Path::new(base).join(relative)))
        }
    }

    /// File extension of the resource, used as a format hint for probing.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            Locator::File(p) => p.to_string_lossy().into_owned(),
            Locator::Http(u) => u.path().to_string(),
        };
        Path::new(&path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(p) => write!(f, "{}", p.display()),
            Locator::Http(u) => write!(f, "{}", u),
        }
    }
}

/// A catalog entry with its locator already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundResource {
    pub id: String,
    pub label: String,
    pub locator: Locator,
}

/// Immutable set of selectable sounds, built once at startup.
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    sounds: Vec<SoundResource>,
}

impl SoundCatalog {
    /// Builds the built-in catalog against `base`.
    pub fn with_base(base: &str) -> Result<Self, CatalogError> {
        Self::from_entries(DEFAULT_SOUNDS, base)
    }

    pub fn from_entries(entries: &[(&str, &str, &str)], base: &str) -> Result<Self, CatalogError> {
        let sounds = entries
            .iter()
            .map(|(id, label, path)| {
                Ok(SoundResource {
                    id: id.to_string(),
                    label: label.to_string(),
                    locator: Locator::resolve(base, path)?,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self { sounds })
    }

    pub fn resolve(&self, id: &str) -> Result<&SoundResource, CatalogError> {
        self.sounds
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CatalogError::UnknownSound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sounds.iter().any(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundResource> {
        self.sounds.iter()
    }

    pub fn first(&self) -> Option<&SoundResource> {
        self.sounds.first()
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Next sound in display order, wrapping. `None` selects the first entry.
    pub fn next_after(&self, id: Option<&str>) -> Option<&SoundResource> {
        let idx = id.and_then(|id| self.sounds.iter().position(|s| s.id == id));
        match idx {
            Some(i) => self.sounds.get((i + 1) % self.sounds.len()),
            None => self.sounds.first(),
        }
    }

    /// Previous sound in display order, wrapping. `None` selects the last entry.
    pub fn previous_before(&self, id: Option<&str>) -> Option<&SoundResource> {
        let idx = id.and_then(|id| self.sounds.iter().position(|s| s.id == id));
        match idx {
            Some(0) => self.sounds.last(),
            Some(i) => self.sounds.get(i - 1),
            None => self.sounds.last(),
        }
    }
}
