//! Render configuration.

use lucent_core::{keys, Properties, Property, ResourceResolver};

use crate::Result;

/// Default film width when the configuration does not set one.
pub const DEFAULT_FILM_WIDTH: u32 = 64;
/// Default film height when the configuration does not set one.
pub const DEFAULT_FILM_HEIGHT: u32 = 48;

/// Properties plus the search paths used to resolve the files they name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    properties: Properties,
    resolver: ResourceResolver,
}

impl RenderConfig {
    /// Create a configuration.
    pub fn new(properties: Properties, resolver: ResourceResolver) -> Self {
        Self {
            properties,
            resolver,
        }
    }

    /// All configuration properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Resource search paths for this configuration.
    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    /// Look up a single property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// The configured engine type, if any.
    pub fn engine_type(&self) -> Option<&str> {
        self.property(keys::RENDER_ENGINE_TYPE)
            .and_then(|p| p.value(0))
    }

    /// The configured sampler type, if any.
    pub fn sampler_type(&self) -> Option<&str> {
        self.property(keys::SAMPLER_TYPE)
            .and_then(|p| p.value(0))
            .filter(|s| !s.is_empty())
    }

    /// Film dimensions in pixels.
    pub fn film_size(&self) -> Result<(u32, u32)> {
        let width = self
            .properties
            .get_u32(keys::FILM_WIDTH, DEFAULT_FILM_WIDTH)?;
        let height = self
            .properties
            .get_u32(keys::FILM_HEIGHT, DEFAULT_FILM_HEIGHT)?;
        Ok((width, height))
    }
}
