//! Per-case engine selection.

use lucent_core::{keys, Properties, Property};

/// Engine type, sampler type and extra properties for one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestParams {
    pub engine_type: String,
    /// Empty means "use the configuration file's sampler".
    pub sampler_type: String,
    pub additional: Properties,
}

impl TestParams {
    pub fn new(engine_type: impl Into<String>, sampler_type: impl Into<String>) -> Self {
        Self {
            engine_type: engine_type.into(),
            sampler_type: sampler_type.into(),
            additional: Properties::new(),
        }
    }

    /// Add an extra configuration property.
    #[must_use]
    pub fn with(mut self, property: Property) -> Self {
        self.additional.set(property);
        self
    }

    /// Output and baseline name for `test_name` under these parameters.
    pub fn output_name(&self, test_name: &str) -> String {
        if self.sampler_type.is_empty() {
            format!("{test_name}_{}", self.engine_type)
        } else {
            format!("{test_name}_{}_{}", self.engine_type, self.sampler_type)
        }
    }

    /// The additional properties followed by the engine and sampler selection.
    ///
    /// An empty sampler type is left out.
    pub fn overrides(&self) -> Properties {
        let mut props = self.additional.clone();
        props.set(Property::with_value(
            keys::RENDER_ENGINE_TYPE,
            &self.engine_type,
        ));
        if !self.sampler_type.is_empty() {
            props.set(Property::with_value(keys::SAMPLER_TYPE, &self.sampler_type));
        }
        props
    }
}

/// Reject a layer that tries to pick the engine or sampler itself.
///
/// Output names are derived from [`TestParams`], so any other source of
/// `renderengine.type` or `sampler.type` would check the render against
/// another combination's baseline.
pub fn reject_selection_keys(props: &Properties) -> lucent_core::Result<()> {
    for key in [keys::RENDER_ENGINE_TYPE, keys::SAMPLER_TYPE] {
        if let Some(property) = props.get(key) {
            return Err(lucent_core::Error::InvalidValue {
                key: key.to_string(),
                value: property.values_string(),
                expected: "engine and sampler to come from the test parameters",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_without_sampler() {
        let params = TestParams::new("PATHCPU", "");
        assert_eq!(params.output_name("MatteMaterial"), "MatteMaterial_PATHCPU");
    }

    #[test]
    fn output_name_with_sampler() {
        let params = TestParams::new("BIDIRCPU", "SOBOL");
        assert_eq!(
            params.output_name("GlassMaterial"),
            "GlassMaterial_BIDIRCPU_SOBOL"
        );
    }

    #[test]
    fn overrides_skip_empty_sampler() {
        let params = TestParams::new("TILEPATHCPU", "")
            .with(Property::with_value("batch.haltspp", 4));
        let props = params.overrides();

        assert_eq!(props.get_string(keys::RENDER_ENGINE_TYPE, ""), "TILEPATHCPU");
        assert!(!props.is_defined(keys::SAMPLER_TYPE));
        assert_eq!(props.get_u32("batch.haltspp", 0).unwrap(), 4);
    }

    #[test]
    fn selection_keys_are_rejected() {
        let plain = Properties::new().with(Property::with_value("batch.haltspp", 4));
        assert!(reject_selection_keys(&plain).is_ok());

        for key in [keys::RENDER_ENGINE_TYPE, keys::SAMPLER_TYPE] {
            let props = plain.clone().with(Property::with_value(key, "LIGHTCPU"));
            let err = reject_selection_keys(&props).unwrap_err();
            assert!(
                matches!(err, lucent_core::Error::InvalidValue { key: ref k, ref value, .. } if k == key && value == "LIGHTCPU"),
                "{err}"
            );
        }
    }
}
