//! Declarative validator configuration
//!
//! A [`ValidatorConfig`] starts from a [`Preset`] and may override single
//! sections, either through the builder or from YAML:
//!
//! ```yaml
//! preset: Strict
//! quality:
//!   enabled: true
//!   fields: [Patient.sex, Observation.effective]
//! reference_date: 2024-06-30
//! ```
//!
//! [`ValidatorConfig::compile`] checks the configuration and turns it into a
//! [`ValidationPlan`].

use crate::{ConfigError, ValidationPlan};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preset {
    /// Structural and semantic rules plus the common recommended fields.
    #[default]
    Ingestion,
    /// Everything in `Ingestion` and a longer list of recommended fields.
    Strict,
    /// Structural and semantic rules only; no warnings.
    Minimal,
}

/// Optional fields whose absence is reported as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendedField {
    #[serde(rename = "Patient.name")]
    PatientName,
    #[serde(rename = "Patient.birthDate")]
    PatientBirthDate,
    #[serde(rename = "Patient.sex")]
    PatientSex,
    #[serde(rename = "Encounter.class")]
    EncounterClass,
    #[serde(rename = "Encounter.start")]
    EncounterStart,
    #[serde(rename = "Observation.value")]
    ObservationValue,
    #[serde(rename = "Observation.effective")]
    ObservationEffective,
}

impl RecommendedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatientName => "Patient.name",
            Self::PatientBirthDate => "Patient.birthDate",
            Self::PatientSex => "Patient.sex",
            Self::EncounterClass => "Encounter.class",
            Self::EncounterStart => "Encounter.start",
            Self::ObservationValue => "Observation.value",
            Self::ObservationEffective => "Observation.effective",
        }
    }
}

impl fmt::Display for RecommendedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<RecommendedField>,
}

impl QualityConfig {
    fn for_preset(preset: Preset) -> Self {
        use RecommendedField::*;
        match preset {
            Preset::Ingestion => Self {
                enabled: true,
                fields: vec![PatientSex, PatientBirthDate, ObservationEffective],
            },
            Preset::Strict => Self {
                enabled: true,
                fields: vec![
                    PatientName,
                    PatientSex,
                    PatientBirthDate,
                    EncounterClass,
                    EncounterStart,
                    ObservationValue,
                    ObservationEffective,
                ],
            },
            Preset::Minimal => Self {
                enabled: false,
                fields: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorConfig {
    pub preset: Preset,
    pub quality: QualityConfig,
    /// Fixed "today" for the future-date check; the current UTC date when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

/// YAML shape: every section optional, missing ones come from the preset.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    #[serde(default)]
    preset: Preset,
    quality: Option<QualityConfig>,
    reference_date: Option<NaiveDate>,
}

impl<'de> Deserialize<'de> for ValidatorConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = ConfigOverrides::deserialize(deserializer)?;
        let mut config = Self::preset(overrides.preset);
        if let Some(quality) = overrides.quality {
            config.quality = quality;
        }
        config.reference_date = overrides.reference_date;
        Ok(config)
    }
}

impl ValidatorConfig {
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            quality: QualityConfig::for_preset(preset),
            reference_date: None,
        }
    }

    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn compile(&self) -> Result<ValidationPlan, ConfigError> {
        if self.quality.enabled && self.quality.fields.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "quality checks are enabled but no recommended fields are listed".into(),
            ));
        }
        Ok(ValidationPlan::build(self))
    }
}

#[derive(Debug, Default)]
pub struct ValidatorConfigBuilder {
    preset: Preset,
    quality_enabled: Option<bool>,
    fields: Option<Vec<RecommendedField>>,
    reference_date: Option<NaiveDate>,
}

impl ValidatorConfigBuilder {
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    pub fn quality(mut self, enabled: bool) -> Self {
        self.quality_enabled = Some(enabled);
        self
    }

    /// Replace the preset's recommended-field list.
    pub fn recommended_fields(mut self, fields: impl IntoIterator<Item = RecommendedField>) -> Self {
        self.fields = Some(fields.into_iter().collect());
        self
    }

    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn build(self) -> ValidatorConfig {
        let mut config = ValidatorConfig::preset(self.preset);
        if let Some(enabled) = self.quality_enabled {
            config.quality.enabled = enabled;
        }
        if let Some(fields) = self.fields {
            config.quality.fields = fields;
        }
        config.reference_date = self.reference_date;
        config
    }
}
