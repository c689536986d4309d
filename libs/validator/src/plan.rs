use crate::{QualityConfig, RecommendedField, ValidatorConfig};
use chrono::NaiveDate;

/// Compiled validation plan - list of steps to execute
///
/// Steps always run in the order they are listed, and every step runs:
/// findings from one rule never suppress the next.
#[derive(Debug, Clone)]
pub struct ValidationPlan {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub enum Step {
    Required,
    References,
    Values(ValuesPlan),
    Duplicates,
    Quality(QualityPlan),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::References => "references",
            Self::Values(_) => "values",
            Self::Duplicates => "duplicates",
            Self::Quality(_) => "quality",
        }
    }
}

impl ValidationPlan {
    /// Fixed rule order; only the quality step is optional.
    pub(crate) fn build(config: &ValidatorConfig) -> Self {
        let mut steps = vec![
            Step::Required,
            Step::References,
            Step::Values(ValuesPlan {
                reference_date: config.reference_date,
            }),
            Step::Duplicates,
        ];
        if config.quality.enabled {
            steps.push(Step::Quality(QualityPlan::from(&config.quality)));
        }
        Self { steps }
    }
}

impl Default for ValidationPlan {
    fn default() -> Self {
        Self::build(&ValidatorConfig::default())
    }
}

// ============================================================================
// Step Plans
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValuesPlan {
    /// Dates after this day are in the future. `None` means today (UTC).
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct QualityPlan {
    pub fields: Vec<RecommendedField>,
}

impl From<&QualityConfig> for QualityPlan {
    fn from(cfg: &QualityConfig) -> Self {
        let mut fields = Vec::with_capacity(cfg.fields.len());
        for field in &cfg.fields {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
        Self { fields }
    }
}
