use crate::report::{Finding, ValidationReport};
use crate::steps::{self, RecordSet};
use crate::{ConfigError, Step, ValidationPlan, ValidatorConfig};
use chrono::{NaiveDate, Utc};
use medbridge_record::NormalizedRecord;

/// Reusable validator - owns the compiled plan
#[derive(Debug, Clone, Default)]
pub struct Validator {
    plan: ValidationPlan,
}

impl Validator {
    pub fn new(plan: ValidationPlan) -> Self {
        Self { plan }
    }

    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let plan = config.compile()?;
        Ok(Self::new(plan))
    }

    /// Validate one record set. The records are only read.
    pub fn validate(&self, records: &[NormalizedRecord]) -> ValidationReport {
        ValidationRun::new(&self.plan, records).execute()
    }

    pub fn plan(&self) -> &ValidationPlan {
        &self.plan
    }
}

/// Short-lived validation execution
struct ValidationRun<'a> {
    plan: &'a ValidationPlan,
    set: RecordSet<'a>,
    findings: Vec<Finding>,
}

impl<'a> ValidationRun<'a> {
    fn new(plan: &'a ValidationPlan, records: &'a [NormalizedRecord]) -> Self {
        Self {
            plan,
            set: RecordSet::new(records),
            findings: Vec::new(),
        }
    }

    fn execute(mut self) -> ValidationReport {
        for step in &self.plan.steps {
            let before = self.findings.len();
            self.execute_step(step);
            tracing::trace!(
                step = step.name(),
                findings = self.findings.len() - before,
                "validation step finished"
            );
        }

        let report = ValidationReport::new(self.findings);
        tracing::debug!(
            entities = self.set.entity_count(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            accepted = report.accepted,
            "validated record set"
        );
        report
    }

    fn execute_step(&mut self, step: &Step) {
        match step {
            Step::Required => steps::required::check_required(&self.set, &mut self.findings),
            Step::References => {
                steps::references::check_references(&self.set, &mut self.findings)
            }
            Step::Values(plan) => {
                let today = plan.reference_date.unwrap_or_else(today_utc);
                steps::values::check_values(&self.set, today, &mut self.findings)
            }
            Step::Duplicates => {
                steps::duplicates::check_duplicates(&self.set, &mut self.findings)
            }
            Step::Quality(plan) => {
                steps::quality::check_quality(&self.set, plan, &mut self.findings)
            }
        }
    }
}

fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
