use serde::Serialize;

/// One executed pipeline step: how many items the batch touched and how
/// many of them succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct StepTrace {
    pub step: String,
    pub touched: usize,
    pub succeeded: usize,
}

/// Ordered trace of the steps a refresh executed.
///
/// Observability only; nothing reads this back for control flow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub steps: Vec<StepTrace>,
}

impl Diagnostics {
    pub fn record(&mut self, step: impl Into<String>, touched: usize, succeeded: usize) {
        self.steps.push(StepTrace {
            step: step.into(),
            touched,
            succeeded,
        });
    }

    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepTrace> {
        self.steps.iter().find(|s| s.step == name)
    }
}
