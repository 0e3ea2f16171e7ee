use hz_core::CalculationId;
use hz_tasks::ProgressSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcStage {
    Validating,
    SamplingLogicTree,
    PreparingRealizations,
    Simulating,
    Aggregating,
    SavingResults,
    Completed,
    Failed,
}

impl CalcStage {
    pub fn label(&self) -> &'static str {
        match self {
            CalcStage::Validating => "validating",
            CalcStage::SamplingLogicTree => "sampling",
            CalcStage::PreparingRealizations => "preparing",
            CalcStage::Simulating => "simulating",
            CalcStage::Aggregating => "aggregating",
            CalcStage::SavingResults => "saving",
            CalcStage::Completed => "completed",
            CalcStage::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalcProgressEvent {
    pub calculation: Option<CalculationId>,
    pub stage: CalcStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub progress: Option<ProgressSnapshot>,
}

impl CalcProgressEvent {
    pub fn stage(
        calculation: Option<CalculationId>,
        stage: CalcStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            calculation,
            stage,
            elapsed_wall_s,
            message,
            progress: None,
        }
    }
}
