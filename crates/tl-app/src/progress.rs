//! Progress events streamed from a trim run.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingModel,
    Trimming,
    ApplyingTrim,
    Linearizing,
    WritingScript,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingModel => "Loading model",
            RunStage::Trimming => "Trimming",
            RunStage::ApplyingTrim => "Applying trim",
            RunStage::Linearizing => "Linearizing",
            RunStage::WritingScript => "Writing script",
            RunStage::SavingResults => "Saving results",
            RunStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrimProgress {
    pub iteration: usize,
    pub max_iterations: usize,
    pub evaluations: usize,
    pub best_cost: f64,
    pub relative_spread: f64,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub trim: Option<TrimProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            trim: None,
        }
    }
}
