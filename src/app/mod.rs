pub mod session;
pub mod stage;

pub use session::{
    default_script, inspect_recording, record_demo, replay_recording, Inspection,
    PopulationSample, RecordSummary, ReplaySummary,
};
pub use stage::{ReplayStage, StageEntity};
