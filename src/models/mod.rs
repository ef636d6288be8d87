pub mod batch;
pub mod document;
pub mod report;
pub mod step;

pub use batch::{BatchFilter, BatchRequest};
pub use document::{known_people, DocumentId, DocumentRecord, FaceMatch, FieldUpdates, StepResult};
pub use report::{BatchReport, DocumentOutcome, DocumentStatus, SkippedSteps};
pub use step::{Step, StepStatus};
