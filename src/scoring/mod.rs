pub mod counter;
pub mod evaluator;

pub use self::counter::{SupportCounter, SupportEntry, EXACT_UNIT};
pub use self::evaluator::{confidence, CandidateEvaluator, EvaluationScratch};
