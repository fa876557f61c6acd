pub mod report;
pub mod round;

pub use report::{NodeFailure, PrimarySummary, ReplicaOutcome, ReplicaReport, RoundReport};
pub use round::{measure_replica, PollRound};
