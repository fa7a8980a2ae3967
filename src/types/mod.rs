pub mod analyst;
pub mod expert;
pub mod interview;
pub mod report;

pub use analyst::AnalystProfile;
pub use expert::ExpertProfile;
pub use interview::{CredibilityAssessment, InterviewResponse};
pub use report::FinalReport;
