pub mod analyst;
pub mod expert;
pub mod interview;
pub mod news_source;
pub mod project;

pub use analyst::Analyst;
pub use expert::Expert;
pub use interview::{Interview, InterviewStatus};
pub use news_source::{CreateNewsSource, NewsSource, SourceAssessment};
pub use project::{MAX_ANALYST_COUNT, ProjectProgress, ProjectStatus, ResearchProject};
