pub mod analyst_generator;
pub mod credibility_analyzer;
pub mod expert_synthesizer;
pub mod interview_simulator;
pub mod question_generator;
pub mod report_synthesizer;

pub use analyst_generator::{AnalystBrief, AnalystGenerator};
pub use credibility_analyzer::{CredibilityAnalyzer, CredibilityBrief};
pub use expert_synthesizer::{ExpertBrief, ExpertSynthesizer};
pub use interview_simulator::{InterviewBrief, InterviewSimulator};
pub use question_generator::{QuestionBrief, QuestionGenerator};
pub use report_synthesizer::{InterviewDossier, ReportBrief, ReportSynthesizer};
