mod answer;
mod ids;
mod question;
mod session;
mod settings;

pub use ids::{FetchTicket, ParseIdError, QuestionId};

pub use answer::UserAnswer;
pub use question::{QuestionError, QuizQuestion};
pub use session::{QuizPhase, QuizSummary, progress_percent, score};
pub use settings::{DEFAULT_ENDPOINT, MAX_QUESTION_COUNT, QuizSettings, SettingsError};
