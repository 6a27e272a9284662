use thiserror::Error;

use crate::model::{ParseIdError, QuestionError, SettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
