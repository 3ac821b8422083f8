use thiserror::Error;

/// Validation outcomes of board operations.
///
/// None of these are fatal: the server turns them into a notice on the page
/// and the CLI reports them before exiting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("month must be a number between 1 and 12, got {0:?}")]
    MonthNotANumber(String),

    #[error("year must be an integer, got {0:?}")]
    InvalidYear(String),

    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(String),

    #[error("Por favor, insira dias válidos para pelo menos um profissional.")]
    NoValidDays,
}
