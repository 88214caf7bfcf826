//! Errors surfaced by the reading pipeline.
//!
//! Display strings are the short messages shown to the user as-is.

use thiserror::Error;

/// A failure of the external text-generation service.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("요청을 보내지 못했어요: {0}")]
    Http(#[from] reqwest::Error),

    #[error("응답이 너무 늦어져서 멈췄어요 ({secs}초)")]
    Timeout { secs: u64 },

    #[error("리딩 서비스가 {status} 응답을 돌려줬어요: {body}")]
    Status { status: u16, body: String },

    #[error("카드가 아무 말도 하지 않았어요. 다시 뽑아줘.")]
    EmptyResponse,
}

/// Anything that stops a reading from being produced.
#[derive(Error, Debug)]
pub enum ReadingError {
    #[error("질문을 먼저 적어줘.")]
    EmptyQuestion,

    #[error("질문은 {max}자까지만 적을 수 있어.")]
    QuestionTooLong { max: usize },

    #[error("너무 연속으로 뽑았어 😵‍💫 잠깐 숨 고르고 다시 해줘.")]
    RateLimited { max: usize, window_secs: u64 },

    #[error(transparent)]
    Generation(#[from] GenerateError),
}

impl ReadingError {
    /// Whether the user can simply try again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReadingError::RateLimited { .. } | ReadingError::Generation(_) => true,
            ReadingError::EmptyQuestion | ReadingError::QuestionTooLong { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(ReadingError::EmptyQuestion.to_string(), "질문을 먼저 적어줘.");
        assert_eq!(
            ReadingError::QuestionTooLong { max: 220 }.to_string(),
            "질문은 220자까지만 적을 수 있어."
        );
        assert!(
            ReadingError::RateLimited {
                max: 6,
                window_secs: 60
            }
            .to_string()
            .starts_with("너무 연속으로 뽑았어")
        );
    }

    #[test]
    fn test_generation_error_is_transparent() {
        let err = ReadingError::from(GenerateError::EmptyResponse);
        assert_eq!(err.to_string(), GenerateError::EmptyResponse.to_string());
    }

    #[test]
    fn test_retryable() {
        assert!(!ReadingError::EmptyQuestion.is_retryable());
        assert!(
            ReadingError::RateLimited {
                max: 6,
                window_secs: 60
            }
            .is_retryable()
        );
        assert!(ReadingError::from(GenerateError::Timeout { secs: 60 }).is_retryable());
    }
}
