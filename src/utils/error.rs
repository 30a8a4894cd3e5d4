use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LookupError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl LookupError {
    /// 網路錯誤或非 2xx 狀態視為暫時性錯誤
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::ApiError(_) | LookupError::HttpStatus { .. } => true,
            LookupError::RetriesExhausted { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// 給終端使用者看的訊息；非輸入錯誤一律使用通用訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::ValidationError { message } => message.clone(),
            LookupError::ConfigError { message } => format!("Configuration problem: {}", message),
            LookupError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration problem in {}: {}", field, reason)
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let status = LookupError::HttpStatus {
            status: 503,
            url: "http://example.com".to_string(),
        };
        assert!(status.is_transient());

        let exhausted = LookupError::RetriesExhausted {
            attempts: 3,
            source: Box::new(status),
        };
        assert!(exhausted.is_transient());

        let validation = LookupError::ValidationError {
            message: "Please enter an NPN.".to_string(),
        };
        assert!(!validation.is_transient());
    }

    #[test]
    fn test_user_friendly_message() {
        let validation = LookupError::ValidationError {
            message: "Please enter an NPN.".to_string(),
        };
        assert_eq!(validation.user_friendly_message(), "Please enter an NPN.");

        let unexpected = LookupError::HttpStatus {
            status: 500,
            url: "http://example.com".to_string(),
        };
        assert_eq!(
            unexpected.user_friendly_message(),
            "Something went wrong. Please try again."
        );
    }
}
