// ABOUTME: Main library for MSSQL Manager
// ABOUTME: Module declarations and the response envelope every user action returns

// Module declarations
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod render;
pub mod sql;
pub mod ui;

use error::ActionResult;

/// Outcome of one user action, ready to be shown
#[derive(Debug)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub messages: Messages,
}

/// Errors of a failed action, or warnings attached to a successful one
#[derive(Debug, Default)]
pub struct Messages {
    pub error: Vec<String>,
    pub warning: Vec<String>,
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            messages: Messages::default(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            messages: Messages {
                error: vec![message],
                ..Default::default()
            },
        }
    }

    /// Log and wrap the result of an action; `action` names it in the log
    pub fn from_result(action: &str, result: ActionResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => {
                log::error!("{} failed: {}", action, e);
                Self::error(e.to_string())
            }
        }
    }

    pub fn with_warning(mut self, warning: String) -> Self {
        self.messages.warning.push(warning);
        self
    }

    /// First error message, if the action failed
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(
            self.messages
                .error
                .first()
                .cloned()
                .unwrap_or_else(|| "Unknown error".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ActionError;

    #[test]
    fn test_from_result_success() {
        let response = ActionResponse::from_result("test", Ok(3));
        assert!(response.success);
        assert_eq!(response.data, Some(3));
        assert_eq!(response.error_message(), None);
    }

    #[test]
    fn test_from_result_error() {
        let response: ActionResponse<()> =
            ActionResponse::from_result("test", Err(ActionError::NotConnected));
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(
            response.error_message().as_deref(),
            Some("Please connect to database first")
        );
    }

    #[test]
    fn test_warnings_ride_on_success() {
        let response = ActionResponse::success("t").with_warning("partial".into());
        assert!(response.success);
        assert_eq!(response.error_message(), None);
        assert!(response.messages.error.is_empty());
        assert_eq!(response.messages.warning, vec!["partial".to_string()]);
    }
}
