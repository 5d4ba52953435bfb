use crate::application::error::ErrorReport;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const DUPLICATE: &str = "duplicate";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const UPSTREAM: &str = "upstream_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
enum Body {
    /// `{"error": {"code", "message", "hint"}}`
    Structured {
        message: &'static str,
        hint: Option<String>,
    },
    /// A bare JSON string.
    Message(String),
    Empty,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    body: Body,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            body: Body::Structured { message, hint },
        }
    }

    /// An error whose body is the message itself, encoded as a JSON string.
    pub fn message(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            body: Body::Message(message.into()),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: codes::NOT_FOUND,
            body: Body::Empty,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn detail(&self) -> String {
        match &self.body {
            Body::Structured { message, hint } => hint.clone().unwrap_or_else(|| message.to_string()),
            Body::Message(message) => message.clone(),
            Body::Empty => "resource not found".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, self.detail()),
        );

        let mut response = match self.body {
            Body::Structured { message, hint } => {
                let body = ApiErrorBody {
                    error: ApiErrorMessage {
                        code: self.code.to_string(),
                        message: message.to_string(),
                        hint,
                    },
                };
                (self.status, Json(body)).into_response()
            }
            Body::Message(message) => (self.status, Json(message)).into_response(),
            Body::Empty => self.status.into_response(),
        };
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        report.attach(&mut response);
        response
    }
}
