use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    CreateNotificationRequest, CreateStudentRequest, MarkAttendanceRequest, MessageResponse,
    Notification, SectionWithStudents, Student,
};
use thiserror::Error;
use tracing::debug;

use crate::config::{DashboardConfig, DEFAULT_API_URL};

/// Failure talking to the backend. Any non-2xx answer is an `Http` error.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL `{0}`")]
    InvalidUrl(String),
}

/// The backend calls the dashboard makes
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<SectionWithStudents>, ClientError>;

    async fn create_student(&self, request: CreateStudentRequest) -> Result<Student, ClientError>;

    async fn mark_attendance(&self, request: MarkAttendanceRequest) -> Result<MessageResponse, ClientError>;

    async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification, ClientError>;

    async fn list_notifications(&self, student_id: &str) -> Result<Vec<Notification>, ClientError>;
}

/// API client for communicating with the backend server
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Create a new API client with the default base URL
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL.to_string())
    }

    /// Create a new API client with a custom base URL
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::with_base_url(config.api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each one percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let invalid = || ClientError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        debug!("GET {}", url.path());
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        debug!("POST {}", url.path());
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl AttendanceApi for ApiClient {
    async fn list_sections(&self) -> Result<Vec<SectionWithStudents>, ClientError> {
        self.get(&["api", "sections"]).await
    }

    async fn create_student(&self, request: CreateStudentRequest) -> Result<Student, ClientError> {
        self.post(&["api", "students"], &request).await
    }

    async fn mark_attendance(&self, request: MarkAttendanceRequest) -> Result<MessageResponse, ClientError> {
        self.post(&["api", "attendance", "mark"], &request).await
    }

    async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification, ClientError> {
        self.post(&["api", "notifications"], &request).await
    }

    async fn list_notifications(&self, student_id: &str) -> Result<Vec<Notification>, ClientError> {
        self.get(&["api", "notifications", student_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = ApiClient::with_base_url("http://example.org:5000/".to_string());
        assert_eq!(client.base_url(), "http://example.org:5000");
        assert_eq!(
            client.url(&["api", "sections"]).unwrap().as_str(),
            "http://example.org:5000/api/sections"
        );
        assert_eq!(ApiClient::default().base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_path_segments_encoded() {
        let client = ApiClient::with_base_url("http://example.org:5000".to_string());
        let url = client.url(&["api", "notifications", "231FA04001"]).unwrap();
        assert_eq!(url.path(), "/api/notifications/231FA04001");
        let url = client.url(&["api", "notifications", "a b/c"]).unwrap();
        assert_eq!(url.path(), "/api/notifications/a%20b%2Fc");

        let prefixed = ApiClient::with_base_url("http://example.org/attendance/".to_string());
        assert_eq!(prefixed.url(&["api", "sections"]).unwrap().path(), "/attendance/api/sections");
    }

    #[test]
    fn test_unparseable_base_url() {
        let client = ApiClient::with_base_url("not a url".to_string());
        let err = client.url(&["api", "sections"]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(ref base) if base == "not a url"));
    }

    #[test]
    fn test_http_error_message() {
        let err = ClientError::Http {
            status: 500,
            body: "{\"error\":\"boom\"}".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: {\"error\":\"boom\"}");
    }
}
