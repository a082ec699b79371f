//! HTTP client for the remote menu API.
//!
//! ERROR HANDLING
//! ==============
//! Every call maps to [`ApiError`]: connection and timeout failures become
//! `Transport`, non-2xx answers become `Status` carrying the server's text.

#[cfg(test)]
#[path = "api_test.rs"]
pub(crate) mod api_test;

use reqwest::Method;
use restomenu::menu::{normalize_menu, parse_partitioned_menu};
use restomenu::wire::{
    ADD_DISH_ENDPOINT, Credentials, LOGIN_ENDPOINT, LoginResponse, MENU_ENDPOINT, PROTECTED_ENDPOINT,
    ProtectedResponse, REGISTER_ENDPOINT, bearer, course_endpoint, delete_dish_endpoint, server_message,
    update_dish_endpoint,
};
use restomenu::{ApiConfig, ApiError, Course, Dish, DishDraft};
use serde_json::Value;

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

pub struct MenuClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl MenuClient {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> Result<Value, ApiError> {
        let url = self.config.endpoint(path);
        tracing::debug!(%method, %url, "api request");
        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, bearer(token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %url, "api request rejected");
            return Err(ApiError::from_status(status.as_u16(), &value));
        }
        if value.is_null() && !text.trim().is_empty() {
            return Err(ApiError::Decode(format!("non-JSON body from {url}")));
        }
        Ok(value)
    }

    /// `GET /menu`, flattened from whichever shape the server sends.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a dish
    /// that does not decode.
    pub async fn fetch_menu(&self) -> Result<Vec<Dish>, ApiError> {
        normalize_menu(self.request(Method::GET, MENU_ENDPOINT, None, None).await?)
    }

    /// `GET /menu`, requiring the course-partitioned shape.
    ///
    /// # Errors
    ///
    /// As [`MenuClient::fetch_menu`], plus `Decode` for any other shape.
    pub async fn fetch_partitioned_menu(&self) -> Result<Vec<Dish>, ApiError> {
        parse_partitioned_menu(self.request(Method::GET, MENU_ENDPOINT, None, None).await?)
    }

    /// Single-course listing (`/starters`, `/main_courses`, `/desserts`).
    ///
    /// # Errors
    ///
    /// Returns `Decode` for a course without an endpoint, else as
    /// [`MenuClient::fetch_menu`].
    pub async fn fetch_course(&self, course: &Course) -> Result<Vec<Dish>, ApiError> {
        let path = course_endpoint(course).ok_or_else(|| ApiError::Decode(format!("no endpoint for course {course}")))?;
        normalize_menu(self.request(Method::GET, &path, None, None).await?)
    }

    /// `POST /register`. Returns the server's message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn register(&self, credentials: &Credentials) -> Result<Option<String>, ApiError> {
        let body = serde_json::to_value(credentials)?;
        let resp = self.request(Method::POST, REGISTER_ENDPOINT, None, Some(&body)).await?;
        Ok(server_message(&resp))
    }

    /// `POST /login`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// without `access_token`/`user`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(credentials)?;
        let resp = self.request(Method::POST, LOGIN_ENDPOINT, None, Some(&body)).await?;
        Ok(serde_json::from_value(resp)?)
    }

    /// `GET /protected` with the bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn protected(&self, token: &str) -> Result<ProtectedResponse, ApiError> {
        let resp = self.request(Method::GET, PROTECTED_ENDPOINT, Some(token), None).await?;
        Ok(serde_json::from_value(resp)?)
    }

    /// `POST /add_dish`. Returns the server's message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn add_dish(&self, token: &str, draft: &DishDraft) -> Result<Option<String>, ApiError> {
        let body = serde_json::to_value(draft)?;
        let resp = self.request(Method::POST, ADD_DISH_ENDPOINT, Some(token), Some(&body)).await?;
        Ok(server_message(&resp))
    }

    /// `PUT /update_dish/{id}`. Returns the server's message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn update_dish(&self, token: &str, id: i64, draft: &DishDraft) -> Result<Option<String>, ApiError> {
        let body = serde_json::to_value(draft)?;
        let resp = self.request(Method::PUT, &update_dish_endpoint(id), Some(token), Some(&body)).await?;
        Ok(server_message(&resp))
    }

    /// `DELETE /delete_dish/{id}`. Returns the server's message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn delete_dish(&self, token: &str, id: i64) -> Result<Option<String>, ApiError> {
        let resp = self.request(Method::DELETE, &delete_dish_endpoint(id), Some(token), None).await?;
        Ok(server_message(&resp))
    }
}
