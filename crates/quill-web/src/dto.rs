use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use quill_core::LoginAttempt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reply<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

pub fn succ<T: Serialize>(message: &str, data: T) -> Json<Reply<T>> {
    Json(Reply {
        success: true,
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn done(message: &str) -> Json<Reply<()>> {
    Json(Reply {
        success: true,
        message: message.to_string(),
        data: None,
    })
}

/// Request body bound from JSON or from a urlencoded form, depending on
/// the content type. Binding failures become an `invalid input data`
/// envelope carrying the parser message.
pub struct Input<T>(pub T);

impl<T, S> FromRequest<S> for Input<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::fail_with("invalid input data", e.body_text()))?;
            Ok(Input(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::fail_with("invalid input data", e.body_text()))?;
            Ok(Input(value))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub num: String,
    pub vcode: String,
    pub vreal: String,
    pub passwd: String,
}

impl From<LoginRequest> for LoginAttempt {
    fn from(req: LoginRequest) -> Self {
        LoginAttempt {
            num: req.num,
            passwd: req.passwd,
            vcode: req.vcode,
            vreal: req.vreal,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswdRequest {
    pub opasswd: String,
    pub npasswd: String,
}

#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub name: String,
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct RuntimeInfo {
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub cpus: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ContentStats {
    pub posts: usize,
    pub pages: usize,
    pub cates: usize,
    pub tags: usize,
    pub dicts: usize,
}
