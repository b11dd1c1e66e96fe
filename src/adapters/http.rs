use crate::config::ServerConfig;
use crate::core::{BackendObject, Query, ROLE_CLASS, USER_CLASS};
use crate::domain::model::SessionUser;
use crate::domain::ports::{AuthBackend, ObjectBackend};
use crate::utils::error::{AdapterError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Mutex;

/// 透過後端 REST API 實作兩個 port。
///
/// 單發請求、無重試、無逾時設定；session token 保存在實例狀態，
/// `current_user` 是本地讀取。
pub struct RestBackend {
    client: Client,
    base_url: String,
    application_id: String,
    javascript_key: String,
    session: Mutex<Option<SessionUser>>,
}

impl RestBackend {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: server.url.trim_end_matches('/').to_string(),
            application_id: server.application_id.clone(),
            javascript_key: server.javascript_key.clone(),
            session: Mutex::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 內建類別走專屬路徑，其他類別走 classes/<name>
    fn class_path(class_name: &str) -> String {
        match class_name {
            USER_CLASS => "users".to_string(),
            ROLE_CLASS => "roles".to_string(),
            other => format!("classes/{}", other),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.endpoint(path))
            .header("X-Parse-Application-Id", self.application_id.as_str())
            .header("X-Parse-Javascript-Key", self.javascript_key.as_str());

        if let Some(user) = self.session.lock().unwrap().as_ref() {
            request = request.header("X-Parse-Session-Token", user.session_token.as_str());
        }

        request
    }

    async fn parse_response(response: Response) -> Result<Value> {
        let status = response.status();
        tracing::debug!("Backend response status: {}", status);

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(translate_error(status, &body))
        }
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn log_in(&self, username: &str, password: &str) -> Result<SessionUser> {
        tracing::debug!("POST {}", self.endpoint("login"));
        let response = self
            .request(Method::POST, "login")
            .header("X-Parse-Revocable-Session", "1")
            .json(&json!({"username": username, "password": password}))
            .send()
            .await?;

        let body = Self::parse_response(response).await?;
        let user = session_user_from_json(&body, username, username)?;

        *self.session.lock().unwrap() = Some(user.clone());
        tracing::info!("🔑 Logged in as {}", user.username);

        Ok(user)
    }

    async fn sign_up(&self, username: &str, password: &str, email: &str) -> Result<SessionUser> {
        tracing::debug!("POST {}", self.endpoint("users"));
        let response = self
            .request(Method::POST, "users")
            .header("X-Parse-Revocable-Session", "1")
            .json(&json!({
                "username": username,
                "password": password,
                "email": email,
            }))
            .send()
            .await?;

        let body = Self::parse_response(response).await?;
        let user = session_user_from_json(&body, username, email)?;

        *self.session.lock().unwrap() = Some(user.clone());
        tracing::info!("🔑 Registered {}", user.username);

        Ok(user)
    }

    async fn log_out(&self) -> Result<()> {
        let logged_in = self.session.lock().unwrap().is_some();

        if logged_in {
            match self.request(Method::POST, "logout").send().await {
                Ok(response) => {
                    if let Err(error) = Self::parse_response(response).await {
                        tracing::warn!("Logout rejected by backend: {}", error);
                    }
                }
                Err(error) => tracing::warn!("Logout request failed: {}", error),
            }
        }

        // 無論遠端結果如何都清掉本地 session
        *self.session.lock().unwrap() = None;

        Ok(())
    }

    fn current_user(&self) -> Option<SessionUser> {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectBackend for RestBackend {
    async fn save(&self, object: &mut BackendObject) -> Result<()> {
        let path = Self::class_path(object.class_name());
        let body = object.save_body();

        match object.id().map(ToString::to_string) {
            Some(id) => {
                let url_path = format!("{}/{}", path, id);
                tracing::debug!("PUT {}", self.endpoint(&url_path));
                let response = self
                    .request(Method::PUT, &url_path)
                    .json(&body)
                    .send()
                    .await?;
                let reply = Self::parse_response(response).await?;
                object.set_updated_at(timestamp_field(&reply, "updatedAt"));
            }
            None => {
                tracing::debug!("POST {}", self.endpoint(&path));
                let response = self
                    .request(Method::POST, &path)
                    .json(&body)
                    .send()
                    .await?;
                let reply = Self::parse_response(response).await?;
                if let Some(id) = reply.get("objectId").and_then(Value::as_str) {
                    object.set_object_id(id.to_string());
                }
                object.set_created_at(timestamp_field(&reply, "createdAt"));
            }
        }

        Ok(())
    }

    async fn delete(&self, object: &BackendObject) -> Result<()> {
        let id = object.id().ok_or_else(|| AdapterError::ProcessingError {
            message: "cannot delete an object that was never saved".to_string(),
        })?;

        let url_path = format!("{}/{}", Self::class_path(object.class_name()), id);
        tracing::debug!("DELETE {}", self.endpoint(&url_path));
        let response = self.request(Method::DELETE, &url_path).send().await?;
        Self::parse_response(response).await?;

        Ok(())
    }

    async fn find(&self, query: &Query) -> Result<Vec<BackendObject>> {
        let path = Self::class_path(query.class_name());
        tracing::debug!("GET {} where {}", self.endpoint(&path), query.where_clause());

        let mut request = self.request(Method::GET, &path);
        if !query.is_unconstrained() {
            request = request.query(&[("where", query.where_clause().to_string())]);
        }
        if let Some(limit) = query.limit_value() {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let response = request.send().await?;
        let body = Self::parse_response(response).await?;

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(results
            .into_iter()
            .map(|item| BackendObject::from_json(query.class_name(), item))
            .collect())
    }

    async fn first(&self, query: &Query) -> Result<Option<BackendObject>> {
        let limited = query.clone().limit(1);
        Ok(self.find(&limited).await?.into_iter().next())
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<BackendObject> {
        let url_path = format!("{}/{}", Self::class_path(class_name), object_id);
        tracing::debug!("GET {}", self.endpoint(&url_path));
        let response = self.request(Method::GET, &url_path).send().await?;
        let body = Self::parse_response(response).await?;

        Ok(BackendObject::from_json(class_name, body))
    }
}

/// 失敗回應帶 {"code": n, "error": "..."}；解不開就退回狀態碼
fn translate_error(status: StatusCode, body: &str) -> AdapterError {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let code = value.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(body)
                .to_string();
            AdapterError::BackendError { code, message }
        }
        Err(_) => AdapterError::BackendError {
            code: -1,
            message: if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            },
        },
    }
}

fn session_user_from_json(
    body: &Value,
    fallback_username: &str,
    fallback_email: &str,
) -> Result<SessionUser> {
    let id = body
        .get("objectId")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::ProcessingError {
            message: "session response is missing objectId".to_string(),
        })?;
    let session_token = body
        .get("sessionToken")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::ProcessingError {
            message: "session response is missing sessionToken".to_string(),
        })?;

    Ok(SessionUser {
        id: id.to_string(),
        username: body
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or(fallback_username)
            .to_string(),
        email: body
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or(fallback_email)
            .to_string(),
        session_token: session_token.to_string(),
    })
}

fn timestamp_field(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_path_for_builtin_classes() {
        assert_eq!(RestBackend::class_path("_User"), "users");
        assert_eq!(RestBackend::class_path("_Role"), "roles");
        assert_eq!(RestBackend::class_path("Dashboard"), "classes/Dashboard");
    }

    #[test]
    fn test_translate_error_reads_code_and_message() {
        let err = translate_error(
            StatusCode::NOT_FOUND,
            r#"{"code": 101, "error": "object not found for get"}"#,
        );
        match err {
            AdapterError::BackendError { code, message } => {
                assert_eq!(code, 101);
                assert_eq!(message, "object not found for get");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_translate_error_with_unparseable_body() {
        let err = translate_error(StatusCode::BAD_GATEWAY, "<html>boom</html>");
        match err {
            AdapterError::BackendError { code, message } => {
                assert_eq!(code, -1);
                assert_eq!(message, "<html>boom</html>");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_session_user_falls_back_to_supplied_fields() {
        let body = serde_json::json!({
            "objectId": "u9",
            "sessionToken": "r:abc",
        });
        let user = session_user_from_json(&body, "me@example.com", "me@example.com").unwrap();
        assert_eq!(user.id, "u9");
        assert_eq!(user.username, "me@example.com");
        assert_eq!(user.email, "me@example.com");
        assert_eq!(user.session_token, "r:abc");
    }

    #[test]
    fn test_session_user_requires_token() {
        let body = serde_json::json!({"objectId": "u9"});
        assert!(session_user_from_json(&body, "a", "a").is_err());
    }
}
