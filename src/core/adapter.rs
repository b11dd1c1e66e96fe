use crate::adapters::http::RestBackend;
use crate::config::{AdapterConfig, ClassConfig};
use crate::core::{Acl, BackendObject, Query, ROLE_CLASS, USER_CLASS};
use crate::domain::model::{
    Dashboard, DashboardDraft, Location, RegisterPayload, Role, SessionUser, UserSummary,
};
use crate::domain::ports::{AuthBackend, ObjectBackend};
use crate::utils::error::{AdapterError, Result};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// 綁定應用程式與遠端後端的薄轉接層。
///
/// 每個方法都是單次（最多兩次）的遠端呼叫加欄位映射；
/// 三個快取是機會性的 id → 最後看到的物件映射，沒有失效策略。
pub struct UserAdapter<B> {
    backend: B,
    classes: ClassConfig,
    data_cache: Mutex<HashMap<String, BackendObject>>,
    dashboards: Mutex<HashMap<String, BackendObject>>,
    locations: Mutex<HashMap<String, BackendObject>>,
}

impl UserAdapter<RestBackend> {
    /// 以設定檔建立含 REST 後端的 adapter
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(RestBackend::new(&config.server), config.classes.clone())
    }
}

impl<B: AuthBackend + ObjectBackend> UserAdapter<B> {
    pub fn new(backend: B, classes: ClassConfig) -> Self {
        Self {
            backend,
            classes,
            data_cache: Mutex::new(HashMap::new()),
            dashboards: Mutex::new(HashMap::new()),
            locations: Mutex::new(HashMap::new()),
        }
    }

    fn require_user(&self) -> Result<SessionUser> {
        self.backend
            .current_user()
            .ok_or(AdapterError::SessionError)
    }

    /// 任何登入失敗一律回覆固定的使用者訊息
    pub async fn log_in(&self, login: &str, password: &str) -> Result<SessionUser> {
        if let Err(error) = self.backend.log_in(login, password).await {
            tracing::debug!("Login rejected by backend: {}", error);
            return Err(AdapterError::AuthenticationError);
        }

        self.check_auth()
    }

    pub async fn log_out(&self) -> Result<()> {
        self.backend.log_out().await
    }

    /// 註冊新帳號，username 即 email
    pub async fn register(&self, payload: &RegisterPayload) -> Result<SessionUser> {
        self.backend
            .sign_up(&payload.email, &payload.password, &payload.email)
            .await?;

        self.check_auth()
    }

    /// 讀本地 session，不發出網路請求
    pub fn check_auth(&self) -> Result<SessionUser> {
        self.require_user()
    }

    pub async fn get_data(&self, key: &str) -> Result<Option<Value>> {
        let user = self.require_user()?;

        let query = Query::new(&self.classes.user_data)
            .equal_to("user", BackendObject::user_pointer(&user.id))
            .equal_to("key", key);

        match self.backend.first(&query).await? {
            Some(object) => {
                let value = object.get("value").cloned();
                self.data_cache
                    .lock()
                    .await
                    .insert(key.to_string(), object);
                Ok(value)
            }
            None => Ok(None),
        }
    }

    pub async fn set_data(&self, key: &str, value: Value) -> Result<()> {
        let user = self.require_user()?;

        let cached = self.data_cache.lock().await.get(key).cloned();

        let mut object = match cached {
            // 已看過的 key：更新現有物件，避免重複建立
            Some(object) => object,
            None => {
                let mut object = BackendObject::new(&self.classes.user_data);
                object.set("user", BackendObject::user_pointer(&user.id));
                object.set("key", key);
                object
            }
        };

        object.set("value", value);
        self.backend.save(&mut object).await?;
        self.data_cache
            .lock()
            .await
            .insert(key.to_string(), object);

        Ok(())
    }

    pub async fn list_dashboards(&self) -> Result<Vec<String>> {
        let result = self
            .backend
            .find(&Query::new(&self.classes.dashboard))
            .await?;

        let mut ids = Vec::with_capacity(result.len());
        let mut dashboards = self.dashboards.lock().await;
        for object in result {
            if let Some(id) = object.id().map(ToString::to_string) {
                ids.push(id.clone());
                dashboards.insert(id, object);
            }
        }

        tracing::debug!("Listed {} dashboards", ids.len());
        Ok(ids)
    }

    pub async fn get_dashboard(&self, id: &str) -> Result<Dashboard> {
        // 先重新列一次，快取跟後端同步的唯一機制
        self.list_dashboards().await?;

        let dashboards = self.dashboards.lock().await;
        let object = dashboards.get(id).ok_or_else(|| unknown_dashboard(id))?;

        map_dashboard(id, object)
    }

    pub async fn set_dashboard(&self, dashboard: &Dashboard) -> Result<()> {
        let mut object = {
            let dashboards = self.dashboards.lock().await;
            dashboards
                .get(&dashboard.id)
                .cloned()
                .ok_or_else(|| unknown_dashboard(&dashboard.id))?
        };

        object.set("location", dashboard.location.clone());
        object.set("name", dashboard.name.clone());
        object.set("version", dashboard.version);
        object.set("widgets", serde_json::to_string(&dashboard.widgets)?);

        self.backend.save(&mut object).await?;
        self.dashboards
            .lock()
            .await
            .insert(dashboard.id.clone(), object);

        Ok(())
    }

    pub async fn create_dashboard(&self, draft: &DashboardDraft) -> Result<String> {
        let user = self.require_user()?;

        let mut object = BackendObject::new(&self.classes.dashboard);
        object.set("owner", BackendObject::user_pointer(&user.id));
        object.set("location", draft.location.clone());
        object.set("name", draft.name.clone());
        object.set("version", draft.version);
        object.set("widgets", serde_json::to_string(&draft.widgets)?);
        object.set_acl(Acl::for_user(&user.id));

        self.backend.save(&mut object).await?;

        let id = object
            .id()
            .map(ToString::to_string)
            .ok_or_else(|| missing_object_id())?;
        self.dashboards.lock().await.insert(id.clone(), object);

        Ok(id)
    }

    pub async fn delete_dashboard(&self, id: &str) -> Result<String> {
        let object = self
            .dashboards
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| unknown_dashboard(id))?;

        self.backend.delete(&object).await?;

        Ok(id.to_string())
    }

    /// 在已快取的儀表板上補上目標使用者的讀寫位元
    pub async fn share_dashboard_with_user(&self, dashboard_id: &str, user_id: &str) -> Result<()> {
        let mut object = {
            let dashboards = self.dashboards.lock().await;
            dashboards
                .get(dashboard_id)
                .cloned()
                .ok_or_else(|| unknown_dashboard(dashboard_id))?
        };

        {
            let acl = object.acl_mut();
            acl.set_read_access(user_id, true);
            acl.set_write_access(user_id, true);
        }

        self.backend.save(&mut object).await?;
        self.dashboards
            .lock()
            .await
            .insert(dashboard_id.to_string(), object);

        Ok(())
    }

    /// 列出所有地點，並用一次子查詢把 parent 指標展開成子 id 清單
    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let result = self
            .backend
            .find(&Query::new(&self.classes.location))
            .await?;

        let children = self
            .backend
            .find(&Query::new(&self.classes.location).exists("parent"))
            .await?;

        let mut children_by_parent: HashMap<String, Vec<String>> = HashMap::new();
        for child in &children {
            let parent_id = child
                .get("parent")
                .and_then(|p| p.get("objectId"))
                .and_then(Value::as_str);
            if let (Some(parent_id), Some(child_id)) = (parent_id, child.id()) {
                children_by_parent
                    .entry(parent_id.to_string())
                    .or_default()
                    .push(child_id.to_string());
            }
        }

        let mut locations_cache = self.locations.lock().await;
        let mut listed = Vec::with_capacity(result.len());
        for object in result {
            let Some(id) = object.id().map(ToString::to_string) else {
                continue;
            };
            listed.push(Location {
                id: id.clone(),
                children: children_by_parent.remove(&id),
                fields: object.fields().clone(),
            });
            locations_cache.insert(id, object);
        }

        tracing::debug!("Listed {} locations", listed.len());
        Ok(listed)
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let current = self.require_user()?;

        let result = self.backend.find(&Query::new(USER_CLASS)).await?;

        let users: Vec<UserSummary> = result
            .iter()
            .filter(|object| object.id() != Some(current.id.as_str()))
            .filter_map(|object| {
                object.id().map(|id| UserSummary {
                    id: id.to_string(),
                    name: object.get_str("username").unwrap_or_default().to_string(),
                    email: object.get_str("email").unwrap_or_default().to_string(),
                })
            })
            .collect();

        tracing::debug!("Listed {} other users", users.len());
        Ok(users)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        let result = self.backend.find(&Query::new(ROLE_CLASS)).await?;

        Ok(result
            .iter()
            .filter_map(|object| {
                object.id().map(|id| Role {
                    id: id.to_string(),
                    name: object.get_str("name").unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    pub async fn list_shared_data(&self, kind: &str) -> Result<Vec<Value>> {
        let query = Query::new(&self.classes.shared_data)
            .equal_to("show", true)
            .equal_to("type", kind);

        let result = self.backend.find(&query).await?;

        result
            .iter()
            .map(|object| decode_json_field(object, "data"))
            .collect()
    }

    pub async fn create_shared_data(&self, kind: &str, data: &Value) -> Result<()> {
        let user = self.require_user()?;

        let mut object = BackendObject::new(&self.classes.shared_data);
        object.set("owner", BackendObject::user_pointer(&user.id));
        object.set("type", kind);
        object.set("show", true);
        object.set("data", serde_json::to_string(data)?);

        self.backend.save(&mut object).await?;

        Ok(())
    }

    pub async fn get_key_value_data(&self, id: &str) -> Result<Value> {
        let object = self.backend.get(&self.classes.key_value_data, id).await?;
        decode_json_field(&object, "data")
    }

    pub async fn create_key_value_data(&self, data: &Value) -> Result<String> {
        let user = self.require_user()?;

        let mut object = BackendObject::new(&self.classes.key_value_data);
        object.set("owner", BackendObject::user_pointer(&user.id));
        object.set("data", serde_json::to_string(data)?);

        self.backend.save(&mut object).await?;

        object
            .id()
            .map(ToString::to_string)
            .ok_or_else(missing_object_id)
    }
}

fn map_dashboard(id: &str, object: &BackendObject) -> Result<Dashboard> {
    let widgets = decode_json_field(object, "widgets")?;

    Ok(Dashboard {
        id: id.to_string(),
        location: object.get_str("location").unwrap_or_default().to_string(),
        name: object.get_str("name").unwrap_or_default().to_string(),
        version: object.get("version").and_then(Value::as_i64).unwrap_or(0),
        widgets,
    })
}

/// 儲存成 JSON 字串的欄位解回 Value
fn decode_json_field(object: &BackendObject, field: &str) -> Result<Value> {
    let raw = object
        .get_str(field)
        .ok_or_else(|| AdapterError::ProcessingError {
            message: format!("field '{}' is missing or not a JSON string", field),
        })?;

    Ok(serde_json::from_str(raw)?)
}

fn unknown_dashboard(id: &str) -> AdapterError {
    AdapterError::ProcessingError {
        message: format!("unknown dashboard: {}", id),
    }
}

fn missing_object_id() -> AdapterError {
    AdapterError::ProcessingError {
        message: "backend did not return an object id".to_string(),
    }
}
