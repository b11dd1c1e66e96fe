use crate::core::{BackendObject, Query};
use crate::domain::model::SessionUser;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 後端 SDK 的認證介面（固定的第三方契約）
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn log_in(&self, username: &str, password: &str) -> Result<SessionUser>;
    async fn sign_up(&self, username: &str, password: &str, email: &str) -> Result<SessionUser>;
    async fn log_out(&self) -> Result<()>;

    /// 本地 session 狀態，不發出網路請求
    fn current_user(&self) -> Option<SessionUser>;
}

/// 後端 SDK 的物件／查詢介面
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// 依 id 是否存在決定建立或更新
    async fn save(&self, object: &mut BackendObject) -> Result<()>;
    async fn delete(&self, object: &BackendObject) -> Result<()>;
    async fn find(&self, query: &Query) -> Result<Vec<BackendObject>>;
    async fn first(&self, query: &Query) -> Result<Option<BackendObject>>;
    async fn get(&self, class_name: &str, object_id: &str) -> Result<BackendObject>;
}
