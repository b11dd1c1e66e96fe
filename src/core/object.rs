use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

/// 後端內建的使用者／角色類別
pub const USER_CLASS: &str = "_User";
pub const ROLE_CLASS: &str = "_Role";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclEntry {
    pub read: bool,
    pub write: bool,
}

/// 物件上的存取控制清單：每個使用者一組 read/write 位元
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    entries: BTreeMap<String, AclEntry>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只授予指定使用者讀寫權限
    pub fn for_user(user_id: &str) -> Self {
        let mut acl = Self::new();
        acl.set_read_access(user_id, true);
        acl.set_write_access(user_id, true);
        acl
    }

    pub fn set_read_access(&mut self, user_id: &str, allowed: bool) {
        self.entries.entry(user_id.to_string()).or_default().read = allowed;
    }

    pub fn set_write_access(&mut self, user_id: &str, allowed: bool) {
        self.entries.entry(user_id.to_string()).or_default().write = allowed;
    }

    pub fn read_access(&self, user_id: &str) -> bool {
        self.entries.get(user_id).map(|e| e.read).unwrap_or(false)
    }

    pub fn write_access(&self, user_id: &str) -> bool {
        self.entries.get(user_id).map(|e| e.write).unwrap_or(false)
    }

    /// 線上格式：false 的位元省略
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (user_id, entry) in &self.entries {
            let mut bits = Map::new();
            if entry.read {
                bits.insert("read".to_string(), Value::Bool(true));
            }
            if entry.write {
                bits.insert("write".to_string(), Value::Bool(true));
            }
            if !bits.is_empty() {
                map.insert(user_id.clone(), Value::Object(bits));
            }
        }
        Value::Object(map)
    }

    pub fn from_json(value: &Value) -> Self {
        let mut acl = Self::new();
        if let Value::Object(map) = value {
            for (user_id, bits) in map {
                let read = bits.get("read").and_then(Value::as_bool).unwrap_or(false);
                let write = bits.get("write").and_then(Value::as_bool).unwrap_or(false);
                acl.entries
                    .insert(user_id.clone(), AclEntry { read, write });
            }
        }
        acl
    }
}

/// 遠端記錄：具名類別、不透明 id、泛型欄位存取
#[derive(Debug, Clone)]
pub struct BackendObject {
    class_name: String,
    object_id: Option<String>,
    fields: HashMap<String, Value>,
    acl: Option<Acl>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl BackendObject {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            object_id: None,
            fields: HashMap::new(),
            acl: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub(crate) fn set_object_id(&mut self, id: String) {
        self.object_id = Some(id);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn acl_mut(&mut self) -> &mut Acl {
        self.acl.get_or_insert_with(Acl::new)
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = Some(acl);
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub(crate) fn set_created_at(&mut self, at: Option<DateTime<Utc>>) {
        self.created_at = at;
    }

    pub(crate) fn set_updated_at(&mut self, at: Option<DateTime<Utc>>) {
        self.updated_at = at;
    }

    /// 指向其他物件的型別化指標值
    pub fn pointer(class_name: &str, object_id: &str) -> Value {
        json!({
            "__type": "Pointer",
            "className": class_name,
            "objectId": object_id,
        })
    }

    pub fn user_pointer(object_id: &str) -> Value {
        Self::pointer(USER_CLASS, object_id)
    }

    /// 從後端回應建物件，保留欄位、剝掉保留鍵
    pub fn from_json(class_name: &str, value: Value) -> Self {
        let mut object = Self::new(class_name);

        if let Value::Object(map) = value {
            for (key, field_value) in map {
                match key.as_str() {
                    "objectId" => {
                        if let Some(id) = field_value.as_str() {
                            object.object_id = Some(id.to_string());
                        }
                    }
                    "createdAt" => object.created_at = parse_timestamp(&field_value),
                    "updatedAt" => object.updated_at = parse_timestamp(&field_value),
                    "ACL" => object.acl = Some(Acl::from_json(&field_value)),
                    _ => {
                        object.fields.insert(key, field_value);
                    }
                }
            }
        }

        object
    }

    /// 建立／更新請求的 body：所有欄位加上 ACL
    pub fn save_body(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        if let Some(acl) = &self.acl {
            map.insert("ACL".to_string(), acl.to_json());
        }
        Value::Object(map)
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_for_user_grants_read_and_write() {
        let acl = Acl::for_user("owner1");
        assert!(acl.read_access("owner1"));
        assert!(acl.write_access("owner1"));
        assert!(!acl.read_access("someone-else"));
        assert_eq!(
            acl.to_json(),
            serde_json::json!({"owner1": {"read": true, "write": true}})
        );
    }

    #[test]
    fn test_acl_omits_false_bits() {
        let mut acl = Acl::new();
        acl.set_read_access("viewer", true);
        assert_eq!(acl.to_json(), serde_json::json!({"viewer": {"read": true}}));

        acl.set_read_access("viewer", false);
        assert_eq!(acl.to_json(), serde_json::json!({}));
    }

    #[test]
    fn test_acl_json_round_trip() {
        let mut acl = Acl::for_user("owner1");
        acl.set_read_access("friend", true);
        acl.set_write_access("friend", true);

        let parsed = Acl::from_json(&acl.to_json());
        assert_eq!(parsed, acl);
    }

    #[test]
    fn test_pointer_shape() {
        let pointer = BackendObject::user_pointer("u123");
        assert_eq!(
            pointer,
            serde_json::json!({
                "__type": "Pointer",
                "className": "_User",
                "objectId": "u123",
            })
        );
    }

    #[test]
    fn test_from_json_strips_reserved_keys() {
        let object = BackendObject::from_json(
            "Dashboard",
            serde_json::json!({
                "objectId": "d1",
                "createdAt": "2024-03-01T10:00:00.000Z",
                "updatedAt": "2024-03-02T10:00:00.000Z",
                "ACL": {"u1": {"read": true, "write": true}},
                "name": "Ops",
                "version": 3,
            }),
        );

        assert_eq!(object.id(), Some("d1"));
        assert!(object.created_at().is_some());
        assert!(object.updated_at().is_some());
        assert!(object.acl().is_some());
        assert_eq!(object.get_str("name"), Some("Ops"));
        assert_eq!(object.get("version"), Some(&serde_json::json!(3)));
        assert!(object.get("objectId").is_none());
        assert!(object.get("ACL").is_none());
    }

    #[test]
    fn test_save_body_includes_acl() {
        let mut object = BackendObject::new("Dashboard");
        object.set("name", "Ops");
        object.set_acl(Acl::for_user("u1"));

        assert_eq!(
            object.save_body(),
            serde_json::json!({
                "name": "Ops",
                "ACL": {"u1": {"read": true, "write": true}},
            })
        );
    }
}
