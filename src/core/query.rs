use serde_json::{json, Map, Value};

/// 對單一類別的等值／存在性查詢，轉成後端的 JSON where 子句
#[derive(Debug, Clone)]
pub struct Query {
    class_name: String,
    constraints: Map<String, Value>,
    limit: Option<u32>,
}

impl Query {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            constraints: Map::new(),
            limit: None,
        }
    }

    pub fn equal_to(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.to_string(), value.into());
        self
    }

    pub fn exists(mut self, key: &str) -> Self {
        self.constraints
            .insert(key.to_string(), json!({"$exists": true}));
        self
    }

    pub fn does_not_exist(mut self, key: &str) -> Self {
        self.constraints
            .insert(key.to_string(), json!({"$exists": false}));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn where_clause(&self) -> Value {
        Value::Object(self.constraints.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_with_equality_constraints() {
        let query = Query::new("UserData")
            .equal_to("key", "theme")
            .equal_to("user", json!({"__type": "Pointer", "className": "_User", "objectId": "u1"}));

        assert_eq!(query.class_name(), "UserData");
        assert_eq!(
            query.where_clause(),
            json!({
                "key": "theme",
                "user": {"__type": "Pointer", "className": "_User", "objectId": "u1"},
            })
        );
    }

    #[test]
    fn test_where_clause_with_existence_constraints() {
        let query = Query::new("Location").exists("parent");
        assert_eq!(query.where_clause(), json!({"parent": {"$exists": true}}));

        let query = Query::new("Location").does_not_exist("parent");
        assert_eq!(query.where_clause(), json!({"parent": {"$exists": false}}));
    }

    #[test]
    fn test_unconstrained_query() {
        let query = Query::new("Dashboard");
        assert!(query.is_unconstrained());
        assert_eq!(query.where_clause(), json!({}));
        assert_eq!(query.limit_value(), None);

        let query = query.limit(1);
        assert_eq!(query.limit_value(), Some(1));
    }
}
