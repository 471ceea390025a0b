use serde::{Deserialize, Deserializer};

/// 区分“未提供”和“显式置空”的更新字段
///
/// 配合 `#[serde(default, deserialize_with = "nullable")]` 使用：
/// 字段缺失得到 `None`，`null` 得到 `Some(None)`，有值得到 `Some(Some(v))`。
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        class_id: Option<Option<i64>>,
    }

    #[test]
    fn test_three_states() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.class_id, None);
        let cleared: Patch = serde_json::from_str(r#"{"class_id":null}"#).unwrap();
        assert_eq!(cleared.class_id, Some(None));
        let set: Patch = serde_json::from_str(r#"{"class_id":5}"#).unwrap();
        assert_eq!(set.class_id, Some(Some(5)));
    }
}
