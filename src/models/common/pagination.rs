use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

pub const MAX_PAGE_SIZE: i64 = 100;

/// 分页查询参数
///
/// 查询字符串经 `#[serde(flatten)]` 合并后全部以字符串形式到达，
/// 因此数值字段需要手动解析。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_string_to_i64")]
    pub page: i64,
    #[serde(default = "default_size", deserialize_with = "deserialize_string_to_i64")]
    pub size: i64,
}

impl PaginationQuery {
    /// 页码最小为 1，每页条数限制在 1..=100
    pub fn normalized(&self) -> (u64, u64) {
        let page = self.page.max(1) as u64;
        let size = self.size.clamp(1, MAX_PAGE_SIZE) as u64;
        (page, size)
    }
}

/// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationInfo {
    pub fn new(page: u64, size: u64, total: u64, total_pages: u64) -> Self {
        Self {
            page: page as i64,
            page_size: size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

/// 分页列表响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginatedResponse<T: TS> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<Self::Value, E> {
            i64::try_from(value).map_err(|_| Error::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

/// 可选的查询参数，字符串经 `FromStr` 解析；空字符串视为未提供
pub fn option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(flatten)]
        pagination: PaginationQuery,
        #[serde(default, deserialize_with = "option_from_str")]
        class_id: Option<i64>,
        #[serde(default, deserialize_with = "option_from_str")]
        published: Option<bool>,
    }

    #[test]
    fn test_flattened_query_parsing() {
        let params =
            Query::<Params>::from_query("page=3&size=500&class_id=12&published=true")
                .unwrap()
                .into_inner();
        assert_eq!(params.pagination.page, 3);
        assert_eq!(params.pagination.normalized(), (3, 100));
        assert_eq!(params.class_id, Some(12));
        assert_eq!(params.published, Some(true));
    }

    #[test]
    fn test_defaults_and_empty_values() {
        let params = Query::<Params>::from_query("class_id=").unwrap().into_inner();
        assert_eq!(params.pagination.normalized(), (1, 10));
        assert_eq!(params.class_id, None);
        assert_eq!(params.published, None);
    }

    #[test]
    fn test_normalized_clamps_low_values() {
        let query = PaginationQuery { page: -4, size: 0 };
        assert_eq!(query.normalized(), (1, 1));
    }
}
