//! Request extractors shared by the user and workspace routes.
//!
//! Both reject with [`ApiError`], so a malformed query or path renders the
//! same `{message, status}` body as every other client error.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use plura_core::DEFAULT_PAGE_SIZE;

use crate::error::{ApiError, ApiResult};

/// Query parameters of a cursor-paginated listing.
///
/// Both values arrive as raw strings so a malformed `take` produces the
/// API's own 400 body. When a key repeats, its first value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    /// Id of the record the page starts from.
    pub cursor: Option<String>,
    /// Page size, a positive integer (default 10).
    pub take: Option<String>,
}

impl PageParams {
    /// Build from decoded query pairs in the order they appeared.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "cursor" => &mut params.cursor,
                "take" => &mut params.take,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    /// The cursor, with an empty value treated as absent.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }

    pub fn take(&self) -> ApiResult<usize> {
        parse_take(self.take.as_deref())
    }
}

/// Parse a `take` query value.
///
/// Absent or empty means the default page size. Anything that is not a
/// positive integer is rejected.
pub fn parse_take(raw: Option<&str>) -> ApiResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_PAGE_SIZE);
    };
    match raw.parse::<usize>() {
        Ok(take) if take >= 1 => Ok(take),
        _ => Err(ApiError::invalid_input(format!(
            "take must be a positive integer, got {:?}",
            raw
        ))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs): Query<Vec<(String, String)>> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_input(format!("malformed query string: {}", e.body_text())))?;
        Ok(Self::from_pairs(pairs))
    }
}

/// A single string path segment, such as `:id` or `:userId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for PathParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!(path = %parts.uri.path(), error = %e, "Rejected path parameter");
                ApiError::invalid_input(format!("invalid path parameter: {}", e.body_text()))
            })?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use proptest::prelude::*;

    #[test]
    fn test_take_defaults() -> ApiResult<()> {
        assert_eq!(parse_take(None)?, 10);
        assert_eq!(parse_take(Some(""))?, 10);
        assert_eq!(parse_take(Some("  "))?, 10);
        assert_eq!(parse_take(Some("25"))?, 25);
        Ok(())
    }

    #[test]
    fn test_take_rejects_garbage() {
        for raw in ["0", "-3", "ten", "1.5"] {
            let err = parse_take(Some(raw));
            assert!(
                matches!(&err, Err(e) if e.code == ErrorCode::InvalidInput),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_cursor_is_absent() {
        let params = PageParams {
            cursor: Some(String::new()),
            take: None,
        };
        assert_eq!(params.cursor(), None);
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_first_value_wins() {
        let params = PageParams::from_pairs(pairs(&[
            ("cursor", "u03"),
            ("take", "5"),
            ("cursor", "u07"),
            ("take", "abc"),
        ]));
        assert_eq!(params.cursor(), Some("u03"));
        assert_eq!(params.take.as_deref(), Some("5"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let params = PageParams::from_pairs(pairs(&[("sort", "desc"), ("cursor", "")]));
        assert_eq!(params.cursor, Some(String::new()));
        assert_eq!(params.take, None);
    }

    proptest! {
        #[test]
        fn prop_positive_integers_parse(take in 1usize..100_000) {
            let parsed = parse_take(Some(&take.to_string()));
            prop_assert_eq!(parsed.ok(), Some(take));
        }
    }
}
