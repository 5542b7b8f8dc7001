//! Query parameter extractors.

use serde::Deserialize;

use personachat_core::chat::validation::normalize_user_id;

/// `?userId=` on the history routes. Absent means the anonymous user.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl HistoryQuery {
    /// The trimmed user id, treating blank as absent.
    pub fn user_id(&self) -> Option<&str> {
        normalize_user_id(self.user_id.as_deref())
    }
}

/// `?userId=` on the session listing. Required there.
#[derive(Debug, Deserialize, Default)]
pub struct SessionsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_user_is_anonymous() {
        let q = HistoryQuery {
            user_id: Some("  ".to_string()),
        };
        assert_eq!(q.user_id(), None);

        let q = HistoryQuery {
            user_id: Some(" alice ".to_string()),
        };
        assert_eq!(q.user_id(), Some("alice"));
    }
}
