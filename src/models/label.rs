use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewLabel {
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LabelCreateRequest {
    #[validate(length(min = 3, max = 1000), custom = "not_blank")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LabelUpdateRequest {
    #[validate(length(min = 3, max = 1000), custom = "not_blank")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_label_name_length() {
        assert!(LabelCreateRequest { name: "bug".into() }.validate().is_ok());
        assert!(LabelCreateRequest { name: "ui".into() }.validate().is_err());
        assert!(LabelCreateRequest { name: "   ".into() }.validate().is_err());
        assert!(LabelCreateRequest {
            name: "x".repeat(1001)
        }
        .validate()
        .is_err());

        assert!(LabelUpdateRequest { name: None }.validate().is_ok());
        assert!(LabelUpdateRequest {
            name: Some("no".into())
        }
        .validate()
        .is_err());
        assert!(LabelUpdateRequest {
            name: Some("    ".into())
        }
        .validate()
        .is_err());
    }
}
