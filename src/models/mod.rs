pub mod label;
pub mod task;
pub mod task_status;
pub mod user;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub use label::{Label, LabelCreateRequest, LabelUpdateRequest, NewLabel};
pub use task::{Task, TaskCreateRequest, TaskData, TaskDto, TaskQuery, TaskUpdateRequest};
pub use task_status::{
    NewTaskStatus, TaskStatus, TaskStatusCreateRequest, TaskStatusUpdateRequest,
};
pub use user::{NewUser, User, UserCreateRequest, UserDto, UserUpdateRequest};

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Use together with `#[serde(default)]`: a missing field stays `None`,
/// `null` becomes `Some(None)` and a value becomes `Some(Some(value))`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects strings that are empty or contain only whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
