//! Startup data: the admin account, the default workflow statuses and two labels.
//!
//! Seeding is idempotent. Rows are looked up by their natural key (email, slug, name)
//! and only inserted when missing, so restarting against a persistent database
//! leaves existing data alone.

use log::info;

use crate::auth::{hash_password, AuthSettings};
use crate::error::AppError;
use crate::models::{NewLabel, NewTaskStatus, NewUser};
use crate::store::Store;

pub const ADMIN_EMAIL: &str = "hexlet@example.com";
pub const ADMIN_PASSWORD: &str = "qwerty";

pub const DEFAULT_STATUSES: [(&str, &str); 5] = [
    ("Draft", "draft"),
    ("To review", "to_review"),
    ("To be fixed", "to_be_fixed"),
    ("To publish", "to_publish"),
    ("Published", "published"),
];

pub const DEFAULT_LABELS: [&str; 2] = ["feature", "bug"];

/// Inserts whatever default data is missing. Returns the number of rows created.
pub async fn seed(store: &dyn Store, settings: &AuthSettings) -> Result<usize, AppError> {
    let mut created = 0;

    if store.find_user_by_email(ADMIN_EMAIL).await?.is_none() {
        store
            .insert_user(NewUser {
                email: ADMIN_EMAIL.to_string(),
                first_name: None,
                last_name: None,
                password_digest: hash_password(ADMIN_PASSWORD, settings.bcrypt_cost)?,
            })
            .await?;
        created += 1;
    }

    for (name, slug) in DEFAULT_STATUSES {
        if store.find_task_status_by_slug(slug).await?.is_none() {
            store
                .insert_task_status(NewTaskStatus {
                    name: name.to_string(),
                    slug: slug.to_string(),
                })
                .await?;
            created += 1;
        }
    }

    for name in DEFAULT_LABELS {
        if store.find_label_by_name(name).await?.is_none() {
            store
                .insert_label(NewLabel {
                    name: name.to_string(),
                })
                .await?;
            created += 1;
        }
    }

    info!("seeded {} default records", created);
    Ok(created)
}
