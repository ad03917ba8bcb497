use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured first admin exists, is active and can log in with the configured
/// password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let email = &admin.first_admin_email;
    let now = primitive_now_utc();

    let Some(user) = repositories::users::find_by_email(state.db(), email).await? else {
        let hashed_password = security::hash_password(&admin.first_admin_password)?;
        repositories::users::create(
            state.db(),
            repositories::users::CreateUser {
                id: &Uuid::new_v4().to_string(),
                email,
                hashed_password,
                full_name: "Sistem Yöneticisi",
                role: UserRole::Admin,
                is_active: true,
                city: None,
                now,
            },
        )
        .await?;

        tracing::info!(email = %email, "Created default admin");
        return Ok(());
    };

    let password_matches =
        security::verify_password(&admin.first_admin_password, &user.hashed_password)
            .unwrap_or(false);

    if password_matches && user.role == UserRole::Admin && user.is_active {
        tracing::info!("Default admin already up to date");
        return Ok(());
    }

    let hashed_password = if password_matches {
        None
    } else {
        Some(security::hash_password(&admin.first_admin_password)?)
    };

    repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            role: Some(UserRole::Admin),
            is_active: Some(true),
            hashed_password,
            ..Default::default()
        },
        now,
    )
    .await?;

    tracing::info!(email = %email, "Updated default admin");
    Ok(())
}
