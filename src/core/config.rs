mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{ConfigError, Environment, Settings};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn load_uses_defaults_in_development() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("EXAMPREP_ENV");
        std::env::remove_var("QUIZ_DEFAULT_PAGE_SIZE");

        let settings = Settings::load().expect("settings");

        assert_eq!(settings.runtime().environment, Environment::Development);
        assert_eq!(settings.api().api_v1_str, "/api/v1");
        assert_eq!(settings.security().algorithm, "HS256");
        assert_eq!(settings.quiz().default_page_size, 20);
        assert!(settings.quiz().max_page_size >= settings.quiz().default_page_size);
    }

    #[tokio::test]
    async fn strict_config_requires_admin_password() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("EXAMPREP_STRICT_CONFIG", "1");
        std::env::set_var("POSTGRES_PASSWORD", "pg-secret");
        std::env::remove_var("FIRST_ADMIN_PASSWORD");

        let result = Settings::load();

        std::env::set_var("EXAMPREP_STRICT_CONFIG", "0");
        std::env::remove_var("POSTGRES_PASSWORD");
        assert!(matches!(result, Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"))));
    }

    #[tokio::test]
    async fn page_size_larger_than_max_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("QUIZ_DEFAULT_PAGE_SIZE", "500");
        std::env::set_var("QUIZ_MAX_PAGE_SIZE", "100");

        let result = Settings::load();

        std::env::remove_var("QUIZ_DEFAULT_PAGE_SIZE");
        std::env::remove_var("QUIZ_MAX_PAGE_SIZE");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "QUIZ_DEFAULT_PAGE_SIZE", .. })
        ));
    }
}
