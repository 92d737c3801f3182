use crate::env_opt;

/// Browser origins allowed to call the API with credentials.
#[derive(Clone, Debug, Default)]
pub struct CorsConfig {
    /// Empty, or containing `*`, reflects any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// `ALLOWED_ORIGINS` as a comma list, falling back to `FRONTEND_URL`.
    pub fn from_env() -> Self {
        let raw = env_opt("ALLOWED_ORIGINS").or_else(|| env_opt("FRONTEND_URL"));
        Self::from_list(raw.as_deref().unwrap_or_default())
    }

    pub fn from_list(raw: &str) -> Self {
        let mut allowed_origins: Vec<String> = Vec::new();
        for origin in raw
            .split(',')
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
        {
            if !allowed_origins.iter().any(|o| o == origin) {
                allowed_origins.push(origin.to_string());
            }
        }
        Self { allowed_origins }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
