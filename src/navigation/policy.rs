//! Route classification — which paths need auth, which belong to onboarding.

/// The route table the guard evaluates against.
///
/// Defaults match the dashboard shell; every field is overridable so hosts
/// and tests can fabricate their own layouts.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub login_path: String,
    pub signup_path: String,
    /// Default post-login destination.
    pub home_path: String,
    /// Integration management screen for fully onboarded users.
    pub integrations_path: String,
    /// Path namespace of the first-run setup flow.
    pub onboarding_prefix: String,
    /// Ordered onboarding steps; the first is the flow entry.
    pub onboarding_steps: Vec<String>,
    /// Paths reachable without authentication.
    pub public_paths: Vec<String>,
    /// Paths a signed-in but not-yet-onboarded user may still visit.
    pub onboarding_exempt: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            signup_path: "/signup".to_string(),
            home_path: "/home".to_string(),
            integrations_path: "/settings/integrations".to_string(),
            onboarding_prefix: "/onboarding".to_string(),
            onboarding_steps: vec![
                "/onboarding/connect".to_string(),
                "/onboarding/preferences".to_string(),
                "/onboarding/import".to_string(),
            ],
            public_paths: vec!["/".to_string(), "/login".to_string(), "/signup".to_string()],
            onboarding_exempt: vec!["/".to_string()],
        }
    }
}

impl RoutePolicy {
    /// Entry point of the onboarding flow (the first step).
    pub fn onboarding_entry(&self) -> &str {
        self.onboarding_steps
            .first()
            .map(String::as_str)
            .unwrap_or(&self.onboarding_prefix)
    }

    /// The step after `current`, if `current` is a step and not the last one.
    pub fn next_onboarding_step(&self, current: &str) -> Option<&str> {
        let index = self.onboarding_steps.iter().position(|s| s == current)?;
        self.onboarding_steps.get(index + 1).map(String::as_str)
    }

    /// Whether `path` is a login/signup entry point.
    pub fn is_auth_entry(&self, path: &str) -> bool {
        path == self.login_path || path == self.signup_path
    }

    /// Whether `path` is reachable without authentication.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    pub fn requires_auth(&self, path: &str) -> bool {
        !self.is_public(path)
    }

    /// Whether `path` lives under the onboarding namespace.
    pub fn in_onboarding(&self, path: &str) -> bool {
        path == self.onboarding_prefix
            || path
                .strip_prefix(&self.onboarding_prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Whether a not-yet-onboarded user may visit `path` anyway.
    pub fn is_onboarding_exempt(&self, path: &str) -> bool {
        self.onboarding_exempt.iter().any(|p| p == path)
    }

    /// Whether `path` demands a completed onboarding flow.
    pub fn requires_onboarding(&self, path: &str) -> bool {
        self.requires_auth(path) && !self.in_onboarding(path) && !self.is_onboarding_exempt(path)
    }
}
