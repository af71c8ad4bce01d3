//! Return-target resolution — where the provider sends the user back to.

use crate::navigation::{RoutePolicy, sanitize_redirect};

/// Where the connect action was invoked from.
#[derive(Debug, Clone)]
pub struct ConnectContext<'a> {
    /// Path of the screen currently showing.
    pub current_path: &'a str,
    /// Raw `redirect=` query parameter, if any.
    pub explicit_redirect: Option<&'a str>,
    /// Whether the current user has completed onboarding.
    pub onboarding_completed: bool,
}

/// Resolve the post-authorization return target.
///
/// Precedence: a validated explicit redirect hint; inside the onboarding flow,
/// the next onboarding step (carrying a pending hint through as its own
/// `redirect=` parameter); the integrations settings page for onboarded
/// users; otherwise the first onboarding step. Malformed hints are ignored.
pub fn resolve_return_target(policy: &RoutePolicy, ctx: &ConnectContext<'_>) -> String {
    let hint = sanitize_redirect(ctx.explicit_redirect);

    if policy.in_onboarding(ctx.current_path) {
        if let Some(next) = policy.next_onboarding_step(ctx.current_path) {
            return match hint {
                Some(h) => {
                    let carried: String = url::form_urlencoded::Serializer::new(String::new())
                        .append_pair("redirect", h)
                        .finish();
                    format!("{next}?{carried}")
                }
                None => next.to_string(),
            };
        }
        // Past the last step: fall through to the non-onboarding targets.
    }

    if let Some(h) = hint {
        return h.to_string();
    }
    if ctx.onboarding_completed {
        return policy.integrations_path.clone();
    }
    policy.onboarding_entry().to_string()
}
