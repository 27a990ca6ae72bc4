//! Gateway environments and fixed network endpoints

/// Production push gateway host
pub const PUSH_HOST: &str = "gateway.push.apple.com";
/// Sandbox push gateway host
pub const SANDBOX_PUSH_HOST: &str = "gateway.sandbox.push.apple.com";
/// Push gateway port, both environments
pub const PUSH_PORT: u16 = 2195;

/// Production feedback service host
pub const FEEDBACK_HOST: &str = "feedback.push.apple.com";
/// Sandbox feedback service host
pub const SANDBOX_FEEDBACK_HOST: &str = "feedback.sandbox.push.apple.com";
/// Feedback service port, both environments
pub const FEEDBACK_PORT: u16 = 2196;

/// Deployment target for a push or feedback session.
///
/// `Auto` is resolved to a concrete environment once, at connect time, from
/// the credential's embedded entitlement; it is never re-evaluated for the
/// lifetime of the session, including across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Auto,
    Production,
    Sandbox,
}

impl Environment {
    /// Push gateway host for a resolved environment. Callers resolve `Auto`
    /// before selecting a host.
    pub fn push_host(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_PUSH_HOST,
            _ => PUSH_HOST,
        }
    }

    /// Feedback service host for a resolved environment.
    pub fn feedback_host(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_FEEDBACK_HOST,
            _ => FEEDBACK_HOST,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Auto => "auto",
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_hosts() {
        assert_eq!(Environment::Production.push_host(), "gateway.push.apple.com");
        assert_eq!(
            Environment::Sandbox.push_host(),
            "gateway.sandbox.push.apple.com"
        );
        assert_eq!(
            Environment::Production.feedback_host(),
            "feedback.push.apple.com"
        );
        assert_eq!(
            Environment::Sandbox.feedback_host(),
            "feedback.sandbox.push.apple.com"
        );
    }

    #[test]
    fn test_ports_are_distinct_per_service() {
        assert_eq!(PUSH_PORT, 2195);
        assert_eq!(FEEDBACK_PORT, 2196);
    }
}
