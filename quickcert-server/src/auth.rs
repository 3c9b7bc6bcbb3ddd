//! Access policy for the client and admin routes.

use crate::config::{AdminToken, SecuritySection};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::net::IpAddr;

/// Header carrying client and admin tokens.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
/// Header carrying the per-process runtime code.
pub const RUNTIME_CODE_HEADER: &str = "x-runtime-code";

#[derive(Debug, Clone, PartialEq, Eq)]
enum IpRule {
    Any,
    Exact(IpAddr),
}

/// Decides who may call which routes.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed_ips: Vec<IpRule>,
    client_tokens: Vec<String>,
    admin_tokens: Vec<AdminToken>,
    runtime_code: Option<String>,
}

impl AccessPolicy {
    /// Builds the policy from validated config. `runtime_code` is `None`
    /// when runtime codes are disabled.
    pub fn new(security: &SecuritySection, runtime_code: Option<String>) -> Self {
        let allowed_ips = security
            .allowed_ips
            .iter()
            .filter_map(|entry| match entry.as_str() {
                "*" => Some(IpRule::Any),
                other => other.parse().ok().map(|ip: IpAddr| IpRule::Exact(ip.to_canonical())),
            })
            .collect();

        Self {
            allowed_ips,
            client_tokens: security.client_auth_tokens.clone(),
            admin_tokens: security.admin_tokens.clone(),
            runtime_code,
        }
    }

    pub fn ip_allowed(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.allowed_ips.iter().any(|rule| match rule {
            IpRule::Any => true,
            IpRule::Exact(allowed) => *allowed == ip,
        })
    }

    /// Whether an empty token entry lets any non-empty token through.
    pub fn accepts_any_client_token(&self) -> bool {
        self.client_tokens.iter().any(String::is_empty)
    }

    /// A token is always required; an empty entry in the list only waives
    /// which one.
    pub fn client_allowed(&self, token: Option<&str>) -> bool {
        match token {
            Some(token) if !token.is_empty() => {
                self.accepts_any_client_token() || self.client_tokens.iter().any(|t| t == token)
            }
            _ => false,
        }
    }

    /// Name of the admin owning `token`, if any.
    pub fn admin_name(&self, token: Option<&str>) -> Option<&str> {
        let token = token.filter(|t| !t.is_empty())?;
        self.admin_tokens
            .iter()
            .find(|admin| admin.token == token)
            .map(|admin| admin.name.as_str())
    }

    /// Always true when runtime codes are disabled.
    pub fn runtime_code_ok(&self, code: Option<&str>) -> bool {
        match &self.runtime_code {
            None => true,
            Some(expected) => code == Some(expected.as_str()),
        }
    }

    pub fn runtime_code(&self) -> Option<&str> {
        self.runtime_code.as_deref()
    }
}

/// Random alphanumeric code handed to operators at startup.
pub fn generate_runtime_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security() -> SecuritySection {
        SecuritySection {
            allowed_ips: vec!["127.0.0.1".into(), "::1".into()],
            client_auth_tokens: vec!["client-a".into(), "client-b".into()],
            admin_tokens: vec![AdminToken {
                name: "root".into(),
                token: "admin-secret".into(),
            }],
            use_runtime_code: true,
            runtime_code_length: 8,
        }
    }

    #[test]
    fn ip_rules() {
        let policy = AccessPolicy::new(&security(), None);
        assert!(policy.ip_allowed("127.0.0.1".parse().unwrap()));
        assert!(policy.ip_allowed("::ffff:127.0.0.1".parse().unwrap()));
        assert!(policy.ip_allowed("::1".parse().unwrap()));
        assert!(!policy.ip_allowed("10.0.0.1".parse().unwrap()));

        let mut open = security();
        open.allowed_ips = vec!["*".into()];
        assert!(AccessPolicy::new(&open, None).ip_allowed("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn client_tokens() {
        let policy = AccessPolicy::new(&security(), None);
        assert!(policy.client_allowed(Some("client-b")));
        assert!(!policy.client_allowed(Some("nope")));
        assert!(!policy.client_allowed(Some("")));
        assert!(!policy.client_allowed(None));
    }

    #[test]
    fn empty_client_token_accepts_any_token() {
        let mut open = security();
        open.client_auth_tokens.push(String::new());
        let policy = AccessPolicy::new(&open, None);
        assert!(policy.accepts_any_client_token());
        assert!(policy.client_allowed(Some("whatever")));
        assert!(!policy.client_allowed(Some("")));
        assert!(!policy.client_allowed(None));
    }

    #[test]
    fn admin_lookup() {
        let policy = AccessPolicy::new(&security(), None);
        assert_eq!(policy.admin_name(Some("admin-secret")), Some("root"));
        assert_eq!(policy.admin_name(Some("client-a")), None);
        assert_eq!(policy.admin_name(None), None);
    }

    #[test]
    fn runtime_code_check() {
        let policy = AccessPolicy::new(&security(), Some("Ab12Cd34".into()));
        assert!(policy.runtime_code_ok(Some("Ab12Cd34")));
        assert!(!policy.runtime_code_ok(Some("ab12cd34")));
        assert!(!policy.runtime_code_ok(None));
        assert!(AccessPolicy::new(&security(), None).runtime_code_ok(None));
    }

    #[test]
    fn runtime_codes_are_alphanumeric() {
        let code = generate_runtime_code(12);
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
