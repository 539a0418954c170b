// src/auth/mod.rs — Token verification boundary
//
// Token issuance lives elsewhere; this crate only consumes the contract
// `verify(token) -> user | reject`. The shipped implementation resolves
// bearer tokens against a static table from config.toml.

use crate::infra::config::ServerConfig;

/// The identity a verified token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
}

/// Collaborator contract: map a presented credential to a user, or reject.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<AuthUser>;
}

/// Verifier backed by a fixed token table.
pub struct StaticTokenVerifier {
    entries: Vec<(String, AuthUser)>,
}

impl StaticTokenVerifier {
    pub fn new(entries: Vec<(String, AuthUser)>) -> Self {
        Self { entries }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let entries = config
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    AuthUser {
                        user_id: t.user_id.clone(),
                        name: t.name.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<AuthUser> {
        if token.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(expected, _)| constant_time_eq(token.as_bytes(), expected.as_bytes()))
            .map(|(_, user)| user.clone())
    }
}

/// Constant-time byte comparison to prevent timing attacks on token auth.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
