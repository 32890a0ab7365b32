use crate::config::AppConfig;
use anyhow::{Context as AnyhowContext, Result};
use std::fmt;
use std::net::SocketAddr;

/// Shared secret a client must present as `Authorization: Bearer <secret>`.
#[derive(Clone)]
pub(crate) struct BearerToken(String);

impl BearerToken {
    /// Surrounding whitespace is ignored; a blank secret is no secret.
    pub(crate) fn new(secret: &str) -> Option<Self> {
        let secret = secret.trim();
        (!secret.is_empty()).then(|| Self(secret.to_string()))
    }

    pub(crate) fn accepts(&self, header: &str) -> bool {
        header
            .trim()
            .strip_prefix("Bearer ")
            .is_some_and(|presented| same_secret(presented.trim(), &self.0))
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Listen address and access rule for `serve-http`, after config layers and flags.
#[derive(Debug)]
pub(crate) struct ServePlan {
    pub bind: String,
    pub addrs: Vec<SocketAddr>,
    pub public: bool,
    pub token: Option<BearerToken>,
}

impl ServePlan {
    /// `--bind`/`--auth-token` win over the `[server]` config section and `DIACARE_AUTH_TOKEN`.
    pub(crate) async fn resolve(
        config: &AppConfig,
        bind_flag: Option<&str>,
        token_flag: Option<&str>,
        public: bool,
    ) -> Result<Self> {
        let token = match token_flag {
            Some(flag) => Some(BearerToken::new(flag).context("--auth-token is blank")?),
            None => config.auth_token.as_deref().and_then(BearerToken::new),
        };
        let bind = bind_flag.unwrap_or(&config.bind).to_string();
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind.as_str())
            .await
            .with_context(|| format!("Cannot resolve bind address {bind}"))?
            .collect();
        check_exposure(&bind, &addrs, public, token.is_some())?;
        Ok(Self {
            bind,
            addrs,
            public,
            token,
        })
    }
}

/// Loopback-only unless `--public`; `--public` only with a token.
fn check_exposure(bind: &str, addrs: &[SocketAddr], public: bool, has_token: bool) -> Result<()> {
    if addrs.is_empty() {
        anyhow::bail!("{bind} did not resolve to any address");
    }
    if let Some(exposed) = addrs.iter().find(|addr| !addr.ip().is_loopback()) {
        if !public {
            anyhow::bail!(
                "Refusing to bind {bind}: {exposed} is reachable from other hosts. \
                 Pass --public together with an auth token to serve beyond localhost."
            );
        }
    }
    if public && !has_token {
        anyhow::bail!(
            "--public requires an auth token: set --auth-token, server.auth_token or DIACARE_AUTH_TOKEN"
        );
    }
    Ok(())
}

/// Compares every byte so the time taken does not depend on where a mismatch is.
fn same_secret(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(text: &str) -> SocketAddr {
        text.parse().unwrap()
    }

    #[test]
    fn bearer_token_matches_only_the_bearer_scheme() {
        let token = BearerToken::new("  s3cret ").unwrap();
        assert!(token.accepts("Bearer s3cret"));
        assert!(token.accepts(" Bearer  s3cret "));
        assert!(!token.accepts("s3cret"));
        assert!(!token.accepts("Basic s3cret"));
        assert!(!token.accepts("Bearer s3cre"));
        assert!(!token.accepts("Bearer s3cret2"));
        assert_eq!(format!("{token:?}"), "BearerToken(<redacted>)");
    }

    #[test]
    fn blank_secret_is_no_token() {
        assert!(BearerToken::new("").is_none());
        assert!(BearerToken::new("   ").is_none());
    }

    #[test]
    fn exposure_rules() {
        let local = [addr("127.0.0.1:7700")];
        let wide = [addr("0.0.0.0:7700")];

        check_exposure("local", &local, false, false).unwrap();
        check_exposure("wide", &wide, true, true).unwrap();

        let err = check_exposure("wide", &wide, false, true).unwrap_err();
        assert!(err.to_string().starts_with("Refusing to bind wide"));
        let err = check_exposure("wide", &wide, true, false).unwrap_err();
        assert!(err.to_string().contains("--public requires an auth token"));
        assert!(check_exposure("none", &[], false, false).is_err());
    }

    #[tokio::test]
    async fn flag_token_overrides_config_and_blank_flag_fails() {
        let config = AppConfig {
            auth_token: Some("from-config".to_string()),
            ..AppConfig::default()
        };

        let plan = ServePlan::resolve(&config, Some("127.0.0.1:0"), None, false)
            .await
            .unwrap();
        assert!(plan.token.unwrap().accepts("Bearer from-config"));

        let plan = ServePlan::resolve(&config, Some("127.0.0.1:0"), Some("from-flag"), false)
            .await
            .unwrap();
        assert!(plan.token.unwrap().accepts("Bearer from-flag"));

        let err = ServePlan::resolve(&config, Some("127.0.0.1:0"), Some(" "), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "--auth-token is blank");
    }
}
