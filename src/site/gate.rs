//! Hidden admin entry: a click sequence arms a key combo that opens the
//! login prompt, and a configured credential pair guards the panel.
//!
//! This is a convenience gate for a single operator, not identity management.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use base64::Engine as _;
use moka::sync::Cache;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;

/// Click counter plus armed flag for one browser.
#[derive(Debug, Clone)]
pub struct AdminGate {
    required_clicks: usize,
    window: Duration,
    clicks: VecDeque<Instant>,
    armed: bool,
}

impl AdminGate {
    pub fn new(required_clicks: usize, window: Duration) -> Self {
        Self {
            required_clicks: required_clicks.max(1),
            window,
            clicks: VecDeque::new(),
            armed: false,
        }
    }

    pub fn from_config(cfg: &AdminConfig) -> Self {
        Self::new(cfg.unlock_clicks, Duration::from_millis(cfg.unlock_window_ms))
    }

    /// Registers a click on the hidden control. Returns `true` when this click arms the combo.
    ///
    /// Only clicks inside the trailing window count; arming clears the history.
    pub fn click(&mut self, at: Instant) -> bool {
        while let Some(&oldest) = self.clicks.front() {
            if at.saturating_duration_since(oldest) >= self.window {
                self.clicks.pop_front();
            } else {
                break;
            }
        }
        self.clicks.push_back(at);
        if self.clicks.len() >= self.required_clicks {
            self.clicks.clear();
            self.armed = true;
            return true;
        }
        false
    }

    /// Returns `true` when the combo opens the login prompt; that also disarms.
    pub fn key_combo(&mut self, ctrl: bool, shift: bool, key: &str) -> bool {
        if self.armed && is_unlock_combo(ctrl, shift, key) {
            self.armed = false;
            return true;
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn pending_clicks(&self) -> usize {
        self.clicks.len()
    }
}

/// `Ctrl+Shift+M`, any letter case.
pub fn is_unlock_combo(ctrl: bool, shift: bool, key: &str) -> bool {
    ctrl && shift && key.eq_ignore_ascii_case("m")
}

/// The configured operator credential pair.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(cfg: &AdminConfig) -> Self {
        Self::new(cfg.username.clone(), cfg.password.clone())
    }

    /// Both fields are compared in constant time; an empty configured password never matches.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        if self.password.is_empty() {
            return false;
        }
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer tokens minted on login; each expires after `ttl` without use.
#[derive(Clone)]
pub struct AdminSessions {
    tokens: Cache<String, ()>,
}

impl AdminSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Cache::builder()
                .max_capacity(1024)
                .time_to_idle(ttl)
                .build(),
        }
    }

    pub fn issue(&self) -> String {
        // 256 bits => 43 chars base64url (no padding).
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        self.tokens.insert(token.clone(), ());
        token
    }

    pub fn validate(&self, token: &str) -> bool {
        self.tokens.get(token).is_some()
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.invalidate(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_rapid_clicks_arm_the_combo() {
        let mut gate = AdminGate::new(5, Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..4 {
            assert!(!gate.click(t0 + Duration::from_millis(i * 300)));
        }
        assert!(gate.click(t0 + Duration::from_millis(1500)));
        assert!(gate.is_armed());
        assert_eq!(gate.pending_clicks(), 0);
    }

    #[test]
    fn only_clicks_in_trailing_window_count() {
        let mut gate = AdminGate::new(5, Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..4 {
            gate.click(t0 + Duration::from_secs(i));
        }
        // The click at 0 s has left the window.
        assert!(!gate.click(t0 + Duration::from_millis(5500)));
        assert_eq!(gate.pending_clicks(), 4);

        // 1 s, 2 s, 3 s, 5.5 s and 5.9 s all fall within 5 s of the last click.
        assert!(gate.click(t0 + Duration::from_millis(5900)));
        assert!(gate.is_armed());
    }

    #[test]
    fn click_exactly_one_window_old_has_expired() {
        let mut gate = AdminGate::new(5, Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..4 {
            gate.click(t0 + Duration::from_secs(i));
        }
        assert!(!gate.click(t0 + Duration::from_secs(5)));
        assert!(!gate.is_armed());
        assert_eq!(gate.pending_clicks(), 4);

        // One millisecond inside the window still counts.
        let mut gate = AdminGate::new(5, Duration::from_secs(5));
        gate.click(t0);
        for i in 1..4 {
            gate.click(t0 + Duration::from_secs(i));
        }
        assert!(gate.click(t0 + Duration::from_millis(4999)));
    }

    #[test]
    fn stale_clicks_are_forgotten() {
        let mut gate = AdminGate::new(5, Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..4 {
            gate.click(t0 + Duration::from_secs(i));
        }
        assert!(!gate.click(t0 + Duration::from_secs(9)));
        assert_eq!(gate.pending_clicks(), 1);
        assert!(!gate.is_armed());
    }

    #[test]
    fn combo_requires_armed_gate_and_disarms() {
        let mut gate = AdminGate::new(1, Duration::from_secs(5));
        assert!(!gate.key_combo(true, true, "M"));

        gate.click(Instant::now());
        assert!(!gate.key_combo(true, false, "m"));
        assert!(gate.is_armed());
        assert!(gate.key_combo(true, true, "m"));
        assert!(!gate.is_armed());
        assert!(!gate.key_combo(true, true, "m"));
    }

    #[test]
    fn credentials_must_match_exactly() {
        let creds = AdminCredentials::new("admin", "s3cret");
        assert!(creds.verify("admin", "s3cret"));
        assert!(!creds.verify("admin", "s3cret "));
        assert!(!creds.verify("Admin", "s3cret"));
        assert!(!AdminCredentials::new("admin", "").verify("admin", ""));
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[test]
    fn issued_tokens_validate_until_revoked() {
        let sessions = AdminSessions::new(Duration::from_secs(60));
        let token = sessions.issue();
        assert_eq!(token.len(), 43);
        assert!(sessions.validate(&token));
        assert!(!sessions.validate("forged"));
        sessions.revoke(&token);
        assert!(!sessions.validate(&token));
    }
}
