//! Kernel and security events
//!
//! Events are delivered synchronously to an [`EventSink`] handed to the
//! components that emit them. [`LogEventSink`] forwards them to the `log`
//! facade; [`MemoryEventSink`] records them for inspection.

use std::sync::Mutex;

use crate::security::context::MatchedAccessControlRule;

pub const KERNEL_REQUEST: &str = "kernel.request";
pub const KERNEL_RESPONSE: &str = "kernel.response";
pub const KERNEL_EXCEPTION: &str = "kernel.exception";
pub const AUTHORIZATION_GRANTED: &str = "security.authorization.granted";
pub const AUTHORIZATION_DENIED: &str = "security.authorization.denied";
pub const LOGIN_SUCCESS: &str = "security.login.success";
pub const LOGIN_FAILURE: &str = "security.login.failure";
pub const LOGOUT_SUCCESS: &str = "security.logout.success";
pub const LOGOUT_FAILURE: &str = "security.logout.failure";

/// Payload of the authorization events
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationEvent {
    pub firewall: Option<String>,
    pub path: String,
    pub user_identifier: String,
    pub attributes: Vec<String>,
    pub matched_rule: Option<MatchedAccessControlRule>,
    /// Why access was denied, for denial events
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    KernelRequest { method: String, path: String },
    KernelResponse { path: String, status: u16 },
    KernelException { path: String, status: u16, message: String },
    AuthorizationGranted(AuthorizationEvent),
    AuthorizationDenied(AuthorizationEvent),
    LoginSuccess { path: String, user_identifier: String },
    LoginFailure { path: String, reason: String },
    LogoutSuccess { path: String },
    LogoutFailure { path: String, reason: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::KernelRequest { .. } => KERNEL_REQUEST,
            Event::KernelResponse { .. } => KERNEL_RESPONSE,
            Event::KernelException { .. } => KERNEL_EXCEPTION,
            Event::AuthorizationGranted(_) => AUTHORIZATION_GRANTED,
            Event::AuthorizationDenied(_) => AUTHORIZATION_DENIED,
            Event::LoginSuccess { .. } => LOGIN_SUCCESS,
            Event::LoginFailure { .. } => LOGIN_FAILURE,
            Event::LogoutSuccess { .. } => LOGOUT_SUCCESS,
            Event::LogoutFailure { .. } => LOGOUT_FAILURE,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: &Event);
}

/// Writes events through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn dispatch(&self, event: &Event) {
        match event {
            Event::KernelRequest { method, path } => {
                log::debug!("{} {} {}", event.name(), method, path)
            }
            Event::KernelResponse { path, status } => {
                log::debug!("{} {} -> {}", event.name(), path, status)
            }
            Event::KernelException { path, status, message } => {
                log::warn!("{} {} -> {}: {}", event.name(), path, status, message)
            }
            Event::AuthorizationGranted(auth) => log::info!(
                "{} user='{}' path={} attributes={:?}",
                event.name(),
                auth.user_identifier,
                auth.path,
                auth.attributes
            ),
            Event::AuthorizationDenied(auth) => log::warn!(
                "{} user='{}' path={} attributes={:?} reason={}",
                event.name(),
                auth.user_identifier,
                auth.path,
                auth.attributes,
                auth.reason.as_deref().unwrap_or("-")
            ),
            Event::LoginSuccess { path, user_identifier } => {
                log::info!("{} user='{}' path={}", event.name(), user_identifier, path)
            }
            Event::LoginFailure { path, reason } | Event::LogoutFailure { path, reason } => {
                log::warn!("{} path={} reason={}", event.name(), path, reason)
            }
            Event::LogoutSuccess { path } => log::info!("{} path={}", event.name(), path),
        }
    }
}

/// Keeps every dispatched event in memory
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::name).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MemoryEventSink {
    fn dispatch(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = Event::LoginFailure { path: "/login".into(), reason: "bad key".into() };
        assert_eq!(event.name(), "security.login.failure");
        let event = Event::KernelRequest { method: "GET".into(), path: "/".into() };
        assert_eq!(event.name(), "kernel.request");
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        sink.dispatch(&Event::KernelRequest { method: "GET".into(), path: "/".into() });
        sink.dispatch(&Event::KernelResponse { path: "/".into(), status: 200 });
        assert_eq!(sink.names(), vec![KERNEL_REQUEST, KERNEL_RESPONSE]);
        sink.clear();
        assert!(sink.events().is_empty());
    }
}
