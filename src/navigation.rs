use serde_json::Value;
use tracing::info;

/// Screen the user is sent to when the session ends
pub const AUTH_SCREEN: &str = "Auth";
/// Screen showing a single product
pub const DETAILS_SCREEN: &str = "Details";

/// Navigation stack of the host UI
pub trait Navigator: Send + Sync {
    /// Replace the current screen
    fn navigate_replace(&self, screen: &str);

    /// Push a screen with parameters
    fn navigate(&self, screen: &str, params: Value);
}

/// Navigator for headless use: records the requested screen in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_replace(&self, screen: &str) {
        info!(screen = %screen, "Navigation replaced");
    }

    fn navigate(&self, screen: &str, params: Value) {
        info!(screen = %screen, params = %params, "Navigation pushed");
    }
}

/// Navigator that remembers every call, for tests
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    calls: std::sync::Mutex<Vec<(String, Option<Value>)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigations so far; replacements carry no params
    pub fn calls(&self) -> Vec<(String, Option<Value>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// How many times `screen` was navigated to
    pub fn count(&self, screen: &str) -> usize {
        self.calls().iter().filter(|(s, _)| s == screen).count()
    }

    fn record(&self, screen: &str, params: Option<Value>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((screen.to_string(), params));
        }
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_replace(&self, screen: &str) {
        self.record(screen, None);
    }

    fn navigate(&self, screen: &str, params: Value) {
        self.record(screen, Some(params));
    }
}
