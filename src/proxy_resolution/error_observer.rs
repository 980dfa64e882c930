use std::sync::Arc;

/// Receives errors raised while a PAC script runs.
///
/// Equivalent to Chromium's `ProxyResolverErrorObserver`. Errors are
/// informational; they never change the outcome of a resolution.
pub trait ProxyResolverErrorObserver: Send + Sync {
    /// `line_number` is 1-based, or `-1` when the engine does not know it.
    fn on_pac_script_error(&self, line_number: i32, error: &str);
}

/// Creates one observer per resolver. Each created resolver (and every
/// resolve request it serves) reports to the observer made for it.
pub type ErrorObserverFactory = Arc<dyn Fn() -> Arc<dyn ProxyResolverErrorObserver> + Send + Sync>;

impl<F> ProxyResolverErrorObserver for F
where
    F: Fn(i32, &str) + Send + Sync,
{
    fn on_pac_script_error(&self, line_number: i32, error: &str) {
        self(line_number, error)
    }
}
