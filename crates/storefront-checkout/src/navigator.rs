//! Post-payment navigation

/// Performs the redirect after a confirmed payment
pub trait Navigator: Send + Sync {
    fn redirect(&self, url: &str);
}

/// Navigator that only logs the destination
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect(&self, url: &str) {
        tracing::info!(url, "Redirecting after payment");
    }
}
