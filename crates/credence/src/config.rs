//! Configuration for the trust core actor.

/// Tunables for [`crate::TrustCore`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Save the graph to the substrate during shutdown.
    pub save_on_shutdown: bool,

    /// Depth of the actor's request queue. Senders yield when it fills;
    /// requests are never dropped.
    pub request_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            save_on_shutdown: true,
            request_capacity: 64,
        }
    }
}
