use std::time::Duration;

/// Tunable knobs for a [`crate::MessageCoordinator`] and the transport it's
/// paired with. Grounded on `xzatoma::config`'s small typed-config-struct
/// pattern (plain fields, a `Default` impl, no builder-of-a-builder).
///
/// The coordinator doesn't own a channel itself, so
/// `inbound_channel_capacity` is advisory: it's the value this workspace's
/// transports (`mcp-stdio-transport::StdioTransport::with_capacity`) are
/// expected to size their inbound buffer to, so one config travels from the
/// CLI down to both the coordinator and the transport it's driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Timeout applied by
    /// [`crate::MessageCoordinator::send_request_with_default_timeout`] when
    /// a caller doesn't need a bespoke timeout per call.
    pub default_request_timeout: Duration,
    /// Suggested bound on in-flight decoded frames between a transport's
    /// reader task and `next_message`.
    pub inbound_channel_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_request_timeout: Duration::from_secs(30),
            inbound_channel_capacity: 128,
        }
    }
}
