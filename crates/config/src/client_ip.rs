/// Configuration for extracting the client IP from headers.
///
/// The extracted address keys the per-client rate limiters. Forwarding
/// headers are client-controlled unless a trusted proxy strips them; that
/// trust boundary is the deployment's to enforce.
#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Whether the X-Real-IP header should be used.
    pub x_real_ip: bool,
    /// How many trusted hops to skip when using the X-Forwarded-For header.
    /// If None, X-Forwarded-For is not used.
    pub x_forwarded_for_trusted_hops: Option<usize>,
}
