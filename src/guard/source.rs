//! Source identifier extraction
//!
//! Resolves the identifier a request should be tracked under, looking past
//! the network-layer address to proxy-forwarded headers in priority order.
//! Pure function of request metadata; framework adapters hand in the header
//! values they have.

/// Resolve the source identifier for a request.
///
/// Priority: the first hop of a forwarded-for chain, then a real-ip header,
/// then the direct peer address, then `"unknown"`.
pub fn extract_source_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote_addr: Option<&str>,
) -> String {
    if let Some(chain) = forwarded_for {
        let first = chain.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(ip) = real_ip {
        let ip = ip.trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    remote_addr
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
