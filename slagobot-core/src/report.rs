// ABOUTME: Status report template filled from host identity and current latency
// ABOUTME: Pure formatting, no side effects

/// Host identity strings gathered once at startup.
///
/// Each field may hold a human-readable failure placeholder instead of a real
/// value; it is displayed verbatim either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub outbound_ip: String,
    pub external_ip: String,
    pub hostname: String,
    /// `os/arch`
    pub platform: String,
}

impl HostIdentity {
    /// Render the full status report with the given latency display string
    pub fn report(&self, latency: &str) -> String {
        format_report(
            &self.outbound_ip,
            &self.external_ip,
            &self.hostname,
            latency,
            &self.platform,
        )
    }
}

/// Fill the five-line status template. Field order is fixed.
pub fn format_report(
    outbound_ip: &str,
    external_ip: &str,
    hostname: &str,
    latency: &str,
    platform: &str,
) -> String {
    format!(
        "\n_My outbound IP is_: *{}*\n_My external IP is_: *{}*\n_My hostname is_: *{}*\n_My latency is_: *{}*\n_Runtime OS/Arch_: *{}*",
        outbound_ip, external_ip, hostname, latency, platform
    )
}
