// ABOUTME: Host identity providers: outbound IP, external IP, hostname, OS/arch
// ABOUTME: Each provider returns a readable placeholder instead of failing

use slagobot_core::HostIdentity;
use std::time::Duration;
use tokio::net::UdpSocket;

pub const OUTBOUND_IP_UNAVAILABLE: &str = "Can't obtain the outbound IP address";
pub const EXTERNAL_IP_UNAVAILABLE: &str = "Can't obtain the external IP address";
pub const EXTERNAL_IP_UNREADABLE: &str = "Can't read response body";
pub const HOSTNAME_UNAVAILABLE: &str = "can't obtain hostname";

/// Public echo service returning the caller's address as plain text
const EXTERNAL_IP_URL: &str = "http://checkip.amazonaws.com";
/// Address used to pick the preferred outbound interface; nothing is sent
const OUTBOUND_PROBE_ADDR: &str = "8.8.8.8:80";
const EXTERNAL_IP_TIMEOUT: Duration = Duration::from_secs(10);

/// Local address of the interface the OS would route public traffic through
pub async fn outbound_ip() -> String {
    let probe = async {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(OUTBOUND_PROBE_ADDR).await?;
        socket.local_addr()
    };
    match probe.await {
        Ok(addr) => addr.ip().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Getting outbound address failed");
            OUTBOUND_IP_UNAVAILABLE.to_string()
        }
    }
}

/// Public address as seen by checkip.amazonaws.com
pub async fn external_ip() -> String {
    let client = match reqwest::Client::builder()
        .timeout(EXTERNAL_IP_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build HTTP client");
            return EXTERNAL_IP_UNAVAILABLE.to_string();
        }
    };

    let resp = match client.get(EXTERNAL_IP_URL).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, url = EXTERNAL_IP_URL, "External IP request failed");
            return EXTERNAL_IP_UNAVAILABLE.to_string();
        }
    };

    match resp.text().await {
        Ok(body) => parse_external_ip(&body),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read external IP response body");
            EXTERNAL_IP_UNREADABLE.to_string()
        }
    }
}

/// Trim the echo service's response body
pub fn parse_external_ip(body: &str) -> String {
    body.trim().to_string()
}

pub fn hostname() -> String {
    match gethostname::gethostname().into_string() {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => HOSTNAME_UNAVAILABLE.to_string(),
        Err(raw) => {
            tracing::warn!(hostname = ?raw, "Hostname is not valid UTF-8");
            HOSTNAME_UNAVAILABLE.to_string()
        }
    }
}

/// `os/arch` of the running binary, e.g. `linux/x86_64`
pub fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Query every provider once
pub async fn gather() -> HostIdentity {
    let (outbound_ip, external_ip) = tokio::join!(outbound_ip(), external_ip());
    HostIdentity {
        outbound_ip,
        external_ip,
        hostname: hostname(),
        platform: platform(),
    }
}
