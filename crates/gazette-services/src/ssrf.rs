//! Guard against server-side request forgery through caller-supplied primary URLs.
//!
//! A URL is rejected when its scheme is not http(s), its host is outside the
//! configured allowlist, or its host (literal or resolved) is private.

use reqwest::Url;
use std::net::{IpAddr, Ipv6Addr};
use thiserror::Error;
use tokio::net::lookup_host;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlRejected {
    #[error("URL must start with http:// or https://")]
    Scheme,

    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL hostname '{0}' is not in the allowed list")]
    NotAllowed(String),

    #[error("Private/internal IP addresses are not allowed")]
    PrivateAddress,

    #[error("Localhost and internal hostnames are not allowed")]
    InternalHost,

    #[error("Hostname resolves to private/internal IP address: {0}")]
    ResolvesPrivate(IpAddr),
}

/// Validate a primary URL before it is fetched, returning it in normalized form.
///
/// `allowlist` entries match the host exactly or as a parent domain
/// (`cdn.example.com` matches `example.com`). A DNS lookup failure is logged and
/// tolerated; the fetch itself will fail and fall through to the legacy store.
pub async fn validate_url_for_ssrf(
    url: &str,
    allow_private_hosts: bool,
    allowlist: Option<&[String]>,
) -> Result<Url, UrlRejected> {
    let parsed = Url::parse(url).map_err(|e| UrlRejected::Malformed(e.to_string()))?;
    check_url(&parsed, allow_private_hosts, allowlist)?;

    if allow_private_hosts {
        return Ok(parsed);
    }

    let host = normalized_host(&parsed)?;
    if host.parse::<IpAddr>().is_ok() {
        return Ok(parsed);
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    match lookup_host((host.as_str(), port)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_private_ip(&addr.ip()) {
                    return Err(UrlRejected::ResolvesPrivate(addr.ip()));
                }
            }
        }
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "Failed to resolve primary host for SSRF validation");
        }
    }

    Ok(parsed)
}

/// Checks that need no DNS lookup: scheme, allowlist, IP literals and internal names.
///
/// Also applied to every redirect hop the primary fetcher follows.
pub fn check_url(
    url: &Url,
    allow_private_hosts: bool,
    allowlist: Option<&[String]>,
) -> Result<(), UrlRejected> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlRejected::Scheme);
    }

    let host = normalized_host(url)?;

    if let Some(allowed) = allowlist {
        let is_allowed = allowed.iter().any(|domain| {
            let domain = domain.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        });
        if !is_allowed {
            return Err(UrlRejected::NotAllowed(host));
        }
    }

    if allow_private_hosts {
        return Ok(());
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(UrlRejected::PrivateAddress);
        }
        return Ok(());
    }

    if is_internal_hostname(&host) {
        return Err(UrlRejected::InternalHost);
    }

    Ok(())
}

fn normalized_host(url: &Url) -> Result<String, UrlRejected> {
    let host = url.host_str().ok_or(UrlRejected::MissingHost)?;
    Ok(host.trim_start_matches('[').trim_end_matches(']').to_lowercase())
}

fn is_internal_hostname(host: &str) -> bool {
    host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".corp")
}

/// Loopback, private, link-local, multicast and reserved ranges for v4 and v6.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_private()
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_multicast()
                || ipv4.is_broadcast()
                || octets[0] == 0
                // 100.64.0.0/10 carrier-grade NAT
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}
