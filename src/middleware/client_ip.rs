use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Resolve the address a request should be attributed to.
pub fn client_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>, trusted_proxies: &[IpNet]) -> IpAddr {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));
    let is_proxy = |ip: &IpAddr| trusted_proxies.iter().any(|net| net.contains(ip));

    // X-Forwarded-For only counts when the peer itself is a trusted proxy
    if !is_proxy(&peer) {
        return peer;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| {
            xff.split(',')
                .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
                .find(|ip| !is_proxy(ip))
        })
        .unwrap_or(peer)
}
