//! Overlay configuration text rendering
//!
//! Pure, line-oriented transforms over the two daemon configurations: the
//! WireGuard interface text and the dnsmasq aliasing text. Each service owns
//! at most one marker-delimited block per text; adding and removing blocks
//! are exact inverses, and removal of an absent or unmatched block is a
//! no-op rather than an error.

use crate::request::Peer;
use std::net::Ipv4Addr;

/// Marker prefix opening a service block
pub const START_MARKER_PREFIX: &str = "###START_BLOCK_";

/// Marker prefix closing a service block
pub const STOP_MARKER_PREFIX: &str = "###STOP_BLOCK_";

/// WireGuard listen port baked into the baseline interface
pub const WG_LISTEN_PORT: u16 = 51820;

/// Upstream resolver used by the baseline dnsmasq configuration
pub const BASELINE_RESOLVER: &str = "8.8.8.8";

/// Start marker line for a service
pub fn start_marker(service_id: &str) -> String {
    format!("{}{}", START_MARKER_PREFIX, service_id)
}

/// Stop marker line for a service
pub fn stop_marker(service_id: &str) -> String {
    format!("{}{}", STOP_MARKER_PREFIX, service_id)
}

/// Append a new server address to the interface `Address` directive
///
/// Finds the line starting with `Address` and appends `, <addr>/24` unless
/// that address is already listed, so retried creations do not duplicate it.
/// All other lines pass through untouched.
pub fn append_master_address(text: &str, addr: Ipv4Addr) -> String {
    let entry = format!("{}/24", addr);
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with("Address") && !line.contains(&entry) {
                format!("{}, {}", line, entry)
            } else {
                line.to_string()
            }
        })
        .collect();

    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Append a marker-delimited service block to a configuration text
///
/// Renders one entry per non-master peer using the supplied renderer; the
/// master peer's address is merged into the interface `Address` line
/// separately. Rendered entries must be newline-terminated.
pub fn add_service_block<F>(text: &str, service_id: &str, peers: &[Peer], render: F) -> String
where
    F: Fn(&Peer) -> String,
{
    let mut out = String::with_capacity(text.len() + 128);
    out.push_str(text);
    out.push('\n');
    out.push_str(&start_marker(service_id));
    out.push('\n');
    for peer in peers.iter().filter(|p| !p.is_master) {
        out.push_str(&render(peer));
    }
    out.push_str(&stop_marker(service_id));
    out
}

/// Remove a service's block from a configuration text
///
/// Two-pass scan: locate the first line that is exactly the start marker,
/// then the first line at or after it that is exactly the stop marker, and
/// drop that inclusive range. Markers match whole lines so an id that is a
/// prefix of another (`s1` vs `s10`) can never splice out the longer id's
/// block. When either marker is missing the input is returned unchanged;
/// deleting an absent block is not an error, and unmatched markers must
/// never destroy unrelated lines.
pub fn remove_service_block(text: &str, service_id: &str) -> String {
    let start = start_marker(service_id);
    let stop = stop_marker(service_id);

    let lines: Vec<&str> = text.lines().collect();
    let Some(start_idx) = lines.iter().position(|l| l.trim() == start) else {
        return text.to_string();
    };
    let Some(stop_offset) = lines[start_idx..].iter().position(|l| l.trim() == stop) else {
        return text.to_string();
    };

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    kept.extend_from_slice(&lines[..start_idx]);
    kept.extend_from_slice(&lines[start_idx + stop_offset + 1..]);

    let mut out = kept.join("\n");
    if text.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Render one peer as a WireGuard `[Peer]` stanza
pub fn render_wireguard_peer(peer: &Peer) -> String {
    format!(
        "[Peer] #{}\nPublicKey = {}\nAllowedIPs = {}/32\n",
        peer.name, peer.public_key, peer.overlay_ip
    )
}

/// Render one peer as a dnsmasq address alias
pub fn render_dns_alias(peer: &Peer) -> String {
    format!("address=/{}/{}\n", peer.name, peer.overlay_ip)
}

/// Canonical WireGuard interface configuration used on full reset
///
/// Single interface stanza with the fixed forwarding and NAT directives the
/// mesh daemon ships with.
pub fn baseline_interface(server_addr: Ipv4Addr, private_key: &str) -> String {
    format!(
        "[Interface]\n\
         Address = {}/24\n\
         ListenPort = {}\n\
         PrivateKey = {}\n\
         PostUp = iptables -A FORWARD -i wg0 -j ACCEPT; iptables -t nat -A POSTROUTING -o eth0 -j MASQUERADE\n\
         PostDown = iptables -D FORWARD -i wg0 -j ACCEPT; iptables -t nat -D POSTROUTING -o eth0 -j MASQUERADE\n",
        server_addr, WG_LISTEN_PORT, private_key
    )
}

/// Canonical dnsmasq configuration used on full reset
pub fn baseline_dns() -> String {
    format!("server={}\n", BASELINE_RESOLVER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, ip: &str, is_master: bool) -> Peer {
        Peer {
            name: name.to_string(),
            public_key: format!("{}-pubkey", name),
            overlay_ip: ip.parse().unwrap(),
            is_master,
        }
    }

    #[test]
    fn test_append_master_address() {
        let text = "[Interface]\nAddress = 10.13.0.1/24\nListenPort = 51820\n";
        let out = append_master_address(text, "10.13.13.1".parse().unwrap());
        assert!(out.contains("Address = 10.13.0.1/24, 10.13.13.1/24"));
        assert!(out.contains("ListenPort = 51820"));
    }

    #[test]
    fn test_append_master_address_idempotent() {
        let text = "[Interface]\nAddress = 10.13.0.1/24\n";
        let once = append_master_address(text, "10.13.13.1".parse().unwrap());
        let twice = append_master_address(&once, "10.13.13.1".parse().unwrap());
        assert_eq!(once, twice);
        assert_eq!(once.matches("10.13.13.1/24").count(), 1);
    }

    #[test]
    fn test_add_service_block_renders_clients_only() {
        let peers = vec![
            peer("server", "10.13.13.1", true),
            peer("client-a", "10.13.13.2", false),
        ];
        let out = add_service_block("server=8.8.8.8", "s1", &peers, render_wireguard_peer);

        assert!(out.contains("###START_BLOCK_s1"));
        assert!(out.contains("###STOP_BLOCK_s1"));
        assert!(out.contains("PublicKey = client-a-pubkey"));
        assert!(out.contains("AllowedIPs = 10.13.13.2/32"));
        assert!(!out.contains("server-pubkey"));
    }

    #[test]
    fn test_add_then_remove_round_trip() {
        let peers = vec![
            peer("server", "10.13.13.1", true),
            peer("client-a", "10.13.13.2", false),
        ];
        for base in ["server=8.8.8.8", "server=8.8.8.8\n", "", "a\nb\nc"] {
            let added = add_service_block(base, "s1", &peers, render_dns_alias);
            let removed = remove_service_block(&added, "s1");
            assert_eq!(removed, base, "round trip failed for base {:?}", base);
        }
    }

    #[test]
    fn test_remove_absent_block_is_noop() {
        let text = "server=8.8.8.8\naddress=/x/10.0.0.1\n";
        assert_eq!(remove_service_block(text, "ghost"), text);
    }

    #[test]
    fn test_remove_unmatched_start_is_noop() {
        let text = "a\n###START_BLOCK_s1\nb\n";
        assert_eq!(remove_service_block(text, "s1"), text);
    }

    #[test]
    fn test_remove_stop_before_start_is_noop() {
        let text = "###STOP_BLOCK_s1\na\n###START_BLOCK_s1\nb\n";
        assert_eq!(remove_service_block(text, "s1"), text);
    }

    #[test]
    fn test_remove_leaves_other_blocks_untouched() {
        let peers_a = vec![peer("a", "10.13.1.2", false)];
        let peers_b = vec![peer("b", "10.13.2.2", false)];
        let base = "server=8.8.8.8";
        let with_a = add_service_block(base, "svc-a", &peers_a, render_dns_alias);
        let with_both = add_service_block(&with_a, "svc-b", &peers_b, render_dns_alias);

        let removed_a = remove_service_block(&with_both, "svc-a");
        assert!(!removed_a.contains("###START_BLOCK_svc-a"));
        assert!(removed_a.contains("###START_BLOCK_svc-b"));
        assert!(removed_a.contains("address=/b/10.13.2.2"));
        assert!(!removed_a.contains("address=/a/10.13.1.2"));
    }

    #[test]
    fn test_remove_does_not_match_prefix_sharing_ids() {
        let peers = vec![peer("a", "10.13.10.2", false)];
        let base = "server=8.8.8.8\n";
        let with_s10 = add_service_block(base, "s10", &peers, render_dns_alias);

        // Removing an absent "s1" must not touch the "s10" block
        assert_eq!(remove_service_block(&with_s10, "s1"), with_s10);

        let removed = remove_service_block(&with_s10, "s10");
        assert_eq!(removed, base);
    }

    #[test]
    fn test_remove_first_occurrence_only() {
        let text = "###START_BLOCK_s1\nx\n###STOP_BLOCK_s1\nkeep\n###START_BLOCK_s1\ny\n###STOP_BLOCK_s1\n";
        let out = remove_service_block(text, "s1");
        assert!(out.starts_with("keep"));
        assert!(out.contains("###START_BLOCK_s1\ny"));
    }

    #[test]
    fn test_render_wireguard_peer() {
        let rendered = render_wireguard_peer(&peer("client-a", "10.13.13.2", false));
        assert_eq!(
            rendered,
            "[Peer] #client-a\nPublicKey = client-a-pubkey\nAllowedIPs = 10.13.13.2/32\n"
        );
    }

    #[test]
    fn test_render_dns_alias() {
        let rendered = render_dns_alias(&peer("client-a", "10.13.13.2", false));
        assert_eq!(rendered, "address=/client-a/10.13.13.2\n");
    }

    #[test]
    fn test_baseline_interface() {
        let text = baseline_interface("10.13.0.1".parse().unwrap(), "priv-key");
        assert!(text.starts_with("[Interface]\n"));
        assert!(text.contains("Address = 10.13.0.1/24"));
        assert!(text.contains("ListenPort = 51820"));
        assert!(text.contains("PrivateKey = priv-key"));
        assert!(text.contains("PostUp = iptables"));
        assert!(text.contains("PostDown = iptables"));
    }

    #[test]
    fn test_baseline_dns() {
        assert_eq!(baseline_dns(), "server=8.8.8.8\n");
    }
}
