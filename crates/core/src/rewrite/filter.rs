//! Client-side torrent filtering and tracker URL eligibility.

use std::collections::HashSet;

use crate::torrent_client::Torrent;

/// Whether a tracker URL may be rewritten.
///
/// Only non-empty `http://` or `https://` URLs (scheme case-insensitive) are
/// eligible. UDP trackers and the `** [DHT] **` style pseudo-entries are not.
pub fn is_eligible(url: &str) -> bool {
    has_prefix_ignore_case(url, "http://") || has_prefix_ignore_case(url, "https://")
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Keep only the requested torrents when more than one hash was asked for.
///
/// A single hash is filtered by the server, so this is a no-op for zero or
/// one requested hash. Order of the remaining torrents is preserved.
pub fn retain_requested(torrents: &mut Vec<Torrent>, hashes: &[String]) {
    if hashes.len() <= 1 {
        return;
    }
    let wanted: HashSet<String> = hashes.iter().map(|h| h.to_lowercase()).collect();
    torrents.retain(|t| wanted.contains(&t.hash.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(hash: &str) -> Torrent {
        Torrent {
            hash: hash.to_string(),
            name: format!("torrent {}", hash),
            ..Default::default()
        }
    }

    #[test]
    fn test_http_and_https_are_eligible() {
        assert!(is_eligible("http://tracker.example.com/announce"));
        assert!(is_eligible("https://tracker.example.com/announce"));
        assert!(is_eligible("HTTPS://TRACKER.EXAMPLE.COM/announce"));
        assert!(is_eligible("Http://tracker.example.com/announce"));
    }

    #[test]
    fn test_other_urls_are_not_eligible() {
        assert!(!is_eligible(""));
        assert!(!is_eligible("udp://tracker.example.com:1337/announce"));
        assert!(!is_eligible("** [DHT] **"));
        assert!(!is_eligible("** [PeX] **"));
        assert!(!is_eligible("http:/broken"));
        assert!(!is_eligible("wss://tracker.example.com"));
        assert!(!is_eligible(" http://leading-space.example"));
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        assert!(!is_eligible("ħttp://example.com"));
        assert!(!is_eligible("é"));
    }

    #[test]
    fn test_retain_requested_single_hash_is_noop() {
        let mut torrents = vec![torrent("aaa"), torrent("bbb")];
        retain_requested(&mut torrents, &["aaa".to_string()]);
        assert_eq!(torrents.len(), 2);
    }

    #[test]
    fn test_retain_requested_multiple_hashes_case_insensitive() {
        let mut torrents = vec![torrent("aaa"), torrent("BBB"), torrent("ccc")];
        retain_requested(&mut torrents, &["AAA".to_string(), "bbb".to_string()]);

        let hashes: Vec<&str> = torrents.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["aaa", "BBB"]);
    }

    #[test]
    fn test_retain_requested_result_is_subset() {
        let requested = vec!["a1".to_string(), "b2".to_string(), "zz".to_string()];
        let mut torrents = vec![torrent("A1"), torrent("c3"), torrent("b2"), torrent("d4")];
        retain_requested(&mut torrents, &requested);

        let wanted: HashSet<String> = requested.iter().map(|h| h.to_lowercase()).collect();
        assert!(torrents
            .iter()
            .all(|t| wanted.contains(&t.hash.to_lowercase())));
        assert_eq!(torrents.len(), 2);
    }
}
