// Platform detection from the URL host. No network access.

use url::Url;

use crate::types::Platform;

/// Host suffixes per platform, checked in order.
const HOSTS: &[(Platform, &[&str])] = &[
    (Platform::Instagram, &["instagram.com"]),
    (Platform::Youtube, &["youtube.com", "youtu.be"]),
    (Platform::Tiktok, &["tiktok.com"]),
    (Platform::Facebook, &["facebook.com", "fb.watch"]),
    (Platform::Threads, &["threads.net", "threads.com"]),
];

/// Classify a raw URL string by host. Unparsable URLs and unknown hosts are `Generic`.
pub fn identify_platform(raw: &str) -> Platform {
    let Some(host) = host_of(raw) else {
        return Platform::Generic;
    };

    for (platform, suffixes) in HOSTS {
        if suffixes.iter().any(|s| host_matches(&host, s)) {
            return *platform;
        }
    }
    Platform::Generic
}

fn host_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    parsed.host_str().map(|h| h.trim_end_matches('.').to_lowercase())
}

/// `www.instagram.com` matches `instagram.com`; `notinstagram.com` does not.
fn host_matches(host: &str, suffix: &str) -> bool {
    host == suffix
        || host
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
