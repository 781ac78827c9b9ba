// Signal extractors: pure yes/no questions over a PageObservation.
//
// None of these can fail. A selector that does not parse, a JSON-LD block that
// is not JSON, or a URL that does not parse all answer "no".

use std::fmt;

use url::Url;

use crate::observation::PageObservation;
use crate::profiles::PlatformProfile;

/// Named extractor outputs that rules can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    RemovalPhrase,
    LoginWall,
    CanonicalNoMedia,
    VideoIndicator,
    MissingMediaId,
    ActiveContent,
    InvalidPostParam,
    MediaMarkerInUrl,
    SuccessStatus,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::RemovalPhrase => "removal_phrase",
            Signal::LoginWall => "login_wall",
            Signal::CanonicalNoMedia => "canonical_no_media",
            Signal::VideoIndicator => "video_indicator",
            Signal::MissingMediaId => "missing_media_id",
            Signal::ActiveContent => "active_content",
            Signal::InvalidPostParam => "invalid_post_param",
            Signal::MediaMarkerInUrl => "media_marker_in_url",
            Signal::SuccessStatus => "success_status",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every extractor evaluated once against one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSet {
    pub removal_phrase: Option<String>,
    pub login_wall: bool,
    pub canonical_no_media: bool,
    pub video_indicator: bool,
    pub missing_media_id: bool,
    pub active_content: bool,
    pub invalid_post_param: bool,
    pub media_marker_in_url: bool,
    pub http_status: Option<u16>,
}

impl SignalSet {
    pub fn evaluate(obs: &PageObservation, profile: &PlatformProfile) -> Self {
        Self {
            removal_phrase: removal_phrase_match(obs, &profile.removal_phrases).map(String::from),
            login_wall: looks_like_login_wall(
                obs,
                &profile.login_cues,
                &profile.login_path_fragments,
            ),
            canonical_no_media: canonical_implies_no_media(obs),
            video_indicator: has_video_indicator(obs),
            missing_media_id: url_path_implies_missing_id(&obs.final_url),
            active_content: has_active_content_markers(obs),
            invalid_post_param: has_invalid_post_param(&obs.final_url),
            media_marker_in_url: url_carries_media_marker(&obs.final_url),
            http_status: obs.http_status,
        }
    }

    pub fn is(&self, signal: Signal) -> bool {
        match signal {
            Signal::RemovalPhrase => self.removal_phrase.is_some(),
            Signal::LoginWall => self.login_wall,
            Signal::CanonicalNoMedia => self.canonical_no_media,
            Signal::VideoIndicator => self.video_indicator,
            Signal::MissingMediaId => self.missing_media_id,
            Signal::ActiveContent => self.active_content,
            Signal::InvalidPostParam => self.invalid_post_param,
            Signal::MediaMarkerInUrl => self.media_marker_in_url,
            Signal::SuccessStatus => is_success_status(self.http_status),
        }
    }
}

/// First phrase found in the lowercased HTML.
pub fn removal_phrase_match<'a>(obs: &PageObservation, phrases: &'a [String]) -> Option<&'a str> {
    phrases
        .iter()
        .map(String::as_str)
        .find(|p| !p.is_empty() && obs.html.contains(&p.to_lowercase()))
}

pub fn looks_like_login_wall(
    obs: &PageObservation,
    cues: &[String],
    path_fragments: &[String],
) -> bool {
    path_fragments
        .iter()
        .any(|f| !f.is_empty() && obs.final_url.contains(&f.to_lowercase()))
        || cues
            .iter()
            .any(|c| !c.is_empty() && obs.html.contains(&c.to_lowercase()))
}

/// The canonical link collapses to a bare `/watch` or `/reel` with no media id.
pub fn canonical_implies_no_media(obs: &PageObservation) -> bool {
    obs.canonical_url
        .as_deref()
        .is_some_and(url_path_implies_missing_id)
}

/// `/watch` with no `v` parameter, or `/reel/` with an empty or non-numeric id.
pub fn url_path_implies_missing_id(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["watch"] => !has_query_param(&url, "v"),
        ["reel"] => true,
        ["reel", id, ..] => !id.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

pub fn has_open_graph_video(obs: &PageObservation) -> bool {
    obs.meta("og:video").is_some()
        || obs.meta("og:video:url").is_some()
        || obs.meta("og:video:secure_url").is_some()
}

/// Any JSON-LD object typed as a video, or raw JSON-LD text carrying video markers.
pub fn structured_data_has_video(obs: &PageObservation) -> bool {
    const RAW_MARKERS: [&str; 3] = [r#""videoobject""#, r#""contenturl""#, r#""embedurl""#];

    obs.structured_data.iter().any(declares_video_type)
        || obs
            .structured_data_raw
            .iter()
            .any(|raw| RAW_MARKERS.iter().any(|m| raw.contains(m)))
}

pub fn has_video_indicator(obs: &PageObservation) -> bool {
    has_open_graph_video(obs) || structured_data_has_video(obs)
}

/// Post/video/dialog elements, or Open Graph video/image tags.
pub fn has_active_content_markers(obs: &PageObservation) -> bool {
    obs.has_selector("article, video, div[role='dialog']")
        || has_open_graph_video(obs)
        || obs.meta("og:image").is_some()
}

/// Threads redirects deleted posts to `/?error=invalid_post`.
pub fn has_invalid_post_param(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => url
            .query_pairs()
            .any(|(k, v)| k == "error" && v.eq_ignore_ascii_case("invalid_post")),
        Err(_) => raw.to_lowercase().contains("error=invalid_post"),
    }
}

/// The URL itself names a video (`v=` parameter) or a reel.
pub fn url_carries_media_marker(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    has_query_param(&url, "v") || url.path_segments().is_some_and(|mut s| s.any(|seg| seg == "reel"))
}

pub fn is_success_status(status: Option<u16>) -> bool {
    status.is_some_and(|code| (200..400).contains(&code))
}

fn has_query_param(url: &Url, name: &str) -> bool {
    url.query_pairs().any(|(k, v)| k == name && !v.is_empty())
}

fn declares_video_type(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(map) => {
            let typed_video = match map.get("@type") {
                Some(serde_json::Value::String(t)) => is_video_type(t),
                Some(serde_json::Value::Array(types)) => types
                    .iter()
                    .filter_map(|t| t.as_str())
                    .any(is_video_type),
                _ => false,
            };
            typed_video || map.values().any(declares_video_type)
        }
        serde_json::Value::Array(items) => items.iter().any(declares_video_type),
        _ => false,
    }
}

fn is_video_type(t: &str) -> bool {
    let t = t.rsplit('/').next().unwrap_or(t);
    t.eq_ignore_ascii_case("VideoObject") || t.eq_ignore_ascii_case("Clip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ObservationBuilder;

    fn phrases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn removal_phrase_is_case_insensitive() {
        let obs = ObservationBuilder::new("https://www.youtube.com/watch?v=x")
            .body("<h1>Video Unavailable</h1>")
            .build();
        let list = phrases(&["this video isn't available anymore", "Video unavailable"]);
        assert_eq!(removal_phrase_match(&obs, &list), Some("Video unavailable"));
        assert_eq!(removal_phrase_match(&obs, &phrases(&["gone"])), None);
        assert_eq!(removal_phrase_match(&obs, &phrases(&[""])), None);
    }

    #[test]
    fn login_wall_from_url_or_body() {
        let cues = phrases(&["log in to facebook"]);
        let paths = phrases(&["/login"]);

        let by_url = ObservationBuilder::new("https://www.facebook.com/login/?next=x").build();
        assert!(looks_like_login_wall(&by_url, &cues, &paths));

        let by_body = ObservationBuilder::new("https://www.facebook.com/x")
            .body("<button>Log in to Facebook</button>")
            .build();
        assert!(looks_like_login_wall(&by_body, &cues, &paths));

        let neither = ObservationBuilder::new("https://www.facebook.com/x").body("hello").build();
        assert!(!looks_like_login_wall(&neither, &cues, &paths));
    }

    #[test]
    fn watch_without_v_is_missing_id() {
        assert!(url_path_implies_missing_id("https://facebook.com/watch/"));
        assert!(url_path_implies_missing_id("https://www.facebook.com/watch?ref=x"));
        assert!(!url_path_implies_missing_id("https://www.facebook.com/watch/?v=123"));
        assert!(!url_path_implies_missing_id("https://www.facebook.com/watch/live/?v=123"));
        assert!(!url_path_implies_missing_id("https://www.facebook.com/groups/1"));
        assert!(!url_path_implies_missing_id("not a url"));
    }

    #[test]
    fn reel_without_numeric_id_is_missing_id() {
        assert!(url_path_implies_missing_id("https://www.facebook.com/reel/"));
        assert!(url_path_implies_missing_id("https://www.facebook.com/reel/abc"));
        assert!(!url_path_implies_missing_id("https://www.facebook.com/reel/1234567890"));
        assert!(!url_path_implies_missing_id(
            "https://www.facebook.com/reel/1234567890/?s=share"
        ));
    }

    #[test]
    fn canonical_collapse_detected() {
        let collapsed = ObservationBuilder::new("https://www.facebook.com/reel/99")
            .head(r#"<link rel="canonical" href="https://www.facebook.com/watch/">"#)
            .build();
        assert!(canonical_implies_no_media(&collapsed));

        let intact = ObservationBuilder::new("https://www.facebook.com/reel/99")
            .head(r#"<link rel="canonical" href="https://www.facebook.com/reel/99">"#)
            .build();
        assert!(!canonical_implies_no_media(&intact));

        let absent = ObservationBuilder::new("https://www.facebook.com/reel/99").build();
        assert!(!canonical_implies_no_media(&absent));
    }

    #[test]
    fn structured_video_typed_or_nested() {
        let typed = ObservationBuilder::new("https://a.test/")
            .json_ld(r#"{"@context":"https://schema.org","@type":["VideoObject"]}"#)
            .build();
        assert!(structured_data_has_video(&typed));

        let nested = ObservationBuilder::new("https://a.test/")
            .json_ld(r#"{"@graph":[{"@type":"SocialMediaPosting","video":{"@type":"https://schema.org/VideoObject"}}]}"#)
            .build();
        assert!(structured_data_has_video(&nested));

        let article = ObservationBuilder::new("https://a.test/")
            .json_ld(r#"{"@type":"Article","headline":"x"}"#)
            .build();
        assert!(!structured_data_has_video(&article));
    }

    #[test]
    fn structured_video_loose_markers_survive_bad_json() {
        let obs = ObservationBuilder::new("https://a.test/")
            .json_ld(r#"{"contentUrl": "https://cdn/v.mp4", oops}"#)
            .build();
        assert!(obs.structured_data.is_empty());
        assert!(structured_data_has_video(&obs));
    }

    #[test]
    fn active_markers() {
        let dialog = ObservationBuilder::new("https://a.test/")
            .body(r#"<div role="dialog">x</div>"#)
            .build();
        assert!(has_active_content_markers(&dialog));

        let og_image = ObservationBuilder::new("https://a.test/")
            .meta("og:image", "https://cdn/i.jpg")
            .build();
        assert!(has_active_content_markers(&og_image));

        let bare = ObservationBuilder::new("https://a.test/").body("<p>hi</p>").build();
        assert!(!has_active_content_markers(&bare));
    }

    #[test]
    fn threads_invalid_post_param() {
        assert!(has_invalid_post_param("https://www.threads.com/?error=invalid_post"));
        assert!(has_invalid_post_param("https://www.threads.net/?foo=1&error=INVALID_POST"));
        assert!(!has_invalid_post_param("https://www.threads.com/@a/post/b"));
        assert!(has_invalid_post_param("garbage error=invalid_post"));
    }

    #[test]
    fn media_markers_in_url() {
        assert!(url_carries_media_marker("https://www.facebook.com/watch/?v=1"));
        assert!(url_carries_media_marker("https://www.facebook.com/reel/1"));
        assert!(!url_carries_media_marker("https://www.facebook.com/somepage/posts/1"));
    }

    #[test]
    fn success_status_range() {
        assert!(is_success_status(Some(200)));
        assert!(is_success_status(Some(302)));
        assert!(!is_success_status(Some(404)));
        assert!(!is_success_status(Some(199)));
        assert!(!is_success_status(None));
    }
}
