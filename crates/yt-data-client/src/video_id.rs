use url::Url;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn leading_id(s: &str) -> Option<String> {
    let id: String = s.chars().take_while(|c| is_id_char(*c)).collect();
    (!id.is_empty()).then_some(id)
}

fn is_short_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtu.be" || host.ends_with(".youtu.be")
}

/// Extract a video id from a pasted URL.
///
/// Two shapes are recognised: a `v=<id>` query parameter (`/watch?v=<id>`) and the
/// short `youtu.be/<id>` form. The scheme may be omitted. Anything else yields `None`,
/// which callers treat as "no reference selected".
pub fn extract_video_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .ok()?;

    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .and_then(|(_, value)| leading_id(&value))
    {
        return Some(id);
    }

    if url.host_str().is_some_and(is_short_host) {
        return url.path_segments()?.next().and_then(leading_id);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_form_watch_url() {
        assert_eq!(
            extract_video_id("https://x/watch?v=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=a_b-c"),
            Some("a_b-c".to_string())
        );
    }

    #[test]
    fn short_form_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/abc123?si=tracking"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn scheme_is_optional() {
        assert_eq!(extract_video_id("youtu.be/abc123"), Some("abc123".to_string()));
        assert_eq!(
            extract_video_id("  www.youtube.com/watch?v=abc123  "),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn unrecognised_urls() {
        assert_eq!(extract_video_id("https://example.com/abc123"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("not a url at all"), None);
    }

    #[test]
    fn id_stops_at_first_foreign_character() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123!!"),
            Some("abc123".to_string())
        );
    }
}
