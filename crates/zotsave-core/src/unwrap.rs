use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

/// Identifying fragments of known rendering, screenshotting, and fetch-proxy
/// services that embed the real document URL in a query parameter.
static WRAPPER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)pdfrenderer|pdf\.svc|htmltopdf|html2pdf|render.*pdf|pdf.*render|",
        r"webshot|screenshot|snapshot|proxy\.php|fetch\.php",
    ))
    .unwrap()
});

/// Query parameter names that commonly hold the inner source URL, in
/// priority order. The first parameter that yields an absolute URL wins.
const URL_PARAM_NAMES: [&str; 6] = ["url", "source", "target", "uri", "link", "src"];

/// Extract the inner source URL from wrapper/renderer/proxy URLs.
///
/// Services like PDF renderers and webpage-snapshot endpoints show up in the
/// wild as the URL being downloaded, with the real document tucked into a
/// query parameter; downloading the outer URL would store the wrapper's
/// rendering page instead of the source. If no wrapper is detected, or `raw`
/// is not a parseable absolute URL, the input is returned unchanged.
pub fn unwrap_url(raw: &str) -> String {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    // Service names usually sit in the hostname (pdfrenderer.example.com)
    // rather than the path, so the match covers both.
    let host_and_path = format!("{}{}", parsed.host_str().unwrap_or(""), parsed.path());
    let is_wrapper = WRAPPER_RE.is_match(&host_and_path);
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for name in URL_PARAM_NAMES {
        let Some((_, value)) = pairs.iter().find(|(k, v)| k == name && !v.is_empty()) else {
            continue;
        };
        let candidate = percent_decode_str(value).decode_utf8_lossy().into_owned();
        if !candidate.starts_with("http://") && !candidate.starts_with("https://") {
            // A relative value is never a usable unwrap target.
            continue;
        }
        if is_wrapper {
            return candidate;
        }
        // Not a known wrapper, but the parameter holds a full URL. Still
        // unwrap if the outer URL looks like a service endpoint (has path
        // segments beyond a simple page).
        if path_segment_count(parsed.path()) >= 2 {
            return candidate;
        }
    }

    raw.to_string()
}

fn path_segment_count(path: &str) -> usize {
    path.trim_matches('/').split('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_urls_pass_through() {
        for raw in ["", "not a url", "/relative/path?url=https://a.example.com/x", "ftp:"] {
            assert_eq!(unwrap_url(raw), raw);
        }
    }

    #[test]
    fn test_plain_urls_pass_through() {
        let raw = "https://example.com/articles/2024/energy.pdf";
        assert_eq!(unwrap_url(raw), raw);
    }

    #[test]
    fn test_known_wrapper_is_unwrapped() {
        let raw = "https://pdfrenderer.example.com/render?url=https%3A%2F%2Freal.example.com%2Fdoc.pdf";
        assert_eq!(unwrap_url(raw), "https://real.example.com/doc.pdf");
    }

    #[test]
    fn test_wrapper_match_is_case_insensitive() {
        let raw = "https://shots.example.com/ScreenShot?url=https://real.example.com/page";
        assert_eq!(unwrap_url(raw), "https://real.example.com/page");
    }

    #[test]
    fn test_shallow_non_wrapper_path_is_not_unwrapped() {
        // A search page with a url parameter is not a proxy.
        let raw = "https://example.com/search?url=https://other.example.com/x";
        assert_eq!(unwrap_url(raw), raw);
    }

    #[test]
    fn test_endpoint_shaped_path_is_unwrapped() {
        let raw = "https://example.com/api/proxy?target=https://other.example.com/x";
        assert_eq!(unwrap_url(raw), "https://other.example.com/x");
    }

    #[test]
    fn test_relative_parameter_value_is_never_returned() {
        let raw = "https://pdfrenderer.example.com/render?source=/doc.pdf";
        assert_eq!(unwrap_url(raw), raw);
    }

    #[test]
    fn test_relative_value_skips_to_next_parameter() {
        let raw = "https://pdfrenderer.example.com/render?url=/local.pdf&src=https://real.example.com/doc.pdf";
        assert_eq!(unwrap_url(raw), "https://real.example.com/doc.pdf");
    }

    #[test]
    fn test_parameter_priority_order() {
        // `url` outranks `src` regardless of their order in the query string.
        let raw = "https://html2pdf.example.com/convert?src=https://second.example.com/b&url=https://first.example.com/a";
        assert_eq!(unwrap_url(raw), "https://first.example.com/a");
    }

    #[test]
    fn test_empty_parameter_is_treated_as_absent() {
        let raw = "https://webshot.example.com/grab?url=&link=https://real.example.com/page";
        assert_eq!(unwrap_url(raw), "https://real.example.com/page");
    }

    #[test]
    fn test_double_encoded_value_is_decoded() {
        let raw = "https://example.com/fetch.php?url=https%253A%252F%252Freal.example.com%252Fdoc.pdf";
        assert_eq!(unwrap_url(raw), "https://real.example.com/doc.pdf");
    }

    #[test]
    fn test_no_candidate_parameters_pass_through() {
        let raw = "https://proxy.example.com/proxy.php?page=2";
        assert_eq!(unwrap_url(raw), raw);
    }

    #[test]
    fn test_segment_counting_keeps_interior_empties() {
        assert_eq!(path_segment_count("/render/doc"), 2);
        assert_eq!(path_segment_count("/search"), 1);
        assert_eq!(path_segment_count("/"), 1);
        assert_eq!(path_segment_count("/a//b"), 3);
    }
}
