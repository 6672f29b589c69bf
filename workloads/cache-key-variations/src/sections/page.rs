//! The demo page.

use chrono::{DateTime, Utc};

use crate::data::GuessBucket;

/// Everything the page body is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent<'a> {
    /// Bucket read back from the query tag.
    pub guess: GuessBucket,
    /// No prior visit cookie was presented.
    pub first_visit: bool,
    /// Country name, or the fallback.
    pub country: &'a str,
    /// When this copy was rendered.
    pub generated_at: DateTime<Utc>,
    /// Path the guess form submits to.
    pub submission_path: &'a str,
    /// Field name of the guess.
    pub param: &'a str,
}

/// Message shown for a guess bucket.
pub fn render_guess_fragment(guess: GuessBucket) -> &'static str {
    match guess {
        GuessBucket::TooLow => {
            "<p><strong>You guessed too low &#128532; Try again!</strong></p>"
        }
        GuessBucket::TooHigh => {
            "<p><strong>You guessed too high &#128532; Try again!</strong></p>"
        }
        GuessBucket::Correct => "<p><strong>You guessed correctly! &#128513;</strong></p>",
        GuessBucket::None => "",
    }
}

/// Sentence about the visit cookie.
pub fn render_visit_sentence(first_visit: bool) -> &'static str {
    if first_visit {
        "this is the first time"
    } else {
        "this is not the first time"
    }
}

/// Render the full page.
pub fn render_page(content: &PageContent<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>Cache-key variations</title>
        <link rel="stylesheet" href="/main.css">
    </head>
    <body>
        <div class="wrapper">
            <h1>Cache-key variations</h1>

            <p>Every version of this page is served under the root URL. An edge rewrite
            normalizes your answer and the cache keeps one copy per combination of the
            values below.</p>

            <p>This page in particular was generated at <strong>{generated_at}</strong>.</p>

            <p>You'll see different timestamps depending on:</p>

            <ul>
                <li><p>Whether it's your <strong>first time visiting this site</strong>. We know that
                <strong>{visit}</strong> you're visiting this site because we set a cookie on your
                browser, and the content <strong>varies on that cookie</strong>.</p></li>

                <li><p><strong>Where you're located</strong>. You're most likely from {country}, and
                the content <strong>varies on geolocation</strong>, so a recent timestamp means you're
                probably the first person in your country to see this page.</p></li>

                <li><p>Your <strong>answer to the question at the end of this page</strong>. The answer
                is rewritten at the edge into one of a few buckets and the content
                <strong>varies on the rewritten query value</strong>.</p></li>
            </ul>

            {guess}

            <p><strong>How deep is the deepest point of the <a href="https://en.wikipedia.org/wiki/Mariana_Trench">Mariana Trench</a>?</strong></p>

            <form action="{action}" method="get">
                <input type="number" id="{param}" name="{param}"><br><br>
                <input type="submit" value="Submit">
            </form>
            <br>

            <p>Try reloading this page a couple of times and see how the content is served from the cache!</p>
        </div>
    </body>
</html>"#,
        generated_at = content.generated_at.format("%a, %d %b %Y %H:%M:%S GMT"),
        visit = render_visit_sentence(content.first_visit),
        country = html_escape(content.country),
        guess = render_guess_fragment(content.guess),
        action = html_escape(content.submission_path),
        param = html_escape(content.param),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn content(guess: GuessBucket, first_visit: bool, country: &str) -> PageContent<'_> {
        PageContent {
            guess,
            first_visit,
            country,
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            submission_path: "/guess",
            param: "value",
        }
    }

    #[test]
    fn test_guess_fragments() {
        assert!(render_guess_fragment(GuessBucket::TooLow).contains("too low"));
        assert!(render_guess_fragment(GuessBucket::TooHigh).contains("too high"));
        assert!(render_guess_fragment(GuessBucket::Correct).contains("correctly"));
        assert_eq!(render_guess_fragment(GuessBucket::None), "");
    }

    #[test]
    fn test_page_carries_inputs() {
        let html = render_page(&content(GuessBucket::TooHigh, true, "Portugal"));

        assert!(html.contains("this is the first time"));
        assert!(html.contains("from Portugal"));
        assert!(html.contains("You guessed too high"));
        assert!(html.contains("Fri, 01 Mar 2024 12:00:00 GMT"));
        assert!(html.contains(r#"<form action="/guess" method="get">"#));
        assert!(html.contains(r#"name="value""#));
        assert!(html.contains(r#"href="/main.css""#));
    }

    #[test]
    fn test_repeat_visit_sentence() {
        let html = render_page(&content(GuessBucket::None, false, "unknown"));

        assert!(html.contains("this is not the first time"));
        assert!(!html.contains("You guessed"));
    }

    #[test]
    fn test_rendering_is_pure() {
        let page = content(GuessBucket::Correct, false, "Chile");
        assert_eq!(render_page(&page), render_page(&page));
    }

    #[test]
    fn test_country_is_escaped() {
        let html = render_page(&content(GuessBucket::None, true, "<script>x</script>"));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }
}
