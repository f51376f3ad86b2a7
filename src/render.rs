//! HTML for the two pages. Every interpolated value goes through `html_escape`.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::controller::{Page, Workspace};

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
textarea,input[type=text]{width:100%;box-sizing:border-box}\
textarea{min-height:14rem}\
.ok{background:#e6f4ea;padding:.6rem}\
.warn{background:#fef7e0;padding:.6rem}\
pre{white-space:pre-wrap;background:#f5f5f5;padding:.6rem}\
.actions{display:flex;gap:.5rem;margin:.8rem 0}";

pub fn page(page: &Page) -> String {
    let body = match page {
        Page::SignIn { auth_url } => sign_in(auth_url),
        Page::Workspace(workspace) => workspace_body(workspace),
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>YouTube Draft Studio</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>YouTube Draft Studio</h1>\n{}</body>\n</html>\n",
        STYLE, body
    )
}

fn sign_in(auth_url: &str) -> String {
    format!(
        "<p>Sign in with the Google account that owns your channel.</p>\n\
         <p><a href=\"{}\">Sign in with YouTube</a></p>\n",
        encode_double_quoted_attribute(auth_url)
    )
}

fn panel(summary: &str, content: &str, open: bool) -> String {
    format!(
        "<details{}><summary>{}</summary><pre><code>{}</code></pre></details>\n",
        if open { " open" } else { "" },
        summary,
        encode_text(content)
    )
}

fn workspace_body(view: &Workspace) -> String {
    let mut html = format!(
        "<p class=\"ok\">Signed in as <strong>{}</strong></p>\n",
        encode_text(&view.channel_title)
    );

    if let Some(warning) = &view.warning {
        html.push_str(&format!(
            "<p class=\"warn\">{}</p>\n",
            encode_text(warning)
        ));
    }

    html.push_str(&format!(
        "<form method=\"post\" action=\"/generate\">\n\
         <label for=\"transcript\">Transcript</label>\n\
         <textarea id=\"transcript\" name=\"transcript\">{}</textarea>\n\
         <label for=\"reference_url\">Reference video URL (optional)</label>\n\
         <input type=\"text\" id=\"reference_url\" name=\"reference_url\" value=\"{}\">\n\
         <div class=\"actions\">\n\
         <button type=\"submit\" formaction=\"/reference\">Preview reference</button>\n\
         <button type=\"submit\">Generate</button>\n\
         </div>\n</form>\n",
        encode_text(&view.transcript),
        encode_double_quoted_attribute(&view.reference_url)
    ));

    if let Some(description) = &view.reference_description {
        html.push_str(&panel("Reference description", description, false));
    }

    if let Some(drafts) = &view.drafts {
        html.push_str(&panel("Generated description", &drafts.description, true));
        html.push_str(&panel("Generated titles", &drafts.titles, true));
    }

    html.push_str(
        "<form method=\"post\" action=\"/logout\">\
         <button type=\"submit\">Sign out</button></form>\n",
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Drafts;

    fn workspace() -> Workspace {
        Workspace {
            channel_title: "Cats & Dogs".to_string(),
            transcript: "</textarea><script>".to_string(),
            reference_url: "https://youtu.be/abc\"x".to_string(),
            reference_description: None,
            warning: None,
            drafts: None,
        }
    }

    #[test]
    fn sign_in_links_to_consent_url() {
        let html = page(&Page::SignIn {
            auth_url: "https://accounts.google.com/o/oauth2/auth?a=1&b=2".to_string(),
        });
        assert!(html.contains("href=\"https://accounts.google.com/o/oauth2/auth?a=1&amp;b=2\""));
        assert!(!html.contains("action=\"/generate\""));
    }

    #[test]
    fn user_input_is_escaped() {
        let html = page(&Page::Workspace(workspace()));
        assert!(html.contains("Cats &amp; Dogs"));
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains("value=\"https://youtu.be/abc&quot;x\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn drafts_and_warning_are_shown() {
        let mut view = workspace();
        view.warning = Some("'nope' is not a YouTube video URL".to_string());
        view.reference_description = Some("Follow us".to_string());
        view.drafts = Some(Drafts {
            description: "Drafted <b>".to_string(),
            titles: "1. One\n2. Two".to_string(),
        });

        let html = page(&Page::Workspace(view));
        assert!(html.contains("class=\"warn\""));
        assert!(html.contains("<summary>Reference description</summary>"));
        assert!(html.contains("Drafted &lt;b&gt;"));
        assert!(html.contains("1. One\n2. Two"));
        assert!(html.contains("action=\"/logout\""));
    }
}
