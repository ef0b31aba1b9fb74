//! Rendering of alert digests as a subject line plus HTML and plain-text bodies.

use std::fmt::Write as _;

use crate::alerts::group_by_language;
use crate::Alert;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Sign-prefixed change, e.g. `+3` or `-7`.
#[must_use]
pub fn format_change(change: i32) -> String {
    if change > 0 {
        format!("+{change}")
    } else {
        change.to_string()
    }
}

/// Render one section per language that has alerts, in [`crate::Language::ALL`] order.
#[must_use]
pub fn render_digest(alerts: &[Alert]) -> Digest {
    let count = alerts.len();
    let noun = if count == 1 { "change" } else { "changes" };
    let subject = format!("Keyword ranking alert: {count} significant {noun}");

    let mut html = String::new();
    let mut text = String::new();
    let _ = write!(
        html,
        "<h1>{}</h1>\n<p>The following keywords moved by at least the alert threshold.</p>\n",
        escape_html(&subject)
    );
    let _ = writeln!(text, "{subject}");

    for (language, group) in group_by_language(alerts.to_vec()).iter() {
        if group.is_empty() {
            continue;
        }

        let _ = write!(
            html,
            "<h2>{} ({})</h2>\n<table>\n<tr><th>Keyword</th><th>Old</th><th>New</th><th>Change</th><th>URL</th></tr>\n",
            escape_html(language.display_name()),
            language.code()
        );
        let _ = write!(text, "\n{} ({})\n", language.display_name(), language.code());

        for alert in group {
            let change = format_change(alert.change);
            let colour = if alert.is_improvement() { "#16a34a" } else { "#dc2626" };
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td style=\"color:{colour}\">{change}</td><td><a href=\"{url}\">{url}</a></td></tr>",
                escape_html(&alert.keyword),
                alert.old_position,
                alert.new_position,
                url = escape_html(&alert.url),
            );
            let _ = writeln!(
                text,
                "  {}: {} -> {} ({change}) {}",
                alert.keyword, alert.old_position, alert.new_position, alert.url
            );
        }
        html.push_str("</table>\n");
    }

    Digest {
        subject,
        html,
        text,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
