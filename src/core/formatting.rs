use crate::models::Event;
use std::fmt::Write;

/// Subject line of every notification email
pub const EMAIL_SUBJECT: &str = "New Community Events Matching Your Interests!";

/// Date layout used in notification emails, e.g. "January 01, 2024 06:30 PM"
pub const EMAIL_DATE_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// Render the HTML body of a notification email
///
/// Events are listed in the order given. With `escape` set, event text is
/// HTML-escaped before interpolation; without it, fields are written
/// verbatim and any markup in them reaches the recipient unchanged.
pub fn format_email_body(events: &[Event], escape: bool) -> String {
    let field = |text: &str| -> String {
        if escape {
            escape_html(text)
        } else {
            text.to_string()
        }
    };

    let mut body = String::from(
        "<html>\n<body>\n<h2>New Community Events</h2>\n<p>Here are some events that match your interests:</p>\n",
    );

    for event in events {
        // Writing into a String cannot fail
        let _ = write!(
            body,
            "<div style=\"margin-bottom: 20px;\">\n\
             <h3>{}</h3>\n\
             <p><strong>Date:</strong> {}</p>\n\
             <p><strong>Location:</strong> {}</p>\n\
             <p><strong>Category:</strong> {}</p>\n\
             <p>{}</p>\n",
            field(&event.title),
            event.date.format(EMAIL_DATE_FORMAT),
            field(&event.location),
            field(&event.category),
            field(&event.description),
        );

        if let Some(url) = &event.url {
            let _ = writeln!(body, "<p><a href=\"{}\">More Information</a></p>", field(url));
        }

        body.push_str("</div>\n");
    }

    body.push_str("</body>\n</html>\n");
    body
}

/// Escape the characters that are significant in HTML text and attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventOrigin;
    use chrono::{TimeZone, Utc};

    fn create_event(title: &str, url: Option<&str>) -> Event {
        Event {
            id: "1".to_string(),
            title: title.to_string(),
            description: "Annual tech conference".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap().fixed_offset(),
            location: "downtown".to_string(),
            category: "technology".to_string(),
            source: EventOrigin::Eventbrite,
            url: url.map(String::from),
            image_url: None,
        }
    }

    #[test]
    fn test_body_structure() {
        let events = vec![
            create_event("Tech Conference", Some("https://eventbrite.com/e/1")),
            create_event("Music Festival", None),
        ];

        let body = format_email_body(&events, true);

        assert!(body.starts_with("<html>"));
        assert!(body.trim_end().ends_with("</html>"));
        assert!(body.contains("<h2>New Community Events</h2>"));
        assert!(body.contains("<h3>Tech Conference</h3>"));
        assert!(body.contains("<h3>Music Festival</h3>"));
        assert!(body.contains("<strong>Date:</strong> January 01, 2024 06:30 PM"));
        assert!(body.contains("<strong>Location:</strong> downtown"));
        assert!(body.contains("<strong>Category:</strong> technology"));
        assert_eq!(body.matches("More Information").count(), 1);
        assert!(body.find("Tech Conference").unwrap() < body.find("Music Festival").unwrap());
    }

    #[test]
    fn test_body_escapes_markup() {
        let events = vec![create_event("<script>alert('x')</script>", None)];

        let escaped = format_email_body(&events, true);
        assert!(!escaped.contains("<script>"));
        assert!(escaped.contains("&lt;script&gt;"));

        let verbatim = format_email_body(&events, false);
        assert!(verbatim.contains("<h3><script>alert('x')</script></h3>"));
    }

    #[test]
    fn test_empty_event_list() {
        let body = format_email_body(&[], true);

        assert!(body.contains("<h2>"));
        assert!(!body.contains("<h3>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_html("a \"b\" 'c'"), "a &quot;b&quot; &#x27;c&#x27;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
