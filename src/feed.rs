use chrono::{NaiveTime, TimeZone, Utc};

use crate::models::Post;

/// Feed channel title.
pub const FEED_TITLE: &str = "Planner Blog";
/// Feed channel description.
pub const FEED_DESCRIPTION: &str = "Updates and thoughts from the planner.";

/// Render the blog as an RSS 2.0 document, newest post first. Links point
/// at `{site_url}/posts/{id}`; the post id doubles as the guid.
pub fn render(posts: &[&Post], site_url: &str) -> String {
    let site_url = site_url.trim_end_matches('/');

    let mut sorted: Vec<&Post> = posts.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\">\n<channel>\n");
    xml.push_str(&format!("  <title>{}</title>\n", escape(FEED_TITLE)));
    xml.push_str(&format!("  <link>{}</link>\n", escape(site_url)));
    xml.push_str(&format!(
        "  <description>{}</description>\n",
        escape(FEED_DESCRIPTION)
    ));
    xml.push_str("  <language>en</language>\n");

    for post in sorted {
        let url = format!("{site_url}/posts/{}", post.id);
        // Publish dates carry no time-of-day; midnight UTC stands in.
        let pub_date = Utc
            .from_utc_datetime(&post.date.and_time(NaiveTime::MIN))
            .to_rfc2822();
        xml.push_str("  <item>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape(&post.title)));
        xml.push_str(&format!(
            "    <description>Read the full post at {}</description>\n",
            escape(&url)
        ));
        xml.push_str(&format!("    <link>{}</link>\n", escape(&url)));
        xml.push_str(&format!(
            "    <guid isPermaLink=\"false\">{}</guid>\n",
            escape(&post.id)
        ));
        xml.push_str(&format!("    <pubDate>{}</pubDate>\n", pub_date));
        xml.push_str("  </item>\n");
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(id: &str, title: &str, y: i32, m: u32, d: u32) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            content: String::new(),
        }
    }

    #[test]
    fn renders_items_newest_first() {
        let older = post("a", "Older", 2024, 7, 15);
        let newer = post("b", "Newer", 2024, 7, 18);
        let xml = render(&[&older, &newer], "https://example.com");

        let newer_pos = xml.find("<title>Newer</title>").unwrap();
        let older_pos = xml.find("<title>Older</title>").unwrap();
        assert!(newer_pos < older_pos);
    }

    #[test]
    fn item_fields_are_present() {
        let p = post("hello-world", "Hello", 2024, 7, 15);
        let xml = render(&[&p], "https://example.com/");

        assert!(xml.contains("<link>https://example.com/posts/hello-world</link>"));
        assert!(xml.contains("<guid isPermaLink=\"false\">hello-world</guid>"));
        assert!(xml.contains("<pubDate>Mon, 15 Jul 2024 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("<language>en</language>"));
    }

    #[test]
    fn escapes_xml_entities() {
        let p = post("q", "Tips & <tricks>", 2024, 7, 15);
        let xml = render(&[&p], "https://example.com");
        assert!(xml.contains("<title>Tips &amp; &lt;tricks&gt;</title>"));
        assert!(!xml.contains("Tips & <tricks>"));
    }

    #[test]
    fn empty_feed_is_still_a_valid_channel() {
        let xml = render(&[], "https://example.com");
        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
    }
}
