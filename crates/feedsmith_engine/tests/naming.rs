use feedsmith_engine::feed_filename;
use pretty_assertions::assert_eq;

#[test]
fn host_and_path_become_an_underscored_name() {
    assert_eq!(
        feed_filename("https://example.org/news"),
        "feed_example_org_news.xml"
    );
}

#[test]
fn query_strings_are_ignored() {
    assert_eq!(
        feed_filename("https://www.pap.pl/kraj?page=0"),
        "feed_www_pap_pl_kraj.xml"
    );
}

#[test]
fn host_only_urls_work() {
    assert_eq!(feed_filename("https://example.org/"), "feed_example_org.xml");
}

#[test]
fn derivation_is_idempotent() {
    let url = "https://example.org/a/b/c.html";
    assert_eq!(feed_filename(url), feed_filename(url));
    assert_eq!(feed_filename(url), "feed_example_org_a_b_c_html.xml");
}

#[test]
fn dot_placement_only_collides_when_sanitized_forms_agree() {
    // Different hosts whose sanitized forms differ must not collide.
    assert_ne!(
        feed_filename("https://examp.leorg/news"),
        feed_filename("https://example.org/gnus")
    );
    // Trailing separators sanitize away, so these genuinely coincide.
    assert_eq!(
        feed_filename("https://example.org/news"),
        feed_filename("https://example.org/news/")
    );
}

#[test]
fn safe_name_is_truncated_to_two_hundred_characters() {
    let long_path: String = "segment/".repeat(60);
    let url = format!("https://example.org/{long_path}");
    let filename = feed_filename(&url);

    assert!(filename.starts_with("feed_"));
    assert!(filename.ends_with(".xml"));
    let safe_name_len = filename.chars().count() - "feed_".len() - ".xml".len();
    assert_eq!(safe_name_len, 200);
}
