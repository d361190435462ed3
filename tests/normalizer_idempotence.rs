//! Normalizing already-normalized output changes nothing

use std::collections::BTreeMap;

use article_fetch::{Normalized, normalize_html};

mod common;
use common::{create_block_page, create_test_html};

fn content(result: Normalized) -> String {
    match result {
        Normalized::Content(html) => html,
        Normalized::Blocked => panic!("unexpected block page"),
    }
}

#[test]
fn second_pass_is_a_no_op() {
    let html = create_test_html(
        "Lazy images",
        r#"
        <img src="placeholder.jpg" style="filter: blur(20px)">
        <div class="hero" style="background-image: url('https://cdn.example.com/hero.jpg')"></div>
        <div class="card" style="background-image: url(/bg.png)"><p>This card has plenty of text inside it</p></div>
        <iframe src="https://www.instagram.com/p/abc/embed"></iframe>
        <p>Body text</p>
        "#,
    );
    let mut frames = BTreeMap::new();
    frames.insert(
        "https://www.instagram.com/p/abc/embed".to_string(),
        "<blockquote>captured post</blockquote>".to_string(),
    );

    let once = content(normalize_html(&html, &frames).expect("first pass"));
    let twice = content(normalize_html(&once, &frames).expect("second pass"));

    assert_eq!(once, twice);
    assert!(!once.contains("placeholder.jpg"));
    assert!(once.contains(r#"<img src="https://cdn.example.com/hero.jpg">"#));
    assert!(once.contains("plenty of text"));
    assert!(once.contains("captured post"));
    assert!(!once.contains("<iframe"));
}

#[test]
fn block_page_stays_blocked() {
    let frames = BTreeMap::new();
    assert_eq!(
        normalize_html(&create_block_page(), &frames).expect("normalize"),
        Normalized::Blocked
    );
}
