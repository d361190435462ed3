//! Video id extraction across the URL shapes people share

use article_fetch::handlers::youtube::video_id;

#[test]
fn extracts_ids_from_shared_urls() {
    let cases = [
        ("https://www.youtube.com/watch?v=BnSUk0je6oo&t=269s", "BnSUk0je6oo"),
        ("https://youtu.be/vFD2gu007dc", "vFD2gu007dc"),
        ("https://youtube.com/watch?v=BMFVCnbRaV4&feature=share", "BMFVCnbRaV4"),
    ];

    for (url, expected) in cases {
        assert_eq!(video_id(url), Some(expected), "{url}");
    }
}

#[test]
fn channel_pages_have_no_id() {
    assert_eq!(video_id("https://www.youtube.com/@somechannel"), None);
    assert_eq!(video_id("https://example.com/watch?v=BnSUk0je6oo"), None);
}
