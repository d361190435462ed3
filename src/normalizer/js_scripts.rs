//! JavaScript evaluated inside the rendered page
//!
//! Scripts are IIFE expressions so `Page::evaluate` returns their value
//! directly (promises are awaited).

use std::collections::BTreeMap;

use serde_json::json;

use super::BLOCK_SENTINELS;
use crate::utils::{BACKGROUND_IMAGE_CONTENT_THRESHOLD, EMBED_REPLACEMENT_CLASS};

/// Load state used to approximate network idle
pub const READINESS_SCRIPT: &str = r"
    (() => ({
        readyState: document.readyState,
        resources: performance.getEntriesByType('resource').length,
        bodyExists: document.body !== null
    }))()
";

/// Scroll to the bottom in 500px steps so lazy content loads
///
/// Resolves once the original scroll height has been covered. Callers race
/// it against a timeout since infinite-scroll pages never finish, then run
/// [`STOP_SCROLL_SCRIPT`] when the timer wins.
pub const SCROLL_SCRIPT: &str = r"
    (async () => {
        if (!document.body) {
            return false;
        }
        clearInterval(window.__articleFetchScrollTimer);
        return new Promise((resolve) => {
            const scrollHeight = document.body.scrollHeight;
            let totalHeight = 0;
            const distance = 500;
            window.__articleFetchScrollTimer = setInterval(() => {
                window.scrollBy(0, distance);
                totalHeight += distance;
                if (totalHeight >= scrollHeight) {
                    clearInterval(window.__articleFetchScrollTimer);
                    resolve(true);
                }
            }, 10);
        });
    })()
";

/// Cancel a scroll started by [`SCROLL_SCRIPT`] that lost its race
pub const STOP_SCROLL_SCRIPT: &str = r"
    (() => {
        const running = window.__articleFetchScrollTimer !== undefined;
        clearInterval(window.__articleFetchScrollTimer);
        window.__articleFetchScrollTimer = undefined;
        return running;
    })()
";

/// Title of the current document
pub const TITLE_SCRIPT: &str = "document.title";

const FRAME_CAPTURE_TEMPLATE: &str = r"
    (() => {
        const pattern = new RegExp(__PATTERN__, 'i');
        const frames = {};
        Array.from(document.getElementsByTagName('iframe')).forEach((frame) => {
            const src = frame.getAttribute('src');
            if (!src || !pattern.test(frame.src)) {
                return;
            }
            try {
                const body = frame.contentDocument && frame.contentDocument.body;
                if (body) {
                    frames[src] = body.innerHTML;
                }
            } catch (e) {
                // cross-origin frame; nothing to capture
            }
        });
        return frames;
    })()
";

const NORMALIZE_TEMPLATE: &str = r#"
    (() => {
        const frames = __FRAMES__;
        const sentinels = __SENTINELS__;
        const threshold = __THRESHOLD__;
        const replacementClass = __CLASS__;
        const backgroundUrl = /url\(["']?(.+?)["']?\)/i;

        const isBlurred = (style) => {
            const filter = style.getPropertyValue('filter');
            return !!filter && filter.startsWith('blur');
        };

        const elements = document.body ? Array.from(document.body.getElementsByTagName('*')) : [];
        elements.forEach((el) => {
            if (!el.isConnected) {
                return;
            }
            const style = window.getComputedStyle(el);
            const tag = el.tagName.toLowerCase();

            if ((tag === 'img' || tag === 'image') && isBlurred(style)) {
                el.remove();
                return;
            }

            const background = style.getPropertyValue('background-image');
            if (background && background !== 'none') {
                if (isBlurred(style)) {
                    el.remove();
                    return;
                }
                const match = backgroundUrl.exec(background);
                if (match && match[1] && !el.getAttribute('src') && el.innerHTML.length < threshold) {
                    const img = document.createElement('img');
                    img.src = match[1];
                    el.replaceWith(img);
                    return;
                }
            }

            if (tag === 'iframe') {
                const src = el.getAttribute('src');
                if (src && Object.prototype.hasOwnProperty.call(frames, src)) {
                    const div = document.createElement('div');
                    div.className = replacementClass;
                    div.innerHTML = frames[src];
                    el.replaceWith(div);
                }
            }
        });

        const blocked = sentinels.some((selector) => document.querySelector(selector) !== null);
        return {
            blocked,
            html: blocked ? null : document.documentElement.outerHTML
        };
    })()
"#;

/// Capture `body.innerHTML` of child frames whose URL matches `pattern`
///
/// Result is an object keyed by the frame's `src` attribute.
#[must_use]
pub fn frame_capture_script(pattern: &str) -> String {
    FRAME_CAPTURE_TEMPLATE.replace("__PATTERN__", &json!(pattern).to_string())
}

/// Normalize the live DOM and report block sentinels
///
/// Result is `{ blocked: bool, html: string | null }`.
#[must_use]
pub fn normalize_script(frames: &BTreeMap<String, String>) -> String {
    NORMALIZE_TEMPLATE
        .replace("__FRAMES__", &json!(frames).to_string())
        .replace("__SENTINELS__", &json!(BLOCK_SENTINELS).to_string())
        .replace(
            "__THRESHOLD__",
            &BACKGROUND_IMAGE_CONTENT_THRESHOLD.to_string(),
        )
        .replace("__CLASS__", &json!(EMBED_REPLACEMENT_CLASS).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_script_embeds_frames_as_json() {
        let mut frames = BTreeMap::new();
        frames.insert(
            "https://www.instagram.com/p/xyz/embed".to_string(),
            "<div>\"quoted\" post</div>".to_string(),
        );
        let script = normalize_script(&frames);

        assert!(script.contains(r#""https://www.instagram.com/p/xyz/embed":"<div>\"quoted\" post</div>""#));
        assert!(script.contains(r#"[data-translate=\"managed_checking_msg\"]"#));
        assert!(script.contains("#px-block-form-wrapper"));
        assert!(script.contains("const threshold = 25;"));
        assert!(!script.contains("__"), "all placeholders replaced");
    }

    #[test]
    fn stop_script_clears_the_scroll_timer() {
        let handle = "window.__articleFetchScrollTimer";
        assert!(SCROLL_SCRIPT.contains(&format!("{handle} = setInterval(")));
        assert!(STOP_SCROLL_SCRIPT.contains(&format!("clearInterval({handle})")));
    }

    #[test]
    fn frame_capture_pattern_is_a_js_string() {
        let script = frame_capture_script(r"instagram\.com");
        assert!(script.contains(r#"new RegExp("instagram\\.com", 'i')"#));
    }
}
