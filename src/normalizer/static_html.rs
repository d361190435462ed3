//! Normalization over serialized HTML
//!
//! Documents that never passed through a live page (fallback proxy output)
//! get the same treatment as the in-page script, using inline `style`
//! attributes in place of computed styles.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use regex::Regex;

use super::{BLOCK_SENTINELS, Normalized};
use crate::utils::{BACKGROUND_IMAGE_CONTENT_THRESHOLD, EMBED_REPLACEMENT_CLASS};

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*["']?([^"')]+?)["']?\s*\)"#)
        .expect("BACKGROUND_URL: hardcoded regex is valid")
});

/// Normalize a full HTML document
///
/// `frames` maps iframe `src` values to captured body HTML; matching frames
/// are replaced by a `div` holding that markup.
///
/// # Errors
///
/// Fails only if the mutated document cannot be serialized.
pub fn normalize_html(html: &str, frames: &BTreeMap<String, String>) -> Result<Normalized> {
    let document = kuchiki::parse_html().one(html.to_string());

    // Collect first; nodes are detached while walking
    let elements: Vec<NodeDataRef<ElementData>> = document
        .select("body *")
        .map_err(|()| anyhow!("Invalid selector: body *"))?
        .collect();

    for element in elements {
        let node = element.as_node().clone();
        if !node.ancestors().any(|a| a == document) {
            continue;
        }
        normalize_element(&element, &node, frames)?;
    }

    let blocked = BLOCK_SENTINELS
        .iter()
        .any(|selector| document.select_first(selector).is_ok());
    if blocked {
        return Ok(Normalized::Blocked);
    }

    let mut output = Vec::new();
    document
        .serialize(&mut output)
        .context("Failed to serialize normalized document")?;
    let html = String::from_utf8(output).context("Normalized document is not UTF-8")?;
    Ok(Normalized::Content(html))
}

fn normalize_element(
    element: &NodeDataRef<ElementData>,
    node: &NodeRef,
    frames: &BTreeMap<String, String>,
) -> Result<()> {
    let tag = element.name.local.to_ascii_lowercase().to_string();
    let (style, src) = {
        let attrs = element.attributes.borrow();
        (
            attrs.get("style").map(parse_style).unwrap_or_default(),
            attrs.get("src").map(str::to_string),
        )
    };
    let blurred = style
        .get("filter")
        .is_some_and(|f| f.starts_with("blur"));

    if (tag == "img" || tag == "image") && blurred {
        node.detach();
        return Ok(());
    }

    let background = style
        .get("background-image")
        .or_else(|| style.get("background"))
        .filter(|v| v.as_str() != "none");
    if let Some(background) = background {
        if blurred {
            node.detach();
            return Ok(());
        }
        if let Some(image_url) = BACKGROUND_URL.captures(background).and_then(|c| c.get(1))
            && src.is_none()
            && inner_html_len(node) < BACKGROUND_IMAGE_CONTENT_THRESHOLD
        {
            let markup = format!(
                r#"<img src="{}">"#,
                html_escape::encode_double_quoted_attribute(image_url.as_str())
            );
            replace_with(node, &markup, "img")?;
            return Ok(());
        }
    }

    if tag == "iframe"
        && let Some(captured) = src.as_deref().and_then(|s| frames.get(s))
    {
        let markup = format!(r#"<div class="{EMBED_REPLACEMENT_CLASS}">{captured}</div>"#);
        replace_with(node, &markup, &format!("div.{EMBED_REPLACEMENT_CLASS}"))?;
    }

    Ok(())
}

/// Lower-cased property -> trimmed value for an inline `style` attribute
fn parse_style(style: &str) -> HashMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(prop, value)| (prop.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(prop, _)| !prop.is_empty())
        .collect()
}

fn inner_html_len(node: &NodeRef) -> usize {
    node.children()
        .map(|child| {
            let mut buf = Vec::new();
            match child.serialize(&mut buf) {
                Ok(()) => buf.len(),
                Err(_) => 0,
            }
        })
        .sum()
}

/// Replace `node` with the first element matching `selector` in `markup`
fn replace_with(node: &NodeRef, markup: &str, selector: &str) -> Result<()> {
    let fragment = kuchiki::parse_html().one(markup.to_string());
    let replacement = fragment
        .select_first(selector)
        .map_err(|()| anyhow!("Replacement markup has no {selector}"))?;
    let replacement = replacement.as_node().clone();
    replacement.detach();
    node.insert_before(replacement);
    node.detach();
    Ok(())
}
