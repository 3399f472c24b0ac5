//! Wrap removal, the inverse of annotation.

use std::sync::LazyLock;

use regex::Regex;

/// A well-formed wrapped span with non-empty inner text.
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("static pattern should compile"));

/// Remove well-formed `[[...]]` pairs, keeping the inner text.
///
/// Spans preceded by `!` are embeds in the host markup and are left alone.
/// Unpaired brackets are untouched.
pub fn unlink(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in LINK.captures_iter(text) {
        let m = caps.get(0).expect("group 0 always participates");
        out.push_str(&text[last..m.start()]);

        let embedded = m.start() > 0 && text.as_bytes()[m.start() - 1] == b'!';
        if embedded {
            out.push_str(m.as_str());
        } else {
            out.push_str(caps.get(1).expect("inner text group").as_str());
        }

        last = m.end();
    }

    out.push_str(&text[last..]);
    out
}

/// Remove every well-formed `[[...]]` pair, embeds included. Destructive:
/// embeds do not survive a round trip through this variant.
pub fn unlink_all(text: &str) -> String {
    LINK.replace_all(text, "$1").into_owned()
}
