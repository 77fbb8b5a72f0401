//! Decoding-aware template substitution
//!
//! Capture groups are percent-decoded before they are spliced into the
//! template, so a rule author writes `q=$1` and gets a readable query back.
//!
//! Placeholders are resolved in a single left-to-right pass. For `$` followed
//! by a run of digits, the longest prefix of the run naming an existing group
//! wins and the remaining digits stay literal: with two groups `$12` is group
//! 1 followed by `2`, with twelve groups it is group 12. `$0`, leading zeros
//! and unknown indices are copied through untouched. Substituted text is
//! never rescanned.

use std::borrow::Cow;

use fancy_regex::Captures;

use crate::decode::decode_or_raw;

/// Build the rewritten URL from a match and a template.
pub fn substitute(captures: &Captures<'_>, template: &str) -> String {
    let groups: Vec<Cow<'_, str>> = (1..captures.len())
        .map(|i| match captures.get(i) {
            Some(m) => decode_or_raw(m.as_str()),
            None => Cow::Borrowed(""),
        })
        .collect();

    expand_placeholders(template, &groups)
}

/// Replace `$N` placeholders with `groups[N - 1]`.
pub fn expand_placeholders<S: AsRef<str>>(template: &str, groups: &[S]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digit_run = after.bytes().take_while(u8::is_ascii_digit).count();

        match resolve_index(&after[..digit_run], groups.len()) {
            Some((index, used)) => {
                out.push_str(groups[index - 1].as_ref());
                rest = &after[used..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Longest digit prefix naming a group in `1..=group_count`, with its length.
fn resolve_index(digits: &str, group_count: usize) -> Option<(usize, usize)> {
    if digits.is_empty() || digits.starts_with('0') {
        return None;
    }

    (1..=digits.len()).rev().find_map(|len| {
        let index: usize = digits[..len].parse().ok()?;
        (index <= group_count).then_some((index, len))
    })
}
