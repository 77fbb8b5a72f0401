//! Clipboard-style watcher
//!
//! Each input line stands for one clipboard change. Every line is echoed to
//! the output as the clipboard would read after processing: either the line
//! itself or, when a chain settles on a different URL, its rewrite.

use std::io::{self, BufRead, Write};

use lp_core::{resolve, ChainOptions, ChainStatus, RuleSet};
use url::Url;

/// True for an absolute `http`/`https` URL with a non-empty host. The
/// scheme must be followed by `//` and an authority.
pub fn is_url(text: &str) -> bool {
    let text = text.trim();
    let Ok(parsed) = Url::parse(text) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let has_authority = text
        .get(parsed.scheme().len()..)
        .is_some_and(|rest| rest.starts_with("://") && !rest.starts_with(":///"));
    has_authority && parsed.host_str().is_some_and(|host| !host.is_empty())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    pub lines: usize,
    pub urls: usize,
    pub rewritten: usize,
}

#[derive(Debug)]
pub struct Watcher<'a> {
    rules: &'a RuleSet,
    options: ChainOptions,
    notify: bool,
    last: String,
    stats: WatchStats,
}

impl<'a> Watcher<'a> {
    pub fn new(rules: &'a RuleSet, options: ChainOptions, notify: bool) -> Self {
        Self {
            rules,
            options,
            notify,
            last: String::new(),
            stats: WatchStats::default(),
        }
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    /// Handle one clipboard change. Returns the replacement text when the
    /// content should be written back.
    pub fn observe(&mut self, content: &str) -> Option<String> {
        if content.is_empty() || content == self.last {
            return None;
        }
        self.last = content.to_string();
        if !is_url(content) {
            return None;
        }

        self.stats.urls += 1;
        tracing::info!("new URL detected: {}", content);

        let result = resolve(self.rules, content, &self.options);
        match result.status {
            ChainStatus::Matched => {
                tracing::info!("rule chain matched: {:?}", result.urls);
            }
            ChainStatus::CircularRedirect => {
                tracing::info!(
                    "circular redirect detected for {}, chain: {:?}",
                    content,
                    result.urls
                );
                return None;
            }
            ChainStatus::InfiniteRedirect => {
                tracing::info!(
                    "infinite redirect detected for {}, chain: {:?}",
                    content,
                    result.urls
                );
                return None;
            }
            ChainStatus::NotMatched => {
                tracing::info!("no matching rule for {}", content);
                return None;
            }
        }

        let rewritten = result
            .final_url()
            .filter(|url| !url.is_empty() && *url != content)?
            .to_string();
        tracing::info!("URL rewritten: {} -> {}", content, rewritten);
        if self.notify {
            tracing::info!(title = "URL Rewritten", body = %rewritten, "notification");
        }

        self.last = rewritten.clone();
        self.stats.rewritten += 1;
        Some(rewritten)
    }

    /// Feed every line of `input` through [`Watcher::observe`], writing the
    /// resulting clipboard content to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<WatchStats> {
        for line in input.lines() {
            let line = line?;
            let content = line.strip_suffix('\r').unwrap_or(&line);
            self.stats.lines += 1;

            match self.observe(content) {
                Some(rewritten) => writeln!(output, "{rewritten}")?,
                None => writeln!(output, "{content}")?,
            }
            output.flush()?;
        }
        Ok(self.stats)
    }
}
