//! Type definitions specific to the analyzer module.

use serde::Deserialize;

/// How invalid UTF-8 inside a log line is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Drop invalid byte sequences.
    #[default]
    Strip,
    /// Replace invalid byte sequences with U+FFFD.
    Replace,
}

/// Flags that hold for a whole parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Keep the `-SSID` suffix on callsigns instead of folding onto the base call.
    pub keep_ssid: bool,
    /// Add an edge from the source to the first relayed hop of its path.
    pub include_origins: bool,
}

/// Routing information pulled out of a single log line.
///
/// `via` is `Some` whenever the `via` keyword matched, even if nothing but
/// whitespace follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRoute<'a> {
    pub source: Option<&'a str>,
    pub via: Option<&'a str>,
}

/// One token of a via path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathHop<'a> {
    /// Token as it appeared after punctuation stripping, relay marker included.
    pub raw: &'a str,
}

impl<'a> PathHop<'a> {
    /// True when the digipeater has already repeated the packet (`*` marker).
    pub fn is_relayed(&self) -> bool {
        self.raw.contains('*')
    }

    /// Callsign with every relay marker removed, SSID folded per `keep_ssid`.
    pub fn callsign(&self, keep_ssid: bool) -> String {
        let bare = self.raw.replace('*', "");
        super::log_parser::normalize_callsign(&bare, keep_ssid).to_string()
    }
}
