//! Line-oriented rewriting of `key=value` properties files.
//!
//! A line is patched when it starts with `<key>=` for one of the rule keys;
//! the whole line is replaced by the rule's line and its original terminator
//! is kept. Every other line passes through byte-for-byte, in order. Nothing
//! is ever added: rule keys that never occur are only reported back.

use std::fmt;

use crate::security::SecretString;

/// Heap size the web server runs with after bootstrap.
pub const WEB_SERVER_MAX_HEAP: &str = "4096M";
pub const WEB_SERVER_PORT: u16 = 80;
pub const WEB_SERVER_SSL_PORT: u16 = 443;

/// One replacement: every line starting with `key=` becomes `key=value`.
#[derive(Clone, PartialEq, Eq)]
pub struct PatchRule {
    key: String,
    value: String,
    sensitive: bool,
}

impl PatchRule {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    /// A rule whose value must never show up in logs.
    pub fn secret(key: impl Into<String>, value: &SecretString) -> Self {
        Self {
            key: key.into(),
            value: value.expose().to_string(),
            sensitive: true,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The `key=` prefix a line must start with to be replaced.
    pub fn prefix(&self) -> String {
        format!("{}=", self.key)
    }

    /// The full replacement line, without terminator.
    pub fn line(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    fn matches(&self, line: &str) -> bool {
        line.len() > self.key.len()
            && line.starts_with(self.key.as_str())
            && line.as_bytes()[self.key.len()] == b'='
    }
}

impl fmt::Debug for PatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.sensitive {
            "[REDACTED]"
        } else {
            self.value.as_str()
        };
        f.debug_struct("PatchRule")
            .field("key", &self.key)
            .field("value", &value)
            .finish()
    }
}

/// Ordered set of patch rules, at most one per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRules {
    rules: Vec<PatchRule>,
}

/// Result of rewriting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedContent {
    pub content: String,
    /// Number of existing lines that were replaced.
    pub replaced: usize,
    /// Rule keys with no matching line; the content does not contain them.
    pub missing: Vec<String>,
}

impl PatchRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing any earlier rule for the same key.
    pub fn with_rule(mut self, rule: PatchRule) -> Self {
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.key())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `input`. Pure; performs no I/O.
    pub fn rewrite(&self, input: &str) -> PatchedContent {
        let mut content = String::with_capacity(input.len());
        let mut seen = vec![false; self.rules.len()];
        let mut replaced = 0;

        for raw in input.split_inclusive('\n') {
            let (line, ending) = split_terminator(raw);
            match self.rules.iter().position(|rule| rule.matches(line)) {
                Some(idx) => {
                    content.push_str(&self.rules[idx].line());
                    content.push_str(ending);
                    seen[idx] = true;
                    replaced += 1;
                }
                None => content.push_str(raw),
            }
        }

        let missing = self
            .rules
            .iter()
            .zip(seen)
            .filter(|(_, seen)| !seen)
            .map(|(rule, _)| rule.key.clone())
            .collect();

        PatchedContent {
            content,
            replaced,
            missing,
        }
    }
}

fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}

/// The web server settings every bootstrapped server runs with: HTTP on 80,
/// HTTPS on 443 backed by the freshly issued keystore.
pub fn server_patch_rules(keystore_password: &SecretString) -> PatchRules {
    PatchRules::new()
        .with_rule(PatchRule::new("webServerMaxHeapSize", WEB_SERVER_MAX_HEAP))
        .with_rule(PatchRule::new("webServerPort", WEB_SERVER_PORT.to_string()))
        .with_rule(PatchRule::new(
            "webServerSslPort",
            WEB_SERVER_SSL_PORT.to_string(),
        ))
        .with_rule(PatchRule::new("webServerEnableHttps", "true"))
        .with_rule(PatchRule::secret(
            "webServerKeystorePass",
            keystore_password,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port_rule() -> PatchRules {
        PatchRules::new().with_rule(PatchRule::new("webServerPort", "80"))
    }

    #[test]
    fn replaces_matching_line_and_keeps_others_in_order() {
        let out = port_rule().rewrite("webServerPort=8080\nfoo=bar\n");
        assert_eq!(out.content, "webServerPort=80\nfoo=bar\n");
        assert_eq!(out.replaced, 1);
        assert!(out.missing.is_empty());
    }

    #[test]
    fn prefix_must_include_the_equals_sign() {
        let rules = port_rule();
        let input = "webServerPortRange=1-2\nwebServerSslPort=8443\n";
        let out = rules.rewrite(input);
        assert_eq!(out.content, input);
        assert_eq!(out.replaced, 0);
        assert_eq!(out.missing, vec!["webServerPort".to_string()]);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let secret = SecretString::new("s3cret".to_string());
        let rules = server_patch_rules(&secret);
        let input = "# comment\nwebServerPort=8080\nwebServerEnableHttps=false\nother=1";
        let once = rules.rewrite(input).content;
        let twice = rules.rewrite(&once).content;
        assert_eq!(once, twice);
    }

    #[test]
    fn unmatched_lines_are_preserved_verbatim() {
        let input = "a=1\r\n  webServerPort=1\r\n# webServerPort=2\r\nz";
        let out = port_rule().rewrite(input);
        assert_eq!(out.content, input);
    }

    #[test]
    fn absent_keys_are_reported_and_never_added() {
        let secret = SecretString::new("pw".to_string());
        let input = "webServerPort=8080
other=1
";

        let out = server_patch_rules(&secret).rewrite(input);

        assert_eq!(out.content, "webServerPort=80
other=1
");
        assert_eq!(out.content.lines().count(), input.lines().count());
        assert_eq!(
            out.missing,
            vec![
                "webServerMaxHeapSize",
                "webServerSslPort",
                "webServerEnableHttps",
                "webServerKeystorePass",
            ]
        );
    }

    #[test]
    fn crlf_terminators_survive_replacement() {
        let out = port_rule().rewrite("webServerPort=1\r\nx=y\r\n");
        assert_eq!(out.content, "webServerPort=80\r\nx=y\r\n");
    }

    #[test]
    fn later_rule_for_same_key_wins() {
        let rules = PatchRules::new()
            .with_rule(PatchRule::new("k", "1"))
            .with_rule(PatchRule::new("k", "2"));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rewrite("k=0\n").content, "k=2\n");
    }

    #[test]
    fn server_rules_cover_all_web_server_keys() {
        let secret = SecretString::new("pw".to_string());
        let rules = server_patch_rules(&secret);
        let keys: Vec<&str> = rules.keys().collect();
        assert_eq!(
            keys,
            vec![
                "webServerMaxHeapSize",
                "webServerPort",
                "webServerSslPort",
                "webServerEnableHttps",
                "webServerKeystorePass",
            ]
        );
        let input = "webServerMaxHeapSize=1024M\nwebServerPort=8080\nwebServerSslPort=8443\nwebServerEnableHttps=false\nwebServerKeystorePass=\n";
        let out = rules.rewrite(input);
        assert_eq!(
            out.content,
            "webServerMaxHeapSize=4096M\nwebServerPort=80\nwebServerSslPort=443\nwebServerEnableHttps=true\nwebServerKeystorePass=pw\n"
        );
    }

    #[test]
    fn sensitive_rule_value_is_redacted_in_debug() {
        let secret = SecretString::new("topsecret".to_string());
        let rules = server_patch_rules(&secret);
        let debug = format!("{:?}", rules);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
