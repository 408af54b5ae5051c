//! Navigation state: the target URL plus the named params the router
//! extracted from it (`envHrid`, `apiId`, ...).
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ENV_PARAM: &str = "envHrid";
pub const API_PARAM: &str = "apiId";
pub const APPLICATION_PARAM: &str = "applicationId";
pub const INTEGRATION_PARAM: &str = "integrationId";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub url: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Navigation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// The path part of the URL, without query or fragment.
    pub fn path(&self) -> &str {
        split_url(&self.url).0
    }

    /// Replace the first path segment equal to `from` (ignoring case) with
    /// `to`, keeping the rest of the path, query and fragment.
    ///
    /// Returns `None` when no segment matches.
    pub fn replace_segment(&self, from: &str, to: &str) -> Option<String> {
        let (path, suffix) = split_url(&self.url);
        let mut replaced = false;
        let segments: Vec<&str> = path
            .split('/')
            .map(|segment| {
                if !replaced && !segment.is_empty() && segment.eq_ignore_ascii_case(from) {
                    replaced = true;
                    to
                } else {
                    segment
                }
            })
            .collect();
        replaced.then(|| format!("{}{}", segments.join("/"), suffix))
    }
}

impl std::fmt::Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn split_url(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_first_matching_segment_only() {
        let nav = Navigation::new("/default/apis/default?tab=plans#top");
        assert_eq!(
            nav.replace_segment("DEFAULT", "fr-apim-master-dev").as_deref(),
            Some("/fr-apim-master-dev/apis/default?tab=plans#top")
        );
        assert_eq!(nav.path(), "/default/apis/default");
    }

    #[test]
    fn no_matching_segment() {
        let nav = Navigation::new("/prod/apis");
        assert!(nav.replace_segment("default", "x").is_none());
        assert!(nav.replace_segment("pro", "x").is_none());
    }

    #[test]
    fn empty_params_are_absent() {
        let nav = Navigation::new("/x").with_param(API_PARAM, "").with_param(ENV_PARAM, "dev");
        assert_eq!(nav.param(API_PARAM), None);
        assert_eq!(nav.param(ENV_PARAM), Some("dev"));
    }
}
