use super::vcf_reader::VcfReaders;
use crate::utils::{MergeError, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// Tags written by the upstream translate step
pub const DEFAULT_INCLUDED_FORMAT_TAGS: &[&str] = &["JQ_.*"];

/// Chooses which declared FORMAT tags survive into the merged output.
#[derive(Debug)]
pub struct FormatTagSelector {
    patterns: Vec<(String, Regex)>,
}

impl FormatTagSelector {
    /// Patterns must match a whole tag name.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(MergeError::Config(
                "at least one FORMAT tag inclusion pattern is required".to_string(),
            ));
        }
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{})$", pattern))
                    .map(|regex| (pattern.to_string(), regex))
                    .map_err(|e| {
                        MergeError::Config(format!(
                            "invalid FORMAT tag pattern '{}': {}",
                            pattern, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FormatTagSelector { patterns })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_INCLUDED_FORMAT_TAGS)
    }

    /// Sorted retained tag names. Patterns that match nothing are logged as
    /// warnings; retaining nothing at all is a configuration error.
    pub fn select(&self, readers: &VcfReaders) -> Result<Vec<String>> {
        let declared: BTreeSet<&str> = readers
            .readers
            .iter()
            .flat_map(|reader| reader.header().declarations("FORMAT"))
            .map(|(id, _)| id)
            .collect();
        self.select_from(declared)
    }

    fn select_from<'a>(&self, declared: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
        let (retained, unused) = self.match_tags(declared);

        if retained.is_empty() {
            return Err(MergeError::Config(format!(
                "the FORMAT tag inclusion pattern(s) [{}] excluded all FORMAT tags; review the inputs or the --include-format-tags value",
                self.pattern_list()
            )));
        }

        for pattern in unused {
            log::warn!(
                "FORMAT tag inclusion pattern '{}' did not match any FORMAT tag in the inputs (it may be irrelevant or misspelled)",
                pattern
            );
        }

        log::debug!("Retaining {} FORMAT tag(s): {:?}", retained.len(), retained);
        Ok(retained.into_iter().collect())
    }

    /// Tags matched by any pattern, and the patterns that matched no tag.
    fn match_tags<'a>(
        &self,
        declared: impl IntoIterator<Item = &'a str>,
    ) -> (BTreeSet<String>, Vec<&str>) {
        let mut used = vec![false; self.patterns.len()];
        let mut retained = BTreeSet::new();
        for tag in declared {
            for (idx, (_, regex)) in self.patterns.iter().enumerate() {
                if regex.is_match(tag) {
                    retained.insert(tag.to_string());
                    used[idx] = true;
                }
            }
        }
        let unused = self
            .patterns
            .iter()
            .zip(&used)
            .filter(|(_, was_used)| !**was_used)
            .map(|((pattern, _), _)| pattern.as_str())
            .collect();
        (retained, unused)
    }

    fn pattern_list(&self) -> String {
        self.patterns
            .iter()
            .map(|(pattern, _)| pattern.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
