use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
};

pub const MISSING_VALUE: &str = ".";

/// Identity of a variant: CHROM, POS (1-based), REF and ALT.
///
/// Ordering is natural on the chromosome name (`chr2` < `chr10`), numeric on
/// the position and lexicographic on REF then ALT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    chrom: String,
    pos: u64,
    reference: String,
    alt: String,
}

impl Coordinate {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        reference: impl Into<String>,
        alt: impl Into<String>,
    ) -> Self {
        Coordinate {
            chrom: chrom.into(),
            pos,
            reference: reference.into(),
            alt: alt.into(),
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    /// ALT written as a comma-joined list of alleles
    pub fn has_multiple_alts(&self) -> bool {
        self.alt.contains(',')
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        natord::compare(&self.chrom, &other.chrom)
            // natord treats e.g. "chr01" and "chr1" as equal, keep Ord consistent with Eq
            .then_with(|| self.chrom.cmp(&other.chrom))
            .then_with(|| self.pos.cmp(&other.pos))
            .then_with(|| self.reference.cmp(&other.reference))
            .then_with(|| self.alt.cmp(&other.alt))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom, self.pos, self.reference, self.alt
        )
    }
}

/// FORMAT tag -> value for a single sample column
pub type TagValues = HashMap<String, String>;

/// One data row: a coordinate, the record-level columns carried through a
/// merge, and per-sample tag values keyed by qualified sample name.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub coordinate: Coordinate,
    pub id: String,
    pub qual: String,
    pub filter: String,
    /// INFO entries in source order (`KEY` or `KEY=VALUE`), empty when missing
    pub info: Vec<String>,
    pub samples: HashMap<String, TagValues>,
}

impl VariantRecord {
    pub fn new(coordinate: Coordinate) -> Self {
        VariantRecord {
            coordinate,
            id: MISSING_VALUE.to_string(),
            qual: MISSING_VALUE.to_string(),
            filter: MISSING_VALUE.to_string(),
            info: Vec::new(),
            samples: HashMap::new(),
        }
    }

    /// Copy of the record-level columns without any sample data
    pub fn without_samples(&self) -> Self {
        VariantRecord {
            coordinate: self.coordinate.clone(),
            id: self.id.clone(),
            qual: self.qual.clone(),
            filter: self.filter.clone(),
            info: self.info.clone(),
            samples: HashMap::new(),
        }
    }

    pub fn info_keys(&self) -> impl Iterator<Item = &str> {
        self.info.iter().map(|entry| info_key(entry))
    }

    pub fn has_info(&self, key: &str) -> bool {
        self.info_keys().any(|k| k == key)
    }

    pub fn add_info_flag(&mut self, key: &str) {
        if !self.has_info(key) {
            self.info.push(key.to_string());
        }
    }

    pub fn is_passed(&self) -> bool {
        self.filter == "PASS"
    }

    pub fn sample_value(&self, sample: &str, tag: &str) -> Option<&str> {
        self.samples
            .get(sample)
            .and_then(|values| values.get(tag))
            .map(String::as_str)
    }

    pub fn info_column(&self) -> String {
        if self.info.is_empty() {
            MISSING_VALUE.to_string()
        } else {
            self.info.join(";")
        }
    }
}

impl AsRef<Coordinate> for VariantRecord {
    fn as_ref(&self) -> &Coordinate {
        &self.coordinate
    }
}

pub fn info_key(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(key, _)| key)
}
