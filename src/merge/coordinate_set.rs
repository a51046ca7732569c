use super::{
    coordinate::{Coordinate, VariantRecord},
    vcf_reader::{VcfReader, VcfReaders},
};
use crate::utils::{format_number_with_commas, MergeError, Result};
use std::collections::{btree_map::Entry, BTreeMap, HashMap, HashSet};

pub const MULT_ALT_TAG: &str = "JQ_MULT_ALT_LOCUS";
pub const MULT_ALT_HEADER: &str = "##INFO=<ID=JQ_MULT_ALT_LOCUS,Number=0,Type=Flag,Description=\"More than one alt allele was seen at this locus.\">";

/// Every distinct coordinate across the inputs, in ascending order.
///
/// Each entry is the sample-free record that first introduced the
/// coordinate (reader order), with INFO reduced to keys its source declares
/// and the multi-allelic flag attached where it applies.
#[derive(Debug, Default)]
pub struct CoordinateSet {
    records: Vec<VariantRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChromNaming {
    Prefixed,
    Unprefixed,
    Mixed,
}

impl ChromNaming {
    fn of(prefixed: usize, unprefixed: usize) -> Option<Self> {
        match (prefixed, unprefixed) {
            (0, 0) => None,
            (_, 0) => Some(ChromNaming::Prefixed),
            (0, _) => Some(ChromNaming::Unprefixed),
            _ => Some(ChromNaming::Mixed),
        }
    }
}

fn has_chr_prefix(chrom: &str) -> bool {
    chrom
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("chr"))
}

impl CoordinateSet {
    pub fn build(readers: &VcfReaders) -> Result<Self> {
        let mut first_seen: BTreeMap<Coordinate, VariantRecord> = BTreeMap::new();
        let mut alleles_at_locus: HashMap<(String, u64), HashSet<(String, String)>> =
            HashMap::new();
        let mut naming: Vec<(&str, ChromNaming)> = Vec::new();

        for reader in &readers.readers {
            let (prefixed, unprefixed) =
                Self::scan_reader(reader, &mut first_seen, &mut alleles_at_locus)?;
            if let Some(style) = ChromNaming::of(prefixed, unprefixed) {
                naming.push((reader.file_name(), style));
            }
        }
        Self::check_chrom_naming(&naming)?;

        let mut n_flagged = 0;
        let records: Vec<VariantRecord> = first_seen
            .into_values()
            .map(|mut record| {
                let coordinate = &record.coordinate;
                let inferred = alleles_at_locus
                    .get(&(coordinate.chrom().to_string(), coordinate.pos()))
                    .is_some_and(|alleles| alleles.len() > 1);
                if inferred || coordinate.has_multiple_alts() {
                    record.add_info_flag(MULT_ALT_TAG);
                    n_flagged += 1;
                }
                record
            })
            .collect();

        log::info!(
            "Found {} distinct coordinate(s) across {} input VCF(s), {} at multi-allelic loci",
            format_number_with_commas(records.len()),
            readers.len(),
            format_number_with_commas(n_flagged)
        );
        Ok(CoordinateSet { records })
    }

    fn scan_reader(
        reader: &VcfReader,
        first_seen: &mut BTreeMap<Coordinate, VariantRecord>,
        alleles_at_locus: &mut HashMap<(String, u64), HashSet<(String, String)>>,
    ) -> Result<(usize, usize)> {
        let declared_info = reader.declared_info_ids();
        let mut prefixed = 0;
        let mut unprefixed = 0;

        for record in reader.records()? {
            let record = record?;
            let coordinate = &record.coordinate;
            if has_chr_prefix(coordinate.chrom()) {
                prefixed += 1;
            } else {
                unprefixed += 1;
            }

            alleles_at_locus
                .entry((coordinate.chrom().to_string(), coordinate.pos()))
                .or_default()
                .insert((
                    coordinate.reference().to_string(),
                    coordinate.alt().to_string(),
                ));

            if let Entry::Vacant(slot) = first_seen.entry(coordinate.clone()) {
                let mut template = record.without_samples();
                template.info.retain(|entry| {
                    let key = super::coordinate::info_key(entry);
                    let keep = declared_info.contains(key);
                    if !keep {
                        log::trace!(
                            "Dropping undeclared INFO key {} at {} from {}",
                            key,
                            coordinate,
                            reader.file_name()
                        );
                    }
                    keep
                });
                slot.insert(template);
            }
        }
        Ok((prefixed, unprefixed))
    }

    fn check_chrom_naming(naming: &[(&str, ChromNaming)]) -> Result<()> {
        let prefixed = naming
            .iter()
            .find(|(_, style)| *style == ChromNaming::Prefixed);
        let unprefixed = naming
            .iter()
            .find(|(_, style)| *style == ChromNaming::Unprefixed);
        if let (Some((with_chr, _)), Some((without_chr, _))) = (prefixed, unprefixed) {
            return Err(MergeError::IncompatibleInputs(format!(
                "chromosome naming differs between inputs: {} uses 'chr'-prefixed names, {} does not",
                with_chr, without_chr
            )));
        }
        Ok(())
    }

    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Chromosomes in the order they first appear among the sorted coordinates
    pub fn contig_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.coordinate.chrom())
            .filter(|chrom| seen.insert(*chrom))
            .collect()
    }

    /// INFO keys used by any coordinate, in order of first use
    pub fn info_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .flat_map(|record| record.info_keys())
            .filter(|key| seen.insert(*key))
            .collect()
    }
}
