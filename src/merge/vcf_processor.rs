use super::{
    buffered_reader::BufferedReader,
    coordinate::{VariantRecord, MISSING_VALUE},
    coordinate_set::CoordinateSet,
    filters::{IncludeCells, IncludeRows},
    format_tags::{FormatTagSelector, DEFAULT_INCLUDED_FORMAT_TAGS},
    metaheader::MetaheaderCompiler,
    sort_normalizer,
    vcf_reader::{VcfReaders, VcfRecords},
    vcf_writer::VcfWriter,
};
use crate::utils::{format_number_with_commas, MergeError, Result};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// Settings of a merge run, independent of how they were collected.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Inclusion regexes for FORMAT tags, each anchored to the whole tag name
    pub format_tag_patterns: Vec<String>,
    pub include_rows: IncludeRows,
    pub include_cells: IncludeCells,
    /// Metaheaders describing the invocation, written after `##fileformat`
    pub execution_context: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            format_tag_patterns: DEFAULT_INCLUDED_FORMAT_TAGS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            include_rows: IncludeRows::default(),
            include_cells: IncludeCells::default(),
            execution_context: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeProgress {
    pub seen: usize,
    pub written: usize,
    pub excluded: usize,
}

type RecordReader = BufferedReader<VcfRecords, VariantRecord>;

/// Drives a merge: the first passes run in `new`, the streaming join in
/// `merge_variants`. Nothing is written before `merge_variants` is called.
pub struct VcfProcessor {
    vcf_readers: VcfReaders,
    coordinates: CoordinateSet,
    format_tags: Vec<String>,
    sample_names: Vec<String>,
    header_lines: Vec<String>,
    include_rows: IncludeRows,
    include_cells: IncludeCells,
}

impl VcfProcessor {
    /// Unsorted inputs are sorted into `tmp_dir`, which the caller owns and
    /// must keep alive until the merge is done.
    pub fn new(vcfs: Vec<PathBuf>, tmp_dir: &Path, options: &MergeOptions) -> Result<Self> {
        if vcfs.is_empty() {
            return Err(MergeError::Config(
                "no input VCF files to merge".to_string(),
            ));
        }
        let selector = FormatTagSelector::new(&options.format_tag_patterns)?;

        let vcf_readers = VcfReaders::open(vcfs)?;
        let vcf_readers = sort_normalizer::normalize(vcf_readers, tmp_dir)?;
        let coordinates = CoordinateSet::build(&vcf_readers)?;
        let format_tags = selector.select(&vcf_readers)?;
        let sample_names = vcf_readers.sample_names();
        log::debug!(
            "Merging {} sample column(s) from {} VCF(s)",
            sample_names.len(),
            vcf_readers.len()
        );

        let header_lines =
            MetaheaderCompiler::new(&vcf_readers, &coordinates, &format_tags, &sample_names)
                .compile(&options.execution_context);

        Ok(VcfProcessor {
            vcf_readers,
            coordinates,
            format_tags,
            sample_names,
            header_lines,
            include_rows: options.include_rows,
            include_cells: options.include_cells,
        })
    }

    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn format_tags(&self) -> &[String] {
        &self.format_tags
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    /// Write the header and one row per coordinate, in coordinate order.
    pub fn merge_variants<W: Write>(&self, writer: &mut VcfWriter<W>) -> Result<MergeProgress> {
        writer.write_header(&self.header_lines)?;

        let mut readers = self
            .vcf_readers
            .readers
            .iter()
            .map(|reader| BufferedReader::new(reader.records()?))
            .collect::<Result<Vec<RecordReader>>>()?;

        let mut progress = MergeProgress::default();
        let mut contributing: Vec<VariantRecord> = Vec::with_capacity(readers.len());
        for template in self.coordinates.records() {
            progress.seen += 1;
            contributing.clear();
            for reader in readers.iter_mut() {
                while let Some(record) = reader.next_if_matches(&template.coordinate)? {
                    contributing.push(record);
                }
            }

            if !self.include_rows.keeps(&contributing) {
                log::trace!("Excluding {} ({})", template.coordinate, self.include_rows);
                progress.excluded += 1;
                continue;
            }

            let samples = self.sample_matrix(&contributing);
            writer.write_record(template, &self.format_tags, &samples)?;
            progress.written += 1;
        }

        // Every record was read in the coordinate pass, a leftover means the
        // file changed in between
        for (reader, source) in readers.iter().zip(&self.vcf_readers.readers) {
            if let Some(record) = reader.peek() {
                return Err(MergeError::IncompatibleInputs(format!(
                    "{} changed during the merge: {} was not seen in the coordinate pass",
                    source.file_name(),
                    record.coordinate
                )));
            }
        }

        self.log_merge_summary(&progress);
        Ok(progress)
    }

    /// Per sample column, one value per retained tag.
    ///
    /// Sources are consulted in reader order and the first one supplying a
    /// non-missing value wins. Values from records dropped by the cell filter
    /// are never used.
    fn sample_matrix<'r>(&'r self, contributing: &'r [VariantRecord]) -> Vec<Vec<&'r str>> {
        self.sample_names
            .iter()
            .map(|sample| {
                self.format_tags
                    .iter()
                    .map(|tag| {
                        contributing
                            .iter()
                            .filter(|record| self.include_cells.keeps(record))
                            .filter_map(|record| record.sample_value(sample, tag))
                            .find(|value| *value != MISSING_VALUE)
                            .unwrap_or(MISSING_VALUE)
                    })
                    .collect()
            })
            .collect()
    }

    fn log_merge_summary(&self, progress: &MergeProgress) {
        let mut log_message = format!(
            "Successfully merged {} site(s).",
            format_number_with_commas(progress.written)
        );
        if progress.excluded > 0 {
            log_message.push_str(&format!(
                " Excluded {} site(s) with --include-rows {}.",
                format_number_with_commas(progress.excluded),
                self.include_rows
            ));
        }
        log::info!("{}", log_message);
    }
}
