use super::coordinate::{VariantRecord, MISSING_VALUE};
use crate::utils::{MergeError, Result};
use std::{
    ffi::OsString,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const MERGED_SUFFIX: &str = "merged";

/// Path actually written for a requested output path: `out.vcf` becomes
/// `out.merged.vcf`, a path without extension gets `.merged.vcf`.
pub fn merged_output_path(path: &Path) -> PathBuf {
    let (stem, extension) = match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => (stem.to_os_string(), ext.to_os_string()),
        (Some(stem), None) => (stem.to_os_string(), OsString::from("vcf")),
        _ => (OsString::from("out"), OsString::from("vcf")),
    };
    let already_merged = Path::new(&stem)
        .extension()
        .is_some_and(|ext| ext == MERGED_SUFFIX);

    let mut file_name = stem;
    if !already_merged {
        file_name.push(".");
        file_name.push(MERGED_SUFFIX);
    }
    file_name.push(".");
    file_name.push(extension);
    path.with_file_name(file_name)
}

/// Plain-text VCF output. Values are written exactly as they were read.
pub struct VcfWriter<W: Write> {
    writer: BufWriter<W>,
    n_records: usize,
}

impl<W: Write> VcfWriter<W> {
    pub fn new(inner: W) -> Self {
        VcfWriter {
            writer: BufWriter::new(inner),
            n_records: 0,
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)
            .map_err(|e| MergeError::io("Failed to write VCF output", e))
    }

    pub fn write_header(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            self.write_line(line)?;
        }
        Ok(())
    }

    /// Write one row; `samples` holds, per sample column, one value per tag
    /// in `format_tags` order.
    pub fn write_record(
        &mut self,
        record: &VariantRecord,
        format_tags: &[String],
        samples: &[Vec<&str>],
    ) -> Result<()> {
        let coordinate = &record.coordinate;
        let pos = coordinate.pos().to_string();
        let info = record.info_column();
        let format = format_tags.join(":");

        let mut columns: Vec<&str> = vec![
            coordinate.chrom(),
            pos.as_str(),
            record.id.as_str(),
            coordinate.reference(),
            coordinate.alt(),
            record.qual.as_str(),
            record.filter.as_str(),
            info.as_str(),
            format.as_str(),
        ];
        let sample_columns: Vec<String> = samples
            .iter()
            .map(|values| {
                if values.is_empty() {
                    MISSING_VALUE.to_string()
                } else {
                    values.join(":")
                }
            })
            .collect();
        columns.extend(sample_columns.iter().map(String::as_str));

        self.write_line(&columns.join("\t"))?;
        self.n_records += 1;
        Ok(())
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Flush buffered output and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| MergeError::io("Failed to flush VCF output", e.into_error()))
    }
}
