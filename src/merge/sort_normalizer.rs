use super::{
    coordinate::Coordinate,
    vcf_reader::{parse_coordinate, VcfReader, VcfReaders},
};
use crate::utils::{MergeError, Result};
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// True when every data row is >= its predecessor by coordinate.
pub fn is_sorted(reader: &VcfReader) -> Result<bool> {
    let mut previous: Option<Coordinate> = None;
    for entry in reader.data_lines()? {
        let (line_no, line) = entry?;
        let coordinate = parse_coordinate(&line, line_no, reader.path())?;
        if let Some(prev) = &previous {
            if coordinate < *prev {
                log::debug!(
                    "{} is unsorted: {} follows {} at line {}",
                    reader.file_name(),
                    coordinate,
                    prev,
                    line_no
                );
                return Ok(false);
            }
        }
        previous = Some(coordinate);
    }
    Ok(true)
}

/// Write `reader`'s file to `destination` with its rows in ascending
/// coordinate order. The header is copied verbatim and rows that compare
/// equal keep their input order.
///
/// Rows go to a temporary file next to `destination` that replaces it only
/// once complete, so sorting a file onto itself never truncates the input.
pub fn write_sorted(reader: &VcfReader, destination: &Path) -> Result<()> {
    let mut rows: Vec<(Coordinate, String)> = Vec::new();
    for entry in reader.data_lines()? {
        let (line_no, line) = entry?;
        let coordinate = parse_coordinate(&line, line_no, reader.path())?;
        rows.push((coordinate, line));
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let write_err = |e: std::io::Error| {
        MergeError::io(format!("Failed to write sorted VCF {}", destination.display()), e)
    };
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut writer = BufWriter::new(NamedTempFile::new_in(parent).map_err(write_err)?);
    for line in reader.header().metaheaders() {
        writeln!(writer, "{}", line).map_err(write_err)?;
    }
    writeln!(writer, "{}", reader.header().column_header()).map_err(write_err)?;
    for (_, line) in &rows {
        writeln!(writer, "{}", line).map_err(write_err)?;
    }
    let tmp_file = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    tmp_file
        .persist(destination)
        .map_err(|e| write_err(e.error))?;

    log::debug!(
        "Sorted {} rows of {} into {}",
        rows.len(),
        reader.file_name(),
        destination.display()
    );
    Ok(())
}

/// Replace every unsorted input with a sorted copy inside `tmp_dir`.
///
/// Sorted inputs are returned untouched. The copies keep their original file
/// names so patient prefixes survive; `tmp_dir` belongs to the caller.
pub fn normalize(readers: VcfReaders, tmp_dir: &Path) -> Result<VcfReaders> {
    let mut normalized = Vec::with_capacity(readers.len());
    let mut n_sorted = 0;
    for reader in readers.readers {
        if is_sorted(&reader)? {
            normalized.push(reader);
            continue;
        }
        let destination: PathBuf = tmp_dir.join(reader.file_name());
        log::info!(
            "{} is not sorted by coordinate, sorting into {}",
            reader.file_name(),
            tmp_dir.display()
        );
        write_sorted(&reader, &destination)?;
        normalized.push(VcfReader::open(destination)?);
        n_sorted += 1;
    }
    log::debug!("Sorted {} of {} input VCF(s)", n_sorted, normalized.len());
    Ok(VcfReaders {
        readers: normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_util::{TestVcfBuilder, TestVcfRecord};
    use std::fs;
    use tempfile::tempdir;

    fn builder() -> TestVcfBuilder {
        TestVcfBuilder::new()
            .contig("chr1", 1000)
            .contig("chr2", 1000)
            .format("JQ_AF", "1", "Float", "Allele frequency")
            .sample("TUMOR")
    }

    #[test]
    fn test_sorted_file_is_used_in_place() -> Result<()> {
        let in_dir = tempdir().unwrap();
        let tmp_dir = tempdir().unwrap();
        let path = builder()
            .record(TestVcfRecord::new("chr1", 5, "A", "G").format("JQ_AF", &["0.1"]))
            .record(TestVcfRecord::new("chr1", 50, "A", "G").format("JQ_AF", &["0.2"]))
            .record(TestVcfRecord::new("chr2", 1, "A", "G").format("JQ_AF", &["0.3"]))
            .write_to(in_dir.path(), "P1.a.vcf");
        let before = fs::read(&path).unwrap();

        let readers = normalize(VcfReaders::open(vec![path.clone()])?, tmp_dir.path())?;
        assert_eq!(readers.readers[0].path(), path.as_path());
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 0);
        Ok(())
    }

    #[test]
    fn test_reversed_file_is_sorted_into_tmp_dir() -> Result<()> {
        let in_dir = tempdir().unwrap();
        let tmp_dir = tempdir().unwrap();
        let path = builder()
            .record(TestVcfRecord::new("chr2", 1, "A", "G").format("JQ_AF", &["0.3"]))
            .record(TestVcfRecord::new("chr1", 50, "A", "G").format("JQ_AF", &["0.2"]))
            .record(TestVcfRecord::new("chr1", 5, "A", "G").format("JQ_AF", &["0.1"]))
            .write_to(in_dir.path(), "P1.a.vcf");

        let reader = VcfReader::open(&path)?;
        assert!(!is_sorted(&reader)?);

        let readers = normalize(VcfReaders::open(vec![path.clone()])?, tmp_dir.path())?;
        let sorted = &readers.readers[0];
        assert_eq!(sorted.path(), tmp_dir.path().join("P1.a.vcf").as_path());
        assert_eq!(sorted.patient(), "P1");
        assert!(is_sorted(sorted)?);

        let positions: Vec<(String, u64)> = sorted
            .records()?
            .map(|r| r.map(|r| (r.coordinate.chrom().to_string(), r.coordinate.pos())))
            .collect::<Result<_>>()?;
        assert_eq!(
            positions,
            vec![
                ("chr1".to_string(), 5),
                ("chr1".to_string(), 50),
                ("chr2".to_string(), 1)
            ]
        );

        let original = fs::read_to_string(&path).unwrap();
        let rewritten = fs::read_to_string(sorted.path()).unwrap();
        let header_of = |text: &str| -> Vec<String> {
            text.lines()
                .filter(|l| l.starts_with('#'))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(header_of(&original), header_of(&rewritten));
        Ok(())
    }

    #[test]
    fn test_write_sorted_is_stable_for_already_sorted_input() -> Result<()> {
        let in_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let path = builder()
            .record(TestVcfRecord::new("chr1", 5, "A", "G").format("JQ_AF", &["0.1"]))
            .record(TestVcfRecord::new("chr1", 9, "C", "T").format("JQ_AF", &["0.2"]))
            .write_to(in_dir.path(), "P1.a.vcf");
        let destination = out_dir.path().join("copy.vcf");
        write_sorted(&VcfReader::open(&path)?, &destination)?;
        assert_eq!(fs::read(&path).unwrap(), fs::read(&destination).unwrap());
        Ok(())
    }

    #[test]
    fn test_unparsable_row_is_an_error() {
        let in_dir = tempdir().unwrap();
        let path = in_dir.path().join("P1.a.vcf");
        fs::write(
            &path,
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\tten\t.\tA\tG\t.\t.\t.\n",
        )
        .unwrap();
        let reader = VcfReader::open(&path).unwrap();
        assert!(is_sorted(&reader).is_err());
    }
}
