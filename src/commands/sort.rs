use crate::{
    cli::SortArgs,
    merge::{
        sort_normalizer::{is_sorted, write_sorted},
        vcf_reader::VcfReader,
    },
    utils::{MergeError, Result},
};
use std::{fs, path::Path};

pub fn sort(args: SortArgs) -> Result<()> {
    sort_vcf(&args.vcf, &args.output, args.force)?;
    Ok(())
}

/// Write `vcf` to `output` in ascending coordinate order. Returns whether any
/// rows had to be reordered; sorted input is copied unchanged.
pub fn sort_vcf(vcf: &Path, output: &Path, force: bool) -> Result<bool> {
    let same_file = match (fs::canonicalize(vcf), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if output.exists() && !force && !same_file {
        return Err(MergeError::Config(format!(
            "output file {} already exists, use --force to overwrite it",
            output.display()
        )));
    }

    let reader = VcfReader::open(vcf)?;
    if is_sorted(&reader)? {
        log::info!("{} is already sorted", reader.file_name());
        if !same_file {
            fs::copy(vcf, output).map_err(|e| {
                MergeError::io(
                    format!("Failed to copy {} to {}", vcf.display(), output.display()),
                    e,
                )
            })?;
        }
        return Ok(false);
    }

    write_sorted(&reader, output)?;
    log::info!("Wrote sorted {}", output.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_util::{TestVcfBuilder, TestVcfRecord};
    use tempfile::tempdir;

    fn builder() -> TestVcfBuilder {
        TestVcfBuilder::new()
            .contig("chr2", 1000)
            .contig("chr10", 1000)
            .format("JQ_AF", "1", "Float", "Allele frequency")
            .sample("TUMOR")
    }

    #[test]
    fn test_sorted_file_is_copied_byte_for_byte() -> Result<()> {
        let dir = tempdir().unwrap();
        let vcf = builder()
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .write_to(dir.path(), "P1.a.vcf");
        let output = dir.path().join("sorted.vcf");

        assert!(!sort_vcf(&vcf, &output, false)?);
        assert_eq!(fs::read(&vcf).unwrap(), fs::read(&output).unwrap());
        Ok(())
    }

    #[test]
    fn test_reversed_file_is_reordered() -> Result<()> {
        let dir = tempdir().unwrap();
        let vcf = builder()
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .write_to(dir.path(), "P1.a.vcf");
        let output = dir.path().join("sorted.vcf");

        assert!(sort_vcf(&vcf, &output, false)?);
        let expected = builder()
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .build_string();
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
        Ok(())
    }

    #[test]
    fn test_existing_output_needs_force() -> Result<()> {
        let dir = tempdir().unwrap();
        let vcf = builder().write_to(dir.path(), "P1.a.vcf");
        let output = dir.path().join("sorted.vcf");
        fs::write(&output, "stale").unwrap();

        assert!(sort_vcf(&vcf, &output, false).unwrap_err().is_config());
        sort_vcf(&vcf, &output, true)?;
        assert_eq!(fs::read(&vcf).unwrap(), fs::read(&output).unwrap());
        Ok(())
    }

    #[test]
    fn test_in_place_sort() -> Result<()> {
        let dir = tempdir().unwrap();
        let vcf = builder()
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .write_to(dir.path(), "P1.a.vcf");
        assert!(sort_vcf(&vcf, &vcf, false)?);
        assert!(!sort_vcf(&vcf, &vcf, false)?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_in_place_sort_replaces_rather_than_truncates() -> Result<()> {
        use std::io::Read;

        let dir = tempdir().unwrap();
        let vcf = builder()
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .write_to(dir.path(), "P1.a.vcf");
        let original = fs::read_to_string(&vcf).unwrap();
        // a handle opened before the sort keeps seeing the old file
        let mut old_handle = fs::File::open(&vcf).unwrap();

        assert!(sort_vcf(&vcf, &vcf, false)?);

        let mut seen_through_old_handle = String::new();
        old_handle
            .read_to_string(&mut seen_through_old_handle)
            .unwrap();
        assert_eq!(seen_through_old_handle, original);

        let expected = builder()
            .record(TestVcfRecord::new("chr2", 7, "A", "G").format("JQ_AF", &["0.1"]))
            .record(TestVcfRecord::new("chr10", 3, "A", "G").format("JQ_AF", &["0.2"]))
            .build_string();
        assert_eq!(fs::read_to_string(&vcf).unwrap(), expected);
        // no temporary file left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        Ok(())
    }
}
