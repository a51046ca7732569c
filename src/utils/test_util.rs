use std::{
    fs,
    path::{Path, PathBuf},
};

const MISSING: &str = ".";

#[derive(Default)]
pub struct TestVcfBuilder {
    header_lines: Vec<String>,
    samples: Vec<String>,
    records: Vec<TestVcfRecord>,
}

pub struct TestVcfRecord {
    chrom: String,
    pos: u64,
    id: String,
    reference: String,
    alt: String,
    qual: String,
    filter: String,
    info: String,
    format: Vec<(String, Vec<String>)>,
}

impl TestVcfRecord {
    pub fn new<S: ToString>(chrom: S, pos: u64, reference: &str, alt: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos,
            id: MISSING.to_string(),
            reference: reference.to_string(),
            alt: alt.to_string(),
            qual: MISSING.to_string(),
            filter: MISSING.to_string(),
            info: MISSING.to_string(),
            format: Vec::new(),
        }
    }

    pub fn id<S: ToString>(mut self, id: S) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn qual<S: ToString>(mut self, qual: S) -> Self {
        self.qual = qual.to_string();
        self
    }

    pub fn filter<S: ToString>(mut self, filter: S) -> Self {
        self.filter = filter.to_string();
        self
    }

    /// Raw INFO column, e.g. `DP=10;SOMATIC`
    pub fn info<S: ToString>(mut self, info: S) -> Self {
        self.info = info.to_string();
        self
    }

    /// One value per sample column, in sample order
    pub fn format<K: ToString>(mut self, key: K, values: &[&str]) -> Self {
        self.format.push((
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    fn to_line(&self, n_samples: usize) -> String {
        let mut columns = vec![
            self.chrom.clone(),
            self.pos.to_string(),
            self.id.clone(),
            self.reference.clone(),
            self.alt.clone(),
            self.qual.clone(),
            self.filter.clone(),
            self.info.clone(),
        ];
        if n_samples == 0 {
            return columns.join("\t");
        }

        if self.format.is_empty() {
            columns.push(MISSING.to_string());
            columns.extend(std::iter::repeat(MISSING.to_string()).take(n_samples));
            return columns.join("\t");
        }

        let keys: Vec<&str> = self.format.iter().map(|(key, _)| key.as_str()).collect();
        columns.push(keys.join(":"));
        for idx in 0..n_samples {
            let values: Vec<&str> = self
                .format
                .iter()
                .map(|(_, values)| values.get(idx).map_or(MISSING, String::as_str))
                .collect();
            columns.push(values.join(":"));
        }
        columns.join("\t")
    }
}

impl TestVcfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contig<S: ToString>(mut self, name: S, length: u64) -> Self {
        self.header_lines
            .push(format!("##contig=<ID={},length={}>", name.to_string(), length));
        self
    }

    pub fn sample<S: ToString>(mut self, name: S) -> Self {
        self.samples.push(name.to_string());
        self
    }

    pub fn record(mut self, record: TestVcfRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Raw metaheader without the leading `##`
    pub fn header_line<S: ToString>(mut self, line: S) -> Self {
        self.header_lines.push(format!("##{}", line.to_string()));
        self
    }

    pub fn info<S: ToString>(mut self, id: S, num: &str, type_: &str, desc: &str) -> Self {
        self.header_lines.push(format!(
            "##INFO=<ID={},Number={},Type={},Description=\"{}\">",
            id.to_string(),
            num,
            type_,
            desc
        ));
        self
    }

    pub fn format<S: ToString>(mut self, id: S, num: &str, type_: &str, desc: &str) -> Self {
        self.header_lines.push(format!(
            "##FORMAT=<ID={},Number={},Type={},Description=\"{}\">",
            id.to_string(),
            num,
            type_,
            desc
        ));
        self
    }

    /// Whole file as text; every line is newline-terminated.
    pub fn build_string(&self) -> String {
        let mut lines = vec!["##fileformat=VCFv4.2".to_string()];
        lines.extend(self.header_lines.iter().cloned());

        let mut column_header = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string();
        if !self.samples.is_empty() {
            column_header.push_str("\tFORMAT");
            for sample in &self.samples {
                column_header.push('\t');
                column_header.push_str(sample);
            }
        }
        lines.push(column_header);
        lines.extend(
            self.records
                .iter()
                .map(|record| record.to_line(self.samples.len())),
        );

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, self.build_string()).expect("Failed to write test VCF");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_vcf_builder_basic() {
        let text = TestVcfBuilder::new()
            .contig("chr1", 1000)
            .sample("TUMOR")
            .record(TestVcfRecord::new("chr1", 100, "A", "AT"))
            .build_string();
        assert_eq!(
            text,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1,length=1000>\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tTUMOR\n\
             chr1\t100\t.\tA\tAT\t.\t.\t.\t.\t.\n"
        );
    }

    #[test]
    fn test_vcf_builder_without_samples_has_no_format_column() {
        let text = TestVcfBuilder::new()
            .record(TestVcfRecord::new("1", 5, "C", "T").id("rs5").qual("30"))
            .build_string();
        let last = text.lines().last().unwrap();
        assert_eq!(last, "1\t5\trs5\tC\tT\t30\t.\t.");
        assert!(!text.contains("FORMAT"));
    }

    #[test]
    fn test_vcf_builder_with_format_fields() {
        let text = TestVcfBuilder::new()
            .format("JQ_AF", "1", "Float", "Allele frequency")
            .format("JQ_DP", "1", "Integer", "Depth")
            .sample("NORMAL")
            .sample("TUMOR")
            .record(
                TestVcfRecord::new("chr1", 100, "A", "T")
                    .filter("PASS")
                    .info("SOMATIC")
                    .format("JQ_AF", &["0", "0.5"])
                    .format("JQ_DP", &["30"]),
            )
            .build_string();
        assert!(text.contains(
            "##FORMAT=<ID=JQ_DP,Number=1,Type=Integer,Description=\"Depth\">\n"
        ));
        assert!(text.ends_with("chr1\t100\t.\tA\tT\t.\tPASS\tSOMATIC\tJQ_AF:JQ_DP\t0:30\t0.5:.\n"));
    }

    #[test]
    fn test_write_to() {
        let dir = tempdir().unwrap();
        let builder = TestVcfBuilder::new().header_line("source=test");
        let path = builder.write_to(dir.path(), "P1.test.vcf");
        assert_eq!(fs::read_to_string(&path).unwrap(), builder.build_string());
        assert!(builder.build_string().contains("##source=test\n"));
    }
}
