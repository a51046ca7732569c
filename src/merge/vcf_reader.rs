use super::{
    coordinate::{Coordinate, TagValues, VariantRecord, MISSING_VALUE},
    metaheader::SAMPLE_COLUMN_KEY,
};
use crate::utils::{MergeError, Result};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::{self, File},
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

pub const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];
pub const FORMAT_COLUMN: &str = "FORMAT";
pub const SAMPLE_SEPARATOR: char = '|';

/// Metaheaders and column header of a VCF, kept verbatim.
#[derive(Debug, Clone)]
pub struct VcfHeader {
    metaheaders: Vec<String>,
    column_header: String,
    samples: Vec<String>,
}

impl VcfHeader {
    pub fn read<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut metaheaders = Vec::new();
        for (line_idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                MergeError::io(format!("Failed to read header of {}", path.display()), e)
            })?;
            let line = line.trim_end_matches('\r');
            if line.starts_with("##") {
                metaheaders.push(line.to_string());
                continue;
            }
            if line.starts_with('#') {
                let samples = Self::parse_column_header(line, path)?;
                if !metaheaders.iter().any(|m| m.starts_with("##fileformat=")) {
                    return Err(MergeError::header(path, "missing '##fileformat' metaheader"));
                }
                return Ok(VcfHeader {
                    metaheaders,
                    column_header: line.to_string(),
                    samples,
                });
            }
            return Err(MergeError::header(
                path,
                format!("line {} appears before the '#CHROM' column header", line_idx + 1),
            ));
        }
        Err(MergeError::header(path, "missing '#CHROM' column header"))
    }

    fn parse_column_header(line: &str, path: &Path) -> Result<Vec<String>> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < FIXED_COLUMNS.len() || columns[..FIXED_COLUMNS.len()] != FIXED_COLUMNS {
            return Err(MergeError::header(
                path,
                format!("column header must start with {}", FIXED_COLUMNS.join(" ")),
            ));
        }
        match columns.get(FIXED_COLUMNS.len()) {
            None => Ok(Vec::new()),
            Some(&FORMAT_COLUMN) => Ok(columns[FIXED_COLUMNS.len() + 1..]
                .iter()
                .map(|s| s.to_string())
                .collect()),
            Some(other) => Err(MergeError::header(
                path,
                format!("expected FORMAT column after INFO, found '{}'", other),
            )),
        }
    }

    pub fn metaheaders(&self) -> &[String] {
        &self.metaheaders
    }

    pub fn column_header(&self) -> &str {
        &self.column_header
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// `(ID, line)` for every `##<kind>=<ID=...>` metaheader, in file order
    pub fn declarations<'a>(
        &'a self,
        kind: &'static str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.metaheaders
            .iter()
            .filter_map(move |line| structured_id(line, kind).map(|id| (id, line.as_str())))
    }
}

/// Extract the ID of a structured metaheader such as `##FORMAT=<ID=JQ_AF,...>`
pub fn structured_id<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    let content = line
        .strip_prefix("##")?
        .strip_prefix(kind)?
        .strip_prefix("=<")?;
    content
        .trim_end_matches('>')
        .split(',')
        .find_map(|field| field.strip_prefix("ID="))
}

/// Data rows of a VCF file, skipping the header. Each item carries its
/// 1-based line number.
pub struct DataLines {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    path: PathBuf,
}

impl DataLines {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| MergeError::io(format!("Failed to open VCF file {}", path.display()), e))?;
        Ok(DataLines {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for DataLines {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(MergeError::io(
                        format!("Failed to read {}", self.path.display()),
                        e,
                    )))
                }
            };
            self.line_no += 1;
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(Ok((self.line_no, line.to_string())));
        }
    }
}

pub fn parse_coordinate(line: &str, line_no: usize, path: &Path) -> Result<Coordinate> {
    let mut fields = line.split('\t');
    let mut next_field = |name: &str| {
        fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| MergeError::record(path, line_no, format!("missing {} column", name)))
    };
    let chrom = next_field("CHROM")?;
    let pos_str = next_field("POS")?;
    let _id = next_field("ID")?;
    let reference = next_field("REF")?;
    let alt = next_field("ALT")?;
    let pos = pos_str.parse::<u64>().map_err(|_| {
        MergeError::record(path, line_no, format!("invalid position '{}'", pos_str))
    })?;
    Ok(Coordinate::new(chrom, pos, reference, alt))
}

/// Parse a data row; `samples` names the sample columns in file order.
pub fn parse_record(
    line: &str,
    line_no: usize,
    path: &Path,
    samples: &[String],
) -> Result<VariantRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let n_fixed = FIXED_COLUMNS.len();
    let valid_width = if samples.is_empty() {
        fields.len() == n_fixed || fields.len() == n_fixed + 1
    } else {
        fields.len() == n_fixed + 1 + samples.len()
    };
    if !valid_width {
        return Err(MergeError::record(
            path,
            line_no,
            format!(
                "expected {} columns, found {}",
                n_fixed + 1 + samples.len(),
                fields.len()
            ),
        ));
    }

    let mut record = VariantRecord::new(parse_coordinate(line, line_no, path)?);
    record.id = fields[2].to_string();
    record.qual = fields[5].to_string();
    record.filter = fields[6].to_string();
    if fields[7] != MISSING_VALUE {
        record.info = fields[7]
            .split(';')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
    }

    if samples.is_empty() {
        return Ok(record);
    }

    let tags: Vec<&str> = fields[n_fixed].split(':').collect();
    for (sample, column) in samples.iter().zip(&fields[n_fixed + 1..]) {
        let values: Vec<&str> = column.split(':').collect();
        if values.len() > tags.len() {
            return Err(MergeError::record(
                path,
                line_no,
                format!(
                    "sample {} has {} values for {} FORMAT tags",
                    sample,
                    values.len(),
                    tags.len()
                ),
            ));
        }
        // Trailing values may be dropped, those tags are simply absent
        let tag_values: TagValues = tags
            .iter()
            .zip(values)
            .map(|(tag, value)| (tag.to_string(), value.to_string()))
            .collect();
        record.samples.insert(sample.clone(), tag_values);
    }
    Ok(record)
}

/// Parsed records of one file, streamed in file order.
pub struct VcfRecords {
    lines: DataLines,
    samples: Vec<String>,
}

impl Iterator for VcfRecords {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line_no, line) = match self.lines.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(parse_record(&line, line_no, self.lines.path(), &self.samples))
    }
}

/// Qualify a sample column with its patient; already-qualified names are kept.
pub fn qualify_sample(patient: &str, sample: &str) -> String {
    if sample.contains(SAMPLE_SEPARATOR) {
        sample.to_string()
    } else {
        format!("{}{}{}", patient, SAMPLE_SEPARATOR, sample)
    }
}

fn parse_sample_column_line(line: &str) -> Option<(String, Vec<String>)> {
    let rest = line.strip_prefix("##")?.strip_prefix(SAMPLE_COLUMN_KEY)?;
    let (index, value) = rest.split_once('=')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = value.strip_suffix(')')?;
    let (column, sources) = value.rsplit_once('(')?;
    let sources = sources
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some((column.to_string(), sources))
}

pub struct VcfReader {
    path: PathBuf,
    file_name: String,
    patient: String,
    header: VcfHeader,
    sample_names: Vec<String>,
}

impl VcfReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        log::debug!("Start opening VCF {:?}", path.display());

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| MergeError::header(&path, "path has no file name"))?;
        let patient = file_name
            .split('.')
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                MergeError::header(&path, "file name must start with a patient identifier")
            })?
            .to_string();

        // Header is read eagerly and the handle closed, records reopen the file
        let header = {
            let file = File::open(&path).map_err(|e| {
                MergeError::io(format!("Failed to open VCF file {}", path.display()), e)
            })?;
            VcfHeader::read(BufReader::new(file), &path)?
        };
        let sample_names = header
            .samples()
            .iter()
            .map(|sample| qualify_sample(&patient, sample))
            .collect::<Vec<_>>();

        log::debug!(
            "{} has patient {}, samples n = {}",
            file_name,
            patient,
            sample_names.len()
        );

        Ok(VcfReader {
            path,
            file_name,
            patient,
            header,
            sample_names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn patient(&self) -> &str {
        &self.patient
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Qualified sample names, in column order
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn data_lines(&self) -> Result<DataLines> {
        DataLines::open(&self.path)
    }

    pub fn records(&self) -> Result<VcfRecords> {
        Ok(VcfRecords {
            lines: self.data_lines()?,
            samples: self.sample_names.clone(),
        })
    }

    pub fn declared_info_ids(&self) -> HashSet<&str> {
        self.header.declarations("INFO").map(|(id, _)| id).collect()
    }

    /// Source files behind each sample column. Provenance recorded by an
    /// earlier merge replaces this file's own name.
    pub fn provenance(&self) -> Vec<(String, Vec<String>)> {
        let inherited: HashMap<String, Vec<String>> = self
            .header
            .metaheaders()
            .iter()
            .filter_map(|line| parse_sample_column_line(line))
            .collect();

        self.sample_names
            .iter()
            .map(|sample| {
                let sources = inherited
                    .get(sample)
                    .cloned()
                    .unwrap_or_else(|| vec![self.file_name.clone()]);
                (sample.clone(), sources)
            })
            .collect()
    }
}

pub struct VcfReaders {
    pub readers: Vec<VcfReader>,
}

impl VcfReaders {
    pub fn open(vcf_files: Vec<PathBuf>) -> Result<Self> {
        let readers = vcf_files
            .into_iter()
            .map(VcfReader::open)
            .collect::<Result<Vec<_>>>()?;
        Ok(VcfReaders { readers })
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Deduplicated merged sample columns in natural order
    pub fn sample_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .readers
            .iter()
            .flat_map(|reader| reader.sample_names().iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort_by(|a, b| natord::compare(a, b).then_with(|| a.cmp(b)));
        names
    }

    /// Merged sample column -> contributing source files, naturally sorted
    pub fn provenance(&self) -> BTreeMap<String, Vec<String>> {
        let mut provenance: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for reader in &self.readers {
            for (sample, sources) in reader.provenance() {
                let entry = provenance.entry(sample).or_default();
                for source in sources {
                    if !entry.contains(&source) {
                        entry.push(source);
                    }
                }
            }
        }
        for sources in provenance.values_mut() {
            sources.sort_by(|a, b| natord::compare(a, b).then_with(|| a.cmp(b)));
        }
        provenance
    }
}

/// `*.vcf` files directly inside `dir`, in natural file-name order
pub fn list_vcf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| MergeError::io(format!("Failed to list directory {}", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| MergeError::io(format!("Failed to list directory {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "vcf") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| {
        let a = a.file_name().unwrap_or_default().to_string_lossy();
        let b = b.file_name().unwrap_or_default().to_string_lossy();
        natord::compare(&a, &b).then_with(|| a.cmp(&b))
    });
    Ok(files)
}
