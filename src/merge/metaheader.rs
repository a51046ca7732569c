use super::{
    coordinate_set::{CoordinateSet, MULT_ALT_HEADER, MULT_ALT_TAG},
    vcf_reader::{VcfReaders, FIXED_COLUMNS, FORMAT_COLUMN},
};
use std::collections::{BTreeMap, HashMap};

pub const FILE_FORMAT_LINE: &str = "##fileformat=VCFv4.2";
pub const SAMPLE_COLUMN_KEY: &str = "jqmerge.sample_column";

/// Assembles the merged header. Only tags that appear in the body get a
/// declaration, and every tag that appears in the body gets one.
pub struct MetaheaderCompiler<'a> {
    readers: &'a VcfReaders,
    coordinates: &'a CoordinateSet,
    format_tags: &'a [String],
    sample_names: &'a [String],
}

impl<'a> MetaheaderCompiler<'a> {
    pub fn new(
        readers: &'a VcfReaders,
        coordinates: &'a CoordinateSet,
        format_tags: &'a [String],
        sample_names: &'a [String],
    ) -> Self {
        MetaheaderCompiler {
            readers,
            coordinates,
            format_tags,
            sample_names,
        }
    }

    /// Header lines in output order, the column header last.
    pub fn compile(&self, execution_context: &[String]) -> Vec<String> {
        let mut lines = vec![FILE_FORMAT_LINE.to_string()];
        lines.extend(execution_context.iter().map(|line| {
            if line.starts_with("##") {
                line.clone()
            } else {
                format!("##{}", line)
            }
        }));
        lines.extend(self.provenance_lines());
        lines.extend(self.contig_lines());
        lines.extend(self.info_lines());
        lines.extend(self.format_lines());
        lines.push(self.column_header());
        lines
    }

    /// First declaration of each ID across the inputs, in reader order
    fn first_declarations(&self, kind: &'static str) -> HashMap<&'a str, &'a str> {
        let readers: &'a VcfReaders = self.readers;
        let mut declarations = HashMap::new();
        for reader in &readers.readers {
            for (id, line) in reader.header().declarations(kind) {
                declarations.entry(id).or_insert(line);
            }
        }
        declarations
    }

    fn provenance_lines(&self) -> Vec<String> {
        let provenance = self.readers.provenance();
        self.sample_names
            .iter()
            .enumerate()
            .map(|(idx, sample)| {
                let sources = provenance
                    .get(sample)
                    .map(|sources| sources.join(","))
                    .unwrap_or_default();
                format!("##{}{}={}({})", SAMPLE_COLUMN_KEY, idx + 1, sample, sources)
            })
            .collect()
    }

    fn contig_lines(&self) -> Vec<String> {
        let declared = self.first_declarations("contig");
        self.coordinates
            .contig_order()
            .into_iter()
            .map(|contig| match declared.get(contig) {
                Some(line) => line.to_string(),
                None => format!("##contig=<ID={}>", contig),
            })
            .collect()
    }

    fn info_lines(&self) -> Vec<String> {
        let declared = self.first_declarations("INFO");
        let mut lines: BTreeMap<&str, &str> = BTreeMap::new();
        lines.insert(MULT_ALT_TAG, MULT_ALT_HEADER);
        for key in self.coordinates.info_keys() {
            if key == MULT_ALT_TAG {
                continue;
            }
            // undeclared keys were already dropped while collecting coordinates
            debug_assert!(declared.contains_key(key), "undeclared INFO key {key}");
            if let Some(line) = declared.get(key) {
                lines.insert(key, *line);
            }
        }
        lines.into_values().map(str::to_string).collect()
    }

    fn format_lines(&self) -> Vec<String> {
        let declared = self.first_declarations("FORMAT");
        self.format_tags
            .iter()
            .filter_map(|tag| declared.get(tag.as_str()).map(|line| line.to_string()))
            .collect()
    }

    fn column_header(&self) -> String {
        let mut columns: Vec<&str> = FIXED_COLUMNS.to_vec();
        columns.push(FORMAT_COLUMN);
        columns.extend(self.sample_names.iter().map(String::as_str));
        columns.join("\t")
    }
}
