pub mod buffered_reader;
pub mod coordinate;
pub mod coordinate_set;
pub mod filters;
pub mod format_tags;
pub mod metaheader;
pub mod sort_normalizer;
pub mod vcf_processor;
pub mod vcf_reader;
pub mod vcf_writer;
