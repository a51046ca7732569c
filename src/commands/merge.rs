use crate::{
    cli::{MergeArgs, FULL_VERSION},
    merge::{
        vcf_processor::{MergeOptions, VcfProcessor},
        vcf_reader::list_vcf_files,
        vcf_writer::{merged_output_path, VcfWriter},
    },
    utils::{MergeError, Result},
};
use std::{
    env, io,
    path::{Path, PathBuf},
};
use tempfile::{Builder, NamedTempFile, TempDir};

pub fn merge(args: MergeArgs) -> Result<()> {
    let execution_context = if args.no_version {
        Vec::new()
    } else {
        execution_context()?
    };
    let options = MergeOptions {
        format_tag_patterns: args.include_format_tags,
        include_rows: args.include_rows,
        include_cells: args.include_cells,
        execution_context,
    };

    if args.print_header {
        return print_header(&args.input_dir, &args.output, &options);
    }
    merge_vcf_dir(&args.input_dir, &args.output, &options, args.force)?;
    Ok(())
}

fn execution_context() -> Result<Vec<String>> {
    let cwd = env::current_dir()
        .map_err(|e| MergeError::io("Failed to resolve the working directory", e))?;
    let name = env!("CARGO_PKG_NAME");
    Ok(vec![
        format!("##{}.version={}", name, FULL_VERSION),
        format!(
            "##{}.command={}",
            name,
            env::args().collect::<Vec<String>>().join(" ")
        ),
        format!("##{}.cwd={}", name, cwd.display()),
    ])
}

fn output_dir(output: &Path) -> &Path {
    output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn input_vcfs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let vcfs = list_vcf_files(input_dir)?;
    if vcfs.is_empty() {
        return Err(MergeError::Config(format!(
            "no *.vcf files found in {}",
            input_dir.display()
        )));
    }
    log::info!(
        "Found {} VCF file(s) in {}",
        vcfs.len(),
        input_dir.display()
    );
    Ok(vcfs)
}

/// Scratch directory for sorted copies, next to the output and removed on drop
fn sort_dir(output: &Path) -> Result<TempDir> {
    let parent = output_dir(output);
    Builder::new()
        .prefix(".jqmerge-sort")
        .tempdir_in(parent)
        .map_err(|e| {
            MergeError::io(
                format!("Failed to create a temporary directory in {}", parent.display()),
                e,
            )
        })
}

fn print_header(input_dir: &Path, output: &Path, options: &MergeOptions) -> Result<()> {
    let vcfs = input_vcfs(input_dir)?;
    let tmp_dir = sort_dir(output)?;
    let processor = VcfProcessor::new(vcfs, tmp_dir.path(), options)?;
    let mut writer = VcfWriter::new(io::stdout().lock());
    writer.write_header(processor.header_lines())?;
    drop(writer.finish()?);
    Ok(())
}

/// Merge every `*.vcf` in `input_dir` and return the path written.
///
/// The merged file only appears once it is complete; a failed run leaves no
/// output behind.
pub fn merge_vcf_dir(
    input_dir: &Path,
    output: &Path,
    options: &MergeOptions,
    force: bool,
) -> Result<PathBuf> {
    let final_path = merged_output_path(output);
    if final_path.exists() && !force {
        return Err(MergeError::Config(format!(
            "output file {} already exists, use --force to overwrite it",
            final_path.display()
        )));
    }

    let vcfs = input_vcfs(input_dir)?;
    let tmp_dir = sort_dir(output)?;
    let processor = VcfProcessor::new(vcfs, tmp_dir.path(), options)?;

    let parent = output_dir(output);
    let tmp_file = NamedTempFile::new_in(parent).map_err(|e| {
        MergeError::io(
            format!("Failed to create a temporary file in {}", parent.display()),
            e,
        )
    })?;
    let mut writer = VcfWriter::new(tmp_file);
    processor.merge_variants(&mut writer)?;
    let tmp_file = writer.finish()?;
    tmp_file.persist(&final_path).map_err(|e| {
        MergeError::io(
            format!("Failed to write {}", final_path.display()),
            e.error,
        )
    })?;

    log::info!("Wrote {}", final_path.display());
    Ok(final_path)
}
