// Licensed under the Apache-2.0 license

use crate::{SocArgs, PROJECT_ROOT};
use anyhow::{bail, Context, Result};
use arty_soc::{build_arty_soc, ArtyConfig};
use csr_generator::{
    generate_csr_csv, generate_csr_header, generate_csr_json, parse_description_hjson_str,
    parse_hjson_str, CsrBusConfig, FinalizedSoc, HeaderOptions, RegionKind,
};
use std::fmt::Write;
use std::io::Write as _;
use std::path::{Path, PathBuf};

static HEADER_BANNER: &str = "Licensed under the Apache-2.0 license.

Generated by `cargo xtask csr-autogen`. Do not edit.";

fn default_output_dir() -> PathBuf {
    PROJECT_ROOT.join("software").join("include").join("generated")
}

/// Finalize either the built-in Arty target or an hjson description.
/// Command-line bus options override what the description says.
pub(crate) fn build_soc(args: &SocArgs) -> Result<FinalizedSoc> {
    let soc = match &args.description {
        Some(path) => {
            if args.with_ethernet || args.config.is_some() {
                bail!("--with-ethernet and --config only apply to the built-in Arty target");
            }
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {path:?}"))?;
            let desc = parse_description_hjson_str(&text).with_context(|| format!("{path:?}"))?;
            let mut bus = desc.bus_config(&CsrBusConfig::default())?;
            if let Some(data_width) = args.csr_data_width {
                bus.data_width = data_width;
            }
            if let Some(base) = args.csr_base {
                bus.base = base;
            }
            desc.into_registry()?.finalize(&bus)?
        }
        None => {
            let mut config = match &args.config {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {path:?}"))?;
                    parse_hjson_str::<ArtyConfig>(&text).with_context(|| format!("{path:?}"))?
                }
                None => ArtyConfig::default(),
            };
            config.with_ethernet |= args.with_ethernet;
            if let Some(data_width) = args.csr_data_width {
                config.csr_data_width = data_width;
            }
            if let Some(base) = args.csr_base {
                config.csr_base = base;
            }
            build_arty_soc(&config)?
        }
    };
    Ok(soc)
}

/// Every artifact, rendered in full before anything touches the disk.
fn render(soc: &FinalizedSoc, access_functions: bool) -> Result<Vec<(&'static str, String)>> {
    let opts = HeaderOptions {
        banner: Some(HEADER_BANNER.into()),
        with_access_functions: access_functions,
        ..Default::default()
    };
    Ok(vec![
        ("csr.h", generate_csr_header(soc, &opts)?),
        ("csr.json", generate_csr_json(soc)?),
        ("csr.csv", generate_csr_csv(soc)),
    ])
}

pub(crate) fn autogen(
    check: bool,
    args: &SocArgs,
    output_dir: Option<&Path>,
    access_functions: bool,
) -> Result<()> {
    let dest_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(default_output_dir);
    let soc = build_soc(args)?;
    let artifacts = render(&soc, access_functions)?;

    if check {
        let stale: Vec<String> = artifacts
            .iter()
            .filter_map(|(name, contents)| {
                file_check_contents(&dest_dir.join(name), contents)
                    .err()
                    .map(|e| format!("{name}: {e:#}"))
            })
            .collect();
        if !stale.is_empty() {
            bail!(
                "generated CSR files are out of date:\n  {}\nRun \"cargo xtask csr-autogen\" \
                to update them.",
                stale.join("\n  ")
            );
        }
        return Ok(());
    }

    std::fs::create_dir_all(&dest_dir)
        .with_context(|| format!("failed to create {dest_dir:?}"))?;
    for (name, contents) in artifacts.iter() {
        write_file(&dest_dir.join(name), contents)?;
    }
    Ok(())
}

pub(crate) fn print_map(args: &SocArgs) -> Result<()> {
    let soc = build_soc(args)?;
    print!("{}", format_map(&soc)?);
    Ok(())
}

fn format_map(soc: &FinalizedSoc) -> Result<String> {
    let map = soc.address_map();
    let bus = soc.bus();
    let mut out = String::new();
    writeln!(
        out,
        "CSR region {:#010x}..{:#010x} ({} banks, {}-bit data, {}-byte slots)",
        map.base(),
        map.base() + map.size(),
        map.banks().len(),
        bus.data_width,
        bus.slot_size
    )?;
    for (bank, layout) in soc.bank_layouts() {
        writeln!(
            out,
            "  {:<16} {:#010x} {:>#7x}  {} registers",
            bank.name,
            layout.base,
            layout.size,
            bank.csrs.len()
        )?;
    }
    if !soc.interrupts().is_empty() {
        writeln!(out, "interrupts:")?;
        for source in soc.interrupts().sources() {
            writeln!(out, "  {:>2} {}", source.bit, source.name)?;
        }
    }
    if !soc.memory_regions().is_empty() {
        writeln!(out, "memory regions:")?;
        for region in soc.memory_regions() {
            let kind = match region.kind {
                RegionKind::Cached => "cached",
                RegionKind::Io => "io",
            };
            writeln!(
                out,
                "  {:<16} {:#010x} {:#010x} {kind}",
                region.name, region.origin, region.size
            )?;
        }
    }
    Ok(out)
}

/// Replace `dest_file` in one step so readers never see a partial file.
fn write_file(dest_file: &Path, contents: &str) -> Result<()> {
    println!("Writing to {dest_file:?}");
    let dir = dest_file.parent().unwrap_or(Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.persist(dest_file)
        .with_context(|| format!("failed to replace {dest_file:?}"))?;
    Ok(())
}

fn file_check_contents(dest_file: &Path, expected_contents: &str) -> Result<()> {
    println!("Checking file {dest_file:?}");
    let actual_contents =
        std::fs::read(dest_file).with_context(|| format!("cannot read {dest_file:?}"))?;
    if actual_contents != expected_contents.as_bytes() {
        bail!("{dest_file:?} does not match the generator output");
    }
    Ok(())
}
