/*++
Licensed under the Apache-2.0 license.
--*/

use crate::allocator::CsrLayout;
use crate::error::{CsrError, CsrResult};
use crate::irq::generate_interrupt_defines;
use crate::registry::FinalizedSoc;
use crate::schema::{ConstantValue, Csr, CsrField, MAX_CSR_WIDTH};
use std::fmt::Write;

/// Knobs for the generated C header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderOptions {
    pub include_guard: String,
    /// Emitted as a `//` comment block above the include guard.
    pub banner: Option<String>,
    /// Emit `static inline` read/write helpers next to the address defines.
    pub with_access_functions: bool,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            include_guard: "__GENERATED_CSR_H".into(),
            banner: Some("Autogenerated by csr-generator. Do not modify this file.".into()),
            with_access_functions: true,
        }
    }
}

/// Uppercase preprocessor symbol from name parts.
pub fn c_symbol(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Address literal in the fixed-width form firmware headers use.
pub fn c_addr(val: u64) -> String {
    format!("0x{val:08x}L")
}

fn c_mask(val: u64) -> String {
    if val > u64::from(u32::MAX) {
        format!("0x{val:x}ULL")
    } else {
        format!("0x{val:x}")
    }
}

/// Decimal literal; values past `i64::MAX` only fit an unsigned long long.
fn c_int(val: u64) -> String {
    if val > i64::MAX as u64 {
        format!("{val}ULL")
    } else {
        val.to_string()
    }
}

/// Smallest C integer type holding `width` bits.
pub fn c_type(width: u32) -> &'static str {
    match width {
        0..=8 => "uint8_t",
        9..=16 => "uint16_t",
        17..=32 => "uint32_t",
        _ => "uint64_t",
    }
}

fn c_string(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn check_width(bank: &str, csr: &Csr) -> CsrResult<()> {
    if csr.width > MAX_CSR_WIDTH {
        return Err(CsrError::WidthOverflow {
            bank: bank.into(),
            register: csr.name.clone(),
            width: csr.width,
            max: MAX_CSR_WIDTH,
        });
    }
    Ok(())
}

/// Every symbol [`generate_csr_header`] can define, paired with the
/// declaration that owns it, in emission order. Accessor names are included
/// even though a header may be rendered without them.
pub(crate) fn header_symbols(soc: &FinalizedSoc) -> Vec<(String, String)> {
    let mut symbols = Vec::new();
    let mut push = |owner: &str, symbol: String| symbols.push((owner.to_string(), symbol));

    for global in ["CSR_BASE", "CSR_DATA_WIDTH", "CSR_SLOT_SIZE"] {
        push("csr bus", global.into());
    }
    for (bank, layout) in soc.bank_layouts() {
        push(&bank.name, c_symbol(&["csr", bank.name.as_str(), "base"]));
        push(&bank.name, c_symbol(&["csr", bank.name.as_str(), "size"]));
        for (csr, csr_layout) in bank.csrs.iter().zip(layout.csrs.iter()) {
            let owner = format!("{}.{}", bank.name, csr.name);
            let prefix = c_symbol(&["csr", bank.name.as_str(), csr.name.as_str()]);
            push(&owner, format!("{prefix}_ADDR"));
            push(&owner, format!("{prefix}_SIZE"));
            if csr_layout.is_multi_word() {
                for i in 0..csr_layout.words.len() {
                    for suffix in ["ADDR", "SHIFT", "MASK"] {
                        push(&owner, format!("{prefix}_W{i}_{suffix}"));
                    }
                }
            }
            for field in csr.fields.iter() {
                let field_owner = format!("{owner}.{}", field.name);
                let field_prefix = c_symbol(&[prefix.as_str(), field.name.as_str()]);
                push(&field_owner, format!("{field_prefix}_OFFSET"));
                push(&field_owner, format!("{field_prefix}_SIZE"));
            }

            let func = format!("{}_{}", bank.name, csr.name);
            push(&owner, format!("{func}_read"));
            if csr.access.can_write() {
                push(&owner, format!("{func}_write"));
            }
            for field in csr.fields.iter() {
                let field_owner = format!("{owner}.{}", field.name);
                let name = format!("{func}_{}", field.name);
                push(&field_owner, format!("{name}_extract"));
                push(&field_owner, format!("{name}_read"));
                if csr.access.can_write() {
                    push(&field_owner, format!("{name}_replace"));
                    push(&field_owner, format!("{name}_write"));
                }
            }
        }
    }
    for source in soc.interrupts().sources() {
        let owner = format!("interrupt {}", source.name);
        push(&owner, c_symbol(&[source.name.as_str(), "interrupt"]));
    }
    for region in soc.memory_regions() {
        let owner = format!("memory region {}", region.name);
        push(&owner, c_symbol(&[region.name.as_str(), "base"]));
        push(&owner, c_symbol(&[region.name.as_str(), "size"]));
    }
    for constant in soc.constants() {
        push(&format!("constant {}", constant.name), constant.name.clone());
    }
    symbols
}

/// Render the complete firmware header for `soc`.
///
/// Output depends only on the finalized description, so identical input
/// always produces byte-identical text.
pub fn generate_csr_header(soc: &FinalizedSoc, opts: &HeaderOptions) -> CsrResult<String> {
    let mut out = String::new();
    if let Some(banner) = &opts.banner {
        for line in banner.lines() {
            let _ = writeln!(out, "{}", format!("// {line}").trim_end());
        }
    }
    let guard = &opts.include_guard;
    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    out += "#include <stdint.h>\n";
    if opts.with_access_functions {
        out += "#ifndef CSR_ACCESSORS_DEFINED\n";
        out += "#include <hw/common.h>\n";
        out += "#endif /* ! CSR_ACCESSORS_DEFINED */\n";
    }

    let bus = soc.bus();
    out += "\n";
    let _ = writeln!(out, "#define CSR_BASE {}", c_addr(bus.base));
    let _ = writeln!(out, "#define CSR_DATA_WIDTH {}", bus.data_width);
    let _ = writeln!(out, "#define CSR_SLOT_SIZE {}", bus.slot_size);

    for (bank, layout) in soc.bank_layouts() {
        let _ = writeln!(out, "\n/* {} */", bank.name);
        let _ = writeln!(
            out,
            "#define {} {}",
            c_symbol(&["csr", bank.name.as_str(), "base"]),
            c_addr(layout.base)
        );
        let _ = writeln!(
            out,
            "#define {} 0x{:x}",
            c_symbol(&["csr", bank.name.as_str(), "size"]),
            layout.size
        );
        for (csr, csr_layout) in bank.csrs.iter().zip(layout.csrs.iter()) {
            check_width(&bank.name, csr)?;
            out += &generate_register(&bank.name, csr, csr_layout, opts);
        }
    }

    out += &generate_interrupt_defines(soc.interrupts())?;

    if !soc.memory_regions().is_empty() {
        out += "\n/* memory regions */\n";
        for region in soc.memory_regions() {
            let _ = writeln!(
                out,
                "#define {} {}",
                c_symbol(&[region.name.as_str(), "base"]),
                c_addr(region.origin)
            );
            let _ = writeln!(
                out,
                "#define {} 0x{:08x}",
                c_symbol(&[region.name.as_str(), "size"]),
                region.size
            );
        }
    }

    if !soc.constants().is_empty() {
        out += "\n/* constants */\n";
        for constant in soc.constants() {
            match &constant.value {
                ConstantValue::Int(v) => {
                    let _ = writeln!(out, "#define {} {}", constant.name, c_int(*v));
                }
                ConstantValue::Str(s) => {
                    let _ = writeln!(out, "#define {} {}", constant.name, c_string(s));
                }
                ConstantValue::Flag => {
                    let _ = writeln!(out, "#define {}", constant.name);
                }
            }
        }
    }

    let _ = writeln!(out, "\n#endif /* ! {guard} */");
    Ok(out)
}

fn generate_register(bank: &str, csr: &Csr, layout: &CsrLayout, opts: &HeaderOptions) -> String {
    let mut out = String::new();
    let prefix = c_symbol(&["csr", bank, csr.name.as_str()]);
    let _ = writeln!(out, "#define {prefix}_ADDR {}", c_addr(layout.address));
    let _ = writeln!(out, "#define {prefix}_SIZE {}", layout.size());
    if layout.is_multi_word() {
        for (i, word) in layout.words.iter().enumerate() {
            let _ = writeln!(out, "#define {prefix}_W{i}_ADDR {}", c_addr(word.address));
            let _ = writeln!(out, "#define {prefix}_W{i}_SHIFT {}", word.shift);
            let _ = writeln!(out, "#define {prefix}_W{i}_MASK {}", c_mask(word.mask()));
        }
    }
    for field in csr.fields.iter() {
        let field_prefix = c_symbol(&[prefix.as_str(), field.name.as_str()]);
        let _ = writeln!(out, "#define {field_prefix}_OFFSET {}", field.offset);
        let _ = writeln!(out, "#define {field_prefix}_SIZE {}", field.width);
    }
    if opts.with_access_functions {
        out += &generate_accessors(bank, csr, layout);
    }
    out
}

fn generate_accessors(bank: &str, csr: &Csr, layout: &CsrLayout) -> String {
    let mut out = String::new();
    let ty = c_type(csr.width);
    let func = format!("{bank}_{}", csr.name);

    let _ = writeln!(out, "static inline {ty} {func}_read(void) {{");
    if layout.is_multi_word() {
        let _ = writeln!(out, "\t{ty} r = 0;");
        for word in layout.words.iter() {
            let shift = if word.shift == 0 {
                String::new()
            } else {
                format!(" << {}", word.shift)
            };
            let _ = writeln!(
                out,
                "\tr |= ({ty})(csr_read_simple({}) & {}){shift};",
                c_addr(word.address),
                c_mask(word.mask())
            );
        }
        out += "\treturn r;\n";
    } else {
        let _ = writeln!(out, "\treturn csr_read_simple({});", c_addr(layout.address));
    }
    out += "}\n";

    if csr.access.can_write() {
        let _ = writeln!(out, "static inline void {func}_write({ty} v) {{");
        for word in layout.words.iter() {
            let value = if word.shift == 0 {
                "v".to_string()
            } else {
                format!("(v >> {})", word.shift)
            };
            let _ = writeln!(
                out,
                "\tcsr_write_simple({value} & {}, {});",
                c_mask(word.mask()),
                c_addr(word.address)
            );
        }
        out += "}\n";
    }

    for field in csr.fields.iter() {
        out += &generate_field_accessors(&func, ty, csr, field);
    }
    out
}

fn generate_field_accessors(func: &str, ty: &str, csr: &Csr, field: &CsrField) -> String {
    let mut out = String::new();
    let name = format!("{func}_{}", field.name);
    let mask = c_mask(crate::schema::low_mask(field.width));
    let offset = field.offset;
    let _ = writeln!(out, "static inline {ty} {name}_extract({ty} oldword) {{");
    let _ = writeln!(out, "\treturn (oldword >> {offset}) & {mask};");
    out += "}\n";
    let _ = writeln!(out, "static inline {ty} {name}_read(void) {{");
    let _ = writeln!(out, "\treturn {name}_extract({func}_read());");
    out += "}\n";
    if csr.access.can_write() {
        let _ = writeln!(
            out,
            "static inline {ty} {name}_replace({ty} oldword, {ty} plain_value) {{"
        );
        let _ = writeln!(
            out,
            "\treturn (oldword & ~(({ty}){mask} << {offset})) | ((plain_value & {mask}) << {offset});"
        );
        out += "}\n";
        let _ = writeln!(out, "static inline void {name}_write({ty} plain_value) {{");
        let _ = writeln!(
            out,
            "\t{func}_write({name}_replace({func}_read(), plain_value));"
        );
        out += "}\n";
    }
    out
}
