use std::io::{self, Write};

use crate::RankedAuthors;

/// Escape for an RTF text run. Non-ASCII goes out as `\uN?` with N a signed
/// 16-bit code unit.
pub fn escape_rtf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    out
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Citation list: each author with superscript indices, then the numbered
/// affiliations.
pub fn write_rtf<W: Write>(ranked: &RankedAuthors, mut out: W) -> io::Result<()> {
    out.write_all(b"{\\rtf1 \\utf-8 ")?;

    for (author, indices) in ranked.entries() {
        write!(
            out,
            "{{{}{{\\super {}}}\\par}}",
            escape_rtf(&author.to_string()),
            join_indices(&indices)
        )?;
    }

    for (index, affiliation, _) in ranked.index().iter() {
        write!(
            out,
            "{{{{\\super {}}}{}\\par}}",
            index,
            escape_rtf(&affiliation.to_string())
        )?;
    }

    out.write_all(b"}")?;
    out.flush()
}
