//! Resolve a comparison folder's files into an old/new pair.

use crate::listing::strip_extension;
use crate::models::{Comparison, FileEntry, Folder};
use crate::natural::natural_cmp;

const OLD_MARKERS: &[&str] = &["old", "prev", "previous", "ref", "reference"];
const NEW_MARKERS: &[&str] = &["new", "current", "latest"];

fn words(stem: &str) -> impl Iterator<Item = &str> {
    stem.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn has_marker(file: &FileEntry, markers: &[&str]) -> bool {
    words(strip_extension(&file.name)).any(|w| markers.iter().any(|m| w.eq_ignore_ascii_case(m)))
}

/// `Rev C` from `PID-101_rev_C.pdf`, `Rev 3` from `PID-101 Rev3.pdf`,
/// otherwise the file stem.
pub fn revision_label(file_name: &str) -> String {
    let stem = strip_extension(file_name);
    let tokens: Vec<&str> = words(stem).collect();

    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_ascii_lowercase();
        if lower == "rev" || lower == "revision" {
            if let Some(next) = tokens.get(i + 1) {
                return format!("Rev {}", next);
            }
            continue;
        }
        let suffix = if let Some(rest) = lower.strip_prefix("revision") {
            rest
        } else if let Some(rest) = lower.strip_prefix("rev") {
            rest
        } else {
            continue;
        };
        let attached = &token[token.len() - suffix.len()..];
        let looks_like_revision = attached.chars().all(|c| c.is_ascii_digit())
            || (attached.chars().count() == 1 && attached.chars().all(char::is_alphabetic));
        if !attached.is_empty() && looks_like_revision {
            return format!("Rev {}", attached);
        }
    }

    stem.to_string()
}

fn pick_pair(pdfs: &[&FileEntry]) -> (Option<FileEntry>, Option<FileEntry>) {
    let old = pdfs
        .iter()
        .position(|f| has_marker(f, OLD_MARKERS) && !has_marker(f, NEW_MARKERS));
    let new = pdfs
        .iter()
        .enumerate()
        .position(|(i, f)| Some(i) != old && has_marker(f, NEW_MARKERS) && !has_marker(f, OLD_MARKERS));
    if let (Some(o), Some(n)) = (old, new) {
        return (Some(pdfs[o].clone()), Some(pdfs[n].clone()));
    }

    let mut ordered: Vec<&FileEntry> = pdfs.to_vec();
    ordered.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    match ordered.as_slice() {
        [] => (None, None),
        [only] => (Some((*only).clone()), None),
        [first, .., last] => (Some((*first).clone()), Some((*last).clone())),
    }
}

/// Build a [`Comparison`] from a comparison folder and its children.
///
/// PDFs are recognised by MIME type or extension. Names carrying an old/new
/// marker decide the pair; otherwise the first and last PDF in numeric-aware
/// name order are used.
pub fn derive_comparison(folder: &Folder, files: &[FileEntry]) -> Comparison {
    let pdfs: Vec<&FileEntry> = files.iter().filter(|f| f.is_pdf()).collect();
    let report = files.iter().find(|f| f.is_html()).cloned();
    let (pdf_a, pdf_b) = pick_pair(&pdfs);

    Comparison {
        id: folder.id.clone(),
        name: folder.name.clone(),
        created_time: folder.created_time,
        rev_a: pdf_a.as_ref().map(|f| revision_label(&f.name)),
        rev_b: pdf_b.as_ref().map(|f| revision_label(&f.name)),
        pdf_a,
        pdf_b,
        report,
        pdf_count: pdfs.len(),
    }
}
