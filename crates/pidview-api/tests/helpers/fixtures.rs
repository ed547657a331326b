//! Drive contents shared by the page tests.

use chrono::{TimeZone, Utc};
use pidview_core::{FileEntry, Folder};
use pidview_storage::MemoryDrive;

use super::ARCHIVE_ID;

pub const REPORT_HTML: &str = "<!DOCTYPE html><html><body><h1>Audit</h1></body></html>";

pub fn minimal_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n".to_vec()
}

/// archive -> plant_a -> system_1 -> {cmp_ready (2 PDFs + report), cmp_partial (1 PDF)}
pub fn seed_archive(drive: &MemoryDrive) {
    drive.add_folder(
        ARCHIVE_ID,
        Folder::new("plant_a", "Plant A CRITICAL")
            .with_created_time(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()),
    );
    drive.add_folder(
        ARCHIVE_ID,
        Folder::new("plant_b", "Plant B")
            .with_created_time(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()),
    );
    drive.add_folder("plant_a", Folder::new("system_1", "Cooling water"));

    drive.add_folder(
        "system_1",
        Folder::new("cmp_ready", "Pump skid Rev 9 vs Rev 10")
            .with_created_time(Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap()),
    );
    drive.add_folder("system_1", Folder::new("cmp_partial", "Valve block"));

    drive.add_file(
        "cmp_ready",
        FileEntry::new("pdf_old", "PID_Rev9_old.pdf", "application/pdf"),
        minimal_pdf(),
    );
    drive.add_file(
        "cmp_ready",
        FileEntry::new("pdf_new", "PID_Rev10_new.pdf", "application/pdf"),
        minimal_pdf(),
    );
    drive.add_file(
        "cmp_ready",
        FileEntry::new("report_1", "report.html", "text/html"),
        format!("&lt;!DOCTYPE html&gt;{}", &REPORT_HTML["<!DOCTYPE html>".len()..]),
    );
    drive.add_file(
        "cmp_partial",
        FileEntry::new("pdf_lonely", "PID_Rev_A.pdf", "application/pdf"),
        minimal_pdf(),
    );
}
