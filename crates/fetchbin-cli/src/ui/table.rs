//! Platform table for `fetchbin info`.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use fetchbin_schema::PlatformEntry;

/// Digest characters shown per row; `--json` carries the full value.
const DIGEST_WIDTH: usize = 16;

/// Build the platform table, marking `selected` (an index into `entries`).
pub fn platform_table(entries: &[PlatformEntry], selected: Option<usize>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("").add_attribute(Attribute::Bold),
        Cell::new("OS").add_attribute(Attribute::Bold),
        Cell::new("Arch").add_attribute(Attribute::Bold),
        Cell::new("Bits").add_attribute(Attribute::Bold),
        Cell::new("URL").add_attribute(Attribute::Bold),
        Cell::new("SHA256").add_attribute(Attribute::Bold),
    ]);

    for (i, entry) in entries.iter().enumerate() {
        let marker = if selected == Some(i) {
            Cell::new("*")
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        let digest = entry.sha256.short(DIGEST_WIDTH);
        table.add_row(vec![
            marker,
            Cell::new(entry.os),
            Cell::new(entry.arch),
            Cell::new(entry.bits.map_or_else(|| "any".to_string(), |b| b.as_u8().to_string())),
            Cell::new(&entry.url),
            Cell::new(format!("{digest}…")),
        ]);
    }
    table
}
