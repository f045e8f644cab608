use eframe::egui::{self, Align, Layout, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::UnifiedRecord;
use crate::data::schema::Column;

// ---------------------------------------------------------------------------
// Record tables (detail + raw preview)
// ---------------------------------------------------------------------------

/// Cell text for display. Unmatched industry fields read as unknown.
fn display_field(column: &Column, record: &UnifiedRecord) -> String {
    match column {
        Column::IndustryCode => record.industry_code_or_unknown().to_string(),
        Column::IndustryName => record.industry_name_or_unknown().to_string(),
        other => record.value(other).to_field(),
    }
}

/// Render `records` with one column per unified-table column.
pub fn records_table(ui: &mut Ui, id: &str, columns: &[Column], records: &[&UnifiedRecord]) {
    if records.is_empty() {
        ui.label("No rows.");
        return;
    }

    ScrollArea::horizontal()
        .id_salt(id)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            ui.push_id(id, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .vscroll(false)
                    .cell_layout(Layout::left_to_right(Align::Center))
                    .columns(TableColumn::auto().at_least(60.0), columns.len())
                    .header(22.0, |mut header| {
                        for column in columns {
                            header.col(|ui: &mut Ui| {
                                ui.strong(column.header());
                            });
                        }
                    })
                    .body(|mut body| {
                        for record in records {
                            body.row(20.0, |mut row| {
                                for column in columns {
                                    row.col(|ui: &mut Ui| {
                                        ui.add(
                                            egui::Label::new(display_field(column, record))
                                                .truncate(),
                                        );
                                    });
                                }
                            });
                        }
                    });
            });
        });
}
