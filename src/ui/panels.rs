use eframe::egui::{self, Color32, Grid, RichText, ScrollArea, Ui};

use crate::color::WARNING;
use crate::data::model::{Metric, UnifiedRecord};
use crate::data::stats::Summary;
use crate::error::{AggregationError, QueryError};
use crate::state::{AppState, Status};
use crate::ui::{plot, table};

/// Upper bound on entries rendered in the company dropdown.
const MAX_COMPANY_OPTIONS: usize = 500;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.strong("Search");
    ui.add(
        egui::TextEdit::singleline(&mut state.company_search)
            .hint_text("code or name"),
    );
    ui.add_space(4.0);

    // ---- Company selector ----
    let options = state.filtered_companies();
    let current = state
        .selected_code
        .as_ref()
        .and_then(|code| dataset.companies().iter().find(|o| &o.code == code))
        .map(|o| o.label())
        .unwrap_or_default();

    ui.strong("Company");
    egui::ComboBox::from_id_salt("company")
        .selected_text(current)
        .width(ui.available_width())
        .height(400.0)
        .show_ui(ui, |ui: &mut Ui| {
            for option in options.iter().take(MAX_COMPANY_OPTIONS) {
                let selected = state.selected_code.as_ref() == Some(&option.code);
                if ui.selectable_label(selected, option.label()).clicked() {
                    state.select_company(option.code.clone());
                }
            }
            if options.len() > MAX_COMPANY_OPTIONS {
                ui.label(
                    RichText::new(format!(
                        "… {} more, refine the search",
                        options.len() - MAX_COMPANY_OPTIONS
                    ))
                    .weak(),
                );
            }
        });
    if options.is_empty() {
        ui.label(RichText::new("No company matches the search.").color(WARNING));
    }
    ui.add_space(4.0);

    // ---- Year selector ----
    ui.strong("Year");
    let current_year = state
        .selected_year
        .map(|y| y.to_string())
        .unwrap_or_default();
    egui::ComboBox::from_id_salt("year")
        .selected_text(current_year)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for &year in dataset.years() {
                if ui
                    .selectable_label(state.selected_year == Some(year), year.to_string())
                    .clicked()
                {
                    state.select_year(year);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Reload data").clicked() {
                state.reload(true);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records, {} companies",
                ds.len(),
                ds.companies().len()
            ));
        }

        ui.separator();

        ui.checkbox(&mut state.show_dimensions, "Show dimensions");

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – dashboard
// ---------------------------------------------------------------------------

fn format_value(metric: Metric, value: f64) -> String {
    if metric.is_count() {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}

fn summary_grid(ui: &mut Ui, id: &str, summaries: &[(Metric, Result<Summary, AggregationError>)]) {
    Grid::new(id).striped(true).num_columns(5).show(ui, |ui: &mut Ui| {
        ui.strong("Metric");
        ui.strong("Mean");
        ui.strong("Min");
        ui.strong("Max");
        ui.strong("N");
        ui.end_row();

        for (metric, summary) in summaries {
            ui.label(metric.label());
            match summary {
                Ok(s) => {
                    ui.label(format_value(*metric, s.mean));
                    ui.label(format_value(*metric, s.min));
                    ui.label(format_value(*metric, s.max));
                    ui.label(s.count.to_string());
                }
                Err(e) => {
                    for _ in 0..4 {
                        ui.label("–").on_hover_text(e.to_string());
                    }
                }
            }
            ui.end_row();
        }
    });
}

fn overview_card(ui: &mut Ui, title: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(title).weak());
            ui.label(RichText::new(value).strong().size(18.0));
        });
    });
}

/// Render the central dashboard for the current selection.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.load_error {
        ui.heading("Data could not be loaded");
        ui.label(RichText::new(err).color(Color32::RED));
        ui.label("Fix the source files or the config, then use File → Reload data.");
        return;
    }
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut export_clicked = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Overview cards ----
            let overview = dataset.overview();
            ui.horizontal(|ui: &mut Ui| {
                overview_card(ui, "Companies", overview.companies.to_string());
                overview_card(ui, "Records", overview.records.to_string());
                overview_card(
                    ui,
                    "Years",
                    overview
                        .year_span
                        .map(|(lo, hi)| format!("{lo}–{hi}"))
                        .unwrap_or_else(|| "–".into()),
                );
                let (mean, max) = match &overview.index {
                    Ok(s) => (format!("{:.4}", s.mean), format!("{:.4}", s.max)),
                    Err(_) => ("–".into(), "–".into()),
                };
                overview_card(ui, "Average index", mean);
                overview_card(ui, "Max index", max);
            });
            ui.separator();

            let view = match &state.view {
                Some(Ok(view)) => view,
                Some(Err(e @ QueryError::NoDataForCompany(_))) => {
                    ui.label(RichText::new(e.to_string()).color(WARNING));
                    return;
                }
                Some(Err(e)) => {
                    ui.label(RichText::new(e.to_string()).color(Color32::RED));
                    return;
                }
                None => {
                    ui.label("Select a company and a year.");
                    return;
                }
            };

            ui.heading(format!("{} ({})", view.name, view.code));

            // ---- Selected year ----
            let year_records = view.year_records();
            match &year_records {
                Ok(records) => {
                    let first = &records[0];
                    ui.label(format!(
                        "Industry: {} ({})",
                        first.industry_name_or_unknown(),
                        first.industry_code_or_unknown()
                    ));
                    ui.add_space(4.0);
                    ui.strong(format!("Year {}", view.year));
                    if let Ok(summaries) = view.year_summaries() {
                        summary_grid(ui, "year_summary", &summaries);
                    }
                }
                Err(e) => {
                    ui.label(RichText::new(e.to_string()).color(WARNING));
                }
            }
            ui.add_space(8.0);

            // ---- Whole history ----
            ui.strong("All years");
            summary_grid(ui, "history_summary", &view.history_summaries());
            ui.add_space(8.0);

            plot::trend_plot(ui, view, state.show_dimensions);
            ui.add_space(8.0);

            // ---- Detail table ----
            ui.strong(format!("Records for {}", view.year));
            match &year_records {
                Ok(records) => {
                    let rows: Vec<&UnifiedRecord> = records.iter().collect();
                    table::records_table(ui, "year_table", dataset.columns(), &rows);
                }
                Err(e) => {
                    ui.label(RichText::new(e.to_string()).color(WARNING));
                }
            }
            ui.add_space(8.0);

            // ---- Raw data preview ----
            let window = state.config.export_window;
            ui.strong(format!("Raw data {}–{}", window.start, window.end));
            match dataset.company_bounded_range(&view.code, window.start, window.end) {
                Ok(rows) if !rows.is_empty() => {
                    table::records_table(ui, "raw_table", dataset.columns(), &rows);
                    if ui.button("Export CSV…").clicked() {
                        export_clicked = true;
                    }
                }
                Ok(_) => {
                    ui.label(
                        RichText::new("No records inside the export window.").color(WARNING),
                    );
                }
                Err(e) => {
                    ui.label(RichText::new(e.to_string()).color(WARNING));
                }
            }
        });

    if export_clicked {
        export_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Export raw data")
        .add_filter("CSV", &["csv"]);
    if let Some(name) = state.export_file_name() {
        dialog = dialog.set_file_name(name);
    }

    let Some(path) = dialog.save_file() else {
        return;
    };
    match state.export_to(&path) {
        Ok(rows) => {
            log::info!("Exported {rows} rows to {}", path.display());
            state.status = Some(Status::Info(format!(
                "Exported {rows} rows to {}",
                path.display()
            )));
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status = Some(Status::Error(format!("Export failed: {e:#}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_indices_use_their_own_precision() {
        assert_eq!(format_value(Metric::TotalWords, 12.0), "12.00");
        assert_eq!(format_value(Metric::TransformationIndex, 0.12345), "0.1235");
    }
}
