use eframe::egui::{Align2, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::{series_colors, HIGHLIGHT};
use crate::data::model::Metric;
use crate::data::query::CompanyView;

// ---------------------------------------------------------------------------
// Historical trend chart
// ---------------------------------------------------------------------------

const INDEX_ONLY: [Metric; 1] = [Metric::TransformationIndex];
const WITH_DIMENSIONS: [Metric; 3] = [
    Metric::TransformationIndex,
    Metric::TechnologyDimension,
    Metric::ApplicationDimension,
];

/// (year, value) points of `metric` over the company's history; null
/// values leave gaps out of the series.
fn series(view: &CompanyView, metric: Metric) -> Vec<[f64; 2]> {
    view.history
        .iter()
        .filter_map(|r| Some([r.year() as f64, r.metric(metric)?]))
        .collect()
}

/// Render the company's index history with the selected year highlighted.
pub fn trend_plot(ui: &mut Ui, view: &CompanyView, show_dimensions: bool) {
    let metrics: &[Metric] = if show_dimensions {
        &WITH_DIMENSIONS
    } else {
        &INDEX_ONLY
    };

    Plot::new(("trend_plot", view.code.as_str()))
        .height(320.0)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Index value")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (metric, color) in series_colors(metrics) {
                let points = series(view, metric);

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(metric.label())
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(metric.label())
                        .color(color)
                        .radius(3.0),
                );
            }

            if let Some(value) = view.selected_value(Metric::TransformationIndex) {
                let x = view.year as f64;
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![[x, value]]))
                        .color(HIGHLIGHT)
                        .radius(6.0),
                );
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(x, value),
                        RichText::new(format!("{value:.2}")).color(HIGHLIGHT),
                    )
                    .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}
