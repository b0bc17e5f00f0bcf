use std::path::PathBuf;

use quake_report::ReportBuilder;

fn sample_report() -> ReportBuilder {
    let mut builder = ReportBuilder::new("Aftershock Forecast Evaluation");
    builder.add_introduction(vec![
        ("simulation_name", "Ridgecrest Mw 7.1"),
        ("forecast_name", "synthetic-etas"),
        ("num_simulations", "1000"),
    ]);
    builder.add_sub_heading("Visual Overview of Forecast", 1, "");
    builder.add_result_figure(
        "Cumulative Event Counts",
        2,
        vec![PathBuf::from("figures/cum_plot.svg")],
    );
    builder.add_sub_heading("Consistency Tests", 1, "Feedback appreciated.");
    builder.add_result_figure("Number Test", 2, vec![PathBuf::from("figures/n_test.svg")]);
    builder
}

#[test]
fn toc_lists_blocks_in_declaration_order() {
    let rendered = sample_report().render();
    let toc_overview = rendered.find("- [Visual Overview of Forecast]").expect("toc");
    let toc_cum = rendered.find("  - [Cumulative Event Counts]").expect("toc");
    let toc_consistency = rendered.find("- [Consistency Tests]").expect("toc");
    assert!(toc_overview < toc_cum);
    assert!(toc_cum < toc_consistency);
}

#[test]
fn introduction_renders_as_ordered_table() {
    let rendered = sample_report().render();
    let sim = rendered.find("| simulation_name | Ridgecrest Mw 7.1 |").expect("intro row");
    let count = rendered.find("| num_simulations | 1000 |").expect("intro row");
    assert!(sim < count);
}

#[test]
fn figures_are_embedded_with_relative_paths() {
    let rendered = sample_report().render();
    assert!(rendered.contains("![Number Test](figures/n_test.svg)"));
    assert!(rendered.contains("Feedback appreciated."));
}

#[test]
fn finalize_writes_the_document() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = sample_report().finalize(dir.path()).expect("finalize");
    let written = std::fs::read_to_string(&path).expect("read back");
    assert_eq!(written, sample_report().render());
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(sample_report().render(), sample_report().render());
}
