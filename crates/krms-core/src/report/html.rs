// ── Summary rendering ──
//
// The same Summary renders as a standalone HTML page (report file and email
// HTML part) and as plain text (email fallback part). Both are tera
// templates; the `.html` one is autoescaped.

use serde::Serialize;
use tera::{Context, Tera};

use crate::model::Summary;

pub const REPORT_TITLE: &str = "KRMS Devices Report";

const HTML_TEMPLATE: &str = "report.html";
const TEXT_TEMPLATE: &str = "report.txt";

/// One headline figure. `class` is empty when the value is not highlighted.
#[derive(Serialize)]
struct Figure {
    label: String,
    value: usize,
    class: &'static str,
}

#[derive(Serialize)]
struct RetailerRow<'a> {
    name: &'a str,
    activated: usize,
    total: usize,
    in_home_country: usize,
}

#[derive(Serialize)]
struct CountryRow<'a> {
    name: &'a str,
    devices: usize,
}

fn templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (HTML_TEMPLATE, include_str!("../../templates/report.html")),
        (TEXT_TEMPLATE, include_str!("../../templates/report.txt")),
    ])?;
    Ok(tera)
}

fn headline(summary: &Summary) -> Vec<Figure> {
    let home = &summary.home_country;
    let figure = |label: String, value: usize, class: &'static str| Figure {
        label,
        value,
        class,
    };
    vec![
        figure("Total number of devices on KRMS".into(), summary.total, ""),
        figure("Total number of CAS activated devices".into(), summary.cas_activated, ""),
        figure(format!("Devices in {home}"), summary.in_home_country, "good"),
        figure(
            format!("CAS activated devices outside {home}"),
            summary.activated_outside_home,
            "bad",
        ),
        figure("Devices currently online".into(), summary.online, ""),
        figure("Devices synced in the last 24 hours".into(), summary.synced_last_24h, ""),
        figure("New devices connected in the last 24 hours".into(), summary.new_last_24h, ""),
        figure("New devices connected in the last 7 days".into(), summary.new_last_7_days, ""),
        figure(
            "New devices connected since the first of the month".into(),
            summary.new_since_month_start,
            "",
        ),
    ]
}

/// Template variables for `summary`. Breakdown rows are lists so they keep
/// first-seen order.
fn context(summary: &Summary) -> Context {
    let retailers: Vec<RetailerRow<'_>> = summary
        .by_retailer
        .iter()
        .map(|(name, counts)| RetailerRow {
            name,
            activated: counts.activated,
            total: counts.total,
            in_home_country: counts.in_home_country,
        })
        .collect();
    let countries: Vec<CountryRow<'_>> = summary
        .by_country
        .iter()
        .map(|(name, &devices)| CountryRow { name, devices })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("title", REPORT_TITLE);
    ctx.insert(
        "generated",
        &summary.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    ctx.insert("home", &summary.home_country);
    ctx.insert("headline", &headline(summary));
    ctx.insert("retailers", &retailers);
    ctx.insert("countries", &countries);
    ctx
}

fn render(template: &str, summary: &Summary) -> tera::Result<String> {
    templates()?.render(template, &context(summary))
}

/// Full HTML page for the report file and the email body.
pub fn render_html(summary: &Summary) -> tera::Result<String> {
    render(HTML_TEMPLATE, summary)
}

/// Plain-text rendering for mail clients without HTML.
pub fn render_text(summary: &Summary) -> tera::Result<String> {
    render(TEXT_TEMPLATE, summary)
}
