//! Report generation tools
//!
//! Generate a PDF progress report from a user's health logs, with a summary
//! table and weight and calorie trend charts.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};
use printpdf::*;
use serde::Serialize;

use crate::db::Database;
use crate::models::{HealthLog, User};

use super::progress::{DEFAULT_GOALS, MAX_RANGE_DAYS};

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 128, 96);
const COLOR_UNDER: (u8, u8, u8) = (0, 112, 192);
const COLOR_ON_TARGET: (u8, u8, u8) = (0, 176, 80);
const COLOR_OVER: (u8, u8, u8) = (255, 0, 0);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

/// Share of the calorie goal counted as on target, either side
const ON_TARGET_BAND: f64 = 0.10;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub days_logged: usize,
    pub date_range: String,
    pub average_calories: Option<f64>,
    pub weight_change_kg: Option<f64>,
    pub message: String,
}

// ============================================================================
// Summary Statistics
// ============================================================================

/// Aggregates over the logged days of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub days_logged: usize,
    pub average_calories: Option<f64>,
    pub average_water: Option<f64>,
    pub average_sleep: Option<f64>,
    pub total_workout_minutes: f64,
    pub first_weight: Option<f64>,
    pub last_weight: Option<f64>,
}

impl ProgressSummary {
    pub fn weight_change(&self) -> Option<f64> {
        Some(self.last_weight? - self.first_weight?)
    }
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Summarize logs ordered by date
pub fn summarize(logs: &[HealthLog]) -> ProgressSummary {
    let weights: Vec<f64> = logs.iter().filter_map(|l| l.weight).collect();
    ProgressSummary {
        days_logged: logs.len(),
        average_calories: average(logs.iter().filter_map(|l| l.calories_consumed)),
        average_water: average(logs.iter().filter_map(|l| l.water_intake)),
        average_sleep: average(logs.iter().filter_map(|l| l.sleep_duration)),
        total_workout_minutes: logs.iter().filter_map(|l| l.workout_duration).sum(),
        first_weight: weights.first().copied(),
        last_weight: weights.last().copied(),
    }
}

/// Classify intake against the calorie goal
pub fn classify_calories(consumed: f64, goal: f64) -> (&'static str, (u8, u8, u8)) {
    if goal <= 0.0 {
        return ("No goal", COLOR_BLACK);
    }
    let ratio = consumed / goal;
    if ratio < 1.0 - ON_TARGET_BAND {
        ("Under", COLOR_UNDER)
    } else if ratio <= 1.0 + ON_TARGET_BAND {
        ("On target", COLOR_ON_TARGET)
    } else {
        ("Over", COLOR_OVER)
    }
}

fn day_of_week_abbrev(date: &NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Generate weight and calorie trend charts as PNG bytes
pub fn generate_progress_chart(
    logs: &[HealthLog],
    calorie_goal: f64,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if logs.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    let x_max = logs.len() as i32;
    let label = |x: &i32| -> String {
        if *x >= 0 && (*x as usize) < logs.len() {
            logs[*x as usize].date.format("%m/%d").to_string()
        } else {
            String::new()
        }
    };

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;
        let (upper, lower) = root.split_vertically(height / 2);

        // Weight panel
        let weights: Vec<(i32, f64)> = logs
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.weight.map(|w| (i as i32, w)))
            .collect();
        let w_min = weights.iter().map(|(_, w)| *w).fold(f64::INFINITY, f64::min);
        let w_max = weights.iter().map(|(_, w)| *w).fold(f64::NEG_INFINITY, f64::max);
        let (w_lo, w_hi) = if weights.is_empty() {
            (0.0, 1.0)
        } else {
            (w_min - 2.0, w_max + 2.0)
        };

        let mut chart = ChartBuilder::on(&upper)
            .caption("Weight (kg)", ("sans-serif", 18))
            .margin(15)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0..x_max, w_lo..w_hi)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(logs.len().min(10))
            .x_label_formatter(&label)
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(LineSeries::new(weights.clone(), BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?;
        chart
            .draw_series(weights.iter().map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())))
            .map_err(|e| e.to_string())?;

        // Calorie panel
        let calories: Vec<(i32, f64)> = logs
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.calories_consumed.map(|c| (i as i32, c)))
            .collect();
        let c_max = calories
            .iter()
            .map(|(_, c)| *c)
            .fold(calorie_goal, f64::max)
            * 1.15;

        let mut chart = ChartBuilder::on(&lower)
            .caption("Calories consumed", ("sans-serif", 18))
            .margin(15)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0..x_max, 0.0..c_max.max(100.0))
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(logs.len().min(10))
            .x_label_formatter(&label)
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        // Goal reference line
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0, calorie_goal), (x_max, calorie_goal)],
                ShapeStyle::from(&RGBColor(0, 176, 80).mix(0.7)).stroke_width(2),
            )))
            .map_err(|e| e.to_string())?
            .label("Goal")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RGBColor(0, 176, 80).stroke_width(2)));

        chart
            .draw_series(LineSeries::new(calories.clone(), RED.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Consumed")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
        chart
            .draw_series(calories.iter().map(|(x, y)| Circle::new((*x, *y), 3, RED.filled())))
            .map_err(|e| e.to_string())?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    let img = RgbImage::from_raw(width, height, buffer).ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(layer: &PdfLayerReference, x1: Mm, y1: Mm, x2: Mm, y2: Mm, color: (u8, u8, u8), width: f32) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![(Point::new(x1, y1), false), (Point::new(x2, y2), false)],
        is_closed: false,
    };
    layer.add_line(line);
}

/// Default report file for a user and range
pub fn default_report_path(report_dir: &Path, user_id: i64, from: NaiveDate, to: NaiveDate) -> PathBuf {
    report_dir.join(format!("progress_user{}_{}_{}.pdf", user_id, from, to))
}

// ============================================================================
// Progress Report Generation
// ============================================================================

const PAGE_WIDTH: f32 = 215.9; // Letter
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 20.0;

/// Generate a progress PDF report.
///
/// Returns Ok(None) when the user does not exist.
pub fn generate_progress_report(
    db: &Database,
    report_dir: &Path,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    output_path: Option<&str>,
) -> Result<Option<GenerateReportResponse>, String> {
    if from > to {
        return Err(format!("Start date {} is after end date {}", from, to));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(format!("Date range cannot exceed {} days", MAX_RANGE_DAYS));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(user) = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };

    let logs = HealthLog::list_range(&conn, user_id, from, to)
        .map_err(|e| format!("Failed to list health logs: {}", e))?;
    drop(conn);

    if logs.is_empty() {
        return Err(format!("No health logs found between {} and {}", from, to));
    }

    let goals = user.goals().unwrap_or(DEFAULT_GOALS);
    let calorie_goal = goals.daily_calories as f64;
    let summary = summarize(&logs);

    let (doc, page1, layer1) = PdfDocument::new("Progress Report", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| e.to_string())?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut y = PAGE_HEIGHT - 20.0;

    // Title
    add_text(&layer, &font_bold, "Nutrition Progress Report", Mm(MARGIN_LEFT), Mm(y), 18.0, COLOR_TITLE);
    y -= 10.0;

    add_text(&layer, &font, &format!("User: {}", user.name), Mm(MARGIN_LEFT), Mm(y), 11.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Goal: {}", user.goal), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 6.0;

    add_text(&layer, &font, &format!("Report Period: {} to {}", from, to), Mm(MARGIN_LEFT), Mm(y), 11.0, COLOR_BLACK);
    let now = chrono::Local::now().format("%Y-%m-%d").to_string();
    add_text(&layer, &font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 10.0;

    add_line(&layer, Mm(MARGIN_LEFT), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
    y -= 8.0;

    // Summary section
    add_text(&layer, &font_bold, "Summary", Mm(MARGIN_LEFT), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    add_text(&layer, &font, &format!("Days Logged: {}", summary.days_logged), Mm(MARGIN_LEFT), Mm(y), 10.0, COLOR_BLACK);
    add_text(
        &layer,
        &font,
        &format!(
            "Daily Goals: {} kcal, {} g protein, {} g carbs, {} g fat",
            goals.daily_calories, goals.daily_protein_grams, goals.daily_carbs_grams, goals.daily_fat_grams
        ),
        Mm(80.0),
        Mm(y),
        10.0,
        COLOR_BLACK,
    );
    y -= 6.0;

    match summary.average_calories {
        Some(avg) => {
            let (classification, color) = classify_calories(avg, calorie_goal);
            add_text(&layer, &font, &format!("Average Intake: {:.0} kcal", avg), Mm(MARGIN_LEFT), Mm(y), 10.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("Versus Goal: {}", classification), Mm(80.0), Mm(y), 10.0, color);
        }
        None => add_text(&layer, &font, "Average Intake: not logged", Mm(MARGIN_LEFT), Mm(y), 10.0, COLOR_GRAY),
    }
    y -= 6.0;

    let weight_line = match (summary.first_weight, summary.last_weight, summary.weight_change()) {
        (Some(first), Some(last), Some(change)) => {
            format!("Weight: {:.1} kg -> {:.1} kg ({:+.1} kg)", first, last, change)
        }
        _ => "Weight: not logged".to_string(),
    };
    add_text(&layer, &font, &weight_line, Mm(MARGIN_LEFT), Mm(y), 10.0, COLOR_BLACK);
    add_text(
        &layer,
        &font,
        &format!(
            "Avg Water: {} l   Avg Sleep: {} h   Workout: {:.0} min",
            optional(summary.average_water, 1),
            optional(summary.average_sleep, 1),
            summary.total_workout_minutes
        ),
        Mm(100.0),
        Mm(y),
        10.0,
        COLOR_BLACK,
    );
    y -= 12.0;

    // Daily log table
    add_text(&layer, &font_bold, "Daily Logs", Mm(MARGIN_LEFT), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    let col_widths = [22.0, 12.0, 20.0, 18.0, 18.0, 16.0, 16.0, 20.0, 16.0, 20.0];
    let headers = ["Date", "Day", "Calories", "Protein", "Carbs", "Fat", "Water", "Weight", "Sleep", "Workout"];

    let draw_header = |layer: &PdfLayerReference, y: f32| {
        let mut col_x = MARGIN_LEFT;
        for (i, header) in headers.iter().enumerate() {
            add_text(layer, &font_bold, header, Mm(col_x), Mm(y), 8.0, COLOR_BLACK);
            col_x += col_widths[i];
        }
    };
    draw_header(&layer, y);
    y -= 5.0;

    for log in &logs {
        if y < MARGIN_BOTTOM {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table Page");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - 20.0;
            draw_header(&layer, y);
            y -= 5.0;
        }

        let calorie_color = log
            .calories_consumed
            .map_or(COLOR_BLACK, |c| classify_calories(c, calorie_goal).1);

        let values = [
            log.date.to_string(),
            day_of_week_abbrev(&log.date).to_string(),
            optional(log.calories_consumed, 0),
            optional(log.protein_consumed, 0),
            optional(log.carbs_consumed, 0),
            optional(log.fat_consumed, 0),
            optional(log.water_intake, 1),
            optional(log.weight, 1),
            optional(log.sleep_duration, 1),
            optional(log.workout_duration, 0),
        ];

        let mut col_x = MARGIN_LEFT;
        for (i, value) in values.iter().enumerate() {
            let color = if i == 2 { calorie_color } else { COLOR_BLACK };
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 7.0, color);
            col_x += col_widths[i];
        }
        y -= 4.5;
    }

    // ========================================================================
    // Chart page - Landscape
    // ========================================================================
    let (chart_page, chart_layer) = doc.add_page(Mm(PAGE_HEIGHT), Mm(PAGE_WIDTH), "Chart Page");
    let chart_layer = doc.get_page(chart_page).get_layer(chart_layer);
    let mut y2 = PAGE_WIDTH - 20.0;

    add_text(&chart_layer, &font_bold, "Progress Trends", Mm(MARGIN_LEFT), Mm(y2), 16.0, COLOR_TITLE);
    add_text(&chart_layer, &font, &format!("{} - {}", from, to), Mm(120.0), Mm(y2), 11.0, COLOR_BLACK);
    y2 -= 10.0;

    match generate_progress_chart(&logs, calorie_goal, 1000, 600) {
        Ok(png_bytes) => {
            let dynamic_image = printpdf::image_crate::load_from_memory(&png_bytes).map_err(|e| e.to_string())?;
            let pdf_image = Image::from_dynamic_image(&dynamic_image);

            // 1000x600 pixels at 150 DPI = ~169mm x 102mm
            let transform = ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(y2 - 105.0)),
                dpi: Some(150.0),
                ..Default::default()
            };
            pdf_image.add_to_layer(chart_layer.clone(), transform);
            y2 -= 110.0;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Progress chart could not be rendered");
            add_text(&chart_layer, &font, &format!("Chart generation error: {}", e), Mm(MARGIN_LEFT), Mm(y2 - 10.0), 9.0, COLOR_OVER);
            y2 -= 15.0;
        }
    }

    y2 -= 5.0;
    add_text(&chart_layer, &font_bold, "Calories:", Mm(MARGIN_LEFT), Mm(y2), 10.0, COLOR_BLACK);
    add_text(&chart_layer, &font, "Under (<90% of goal)", Mm(40.0), Mm(y2), 10.0, COLOR_UNDER);
    add_text(&chart_layer, &font, "On target (90-110%)", Mm(95.0), Mm(y2), 10.0, COLOR_ON_TARGET);
    add_text(&chart_layer, &font, "Over (>110%)", Mm(150.0), Mm(y2), 10.0, COLOR_OVER);

    // Save PDF
    let path = match output_path {
        Some(p) => PathBuf::from(p),
        None => default_report_path(report_dir, user_id, from, to),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = File::create(&path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| e.to_string())?;

    let file_path = path.display().to_string();
    tracing::info!(user_id, file = %file_path, days = summary.days_logged, "Generated progress report");

    Ok(Some(GenerateReportResponse {
        success: true,
        message: format!(
            "Progress report generated with {} logged days",
            summary.days_logged
        ),
        file_path,
        days_logged: summary.days_logged,
        date_range: format!("{} to {}", from, to),
        average_calories: summary.average_calories,
        weight_change_kg: summary.weight_change(),
    }))
}
