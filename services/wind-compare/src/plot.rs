//! Composite comparison figure.
//!
//! Layout on a 5 x 6 grid:
//!
//! | row | content |
//! |-----|---------|
//! | 0 | title of panel a |
//! | 1 | maps: cosmo-rea2 (cols 0-1), correlation (cols 2-3), newa (cols 4-5) |
//! | 2 | colorbars under each map |
//! | 3 | title of panel b |
//! | 4 | annual time series (cols 1-5) |

use anyhow::{Context, Result};
use geometry::GridCellTable;
use grid_stats::AnnualTable;
use image::RgbaImage;
use renderer::style::StyleConfig;
use renderer::{
    crop_to_content, draw_horizontal_colorbar, Canvas, Color, ColorbarLayout, Colormap,
    FigureScale, FontBook, FontFace, GridSpec, HAlign, LineChart, MapFrame, Margins, Normalize,
    Rect, ScalarMappable, Series, TextItem, VAlign,
};
use tracing::{debug, info, warn};
use wind_common::DatasetKey;

use crate::config::CompareConfig;
use crate::pipeline::{Comparison, AVE_WS, CORR};

const WIDTH_RATIOS: [f32; 6] = [2.0, 12.0, 2.0, 12.0, 12.0, 2.0];
const HEIGHT_RATIOS: [f32; 5] = [1.0, 10.0, 4.0, 1.0, 15.0];
const WSPACE: f32 = 0.02;
const HSPACE: f32 = 0.01;

/// Map limits sit just outside the region's bounds.
const LIMIT_MARGIN: f64 = 0.001;

const TITLE_PT: f32 = 12.0;
const CAPTION_PT: f32 = 12.0;
const BOUNDARY_LINE_PT: f32 = 1.0;

/// Maps in panel a with their first grid column.
const MAP_COLUMNS: [(DatasetKey, usize); 3] = [
    (DatasetKey::CosmoRea2, 0),
    (DatasetKey::CosmoRea2GriddedToNewa, 2),
    (DatasetKey::Newa, 4),
];

/// Shared drawing state for one figure.
struct Figure {
    canvas: Canvas,
    fonts: FontBook,
    scale: FigureScale,
    grid: GridSpec,
}

impl Figure {
    fn new(config: &CompareConfig) -> Result<Self> {
        let style = &config.style;
        let scale = FigureScale::new(style.dpi);
        let (width, height) = (scale.inches(style.width), scale.inches(style.height));
        let canvas = Canvas::new(width, height, Color::WHITE)?;
        let grid = GridSpec::new(
            Rect::new(0.0, 0.0, width as f32, height as f32),
            Margins::default(),
            WIDTH_RATIOS.to_vec(),
            HEIGHT_RATIOS.to_vec(),
            WSPACE,
            HSPACE,
        )?;
        let fonts = FontBook::load(&style.fonts.to_paths());
        debug!(width, height, dpi = style.dpi, fonts = fonts.has_fonts(), "Created figure");

        Ok(Self {
            canvas,
            fonts,
            scale,
            grid,
        })
    }

    /// Bold title, left-aligned and vertically centred in its row.
    fn row_title(&mut self, row: usize, text: String) -> Result<()> {
        let area = self.grid.span(row..row + 1, 0..self.grid.ncols())?;
        self.canvas.text(
            TextItem::new(text, area.x, area.center_y(), self.scale.px(TITLE_PT))
                .face(FontFace::Bold)
                .align(HAlign::Left, VAlign::Center),
        );
        Ok(())
    }
}

fn resolve_colormap(name: &str, extra: Option<&StyleConfig>) -> Result<Colormap> {
    if let Some(result) = extra.and_then(|s| s.colormap(name)) {
        return Ok(result?);
    }
    Colormap::by_name(name).with_context(|| format!("Unknown colormap '{}'", name))
}

/// Fill every cell by its value in `column`; cells without a value stay
/// empty.
fn fill_cells(
    canvas: &mut Canvas,
    frame: &MapFrame,
    cells: &GridCellTable,
    column: &str,
    mappable: &ScalarMappable,
) -> Result<usize> {
    let values = cells.column(column).with_context(|| {
        let known: Vec<&str> = cells.column_names().collect();
        format!("Polygons have no column '{}', only {:?}", column, known)
    })?;
    let mut drawn = 0;
    for (cell, &value) in cells.cells().iter().zip(values) {
        let Some(color) = mappable.color(value) else {
            continue;
        };
        let rings: Vec<&[(f64, f64)]> = cell.geometry.rings().map(|r| r.points()).collect();
        frame.fill(canvas, &rings, color);
        drawn += 1;
    }
    Ok(drawn)
}

fn plot_maps(figure: &mut Figure, comparison: &Comparison, config: &CompareConfig) -> Result<()> {
    figure.row_title(
        0,
        format!(
            "a. {}m wind speed per gridcell, averaged across all dataset years",
            config.height
        ),
    )?;

    let extent = comparison
        .boundary
        .total_bounds()
        .context("Region boundary has no extent")?
        .scaled_limits(LIMIT_MARGIN);
    let aspect = if config.plot_crs.is_geographic() {
        MapFrame::geographic_aspect(&extent)
    } else {
        1.0
    };

    let extra = match &config.style.colormap_file {
        Some(path) => Some(StyleConfig::from_file(path)?),
        None => None,
    };
    if !comparison.ws_range.is_set() {
        warn!("No finite wind speed in any dataset; maps and colorbars will be empty");
    }
    let ws_mappable = ScalarMappable::new(
        resolve_colormap(&config.style.colormap, extra.as_ref())?,
        Normalize::new(comparison.ws_range.min, comparison.ws_range.max),
    );
    let corr_mappable = ScalarMappable::new(
        resolve_colormap(&config.style.correlation_colormap, extra.as_ref())?,
        Normalize::new(-1.0, 1.0),
    );
    let colorbar = ColorbarLayout::default();

    for (dataset, col) in MAP_COLUMNS {
        let cells = comparison
            .polys
            .get(&dataset)
            .with_context(|| format!("No polygons for '{}'", dataset))?;
        let (column, mappable, caption, bar_label) = if dataset.is_regridded() {
            (
                CORR,
                &corr_mappable,
                "Inter-dataset correlation",
                "Hourly wind speed correlation",
            )
        } else {
            (
                AVE_WS,
                &ws_mappable,
                config.long_name(dataset)?,
                "Average wind speed (m/s)",
            )
        };

        let panel = figure.grid.span(1..2, col..col + 2)?;
        let frame = MapFrame::fit(panel, extent, aspect);

        figure.canvas.clip_to(Some(frame.rect));
        let drawn = fill_cells(&mut figure.canvas, &frame, cells, column, mappable)?;
        let boundary_px = figure.scale.px(BOUNDARY_LINE_PT);
        for ring in comparison.boundary.geometry.rings() {
            frame.outline(&mut figure.canvas, ring.points(), boundary_px, Color::WHITE);
        }
        figure.canvas.clip_to(None);
        debug!(dataset = %dataset, column, drawn, "Plotted map");

        figure.canvas.text(
            TextItem::new(
                caption,
                frame.rect.center_x(),
                frame.rect.y - 0.01 * frame.rect.height,
                figure.scale.px(CAPTION_PT),
            )
            .face(FontFace::Italic)
            .align(HAlign::Center, VAlign::Bottom),
        );

        let bar_panel = figure.grid.span(2..3, col..col + 2)?;
        draw_horizontal_colorbar(
            &mut figure.canvas,
            &figure.fonts,
            figure.scale,
            bar_panel,
            mappable,
            bar_label,
            &colorbar,
        );
    }
    Ok(())
}

/// Line chart of the annual table, one series per dataset.
fn annual_chart(annual: &AnnualTable, config: &CompareConfig) -> Result<LineChart> {
    let years = annual.years();
    let mut chart = LineChart::new(years.iter().map(|y| y.to_string()).collect());

    for dataset in annual.datasets() {
        let by_year: std::collections::HashMap<&str, f64> = annual.series(dataset).collect();
        chart.series.push(Series {
            label: config.long_name(dataset)?.to_string(),
            color: config.series_color(dataset)?,
            values: years.iter().map(|y| by_year.get(y).copied()).collect(),
        });
    }

    chart.x_label = Some("Year".to_string());
    chart.y_label = Some("Annual average wind speed (m/s)".to_string());
    Ok(chart)
}

fn plot_timeseries(figure: &mut Figure, comparison: &Comparison, config: &CompareConfig) -> Result<()> {
    figure.row_title(
        3,
        format!(
            "b. {}m wind speed per year, averaged across all gridcells in {}",
            config.height, config.region_name
        ),
    )?;

    let area = figure.grid.span(4..5, 1..figure.grid.ncols())?;
    let chart = annual_chart(&comparison.annual, config)?;
    chart.draw(&mut figure.canvas, &figure.fonts, figure.scale, area)?;
    Ok(())
}

/// Draw the full comparison figure.
pub fn render_figure(comparison: &Comparison, config: &CompareConfig) -> Result<RgbaImage> {
    let mut figure = Figure::new(config)?;

    plot_maps(&mut figure, comparison, config)?;
    info!("Plotted maps");
    plot_timeseries(&mut figure, comparison, config)?;
    info!("Plotted timeseries");

    let Figure { canvas, fonts, .. } = figure;
    let image = canvas.into_image(&fonts);
    if config.style.tight_crop {
        Ok(crop_to_content(&image, Color::WHITE))
    } else {
        Ok(image)
    }
}
