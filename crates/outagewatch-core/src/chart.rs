//! ASCII line chart for bucket history.
//!
//! Layout of a rendered chart (`width` columns by `height` rows, plus one
//! line of time labels underneath):
//!
//! ```text
//!    1650│        ●●
//!        │      ●●  ●
//!    1480│   ●●●     ●●●
//!        │ ●●
//!    1310│●
//!        └─────────────────
//!         3 PM    5 PM    7 PM
//! ```
//!
//! The first [`LABEL_GUTTER`] columns hold right-aligned value labels, the
//! next column is the vertical axis, everything to its right is plot area.
//! The bottom row is the horizontal axis.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::store::Bucket;

/// Shown instead of a chart when there are fewer than two points.
pub const PLACEHOLDER: &str = "Not enough data points yet. Wait for a few refreshes.";

/// Columns reserved for y-axis value labels.
pub const LABEL_GUTTER: usize = 7;

/// Columns to the left of the plot area: label gutter plus the axis column.
pub const LEFT_MARGIN: usize = LABEL_GUTTER + 1;

/// Characters used to draw the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub vertical: char,
    pub horizontal: char,
    pub corner: char,
    pub point: char,
}

impl Glyphs {
    pub const UNICODE: Self = Self {
        vertical: '│',
        horizontal: '─',
        corner: '└',
        point: '●',
    };

    /// Plain 7-bit glyphs for terminals without box drawing characters.
    pub const ASCII: Self = Self {
        vertical: '|',
        horizontal: '-',
        corner: '+',
        point: '*',
    };
}

impl Default for Glyphs {
    fn default() -> Self {
        Self::UNICODE
    }
}

/// Everything besides the series and size that affects the output.
#[derive(Debug, Clone)]
pub struct ChartOptions<Tz: TimeZone = Utc> {
    pub glyphs: Glyphs,
    /// Zone the time labels are shown in.
    pub tz: Tz,
    /// Samples on this date (in `tz`) get time-only labels.
    pub today: NaiveDate,
}

impl ChartOptions<Utc> {
    pub fn utc(today: NaiveDate) -> Self {
        Self {
            glyphs: Glyphs::default(),
            tz: Utc,
            today,
        }
    }
}

impl ChartOptions<Local> {
    /// Labels in the machine's local zone, "today" taken from `now`.
    pub fn local(now: DateTime<Local>) -> Self {
        Self {
            glyphs: Glyphs::default(),
            tz: Local,
            today: now.date_naive(),
        }
    }
}

impl<Tz: TimeZone> ChartOptions<Tz> {
    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }
}

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Fewer than two points; display [`PLACEHOLDER`].
    Placeholder,
    /// A `height` x `width` grid and the time-label line below it.
    Plot { rows: Vec<String>, time_axis: String },
}

impl Rendered {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder)
    }

    /// Grid rows; empty for the placeholder.
    pub fn rows(&self) -> &[String] {
        match self {
            Rendered::Placeholder => &[],
            Rendered::Plot { rows, .. } => rows,
        }
    }

    pub fn time_axis(&self) -> &str {
        match self {
            Rendered::Placeholder => "",
            Rendered::Plot { time_axis, .. } => time_axis,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Placeholder => f.write_str(PLACEHOLDER),
            Rendered::Plot { rows, time_axis } => {
                for row in rows {
                    writeln!(f, "{row}")?;
                }
                f.write_str(time_axis)
            }
        }
    }
}

/// Width of the plot area for a chart `width` columns wide (at least 1).
pub fn plot_width(width: usize) -> usize {
    width.saturating_sub(LEFT_MARGIN).max(1)
}

/// The trailing points of `series` that fit into a chart `width` columns wide.
pub fn visible_window(series: &[Bucket], width: usize) -> &[Bucket] {
    let fit = plot_width(width);
    if series.len() > fit {
        &series[series.len() - fit..]
    } else {
        series
    }
}

/// Rasterize `series` (ascending by timestamp) into a `width` x `height` grid.
///
/// Pure: the output depends only on the arguments.
pub fn render<Tz>(
    series: &[Bucket],
    width: usize,
    height: usize,
    opts: &ChartOptions<Tz>,
) -> Rendered
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if series.len() < 2 {
        return Rendered::Placeholder;
    }

    let visible = visible_window(series, width);
    let scale = Scale::new(visible, plot_width(width), height);

    let mut grid = Grid::new(width, height);
    grid.draw_axes(&opts.glyphs);
    grid.draw_series(visible, &scale, opts.glyphs.point);
    grid.draw_value_labels(&scale);

    Rendered::Plot {
        rows: grid.into_rows(),
        time_axis: time_axis(visible, &scale, width, opts),
    }
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// Padded value range and the plot-area geometry.
struct Scale {
    lo: i128,
    hi: i128,
    points: usize,
    plot_width: usize,
    plot_height: usize,
}

impl Scale {
    fn new(visible: &[Bucket], plot_width: usize, height: usize) -> Self {
        let lo = i128::from(visible.iter().map(|b| b.value).min().unwrap_or(0));
        let hi = i128::from(visible.iter().map(|b| b.value).max().unwrap_or(0));

        // i128 holds the padded range of any pair of i64 values.
        let range = (hi - lo).max(1);
        let pad = (range / 10).max(1);

        Self {
            lo: lo - pad,
            hi: hi + pad,
            points: visible.len(),
            plot_width,
            plot_height: height.saturating_sub(1).max(1),
        }
    }

    fn range(&self) -> i128 {
        self.hi - self.lo
    }

    fn column(&self, index: usize) -> isize {
        (LEFT_MARGIN + index * self.plot_width / self.points.max(1)) as isize
    }

    fn row(&self, value: i64) -> isize {
        let span = (self.plot_height - 1) as i128;
        let offset = div_round(
            (i128::from(value) - self.lo) * span,
            self.range(),
        );
        (span - offset) as isize
    }

    /// Value shown for a label on `row`.
    fn value_at(&self, row: usize) -> i64 {
        let span = (self.plot_height - 1) as i128;
        let value = if span == 0 {
            self.hi
        } else {
            self.hi - div_round(row as i128 * self.range(), span)
        };
        value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

/// `num / den` rounded half up, for `num >= 0` and `den > 0`.
fn div_round(num: i128, den: i128) -> i128 {
    (2 * num + den) / (2 * den)
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
            height,
        }
    }

    /// Write `c` at (col, row); out-of-grid writes are dropped.
    fn put(&mut self, col: isize, row: isize, c: char) {
        if col < 0 || row < 0 {
            return;
        }
        let (col, row) = (col as usize, row as usize);
        if col < self.width && row < self.height {
            self.cells[row][col] = c;
        }
    }

    fn draw_axes(&mut self, glyphs: &Glyphs) {
        if self.height == 0 {
            return;
        }
        let axis = LABEL_GUTTER as isize;
        let bottom = (self.height - 1) as isize;
        for row in 0..bottom {
            self.put(axis, row, glyphs.vertical);
        }
        for col in axis + 1..self.width as isize {
            self.put(col, bottom, glyphs.horizontal);
        }
        self.put(axis, bottom, glyphs.corner);
    }

    fn draw_series(&mut self, visible: &[Bucket], scale: &Scale, glyph: char) {
        let plot_rows = scale.plot_height as isize;
        let plot = |grid: &mut Grid, col: isize, row: isize| {
            if col >= LEFT_MARGIN as isize && row < plot_rows {
                grid.put(col, row, glyph);
            }
        };

        if let [only] = visible {
            plot(self, scale.column(0), scale.row(only.value));
            return;
        }

        for (i, pair) in visible.windows(2).enumerate() {
            let from = (scale.column(i), scale.row(pair[0].value));
            let to = (scale.column(i + 1), scale.row(pair[1].value));
            bresenham(from, to, |col, row| plot(self, col, row));
        }
    }

    fn draw_value_labels(&mut self, scale: &Scale) {
        let last = scale.plot_height - 1;
        let mut rows = vec![0, scale.plot_height / 2, last];
        rows.dedup();

        for row in rows {
            let label = scale.value_at(row).to_string();
            let len = label.chars().count();
            if len > LABEL_GUTTER {
                continue;
            }
            let start = LABEL_GUTTER - len;
            for (i, c) in label.chars().enumerate() {
                self.put((start + i) as isize, row as isize, c);
            }
        }
    }

    fn into_rows(self) -> Vec<String> {
        self.cells
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect()
    }
}

/// Visit every cell on the integer line from `from` to `to`, inclusive.
fn bresenham(from: (isize, isize), to: (isize, isize), mut visit: impl FnMut(isize, isize)) {
    let (mut x, mut y) = from;
    let (x2, y2) = to;
    let dx = (x2 - x).abs();
    let dy = (y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        visit(x, y);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

// ---------------------------------------------------------------------------
// Time labels
// ---------------------------------------------------------------------------

fn time_axis<Tz>(
    visible: &[Bucket],
    scale: &Scale,
    width: usize,
    opts: &ChartOptions<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut line = vec![' '; width];
    let points = visible.len();

    if points == 1 {
        let label = format_label(&visible[0], opts, true);
        let center = LEFT_MARGIN + scale.plot_width / 2;
        place_label(&mut line, &label, center as isize - (label.chars().count() / 2) as isize, 0);
        return line.into_iter().collect::<String>().trim_end().to_string();
    }

    let indices = if points == 2 {
        vec![0, 1]
    } else {
        vec![0, (points - 1) / 2, points - 1]
    };

    let mut free_from = 0;
    for (n, &idx) in indices.iter().enumerate() {
        let label = format_label(&visible[idx], opts, false);
        let len = label.chars().count() as isize;
        let col = scale.column(idx);
        let start = if n == 0 {
            col
        } else if n == indices.len() - 1 {
            col + 1 - len
        } else {
            col - len / 2
        };
        if let Some(end) = place_label(&mut line, &label, start, free_from) {
            free_from = end + 1;
        }
    }

    line.into_iter().collect::<String>().trim_end().to_string()
}

/// Copy `label` into `line` at `start`, shifted to fit inside the line.
/// Returns the end column, or `None` if it would overlap columns before
/// `free_from` or does not fit at all.
fn place_label(line: &mut [char], label: &str, start: isize, free_from: usize) -> Option<usize> {
    let len = label.chars().count();
    if len > line.len() {
        return None;
    }
    let start = start.clamp(0, (line.len() - len) as isize) as usize;
    if start < free_from {
        return None;
    }
    for (i, c) in label.chars().enumerate() {
        line[start + i] = c;
    }
    Some(start + len)
}

fn format_label<Tz>(bucket: &Bucket, opts: &ChartOptions<Tz>, with_minutes: bool) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = bucket.timestamp.with_timezone(&opts.tz);
    let pattern = if with_minutes {
        "%-I:%M %p"
    } else if local.date_naive() == opts.today {
        "%-I %p"
    } else {
        "%-m/%-d %-I %p"
    };
    local.format(pattern).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
