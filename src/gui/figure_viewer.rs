use std::io::{self, stdout};

use crate::figures::{BoxFigure, Figure, FigureSet, LearningFigure, LearningPanel, ScatterFigure};
use crate::gui::error::ViewerError;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};

/// Half the width of a box, in units of the box spacing.
const BOX_HALF_WIDTH: f64 = 0.3;

const SERIES_COLORS: [Color; 2] = [Color::Green, Color::Blue];

/// A polyline or point cloud to hand to a [Chart].
#[derive(Debug, Clone, PartialEq)]
struct Shape {
    color: Color,
    graph_type: GraphType,
    name: Option<String>,
    points: Vec<(f64, f64)>,
}

impl Shape {
    fn line(color: Color, points: Vec<(f64, f64)>) -> Self {
        Shape {
            color,
            graph_type: GraphType::Line,
            name: None,
            points,
        }
    }

    fn scatter(color: Color, name: Option<String>, points: Vec<(f64, f64)>) -> Self {
        Shape {
            color,
            graph_type: GraphType::Scatter,
            name,
            points,
        }
    }

    fn dataset(&self) -> Dataset<'_> {
        let ds = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(self.graph_type)
            .style(Style::default().fg(self.color))
            .data(&self.points);
        match &self.name {
            Some(name) => ds.name(name.clone()),
            None => ds,
        }
    }
}

/// Range covering every value with a little room on both sides.
fn bounds<I>(values: I) -> [f64; 2]
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    [lo - pad, hi + pad]
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::from(format!("{:.1}", v)))
        .collect()
}

/// The outline of every box, whisker and median line, plus the outliers.
fn box_shapes(fig: &BoxFigure) -> Vec<Shape> {
    let mut shapes = Vec::new();
    for (i, labeled) in fig.boxes.iter().enumerate() {
        let Some(s) = &labeled.stats else { continue };
        let x = (i + 1) as f64;
        let (l, r) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];

        shapes.push(Shape::line(
            color,
            vec![(l, s.q1), (r, s.q1), (r, s.q3), (l, s.q3), (l, s.q1)],
        ));
        shapes.push(Shape::line(Color::Red, vec![(l, s.median), (r, s.median)]));
        shapes.push(Shape::line(color, vec![(x, s.whisker_low), (x, s.q1)]));
        shapes.push(Shape::line(color, vec![(x, s.q3), (x, s.whisker_high)]));
        shapes.push(Shape::line(
            color,
            vec![(x - 0.1, s.whisker_low), (x + 0.1, s.whisker_low)],
        ));
        shapes.push(Shape::line(
            color,
            vec![(x - 0.1, s.whisker_high), (x + 0.1, s.whisker_high)],
        ));
        if !s.outliers.is_empty() {
            shapes.push(Shape::scatter(
                color,
                None,
                s.outliers.iter().map(|&y| (x, y)).collect(),
            ));
        }
    }
    shapes
}

/// Repetition axis of a learning panel, one slot per repetition.
fn learning_x_bounds(panel: &LearningPanel) -> [f64; 2] {
    [0.5, panel.repetitions.max(1) as f64 + 0.5]
}

fn learning_shapes(panel: &LearningPanel, color: Color) -> Vec<Shape> {
    vec![
        Shape::scatter(color, Some("runs".to_owned()), panel.points.clone()),
        Shape {
            color: Color::Red,
            graph_type: GraphType::Line,
            name: Some("mean".to_owned()),
            points: panel.means.clone(),
        },
    ]
}

fn scatter_shapes(fig: &ScatterFigure) -> Vec<Shape> {
    fig.series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Shape::scatter(
                SERIES_COLORS[i % SERIES_COLORS.len()],
                Some(s.label.clone()),
                s.points.clone(),
            )
        })
        .collect()
}

fn chart<'a>(
    title: &'a str,
    shapes: &'a [Shape],
    x: (&'a str, [f64; 2]),
    y: (&'a str, [f64; 2]),
) -> Chart<'a> {
    Chart::new(shapes.iter().map(Shape::dataset).collect())
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(Span::styled(x.0, Style::default().fg(Color::Red)))
                .style(Style::default().fg(Color::White))
                .bounds(x.1)
                .labels(axis_labels(x.1)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(y.0, Style::default().fg(Color::Red)))
                .style(Style::default().fg(Color::White))
                .bounds(y.1)
                .labels(axis_labels(y.1)),
        )
}

fn render_box(f: &mut Frame, area: Rect, fig: &BoxFigure) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let shapes = box_shapes(fig);
    let x_bounds = [0.5, fig.boxes.len().max(1) as f64 + 0.5];
    let y_bounds = bounds(shapes.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
    f.render_widget(
        chart(&fig.title, &shapes, ("", x_bounds), (fig.y_label.as_str(), y_bounds)),
        chunks[0],
    );

    let legend: Vec<Span> = fig
        .boxes
        .iter()
        .enumerate()
        .map(|(i, b)| Span::from(format!(" {}: {} ", i + 1, b.label)))
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(legend))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn render_learning(f: &mut Frame, area: Rect, fig: &LearningFigure) {
    let constraints: Vec<Constraint> = fig
        .panels
        .iter()
        .map(|_| Constraint::Ratio(1, fig.panels.len().max(1) as u32))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let shapes: Vec<Vec<Shape>> = fig
        .panels
        .iter()
        .enumerate()
        .map(|(i, p)| learning_shapes(p, SERIES_COLORS[i % SERIES_COLORS.len()]))
        .collect();
    // panels share the vertical axis
    let y_bounds = bounds(
        shapes
            .iter()
            .flatten()
            .flat_map(|s| s.points.iter().map(|p| p.1)),
    );
    let titles: Vec<String> = fig
        .panels
        .iter()
        .map(|p| format!("{} - {}", fig.title, p.condition))
        .collect();

    for (i, panel_shapes) in shapes.iter().enumerate() {
        f.render_widget(
            chart(
                &titles[i],
                panel_shapes,
                ("Trial number", learning_x_bounds(&fig.panels[i])),
                (fig.y_label.as_str(), y_bounds),
            ),
            chunks[i],
        );
    }
}

fn render_scatter(f: &mut Frame, area: Rect, fig: &ScatterFigure) {
    let shapes = scatter_shapes(fig);
    let points = || shapes.iter().flat_map(|s| s.points.iter());
    let x_bounds = bounds(points().map(|p| p.0));
    let y_bounds = bounds(points().map(|p| p.1));
    f.render_widget(
        chart(
            &fig.title,
            &shapes,
            (fig.x_label.as_str(), x_bounds),
            (fig.y_label.as_str(), y_bounds),
        ),
        area,
    );
}

struct App<'a> {
    figures: Vec<Figure<'a>>,
    current: usize,
}

impl App<'_> {
    fn next(&mut self) {
        self.current = (self.current + 1) % self.figures.len();
    }

    fn previous(&mut self) {
        let n = self.figures.len();
        self.current = (self.current + n - 1) % n;
    }
}

fn ui(f: &mut Frame, app: &App<'_>) {
    let instructions = Title::from(Line::from(vec![
        " Figure ".into(),
        Span::styled(
            format!("{}/{}", app.current + 1, app.figures.len()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        " Cycle ".into(),
        "<Left>/<Right>".magenta().bold(),
        " Quit ".into(),
        "<Q> ".magenta().bold(),
    ]));
    let outer = Block::default()
        .title(instructions.alignment(Alignment::Center).position(Position::Bottom))
        .borders(Borders::ALL);
    let area = outer.inner(f.size());
    f.render_widget(outer, f.size());

    match app.figures[app.current] {
        Figure::Box(fig) => render_box(f, area, fig),
        Figure::Learning(fig) => render_learning(f, area, fig),
        Figure::Scatter(fig) => render_scatter(f, area, fig),
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App<'_>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(std::time::Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => app.next(),
                    KeyCode::Left | KeyCode::Char('h') => app.previous(),
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

/// Shows the figures one at a time until the user quits.
pub fn view_figures(figures: &FigureSet) -> Result<(), ViewerError> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let app = App {
        figures: figures.figures(),
        current: 0,
    };
    let res = run_app(&mut terminal, app);

    // restore terminal before reporting anything
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(res?)
}
