use std::collections::HashSet;
use std::error::Error;
use std::io;
use std::path::Path;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Datelike, Duration, Local, NaiveDate};
use crossterm::event::{
	self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEventKind,
	MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
	EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::cards::{
	CardCandidate, CardKind, DismissedCards, StackState, card_transform, generate,
	stack_indicator_dots, visible,
};
use crate::domain::{
	Journal, LogPatch, format_spend, month_day_key, mood_label, start_of_week,
};
use crate::gesture::{DISMISS_OFFSET_PX, Decision, DragEvent, GestureState, reduce};
use crate::storage::save_journal;

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;

// One terminal cell stands in for roughly eight pixels of horizontal drag.
const CELL_WIDTH_PX: f32 = 8.0;
const TAP_SLOP_PX: f32 = 8.0;
const SYNTHETIC_DISMISS_PX: f32 = 120.0;

// How long a dismissal keeps the top card highlighted before the stack
// settles into HasCandidates or Empty.
const DISMISS_FLASH: StdDuration = StdDuration::from_millis(150);

pub fn run_dashboard(journal: &mut Journal, journal_path: &Path) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, journal, journal_path);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	journal: &mut Journal,
	journal_path: &Path,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::default();

	loop {
		let today = Local::now().date_naive();
		let view = build_view(&app, journal, today);
		app.settle_stack(view.visible.len(), Instant::now());
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			match event::read()? {
				CEvent::Key(key) => {
					if key.kind != KeyEventKind::Press {
						continue;
					}

					let should_quit = match &app.mode {
						InputMode::Prompt(_) => {
							handle_prompt_key(&mut app, key.code, journal, journal_path)
						}
						InputMode::Normal => handle_normal_key(&mut app, key.code, &view),
					};

					if should_quit {
						break;
					}
				}
				CEvent::Mouse(mouse) => {
					if matches!(app.mode, InputMode::Normal) {
						let areas = compute_areas(terminal.get_frame().area());
						handle_mouse(&mut app, mouse, &areas, &view);
					}
				}
				_ => {}
			}
		}
	}

	Ok(())
}

struct Areas {
	calendar: Rect,
	week: Rect,
	stack: Rect,
	day: Rect,
	footer: Rect,
}

fn compute_areas(area: Rect) -> Areas {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(4)])
		.split(area);

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage(26),
			Constraint::Percentage(46),
			Constraint::Percentage(28),
		])
		.split(layout[0]);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(11), Constraint::Min(8)])
		.split(body[0]);

	Areas {
		calendar: left[0],
		week: left[1],
		stack: body[1],
		day: body[2],
		footer: layout[1],
	}
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let areas = compute_areas(frame.area());
	render_calendar_panel(frame, areas.calendar, app, view);
	render_week_panel(frame, areas.week, &view.week);
	render_stack_panel(frame, areas.stack, app, view);
	render_day_panel(frame, areas.day, app, view);
	render_footer(frame, areas.footer, app);
}

fn render_calendar_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let month = app.calendar_month;
	let selected_day = app.selected_day;
	let today = view.today;
	let logged_days = &view.logged_days;
	let mut lines = Vec::new();
	lines.push(Line::from(format!("{} {}", month.format("%B"), month.year())));
	lines.push(Line::from("Mo Tu We Th Fr Sa Su"));

	let first_weekday = month.weekday().number_from_monday() as usize - 1;
	let days_in_month = days_in_month(month.year(), month.month());
	let mut day_counter = 1u32;
	for week in 0..6 {
		let mut spans = Vec::new();
		for weekday_index in 0..7 {
			let before_first = week == 0 && weekday_index < first_weekday;
			let after_last = day_counter > days_in_month;
			if before_first || after_last {
				spans.push(Span::raw("   "));
				continue;
			}

			let date = NaiveDate::from_ymd_opt(month.year(), month.month(), day_counter)
				.expect("calendar day must be valid");
			let mut style = Style::default();
			if date == selected_day {
				style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
			} else if date == today {
				style = style.fg(Color::LightCyan).add_modifier(Modifier::BOLD);
			} else if logged_days.contains(&date) {
				style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
			}

			spans.push(Span::styled(format!("{:>2} ", day_counter), style));
			day_counter += 1;
		}
		lines.push(Line::from(spans));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Calendar")
		.border_style(border_style(app.focus == FocusPane::Calendar));
	let calendar = Paragraph::new(lines).block(block);
	frame.render_widget(calendar, area);
}

fn render_week_panel(frame: &mut Frame, area: Rect, week: &WeekSpendView) {
	let mut lines = Vec::new();
	lines.push(Line::from(format!(
		"Week {} - {}",
		week.week_start.format("%d %b"),
		(week.week_start + Duration::days(6)).format("%d %b")
	)));
	lines.push(Line::from(format!("Spend: {}", format_spend(week.total))));
	lines.push(Line::from(format!("Logged days: {}", week.logged_days)));
	lines.push(Line::from(""));

	let max_spend = week
		.daily
		.iter()
		.map(|(_, spend)| *spend)
		.fold(0.0f64, f64::max)
		.max(0.01);
	for (day, spend) in &week.daily {
		let width = ((spend / max_spend) * 14.0).round() as usize;
		let bar = "=".repeat(width.max(usize::from(*spend > 0.0)));
		lines.push(Line::from(format!(
			"{} {:>8} {}",
			day.format("%a"),
			format_spend(*spend),
			bar
		)));
	}

	let panel = Paragraph::new(lines)
		.block(Block::default().borders(Borders::ALL).title("Week Spend"));
	frame.render_widget(panel, area);
}

fn render_day_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let mut lines = Vec::new();
	match &view.selected_log {
		Some(record) => {
			if let Some(mood) = record.mood {
				lines.push(Line::from(format!("mood    {} ({mood})", mood_label(mood))));
			}
			if let Some(rating) = record.rating {
				lines.push(Line::from(format!("rating  {rating}/5")));
			}
			if let Some(sleep) = record.sleep_hours {
				lines.push(Line::from(format!("sleep   {sleep:.1}h")));
			}
			if let Some(spend) = record.spend {
				lines.push(Line::from(format!("spend   {}", format_spend(spend))));
			}
			if let Some(note) = record.short_note() {
				lines.push(Line::from(format!("note    {note}")));
			}
			if let Some(long_note) = record.long_note.as_deref() {
				lines.push(Line::from(""));
				for text_line in long_note.lines().take(6) {
					lines.push(Line::from(text_line.to_string()));
				}
			}
			if !record.habits.is_empty() {
				lines.push(Line::from(""));
				lines.push(Line::from(format!("habits  {}", record.habits.join(", "))));
			}
			if lines.is_empty() {
				lines.push(Line::from("(empty record)"));
			}
		}
		None => {
			lines.push(Line::from("(no record for this day)"));
		}
	}

	let title = app.selected_day.format("%A, %d %B %Y").to_string();
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_stack_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let block = Block::default()
		.borders(Borders::ALL)
		.title("Cards")
		.border_style(border_style(app.focus == FocusPane::Stack));
	let inner = block.inner(area);
	frame.render_widget(block, area);

	if inner.height < 5 || inner.width < 10 {
		return;
	}

	if view.visible.is_empty() {
		let lines = vec![
			Line::from(""),
			Line::from("All caught up."),
			Line::from(""),
			Line::from(Span::styled(
				"press r to restore dismissed cards",
				Style::default().fg(Color::DarkGray),
			)),
		];
		frame.render_widget(Paragraph::new(lines).centered(), inner);
		return;
	}

	let depth = view.visible.len().min(3);
	let card_height = inner.height.saturating_sub(depth as u16 + 1).max(4);

	for index in (0..depth).rev() {
		let card = &view.visible[index];
		let transform = card_transform(index);
		let inset = (((1.0 - transform.scale) * inner.width as f32) / 2.0).round() as u16;
		let rotate_shift: i32 = if transform.rotate_deg > 0.0 {
			1
		} else if transform.rotate_deg < 0.0 {
			-1
		} else {
			0
		};
		let translate_rows = (transform.translate_y / 12.0).round() as u16;

		let mut x = inner.x as i32 + inset as i32 + rotate_shift;
		if index == 0 && app.gesture.dragging {
			x += (app.gesture.offset_x / CELL_WIDTH_PX).round() as i32;
		}
		let x = x.clamp(inner.x as i32, (inner.x + inner.width.saturating_sub(4)) as i32) as u16;
		let width = (inner.width - 2 * inset.min(inner.width / 4)).max(4);
		let y = inner.y + translate_rows.min(inner.height.saturating_sub(4));
		let rect = Rect {
			x,
			y,
			width: width.min(inner.right().saturating_sub(x)),
			height: card_height.min(inner.bottom().saturating_sub(y)),
		};

		if index == 0 {
			render_top_card(
				frame,
				rect,
				card,
				&app.gesture,
				app.stack_state == StackState::Dismissing,
			);
		} else {
			render_back_card(frame, rect, card, transform.opacity);
		}
	}

	let dots = stack_indicator_dots(view.visible.len());
	if dots > 0 {
		let indicator = Rect {
			x: inner.x,
			y: inner.bottom().saturating_sub(1),
			width: inner.width,
			height: 1,
		};
		let text = (0..dots).map(|_| "o").collect::<Vec<_>>().join(" ");
		frame.render_widget(
			Paragraph::new(Line::from(Span::styled(
				text,
				Style::default().fg(Color::DarkGray),
			)))
			.centered(),
			indicator,
		);
	}
}

fn render_back_card(frame: &mut Frame, rect: Rect, card: &CardCandidate, opacity: f32) {
	let color = if opacity >= 0.85 {
		Color::Gray
	} else {
		Color::DarkGray
	};
	let block = Block::default()
		.borders(Borders::ALL)
		.title(card_title(&card.kind))
		.border_style(Style::default().fg(color))
		.style(Style::default().fg(color));
	frame.render_widget(block, rect);
}

fn render_top_card(
	frame: &mut Frame,
	rect: Rect,
	card: &CardCandidate,
	gesture: &GestureState,
	dismissing: bool,
) {
	let past_threshold = gesture.dragging && gesture.offset_x.abs() > DISMISS_OFFSET_PX;
	let border = if dismissing || past_threshold {
		Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
	};
	let block = Block::default()
		.borders(Borders::ALL)
		.title(card_title(&card.kind))
		.border_style(border);
	let body = Paragraph::new(card_lines(&card.kind)).block(block);
	frame.render_widget(body, rect);
}

fn card_title(kind: &CardKind) -> &'static str {
	match kind {
		CardKind::Prompt => "Log today",
		CardKind::Missed => "Missed day",
		CardKind::Future => "Future",
		CardKind::Event { .. } => "Event",
		CardKind::Stats { .. } => "Day stats",
		CardKind::Shopping { .. } => "Shopping",
		CardKind::Note { .. } => "Note",
	}
}

fn card_lines(kind: &CardKind) -> Vec<Line<'static>> {
	match kind {
		CardKind::Prompt => render_prompt_card(),
		CardKind::Missed => render_missed_card(),
		CardKind::Future => render_future_card(),
		CardKind::Event { title, description } => render_event_card(title, description.as_deref()),
		CardKind::Stats {
			mood,
			rating,
			sleep_hours,
			highlight,
			week_spend,
		} => render_stats_card(*mood, *rating, *sleep_hours, highlight.as_deref(), *week_spend),
		CardKind::Shopping { items } => render_shopping_card(items),
		CardKind::Note { text } => render_note_card(text),
	}
}

fn render_prompt_card() -> Vec<Line<'static>> {
	vec![
		Line::from(""),
		Line::from("No entry for today yet."),
		Line::from(""),
		Line::from(Span::styled(
			"press Enter to write today's log",
			Style::default().fg(Color::DarkGray),
		)),
	]
}

fn render_missed_card() -> Vec<Line<'static>> {
	vec![
		Line::from(""),
		Line::from("This day has no entry."),
		Line::from(""),
		Line::from(Span::styled(
			"press Enter to fill it in",
			Style::default().fg(Color::DarkGray),
		)),
	]
}

fn render_future_card() -> Vec<Line<'static>> {
	vec![
		Line::from(""),
		Line::from("This day hasn't happened yet."),
		Line::from("Come back once it does."),
	]
}

fn render_event_card(title: &str, description: Option<&str>) -> Vec<Line<'static>> {
	let mut lines = vec![
		Line::from(""),
		Line::from(Span::styled(
			title.to_string(),
			Style::default().add_modifier(Modifier::BOLD),
		)),
	];
	if let Some(description) = description {
		lines.push(Line::from(""));
		lines.push(Line::from(description.to_string()));
	}
	lines
}

fn render_stats_card(
	mood: Option<u8>,
	rating: Option<u8>,
	sleep_hours: Option<f32>,
	highlight: Option<&str>,
	week_spend: f64,
) -> Vec<Line<'static>> {
	let mut lines = vec![Line::from("")];
	if let Some(mood) = mood {
		lines.push(Line::from(format!("mood        {} ({mood})", mood_label(mood))));
	}
	if let Some(rating) = rating {
		lines.push(Line::from(format!("rating      {rating}/5")));
	}
	if let Some(sleep) = sleep_hours {
		lines.push(Line::from(format!("sleep       {sleep:.1}h")));
	}
	lines.push(Line::from(format!("week spend  {}", format_spend(week_spend))));
	if let Some(highlight) = highlight {
		lines.push(Line::from(""));
		for text_line in highlight.lines().take(4) {
			lines.push(Line::from(text_line.to_string()));
		}
	}
	lines
}

fn render_shopping_card(items: &[String]) -> Vec<Line<'static>> {
	let mut lines = vec![Line::from(""), Line::from("Shopping list:")];
	for item in items.iter().filter(|item| !item.trim().is_empty()) {
		lines.push(Line::from(format!("  - {item}")));
	}
	lines
}

fn render_note_card(text: &str) -> Vec<Line<'static>> {
	vec![Line::from(""), Line::from(text.to_string())]
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from(
				"Tab pane | arrows/hjkl move day (calendar) | n/N month | t today | q quit",
			),
			Line::from(
				"drag or h/l/d dismiss top card | Enter tap | e edit day | r restore dismissed",
			),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit (blank skips) | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines)
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn handle_normal_key(app: &mut App, code: KeyCode, view: &ViewModel) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab | KeyCode::BackTab => {
			app.focus = app.focus.next();
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if app.focus == FocusPane::Calendar {
				app.shift_selected_day(-7);
			}
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if app.focus == FocusPane::Calendar {
				app.shift_selected_day(7);
			}
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			match app.focus {
				FocusPane::Calendar => app.shift_selected_day(-1),
				FocusPane::Stack => synthetic_swipe(app, view, -SYNTHETIC_DISMISS_PX),
			}
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			match app.focus {
				FocusPane::Calendar => app.shift_selected_day(1),
				FocusPane::Stack => synthetic_swipe(app, view, SYNTHETIC_DISMISS_PX),
			}
			false
		}
		KeyCode::Char('d') => {
			synthetic_swipe(app, view, SYNTHETIC_DISMISS_PX);
			false
		}
		KeyCode::Char('n') => {
			app.shift_selected_month(1);
			false
		}
		KeyCode::Char('N') => {
			app.shift_selected_month(-1);
			false
		}
		KeyCode::Char('t') => {
			app.set_selected_day(Local::now().date_naive());
			false
		}
		KeyCode::Char('r') => {
			if app.dismissed.is_empty() {
				app.status = "No dismissed cards".to_string();
			} else {
				app.dismissed.clear();
				app.stack_state = StackState::Unresolved;
				app.status = "Dismissed cards restored".to_string();
			}
			false
		}
		KeyCode::Char('e') => {
			app.open_log_editor();
			false
		}
		KeyCode::Enter => {
			let top = view.visible.first();
			let (gesture, decision) = reduce(app.gesture, DragEvent::Tap, top);
			app.gesture = gesture;
			apply_decision(app, decision);
			false
		}
		_ => false,
	}
}

/// Keyboard stand-in for a swipe: a full drag past the offset threshold,
/// run through the same reducer as the mouse path.
fn synthetic_swipe(app: &mut App, view: &ViewModel, offset_x: f32) {
	let top = match view.visible.first() {
		Some(card) => card,
		None => {
			app.status = "No card to dismiss".to_string();
			return;
		}
	};

	let (state, _) = reduce(app.gesture, DragEvent::Begin, Some(top));
	let (state, _) = reduce(
		state,
		DragEvent::Move {
			offset_x,
			velocity_x: 0.0,
		},
		Some(top),
	);
	let (state, decision) = reduce(state, DragEvent::Release, Some(top));
	app.gesture = state;
	if let Decision::Dismiss { card_id } = decision {
		app.dismiss_card(&card_id);
	}
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, areas: &Areas, view: &ViewModel) {
	let position = Position::new(mouse.column, mouse.row);
	let top = view.visible.first();

	match mouse.kind {
		MouseEventKind::Down(MouseButton::Left) => {
			if !areas.stack.contains(position) {
				if areas.calendar.contains(position) {
					app.focus = FocusPane::Calendar;
				}
				return;
			}
			app.focus = FocusPane::Stack;
			app.drag = Some(DragAnchor {
				start_col: mouse.column,
				last_col: mouse.column,
				last_at: Instant::now(),
			});
			let (state, _) = reduce(app.gesture, DragEvent::Begin, top);
			app.gesture = state;
		}
		MouseEventKind::Drag(MouseButton::Left) => {
			let Some(anchor) = &mut app.drag else {
				return;
			};
			let now = Instant::now();
			let elapsed = now.duration_since(anchor.last_at).as_secs_f32().max(1e-3);
			let offset_x =
				(mouse.column as f32 - anchor.start_col as f32) * CELL_WIDTH_PX;
			let velocity_x =
				(mouse.column as f32 - anchor.last_col as f32) * CELL_WIDTH_PX / elapsed;
			anchor.last_col = mouse.column;
			anchor.last_at = now;

			let (state, _) = reduce(
				app.gesture,
				DragEvent::Move {
					offset_x,
					velocity_x,
				},
				top,
			);
			app.gesture = state;
		}
		MouseEventKind::Up(MouseButton::Left) => {
			if app.drag.take().is_none() {
				return;
			}
			let event = if app.gesture.offset_x.abs() < TAP_SLOP_PX {
				DragEvent::Tap
			} else {
				DragEvent::Release
			};
			let (state, decision) = reduce(app.gesture, event, top);
			app.gesture = state;
			apply_decision(app, decision);
		}
		_ => {}
	}
}

fn apply_decision(app: &mut App, decision: Decision) {
	match decision {
		Decision::Continue | Decision::SnapBack => {}
		Decision::Dismiss { card_id } => app.dismiss_card(&card_id),
		Decision::OpenEditor => app.open_log_editor(),
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	journal: &mut Journal,
	journal_path: &Path,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal => return false,
			};

			match submit_prompt(prompt.clone(), journal, journal_path) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => {
					app.mode = InputMode::Prompt(next_prompt)
				}
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	journal: &mut Journal,
	journal_path: &Path,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::EditMood { date } => {
			let mood = optional_number::<u8>(&prompt.input, "mood")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Rating 1-5 (blank to skip)",
				PromptKind::EditRating { date, mood },
			)))
		}
		PromptKind::EditRating { date, mood } => {
			let rating = optional_number::<u8>(&prompt.input, "rating")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Sleep hours (blank to skip)",
				PromptKind::EditSleep { date, mood, rating },
			)))
		}
		PromptKind::EditSleep { date, mood, rating } => {
			let sleep_hours = optional_number::<f32>(&prompt.input, "sleep hours")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Spend (blank to skip)",
				PromptKind::EditSpend {
					date,
					mood,
					rating,
					sleep_hours,
				},
			)))
		}
		PromptKind::EditSpend {
			date,
			mood,
			rating,
			sleep_hours,
		} => {
			let spend = optional_number::<f64>(&prompt.input, "spend")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Note (blank to skip)",
				PromptKind::EditNote {
					date,
					mood,
					rating,
					sleep_hours,
					spend,
				},
			)))
		}
		PromptKind::EditNote {
			date,
			mood,
			rating,
			sleep_hours,
			spend,
		} => {
			let note = optional_text(&prompt.input);
			let patch = LogPatch {
				mood,
				rating,
				sleep_hours,
				spend,
				note,
				..LogPatch::default()
			};
			journal.upsert_log(date, patch)?;
			save_journal(journal_path, journal).map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!(
				"logged {}",
				date.format("%Y-%m-%d")
			)))
		}
	}
}

fn optional_number<T: std::str::FromStr>(input: &str, field: &str) -> Result<Option<T>, String> {
	let value = input.trim();
	if value.is_empty() {
		return Ok(None);
	}
	value
		.parse::<T>()
		.map(Some)
		.map_err(|_| format!("invalid {field}: '{value}'"))
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn build_view(app: &App, journal: &Journal, today: NaiveDate) -> ViewModel {
	let logged_days = journal.logged_days().collect::<HashSet<_>>();
	let events = journal.events_for_month_day(&month_day_key(app.selected_day));
	let week_spend = journal.week_spend(app.selected_day);
	let cards = generate(
		app.selected_day,
		today,
		journal.log_for(app.selected_day),
		&events,
		week_spend,
	);
	let visible_cards = visible(&cards, &app.dismissed)
		.into_iter()
		.cloned()
		.collect::<Vec<_>>();
	let week = build_week_view(app.selected_day, journal);

	ViewModel {
		today,
		logged_days,
		visible: visible_cards,
		selected_log: journal.log_for(app.selected_day).cloned(),
		week,
	}
}

fn build_week_view(selected_day: NaiveDate, journal: &Journal) -> WeekSpendView {
	let week_start = start_of_week(selected_day);
	let mut daily = Vec::new();
	let mut logged_days = 0usize;
	for offset in 0..7 {
		let day = week_start + Duration::days(offset);
		let record = journal.log_for(day);
		if record.is_some() {
			logged_days += 1;
		}
		daily.push((day, record.and_then(|record| record.spend).unwrap_or(0.0)));
	}

	WeekSpendView {
		week_start,
		total: journal.week_spend(selected_day),
		logged_days,
		daily,
	}
}

fn days_in_month(year: i32, month: u32) -> u32 {
	let first_of_next = if month == 12 {
		NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
	} else {
		NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
	};
	(first_of_next - Duration::days(1)).day()
}

fn first_day_of_month(day: NaiveDate) -> NaiveDate {
	NaiveDate::from_ymd_opt(day.year(), day.month(), 1).expect("first day of month must be valid")
}

fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
	let mut year = day.year();
	let mut month = day.month() as i32 + delta;
	while month > 12 {
		year += 1;
		month -= 12;
	}
	while month < 1 {
		year -= 1;
		month += 12;
	}
	let month_u32 = month as u32;
	let max_day = days_in_month(year, month_u32);
	let target_day = day.day().min(max_day);
	NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Calendar,
	Stack,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Stack,
			FocusPane::Stack => FocusPane::Calendar,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	EditMood {
		date: NaiveDate,
	},
	EditRating {
		date: NaiveDate,
		mood: Option<u8>,
	},
	EditSleep {
		date: NaiveDate,
		mood: Option<u8>,
		rating: Option<u8>,
	},
	EditSpend {
		date: NaiveDate,
		mood: Option<u8>,
		rating: Option<u8>,
		sleep_hours: Option<f32>,
	},
	EditNote {
		date: NaiveDate,
		mood: Option<u8>,
		rating: Option<u8>,
		sleep_hours: Option<f32>,
		spend: Option<f64>,
	},
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone, Copy)]
struct DragAnchor {
	start_col: u16,
	last_col: u16,
	last_at: Instant,
}

struct App {
	focus: FocusPane,
	selected_day: NaiveDate,
	calendar_month: NaiveDate,
	dismissed: DismissedCards,
	stack_state: StackState,
	dismissed_at: Option<Instant>,
	gesture: GestureState,
	drag: Option<DragAnchor>,
	mode: InputMode,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		let today = Local::now().date_naive();
		Self {
			focus: FocusPane::Stack,
			selected_day: today,
			calendar_month: first_day_of_month(today),
			dismissed: DismissedCards::new(today),
			stack_state: StackState::Unresolved,
			dismissed_at: None,
			gesture: GestureState::default(),
			drag: None,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}
}

impl App {
	/// The single path for moving to another day: dismissals for the old
	/// day are dropped and any in-flight gesture is discarded.
	fn set_selected_day(&mut self, day: NaiveDate) {
		self.selected_day = day;
		self.calendar_month = first_day_of_month(day);
		self.dismissed.sync_day(day);
		self.gesture = GestureState::default();
		self.drag = None;
		self.stack_state = StackState::Unresolved;
		self.dismissed_at = None;
	}

	fn shift_selected_day(&mut self, delta_days: i64) {
		self.set_selected_day(self.selected_day + Duration::days(delta_days));
	}

	fn shift_selected_month(&mut self, delta_months: i32) {
		self.set_selected_day(shift_month(self.selected_day, delta_months));
	}

	fn dismiss_card(&mut self, card_id: &str) {
		self.dismissed.add(card_id);
		self.stack_state = StackState::Dismissing;
		self.dismissed_at = Some(Instant::now());
		self.status = "Card dismissed".to_string();
	}

	/// Settles the stack before a redraw. A fresh dismissal holds the
	/// Dismissing state for the flash window, so the highlight survives
	/// however many frames land inside it.
	fn settle_stack(&mut self, visible_count: usize, now: Instant) {
		if self.stack_state == StackState::Dismissing {
			if let Some(at) = self.dismissed_at {
				if now.duration_since(at) < DISMISS_FLASH {
					return;
				}
			}
			self.dismissed_at = None;
		}
		self.stack_state = StackState::resolved(visible_count);
	}

	fn open_log_editor(&mut self) {
		let date = self.selected_day;
		self.mode = InputMode::Prompt(PromptState::new(
			format!(
				"Mood 0-9 for {} (blank to skip)",
				date.format("%Y-%m-%d")
			),
			PromptKind::EditMood { date },
		));
	}
}

struct ViewModel {
	today: NaiveDate,
	logged_days: HashSet<NaiveDate>,
	visible: Vec<CardCandidate>,
	selected_log: Option<crate::domain::LogRecord>,
	week: WeekSpendView,
}

struct WeekSpendView {
	week_start: NaiveDate,
	daily: Vec<(NaiveDate, f64)>,
	total: f64,
	logged_days: usize,
}

/// Headless card listing for the `cards` subcommand; shares the candidate
/// pipeline and per-variant text with the dashboard.
pub fn print_cards(journal: &Journal, selected_day: NaiveDate, today: NaiveDate) {
	let events = journal.events_for_month_day(&month_day_key(selected_day));
	let week_spend = journal.week_spend(selected_day);
	let cards = generate(
		selected_day,
		today,
		journal.log_for(selected_day),
		&events,
		week_spend,
	);

	println!(
		"cards for {} (today {})",
		selected_day.format("%Y-%m-%d"),
		today.format("%Y-%m-%d")
	);
	for card in &cards {
		println!("z={:<2} {:<10} {}", card.z_index, card.id, card_title(&card.kind));
		for line in card_lines(&card.kind) {
			let text = line
				.spans
				.iter()
				.map(|span| span.content.as_ref())
				.collect::<String>();
			if !text.trim().is_empty() {
				println!("      {text}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::{Duration, Instant};

	use crate::cards::StackState;

	use super::{App, DISMISS_FLASH};

	#[test]
	fn dismissal_highlight_survives_redraws_inside_the_flash_window() {
		let mut app = App::default();
		app.dismiss_card("prompt");
		assert_eq!(app.stack_state, StackState::Dismissing);

		app.settle_stack(2, Instant::now());
		assert_eq!(app.stack_state, StackState::Dismissing);

		app.settle_stack(2, Instant::now() + DISMISS_FLASH + Duration::from_millis(50));
		assert_eq!(app.stack_state, StackState::HasCandidates);
	}

	#[test]
	fn last_dismissal_settles_into_the_empty_state() {
		let mut app = App::default();
		app.dismiss_card("prompt");
		app.settle_stack(0, Instant::now() + DISMISS_FLASH + Duration::from_millis(50));
		assert_eq!(app.stack_state, StackState::Empty);
	}

	#[test]
	fn changing_day_restarts_the_stack_cycle() {
		let mut app = App::default();
		app.dismiss_card("prompt");
		app.shift_selected_day(1);
		assert_eq!(app.stack_state, StackState::Unresolved);
		assert!(app.dismissed.is_empty());
	}
}
