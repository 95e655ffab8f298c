mod cards;
mod domain;
mod gesture;
mod journals;
mod logging;
mod storage;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::domain::{Journal, LogPatch, format_spend, mood_label};
use crate::journals::JournalRegistry;
use crate::storage::{load_journal, save_journal};
use crate::ui::{print_cards, run_dashboard};

#[derive(Debug, Parser)]
#[command(name = "ember-daybook", about = "Terminal-first daily journal")]
struct Cli {
	#[arg(long)]
	journal: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Log {
		#[arg(long)]
		date: Option<String>,
		#[arg(long)]
		mood: Option<u8>,
		#[arg(long)]
		rating: Option<u8>,
		#[arg(long)]
		sleep: Option<f32>,
		#[arg(long)]
		spend: Option<f64>,
		#[arg(long)]
		note: Option<String>,
		#[arg(long)]
		long_note: Option<String>,
		#[arg(long = "shopping")]
		shopping: Vec<String>,
		#[arg(long = "habit")]
		habits: Vec<String>,
	},
	AddEvent {
		#[arg(long)]
		month_day: String,
		#[arg(long)]
		title: String,
		#[arg(long)]
		description: Option<String>,
	},
	Cards {
		#[arg(long)]
		date: Option<String>,
	},
	Show {
		#[arg(long)]
		date: Option<String>,
	},
	Journals {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let registry = JournalRegistry::from_env();

	let _logger = match logging::init_logging(&registry.log_dir()) {
		Ok(handle) => Some(handle),
		Err(err) => {
			eprintln!("warning: file logging disabled: {err}");
			None
		}
	};

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			let (journal_path, journal) = open_journal(&registry, cli.journal)?;
			save_journal(&journal_path, &journal)?;
			println!("initialized journal at {}", journal_path.display());
		}
		Command::Dashboard => {
			let (journal_path, mut journal) = open_journal(&registry, cli.journal)?;
			run_dashboard(&mut journal, &journal_path)?;
		}
		Command::Log {
			date,
			mood,
			rating,
			sleep,
			spend,
			note,
			long_note,
			shopping,
			habits,
		} => {
			let (journal_path, mut journal) = open_journal(&registry, cli.journal)?;
			let day = parse_day(date.as_deref())?;
			let patch = LogPatch {
				mood,
				rating,
				sleep_hours: sleep,
				spend,
				note,
				long_note,
				shopping: if shopping.is_empty() { None } else { Some(shopping) },
				habits: if habits.is_empty() { None } else { Some(habits) },
			};
			if patch_is_empty(&patch) {
				return Err("nothing to log: pass at least one field".into());
			}
			journal.upsert_log(day, patch)?;
			save_journal(&journal_path, &journal)?;
			println!("logged {}", day.format("%Y-%m-%d"));
		}
		Command::AddEvent {
			month_day,
			title,
			description,
		} => {
			let (journal_path, mut journal) = open_journal(&registry, cli.journal)?;
			let event_id = journal.add_event(&month_day, title, description)?;
			save_journal(&journal_path, &journal)?;
			println!("created event {event_id}");
		}
		Command::Cards { date } => {
			let (_, journal) = open_journal(&registry, cli.journal)?;
			let day = parse_day(date.as_deref())?;
			print_cards(&journal, day, Local::now().date_naive());
		}
		Command::Show { date } => {
			let (_, journal) = open_journal(&registry, cli.journal)?;
			let day = parse_day(date.as_deref())?;
			print_day(&journal, day);
		}
		Command::Journals { limit } => print_recent_journals(&registry, limit)?,
	}

	Ok(())
}

fn open_journal(
	registry: &JournalRegistry,
	flag: Option<PathBuf>,
) -> Result<(PathBuf, Journal), Box<dyn Error>> {
	let path = registry.resolve(flag)?;
	let journal = load_journal(&path)?;
	if let Err(err) = registry.touch(&path) {
		eprintln!("warning: failed to store recent journal: {err}");
	}
	Ok((path, journal))
}

fn patch_is_empty(patch: &LogPatch) -> bool {
	patch.mood.is_none()
		&& patch.rating.is_none()
		&& patch.sleep_hours.is_none()
		&& patch.spend.is_none()
		&& patch.note.is_none()
		&& patch.long_note.is_none()
		&& patch.shopping.is_none()
		&& patch.habits.is_none()
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}

fn print_day(journal: &Journal, day: NaiveDate) {
	println!("{}", day.format("%A, %d %B %Y"));
	let Some(record) = journal.log_for(day) else {
		println!("no record for this day");
		return;
	};

	if let Some(mood) = record.mood {
		println!("mood    {} ({mood})", mood_label(mood));
	}
	if let Some(rating) = record.rating {
		println!("rating  {rating}/5");
	}
	if let Some(sleep) = record.sleep_hours {
		println!("sleep   {sleep:.1}h");
	}
	if let Some(spend) = record.spend {
		println!("spend   {}", format_spend(spend));
	}
	if let Some(note) = record.short_note() {
		println!("note    {note}");
	}
	if let Some(long_note) = record.long_note.as_deref() {
		println!("\n{long_note}");
	}
	if !record.shopping.is_empty() {
		println!("\nshopping:");
		for item in &record.shopping {
			println!("  - {item}");
		}
	}
	if !record.habits.is_empty() {
		println!("habits  {}", record.habits.join(", "));
	}
}

fn print_recent_journals(registry: &JournalRegistry, limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = registry.recent(limit)?;
	if rows.is_empty() {
		println!("no recent journals");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}
