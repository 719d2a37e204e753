//! `rollcall person`: sessions and totals for one person.

use std::io::Write;

use clap::Args;
use rollcall_core::config::Config;
use rollcall_core::error::ErrorCode;
use rollcall_core::model::{PersonRecord, Registry};
use rollcall_core::report::session_detail;
use rollcall_core::resolve::NameResolver;

use super::{InputArgs, load_batch};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};

/// Arguments for `rollcall person`.
#[derive(Args, Debug)]
pub struct PersonArgs {
    /// Name as written in any sheet; spelling variants are matched.
    pub name: String,

    #[command(flatten)]
    pub input: InputArgs,
}

/// Find the record `name` resolves to, without recording advisories.
pub fn find_person<'a>(
    registry: &'a Registry,
    config: &Config,
    name: &str,
) -> Option<&'a PersonRecord> {
    let mut resolver = NameResolver::new(&config.matching);
    let resolution = registry.resolve(&mut resolver, name)?;
    registry.get(resolution.canonical())
}

/// Execute `rollcall person`.
pub fn run_person(args: &PersonArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let batch = load_batch(&args.input, config, output)?;

    let Some(person) = find_person(&batch.registry, config, &args.name) else {
        let code = ErrorCode::PersonNotFound;
        render_error(
            output,
            &CliError::with_details(
                format!("no one named `{}`", args.name),
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        anyhow::bail!("person not found: {}", args.name);
    };

    render_mode(output, person, render_person_text, render_person_pretty)
}

fn render_person_text(person: &PersonRecord, w: &mut dyn Write) -> std::io::Result<()> {
    write!(w, "{}", session_detail(person))
}

fn render_person_pretty(person: &PersonRecord, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &person.name)?;
    pretty_kv(w, "id", person.id.to_string())?;
    for (key, value) in [
        ("rank", &person.rank),
        ("position", &person.position),
        ("callsign", &person.callsign),
        ("department", &person.department),
        ("shift", &person.shift),
    ] {
        if !value.is_empty() {
            pretty_kv(w, key, value)?;
        }
    }
    pretty_kv(w, "clocked", format!("{:.2} h", person.logged_hours))?;
    let shifts = &person.stats.shift_hours;
    pretty_kv(
        w,
        "by shift",
        format!(
            "{:.2} / {:.2} / {:.2} h",
            shifts.shift1, shifts.shift2, shifts.shift3
        ),
    )?;
    if let Some(spread) = person.stats.weekly_hours() {
        pretty_kv(
            w,
            "per week",
            format!("{:.2} h (stdev {:.2})", spread.mean, spread.stdev),
        )?;
    }
    pretty_kv(w, "incidents", person.incidents.len().to_string())?;
    if !person.anomalies.is_empty() {
        pretty_kv(w, "anomalies", person.anomalies.len().to_string())?;
    }

    writeln!(w)?;
    pretty_section(w, "Sessions")?;
    for s in &person.sessions {
        writeln!(w, "in: {}  -  out: {}   ({:.2} h)", s.start, s.end, s.hours())?;
    }
    if let Some(since) = person.open_since() {
        writeln!(w, "in: {since}  -  still checked in")?;
    }
    Ok(())
}
