use std::io::{self, Write};

use ansi_term::{Colour, Style};

use crate::storage::entities::Task;

const ACCENT: Colour = Colour::RGB(0x16, 0xf2, 0xa6);
const MUTED: Colour = Colour::RGB(0xa7, 0xab, 0xb3);

pub const TITLE: &str = "🧠 Divergify Sidekick";
pub const TAGLINE: &str = "For brains that zig when the world zags";

/// Everything needed to draw the single screen of the application.
pub struct ScreenView<'a> {
    pub header_scale: f32,
    pub nudge: Option<&'a str>,
    pub tasks: &'a [Task],
    pub privacy_mode: bool,
    pub input: &'a str,
}

/// A terminal can't scale text, so a growing header is drawn highlighted instead.
pub(crate) fn header_style(scale: f32) -> Style {
    if scale > 1.0 {
        ACCENT.bold()
    } else {
        Style::new().bold()
    }
}

pub fn render_screen(out: &mut impl Write, view: &ScreenView) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", header_style(view.header_scale).paint(TITLE))?;
    writeln!(out, "{}", MUTED.paint(TAGLINE))?;
    writeln!(out)?;

    if let Some(nudge) = view.nudge {
        writeln!(out, "  {}  {}", nudge, MUTED.paint("(/ok to dismiss)"))?;
        writeln!(out)?;
    }

    render_tasks(out, view.tasks)?;

    writeln!(out)?;
    let toggle = format!(
        "Tin Foil Hat Mode: {}",
        if view.privacy_mode { "ON" } else { "OFF" }
    );
    if view.privacy_mode {
        writeln!(out, "[{}]", ACCENT.paint(toggle))?;
    } else {
        writeln!(out, "[{toggle}]")?;
    }
    writeln!(out, "(Ko-fi)  (Merch)")?;

    if !view.input.is_empty() {
        writeln!(out, "{}", MUTED.paint(format!("Input: {}", view.input)))?;
    }
    write!(out, "Type a task… ")?;
    out.flush()
}

pub fn render_tasks(out: &mut impl Write, tasks: &[Task]) -> io::Result<()> {
    if tasks.is_empty() {
        writeln!(out, "{}", MUTED.paint("Nothing here yet."))?;
    }
    for (index, task) in tasks.iter().enumerate() {
        writeln!(out, "{} {:>2}. {}", ACCENT.paint("•"), index + 1, task)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{render_screen, render_tasks, ScreenView, TAGLINE, TITLE};
    use crate::storage::entities::Task;

    fn tasks() -> Vec<Task> {
        ["Buy milk", "Walk dog"]
            .into_iter()
            .filter_map(Task::parse)
            .collect()
    }

    #[test]
    fn test_screen_contains_every_part() -> Result<()> {
        let tasks = tasks();
        let mut out = Vec::new();
        render_screen(
            &mut out,
            &ScreenView {
                header_scale: 1.0,
                nudge: Some("Come back"),
                tasks: &tasks,
                privacy_mode: true,
                input: "",
            },
        )?;
        let screen = String::from_utf8(out)?;

        assert!(screen.contains(TITLE));
        assert!(screen.contains(TAGLINE));
        assert!(screen.contains("Come back"));
        assert!(screen.contains("1. Buy milk"));
        assert!(screen.contains("2. Walk dog"));
        assert!(screen.contains("Tin Foil Hat Mode: ON"));
        assert!(screen.contains("Ko-fi"));
        assert!(screen.contains("Merch"));
        Ok(())
    }

    #[test]
    fn test_screen_without_nudge() -> Result<()> {
        let mut out = Vec::new();
        render_screen(
            &mut out,
            &ScreenView {
                header_scale: 1.0,
                nudge: None,
                tasks: &[],
                privacy_mode: false,
                input: "   ",
            },
        )?;
        let screen = String::from_utf8(out)?;

        assert!(!screen.contains("/ok to dismiss"));
        assert!(screen.contains("Tin Foil Hat Mode: OFF"));
        assert!(screen.contains("Nothing here yet."));
        Ok(())
    }

    #[test]
    fn test_task_numbers_start_at_one() -> Result<()> {
        let mut out = Vec::new();
        render_tasks(&mut out, &tasks())?;
        let lines = String::from_utf8(out)?;

        assert_eq!(lines.lines().count(), 2);
        assert!(lines.lines().next().unwrap().ends_with(" 1. Buy milk"));
        Ok(())
    }
}
