//! Text rendering of chord diagrams, one row per string, highest first.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use strumkit_types::tuning::order;
use strumkit_types::{Diagram, Finger, Fret, Instrument, Pitch};

use crate::ui::style;

const FRETS_SHOWN: u8 = 4;

/// Open-string names in diagram order.
pub fn string_labels(instrument: Instrument) -> Vec<String> {
    let names: Vec<String> = instrument
        .open_strings_midi()
        .iter()
        .map(|m| Pitch::from_midi(*m).map(|p| p.class().name().to_string()).unwrap_or_default())
        .collect();
    order::to_diagram_order(&names)
}

/// One cell per shown fret: the finger number where the string is
/// fretted, a barre mark under a barre, otherwise a line.
fn fret_cells(diagram: &Diagram, string: usize) -> String {
    let fretted = diagram.frets.get(string).and_then(Fret::number);
    let mut cells = String::new();
    for offset in 0..FRETS_SHOWN {
        let fret = diagram.start_fret.saturating_add(offset);
        let mark = if fretted == Some(fret) && fret > 0 {
            match diagram.fingering.get(string) {
                Some(Finger::Finger(n)) => char::from_digit(*n as u32, 10).unwrap_or('*'),
                _ => '*',
            }
        } else if diagram
            .barres
            .iter()
            .any(|b| b.fret == fret && string >= b.strings[0] && string <= b.strings[1])
        {
            '='
        } else {
            '-'
        };
        cells.push('-');
        cells.push(mark);
        cells.push('-');
        cells.push('|');
    }
    cells
}

fn open_mark(fret: Option<&Fret>) -> &'static str {
    match fret {
        Some(Fret::Muted) | None => "x",
        Some(Fret::At(0)) => "o",
        Some(Fret::At(_)) => " ",
    }
}

/// Lines for a diagram. Strings in `sounding` (diagram indices) are drawn
/// highlighted.
pub fn diagram_lines(diagram: &Diagram, instrument: Instrument, sounding: &[usize]) -> Vec<Line<'static>> {
    let labels = string_labels(instrument);
    let mut lines = Vec::with_capacity(diagram.frets.len() + 1);
    lines.push(Line::from(Span::styled(
        format!("   fret {}", diagram.start_fret),
        Style::default().fg(style::DIM),
    )));
    for (string, label) in labels.iter().enumerate().take(diagram.frets.len()) {
        let muted = matches!(diagram.frets.get(string), Some(Fret::Muted));
        let base = if muted {
            Style::default().fg(style::MUTED)
        } else {
            Style::default().fg(style::TEXT)
        };
        let row_style = if sounding.contains(&string) {
            base.fg(style::SOUNDING).add_modifier(Modifier::BOLD)
        } else {
            base
        };
        let interval = diagram.intervals.get(string).cloned().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{:<2}", label), row_style),
            Span::styled(open_mark(diagram.frets.get(string)), row_style),
            Span::styled("|", Style::default().fg(style::DIM)),
            Span::styled(fret_cells(diagram, string), row_style),
            Span::styled(format!(" {}", interval), Style::default().fg(style::DIM)),
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use strumkit_types::Barre;

    fn c_major() -> Diagram {
        // Diagram order: A E C G
        Diagram {
            start_fret: 1,
            frets: vec![Fret::At(3), Fret::At(0), Fret::At(0), Fret::At(0)],
            barres: vec![],
            fingering: vec![Finger::Finger(3), Finger::Open, Finger::Open, Finger::Open],
            position: "1".into(),
            intervals: vec!["R".into(), "3".into(), "R".into(), "5".into()],
        }
    }

    #[test]
    fn ukulele_labels_are_highest_first() {
        assert_eq!(string_labels(Instrument::Ukulele), vec!["A", "E", "C", "G"]);
        assert_eq!(
            string_labels(Instrument::Guitar),
            vec!["E", "B", "G", "D", "A", "E"]
        );
    }

    #[test]
    fn fretted_string_shows_finger() {
        assert_eq!(fret_cells(&c_major(), 0), "---|---|-3-|---|");
        assert_eq!(fret_cells(&c_major(), 1), "---|---|---|---|");
    }

    #[test]
    fn barre_is_marked() {
        let mut d = c_major();
        d.barres = vec![Barre {
            fret: 2,
            strings: [1, 3],
        }];
        assert_eq!(fret_cells(&d, 2), "---|-=-|---|---|");
        assert_eq!(fret_cells(&d, 0), "---|---|-3-|---|");
    }

    #[test]
    fn one_line_per_string_plus_header() {
        assert_eq!(diagram_lines(&c_major(), Instrument::Ukulele, &[0]).len(), 5);
        assert_eq!(open_mark(Some(&Fret::Muted)), "x");
        assert_eq!(open_mark(Some(&Fret::At(0))), "o");
    }
}
