//! Built-in rhythm patterns.
//!
//! Cells are laid out with small builders and then normalized, so every
//! preset satisfies the span invariant whatever its source layout.

use strumkit_types::{
    ArpeggioCell, GridCell, PatternGrid, RhythmPattern, StrumCell, StrumKind, TimeSignature,
};

/// Id of the pattern selected when nothing else is.
pub const FIRST_PRESET_ID: &str = "down-up-16th";

const D: StrumKind = StrumKind::Down;
const U: StrumKind = StrumKind::Up;
const R: StrumKind = StrumKind::Rest;

fn s(kind: StrumKind, duration: usize) -> StrumCell {
    StrumCell::new(kind, false, duration)
}

fn sa(kind: StrumKind, duration: usize) -> StrumCell {
    StrumCell::new(kind, true, duration)
}

fn r() -> StrumCell {
    s(R, 1)
}

/// Placed notes per lane as `(step, accented, duration)`.
type LaneNotes<'a> = &'a [(usize, bool, usize)];

fn arpeggio(total: usize, lanes: &[LaneNotes]) -> Vec<Vec<ArpeggioCell>> {
    lanes
        .iter()
        .map(|notes| {
            let mut lane = vec![ArpeggioCell::inactive(); total];
            for &(step, accented, duration) in notes.iter() {
                if step < total {
                    lane[step] = ArpeggioCell::new(true, accented, duration);
                }
            }
            lane
        })
        .collect()
}

/// Fit a lane to `total` steps and release anything that breaks the span
/// invariant: placeholders get duration 1 and no accent, cells inside an
/// earlier span become placeholders, spans are cut at the measure end.
pub fn normalize_lane<C: GridCell>(lane: &mut Vec<C>, total: usize) {
    lane.resize(total, C::placeholder());
    let mut covered_until = 0;
    for i in 0..total {
        if i < covered_until || !lane[i].is_placed() {
            lane[i] = C::placeholder();
            continue;
        }
        let duration = lane[i].duration().clamp(1, total - i);
        lane[i].set_duration(duration);
        covered_until = i + duration;
    }
}

fn strum(id: &str, name: &str, ts: TimeSignature, mut cells: Vec<StrumCell>) -> RhythmPattern {
    normalize_lane(&mut cells, ts.describe().total_steps);
    RhythmPattern {
        id: id.to_string(),
        name: name.to_string(),
        time_signature: ts,
        grid: PatternGrid::Strum(cells),
    }
}

fn arp(id: &str, name: &str, ts: TimeSignature, mut lanes: Vec<Vec<ArpeggioCell>>) -> RhythmPattern {
    let total = ts.describe().total_steps;
    for lane in &mut lanes {
        normalize_lane(lane, total);
    }
    RhythmPattern {
        id: id.to_string(),
        name: name.to_string(),
        time_signature: ts,
        grid: PatternGrid::Arpeggio(lanes),
    }
}

/// Expand each placed cell with rest fill for the rest of its span.
fn spread(cells: &[StrumCell]) -> Vec<StrumCell> {
    cells
        .iter()
        .flat_map(|c| {
            let fill = if c.kind == R { 0 } else { c.duration - 1 };
            std::iter::once(*c).chain(std::iter::repeat(r()).take(fill))
        })
        .collect()
}

pub fn presets() -> Vec<RhythmPattern> {
    use TimeSignature::{FourFour, ThreeFour};

    vec![
        strum(
            "down-up-16th",
            "Down-Up (16ths)",
            FourFour,
            (0..16).map(|i| s(if i % 2 == 0 { D } else { U }, 1)).collect(),
        ),
        strum(
            "down-up-8th",
            "Down-Up (8ths)",
            FourFour,
            (0..16)
                .map(|i| match i % 4 {
                    0 => sa(D, 2),
                    2 => s(U, 2),
                    _ => r(),
                })
                .collect(),
        ),
        strum(
            "island-strum",
            "Island Strum",
            FourFour,
            spread(&[
                s(D, 2), r(), s(D, 1), r(), s(U, 2), r(), s(U, 1), r(),
                s(D, 1), s(U, 1), r(), r(), r(), r(), r(), r(),
            ]),
        ),
        strum(
            "slow-ballad",
            "Slow Ballad",
            FourFour,
            vec![
                sa(D, 4), r(), r(), r(),
                sa(D, 4), r(), r(), r(),
                s(D, 2), r(), s(U, 2), r(),
                s(D, 4), r(), r(), r(),
            ],
        ),
        strum(
            "swing-strum",
            "Swing Strum",
            FourFour,
            (0..4).flat_map(|_| [sa(D, 3), r(), r(), s(U, 1)]).collect(),
        ),
        strum(
            "down-4th",
            "Down (4ths)",
            FourFour,
            (0..16)
                .map(|i| if i % 4 == 0 { sa(D, 4) } else { r() })
                .collect(),
        ),
        strum(
            "reggae-skank",
            "Reggae Skank",
            FourFour,
            (0..16)
                .map(|i| if i % 4 == 2 { sa(U, 2) } else { r() })
                .collect(),
        ),
        strum(
            "waltz",
            "Waltz Strum",
            ThreeFour,
            vec![
                sa(D, 4), r(), r(), r(),
                s(D, 2), r(), s(U, 2), r(),
                s(D, 2), r(), s(U, 2), r(),
            ],
        ),
        arp(
            "ascending-8th",
            "Ascending Arp (8ths)",
            FourFour,
            arpeggio(16, &[
                &[(0, true, 2), (8, true, 2)],
                &[(2, false, 2), (10, false, 2)],
                &[(4, false, 2), (12, false, 2)],
                &[(6, false, 2), (14, false, 2)],
            ]),
        ),
        arp(
            "syncopated-8ths",
            "Syncopated 8ths",
            FourFour,
            arpeggio(16, &[
                &[(2, false, 2), (10, false, 2)],
                &[(6, false, 2), (14, false, 2)],
                &[(4, false, 2), (12, false, 2)],
                &[(0, true, 2), (8, true, 2)],
            ]),
        ),
        arp(
            "waltz-arp-3-4",
            "Waltz Arp (3/4)",
            ThreeFour,
            arpeggio(12, &[
                &[(0, true, 4), (4, true, 4)],
                &[(4, false, 4)],
                &[(8, false, 4)],
                &[],
            ]),
        ),
        strum(
            "folk-strum",
            "Folk Strum",
            FourFour,
            vec![
                sa(D, 4), r(), r(), r(),
                s(D, 2), r(), s(U, 2), r(),
                r(), r(), sa(U, 2), r(),
                s(D, 2), r(), s(U, 2), r(),
            ],
        ),
        strum(
            "bossa-nova",
            "Bossa Nova",
            FourFour,
            vec![
                sa(D, 3), r(), r(), r(),
                s(D, 2), r(), s(U, 2), r(),
                r(), r(), sa(U, 2), r(),
                s(D, 2), r(), r(), r(),
            ],
        ),
        arp(
            "classical-arp",
            "Classical Arp",
            FourFour,
            arpeggio(16, &[
                &[(0, true, 4)],
                &[(4, false, 2), (14, false, 2)],
                &[(6, false, 2), (12, false, 2)],
                &[(8, true, 4)],
            ]),
        ),
        arp(
            "syncopated-picking",
            "Syncopated Picking",
            FourFour,
            arpeggio(16, &[
                &[(0, true, 3), (8, true, 3)],
                &[(6, false, 2), (14, false, 2)],
                &[(4, false, 2), (12, false, 2)],
                &[(3, false, 1), (11, false, 1)],
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strumkit_types::PatternKind;

    #[test]
    fn fourteen_presets_with_unique_ids() {
        let all = presets();
        assert_eq!(all.len(), 14);
        let ids: HashSet<_> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 14);
        assert_eq!(all[0].id, FIRST_PRESET_ID);
    }

    #[test]
    fn every_preset_is_well_formed() {
        for p in presets() {
            let total = p.total_steps();
            assert!(p.grid.is_valid(), "{} breaks the span invariant", p.id);
            match &p.grid {
                PatternGrid::Strum(cells) => assert_eq!(cells.len(), total, "{}", p.id),
                PatternGrid::Arpeggio(lanes) => {
                    assert_eq!(lanes.len(), 4, "{}", p.id);
                    assert!(lanes.iter().all(|l| l.len() == total), "{}", p.id);
                }
            }
        }
    }

    #[test]
    fn rests_are_plain_placeholders() {
        for p in presets() {
            if let PatternGrid::Strum(cells) = &p.grid {
                for c in cells.iter().filter(|c| c.kind == StrumKind::Rest) {
                    assert_eq!(c.duration, 1, "{}", p.id);
                    assert!(!c.accented, "{}", p.id);
                }
            }
        }
    }

    #[test]
    fn island_strum_layout() {
        let island = presets().into_iter().find(|p| p.id == "island-strum").unwrap();
        let PatternGrid::Strum(cells) = island.grid else {
            panic!("island strum should be a strum pattern");
        };
        let kinds: String = cells.iter().map(|c| c.kind.symbol()).collect();
        assert_eq!(kinds, "↓··↓·↑··↑·↓↑····");
        assert_eq!(cells[0].duration, 2);
        assert_eq!(cells[5].duration, 2);
    }

    #[test]
    fn waltz_patterns_are_three_four() {
        for id in ["waltz", "waltz-arp-3-4"] {
            let p = presets().into_iter().find(|p| p.id == id).unwrap();
            assert_eq!(p.time_signature, TimeSignature::ThreeFour);
            assert_eq!(p.total_steps(), 12);
        }
    }

    #[test]
    fn arpeggio_kinds() {
        let arps: Vec<_> = presets()
            .into_iter()
            .filter(|p| p.kind() == PatternKind::Arpeggio)
            .map(|p| p.id)
            .collect();
        assert_eq!(
            arps,
            vec![
                "ascending-8th",
                "syncopated-8ths",
                "waltz-arp-3-4",
                "classical-arp",
                "syncopated-picking"
            ]
        );
    }

    #[test]
    fn normalize_cuts_overlaps_and_tail() {
        let mut lane = vec![s(D, 3), s(U, 1), r(), s(D, 4)];
        normalize_lane(&mut lane, 5);
        assert_eq!(lane[0].duration, 3);
        assert_eq!(lane[1], r());
        assert_eq!(lane[3].duration, 2);
        assert_eq!(lane[4], r());
        assert!(strumkit_types::spans_are_valid(&lane));
    }
}
