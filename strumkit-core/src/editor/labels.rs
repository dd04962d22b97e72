/// Note value of a span of sixteenth-note steps, e.g. `3` is a dotted
/// eighth. Uncommon lengths print as a reduced fraction of a whole note.
pub fn duration_label(steps: usize) -> String {
    match steps {
        1 => "1/16".to_string(),
        2 => "1/8".to_string(),
        3 => "1/8.".to_string(),
        4 => "1/4".to_string(),
        6 => "1/4.".to_string(),
        8 => "1/2".to_string(),
        12 => "1/2.".to_string(),
        16 => "1".to_string(),
        n => {
            let d = gcd(n, 16).max(1);
            format!("{}/{}", n / d, 16 / d)
        }
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
