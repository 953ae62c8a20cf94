use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Text(String),
    Digits(&'a str),
}

/// Splits `name` into alternating text and digit runs, always starting with a
/// (possibly empty) text run so keys line up position by position.
fn runs(name: &str) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = false;
    for (idx, ch) in name.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits {
            push_run(&mut out, &name[start..idx], in_digits);
            start = idx;
            in_digits = is_digit;
        }
    }
    push_run(&mut out, &name[start..], in_digits);
    out
}

fn push_run<'a>(out: &mut Vec<Run<'a>>, slice: &'a str, digits: bool) {
    if digits {
        out.push(Run::Digits(slice));
    } else {
        out.push(Run::Text(slice.to_lowercase()));
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_run(a: &Run<'_>, b: &Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Text(a), Run::Text(b)) => a.cmp(b),
        (Run::Digits(a), Run::Digits(b)) => cmp_digits(a, b),
        (Run::Text(_), Run::Digits(_)) => Ordering::Less,
        (Run::Digits(_), Run::Text(_)) => Ordering::Greater,
    }
}

/// Natural ordering: digit runs compare numerically, text runs case-insensitively.
/// Names equal under that key fall back to byte order so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ka = runs(a);
    let kb = runs(b);
    ka.iter()
        .zip(kb.iter())
        .map(|(x, y)| cmp_run(x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| ka.len().cmp(&kb.len()))
        .then_with(|| a.cmp(b))
}
