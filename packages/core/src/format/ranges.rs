use std::collections::BTreeSet;

/// Collapse numbers into a readable list of ranges.
///
/// Input order and duplicates do not matter: `[8, 1, 2, 3, 5, 6, 2]`
/// becomes `"1-3, 5-6, 8"`. An empty input gives an empty string.
pub fn format_ranges<I>(numbers: I) -> String
where
    I: IntoIterator<Item = u64>,
{
    let sorted: BTreeSet<u64> = numbers.into_iter().collect();

    let mut parts = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(mut start) = iter.next() else {
        return String::new();
    };
    let mut end = start;

    for n in iter {
        if n == end + 1 {
            end = n;
            continue;
        }
        parts.push(render(start, end));
        start = n;
        end = n;
    }
    parts.push(render(start, end));

    parts.join(", ")
}

fn render(start: u64, end: u64) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Expand a string produced by [`format_ranges`] back into its numbers.
pub fn parse_ranges(text: &str) -> Option<Vec<u64>> {
    let mut numbers = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((a, b)) => {
                let (a, b) = (a.trim().parse::<u64>().ok()?, b.trim().parse::<u64>().ok()?);
                if a > b {
                    return None;
                }
                numbers.extend(a..=b);
            }
            None => numbers.push(part.parse().ok()?),
        }
    }
    Some(numbers)
}
