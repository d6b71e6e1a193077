use console::Style;
use editdiff::{split_lines, LinesDiff};

const OLD: &str = "\
fn process(items: &[Item]) -> Vec<Output> {
    let mut results = Vec::new();
    for item in items {
        if item.is_valid() {
            results.push(item.transform());
        }
    }
    results
}
";

const NEW: &str = "\
fn process(items: &[Item]) -> Vec<Output> {
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        if item.is_valid() && !item.is_stale() {
            results.push(item.transform());
        }
    }
    results
}
";

fn main() {
    let old_lines = split_lines(OLD);
    let new_lines = split_lines(NEW);
    let diff = LinesDiff::compute(&old_lines, &new_lines);

    let removed = Style::new().red();
    let added = Style::new().green();

    for change in &diff.changes {
        println!(
            "@@ -{},{} +{},{} @@",
            change.original.start,
            change.original.len(),
            change.modified.start,
            change.modified.len()
        );
        for line in change.original.start..change.original.end {
            println!("{}", removed.apply_to(format!("-{}", old_lines[line - 1])));
        }
        for line in change.modified.start..change.modified.end {
            println!("{}", added.apply_to(format!("+{}", new_lines[line - 1])));
        }
    }

    let changed: usize = diff.changes.iter().map(|c| c.original.len()).sum();
    println!("\n{} lines unchanged", old_lines.len() - changed);
    if diff.hit_timeout {
        println!("(timed out, coarse diff)");
    }
}
